//! Coupon lookup.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use thistle_core::{CouponId, CouponType};

use super::RepositoryError;
use crate::models::coupon::Coupon;

/// Internal row type for coupon queries.
#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: i32,
    code: String,
    #[sqlx(rename = "type")]
    coupon_type: String,
    value: Decimal,
    min_order_value: Option<Decimal>,
    active: bool,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let coupon_type: CouponType = row.coupon_type.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid coupon type in database: {e}"))
        })?;

        Ok(Self {
            id: CouponId::new(row.id),
            code: row.code,
            coupon_type,
            value: row.value,
            min_order_value: row.min_order_value,
            active: row.active,
            start_at: row.start_at,
            end_at: row.end_at,
        })
    }
}

/// Repository for coupon database operations. Read-only to this core.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a coupon by code, provided it is active and inside its validity
    /// window right now.
    ///
    /// Returns `None` for an unknown, inactive, or expired code; callers
    /// treat that as "no discount", not as an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored coupon type is
    /// unrecognized.
    pub async fn find_active_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row: Option<CouponRow> = sqlx::query_as(
            r"
            SELECT id, code, type, value, min_order_value, active, start_at, end_at
            FROM coupons
            WHERE active = TRUE AND code = $1 AND start_at <= NOW() AND end_at >= NOW()
            ",
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
