//! Address-book repository with the single-default invariant.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use thistle_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::address::{Address, AddressUpdate, NewAddress};

/// Internal row type for address queries.
#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    label: Option<String>,
    full_name: String,
    phone: String,
    address_line1: String,
    address_line2: Option<String>,
    ward: Option<String>,
    district: Option<String>,
    city: Option<String>,
    province: Option<String>,
    postal_code: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            label: row.label,
            full_name: row.full_name,
            phone: row.phone,
            address_line1: row.address_line1,
            address_line2: row.address_line2,
            ward: row.ward,
            district: row.district,
            city: row.city,
            province: row.province,
            postal_code: row.postal_code,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_ADDRESS: &str = r"
    SELECT id, user_id, label, full_name, phone, address_line1, address_line2,
           ward, district, city, province, postal_code, is_default,
           created_at, updated_at
    FROM addresses
";

/// Repository for address-book database operations.
///
/// Every method is scoped to a `UserId`; an address id from another user
/// behaves as not-found.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, default first, then newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(&format!(
            "{SELECT_ADDRESS} WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Find one of the user's addresses by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row: Option<AddressRow> =
            sqlx::query_as(&format!("{SELECT_ADDRESS} WHERE id = $1 AND user_id = $2"))
                .bind(address_id.as_i32())
                .bind(user_id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    /// Create an address for a user.
    ///
    /// The row is always inserted with `is_default = false`; if the input
    /// asks for default, [`Self::set_default`] runs afterwards so the
    /// single-default invariant holds no matter what the book contained.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let row: AddressRow = sqlx::query_as(
            r"
            INSERT INTO addresses (user_id, label, full_name, phone, address_line1,
                                   address_line2, ward, district, city, province,
                                   postal_code, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, FALSE)
            RETURNING id, user_id, label, full_name, phone, address_line1, address_line2,
                      ward, district, city, province, postal_code, is_default,
                      created_at, updated_at
            ",
        )
        .bind(user_id.as_i32())
        .bind(&input.label)
        .bind(&input.full_name)
        .bind(&input.phone)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.ward)
        .bind(&input.district)
        .bind(&input.city)
        .bind(&input.province)
        .bind(&input.postal_code)
        .fetch_one(self.pool)
        .await?;

        let mut address: Address = row.into();

        if input.is_default {
            self.set_default(address.id, user_id).await?;
            address.is_default = true;
        }

        Ok(address)
    }

    /// Apply a partial update to one of the user's addresses.
    ///
    /// `None` fields keep their stored value (COALESCE in SQL), so the
    /// update surface is the fixed set of columns in [`AddressUpdate`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// belongs to another user.
    pub async fn update(
        &self,
        address_id: AddressId,
        user_id: UserId,
        update: &AddressUpdate,
    ) -> Result<Address, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(
            r"
            UPDATE addresses SET
                label = COALESCE($3, label),
                full_name = COALESCE($4, full_name),
                phone = COALESCE($5, phone),
                address_line1 = COALESCE($6, address_line1),
                address_line2 = COALESCE($7, address_line2),
                ward = COALESCE($8, ward),
                district = COALESCE($9, district),
                city = COALESCE($10, city),
                province = COALESCE($11, province),
                postal_code = COALESCE($12, postal_code),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, label, full_name, phone, address_line1, address_line2,
                      ward, district, city, province, postal_code, is_default,
                      created_at, updated_at
            ",
        )
        .bind(address_id.as_i32())
        .bind(user_id.as_i32())
        .bind(&update.label)
        .bind(&update.full_name)
        .bind(&update.phone)
        .bind(&update.address_line1)
        .bind(&update.address_line2)
        .bind(&update.ward)
        .bind(&update.district)
        .bind(&update.city)
        .bind(&update.province)
        .bind(&update.postal_code)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete one of the user's addresses. Returns whether a row was
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(address_id.as_i32())
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Make one address the user's default.
    ///
    /// Clears every default for the user and sets the target in one
    /// transaction, so at most one default is ever observable regardless of
    /// the previous state or concurrent calls.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the target address doesn't
    /// exist or belongs to another user; the clear is rolled back.
    pub async fn set_default(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE addresses SET is_default = FALSE, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            r"
            UPDATE addresses SET is_default = TRUE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(address_id.as_i32())
        .bind(user_id.as_i32())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
