//! Identity repository: accounts of every role.
//!
//! Creating a baker identity also creates its `baker_profile` row in the same
//! transaction, so every `homebaker` identity has a profile.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use keik_core::{Email, IdentityId, Role};

use super::RepositoryError;
use crate::models::Identity;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    id: i32,
    role: Role,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = RepositoryError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: IdentityId::new(row.id),
            role: row.role,
            name: row.name,
            email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    identity: IdentityRow,
    password_hash: String,
}

const IDENTITY_COLUMNS: &str = "id, role, name, email, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for identity database operations.
pub struct IdentityRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> IdentityRepository<'a> {
    /// Create a new identity repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an identity by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: IdentityId) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identity WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an identity and its password hash by role and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        role: Role,
        email: &Email,
    ) -> Result<Option<(Identity, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {IDENTITY_COLUMNS}, password_hash FROM identity WHERE role = $1 AND email = $2"
        ))
        .bind(role)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((r.identity.try_into()?, r.password_hash)))
            .transpose()
    }

    /// Whether an identity with this email exists in the role partition.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, role: Role, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM identity WHERE role = $1 AND email = $2)",
        )
        .bind(role)
        .bind(email)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// List identities of one role, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_role(&self, role: Role) -> Result<Vec<Identity>, RepositoryError> {
        let rows = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identity WHERE role = $1 ORDER BY created_at DESC"
        ))
        .bind(role)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Create an identity. Baker identities get an empty profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered
    /// for this role.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        role: Role,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<Identity, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "INSERT INTO identity (role, name, email, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(role)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, "email already exists"))?;

        if role == Role::Baker {
            sqlx::query("INSERT INTO baker_profile (identity_id) VALUES ($1)")
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        row.try_into()
    }

    /// Delete an identity of the given role.
    ///
    /// Products, portfolio entries and placed orders cascade; orders assigned
    /// to a deleted baker keep their record with no baker.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no identity of that role has this ID.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, role: Role, id: IdentityId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM identity WHERE id = $1 AND role = $2")
            .bind(id)
            .bind(role)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
