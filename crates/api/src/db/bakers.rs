//! Baker profile repository: profile attributes, portfolio and subscription.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use keik_core::{Email, IdentityId, PortfolioEntryId, Role, Subscription};

use super::RepositoryError;
use crate::models::{Baker, Identity, PastOrder, PortfolioEntry, ProfileUpdate};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BakerRow {
    id: i32,
    role: Role,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    bank_details: Option<String>,
    address_proofs: Option<String>,
    past_orders: Json<Vec<PastOrder>>,
    subscription_expiry: Option<DateTime<Utc>>,
}

impl BakerRow {
    fn into_baker(self, past_works: Vec<PortfolioEntry>) -> Result<Baker, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Baker {
            identity: Identity {
                id: IdentityId::new(self.id),
                role: self.role,
                name: self.name,
                email,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            bank_details: self.bank_details,
            address_proofs: self.address_proofs,
            past_orders: self.past_orders.0,
            past_works,
            subscription_expiry: self.subscription_expiry,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PortfolioRow {
    id: i32,
    baker_id: i32,
    image_url: String,
    description: String,
    uploaded_at: DateTime<Utc>,
}

impl From<PortfolioRow> for PortfolioEntry {
    fn from(row: PortfolioRow) -> Self {
        Self {
            id: PortfolioEntryId::new(row.id),
            image_url: row.image_url,
            description: row.description,
            uploaded_at: row.uploaded_at,
        }
    }
}

const BAKER_SELECT: &str = "\
    SELECT i.id, i.role, i.name, i.email, i.created_at, i.updated_at, \
           p.bank_details, p.address_proofs, p.past_orders, p.subscription_expiry \
    FROM identity i \
    JOIN baker_profile p ON p.identity_id = i.id";

// =============================================================================
// Repository
// =============================================================================

/// Repository for baker profile database operations.
pub struct BakerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BakerRepository<'a> {
    /// Create a new baker repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a baker with profile and portfolio.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: IdentityId) -> Result<Option<Baker>, RepositoryError> {
        let row = sqlx::query_as::<_, BakerRow>(&format!("{BAKER_SELECT} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let past_works = self.portfolio(id).await?;
        row.into_baker(past_works).map(Some)
    }

    /// List every baker, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Baker>, RepositoryError> {
        let rows = sqlx::query_as::<_, BakerRow>(&format!(
            "{BAKER_SELECT} ORDER BY i.created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.attach_portfolios(rows).await
    }

    /// List bakers whose subscription expiry lies after `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Baker>, RepositoryError> {
        let rows = sqlx::query_as::<_, BakerRow>(&format!(
            "{BAKER_SELECT} WHERE p.subscription_expiry > $1 ORDER BY i.created_at DESC"
        ))
        .bind(now)
        .fetch_all(self.pool)
        .await?;

        self.attach_portfolios(rows).await
    }

    /// Apply a partial profile update and return the updated baker.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the baker has no profile.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: IdentityId,
        update: &ProfileUpdate,
    ) -> Result<Baker, RepositoryError> {
        let result = sqlx::query(
            "UPDATE baker_profile SET \
                bank_details = COALESCE($2, bank_details), \
                address_proofs = COALESCE($3, address_proofs), \
                past_orders = COALESCE($4, past_orders) \
             WHERE identity_id = $1",
        )
        .bind(id)
        .bind(update.bank_details.as_deref())
        .bind(update.address_proofs.as_deref())
        .bind(update.past_orders.as_ref().map(Json))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("UPDATE identity SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Current subscription state of a baker, or `None` if no such baker.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn subscription(
        &self,
        id: IdentityId,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let expiry: Option<Option<DateTime<Utc>>> = sqlx::query_scalar(
            "SELECT subscription_expiry FROM baker_profile WHERE identity_id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(expiry.map(Subscription::new))
    }

    /// Persist a new subscription expiry and return it as stored.
    ///
    /// The stored value is truncated to microseconds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the baker has no profile.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_subscription(
        &self,
        id: IdentityId,
        subscription: Subscription,
    ) -> Result<Subscription, RepositoryError> {
        let stored: Option<Option<DateTime<Utc>>> = sqlx::query_scalar(
            "UPDATE baker_profile SET subscription_expiry = $2 \
             WHERE identity_id = $1 RETURNING subscription_expiry",
        )
        .bind(id)
        .bind(subscription.expiry())
        .fetch_optional(self.pool)
        .await?;

        stored.map(Subscription::new).ok_or(RepositoryError::NotFound)
    }

    /// A baker's portfolio, oldest upload first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn portfolio(&self, id: IdentityId) -> Result<Vec<PortfolioEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, PortfolioRow>(
            "SELECT id, baker_id, image_url, description, uploaded_at \
             FROM portfolio_entry WHERE baker_id = $1 ORDER BY uploaded_at, id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Append uploaded images to a baker's portfolio with empty descriptions.
    ///
    /// Returns the full portfolio after the append.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_portfolio_entries(
        &self,
        id: IdentityId,
        image_urls: &[String],
    ) -> Result<Vec<PortfolioEntry>, RepositoryError> {
        sqlx::query(
            "INSERT INTO portfolio_entry (baker_id, image_url) \
             SELECT $1, url FROM UNNEST($2::text[]) AS url",
        )
        .bind(id)
        .bind(image_urls)
        .execute(self.pool)
        .await?;

        self.portfolio(id).await
    }

    async fn attach_portfolios(&self, rows: Vec<BakerRow>) -> Result<Vec<Baker>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let entries = sqlx::query_as::<_, PortfolioRow>(
            "SELECT id, baker_id, image_url, description, uploaded_at \
             FROM portfolio_entry WHERE baker_id = ANY($1) ORDER BY uploaded_at, id",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_baker: HashMap<i32, Vec<PortfolioEntry>> = HashMap::new();
        for entry in entries {
            by_baker.entry(entry.baker_id).or_default().push(entry.into());
        }

        rows.into_iter()
            .map(|row| {
                let past_works = by_baker.remove(&row.id).unwrap_or_default();
                row.into_baker(past_works)
            })
            .collect()
    }
}
