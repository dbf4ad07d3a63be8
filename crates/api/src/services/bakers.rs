//! Baker profiles, portfolio uploads and subscriptions.
//!
//! Every operation here takes the baker id from the caller's session, never
//! from the request body.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use keik_core::{IdentityId, Role};

use crate::db::{BakerRepository, IdentityRepository, RepositoryError};
use crate::error::AppError;
use crate::models::{Baker, Identity, PortfolioEntry, ProfileUpdate};
use crate::services::images::{ImageStore, ImageUpload, MAX_IMAGES_PER_UPLOAD};

const PROFILE_NOT_FOUND: &str = "Home Baker not found";

/// Baker-facing and directory operations.
pub struct BakerService<'a> {
    bakers: BakerRepository<'a>,
    identities: IdentityRepository<'a>,
}

impl<'a> BakerService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            bakers: BakerRepository::new(pool),
            identities: IdentityRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the baker no longer exists.
    pub async fn profile(&self, id: IdentityId) -> Result<Baker, AppError> {
        self.bakers
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(PROFILE_NOT_FOUND.to_string()))
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the baker no longer exists.
    pub async fn update_profile(
        &self,
        id: IdentityId,
        update: ProfileUpdate,
    ) -> Result<Baker, AppError> {
        self.bakers
            .update_profile(id, &update)
            .await
            .map_err(profile_not_found)
    }

    /// Bakers whose subscription is active now.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Baker>, AppError> {
        Ok(self.bakers.list_active(Utc::now()).await?)
    }

    /// Every baker, for the admin directory.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Baker>, AppError> {
        Ok(self.bakers.list_all().await?)
    }

    /// Every customer, for the admin directory.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_customers(&self) -> Result<Vec<Identity>, AppError> {
        Ok(self.identities.list_by_role(Role::Customer).await?)
    }

    /// Remove an identity of the given role together with everything it owns.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` with `not_found` if no such identity exists.
    pub async fn remove_identity(
        &self,
        role: Role,
        id: IdentityId,
        not_found: &str,
    ) -> Result<(), AppError> {
        self.identities.delete(role, id).await.map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(not_found.to_string()),
            other => AppError::Database(other),
        })?;
        tracing::info!(identity_id = %id, role = %role, "Identity removed");
        Ok(())
    }

    /// Record a simulated payment and extend the subscription by one period.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the baker no longer exists.
    pub async fn subscribe(&self, id: IdentityId) -> Result<DateTime<Utc>, AppError> {
        let now = Utc::now();
        let current = self
            .bakers
            .subscription(id)
            .await?
            .ok_or_else(|| AppError::NotFound(PROFILE_NOT_FOUND.to_string()))?;

        let stored = self
            .bakers
            .set_subscription(id, current.extended_at(now))
            .await
            .map_err(profile_not_found)?;

        let expiry = stored
            .expiry()
            .ok_or_else(|| AppError::Internal("extended subscription has no expiry".to_string()))?;
        tracing::info!(baker_id = %id, expiry = %expiry, "Subscription extended");
        Ok(expiry)
    }

    /// The baker's own portfolio.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn portfolio(&self, id: IdentityId) -> Result<Vec<PortfolioEntry>, AppError> {
        Ok(self.bakers.portfolio(id).await?)
    }

    /// Validate, host and append images to the portfolio.
    ///
    /// Every file is checked before any upload starts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if no images were sent, too many were
    /// sent, or a file fails the type or size check. Returns
    /// `AppError::NotFound` if the baker no longer exists and
    /// `AppError::Internal` if image hosting is unavailable.
    pub async fn upload(
        &self,
        id: IdentityId,
        store: Option<&ImageStore>,
        images: Vec<ImageUpload>,
    ) -> Result<Vec<PortfolioEntry>, AppError> {
        if images.is_empty() {
            return Err(AppError::Validation("No images uploaded".to_string()));
        }
        if images.len() > MAX_IMAGES_PER_UPLOAD {
            return Err(AppError::Validation(format!(
                "At most {MAX_IMAGES_PER_UPLOAD} images can be uploaded at once"
            )));
        }
        for image in &images {
            image.validate()?;
        }
        // A token can outlive its baker; check before anything is hosted.
        if self.bakers.subscription(id).await?.is_none() {
            return Err(AppError::NotFound(PROFILE_NOT_FOUND.to_string()));
        }

        let store =
            store.ok_or_else(|| AppError::Internal("image storage not configured".to_string()))?;
        let count = images.len();
        let urls = store.upload_all(images).await?;

        let portfolio = self.bakers.add_portfolio_entries(id, &urls).await?;
        tracing::info!(baker_id = %id, count, "Portfolio images added");
        Ok(portfolio)
    }
}

fn profile_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(PROFILE_NOT_FOUND.to_string()),
        other => AppError::Database(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pool() -> PgPool {
        let url = secrecy::SecretString::from("postgres://keik@127.0.0.1:1/keik");
        crate::db::create_lazy_pool(&url).unwrap()
    }

    fn png(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_upload_requires_images() {
        let pool = pool();
        let err = BakerService::new(&pool)
            .upload(IdentityId::new(1), None, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "No images uploaded"));
    }

    #[tokio::test]
    async fn test_upload_limits_count() {
        let images = (0..=MAX_IMAGES_PER_UPLOAD).map(|i| png(&format!("{i}.png"))).collect();
        let pool = pool();
        let err = BakerService::new(&pool)
            .upload(IdentityId::new(1), None, images)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_upload_validates_before_hosting() {
        let mut gif = png("cake.gif");
        gif.content_type = "image/gif".to_string();
        let pool = pool();
        let err = BakerService::new(&pool)
            .upload(IdentityId::new(1), None, vec![png("a.png"), gif])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "Only JPEG and PNG images are allowed"));
    }
}
