//! Seed bakers and their products from a YAML file.
//!
//! Safe to re-run: existing bakers are reused (matched by email), their
//! subscription is renewed only when it is not active, and products already
//! listed under the same name for that baker are skipped.
//!
//! ```yaml
//! bakers:
//!   - name: Ada's Kitchen
//!     email: ada@keik.test
//!     password: change-me-please
//!     products:
//!       - name: Carrot cake
//!         description: Spiced sponge with cream cheese frosting
//!         price: 18.50
//!         image_url: https://images.example/carrot.png
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use keik_api::db::{self, BakerRepository, IdentityRepository, ProductRepository};
use keik_api::models::NewProduct;
use keik_api::services::AuthService;
use keik_api::services::auth::MIN_PASSWORD_LENGTH;
use keik_core::{Email, IdentityId, Price, Role};

/// Top-level catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub bakers: Vec<SeedBaker>,
}

/// One baker and the products they sell.
#[derive(Debug, Deserialize)]
pub struct SeedBaker {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub bakers_created: usize,
    pub bakers_existing: usize,
    pub subscriptions_renewed: usize,
    pub products_created: usize,
    pub products_skipped: usize,
}

/// Check the whole file before touching the database.
#[must_use]
pub fn validate(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut emails = HashSet::new();

    for (i, baker) in catalog.bakers.iter().enumerate() {
        let at = format!("bakers[{i}]");
        if baker.name.trim().is_empty() {
            errors.push(format!("{at}: name is empty"));
        }
        match Email::parse(baker.email.trim()) {
            Ok(email) => {
                if !emails.insert(email.into_inner()) {
                    errors.push(format!("{at}: duplicate email {}", baker.email));
                }
            }
            Err(e) => errors.push(format!("{at}: {e}")),
        }
        if baker.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(format!(
                "{at}: password must be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }

        for (j, product) in baker.products.iter().enumerate() {
            let at = format!("{at}.products[{j}]");
            for (field, value) in [
                ("name", &product.name),
                ("description", &product.description),
                ("image_url", &product.image_url),
            ] {
                if value.trim().is_empty() {
                    errors.push(format!("{at}: {field} is empty"));
                }
            }
            if let Err(e) = Price::new(product.price) {
                errors.push(format!("{at}: {e}"));
            }
        }
    }

    errors
}

/// Seed the catalog described by `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or a
/// database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url().ok_or("KEIK_DATABASE_URL not set")?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    let errors = validate(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!(bakers = catalog.bakers.len(), "Catalog validated successfully");

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let summary = seed(&pool, catalog).await?;

    info!("Seeding complete!");
    info!("  Bakers created: {}", summary.bakers_created);
    info!("  Bakers already present: {}", summary.bakers_existing);
    info!("  Subscriptions renewed: {}", summary.subscriptions_renewed);
    info!("  Products created: {}", summary.products_created);
    info!("  Products skipped (already exist): {}", summary.products_skipped);

    Ok(())
}

async fn seed(
    pool: &sqlx::PgPool,
    catalog: CatalogFile,
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let identities = IdentityRepository::new(pool);
    let bakers = BakerRepository::new(pool);
    let products = ProductRepository::new(pool);
    let auth = AuthService::new(pool);

    let mut existing: HashSet<(IdentityId, String)> = products
        .list()
        .await?
        .into_iter()
        .map(|p| (p.baker.id, p.name))
        .collect();

    let mut summary = SeedSummary::default();
    let now = Utc::now();

    for baker in catalog.bakers {
        let email = Email::parse(baker.email.trim())?;
        let id = match identities.get_credentials(Role::Baker, &email).await? {
            Some((identity, _)) => {
                summary.bakers_existing += 1;
                identity.id
            }
            None => {
                let identity = auth
                    .register(&baker.name, email.as_str(), &baker.password, Role::Baker)
                    .await?;
                summary.bakers_created += 1;
                info!(baker_id = %identity.id, email = %email, "Baker created");
                identity.id
            }
        };

        let subscription = bakers.subscription(id).await?.unwrap_or_default();
        if !subscription.is_active_at(now) {
            bakers.set_subscription(id, subscription.extended_at(now)).await?;
            summary.subscriptions_renewed += 1;
        }

        for product in baker.products {
            let name = product.name.trim().to_string();
            if existing.contains(&(id, name.clone())) {
                summary.products_skipped += 1;
                continue;
            }

            let created = products
                .create(&NewProduct {
                    name: name.clone(),
                    description: product.description.trim().to_string(),
                    price: Price::new(product.price)?,
                    image_url: product.image_url.trim().to_string(),
                    baker_id: id,
                })
                .await?;
            existing.insert((id, name));
            summary.products_created += 1;
            info!(product_id = %created.id, baker_id = %id, "Product created");
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
bakers:
  - name: Ada's Kitchen
    email: ada@keik.test
    password: change-me-please
    products:
      - name: Carrot cake
        description: Spiced sponge
        price: 18.50
        image_url: https://images.example/carrot.png
  - name: Grace Bakes
    email: grace@keik.test
    password: another-secret
";

    #[test]
    fn test_parses_sample() {
        let catalog: CatalogFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(catalog.bakers.len(), 2);
        assert_eq!(catalog.bakers[0].products[0].price, Decimal::new(1850, 2));
        assert!(catalog.bakers[1].products.is_empty());
        assert!(validate(&catalog).is_empty());
    }

    #[test]
    fn test_reports_every_problem() {
        let catalog: CatalogFile = serde_yaml::from_str(
            r"
bakers:
  - name: ''
    email: not-an-email
    password: abc
    products:
      - name: Free cake
        description: ''
        price: 0
        image_url: https://images.example/x.png
",
        )
        .unwrap();
        let errors = validate(&catalog);
        assert_eq!(errors.len(), 5, "{errors:?}");
    }

    #[test]
    fn test_duplicate_emails_rejected() {
        let catalog: CatalogFile = serde_yaml::from_str(
            r"
bakers:
  - { name: A, email: a@keik.test, password: secret1 }
  - { name: B, email: a@keik.test, password: secret2 }
",
        )
        .unwrap();
        assert_eq!(validate(&catalog).len(), 1);
    }
}
