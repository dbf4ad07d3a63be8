//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Environment variable holding the database URL.
pub const DATABASE_URL_VAR: &str = "KEIK_DATABASE_URL";

/// Database URL from `KEIK_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first when present.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var(DATABASE_URL_VAR)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}
