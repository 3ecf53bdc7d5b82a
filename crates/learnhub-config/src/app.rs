//! Server and public URL settings.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `PUBLIC_BASE_URL` | `http://localhost:3000` |
//! | `FRONTEND_URL` | `http://localhost:5173` |
//! | `SYSTEM_ID_MAX_ATTEMPTS` | `10` |
//! | `ENVIRONMENT` | `development` |
//!
//! `PUBLIC_BASE_URL` is the address printed on ID cards; scanning a card hits
//! this service, which then redirects to `FRONTEND_URL`.

use std::env;
use std::fmt::Display;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub public_base_url: String,
    pub frontend_url: String,
    pub system_id_max_attempts: u32,
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_base_url: "http://localhost:3000".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            system_id_max_attempts: 10,
            environment: "development".to_string(),
        }
    }
}

fn trim_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            public_base_url: trim_url(
                env::var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            ),
            frontend_url: trim_url(env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url)),
            system_id_max_attempts: env_or(
                "SYSTEM_ID_MAX_ATTEMPTS",
                defaults.system_id_max_attempts,
            )
            .max(1),
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL encoded into a card's QR code.
    pub fn card_scan_url(&self, qr_token: &str) -> String {
        format!("{}/api/id-cards/scan/{}", self.public_base_url, qr_token)
    }

    /// Frontend page restoring a card holder's enrollment context.
    pub fn enrollment_url(&self, enrollment_id: impl Display, card_number: &str) -> String {
        format!(
            "{}/enrollments/{}?holder={}",
            self.frontend_url, enrollment_id, card_number
        )
    }
}
