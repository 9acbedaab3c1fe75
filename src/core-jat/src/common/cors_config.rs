use axum::http::HeaderValue;
use axum::http::header::InvalidHeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Origins allowed when CORS_ALLOWED_ORIGINS is unset: a locally running web frontend.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<HeaderValue>,
}

#[derive(Debug, thiserror::Error)]
pub enum CorsConfigError {
    #[error("Invalid origin in CORS_ALLOWED_ORIGINS '{origin}': {source}")]
    InvalidOrigin {
        origin: String,
        source: InvalidHeaderValue,
    },
    #[error("CORS_ALLOWED_ORIGINS is set but lists no origins")]
    Empty,
}

impl Default for CorsConfig {
    fn default() -> Self {
        CorsConfig {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| HeaderValue::from_static(*o))
                .collect(),
        }
    }
}

impl CorsConfig {
    /// Reads the comma-separated env var CORS_ALLOWED_ORIGINS, or uses the defaults when unset.
    pub fn from_env() -> Result<Self, CorsConfigError> {
        match std::env::var("CORS_ALLOWED_ORIGINS") {
            Ok(origins) => Self::parse(&origins),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Parses a comma-separated origin list.
    pub fn parse(origins: &str) -> Result<Self, CorsConfigError> {
        let allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| {
                HeaderValue::from_str(o).map_err(|source| CorsConfigError::InvalidOrigin {
                    origin: o.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if allowed_origins.is_empty() {
            return Err(CorsConfigError::Empty);
        }
        Ok(CorsConfig { allowed_origins })
    }

    /// Credentials are allowed, so methods and headers mirror the request instead of using `*`.
    pub fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.allowed_origins.clone()))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }
}
