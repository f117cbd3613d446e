//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::auth::AuthService;
use crate::challenge::ChallengeTracker;
use crate::journal::JournalService;
use crate::storage::HabitStore;

const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Backing store, used directly for health checks
    pub store: Arc<dyn HabitStore>,
    /// Challenge lifecycle
    pub tracker: ChallengeTracker,
    /// Accounts and sessions
    pub auth: AuthService,
    /// Daily reflections
    pub journal: JournalService,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Wire every service to one store
    pub fn new(store: Arc<dyn HabitStore>, config: ApiConfig) -> Self {
        let session_ttl = crate::config::session_ttl(config.session_ttl_hours).unwrap_or_else(|| {
            tracing::warn!(
                hours = config.session_ttl_hours,
                "Session TTL out of range, using the default"
            );
            chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS)
        });
        Self {
            tracker: ChallengeTracker::new(Arc::clone(&store)),
            auth: AuthService::new(Arc::clone(&store), session_ttl),
            journal: JournalService::new(Arc::clone(&store)),
            store,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins; empty allows any
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Enable journal export endpoint
    pub enable_export: bool,
    /// Session lifetime
    pub session_ttl_hours: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8040,
            cors_origins: Vec::new(),
            max_body_size: 1024 * 1024, // 1MB
            enable_export: true,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&crate::config::Config> for ApiConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            host: config.api.host.clone(),
            port: config.api.port,
            cors_origins: config.api.cors_origins.clone(),
            enable_export: config.api.enable_export,
            session_ttl_hours: config.auth.session_ttl_hours,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DemoStore;
    use chrono::Utc;

    #[tokio::test]
    async fn test_out_of_range_ttl_falls_back_to_default() {
        let config = ApiConfig {
            session_ttl_hours: 10_000_000_000_000,
            ..Default::default()
        };
        let state = AppState::new(Arc::new(DemoStore::in_memory()), config);

        state
            .auth
            .sign_up("amina@example.com", "secret-pw", None)
            .await
            .unwrap();
        let signed_in = state
            .auth
            .sign_in("amina@example.com", "secret-pw")
            .await
            .unwrap();

        let ttl = signed_in.expires_at - Utc::now();
        assert!(ttl <= chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS));
        assert!(ttl > chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS - 1));
    }
}
