//! AnsuryX REST API
//!
//! HTTP API layer for AnsuryX, built with Axum. Everything except auth,
//! the catalogue and health requires `Authorization: Bearer <token>`.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/v1/auth/signup` - Create an account
//! - `POST /api/v1/auth/login` - Sign in
//! - `POST /api/v1/auth/logout` - Sign out
//! - `GET /api/v1/auth/session` - Current user
//! - `POST /api/v1/auth/reset-password` - Request a password reset
//!
//! ## Profile
//! - `GET /api/v1/profile` - User and lifetime stats
//! - `PUT /api/v1/profile` - Update display name
//!
//! ## Catalogue
//! - `GET /api/v1/habits` - The five daily habits
//! - `GET /api/v1/rules` - Challenge rules
//!
//! ## Challenge
//! - `GET /api/v1/challenge` - Dashboard
//! - `POST /api/v1/challenge` - Start a challenge
//! - `POST /api/v1/challenge/reset` - Reset
//! - `GET /api/v1/progress/today` - Today's habits
//! - `POST /api/v1/progress/:habit_id/toggle` - Toggle a habit
//! - `GET /api/v1/achievements` - Milestones
//!
//! ## Journal
//! - `GET /api/v1/journal` - List entries
//! - `PUT /api/v1/journal/today` - Save today's entry
//! - `GET /api/v1/journal/export` - Download entries
//!
//! ## Certificate
//! - `GET /api/v1/certificate` - Eligibility
//! - `GET /api/v1/certificate/download` - HTML certificate
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use ansuryx::api::{serve, ApiConfig, AppState};
//! use ansuryx::storage::{open_store, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = open_store(StorageBackend::Sqlite, "./data".as_ref())?;
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use extract::AuthUser;
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Auth routes
        .route("/auth/signup", post(routes::auth::sign_up))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/session", get(routes::auth::session))
        .route("/auth/reset-password", post(routes::auth::reset_password))
        // Profile routes
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        // Catalogue routes
        .route("/habits", get(routes::catalogue::list_habits))
        .route("/rules", get(routes::catalogue::rules))
        // Challenge routes
        .route(
            "/challenge",
            get(routes::challenge::dashboard).post(routes::challenge::start_challenge),
        )
        .route("/challenge/reset", post(routes::challenge::reset_challenge))
        .route("/progress/today", get(routes::progress::today_progress))
        .route("/progress/:habit_id/toggle", post(routes::progress::toggle_habit))
        .route("/achievements", get(routes::achievements::achievements))
        // Journal routes
        .route("/journal", get(routes::journal::list_entries))
        .route("/journal/today", put(routes::journal::save_today))
        .route("/journal/export", get(routes::journal::export_entries))
        // Certificate routes
        .route("/certificate", get(routes::certificate::status))
        .route("/certificate/download", get(routes::certificate::download))
        .layer(DefaultBodyLimit::max(state.config.max_body_size));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS for the configured origins; an empty list allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("AnsuryX API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("AnsuryX API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habits::DAILY_HABITS;
    use crate::storage::{DemoStore, HabitStore, SqliteStore};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let store: Arc<dyn HabitStore> = Arc::new(DemoStore::in_memory());
        build_router(AppState::new(store, ApiConfig::default()))
    }

    fn get_req(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn send_json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Sign up and sign in, returning the bearer token
    async fn signed_in(app: &Router, email: &str) -> String {
        let response = app
            .clone()
            .oneshot(send_json(
                "POST",
                "/api/v1/auth/signup",
                None,
                serde_json::json!({"email": email, "password": "secret-pw", "full_name": "Amina Yusuf"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(send_json(
                "POST",
                "/api/v1/auth/login",
                None,
                serde_json::json!({"email": email, "password": "secret-pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app();
        let response = app.oneshot(get_req("/health/live", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let app = create_test_app();
        let response = app.oneshot(get_req("/health/ready", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full_sqlite() {
        let dir = tempdir().unwrap();
        let store: Arc<dyn HabitStore> = Arc::new(SqliteStore::open(dir.path()).unwrap());
        let app = build_router(AppState::new(store, ApiConfig::default()));

        let response = app.oneshot(get_req("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health = body_json(response).await;
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["backend"], "sqlite");
    }

    #[tokio::test]
    async fn test_catalogue_is_public() {
        let app = create_test_app();

        let response = app.clone().oneshot(get_req("/api/v1/habits", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let habits = body_json(response).await;
        assert_eq!(habits["habits"].as_array().unwrap().len(), 5);
        assert_eq!(habits["duration"], 40);

        let response = app.oneshot(get_req("/api/v1/rules", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_requires_session() {
        let app = create_test_app();

        let response = app.clone().oneshot(get_req("/api/v1/challenge", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(get_req("/api/v1/challenge", Some("not-a-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_duplicate_signup() {
        let app = create_test_app();
        signed_in(&app, "amina@example.com").await;

        let response = app
            .oneshot(send_json(
                "POST",
                "/api/v1/auth/signup",
                None,
                serde_json::json!({"email": "amina@example.com", "password": "another-pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "User already registered");
    }

    #[tokio::test]
    async fn test_invalid_login() {
        let app = create_test_app();
        signed_in(&app, "amina@example.com").await;

        let response = app
            .oneshot(send_json(
                "POST",
                "/api/v1/auth/login",
                None,
                serde_json::json!({"email": "amina@example.com", "password": "wrong-pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_reset_password_unknown_email() {
        let app = create_test_app();
        let response = app
            .oneshot(send_json(
                "POST",
                "/api/v1/auth/reset-password",
                None,
                serde_json::json!({"email": "nobody@example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let app = create_test_app();
        let token = signed_in(&app, "amina@example.com").await;

        let response = app
            .clone()
            .oneshot(get_req("/api/v1/auth/session", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["user"]["email"], "amina@example.com");

        let response = app
            .clone()
            .oneshot(send_json("POST", "/api/v1/auth/logout", Some(&token), Value::Null))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get_req("/api/v1/auth/session", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_complete_a_day() {
        let app = create_test_app();
        let token = signed_in(&app, "amina@example.com").await;

        let response = app
            .clone()
            .oneshot(send_json("POST", "/api/v1/challenge", Some(&token), Value::Null))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["status"], "active");

        let mut last = Value::Null;
        for habit in DAILY_HABITS.iter() {
            let uri = format!("/api/v1/progress/{}/toggle", habit.id);
            let response = app
                .clone()
                .oneshot(send_json("POST", &uri, Some(&token), Value::Null))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            last = body_json(response).await;
        }
        assert_eq!(last["day_completed"], true);
        assert_eq!(last["completion_rate"], 100.0);
        assert_eq!(last["challenge"]["current_day"], 1);

        let response = app
            .clone()
            .oneshot(get_req("/api/v1/challenge", Some(&token)))
            .await
            .unwrap();
        let dashboard = body_json(response).await;
        assert_eq!(dashboard["streak"], 1);
        assert_eq!(dashboard["day_label"], "Day 1 of 40");

        let response = app
            .clone()
            .oneshot(get_req("/api/v1/achievements", Some(&token)))
            .await
            .unwrap();
        let achievements = body_json(response).await;
        assert_eq!(achievements["unlocked_count"], 1);

        let response = app
            .oneshot(get_req("/api/v1/profile", Some(&token)))
            .await
            .unwrap();
        let profile = body_json(response).await;
        assert_eq!(profile["stats"]["total_days"], 1);
        assert_eq!(profile["display_name"], "Amina Yusuf");
    }

    #[tokio::test]
    async fn test_toggle_unknown_habit() {
        let app = create_test_app();
        let token = signed_in(&app, "amina@example.com").await;

        let response = app
            .oneshot(send_json(
                "POST",
                "/api/v1/progress/yoga/toggle",
                Some(&token),
                Value::Null,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_journal_flow() {
        let app = create_test_app();
        let token = signed_in(&app, "amina@example.com").await;

        let response = app
            .clone()
            .oneshot(get_req("/api/v1/journal/export?format=csv", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(send_json(
                "PUT",
                "/api/v1/journal/today",
                Some(&token),
                serde_json::json!({"content": "   "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(send_json(
                "PUT",
                "/api/v1/journal/today",
                Some(&token),
                serde_json::json!({"content": "Grateful for a calm morning."}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get_req("/api/v1/journal", Some(&token)))
            .await
            .unwrap();
        let listing = body_json(response).await;
        assert_eq!(listing["entries"].as_array().unwrap().len(), 1);
        assert_eq!(listing["today"]["content"], "Grateful for a calm morning.");

        let response = app
            .oneshot(get_req("/api/v1/journal/export?format=csv", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("AnsuryX-Challenge-Journal-Amina-Yusuf.csv"));
        assert!(body_text(response).await.contains("Grateful for a calm morning."));
    }

    #[tokio::test]
    async fn test_export_disabled() {
        let store: Arc<dyn HabitStore> = Arc::new(DemoStore::in_memory());
        let config = ApiConfig {
            enable_export: false,
            ..Default::default()
        };
        let app = build_router(AppState::new(store, config));
        let token = signed_in(&app, "amina@example.com").await;

        let response = app
            .clone()
            .oneshot(send_json(
                "PUT",
                "/api/v1/journal/today",
                Some(&token),
                serde_json::json!({"content": "Still writing."}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get_req("/api/v1/journal/export?format=text", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Export feature is disabled");
    }

    #[tokio::test]
    async fn test_certificate_locked() {
        let app = create_test_app();
        let token = signed_in(&app, "amina@example.com").await;

        let response = app
            .clone()
            .oneshot(get_req("/api/v1/certificate", Some(&token)))
            .await
            .unwrap();
        let status = body_json(response).await;
        assert_eq!(status["eligible"], false);
        assert_eq!(status["days_remaining"], 40);

        let response = app
            .oneshot(get_req("/api/v1/certificate/download", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let app = create_test_app();
        let token = signed_in(&app, "amina@example.com").await;

        let response = app
            .oneshot(send_json(
                "PUT",
                "/api/v1/profile",
                Some(&token),
                serde_json::json!({"full_name": "Omar"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let profile = body_json(response).await;
        assert_eq!(profile["user"]["full_name"], "Omar");
        assert_eq!(profile["stats"]["longest_streak"], 0);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let app = create_test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/signup")
                    .header("Content-Type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
