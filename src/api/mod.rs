pub mod auth;
mod bookings;
mod content;
pub mod error;
mod events;
mod loyalty;
mod meeting_hall;
pub mod metrics;
mod promo_codes;
pub mod rate_limit;
pub mod response;
mod rooms;
mod spa;
mod users;
pub mod validation;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Read-only guest site routes
    let public_reads = Router::new()
        .route("/content/:page", get(content::get_page))
        .route("/rooms", get(rooms::list_rooms))
        .route("/rooms/:id", get(rooms::get_room))
        .route("/spa/categories", get(spa::list_categories))
        .route("/spa/categories/:id", get(spa::get_category))
        .route("/spa/specialists", get(spa::list_specialists))
        .route("/spa/specialists/:id", get(spa::get_specialist))
        .route("/spa/services", get(spa::list_services))
        .route("/spa/services/:id", get(spa::get_service))
        .route("/events", get(events::list_events))
        .route("/events/:id", get(events::get_event))
        .route("/meeting-hall/halls", get(meeting_hall::list_halls))
        .route("/meeting-hall/halls/:id", get(meeting_hall::get_hall))
        .route("/loyalty/tiers", get(loyalty::list_tiers))
        .route("/bookings/catalog", get(bookings::get_catalog))
        .route("/bookings/confirmation/:code", get(bookings::get_by_confirmation));

    // Guest submissions
    let public_writes = Router::new()
        .route("/bookings/quote", post(bookings::quote))
        .route("/bookings", post(bookings::create_booking))
        .route("/promo-codes/validate", post(promo_codes::validate_code))
        .route("/meeting-hall/requests", post(meeting_hall::create_request));

    let public_routes = public_reads
        .merge(public_writes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_public,
        ));

    // Dashboard routes
    let admin_routes = Router::new()
        // Content
        .route("/content", get(content::list_pages))
        .route(
            "/content/:page",
            put(content::replace_page).patch(content::patch_page),
        )
        // Loyalty
        .route("/loyalty/tiers", post(loyalty::create_tier))
        .route(
            "/loyalty/tiers/:id",
            get(loyalty::get_tier)
                .put(loyalty::update_tier)
                .delete(loyalty::delete_tier),
        )
        .route(
            "/loyalty/rewards",
            get(loyalty::list_rewards).post(loyalty::create_reward),
        )
        .route(
            "/loyalty/rewards/:id",
            get(loyalty::get_reward)
                .put(loyalty::update_reward)
                .delete(loyalty::delete_reward),
        )
        .route(
            "/loyalty/settings",
            get(loyalty::get_settings).put(loyalty::update_settings),
        )
        // Promo codes
        .route(
            "/promo-codes",
            get(promo_codes::list_promo_codes).post(promo_codes::create_promo_code),
        )
        .route("/promo-codes/redeem", post(promo_codes::redeem_promo_code))
        .route(
            "/promo-codes/:id",
            get(promo_codes::get_promo_code)
                .put(promo_codes::update_promo_code)
                .delete(promo_codes::delete_promo_code),
        )
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:id/status", patch(users::update_user_status))
        .route("/users/:id/points", post(users::adjust_points))
        // Rooms
        .route("/rooms", post(rooms::create_room))
        .route(
            "/rooms/:id",
            put(rooms::update_room).delete(rooms::delete_room),
        )
        // Spa
        .route("/spa/categories", post(spa::create_category))
        .route(
            "/spa/categories/:id",
            put(spa::update_category).delete(spa::delete_category),
        )
        .route("/spa/specialists", post(spa::create_specialist))
        .route(
            "/spa/specialists/:id",
            put(spa::update_specialist).delete(spa::delete_specialist),
        )
        .route("/spa/services", post(spa::create_service))
        .route(
            "/spa/services/:id",
            put(spa::update_service).delete(spa::delete_service),
        )
        // Events
        .route("/events", post(events::create_event))
        .route(
            "/events/:id",
            put(events::update_event).delete(events::delete_event),
        )
        // Meeting hall
        .route("/meeting-hall/halls", post(meeting_hall::create_hall))
        .route(
            "/meeting-hall/halls/:id",
            put(meeting_hall::update_hall).delete(meeting_hall::delete_hall),
        )
        .route(
            "/meeting-hall/bookings",
            get(meeting_hall::list_hall_bookings).post(meeting_hall::create_hall_booking),
        )
        .route(
            "/meeting-hall/bookings/:id",
            get(meeting_hall::get_hall_booking)
                .put(meeting_hall::update_hall_booking)
                .delete(meeting_hall::delete_hall_booking),
        )
        .route("/meeting-hall/requests", get(meeting_hall::list_requests))
        .route(
            "/meeting-hall/requests/:id",
            get(meeting_hall::get_request).delete(meeting_hall::delete_request),
        )
        .route(
            "/meeting-hall/requests/:id/status",
            patch(meeting_hall::update_request_status),
        )
        .route(
            "/meeting-hall/requests/:id/read",
            patch(meeting_hall::mark_request_read),
        )
        // Guest bookings
        .route("/bookings", get(bookings::list_bookings))
        .route(
            "/bookings/:id",
            get(bookings::get_booking).delete(bookings::delete_booking),
        )
        .route("/bookings/:id/status", patch(bookings::update_booking_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::admin_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_admin,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics::metrics_endpoint))
        .nest("/api", public_routes.merge(admin_routes))
        .nest_service("/media", ServeDir::new(&state.config.server.media_dir))
        .layer(middleware::from_fn(metrics::metrics_middleware))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.server.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::AppState;

    pub fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.server.data_dir = dir.path().to_path_buf();
        config.server.media_dir = dir.path().join("media");
        config.rate_limit.enabled = false;
        config
    }

    pub async fn app_with(config: Config) -> Router {
        let db = crate::db::init(&config.server.data_dir).await.unwrap();
        super::create_router(Arc::new(AppState::new(config, db)))
    }

    /// Router over a fresh database; keep the directory alive for the test
    pub async fn test_app() -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(test_config(&dir)).await;
        (app, dir)
    }

    pub async fn send_with(
        app: &Router,
        request: Request<Body>,
    ) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        send_with(app, request).await
    }
}
