// src/web/routes.rs
use crate::{
    services::upload_service::MAX_UPLOAD_BYTES,
    state::AppState,
    web::{
        admin_handlers, auth_handlers, dashboard_handlers, license_handlers, mw_admin, mw_auth,
        vehicle_handlers,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use time::Duration;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

// Folga para os campos de texto que acompanham o ficheiro
const BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/register", post(auth_handlers::handle_register))
        .route("/login", post(auth_handlers::handle_login))
        .route("/setup-admin", post(auth_handlers::handle_setup_admin));

    // --- Rotas de Admin ---
    // Exigem login E is_admin (mw_auth é aplicado no router pai)
    let admin_routes = Router::new()
        .route("/licenses", get(admin_handlers::list_licenses))
        .route("/status-options", get(admin_handlers::status_options))
        .route("/licenses/{id}/status", put(admin_handlers::set_license_status))
        .route("/licenses/{id}/file", put(admin_handlers::issue_license_file))
        .route("/stats", get(admin_handlers::admin_stats))
        .route("/users", get(admin_handlers::list_users))
        .route_layer(middleware::from_fn(mw_admin::require_admin));

    // --- Rotas Autenticadas ---
    let authenticated_routes = Router::new()
        .route("/logout", post(auth_handlers::handle_logout))
        .route("/user", get(auth_handlers::current_user))
        .route("/dashboard/stats", get(dashboard_handlers::user_stats))
        .route("/dashboard/activities", get(dashboard_handlers::recent_activities))
        .route(
            "/vehicles",
            get(vehicle_handlers::list_vehicles).post(vehicle_handlers::create_vehicle),
        )
        .route("/vehicles/type/{type}", get(vehicle_handlers::list_vehicles_by_type))
        .route(
            "/vehicles/{id}",
            get(vehicle_handlers::get_vehicle)
                .put(vehicle_handlers::update_vehicle)
                .delete(vehicle_handlers::delete_vehicle),
        )
        .route("/licenses", post(license_handlers::create_license))
        .route("/licenses/drafts", get(license_handlers::list_drafts))
        .route("/licenses/in-progress", get(license_handlers::list_in_progress))
        .route("/licenses/completed", get(license_handlers::list_completed))
        .route(
            "/licenses/{id}",
            get(license_handlers::get_license)
                .put(license_handlers::update_license)
                .delete(license_handlers::delete_license),
        )
        .nest("/admin", admin_routes)
        // require_auth cobre todas as rotas acima, incluindo /admin/*
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    let uploads = ServeDir::new(&app_state.config.upload_dir);

    Router::new()
        .nest("/api", public_routes.merge(authenticated_routes))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(app_state)
}

/// Router completo com as camadas de trace, cookies e sessão.
pub fn build_app(app_state: AppState, session_store: SqliteStore) -> Router {
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)));

    create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CookieManagerLayer::new())
            .layer(session_layer),
    )
}
