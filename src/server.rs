use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::handlers::{elevated, protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full router: public routes, then everything under `/api` behind the session token
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let protected_routes = Router::new()
        .merge(auth_routes())
        .merge(ticket_routes())
        .merge(catalog_routes())
        .merge(request_routes())
        .merge(workflow_routes())
        .merge(user_routes())
        .merge(file_routes())
        .merge(sap_routes())
        .layer(middleware::from_fn(jwt_auth_middleware));

    let mut router = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router.with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();
    CorsLayer::permissive().allow_origin(allowed)
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new().route("/api/auth/whoami", get(auth::whoami))
}

fn ticket_routes() -> Router<AppState> {
    use protected::tickets;

    Router::new()
        .route("/api/tickets/create_ticket", post(tickets::create_ticket))
        .route("/api/tickets/update_ticket", post(tickets::update_ticket).put(tickets::update_ticket))
        .route("/api/tickets/assign_ticket", put(tickets::assign_ticket))
        .route("/api/tickets/list", get(tickets::list_tickets))
        .route("/api/tickets/get/:id_case", get(tickets::get_ticket))
        .route("/api/tickets/notes/:id_case", get(tickets::list_notes).post(tickets::add_note))
}

fn catalog_routes() -> Router<AppState> {
    use protected::catalogs;

    Router::new()
        .route("/api/catalogs/statuses", get(catalogs::statuses))
        .route("/api/catalogs/departments", get(catalogs::departments))
        .route("/api/catalogs/places", get(catalogs::places))
        .route("/api/catalogs/categories", get(catalogs::categories))
        .route("/api/catalogs/subcategories", get(catalogs::subcategories))
        .route("/api/catalogs/activities", get(catalogs::activities))
}

fn request_routes() -> Router<AppState> {
    use protected::requests;

    Router::new()
        .route("/api/requests/create_request", post(requests::create_request))
        .route("/api/requests/update_request", put(requests::update_request))
        .route("/api/requests/list", get(requests::list_requests))
        .route("/api/requests/get/:id", get(requests::get_request))
        .route("/api/requests/notes/:id", get(requests::list_notes).post(requests::add_note))
}

fn workflow_routes() -> Router<AppState> {
    use protected::workflows;

    Router::new()
        .route("/api/workflows/list", get(workflows::list_workflows))
        .route("/api/workflows/get/:id_process_category", get(workflows::get_workflow))
        .route("/api/workflows/create_workflow", post(workflows::create_workflow))
        .route("/api/workflows/update_workflow", put(workflows::update_workflow))
}

fn user_routes() -> Router<AppState> {
    use elevated::users;

    Router::new()
        .route("/api/users/list", get(users::list_users))
        .route("/api/users/subprocesses/:id_user", get(users::list_subprocesses))
        .route(
            "/api/users/subprocesses",
            post(users::grant_subprocess).delete(users::revoke_subprocess),
        )
        .route("/api/users/companies", post(users::add_company).delete(users::remove_company))
        .route("/api/users/role", put(users::set_role))
        .route("/api/users/audit_log", get(users::audit_log))
}

fn file_routes() -> Router<AppState> {
    use protected::files;

    Router::new()
        .route("/api/files/upload", post(files::upload))
        .route("/api/files/list", get(files::list))
}

fn sap_routes() -> Router<AppState> {
    use protected::sap;

    Router::new()
        .route("/api/sap/purchase_requests", post(sap::create_purchase_request))
        .route(
            "/api/sap/purchase_requests/:company/:doc_entry",
            get(sap::get_purchase_request),
        )
}
