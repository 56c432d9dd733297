use axum::http::HeaderValue;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::state::AppState;
use crate::auth;
use crate::config::Config;

pub fn create_router(state: AppState, config: &Config) -> Router {
    let origins: Vec<HeaderValue> = config
        .cors_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let board_routes = Router::new()
        .route(
            "/",
            get(handlers::boards::list_boards).post(handlers::boards::create_board),
        )
        .route(
            "/{id}",
            get(handlers::boards::get_board)
                .patch(handlers::boards::update_board)
                .delete(handlers::boards::delete_board),
        )
        .route("/{id}/full", get(handlers::boards::get_full_board))
        .route("/{id}/dashboard", get(handlers::boards::get_dashboard))
        .route("/{id}/filtered", get(handlers::boards::get_filtered_board))
        .route(
            "/{id}/columns",
            get(handlers::boards::list_columns).post(handlers::boards::create_column),
        )
        .route("/{id}/cards", get(handlers::boards::list_board_cards));

    let column_routes = Router::new()
        .route(
            "/{id}",
            patch(handlers::columns::update_column).delete(handlers::columns::delete_column),
        )
        .route("/{id}/cards", get(handlers::columns::list_column_cards))
        .route("/{id}/order", put(handlers::columns::reorder_column));

    let card_routes = Router::new()
        .route("/", post(handlers::cards::create_card))
        .route(
            "/{id}",
            patch(handlers::cards::update_card).delete(handlers::cards::delete_card),
        )
        .route("/{id}/move", patch(handlers::cards::move_card));

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::liveness))
        .route("/api/auth/register", post(auth::handlers::register))
        .route("/api/auth/login", post(auth::handlers::login))
        .route("/api/auth/refresh", post(auth::handlers::refresh))
        .route("/api/auth/logout", post(auth::handlers::logout));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::handlers::me))
        .nest("/api/boards", board_routes)
        .nest("/api/columns", column_routes)
        .nest("/api/cards", card_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
