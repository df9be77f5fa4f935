use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod accounts;
mod health;
pub mod middleware_auth;
pub mod tasks;

pub use health::health;

use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    // Full paths rather than `nest`, so the login guard sees the requested
    // URI when it builds the `next` parameter.
    let task_router = Router::new()
        .route("/my-tasks/", get(tasks::routes::list))
        .route(
            "/my-tasks/task-create/",
            get(tasks::routes::create_form).post(tasks::routes::create),
        )
        .route(
            "/my-tasks/task-update/{id}/",
            get(tasks::routes::edit_form).post(tasks::routes::update),
        )
        .route("/my-tasks/task-toggle-status/{id}/", post(tasks::routes::toggle))
        .route(
            "/my-tasks/task-delete/{id}/",
            get(tasks::routes::delete_confirm).post(tasks::routes::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_auth::require_login,
        ));

    Router::new()
        .route(
            "/",
            get(accounts::routes::login_page).post(accounts::routes::login),
        )
        .route("/logout/", post(accounts::routes::logout))
        .route(
            "/register/",
            get(accounts::routes::register_page).post(accounts::routes::register),
        )
        .route("/health", get(health))
        .merge(task_router)
        .with_state(state)
}
