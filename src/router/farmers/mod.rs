//! Farmers-related HTTP API.
mod create;
mod delete;
mod get;
mod list;
mod update;

use axum::Router;
use axum::routing::get;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /farmers` goes to `list`, `POST /farmers` to `create`.
        .route("/", get(list::handler).post(create::handler))
        .route(
            "/{id}",
            get(get::handler)
                .put(update::handler)
                .delete(delete::handler),
        )
}
