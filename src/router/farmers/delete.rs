//! Physically remove an inactive farmer.

use axum::Json;
use axum::extract::{Path, State};

use crate::AppState;
use crate::error::{Context, Operation, Result};
use crate::router::Message;

const REMOVED: &str = "Farmer removed.";

pub async fn handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message>> {
    state
        .farmers
        .delete(&id)
        .await
        .context(Operation::Delete, Some(&id))?;

    Ok(Json(Message {
        message: REMOVED.to_owned(),
    }))
}
