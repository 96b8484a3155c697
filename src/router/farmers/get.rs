//! Get a single farmer.

use axum::Json;
use axum::extract::{Path, State};

use crate::AppState;
use crate::error::{Context, Operation, Result};
use crate::farmer::Farmer;
use crate::router::Data;

pub async fn handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Data<Farmer>>> {
    let farmer = state
        .farmers
        .get(&id)
        .await
        .context(Operation::Get, Some(&id))?;

    Ok(Json(Data { data: farmer }))
}
