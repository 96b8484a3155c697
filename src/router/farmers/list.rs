//! List farmers with optional filters.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Context, Operation, Result};
use crate::farmer::{Farmer, FarmerFilter, cpf};
use crate::router::Data;

/// Query string of `GET /farmers`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    full_name: Option<String>,
    cpf: Option<String>,
    active: Option<String>,
}

impl From<Params> for FarmerFilter {
    fn from(params: Params) -> Self {
        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        FarmerFilter {
            full_name: non_empty(params.full_name),
            cpf: non_empty(params.cpf).map(|c| cpf::normalize(&c)),
            // anything else than `true` or `false` means "all".
            active: match params.active.as_deref() {
                Some("true") => Some(true),
                Some("false") => Some(false),
                _ => None,
            },
        }
    }
}

pub async fn handler(
    State(state): State<AppState>,
    params: std::result::Result<Query<Params>, QueryRejection>,
) -> Result<Json<Data<Vec<Farmer>>>> {
    let Query(params) = params?;

    let farmers = state
        .farmers
        .list(&params.into())
        .await
        .context(Operation::List, None)?;

    Ok(Json(Data { data: farmers }))
}
