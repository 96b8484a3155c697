use axum::extract::State;
use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::{Context, Operation, Result};
use crate::farmer::{CreateFarmer, Farmer, parse_birth_date};
use crate::router::{Data, Valid};

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(custom(function = "crate::router::validate_full_name"))]
    pub full_name: String,
    #[validate(custom(function = "crate::router::validate_cpf"))]
    pub cpf: String,
    #[validate(custom(function = "crate::router::validate_birth_date"))]
    pub birth_date: Option<String>,
    #[validate(custom(function = "crate::router::validate_phone"))]
    pub phone: Option<String>,
    pub active: Option<bool>,
}

/// Handler to create a farmer.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Data<Farmer>>)> {
    let birth_date = parse_birth_date(body.birth_date.as_deref().unwrap_or_default())
        .context(Operation::Create, None)?;

    let farmer = state
        .farmers
        .create(CreateFarmer {
            full_name: body.full_name,
            cpf: body.cpf,
            birth_date,
            phone: body.phone,
            active: body.active,
        })
        .await
        .context(Operation::Create, None)?;

    Ok((StatusCode::CREATED, Json(Data { data: farmer })))
}
