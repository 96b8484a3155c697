//! Update farmer data. CPF is immutable and ignored if sent.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::{Context, Operation, Result};
use crate::farmer::{Farmer, UpdateFarmer, parse_birth_date};
use crate::router::{Data, Valid};

#[derive(Debug, Default, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(custom(function = "crate::router::validate_full_name"))]
    pub full_name: String,
    #[validate(custom(function = "crate::router::validate_birth_date"))]
    pub birth_date: Option<String>,
    #[validate(custom(function = "crate::router::validate_phone"))]
    pub phone: Option<String>,
    pub active: bool,
}

pub async fn handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Valid(body): Valid<Body>,
) -> Result<Json<Data<Farmer>>> {
    let birth_date = parse_birth_date(body.birth_date.as_deref().unwrap_or_default())
        .context(Operation::Update, Some(&id))?;

    let farmer = state
        .farmers
        .update(
            &id,
            UpdateFarmer {
                full_name: body.full_name,
                birth_date,
                phone: body.phone,
                active: body.active,
            },
        )
        .await
        .context(Operation::Update, Some(&id))?;

    Ok(Json(Data { data: farmer }))
}
