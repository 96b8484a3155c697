pub mod farmers;
pub mod status;

#[cfg(test)]
use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::ServerError;
use crate::farmer::{self, FarmerError, cpf};
#[cfg(test)]
use crate::farmer::memory::InMemoryFarmerRepository;

/// JSON envelope of successful responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

/// Confirmation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// JSON body extractor running `validator` checks before the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

fn invalid(code: &'static str, err: FarmerError) -> ValidationError {
    let message = match err {
        FarmerError::InvalidFullName { min } => {
            format!("Full name must contain at least {min} characters.")
        },
        FarmerError::InvalidBirthDate => {
            "Birth date must be formatted as YYYY-MM-DD.".to_owned()
        },
        FarmerError::InvalidPhone { max } => {
            format!("Phone must contain at most {max} digits.")
        },
        _ => "Invalid CPF.".to_owned(),
    };
    ValidationError::new(code).with_message(message.into())
}

pub fn validate_full_name(name: &str) -> Result<(), ValidationError> {
    farmer::full_name(name)
        .map(|_| ())
        .map_err(|err| invalid("full_name", err))
}

pub fn validate_cpf(value: &str) -> Result<(), ValidationError> {
    cpf::assert_valid(value)
        .map(|_| ())
        .map_err(|err| invalid("cpf", err))
}

pub fn validate_birth_date(date: &str) -> Result<(), ValidationError> {
    farmer::parse_birth_date(date)
        .map(|_| ())
        .map_err(|err| invalid("birth_date", err))
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    farmer::phone_number(Some(phone))
        .map(|_| ())
        .map_err(|err| invalid("phone", err))
}

/// Shared state for handler tests.
#[cfg(test)]
pub fn state() -> (crate::AppState, Arc<InMemoryFarmerRepository>) {
    with_repository(InMemoryFarmerRepository::default())
}

/// Shared state whose storage always fails.
#[cfg(test)]
pub fn failing_state() -> (crate::AppState, Arc<InMemoryFarmerRepository>) {
    with_repository(InMemoryFarmerRepository::failing())
}

#[cfg(test)]
fn with_repository(
    repo: InMemoryFarmerRepository,
) -> (crate::AppState, Arc<InMemoryFarmerRepository>) {
    let repo = Arc::new(repo);
    let state = crate::AppState {
        config: Arc::new(crate::config::Configuration::default()),
        farmers: crate::farmer::FarmerService::new(repo.clone()),
        metrics: None,
    };
    (state, repo)
}
