//! Error handler for violet.

use std::fmt;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::farmer::FarmerError;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Request being served when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Message returned to the caller on unexpected failures.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::List => "Failed to list farmers.",
            Operation::Get => "Failed to load farmer.",
            Operation::Create => "Failed to create farmer.",
            Operation::Update => "Failed to update farmer.",
            Operation::Delete => "Failed to remove farmer.",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operation::List => write!(f, "GET /farmers"),
            Operation::Get => write!(f, "GET /farmers/{{id}}"),
            Operation::Create => write!(f, "POST /farmers"),
            Operation::Update => write!(f, "PUT /farmers/{{id}}"),
            Operation::Delete => write!(f, "DELETE /farmers/{{id}}"),
        }
    }
}

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),

    #[error("{operation} failed: {source}")]
    Farmer {
        operation: Operation,
        id: Option<String>,
        #[source]
        source: FarmerError,
    },
}

/// Attach request context to farmer errors.
pub trait Context<T> {
    fn context(self, operation: Operation, id: Option<&str>) -> Result<T>;
}

impl<T> Context<T> for std::result::Result<T, FarmerError> {
    fn context(self, operation: Operation, id: Option<&str>) -> Result<T> {
        self.map_err(|source| ServerError::Farmer {
            operation,
            id: id.map(str::to_owned),
            source,
        })
    }
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `message` field.
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.into();
        self
    }

    /// Add every field error and report the first one as `message`.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        let errors = parse_validation_errors(errors);
        if let Some(first) = errors.first() {
            self.message = first.message.clone();
        }
        self.errors = Some(errors);
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: "Internal server error.".to_owned(),
            errors: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

/// Request body fields, in declaration order.
const FIELDS: &[&str] = &["fullName", "cpf", "birthDate", "phone", "active"];

/// Convert a Rust field name into its JSON (camelCase) name.
fn json_field(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            name.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}

/// Flatten validation errors, ordered as the body declares its fields.
fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            let name = json_field(field);
            issues.iter().map(move |issue| FieldError {
                field: name.clone(),
                message: issue
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {name}.")),
            })
        })
        .collect();
    fields.sort_by_key(|error| {
        let position = FIELDS.iter().position(|f| *f == error.field);
        (position.unwrap_or(FIELDS.len()), error.field.clone())
    });
    fields
}

fn farmer_response(
    operation: Operation,
    id: Option<&str>,
    err: &FarmerError,
) -> ResponseError {
    let response = ResponseError::default().status(StatusCode::BAD_REQUEST);

    match err {
        FarmerError::InvalidCpf => response.message("Invalid CPF."),
        FarmerError::InvalidFullName { min } => response.message(&format!(
            "Full name must contain at least {min} characters."
        )),
        FarmerError::InvalidBirthDate => {
            response.message("Birth date must be formatted as YYYY-MM-DD.")
        },
        FarmerError::InvalidPhone { max } => response
            .message(&format!("Phone must contain at most {max} digits.")),
        FarmerError::InvalidIdentifier => response.message("Invalid identifier."),
        FarmerError::NotFound => response
            .status(StatusCode::NOT_FOUND)
            .message("Farmer not found."),
        FarmerError::DuplicateCpf => response
            .status(StatusCode::CONFLICT)
            .message("CPF already registered."),
        FarmerError::ActiveFarmer => response
            .status(StatusCode::CONFLICT)
            .message("Deactivate the farmer before removing it."),
        FarmerError::Storage(source) => {
            tracing::error!(
                %operation,
                id = id.unwrap_or_default(),
                error = %source,
                "server returned 500 status"
            );

            ResponseError::default().message(operation.failure_message())
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default().status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => {
                response.errors(validation_errors)
            },
            ServerError::Json(rejection) => response.message(&rejection.body_text()),
            ServerError::Query(rejection) => response.message(&rejection.body_text()),
            ServerError::Farmer {
                operation,
                id,
                source,
            } => farmer_response(*operation, id.as_deref(), source),
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "message": "Internal server error.",
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use validator::ValidationError;

    use super::*;

    async fn body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (FarmerError::InvalidCpf, StatusCode::BAD_REQUEST),
            (FarmerError::InvalidIdentifier, StatusCode::BAD_REQUEST),
            (FarmerError::NotFound, StatusCode::NOT_FOUND),
            (FarmerError::DuplicateCpf, StatusCode::CONFLICT),
            (FarmerError::ActiveFarmer, StatusCode::CONFLICT),
        ];

        for (err, status) in cases {
            let response = Err::<(), _>(err)
                .context(Operation::Get, Some("id"))
                .unwrap_err()
                .into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[tokio::test]
    async fn test_storage_error_is_hidden() {
        let err = FarmerError::storage(std::io::Error::other("password leaked"));
        let response = Err::<(), _>(err)
            .context(Operation::Delete, Some("id"))
            .unwrap_err()
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body(response).await;
        assert_eq!(body["message"], "Failed to remove farmer.");
        assert!(!body.to_string().contains("password leaked"));
    }

    #[tokio::test]
    async fn test_validation_reports_fields_in_body_order() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "full_name",
            ValidationError::new("length").with_message("Name is short.".into()),
        );
        errors.add(
            "cpf",
            ValidationError::new("cpf").with_message("Invalid CPF.".into()),
        );

        let response = ServerError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body(response).await;
        assert_eq!(body["message"], "Name is short.");

        let errors = body["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0]["field"], "fullName");
        assert_eq!(errors[1]["field"], "cpf");
    }

    #[test]
    fn test_json_field() {
        assert_eq!(json_field("full_name"), "fullName");
        assert_eq!(json_field("birth_date"), "birthDate");
        assert_eq!(json_field("cpf"), "cpf");
    }
}
