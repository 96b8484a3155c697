//! HTTP client for the farmers API.
//!
//! Form values are sanitized the same way the server normalizes them, so
//! what gets sent is what gets stored.

use std::fmt;
use std::str::FromStr;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::farmer::{self, Farmer, FarmerError, cpf, phone};
use crate::router::{Data, Message};

/// Message used when a failed response carries no readable `message`.
pub const FALLBACK_MESSAGE: &str = "Operation failed.";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Non-2xx response.
    #[error("{message} ({status})")]
    Http { status: u16, message: String },
    #[error("invalid identifier")]
    InvalidIdentifier,
    #[error(transparent)]
    Farmer(#[from] FarmerError),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("invalid base URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Status filter of the list form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl fmt::Display for ActiveFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ActiveFilter::All => write!(f, "all"),
            ActiveFilter::Active => write!(f, "true"),
            ActiveFilter::Inactive => write!(f, "false"),
        }
    }
}

impl FromStr for ActiveFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(ActiveFilter::All),
            "true" => Ok(ActiveFilter::Active),
            "false" => Ok(ActiveFilter::Inactive),
            other => Err(format!("unknown status filter `{other}`")),
        }
    }
}

/// Raw values of the farmer form.
#[derive(Debug, Clone, PartialEq)]
pub struct FarmerForm {
    pub full_name: String,
    pub cpf: String,
    pub birth_date: String,
    pub phone: String,
    pub active: bool,
}

impl Default for FarmerForm {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            cpf: String::new(),
            birth_date: String::new(),
            phone: String::new(),
            active: true,
        }
    }
}

impl From<&Farmer> for FarmerForm {
    fn from(farmer: &Farmer) -> Self {
        Self {
            full_name: farmer.full_name.clone(),
            cpf: farmer.cpf.clone(),
            birth_date: farmer
                .birth_date
                .map(|date| date.to_string())
                .unwrap_or_default(),
            phone: farmer.phone.clone().unwrap_or_default(),
            active: farmer.active,
        }
    }
}

/// Raw values of the list filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterForm {
    pub full_name: String,
    pub cpf: String,
    pub active: ActiveFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayload {
    pub full_name: String,
    pub cpf: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload {
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub active: bool,
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

pub fn create_payload(form: &FarmerForm) -> CreatePayload {
    CreatePayload {
        full_name: form.full_name.trim().to_owned(),
        cpf: cpf::normalize(&form.cpf),
        birth_date: non_empty(form.birth_date.trim().to_owned()),
        phone: non_empty(phone::strip_digits(&form.phone)),
        active: form.active,
    }
}

/// Same as [`create_payload`] without the CPF, which never changes.
pub fn update_payload(form: &FarmerForm) -> UpdatePayload {
    UpdatePayload {
        full_name: form.full_name.trim().to_owned(),
        birth_date: non_empty(form.birth_date.trim().to_owned()),
        phone: non_empty(phone::strip_digits(&form.phone)),
        active: form.active,
    }
}

/// Query pairs for `GET /farmers`. Empty values are left out.
pub fn query(filter: &FilterForm) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();

    let full_name = filter.full_name.trim();
    if !full_name.is_empty() {
        params.push(("fullName", full_name.to_owned()));
    }

    let cpf = cpf::normalize(&filter.cpf);
    if !cpf.is_empty() {
        params.push(("cpf", cpf));
    }

    if filter.active != ActiveFilter::All {
        params.push(("active", filter.active.to_string()));
    }

    params
}

/// Local checks run before sending a form. The server checks again.
pub fn validate(form: &FarmerForm) -> std::result::Result<(), FarmerError> {
    farmer::full_name(&form.full_name)?;
    cpf::assert_valid(&form.cpf)?;
    farmer::parse_birth_date(&form.birth_date)?;
    farmer::phone_number(Some(&form.phone))?;
    Ok(())
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Turn a non-2xx response into [`ClientError::Http`].
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(ErrorBody {
            message: Some(message),
        }) => message,
        Ok(_) => FALLBACK_MESSAGE.to_owned(),
        Err(error) => {
            tracing::debug!(%error, "cannot read error response");
            FALLBACK_MESSAGE.to_owned()
        },
    };

    Err(ClientError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Farmers API client.
#[derive(Debug, Clone)]
pub struct FarmerClient {
    http: Client,
    base: Url,
}

impl FarmerClient {
    /// Create a client targeting `base`, the root URL of the server.
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }

        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    /// `{base}/farmers[/{id}]`, with `id` percent-encoded.
    fn endpoint(&self, id: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("farmers");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    fn item(&self, id: &str) -> Result<Url> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ClientError::InvalidIdentifier);
        }
        Ok(self.endpoint(Some(id)))
    }

    pub async fn list(&self, filter: &FilterForm) -> Result<Vec<Farmer>> {
        let response = self
            .http
            .get(self.endpoint(None))
            .query(&query(filter))
            .send()
            .await?;

        let Data { data } = ensure_success(response).await?.json().await?;
        Ok(data)
    }

    pub async fn get(&self, id: &str) -> Result<Farmer> {
        let response = self.http.get(self.item(id)?).send().await?;

        let Data { data } = ensure_success(response).await?.json().await?;
        Ok(data)
    }

    pub async fn create(&self, form: &FarmerForm) -> Result<Farmer> {
        let response = self
            .http
            .post(self.endpoint(None))
            .json(&create_payload(form))
            .send()
            .await?;

        let Data { data } = ensure_success(response).await?.json().await?;
        Ok(data)
    }

    pub async fn update(&self, id: &str, form: &FarmerForm) -> Result<Farmer> {
        let response = self
            .http
            .put(self.item(id)?)
            .json(&update_payload(form))
            .send()
            .await?;

        let Data { data } = ensure_success(response).await?.json().await?;
        Ok(data)
    }

    /// Remove a farmer, returning the server confirmation.
    pub async fn remove(&self, id: &str) -> Result<String> {
        let response = self.http.delete(self.item(id)?).send().await?;

        let Message { message } = ensure_success(response).await?.json().await?;
        Ok(message)
    }
}
