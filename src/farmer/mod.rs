pub mod cpf;
pub mod error;
#[cfg(test)]
pub mod memory;
pub mod phone;
pub mod policy;
mod repository;
mod service;

pub use error::{FarmerError, Result};
pub use repository::*;
pub use service::*;

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::farmer::cpf::Cpf;

/// Minimum length of a trimmed full name.
pub const FULL_NAME_MIN_LENGTH: usize = 3;

/// Farmer as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Farmer {
    pub id: FarmerId,
    pub full_name: String,
    pub cpf: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Store-assigned identifier of a [`Farmer`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct FarmerId(Uuid);

impl FarmerId {
    /// Converts a path segment into a valid [`FarmerId`].
    ///
    /// # Errors
    ///
    /// Returns [`FarmerError::InvalidIdentifier`] if `id` is not an UUID.
    pub fn parse(id: &str) -> Result<Self> {
        Uuid::parse_str(id.trim())
            .map(Self)
            .map_err(|_| FarmerError::InvalidIdentifier)
    }

    /// Generate a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for FarmerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Filters applied when listing farmers. Every filter is optional and they
/// compose with a logical AND.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FarmerFilter {
    /// Case-insensitive substring of the full name.
    pub full_name: Option<String>,
    /// Normalized CPF, exact match.
    pub cpf: Option<String>,
    pub active: Option<bool>,
}

impl FarmerFilter {
    /// Check a farmer against every filter.
    pub fn matches(&self, farmer: &Farmer) -> bool {
        let name = self.full_name.as_ref().is_none_or(|name| {
            farmer.full_name.to_lowercase().contains(&name.to_lowercase())
        });
        let cpf = self.cpf.as_ref().is_none_or(|cpf| &farmer.cpf == cpf);
        let active = self.active.is_none_or(|active| farmer.active == active);

        name && cpf && active
    }
}

/// Raw creation request, before any domain check.
#[derive(Clone, Debug, Default)]
pub struct CreateFarmer {
    pub full_name: String,
    pub cpf: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

/// Checked farmer ready to be inserted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewFarmer {
    pub full_name: String,
    pub cpf: Cpf,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub active: bool,
}

/// Mutable fields of a farmer. The CPF is deliberately absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateFarmer {
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub active: bool,
}

/// Trim a full name and check its length.
pub fn full_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.chars().count() < FULL_NAME_MIN_LENGTH {
        return Err(FarmerError::InvalidFullName {
            min: FULL_NAME_MIN_LENGTH,
        });
    }

    Ok(trimmed.to_string())
}

/// Parse a birth date sent either as `YYYY-MM-DD` or as a RFC 3339
/// timestamp.
///
/// Blank input means "unknown" and yields `Ok(None)`.
pub fn parse_birth_date(input: &str) -> Result<Option<NaiveDate>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(Some(date));
    }

    DateTime::parse_from_rfc3339(input)
        .map(|datetime| Some(datetime.date_naive()))
        .map_err(|_| FarmerError::InvalidBirthDate)
}

/// Reduce a phone number to its digits.
///
/// Blank input clears the phone. Digits may be surrounded by mask
/// characters (`+`, `(`, `)`, `-`, `.` and spaces); anything else, or more
/// than [`phone::PHONE_MAX_LENGTH`] digits, is rejected.
pub fn phone_number(input: Option<&str>) -> Result<Option<String>> {
    let Some(input) = input.map(str::trim).filter(|i| !i.is_empty()) else {
        return Ok(None);
    };

    let invalid = FarmerError::InvalidPhone {
        max: phone::PHONE_MAX_LENGTH,
    };
    if !input
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | '.' | ' '))
    {
        return Err(invalid);
    }

    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() || digits.len() > phone::PHONE_MAX_LENGTH {
        return Err(invalid);
    }

    Ok(Some(digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farmer(name: &str, cpf: &str, active: bool) -> Farmer {
        Farmer {
            id: FarmerId::generate(),
            full_name: name.into(),
            cpf: cpf.into(),
            birth_date: None,
            phone: None,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_farmer_id() {
        let id = FarmerId::generate();
        assert_eq!(FarmerId::parse(&id.to_string()).unwrap(), id);
        assert!(matches!(
            FarmerId::parse("64b7f0c2e4b0a1a2b3c4d5e6"),
            Err(FarmerError::InvalidIdentifier)
        ));
        assert!(FarmerId::parse("").is_err());
    }

    #[test]
    fn test_full_name() {
        assert_eq!(full_name("  Ana Maria  ").unwrap(), "Ana Maria");
        assert!(full_name("Jo").is_err());
        assert!(full_name("  Jo   ").is_err());
        assert_eq!(full_name("Zé Lu").unwrap(), "Zé Lu");
    }

    #[test]
    fn test_parse_birth_date() {
        let date = NaiveDate::from_ymd_opt(1985, 4, 12);
        assert_eq!(parse_birth_date("1985-04-12").unwrap(), date);
        assert_eq!(parse_birth_date("1985-04-12T00:00:00.000Z").unwrap(), date);
        assert_eq!(parse_birth_date("   ").unwrap(), None);
        assert!(matches!(
            parse_birth_date("12/04/1985"),
            Err(FarmerError::InvalidBirthDate)
        ));
    }

    #[test]
    fn test_phone_number() {
        assert_eq!(
            phone_number(Some(" (11) 98765-4321 ")).unwrap(),
            Some("11987654321".into())
        );
        assert_eq!(phone_number(Some("  ")).unwrap(), None);
        assert_eq!(phone_number(None).unwrap(), None);

        // Twelve digits are never cut down to eleven.
        assert!(matches!(
            phone_number(Some("+55 (11) 98765-4321")),
            Err(FarmerError::InvalidPhone { max: 11 })
        ));
        assert!(phone_number(Some("none")).is_err());
        assert!(phone_number(Some("11 9876x4321")).is_err());
    }

    #[test]
    fn test_filter_matches() {
        let ana = farmer("Ana Souza", "93541134780", true);

        assert!(FarmerFilter::default().matches(&ana));

        let by_name = FarmerFilter {
            full_name: Some("SOUZA".into()),
            ..Default::default()
        };
        assert!(by_name.matches(&ana));

        let composed = FarmerFilter {
            full_name: Some("ana".into()),
            active: Some(false),
            ..Default::default()
        };
        assert!(!composed.matches(&ana));

        let by_cpf = FarmerFilter {
            cpf: Some("93541134780".into()),
            ..Default::default()
        };
        assert!(by_cpf.matches(&ana));
    }

    #[test]
    fn test_serialize_farmer() {
        let mut ana = farmer("Ana Souza", "93541134780", true);
        ana.birth_date = NaiveDate::from_ymd_opt(1985, 4, 12);

        let json = serde_json::to_value(&ana).unwrap();
        assert_eq!(json["fullName"], "Ana Souza");
        assert_eq!(json["birthDate"], "1985-04-12");
        assert_eq!(json["phone"], serde_json::Value::Null);
        assert_eq!(json["id"], ana.id.to_string());
        assert!(json["createdAt"].is_string());
    }
}
