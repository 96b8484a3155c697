//! CPF (Cadastro de Pessoas Físicas) logic management.
//!
//! A CPF is made of 9 base digits followed by 2 check digits. Each check
//! digit is a weighted sum modulo 11 over the digits preceding it.

use std::fmt;

use crate::farmer::error::{FarmerError, Result};

/// Number of digits of a normalized CPF.
pub const CPF_LENGTH: usize = 11;

/// Strip every non-digit character.
pub fn strip(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Format a CPF as `DDD.DDD.DDD-DD`.
///
/// Partial input (anything that is not exactly 11 digits once stripped) is
/// returned as bare digits.
pub fn format(input: &str) -> String {
    let digits = strip(input);
    if digits.len() != CPF_LENGTH {
        return digits;
    }

    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..]
    )
}

/// Check CPF structure and both check digits.
pub fn is_valid(input: &str) -> bool {
    let digits: Vec<u32> =
        strip(input).chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != CPF_LENGTH {
        return false;
    }

    // Repeated sequences such as 111.111.111-11 pass the checksum.
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9]
        && check_digit(&digits[..10]) == digits[10]
}

/// Canonical storage form of a CPF.
#[inline]
pub fn normalize(input: &str) -> String {
    strip(input)
}

/// Returns the normalized [`Cpf`] if `input` is valid.
///
/// # Errors
///
/// Returns [`FarmerError::InvalidCpf`] otherwise.
pub fn assert_valid(input: &str) -> Result<Cpf> {
    if !is_valid(input) {
        return Err(FarmerError::InvalidCpf);
    }

    Ok(Cpf(normalize(input)))
}

/// Compute the check digit following `prefix`.
pub(crate) fn check_digit(prefix: &[u32]) -> u32 {
    let len = prefix.len() as u32;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(index, digit)| digit * (len + 1 - index as u32))
        .sum();

    match (sum * 10) % 11 {
        10 => 0,
        digit => digit,
    }
}

/// Value object of a valid, normalized CPF.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cpf(String);

impl Cpf {
    /// Converts any CPF representation into a valid [`Cpf`].
    #[inline]
    pub fn parse(input: &str) -> Result<Self> {
        assert_valid(input)
    }

    /// Returns the 11 digits as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render as `DDD.DDD.DDD-DD`.
    pub fn formatted(&self) -> String {
        format(&self.0)
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Cpf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
