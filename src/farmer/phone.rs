//! Phone number display helpers.

/// Maximum number of digits kept (2 area digits + 9 local digits).
pub const PHONE_MAX_LENGTH: usize = 11;

/// Keep digits only, dropping anything past [`PHONE_MAX_LENGTH`].
pub fn strip_digits(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(PHONE_MAX_LENGTH)
        .collect()
}

/// Progressive `(DD) XXXXX-XXXX` mask.
///
/// Never checks that the number actually exists.
pub fn format(input: &str) -> String {
    let digits = strip_digits(input);

    match digits.len() {
        0 => String::new(),
        1..=2 => format!("({digits}"),
        3..=6 => format!("({}) {}", &digits[..2], &digits[2..]),
        7..=10 => {
            format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..])
        },
        _ => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
    }
}
