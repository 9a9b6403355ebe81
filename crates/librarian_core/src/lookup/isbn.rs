use crate::lookup::errors::LookupError;
use log::warn;
use regex::Regex;

/// Strips spaces and hyphens from `raw` and checks that what remains has the shape of an
/// ISBN-10 (last digit may be `X`) or an ISBN-13. Check digits are not verified.
/// # Errors
/// Returns `LookupError::InvalidIsbn` with the original input if the shape does not match
#[allow(clippy::missing_inline_in_public_items, reason = "Called once per lookup")]
pub fn normalize_isbn(raw: &str) -> Result<String, LookupError> {
    let isbn: String = raw
        .chars()
        .filter(|character| !character.is_whitespace() && *character != '-')
        .map(|character| character.to_ascii_uppercase())
        .collect();
    match Regex::new(r"^(?:\d{9}[\dX]|\d{13})$") {
        Ok(shape) if shape.is_match(&isbn) => Ok(isbn),
        Ok(_) => Err(LookupError::InvalidIsbn(raw.to_owned())),
        Err(error) => {
            warn!("Failed to construct ISBN regex for {raw}, {error}");
            Err(LookupError::InvalidIsbn(raw.to_owned()))
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_separators() {
        assert_eq!(normalize_isbn("978-0-261-10221-7").unwrap(), "9780261102217");
        assert_eq!(normalize_isbn(" 0 261 10221 x ").unwrap(), "026110221X");
    }

    #[test]
    fn rejects_wrong_shapes() {
        for raw in ["", "12345", "97802611022170", "X261102217", "978026110221A"] {
            assert!(
                matches!(normalize_isbn(raw), Err(LookupError::InvalidIsbn(ref input)) if input == raw),
                "{raw} should be rejected"
            );
        }
    }
}
