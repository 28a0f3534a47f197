use thiserror::Error;

/// Placeholder substituted when a detector reports a class id outside the
/// plate alphabet.
pub const PLACEHOLDER: char = '?';

/// Fixed 36-symbol plate alphabet: digits '0'-'9' then letters 'A'-'Z'.
const CLASS_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("class id {0} outside the 36-symbol plate alphabet")]
pub struct UnknownClass(pub u32);

/// Map a character detector class id to its display character.
pub fn label_of(class_id: u32) -> Result<char, UnknownClass> {
    CLASS_ALPHABET
        .get(class_id as usize)
        .map(|&b| b as char)
        .ok_or(UnknownClass(class_id))
}

/// Map a class id, substituting the placeholder for unknown ids.
///
/// A single misclassified character must never abort processing of the
/// rest of the plate or of other plates in the image.
pub fn label_or_placeholder(class_id: u32) -> char {
    match label_of(class_id) {
        Ok(ch) => ch,
        Err(err) => {
            tracing::warn!("{}, substituting '{}'", err, PLACEHOLDER);
            telemetry::metrics::LPR_UNKNOWN_CLASS_IDS.inc();
            PLACEHOLDER
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_classes() {
        for (id, expected) in ('0'..='9').enumerate() {
            assert_eq!(label_of(id as u32).unwrap(), expected);
        }
    }

    #[test]
    fn test_letter_classes() {
        for (offset, expected) in ('A'..='Z').enumerate() {
            assert_eq!(label_of(10 + offset as u32).unwrap(), expected);
        }
    }

    #[test]
    fn test_alphabet_bounds() {
        assert_eq!(label_of(0).unwrap(), '0');
        assert_eq!(label_of(35).unwrap(), 'Z');
        assert_eq!(label_of(36), Err(UnknownClass(36)));
        assert_eq!(label_of(u32::MAX), Err(UnknownClass(u32::MAX)));
    }

    #[test]
    fn test_unknown_class_yields_placeholder() {
        assert_eq!(label_or_placeholder(40), PLACEHOLDER);
        assert_eq!(label_or_placeholder(11), 'B');
    }
}
