//! Attribute checks shared by every element type.
//!
//! Each helper appends to the caller's error list instead of failing, so one
//! pass over a document collects every violation.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::enums::IsoEnum;

/// A structural violation found on one attribute of one element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{element}@{attribute}: {kind}")]
pub struct ValidationError {
    /// Tag of the offending element, e.g. `PAN`.
    pub element: String,
    /// Attribute name, e.g. `A`.
    pub attribute: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViolationKind {
    #[error("required attribute is missing")]
    Missing,
    #[error("value is {actual} characters long, at most {max} allowed")]
    TooLong { max: usize, actual: usize },
    #[error("value must be exactly {expected} characters long, found {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("value {value} outside {min}..={max}")]
    OutOfRange {
        min: String,
        max: String,
        value: String,
    },
    #[error("code {code} is not a valid {enumeration}")]
    InvalidEnum {
        enumeration: &'static str,
        code: i64,
    },
}

impl ValidationError {
    pub fn new(element: &str, attribute: &str, kind: ViolationKind) -> Self {
        Self {
            element: element.to_string(),
            attribute: attribute.to_string(),
            kind,
        }
    }
}

/// Required string with a length ceiling.
pub fn require_string(
    element: &str,
    attribute: &str,
    value: Option<&str>,
    max_len: usize,
    errors: &mut Vec<ValidationError>,
) {
    match value {
        Some(value) => validate_string(element, attribute, Some(value), max_len, errors),
        None => errors.push(ValidationError::new(element, attribute, ViolationKind::Missing)),
    }
}

/// Optional string with a length ceiling.
pub fn validate_string(
    element: &str,
    attribute: &str,
    value: Option<&str>,
    max_len: usize,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(value) = value {
        let actual = value.chars().count();
        if actual > max_len {
            errors.push(ValidationError::new(
                element,
                attribute,
                ViolationKind::TooLong {
                    max: max_len,
                    actual,
                },
            ));
        }
    }
}

/// Required string of an exact length, such as a time log file name.
pub fn require_fixed_string(
    element: &str,
    attribute: &str,
    value: Option<&str>,
    expected: usize,
    errors: &mut Vec<ValidationError>,
) {
    let Some(value) = value else {
        errors.push(ValidationError::new(element, attribute, ViolationKind::Missing));
        return;
    };
    let actual = value.chars().count();
    if actual != expected {
        errors.push(ValidationError::new(
            element,
            attribute,
            ViolationKind::WrongLength { expected, actual },
        ));
    }
}

pub fn require_range(
    element: &str,
    attribute: &str,
    value: Option<i64>,
    min: i64,
    max: i64,
    errors: &mut Vec<ValidationError>,
) {
    match value {
        Some(_) => validate_range(element, attribute, value, min, max, errors),
        None => errors.push(ValidationError::new(element, attribute, ViolationKind::Missing)),
    }
}

pub fn validate_range(
    element: &str,
    attribute: &str,
    value: Option<i64>,
    min: i64,
    max: i64,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(value) = value {
        if value < min || value > max {
            errors.push(ValidationError::new(
                element,
                attribute,
                ViolationKind::OutOfRange {
                    min: min.to_string(),
                    max: max.to_string(),
                    value: value.to_string(),
                },
            ));
        }
    }
}

pub fn require_decimal_range(
    element: &str,
    attribute: &str,
    value: Option<Decimal>,
    min: Decimal,
    max: Decimal,
    errors: &mut Vec<ValidationError>,
) {
    let Some(value) = value else {
        errors.push(ValidationError::new(element, attribute, ViolationKind::Missing));
        return;
    };
    if value < min || value > max {
        errors.push(ValidationError::new(
            element,
            attribute,
            ViolationKind::OutOfRange {
                min: min.to_string(),
                max: max.to_string(),
                value: value.to_string(),
            },
        ));
    }
}

pub fn require_enum<E: IsoEnum>(
    element: &str,
    attribute: &str,
    value: Option<E>,
    errors: &mut Vec<ValidationError>,
) {
    match value {
        Some(_) => validate_enum(element, attribute, value, errors),
        None => errors.push(ValidationError::new(element, attribute, ViolationKind::Missing)),
    }
}

pub fn validate_enum<E: IsoEnum>(
    element: &str,
    attribute: &str,
    value: Option<E>,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(value) = value {
        if !value.is_known() {
            errors.push(ValidationError::new(
                element,
                attribute,
                ViolationKind::InvalidEnum {
                    enumeration: E::NAME,
                    code: value.code(),
                },
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::TransferMode;

    #[test]
    fn string_checks() {
        let mut errors = Vec::new();
        require_string("PAN", "A", None, 14, &mut errors);
        require_string("PAN", "A", Some("PDT1"), 14, &mut errors);
        validate_string("PAN", "F", Some("VPN-123456789012"), 14, &mut errors);
        validate_string("PAN", "E", None, 14, &mut errors);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind, ViolationKind::Missing);
        assert_eq!(
            errors[1].kind,
            ViolationKind::TooLong {
                max: 14,
                actual: 16
            }
        );
        assert_eq!(errors[0].to_string(), "PAN@A: required attribute is missing");
    }

    #[test]
    fn range_and_enum_checks() {
        let mut errors = Vec::new();
        validate_range("PAN", "C", Some(-1), 0, 10, &mut errors);
        validate_range("PAN", "C", Some(10), 0, 10, &mut errors);
        validate_enum("PAN", "D", Some(TransferMode::Unknown(9)), &mut errors);
        validate_enum("PAN", "D", Some(TransferMode::Filling), &mut errors);
        require_enum::<TransferMode>("PAN", "D", None, &mut errors);
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[1].kind, ViolationKind::InvalidEnum { code: 9, .. }));
        assert_eq!(errors[2].kind, ViolationKind::Missing);
    }

    #[test]
    fn fixed_length_strings() {
        let mut errors = Vec::new();
        require_fixed_string("TLG", "A", Some("TLG00001"), 8, &mut errors);
        require_fixed_string("TLG", "A", Some("TLG1"), 8, &mut errors);
        assert_eq!(errors.len(), 1);
    }
}
