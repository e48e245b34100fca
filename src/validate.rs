//! Parameter validators.
//!
//! Each validator takes a JSON value, the parameter name used in error
//! messages and its constraints. On success it hands back the value in its
//! checked shape; integers come back truncated.

use serde_json::{Map, Value};

use crate::ValidationError;

/// Requires a JSON string.
pub fn validate_string<'a>(value: &'a Value, parameter: &str) -> Result<&'a str, ValidationError> {
    value.as_str().ok_or_else(|| ValidationError::NotAString {
        parameter: parameter.to_owned(),
    })
}

/// Requires a number (or numeric string) within `[min, max]`.
///
/// Non-integral values are truncated toward zero before the range check,
/// so `"14.9"` is accepted as `14` for a maximum of `14`. Numbers too large
/// for `i64` fail the range check and are reported as the caller wrote them.
pub fn validate_integer(
    value: &Value,
    parameter: &str,
    min: i64,
    max: i64,
) -> Result<i64, ValidationError> {
    match coerce_integer(value) {
        Some(Coerced::Integer(number)) => {
            check_range(number, parameter, min, max)?;
            Ok(number)
        }
        Some(Coerced::OutOfRange { raw, negative: true }) => Err(ValidationError::BelowMinimum {
            parameter: parameter.to_owned(),
            value: raw,
            min,
        }),
        Some(Coerced::OutOfRange { raw, negative: false }) => {
            Err(ValidationError::AboveMaximum {
                parameter: parameter.to_owned(),
                value: raw,
                max,
            })
        }
        None => Err(ValidationError::NotANumber {
            parameter: parameter.to_owned(),
        }),
    }
}

fn check_range(number: i64, parameter: &str, min: i64, max: i64) -> Result<(), ValidationError> {
    if number < min {
        return Err(ValidationError::BelowMinimum {
            parameter: parameter.to_owned(),
            value: number.to_string(),
            min,
        });
    }
    if number > max {
        return Err(ValidationError::AboveMaximum {
            parameter: parameter.to_owned(),
            value: number.to_string(),
            max,
        });
    }
    Ok(())
}

/// Requires a string over `A-Z`, `a-z` and `9` whose length is within
/// `[min_length, max_length]`.
pub fn validate_tryte_sequence<'a>(
    value: &'a Value,
    parameter: &str,
    min_length: usize,
    max_length: usize,
) -> Result<&'a str, ValidationError> {
    let trytes = validate_string(value, parameter)?;
    if !trytes.chars().all(is_tryte) {
        return Err(ValidationError::IllegalTrytes {
            parameter: parameter.to_owned(),
        });
    }

    // The alphabet is ASCII, so byte length equals character count here.
    let length = trytes.len();
    if length < min_length {
        return Err(ValidationError::TooShort {
            parameter: parameter.to_owned(),
            length,
            min: min_length,
        });
    }
    if length > max_length {
        return Err(ValidationError::TooLong {
            parameter: parameter.to_owned(),
            length,
            max: max_length,
        });
    }
    Ok(trytes)
}

/// Requires a JSON array.
pub fn validate_array<'a>(
    value: &'a Value,
    parameter: &str,
) -> Result<&'a Vec<Value>, ValidationError> {
    value.as_array().ok_or_else(|| ValidationError::NotAnArray {
        parameter: parameter.to_owned(),
    })
}

/// Requires a JSON object.
pub fn validate_object<'a>(
    value: &'a Value,
    parameter: &str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    value.as_object().ok_or_else(|| ValidationError::NotAnObject {
        parameter: parameter.to_owned(),
    })
}

/// Requires a non-empty string of ASCII letters and digits.
pub fn validate_alphanumeric<'a>(
    value: &'a Value,
    parameter: &str,
) -> Result<&'a str, ValidationError> {
    let text = validate_string(value, parameter)?;
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::NotAlphanumeric {
            parameter: parameter.to_owned(),
        });
    }
    Ok(text)
}

fn is_tryte(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '9'
}

enum Coerced {
    Integer(i64),
    /// Finite (or overflowing) number outside the `i64` range.
    OutOfRange { raw: String, negative: bool },
}

// 2^63 as f64; truncated values in [-2^63, 2^63) convert to i64 exactly.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn coerce_integer(value: &Value) -> Option<Coerced> {
    let (parsed, raw) = match value {
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                return Some(Coerced::Integer(integer));
            }
            (number.as_f64()?, number.to_string())
        }
        Value::String(text) => {
            let text = text.trim();
            if let Ok(integer) = text.parse::<i64>() {
                return Some(Coerced::Integer(integer));
            }
            (text.parse::<f64>().ok()?, text.to_owned())
        }
        _ => return None,
    };

    // "NaN" and "inf" parse as floats but are not numbers a caller writes;
    // "1e400" overflows to infinity and is merely too large.
    if parsed.is_nan() || (parsed.is_infinite() && !raw.bytes().any(|b| b.is_ascii_digit())) {
        return None;
    }

    let truncated = parsed.trunc();
    if (-I64_BOUND..I64_BOUND).contains(&truncated) {
        Some(Coerced::Integer(truncate(truncated)))
    } else {
        Some(Coerced::OutOfRange {
            raw,
            negative: truncated < 0.0,
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(value: f64) -> i64 {
    value as i64
}
