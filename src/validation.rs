//! Parameter validation utilities.
//!
//! Hardware command sets are closed: a value is either one the vendor tool
//! accepts or it is rejected before any command is built.

use std::fmt::Display;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::traits::{DeviceError, Result};

/// Matches a printf-style sequence number field such as `%d`, `%4d` or `%04d`.
static SEQUENCE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%0?\d*d").expect("sequence placeholder pattern is valid"));

/// Validates that `value` is exactly one of `options`.
///
/// Comparison is case-sensitive content equality.
///
/// # Errors
///
/// Returns `InvalidOption` carrying the parameter name, the rejected value and
/// the complete option list in declaration order.
pub fn check_options(parameter: &str, value: &str, options: &[&str]) -> Result<()> {
    if options.iter().any(|option| *option == value) {
        return Ok(());
    }

    Err(DeviceError::InvalidOption {
        parameter: parameter.to_owned(),
        value: value.to_owned(),
        allowed: options.iter().map(|option| (*option).to_owned()).collect(),
    })
}

/// Validates that `value` lies within `min..=max`.
///
/// Unordered values such as NaN are rejected.
pub fn check_range<T>(parameter: &str, value: T, min: T, max: T) -> Result<T>
where
    T: PartialOrd + Display + Copy,
{
    if !(min..=max).contains(&value) {
        return Err(DeviceError::OutOfRange {
            parameter: parameter.to_owned(),
            value: value.to_string(),
            expected: format!("{min} to {max}"),
        });
    }
    Ok(value)
}

/// Validates that `value` is at least `min`.
pub fn check_at_least<T>(parameter: &str, value: T, min: T) -> Result<T>
where
    T: PartialOrd + Display + Copy,
{
    if !(min..).contains(&value) {
        return Err(DeviceError::OutOfRange {
            parameter: parameter.to_owned(),
            value: value.to_string(),
            expected: format!("at least {min}"),
        });
    }
    Ok(value)
}

/// Validates that a numeric `value` is one of a closed set.
pub fn check_one_of<T>(parameter: &str, value: T, allowed: &[T]) -> Result<T>
where
    T: PartialEq + Display + Copy,
{
    if allowed.contains(&value) {
        return Ok(value);
    }

    let expected = allowed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(DeviceError::OutOfRange {
        parameter: parameter.to_owned(),
        value: value.to_string(),
        expected: format!("one of {expected}"),
    })
}

/// Validates that an image sequence output name carries a sequence field.
pub fn check_sequence_placeholder(target: &str) -> Result<()> {
    if SEQUENCE_PLACEHOLDER.is_match(target) {
        Ok(())
    } else {
        Err(DeviceError::MissingSequencePlaceholder {
            target: target.to_owned(),
        })
    }
}
