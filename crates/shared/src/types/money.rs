//! Decimal amounts at the presentation boundary.
//!
//! CRITICAL: Never use floating-point for money or quantities.
//! Amounts live as `rust_decimal::Decimal` everywhere inside the ledger; the
//! grouped `"12,345.67"` form only exists on the way in (legacy records) and
//! on the way out (display).

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Number of decimal places shown for monetary amounts.
pub const AMOUNT_SCALE: u32 = 2;

/// Error returned when a grouped decimal string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyParseError {
    /// The input was empty after trimming.
    #[error("amount is empty")]
    Empty,

    /// The input is not a decimal number.
    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// Parses a decimal that may carry thousands separators, e.g. `"12,345.67"`.
///
/// Whitespace around the value is ignored. A leading `-` is accepted.
pub fn parse_amount(input: &str) -> Result<Decimal, MoneyParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(MoneyParseError::Empty);
    }

    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<Decimal>()
        .map_err(|_| MoneyParseError::Invalid(trimmed.to_string()))
}

/// Formats an amount with thousands separators and two decimal places.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format_grouped(amount, AMOUNT_SCALE)
}

/// Formats a decimal with thousands separators and a fixed number of decimals.
///
/// Rounds half away from zero, which is what people expect on a printed slip.
#[must_use]
pub fn format_grouped(value: Decimal, scale: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);

    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
