//! Money amounts and Indian-locale formatting.
//!
//! Invoice records arrive with amounts as JSON numbers, as strings with
//! thousands separators, or not at all. [`Amount::parse_lenient`] folds all of
//! those into a decimal value; [`format_inr`] renders whole rupees with the
//! lakh/crore digit grouping (`12,34,567`).

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A decimal money amount (rupees).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl ValueObject for Amount {}

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn from_i64(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Parse an amount the way invoice spreadsheets write them.
    ///
    /// - `null`, absent, `false` and `""` are zero
    /// - numbers are taken as-is
    /// - strings have `,` separators removed before parsing
    pub fn parse_lenient(raw: Option<&Value>) -> DomainResult<Self> {
        match raw {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(Self::ZERO),
            Some(Value::Number(n)) => parse_decimal(&n.to_string()).map(Self),
            Some(Value::String(s)) => Self::parse_str(s),
            Some(other) => Err(DomainError::validation(format!(
                "expected a numeric amount, got {other}"
            ))),
        }
    }

    /// Parse a textual amount, ignoring thousands separators. Blank is zero.
    pub fn parse_str(raw: &str) -> DomainResult<Self> {
        let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Ok(Self::ZERO);
        }
        parse_decimal(cleaned).map(Self)
    }

    /// Round to whole rupees using banker's rounding (half to even).
    pub fn round_rupees(&self) -> Self {
        Self(self.0.round())
    }

    /// `rate` percent of this amount (`rate` is e.g. `10` for 10%).
    pub fn percent_of(&self, rate: Decimal) -> DomainResult<Self> {
        // Divide first: the product of a large amount and the rate may not fit.
        self.0
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|v| v.checked_mul(rate))
            .map(Self)
            .ok_or_else(|| overflow(*self, "%", rate))
    }

    pub fn checked_add(self, rhs: Amount) -> DomainResult<Self> {
        self.0.checked_add(rhs.0).map(Self).ok_or_else(|| overflow(self, "+", rhs))
    }

    pub fn checked_sub(self, rhs: Amount) -> DomainResult<Self> {
        self.0.checked_sub(rhs.0).map(Self).ok_or_else(|| overflow(self, "-", rhs))
    }

    pub fn checked_mul(self, rhs: Amount) -> DomainResult<Self> {
        self.0.checked_mul(rhs.0).map(Self).ok_or_else(|| overflow(self, "*", rhs))
    }

    /// Total of `amounts`; fails instead of wrapping past the decimal range.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Amount>) -> DomainResult<Self> {
        amounts.into_iter().try_fold(Self::ZERO, Self::checked_add)
    }
}

fn overflow(lhs: Amount, op: &str, rhs: impl fmt::Display) -> DomainError {
    DomainError::invariant(format!("amount overflow: {lhs} {op} {rhs}"))
}

fn parse_decimal(text: &str) -> DomainResult<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| DomainError::validation(format!("not a number: {text:?}")))
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.normalize(), f)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

/// Format an amount as whole rupees with Indian digit grouping.
///
/// The last three digits form one group and every group to the left of it
/// has two digits: `1234567` becomes `12,34,567`.
pub fn format_inr(amount: Amount) -> String {
    let rounded = amount.round_rupees().as_decimal();
    if rounded.is_zero() {
        return "0".to_string();
    }

    let digits = rounded.abs().trunc().normalize().to_string();
    let grouped = group_indian(&digits);
    if rounded.is_sign_negative() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (rest, last3) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = rest.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&rest[start..end]);
        end = start;
    }
    groups.reverse();

    let mut out = groups.join(",");
    out.push(',');
    out.push_str(last3);
    out
}
