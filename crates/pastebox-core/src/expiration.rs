//! Compact expiration expressions: `never`, or a positive decimal magnitude
//! followed by one of `m` (minutes), `h` (hours), `d` (days), `w` (weeks),
//! `M` (months) or `y` (years).

use chrono::{DateTime, Days, Months, TimeDelta, Utc};

use crate::error::PasteError;

pub const NEVER: &str = "never";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    Never,
    At(DateTime<Utc>),
}

impl Expiration {
    pub fn instant(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Never => None,
            Self::At(at) => Some(at),
        }
    }
}

/// Minutes and hours are fixed durations. Days and weeks follow the calendar,
/// as do months and years, which clamp to the last day of a shorter month
/// (Jan 31 + 1M is the last day of February).
pub fn compute(expr: &str, created: DateTime<Utc>) -> Result<Expiration, PasteError> {
    if expr == NEVER {
        return Ok(Expiration::Never);
    }

    let invalid = || PasteError::InvalidExpirationFormat(expr.to_string());

    let mut chars = expr.chars();
    let unit = chars.next_back().ok_or_else(invalid)?;
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let magnitude: u64 = digits.parse().map_err(|_| invalid())?;
    if magnitude == 0 {
        return Err(invalid());
    }

    let at = match unit {
        'm' => i64::try_from(magnitude)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .and_then(|d| created.checked_add_signed(d)),
        'h' => i64::try_from(magnitude)
            .ok()
            .and_then(TimeDelta::try_hours)
            .and_then(|d| created.checked_add_signed(d)),
        'd' => created.checked_add_days(Days::new(magnitude)),
        'w' => magnitude
            .checked_mul(7)
            .and_then(|days| created.checked_add_days(Days::new(days))),
        'M' => u32::try_from(magnitude)
            .ok()
            .and_then(|months| created.checked_add_months(Months::new(months))),
        'y' => magnitude
            .checked_mul(12)
            .and_then(|months| u32::try_from(months).ok())
            .and_then(|months| created.checked_add_months(Months::new(months))),
        _ => None,
    };

    at.map(Expiration::At).ok_or_else(invalid)
}
