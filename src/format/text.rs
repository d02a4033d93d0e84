use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;
use std::time::Duration;

use chrono::DateTime;
use chrono::NaiveDateTime;
use chrono::TimeZone;
use chrono::Utc;
#[cfg(test)]
use mockall::automock;

use crate::TextError;

/// Converts a scalar value to and from the text stored in a node.
#[cfg_attr(test, automock)]
pub trait TextFormat<T: Send + Sync + 'static>: Send + Sync {
    fn format(
        &self,
        value: &T,
    ) -> String;

    fn parse(
        &self,
        text: &str,
    ) -> std::result::Result<T, TextError>;
}

/// Text format of any `FromStr` + `Display` type.
pub struct FromStrFormat<T>(PhantomData<fn() -> T>);

impl<T> FromStrFormat<T> {
    pub fn new() -> Self {
        FromStrFormat(PhantomData)
    }
}

impl<T> Default for FromStrFormat<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TextFormat<T> for FromStrFormat<T>
where
    T: FromStr + Display + Send + Sync + 'static,
    T::Err: Display,
{
    fn format(
        &self,
        value: &T,
    ) -> String {
        value.to_string()
    }

    fn parse(
        &self,
        text: &str,
    ) -> std::result::Result<T, TextError> {
        text.parse::<T>().map_err(|err| TextError::new(err.to_string()))
    }
}

const DURATION_UNITS: [(&str, u128); 7] = [
    ("d", 86_400_000_000_000),
    ("h", 3_600_000_000_000),
    ("m", 60_000_000_000),
    ("s", 1_000_000_000),
    ("ms", 1_000_000),
    ("us", 1_000),
    ("ns", 1),
];

/// Durations as runs of `<integer><unit>`: `1h30m`, `250ms`, `2d`.
///
/// Units are `d`, `h`, `m`, `s`, `ms`, `us` and `ns`. Formatting emits each
/// non-zero unit from largest to smallest; zero is `0s`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationFormat;

impl TextFormat<Duration> for DurationFormat {
    fn format(
        &self,
        value: &Duration,
    ) -> String {
        let mut remaining = value.as_nanos();
        if remaining == 0 {
            return "0s".to_string();
        }
        let mut out = String::new();
        for (unit, nanos) in DURATION_UNITS {
            let count = remaining / nanos;
            if count > 0 {
                out.push_str(&count.to_string());
                out.push_str(unit);
                remaining %= nanos;
            }
        }
        out
    }

    fn parse(
        &self,
        text: &str,
    ) -> std::result::Result<Duration, TextError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TextError::new("empty duration"));
        }
        if text == "0" {
            return Ok(Duration::ZERO);
        }
        let mut total: u128 = 0;
        let mut rest = text;
        while !rest.is_empty() {
            let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            if digits == 0 {
                return Err(TextError::new(format!("expected a number in duration {:?}", text)));
            }
            let count: u128 = rest[..digits]
                .parse()
                .map_err(|_| TextError::new(format!("duration {:?} is too large", text)))?;
            rest = &rest[digits..];
            let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
            let unit = &rest[..unit_len];
            let nanos = DURATION_UNITS
                .iter()
                .find(|(name, _)| *name == unit)
                .map(|(_, nanos)| *nanos)
                .ok_or_else(|| TextError::new(format!("unknown duration unit {:?}", unit)))?;
            total = count
                .checked_mul(nanos)
                .and_then(|nanos| total.checked_add(nanos))
                .ok_or_else(|| TextError::new(format!("duration {:?} is too large", text)))?;
            rest = &rest[unit_len..];
        }
        let secs = u64::try_from(total / 1_000_000_000)
            .map_err(|_| TextError::new(format!("duration {:?} is too large", text)))?;
        Ok(Duration::new(secs, (total % 1_000_000_000) as u32))
    }
}

/// UTC instants rendered with a chrono pattern.
#[derive(Debug, Clone)]
pub struct InstantFormat {
    pattern: String,
}

impl InstantFormat {
    pub fn new(pattern: &str) -> Self {
        InstantFormat {
            pattern: pattern.to_string(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl TextFormat<DateTime<Utc>> for InstantFormat {
    fn format(
        &self,
        value: &DateTime<Utc>,
    ) -> String {
        value.format(&self.pattern).to_string()
    }

    fn parse(
        &self,
        text: &str,
    ) -> std::result::Result<DateTime<Utc>, TextError> {
        NaiveDateTime::parse_from_str(text.trim(), &self.pattern)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|err| TextError::new(format!("{} (expected pattern {:?})", err, self.pattern)))
    }
}
