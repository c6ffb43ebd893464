use crate::config::OPEN_END_SENTINEL;
use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static PERIOD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d*)-(\d*)\s*$").unwrap());

static PERIOD_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r", ?").unwrap());

/// A single `start-end` interval. `end == None` means the name is still in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    start: Option<i64>,
    end: Option<i64>,
}

impl Period {
    pub fn parse(s: &str) -> Result<Self> {
        let caps = match PERIOD_REGEX.captures(s) {
            Some(c) => c,
            None => bail!("Invalid period format: {:?}", s),
        };
        let start = parse_year(&caps[1]).with_context(|| format!("Invalid period start: {:?}", s))?;
        let end = parse_year(&caps[2]).with_context(|| format!("Invalid period end: {:?}", s))?;
        Ok(Self { start, end })
    }

    /// End year for ordering; open-ended periods sort after every closed one.
    pub fn sort_key(&self) -> i64 {
        self.end.unwrap_or(OPEN_END_SENTINEL)
    }
}

fn parse_year(digits: &str) -> Result<Option<i64>> {
    if digits.is_empty() {
        return Ok(None);
    }
    Ok(Some(digits.parse()?))
}

/// Splits a comma-joined period descriptor into its sub-periods.
pub fn expand(descriptor: &str) -> Vec<&str> {
    PERIOD_SEPARATOR.split(descriptor).collect()
}

/// Sort key of an already expanded period string.
pub fn end_key(period: &str) -> Result<i64> {
    Ok(Period::parse(period)?.sort_key())
}

/// Whether a raw (possibly comma-joined) descriptor's last sub-period is open-ended.
pub fn is_current(descriptor: &str) -> bool {
    descriptor.trim_end().ends_with('-')
}
