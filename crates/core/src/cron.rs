// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Five-field cron expressions.
//!
//! Fields are `minute hour day-of-month month day-of-week`. Each field accepts
//! `*`, numbers, `a-b` ranges, `/n` steps and comma lists; months and weekdays
//! also accept English names. Day-of-month and day-of-week must both match.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, Months, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Search horizon for the next occurrence.
const SEARCH_DAYS: i64 = 366 * 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid {field} field: {value:?}")]
    Field { field: &'static str, value: String },
    #[error("unknown alias: {0}")]
    Alias(String),
}

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
}

const MINUTE: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59, names: &[] };
const HOUR: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23, names: &[] };
const DAY: FieldSpec = FieldSpec { name: "day-of-month", min: 1, max: 31, names: &[] };
const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: &["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"],
};
// 7 is accepted as an alias for Sunday and folded onto 0 after parsing.
const WEEKDAY: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 0,
    max: 7,
    names: &["sun", "mon", "tue", "wed", "thu", "fri", "sat"],
};

/// A parsed cron expression, stored as one bitset per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CronExpr {
    source: String,
    minutes: u64,
    hours: u64,
    days: u64,
    months: u64,
    weekdays: u64,
}

impl CronExpr {
    pub fn parse(expr: &str) -> Result<Self, CronError> {
        let trimmed = expr.trim();
        let fields = match trimmed.strip_prefix('@') {
            Some(alias) => expand_alias(alias)?,
            None => trimmed,
        };

        let parts: Vec<&str> = fields.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(CronError::FieldCount(parts.len()));
        }

        let mut weekdays = parse_field(&WEEKDAY, parts[4])?;
        if weekdays & (1 << 7) != 0 {
            weekdays = (weekdays & !(1 << 7)) | 1;
        }

        Ok(Self {
            source: trimmed.to_string(),
            minutes: parse_field(&MINUTE, parts[0])?,
            hours: parse_field(&HOUR, parts[1])?,
            days: parse_field(&DAY, parts[2])?,
            months: parse_field(&MONTH, parts[3])?,
            weekdays,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when `at` (minute resolution) satisfies every field.
    pub fn matches(&self, at: NaiveDateTime) -> bool {
        self.date_matches(at) && bit(self.hours, at.hour()) && bit(self.minutes, at.minute())
    }

    fn date_matches(&self, at: NaiveDateTime) -> bool {
        bit(self.months, at.month())
            && bit(self.days, at.day())
            && bit(self.weekdays, at.weekday().num_days_from_sunday())
    }

    /// First matching minute strictly after `after`.
    pub fn next_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let start = after.with_second(0)?.with_nanosecond(0)? + Duration::minutes(1);
        let limit = after + Duration::days(SEARCH_DAYS);
        let mut t = start;

        while t <= limit {
            if !bit(self.months, t.month()) {
                t = t.date().with_day(1)?.checked_add_months(Months::new(1))?.and_hms_opt(0, 0, 0)?;
                continue;
            }
            if !self.date_matches(t) {
                t = t.date().succ_opt()?.and_hms_opt(0, 0, 0)?;
                continue;
            }
            if !bit(self.hours, t.hour()) {
                t = t.with_minute(0)? + Duration::hours(1);
                continue;
            }
            if !bit(self.minutes, t.minute()) {
                t += Duration::minutes(1);
                continue;
            }
            return Some(t);
        }
        None
    }

    /// Next occurrence after a unix timestamp (seconds), evaluated in local time.
    ///
    /// Local times that do not exist (DST gaps) are skipped.
    pub fn next_after_epoch(&self, epoch_secs: i64) -> Option<i64> {
        let mut cursor = Local.timestamp_opt(epoch_secs, 0).single()?.naive_local();
        loop {
            let next = self.next_after(cursor)?;
            if let Some(local) = Local.from_local_datetime(&next).earliest() {
                return Some(local.timestamp());
            }
            cursor = next;
        }
    }
}

impl FromStr for CronExpr {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CronExpr {
    type Error = CronError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CronExpr> for String {
    fn from(expr: CronExpr) -> Self {
        expr.source
    }
}

impl fmt::Display for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn expand_alias(alias: &str) -> Result<&'static str, CronError> {
    Ok(match alias.to_ascii_lowercase().as_str() {
        "yearly" | "annually" => "0 0 1 1 *",
        "monthly" => "0 0 1 * *",
        "weekly" => "0 0 * * 0",
        "daily" | "midnight" => "0 0 * * *",
        "hourly" => "0 * * * *",
        _ => return Err(CronError::Alias(format!("@{alias}"))),
    })
}

fn bit(set: u64, value: u32) -> bool {
    set & (1u64 << value) != 0
}

fn parse_field(spec: &FieldSpec, text: &str) -> Result<u64, CronError> {
    let invalid = || CronError::Field { field: spec.name, value: text.to_string() };
    let mut set = 0u64;

    for part in text.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| invalid())?;
                if step == 0 {
                    return Err(invalid());
                }
                (range, Some(step))
            }
            None => (part, None),
        };

        let (lo, hi) = if range == "*" {
            (spec.min, spec.max)
        } else if let Some((a, b)) = range.split_once('-') {
            (parse_value(spec, a).ok_or_else(invalid)?, parse_value(spec, b).ok_or_else(invalid)?)
        } else {
            let v = parse_value(spec, range).ok_or_else(invalid)?;
            // `5/15` means "from 5, every 15"
            if step.is_some() {
                (v, spec.max)
            } else {
                (v, v)
            }
        };

        if lo > hi {
            return Err(invalid());
        }
        let mut v = lo;
        while v <= hi {
            set |= 1u64 << v;
            v += step.unwrap_or(1);
        }
    }
    Ok(set)
}

fn parse_value(spec: &FieldSpec, token: &str) -> Option<u32> {
    let value = match token.parse::<u32>() {
        Ok(v) => v,
        Err(_) => {
            let lower = token.to_ascii_lowercase();
            let idx = spec.names.iter().position(|name| lower.starts_with(name))?;
            // month names count from 1, weekday names from 0
            idx as u32 + spec.min
        }
    };
    (spec.min..=spec.max).contains(&value).then_some(value)
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
