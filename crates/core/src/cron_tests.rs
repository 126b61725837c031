// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::NaiveDate;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
}

fn next(expr: &str, after: NaiveDateTime) -> NaiveDateTime {
    CronExpr::parse(expr).unwrap().next_after(after).unwrap()
}

#[test]
fn every_fifteen_minutes() {
    assert_eq!(next("*/15 * * * *", at(2024, 3, 5, 10, 7)), at(2024, 3, 5, 10, 15));
}

#[test]
fn next_is_strictly_after() {
    assert_eq!(next("30 * * * *", at(2024, 3, 5, 10, 30)), at(2024, 3, 5, 11, 30));
}

#[test]
fn seconds_are_ignored() {
    let after = at(2024, 3, 5, 10, 7).with_second(42).unwrap();
    assert_eq!(next("* * * * *", after), at(2024, 3, 5, 10, 8));
}

#[test]
fn hour_rollover_to_next_day() {
    assert_eq!(next("0 9 * * *", at(2024, 3, 5, 17, 0)), at(2024, 3, 6, 9, 0));
}

#[test]
fn month_and_year_rollover() {
    assert_eq!(next("0 0 1 jan *", at(2024, 6, 1, 0, 0)), at(2025, 1, 1, 0, 0));
}

#[test]
fn weekday_names_and_ranges() {
    // 2024-03-09 is a Saturday
    assert_eq!(next("0 9 * * mon-fri", at(2024, 3, 9, 12, 0)), at(2024, 3, 11, 9, 0));
}

#[test]
fn sunday_as_seven() {
    let a = CronExpr::parse("0 0 * * 7").unwrap();
    let b = CronExpr::parse("0 0 * * sun").unwrap();
    assert_eq!(a.next_after(at(2024, 3, 5, 0, 0)), b.next_after(at(2024, 3, 5, 0, 0)));
    assert_eq!(a.next_after(at(2024, 3, 5, 0, 0)), Some(at(2024, 3, 10, 0, 0)));
}

#[test]
fn day_of_month_and_weekday_both_apply() {
    // Friday the 13th after March 2024 is September 2024
    assert_eq!(next("0 0 13 * fri", at(2024, 3, 1, 0, 0)), at(2024, 9, 13, 0, 0));
}

#[test]
fn leap_day() {
    assert_eq!(next("0 0 29 2 *", at(2024, 3, 1, 0, 0)), at(2028, 2, 29, 0, 0));
}

#[test]
fn impossible_date_has_no_occurrence() {
    assert!(CronExpr::parse("0 0 31 2 *").unwrap().next_after(at(2024, 1, 1, 0, 0)).is_none());
}

#[test]
fn lists_and_offset_steps() {
    let expr = CronExpr::parse("5/20,59 * * * *").unwrap();
    assert!(expr.matches(at(2024, 1, 1, 0, 5)));
    assert!(expr.matches(at(2024, 1, 1, 0, 25)));
    assert!(expr.matches(at(2024, 1, 1, 0, 45)));
    assert!(expr.matches(at(2024, 1, 1, 0, 59)));
    assert!(!expr.matches(at(2024, 1, 1, 0, 6)));
}

#[yare::parameterized(
    yearly   = { "@yearly", "0 0 1 1 *" },
    annually = { "@annually", "0 0 1 1 *" },
    monthly  = { "@monthly", "0 0 1 * *" },
    weekly   = { "@weekly", "0 0 * * 0" },
    daily    = { "@daily", "0 0 * * *" },
    midnight = { "@midnight", "0 0 * * *" },
    hourly   = { "@hourly", "0 * * * *" },
)]
fn aliases_expand(alias: &str, expanded: &str) {
    let a = CronExpr::parse(alias).unwrap();
    let b = CronExpr::parse(expanded).unwrap();
    let start = at(2024, 5, 17, 13, 42);
    assert_eq!(a.next_after(start), b.next_after(start));
    assert_eq!(a.as_str(), alias);
}

#[yare::parameterized(
    too_few      = { "* * * *" },
    too_many     = { "* * * * * *" },
    minute_range = { "60 * * * *" },
    hour_range   = { "* 24 * * *" },
    day_zero     = { "* * 0 * *" },
    month_name   = { "* * * foo *" },
    zero_step    = { "*/0 * * * *" },
    reversed     = { "30-10 * * * *" },
    garbage      = { "a b c d e" },
    reboot       = { "@reboot" },
)]
fn invalid_expressions_are_rejected(expr: &str) {
    assert!(CronExpr::parse(expr).is_err(), "{expr} should not parse");
}

#[test]
fn field_count_error_reports_count() {
    assert_eq!(CronExpr::parse("* *"), Err(CronError::FieldCount(2)));
}

#[test]
fn serde_uses_source_string() {
    let expr = CronExpr::parse("*/5 * * * *").unwrap();
    let json = serde_json::to_string(&expr).unwrap();
    assert_eq!(json, "\"*/5 * * * *\"");
    let back: CronExpr = serde_json::from_str(&json).unwrap();
    assert_eq!(back, expr);
    assert!(serde_json::from_str::<CronExpr>("\"nope\"").is_err());
}

#[test]
fn next_after_epoch_is_in_the_future() {
    let expr = CronExpr::parse("* * * * *").unwrap();
    let now = 1_700_000_000;
    let next = expr.next_after_epoch(now).unwrap();
    assert!(next > now);
    assert!(next - now <= 60);
    assert_eq!(next % 60, 0);
}

proptest::proptest! {
    #[test]
    fn next_occurrence_always_matches(
        minute in 0u32..60,
        hour in 0u32..24,
        offset in 0i64..100_000,
    ) {
        let expr = CronExpr::parse(&format!("{minute} {hour} * * *")).unwrap();
        let start = at(2024, 1, 1, 0, 0) + Duration::minutes(offset);
        let found = expr.next_after(start).unwrap();
        proptest::prop_assert!(found > start);
        proptest::prop_assert!(expr.matches(found));
        proptest::prop_assert!(found - start <= Duration::days(1));
    }
}
