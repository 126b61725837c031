// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[yare::parameterized(
    one   = { "1", Some(true) },
    yes   = { "YES", Some(true) },
    on    = { " on ", Some(true) },
    zero  = { "0", Some(false) },
    false_ = { "false", Some(false) },
    junk  = { "maybe", None },
)]
fn flag_parsing(input: &str, expected: Option<bool>) {
    assert_eq!(parse_flag(input), expected);
}

#[test]
#[serial(env)]
fn port_ignores_garbage() {
    std::env::set_var("WARLOCK_PORT", "not-a-port");
    assert_eq!(port(), None);
    std::env::set_var("WARLOCK_PORT", "9000");
    assert_eq!(port(), Some(9000));
    std::env::remove_var("WARLOCK_PORT");
}

#[test]
#[serial(env)]
fn empty_values_are_unset() {
    std::env::set_var("WARLOCK_HOST", "");
    assert_eq!(host(), None);
    std::env::remove_var("WARLOCK_HOST");
}
