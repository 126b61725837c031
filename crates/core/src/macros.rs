// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative helpers shared across the workspace.

/// Implement `Display` for a fieldless (or field-ignoring) enum by mapping each
/// variant to a fixed label.
///
/// ```ignore
/// wl_core::simple_display! {
///     Kind {
///         Delay => "delay",
///         Cron(..) => "cron",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                })
            }
        }
    };
}
