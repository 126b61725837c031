// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prefixed random identifiers.

/// Define a `SmolStr` newtype identifier carrying a short type prefix.
///
/// Generated ids look like `{prefix}{nanoid(19)}` so they stay inline in a
/// `SmolStr`. Ids received from a peer are accepted verbatim via `From`.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(smol_str::SmolStr);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(smol_str::SmolStr::new(format!("{}{}", Self::PREFIX, nanoid::nanoid!(19))))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(smol_str::SmolStr::new(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(smol_str::SmolStr::new(s))
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Identifies one agent connection to the broker (the packet `SID`).
    pub struct SessionId("ses-");
}

define_id! {
    /// Handle for a local schedule entry, returned by the scheduler.
    pub struct EntryId("sch-");
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
