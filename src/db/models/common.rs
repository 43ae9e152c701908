//! Common types and utilities shared across models.

use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::parse_amount;

/// Define a string-backed status enum stored as TEXT.
///
/// Generates `as_str`, case-insensitive `parse`, `ALL` and `Display`.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                let s = s.trim();
                Self::ALL.iter().copied().find(|v| v.as_str().eq_ignore_ascii_case(s))
            }

            /// Comma-separated list of accepted values, for error messages
            pub fn expected() -> String {
                Self::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

pub(crate) use string_enum;

/// Helper to parse a JSON string list column
pub fn parse_json_list(json: &str) -> Vec<String> {
    serde_json::from_str(json).unwrap_or_default()
}

/// Helper to serialize a string list for a JSON column
pub fn to_json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Trim every entry and drop the empty ones
pub fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A monetary or percentage amount sent either as a number or as text
/// such as `"25%"` or `"$50"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    pub fn value(&self) -> Option<f64> {
        match self {
            AmountInput::Number(n) if n.is_finite() => Some(*n),
            AmountInput::Number(_) => None,
            AmountInput::Text(s) => parse_amount(s),
        }
    }

    /// Blank text counts as "not set"
    pub fn is_blank(&self) -> bool {
        matches!(self, AmountInput::Text(s) if s.trim().is_empty())
    }
}

/// Field deserializer for partial updates: absent stays `None`, an explicit
/// `null` becomes `Some(None)` so the stored value can be cleared.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Pagination-free list filter shared by the simple status-filtered lists
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}
