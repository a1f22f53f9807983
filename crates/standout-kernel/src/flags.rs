//! Flag descriptors and the value caster.
//!
//! Every flag value that reaches a command or a global flag handler has been
//! through [`cast`]. The caster is forgiving about the *shape* of
//! its input (a raw value may already be a boolean or a number, a string, or a
//! list of any of those) and strict about the *result*: either the value
//! matches the declared [`FlagType`] or the cast fails with `None`.
//!
//! Failure is reported as `None` rather than an error so the caller decides
//! how to describe it; the [`Parser`](crate::Parser) turns it into
//! [`KernelError::InvalidFlag`](crate::KernelError::InvalidFlag).
//!
//! # Casting rules
//!
//! | Type | Accepts | Fails on |
//! |------|---------|----------|
//! | `Boolean` | `true`/`false`, the strings `"true"` and `"=true"` | everything else |
//! | `String` | non-blank strings, numbers (stringified) | blank strings, booleans, lists |
//! | `Number` | numbers, numeric strings | NaN, infinite, empty or non-numeric strings |
//! | `Array` | strings (comma split), numbers, lists | empty result |
//! | `NumArray` | numbers, comma separated numeric strings, lists | any non-numeric member, empty result |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlagType {
    /// `--verbose`, `--verbose=true`
    #[default]
    Boolean,
    /// `--name=value`
    String,
    /// `--retries=3`
    Number,
    /// `--files=a.js,b.js` or repeated `--files`
    Array,
    /// `--ports=80,443`
    NumArray,
}

impl FlagType {
    /// Human readable label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            FlagType::Boolean => "boolean",
            FlagType::String => "string",
            FlagType::Number => "numeric",
            FlagType::Array => "array of strings",
            FlagType::NumArray => "array of numbers",
        }
    }

    /// Returns true for the list kinds, which collect every occurrence.
    pub fn is_list(self) -> bool {
        matches!(self, FlagType::Array | FlagType::NumArray)
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Descriptor for a single flag, either global or owned by a command.
///
/// # Example
///
/// ```rust
/// use standout_kernel::{FlagSpec, FlagType};
///
/// let flag = FlagSpec::new("log-level")
///     .kind(FlagType::Number)
///     .alias('l')
///     .description("Verbosity, 0-4");
///
/// assert_eq!(flag.kind, FlagType::Number);
/// assert_eq!(flag.alias, Some('l'));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagSpec {
    /// Long name, used as `--name`.
    pub name: String,
    /// Optional single character alias, used as `-a`.
    #[serde(default)]
    pub alias: Option<char>,
    /// Declared type. Defaults to boolean.
    #[serde(rename = "type", default)]
    pub kind: FlagType,
    /// Value used when the flag is absent from argv. Cast like any other value.
    #[serde(default)]
    pub default: Option<RawValue>,
    /// One line description, shown by help output.
    #[serde(default)]
    pub description: String,
}

impl FlagSpec {
    /// Creates a boolean flag with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            kind: FlagType::Boolean,
            default: None,
            description: String::new(),
        }
    }

    /// Sets the declared type.
    pub fn kind(mut self, kind: FlagType) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the single character alias.
    pub fn alias(mut self, alias: char) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Sets the default value.
    pub fn default_value(mut self, value: impl Into<RawValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns true if `key` is this flag's name or alias.
    pub fn answers_to(&self, key: &str) -> bool {
        if self.name == key {
            return true;
        }
        let mut chars = key.chars();
        match (self.alias, chars.next(), chars.next()) {
            (Some(alias), Some(c), None) => alias == c,
            _ => false,
        }
    }
}

/// An uncast value as produced by argv splitting or read from a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<RawValue>),
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Number(f64::from(value))
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::String(value)
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(values: Vec<T>) -> Self {
        RawValue::Array(values.into_iter().map(Into::into).collect())
    }
}

/// A flag value after a successful cast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Number(f64),
    Array(Vec<String>),
    NumArray(Vec<f64>),
}

impl FlagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FlagValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            FlagValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_num_array(&self) -> Option<&[f64]> {
        match self {
            FlagValue::NumArray(items) => Some(items),
            _ => None,
        }
    }
}

/// Casts a raw value to the declared flag type.
///
/// Returns `None` when the value cannot represent the type.
///
/// ```rust
/// use standout_kernel::{cast, FlagType, FlagValue, RawValue};
///
/// let files = cast(FlagType::Array, &RawValue::from("a.js, b.js,"));
/// assert_eq!(files, Some(FlagValue::Array(vec!["a.js".into(), "b.js".into()])));
///
/// assert_eq!(cast(FlagType::Number, &RawValue::from("abc")), None);
/// ```
pub fn cast(kind: FlagType, raw: &RawValue) -> Option<FlagValue> {
    match kind {
        FlagType::Boolean => cast_boolean(raw),
        FlagType::String => cast_string(raw),
        FlagType::Number => cast_number(raw).map(FlagValue::Number),
        FlagType::Array => cast_array(raw),
        FlagType::NumArray => cast_num_array(raw),
    }
}

fn cast_boolean(raw: &RawValue) -> Option<FlagValue> {
    match raw {
        RawValue::Bool(b) => Some(FlagValue::Bool(*b)),
        RawValue::String(s) if s == "true" || s == "=true" => Some(FlagValue::Bool(true)),
        _ => None,
    }
}

fn cast_string(raw: &RawValue) -> Option<FlagValue> {
    match raw {
        RawValue::Number(n) => Some(FlagValue::String(n.to_string())),
        RawValue::String(s) if !s.trim().is_empty() => Some(FlagValue::String(s.clone())),
        _ => None,
    }
}

fn cast_number(raw: &RawValue) -> Option<f64> {
    let number = match raw {
        RawValue::Number(n) => *n,
        RawValue::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn cast_array(raw: &RawValue) -> Option<FlagValue> {
    let items: Vec<String> = match raw {
        RawValue::Number(n) => vec![n.to_string()],
        RawValue::String(s) => split_list(s).map(String::from).collect(),
        RawValue::Array(values) => values.iter().map(stringify).collect(),
        RawValue::Bool(_) => return None,
    };
    (!items.is_empty()).then_some(FlagValue::Array(items))
}

fn cast_num_array(raw: &RawValue) -> Option<FlagValue> {
    let items: Vec<f64> = match raw {
        RawValue::Number(_) => vec![cast_number(raw)?],
        RawValue::String(s) => split_list(s)
            .map(|fragment| cast_number(&RawValue::String(fragment.to_string())))
            .collect::<Option<_>>()?,
        RawValue::Array(values) => values.iter().map(cast_number).collect::<Option<_>>()?,
        RawValue::Bool(_) => return None,
    };
    (!items.is_empty()).then_some(FlagValue::NumArray(items))
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|part| !part.is_empty())
}

fn stringify(raw: &RawValue) -> String {
    match raw {
        RawValue::Bool(b) => b.to_string(),
        RawValue::Number(n) => n.to_string(),
        RawValue::String(s) => s.clone(),
        RawValue::Array(values) => values.iter().map(stringify).collect::<Vec<_>>().join(","),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boolean_cast() {
        assert_eq!(
            cast(FlagType::Boolean, &RawValue::Bool(false)),
            Some(FlagValue::Bool(false))
        );
        assert_eq!(
            cast(FlagType::Boolean, &RawValue::from("true")),
            Some(FlagValue::Bool(true))
        );
        assert_eq!(
            cast(FlagType::Boolean, &RawValue::from("=true")),
            Some(FlagValue::Bool(true))
        );
        assert_eq!(cast(FlagType::Boolean, &RawValue::from("yes")), None);
        assert_eq!(cast(FlagType::Boolean, &RawValue::Number(1.0)), None);
    }

    #[test]
    fn test_string_cast() {
        assert_eq!(
            cast(FlagType::String, &RawValue::from("virk")),
            Some(FlagValue::String("virk".into()))
        );
        assert_eq!(
            cast(FlagType::String, &RawValue::Number(22.0)),
            Some(FlagValue::String("22".into()))
        );
        assert_eq!(cast(FlagType::String, &RawValue::from("   ")), None);
        assert_eq!(cast(FlagType::String, &RawValue::from("")), None);
        assert_eq!(cast(FlagType::String, &RawValue::Bool(true)), None);
    }

    #[test]
    fn test_number_cast() {
        assert_eq!(
            cast(FlagType::Number, &RawValue::from("10")),
            Some(FlagValue::Number(10.0))
        );
        assert_eq!(
            cast(FlagType::Number, &RawValue::from(" 2.5 ")),
            Some(FlagValue::Number(2.5))
        );
        assert_eq!(
            cast(FlagType::Number, &RawValue::Number(-3.0)),
            Some(FlagValue::Number(-3.0))
        );
        assert_eq!(cast(FlagType::Number, &RawValue::from("")), None);
        assert_eq!(cast(FlagType::Number, &RawValue::from("ten")), None);
        assert_eq!(cast(FlagType::Number, &RawValue::from("NaN")), None);
        assert_eq!(cast(FlagType::Number, &RawValue::Number(f64::NAN)), None);
    }

    #[test]
    fn test_number_cast_rejects_infinity() {
        for text in ["inf", "infinity", "-inf", "+Infinity"] {
            assert_eq!(cast(FlagType::Number, &RawValue::from(text)), None, "{text}");
        }
        assert_eq!(cast(FlagType::Number, &RawValue::Number(f64::INFINITY)), None);
        assert_eq!(cast(FlagType::NumArray, &RawValue::from("1,inf")), None);
    }

    #[test]
    fn test_array_cast() {
        assert_eq!(
            cast(FlagType::Array, &RawValue::from("foo.js")),
            Some(FlagValue::Array(vec!["foo.js".into()]))
        );
        assert_eq!(
            cast(FlagType::Array, &RawValue::from("a, b,,c ")),
            Some(FlagValue::Array(vec!["a".into(), "b".into(), "c".into()]))
        );
        assert_eq!(
            cast(FlagType::Array, &RawValue::Number(3.0)),
            Some(FlagValue::Array(vec!["3".into()]))
        );
        assert_eq!(
            cast(FlagType::Array, &RawValue::from(vec!["x", "y"])),
            Some(FlagValue::Array(vec!["x".into(), "y".into()]))
        );
        assert_eq!(cast(FlagType::Array, &RawValue::from(" , ")), None);
        assert_eq!(cast(FlagType::Array, &RawValue::Array(vec![])), None);
    }

    #[test]
    fn test_num_array_cast() {
        assert_eq!(
            cast(FlagType::NumArray, &RawValue::from("80, 443")),
            Some(FlagValue::NumArray(vec![80.0, 443.0]))
        );
        assert_eq!(
            cast(FlagType::NumArray, &RawValue::Number(1.0)),
            Some(FlagValue::NumArray(vec![1.0]))
        );
        assert_eq!(
            cast(FlagType::NumArray, &RawValue::from(vec!["1", "2"])),
            Some(FlagValue::NumArray(vec![1.0, 2.0]))
        );
        assert_eq!(cast(FlagType::NumArray, &RawValue::from("1,two")), None);
        assert_eq!(cast(FlagType::NumArray, &RawValue::from("")), None);
    }

    #[test]
    fn test_answers_to_name_and_alias() {
        let flag = FlagSpec::new("verbose").alias('v');
        assert!(flag.answers_to("verbose"));
        assert!(flag.answers_to("v"));
        assert!(!flag.answers_to("vv"));
        assert!(!flag.answers_to("quiet"));
    }

    #[test]
    fn test_flag_spec_from_json() {
        let flag: FlagSpec = serde_json::from_value(serde_json::json!({
            "name": "ports",
            "alias": "p",
            "type": "numArray",
            "default": [80]
        }))
        .unwrap();

        assert_eq!(flag.kind, FlagType::NumArray);
        assert_eq!(flag.alias, Some('p'));
        assert_eq!(flag.default, Some(RawValue::Array(vec![RawValue::Number(80.0)])));
    }

    #[test]
    fn test_flag_type_defaults_to_boolean() {
        let flag: FlagSpec = serde_json::from_value(serde_json::json!({ "name": "force" })).unwrap();
        assert_eq!(flag.kind, FlagType::Boolean);
    }

    proptest! {
        #[test]
        fn prop_number_cast_is_finite(s in ".*") {
            if let Some(FlagValue::Number(n)) = cast(FlagType::Number, &RawValue::String(s)) {
                prop_assert!(n.is_finite());
            }
        }

        #[test]
        fn prop_array_cast_has_no_blank_members(s in "[a-z ,]{0,24}") {
            if let Some(FlagValue::Array(items)) = cast(FlagType::Array, &RawValue::String(s)) {
                prop_assert!(!items.is_empty());
                prop_assert!(items.iter().all(|item| !item.trim().is_empty()));
            }
        }

        #[test]
        fn prop_integers_round_trip(n in -1_000_000i64..1_000_000) {
            let cast_value = cast(FlagType::Number, &RawValue::String(n.to_string()));
            prop_assert_eq!(cast_value, Some(FlagValue::Number(n as f64)));
        }
    }
}
