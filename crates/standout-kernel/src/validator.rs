//! Registration-time validation of command descriptors.
//!
//! Validation runs once per command when it is registered with the kernel
//! (the default command included), never per invocation. A descriptor that
//! passes can be bound from argv without further shape checks.

use serde_json::Value;

use crate::command::{ArgKind, CommandSpec};
use crate::error::ValidationError;
use crate::flags::FlagSpec;

const ANONYMOUS: &str = "<anonymous>";

/// Checks that a typed descriptor is well formed.
///
/// `construct` names the thing the descriptor came from (usually the Rust type
/// implementing [`Command`](crate::Command)); the descriptor's `source` takes
/// precedence when set.
///
/// Rules:
///
/// - the command has a name;
/// - no required argument follows an optional one;
/// - a spread argument, if any, is the last argument;
/// - no two flags share a name, and no flag's alias is another flag's name
///   or alias (see [`validate_flags`]).
pub fn validate(spec: &CommandSpec, construct: &str) -> Result<(), ValidationError> {
    if spec.name.trim().is_empty() {
        return Err(ValidationError::MissingName {
            construct: spec.source.as_deref().unwrap_or(construct).to_string(),
        });
    }

    let mut optional: Option<&str> = None;
    let last = spec.args.len().saturating_sub(1);

    for (index, arg) in spec.args.iter().enumerate() {
        if let (Some(earlier), true) = (optional, arg.required) {
            return Err(ValidationError::OptionalBeforeRequired {
                optional: earlier.to_string(),
                required: arg.name.clone(),
            });
        }
        if !arg.required {
            optional = Some(&arg.name);
        }
        if arg.kind == ArgKind::Spread && index < last {
            return Err(ValidationError::SpreadNotLast {
                argument: arg.name.clone(),
            });
        }
    }

    validate_flags(&format!("command \"{}\"", spec.name), &spec.flags)
}

/// Checks that every flag of a set can be told apart on the command line.
///
/// Names must be unique, and no key a flag answers to (its name or its
/// alias) may also be answered to by another flag. `owner` names the set in
/// error messages.
///
/// ```rust
/// use standout_kernel::{validate_flags, FlagSpec};
///
/// let flags = [FlagSpec::new("help").alias('h'), FlagSpec::new("host").alias('h')];
/// assert!(validate_flags("global flags", &flags).is_err());
/// ```
pub fn validate_flags<'a, I>(owner: &str, flags: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a FlagSpec>,
{
    let flags: Vec<&FlagSpec> = flags.into_iter().collect();
    for (index, flag) in flags.iter().enumerate() {
        for earlier in &flags[..index] {
            if earlier.name == flag.name {
                return Err(ValidationError::DuplicateFlag {
                    owner: owner.to_string(),
                    flag: flag.name.clone(),
                });
            }
            if let Some(key) = shared_key(earlier, flag) {
                return Err(ValidationError::FlagConflict {
                    owner: owner.to_string(),
                    flag: flag.name.clone(),
                    other: earlier.name.clone(),
                    key,
                });
            }
        }
    }
    Ok(())
}

/// Checks a command's flags against the global flags.
///
/// A command may redeclare a global flag only with the same type and alias.
/// Distinct flags must not answer to the same key.
pub fn validate_against_globals<'a, I>(spec: &CommandSpec, globals: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a FlagSpec>,
{
    let globals: Vec<&FlagSpec> = globals.into_iter().collect();
    let owner = format!("command \"{}\" and the global flags", spec.name);

    for flag in &spec.flags {
        for global in &globals {
            if flag.name == global.name {
                if flag.kind != global.kind || flag.alias != global.alias {
                    return Err(ValidationError::GlobalFlagMismatch {
                        command: spec.name.clone(),
                        flag: flag.name.clone(),
                    });
                }
            } else if let Some(key) = shared_key(global, flag) {
                return Err(ValidationError::FlagConflict {
                    owner,
                    flag: flag.name.clone(),
                    other: global.name.clone(),
                    key,
                });
            }
        }
    }
    Ok(())
}

/// A key both flags answer to, if any.
fn shared_key(a: &FlagSpec, b: &FlagSpec) -> Option<String> {
    let keys = |flag: &FlagSpec| {
        std::iter::once(flag.name.clone()).chain(flag.alias.map(String::from))
    };
    keys(b)
        .find(|key| a.answers_to(key))
        .or_else(|| keys(a).find(|key| b.answers_to(key)))
}

/// Parses a JSON manifest entry into a validated [`CommandSpec`].
///
/// On top of [`validate`], checks the structure that typed descriptors get
/// for free: the entry is an object, `commandName` is a string and `args` /
/// `flags`, when present, are arrays.
///
/// ```rust
/// use serde_json::json;
/// use standout_kernel::validate_manifest;
///
/// let spec = validate_manifest(&json!({
///     "commandName": "greet",
///     "args": [{ "name": "name" }],
/// }))
/// .unwrap();
/// assert_eq!(spec.name, "greet");
///
/// assert!(validate_manifest(&json!({ "commandName": "greet", "args": {} })).is_err());
/// ```
pub fn validate_manifest(value: &Value) -> Result<CommandSpec, ValidationError> {
    let Some(entry) = value.as_object() else {
        return Err(ValidationError::NotACommand {
            construct: value.as_str().unwrap_or(ANONYMOUS).to_string(),
        });
    };

    let construct = entry
        .get("commandPath")
        .and_then(Value::as_str)
        .unwrap_or(ANONYMOUS);

    let Some(name) = entry.get("commandName").and_then(Value::as_str) else {
        return Err(ValidationError::MissingName {
            construct: construct.to_string(),
        });
    };

    for field in ["args", "flags"] {
        if entry.get(field).is_some_and(|v| !v.is_array()) {
            return Err(ValidationError::NotAList {
                command: name.to_string(),
                field,
            });
        }
    }

    let spec: CommandSpec =
        serde_json::from_value(value.clone()).map_err(|e| ValidationError::Malformed {
            command: name.to_string(),
            message: e.to_string(),
        })?;

    validate(&spec, construct)?;
    Ok(spec)
}
