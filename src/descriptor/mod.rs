//! Package descriptor parsing and validation
//!
//! A descriptor is a small structured document describing one package to generate:
//!
//! ```json
//! {
//!     "name": "spiral-libfoo",
//!     "deps": ["libfoo1", "libfoo-dev"],
//!     "description": "metapackage for libfoo",
//!     "version": { "method": "repology", "repology": "libfoo", "distro": "debian_testing" },
//!     "PKGSEC": "libs"
//! }
//! ```
//!
//! [`validate`] turns the raw text into a [`PackageDescriptor`]. Only `name` and `deps`
//! are mandatory; fields whose key is entirely upper-case (`PKGSEC` above) are carried
//! along as extra template variables, every other unknown field is ignored.
//!
//! Once a version has been resolved, [`ResolvedPackage`] combines the descriptor with it
//! and produces the variable map consumed by [`crate::templating::materialize`].

mod format;

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::DESCRIPTION_NOTICE;
use crate::utils::fs::is_safe_component;
use crate::version::VersionSpec;

pub use format::DescriptorFormat;

/// Keys a descriptor must always carry.
pub const REQUIRED_KEYS: [&str; 2] = ["name", "deps"];

/// Descriptor validation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The text is not a structured document, or not an object
    #[error("malformed descriptor: {reason}")]
    MalformedInput {
        /// Parser message or shape problem
        reason: String,
    },

    /// A required field is absent
    #[error("field '{field}' is required")]
    MissingField {
        /// Name of the missing field (`version.static` style for nested keys)
        field: String,
    },

    /// A field is present but cannot be used
    #[error("field '{field}' is invalid: {reason}")]
    InvalidField {
        /// Name of the offending field
        field: String,
        /// What was wrong with it
        reason: String,
    },
}

/// A validated package descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Package name; also the output directory name
    pub name: String,
    /// Dependency names, passed through as opaque tokens
    pub deps: Vec<String>,
    /// Optional free-form description
    pub description: Option<String>,
    /// How the version is obtained; `None` behaves like [`VersionSpec::Unversioned`]
    pub version: Option<VersionSpec>,
    /// Upper-case extra fields, stringified
    pub extras: BTreeMap<String, String>,
}

impl PackageDescriptor {
    /// The version spec to resolve, defaulting to [`VersionSpec::Unversioned`].
    #[must_use]
    pub fn version_spec(&self) -> VersionSpec {
        self.version.clone().unwrap_or(VersionSpec::Unversioned)
    }
}

/// Validate a JSON descriptor.
///
/// # Errors
///
/// - [`ValidationError::MalformedInput`] when the text does not parse or is not an object
/// - [`ValidationError::MissingField`] when `name` or `deps` is absent
/// - [`ValidationError::InvalidField`] when a field has an unusable type
pub fn validate(raw: &str) -> Result<PackageDescriptor, ValidationError> {
    validate_as(raw, DescriptorFormat::Json)
}

/// Validate a descriptor written in the given format.
pub fn validate_as(raw: &str, format: DescriptorFormat) -> Result<PackageDescriptor, ValidationError> {
    let document = format.parse(raw)?;
    validate_value(&document)
}

/// Validate an already-parsed descriptor document.
pub fn validate_value(document: &Value) -> Result<PackageDescriptor, ValidationError> {
    let Value::Object(fields) = document else {
        return Err(ValidationError::MalformedInput {
            reason: format!("expected an object, found {}", type_name(document)),
        });
    };

    for key in REQUIRED_KEYS {
        if !fields.contains_key(key) {
            return Err(ValidationError::MissingField {
                field: key.to_string(),
            });
        }
    }

    let name = match &fields["name"] {
        Value::String(name) => name.clone(),
        other => return Err(invalid("name", format!("expected a string, found {}", type_name(other)))),
    };
    if !is_safe_component(&name) {
        return Err(invalid("name", format!("'{name}' cannot be used as a directory name")));
    }

    let deps = string_list(&fields["deps"]).ok_or_else(|| invalid("deps", "expected a list of strings"))?;

    let description = match fields.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => {
            return Err(invalid("description", format!("expected a string, found {}", type_name(other))));
        }
    };

    let version = fields.get("version").map(VersionSpec::from_value).transpose()?;

    Ok(PackageDescriptor {
        name,
        deps,
        description,
        version,
        extras: extract_extras(fields)?,
    })
}

/// Whether a descriptor key is passed through as a template variable.
///
/// The key must be non-empty, consist only of upper-case ASCII letters, digits and
/// underscores, and contain at least one letter.
#[must_use]
pub fn is_variable_key(key: &str) -> bool {
    !key.is_empty()
        && key.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        && key.chars().any(|c| c.is_ascii_uppercase())
}

fn extract_extras(fields: &Map<String, Value>) -> Result<BTreeMap<String, String>, ValidationError> {
    let mut extras = BTreeMap::new();
    for (key, value) in fields.iter().filter(|(key, _)| is_variable_key(key)) {
        let text = match value {
            Value::Array(_) => string_list(value).map(|items| items.join(" ")),
            other => scalar_to_string(other),
        }
        .ok_or_else(|| invalid(key, format!("cannot use {} as a template value", type_name(value))))?;
        extras.insert(key.clone(), text);
    }
    Ok(extras)
}

/// Stringify a scalar extra.
///
/// Floats are refused: `2.50` would come back as `2.5`, and the digits written in the
/// descriptor must reach the template unchanged. Quote them instead.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_array()?.iter().map(|item| item.as_str().map(str::to_string)).collect()
}

pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.to_string(),
        reason: reason.into(),
    }
}

pub(crate) const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// A descriptor paired with its resolved version.
///
/// This is the record the template sees. [`ResolvedPackage::variables`] exposes it as the
/// flat placeholder map: `NAME`, `DEPS`, `DESC`, `VER` and every extra under its own key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Package name
    pub name: String,
    /// Resolved version string
    pub version: String,
    /// Dependencies joined with single spaces
    pub dependency_string: String,
    /// Compatibility notice, optionally followed by the descriptor's description
    pub description: String,
    /// Upper-case extras from the descriptor
    pub extras: BTreeMap<String, String>,
}

impl ResolvedPackage {
    /// Combine a descriptor with its resolved version.
    #[must_use]
    pub fn new(descriptor: &PackageDescriptor, version: impl Into<String>) -> Self {
        let description = match &descriptor.description {
            Some(text) => format!("{DESCRIPTION_NOTICE}, {text}"),
            None => DESCRIPTION_NOTICE.to_string(),
        };

        Self {
            name: descriptor.name.clone(),
            version: version.into(),
            dependency_string: descriptor.deps.join(" "),
            description,
            extras: descriptor.extras.clone(),
        }
    }

    /// The placeholder map for template substitution.
    ///
    /// Built-in keys take precedence over extras with the same name, so an extra `VER`
    /// can never make the generated tree disagree with the version cache.
    #[must_use]
    pub fn variables(&self) -> BTreeMap<String, String> {
        let mut vars = self.extras.clone();
        vars.insert("NAME".to_string(), self.name.clone());
        vars.insert("DEPS".to_string(), self.dependency_string.clone());
        vars.insert("DESC".to_string(), self.description.clone());
        vars.insert("VER".to_string(), self.version.clone());
        vars
    }
}
