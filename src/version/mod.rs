//! Version resolution for package descriptors
//!
//! Every descriptor may carry a `version` sub-document that says how its version is
//! obtained:
//!
//! | `method`     | Behaviour                                                     |
//! |--------------|---------------------------------------------------------------|
//! | `"static"`   | the literal in `static` is the version, no I/O                |
//! | `"repology"` | the project named by `repology` is looked up remotely         |
//! | anything else / missing | the sentinel [`UNVERSIONED`] (`"9999"`)            |
//!
//! # Repology selection
//!
//! A lookup returns an ordered list of [`VersionRecord`]s, one per repository packaging
//! the project. [`select_version`] scans it once:
//!
//! 1. the first record whose repository equals the wanted distro wins immediately;
//! 2. otherwise the last record with status `"newest"` seen during the scan is kept;
//! 3. whether that "newest" record may be used is decided by the [`FallbackPolicy`].
//!
//! # Transport
//!
//! The resolver talks to the outside world only through the [`VersionLookup`] trait.
//! [`RepologyClient`] is the HTTP implementation; tests substitute scripted lookups.
//! The resolver imposes [`ResolverOptions::timeout`] on every lookup and never retries;
//! retrying transient failures is the transport's business.

mod repology;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::constants::{
    DEFAULT_DISTRO, DEFAULT_LOOKUP_TIMEOUT, LATEST_DISTRO, NEWEST_STATUS, UNVERSIONED,
};
use crate::descriptor::{ValidationError, invalid, type_name};

pub use repology::RepologyClient;

/// How a package's version is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// A literal version
    Static {
        /// The version string
        value: String,
    },
    /// Look the version up on Repology
    Repology {
        /// Repology project name
        project_key: String,
        /// Repository to prefer; the resolver default applies when `None`
        distro: Option<String>,
    },
    /// No version tracking, resolves to [`UNVERSIONED`]
    Unversioned,
}

impl VersionSpec {
    /// Parse the `version` sub-document of a descriptor.
    ///
    /// A missing or unrecognised `method` yields [`VersionSpec::Unversioned`]. A known
    /// method without its value key is a [`ValidationError::MissingField`].
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let Value::Object(fields) = value else {
            return Err(invalid("version", format!("expected an object, found {}", type_name(value))));
        };

        match fields.get("method").and_then(Value::as_str) {
            Some("static") => {
                let raw = fields.get("static").ok_or_else(|| ValidationError::MissingField {
                    field: "version.static".to_string(),
                })?;
                let Value::String(value) = raw else {
                    return Err(invalid(
                        "version.static",
                        format!("expected a string, found {}", type_name(raw)),
                    ));
                };
                let value = value.clone();
                Ok(Self::Static {
                    value,
                })
            }
            Some("repology") => {
                let project_key = match fields.get("repology") {
                    None => {
                        return Err(ValidationError::MissingField {
                            field: "version.repology".to_string(),
                        });
                    }
                    Some(Value::String(key)) => key.clone(),
                    Some(_) => return Err(invalid("version.repology", "expected a string")),
                };
                let distro = match fields.get("distro") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(distro)) => Some(distro.clone()),
                    Some(_) => return Err(invalid("version.distro", "expected a string")),
                };
                Ok(Self::Repology {
                    project_key,
                    distro,
                })
            }
            _ => Ok(Self::Unversioned),
        }
    }
}

/// One repository's view of a project, as returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Repository identifier, e.g. `debian_testing` or `arch`
    #[serde(rename = "repo", alias = "repository")]
    pub repository: String,
    /// Version packaged by that repository
    pub version: String,
    /// Repology status, notably `"newest"`
    #[serde(default)]
    pub status: String,
}

impl VersionRecord {
    /// Convenience constructor.
    pub fn new(
        repository: impl Into<String>,
        version: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            version: version.into(),
            status: status.into(),
        }
    }
}

/// When the "newest" record may stand in for a missing exact distro match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Always fall back to the last "newest" record
    #[default]
    Newest,
    /// Fall back only when the distro is the literal `"latest"`
    LatestOnly,
    /// Never fall back; an exact match is required
    Never,
}

/// Remote version lookup capability.
///
/// Given a Repology project key, return the ordered list of records for it. Errors are
/// reported as-is; the resolver turns them into [`ResolutionError::LookupFailed`].
pub trait VersionLookup: Send + Sync {
    /// Fetch all records for `project`.
    fn lookup(&self, project: &str) -> impl Future<Output = anyhow::Result<Vec<VersionRecord>>> + Send;
}

impl<T: VersionLookup> VersionLookup for &T {
    fn lookup(&self, project: &str) -> impl Future<Output = anyhow::Result<Vec<VersionRecord>>> + Send {
        (**self).lookup(project)
    }
}

/// Version resolution failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Transport failure, timeout, or unparsable response
    #[error("version lookup for '{project}' failed: {reason}")]
    LookupFailed {
        /// Repology project key
        project: String,
        /// What went wrong
        reason: String,
    },

    /// The lookup succeeded but no record was acceptable
    #[error("unable to obtain version info for '{project}' from repology")]
    NoVersionFound {
        /// Repology project key
        project: String,
    },
}

/// Resolver settings taken from the generator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Distro used when a descriptor names none
    pub default_distro: String,
    /// Precedence of the "newest" fallback
    pub fallback: FallbackPolicy,
    /// Upper bound for a single lookup
    pub timeout: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            default_distro: DEFAULT_DISTRO.to_string(),
            fallback: FallbackPolicy::default(),
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

/// Computes the authoritative version string for a [`VersionSpec`].
pub struct VersionResolver<L> {
    lookup: L,
    options: ResolverOptions,
}

impl<L: VersionLookup> VersionResolver<L> {
    /// Create a resolver over the given lookup transport.
    pub const fn new(lookup: L, options: ResolverOptions) -> Self {
        Self {
            lookup,
            options,
        }
    }

    /// Resolve a version spec.
    ///
    /// Static and unversioned specs never touch the lookup. A Repology spec performs
    /// exactly one lookup, bounded by [`ResolverOptions::timeout`].
    pub async fn resolve(&self, spec: &VersionSpec) -> Result<String, ResolutionError> {
        match spec {
            VersionSpec::Static {
                value,
            } => Ok(value.clone()),
            VersionSpec::Unversioned => Ok(UNVERSIONED.to_string()),
            VersionSpec::Repology {
                project_key,
                distro,
            } => {
                let distro = distro.as_deref().unwrap_or(&self.options.default_distro);
                debug!(target: "version", "Looking up '{}' (distro {})", project_key, distro);

                let records =
                    match tokio::time::timeout(self.options.timeout, self.lookup.lookup(project_key)).await {
                        Ok(Ok(records)) => records,
                        Ok(Err(e)) => {
                            return Err(ResolutionError::LookupFailed {
                                project: project_key.clone(),
                                reason: format!("{e:#}"),
                            });
                        }
                        Err(_) => {
                            return Err(ResolutionError::LookupFailed {
                                project: project_key.clone(),
                                reason: format!("timed out after {}s", self.options.timeout.as_secs_f32()),
                            });
                        }
                    };

                select_version(&records, distro, self.options.fallback).ok_or_else(|| {
                    ResolutionError::NoVersionFound {
                        project: project_key.clone(),
                    }
                })
            }
        }
    }
}

/// Pick a version from lookup records.
///
/// The first record packaged by `distro` short-circuits the scan. Failing that, the
/// version of the last `"newest"` record is returned if `policy` allows it.
#[must_use]
pub fn select_version(records: &[VersionRecord], distro: &str, policy: FallbackPolicy) -> Option<String> {
    let mut newest = None;
    for record in records {
        if record.repository == distro {
            return Some(record.version.clone());
        }
        if record.status == NEWEST_STATUS {
            newest = Some(&record.version);
        }
    }

    let fallback_allowed = match policy {
        FallbackPolicy::Newest => true,
        FallbackPolicy::LatestOnly => distro == LATEST_DISTRO,
        FallbackPolicy::Never => false,
    };
    if fallback_allowed { newest.cloned() } else { None }
}
