//! Per-item outcomes of a generation run.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::SpiralError;

/// What happened to one descriptor candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemOutcome {
    /// The package directory was (re)generated
    Prepared,
    /// The resolved version matched the cache, nothing was written
    Skipped,
    /// An error stopped this item; the run carried on
    Omitted,
}

/// Pipeline step at which an item was omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Reading the candidate from disk
    Read,
    /// Parsing and validating the descriptor
    Validate,
    /// Resolving the version
    Resolve,
    /// Copying and substituting the template
    Materialize,
}

impl Stage {
    /// The stage an error belongs to.
    pub const fn of(error: &SpiralError) -> Self {
        match error {
            SpiralError::Validation(_) => Self::Validate,
            SpiralError::Resolution(_) => Self::Resolve,
            SpiralError::Materialization(_) => Self::Materialize,
            _ => Self::Read,
        }
    }
}

/// The result for one descriptor candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    /// The candidate path under the sources tree
    pub entry: PathBuf,
    /// Package name, once the descriptor has been validated
    pub name: Option<String>,
    /// Resolved version, once resolution has succeeded
    pub version: Option<String>,
    /// What happened
    pub outcome: ItemOutcome,
    /// Where an omitted item failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Why an omitted item failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ItemReport {
    pub(crate) fn prepared(entry: PathBuf, name: &str, version: &str) -> Self {
        Self {
            entry,
            name: Some(name.to_string()),
            version: Some(version.to_string()),
            outcome: ItemOutcome::Prepared,
            stage: None,
            reason: None,
        }
    }

    pub(crate) fn skipped(entry: PathBuf, name: &str, version: &str) -> Self {
        Self {
            entry,
            name: Some(name.to_string()),
            version: Some(version.to_string()),
            outcome: ItemOutcome::Skipped,
            stage: None,
            reason: None,
        }
    }

    pub(crate) fn omitted(
        entry: PathBuf,
        name: Option<String>,
        version: Option<String>,
        error: &SpiralError,
    ) -> Self {
        Self {
            entry,
            name,
            version,
            outcome: ItemOutcome::Omitted,
            stage: Some(Stage::of(error)),
            reason: Some(error.to_string()),
        }
    }
}

/// Totals per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Items generated
    pub prepared: usize,
    /// Items skipped as unchanged
    pub skipped: usize,
    /// Items that failed
    pub omitted: usize,
}

/// Everything a run did, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Per-item results
    pub items: Vec<ItemReport>,
    /// Totals
    pub summary: RunSummary,
}

impl RunReport {
    /// Append an item and update the totals.
    pub fn push(&mut self, item: ItemReport) {
        match item.outcome {
            ItemOutcome::Prepared => self.summary.prepared += 1,
            ItemOutcome::Skipped => self.summary.skipped += 1,
            ItemOutcome::Omitted => self.summary.omitted += 1,
        }
        self.items.push(item);
    }

    /// Items with the given outcome.
    pub fn with_outcome(&self, outcome: ItemOutcome) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(move |item| item.outcome == outcome)
    }

    /// Names of the packages with the given outcome, in source order.
    pub fn names(&self, outcome: ItemOutcome) -> Vec<&str> {
        self.with_outcome(outcome).filter_map(|item| item.name.as_deref()).collect()
    }

    /// The report for a package by name.
    pub fn item(&self, name: &str) -> Option<&ItemReport> {
        self.items.iter().find(|item| item.name.as_deref() == Some(name))
    }
}
