//! Policies for combining repeated (mutant, input) results.

use super::OutcomeTable;
use serde::{Deserialize, Serialize};

/// Combines the table already recorded for a (mutant, input) pair with a newer one.
pub trait MergePolicy {
    fn merge(&self, existing: &mut OutcomeTable, incoming: OutcomeTable);
}

/// The newer table replaces the older one outright.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriteWins;

impl MergePolicy for LastWriteWins {
    fn merge(&self, existing: &mut OutcomeTable, incoming: OutcomeTable) {
        *existing = incoming;
    }
}

/// Counts for the same label are added together.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumCounts;

impl MergePolicy for SumCounts {
    fn merge(&self, existing: &mut OutcomeTable, incoming: OutcomeTable) {
        for (label, count) in incoming {
            let slot = existing.entry(label).or_insert(0);
            *slot = slot.saturating_add(count);
        }
    }
}

/// Named merge policy, as selected from configuration or the command line.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicyKind {
    #[default]
    LastWriteWins,
    SumCounts,
}

impl MergePolicyKind {
    pub fn policy(self) -> &'static dyn MergePolicy {
        match self {
            Self::LastWriteWins => &LastWriteWins,
            Self::SumCounts => &SumCounts,
        }
    }
}

impl std::fmt::Display for MergePolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastWriteWins => write!(f, "last_write_wins"),
            Self::SumCounts => write!(f, "sum_counts"),
        }
    }
}
