//! Folding parsed records into the mutant -> input -> counts structure.

use super::merge::MergePolicy;
use super::{CountsByInput, ResultRecord};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Counts grouped by mutant identity, then by input vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountsByMutant {
    mutants: BTreeMap<String, CountsByInput>,
}

impl CountsByMutant {
    /// Fold one record in. Other inputs already recorded for the mutant are untouched;
    /// a repeated input is resolved by `policy`.
    pub fn fold(&mut self, record: ResultRecord, policy: &dyn MergePolicy) {
        let ResultRecord {
            mutant,
            input,
            counts,
        } = record;

        match self.mutants.entry(mutant) {
            Entry::Vacant(slot) => {
                tracing::debug!("New mutant {} (input {})", slot.key(), input);
                slot.insert(CountsByInput::from([(input, counts)]));
            }
            Entry::Occupied(slot) => {
                let mutant = slot.key().clone();
                match slot.into_mut().entry(input) {
                    Entry::Vacant(inner) => {
                        inner.insert(counts);
                    }
                    Entry::Occupied(mut inner) => {
                        tracing::debug!(
                            "Repeated input {} for mutant {}, merging",
                            inner.key(),
                            mutant
                        );
                        policy.merge(inner.get_mut(), counts);
                    }
                }
            }
        }
    }

    pub fn get(&self, mutant: &str) -> Option<&CountsByInput> {
        self.mutants.get(mutant)
    }

    /// Mutants in sorted identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CountsByInput)> {
        self.mutants.iter()
    }

    pub fn len(&self) -> usize {
        self.mutants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutants.is_empty()
    }
}
