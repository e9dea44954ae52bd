//! Membership of candidates in the working set.
//!
//! Identity is heuristic: a record is keyed by its variant, its name and a
//! code (`id_code`/`employee_code` for regular cards, `safety_id` for safety
//! passports). Two different people with the same name and no code collide
//! and are treated as the same card.

use std::collections::HashSet;

use tracing::debug;

use crate::core::record::{CardRecord, CardVariant};

/// Identity used for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    pub variant: CardVariant,
    pub name: String,
    pub code: String,
}

impl SelectionKey {
    /// Key of a record already in the working set.
    pub fn of_selected(record: &CardRecord) -> Self {
        match record {
            CardRecord::Regular(card) => Self {
                variant: CardVariant::Regular,
                name: card.name.clone(),
                code: card.id_code.clone(),
            },
            CardRecord::Safety(card) => Self {
                variant: CardVariant::Safety,
                name: card.name.clone(),
                code: card.safety_id.clone(),
            },
        }
    }

    /// Key of a mapped source candidate.
    pub fn of_candidate(record: &CardRecord) -> Self {
        match record {
            CardRecord::Regular(card) => Self {
                variant: CardVariant::Regular,
                name: card.name.clone(),
                code: card.employee_code.clone(),
            },
            CardRecord::Safety(_) => Self::of_selected(record),
        }
    }
}

/// Tracks which candidates are already present in the working set.
#[derive(Debug, Clone, Default)]
pub struct SelectionIndex {
    keys: HashSet<SelectionKey>,
}

impl SelectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index for an existing working set.
    pub fn from_selected(working_set: &[CardRecord]) -> Self {
        Self {
            keys: working_set.iter().map(SelectionKey::of_selected).collect(),
        }
    }

    pub fn is_selected(&self, candidate: &CardRecord) -> bool {
        self.keys.contains(&SelectionKey::of_candidate(candidate))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Append `candidate` to the working set unless it is already there.
    pub fn select_one(&mut self, working_set: &mut Vec<CardRecord>, candidate: &CardRecord) -> bool {
        if !self.keys.insert(SelectionKey::of_candidate(candidate)) {
            debug!(name = candidate.name(), "skipping duplicate candidate");
            return false;
        }
        working_set.push(candidate.to_selected());
        true
    }

    /// Append every candidate not yet selected; duplicates are skipped one by one.
    pub fn select_all<'a, I>(&mut self, working_set: &mut Vec<CardRecord>, candidates: I) -> usize
    where
        I: IntoIterator<Item = &'a CardRecord>,
    {
        let before = working_set.len();
        for candidate in candidates {
            self.select_one(working_set, candidate);
        }
        working_set.len() - before
    }

    /// Register a record that entered the working set some other way.
    pub fn insert(&mut self, record: &CardRecord) -> bool {
        self.keys.insert(SelectionKey::of_selected(record))
    }

    pub fn rebuild(&mut self, working_set: &[CardRecord]) {
        *self = Self::from_selected(working_set);
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

/// Branch shown while browsing a filtered candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub code: String,
    pub name: String,
}

/// Case-insensitive search over name, branch code, branch name and safety id.
pub fn filter_candidates<'a>(candidates: &'a [CardRecord], term: &str) -> Vec<&'a CardRecord> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return candidates.iter().collect();
    }
    candidates
        .iter()
        .filter(|record| match record {
            CardRecord::Regular(card) => [&card.name, &card.branch_code, &card.branch_name]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle)),
            CardRecord::Safety(card) => [&card.name, &card.safety_id]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle)),
        })
        .collect()
}

/// Branch of the first filtered candidate, when it carries both parts.
pub fn detect_branch(filtered: &[&CardRecord]) -> Option<Branch> {
    match filtered.first()? {
        CardRecord::Regular(card) if !card.branch_code.is_empty() && !card.branch_name.is_empty() => {
            Some(Branch {
                code: card.branch_code.clone(),
                name: card.branch_name.clone(),
            })
        }
        _ => None,
    }
}
