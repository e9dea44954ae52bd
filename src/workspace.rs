//! Session state: active variant, loaded candidates and the working set.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::core::mapper::map_rows;
use crate::core::pagination::{PageDescriptor, paginate};
use crate::core::record::{CardRecord, CardVariant};
use crate::core::selection::{Branch, SelectionIndex, detect_branch, filter_candidates};
use crate::core::source::SourceRow;
use crate::error::{RenderError, SourceError};

/// Handle for one source load; only the most recent one may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    variant: CardVariant,
}

impl LoadTicket {
    pub fn variant(&self) -> CardVariant {
        self.variant
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    variant: CardVariant,
    candidates: Vec<CardRecord>,
    working_set: Vec<CardRecord>,
    index: SelectionIndex,
    load_generation: u64,
}

impl Workspace {
    pub fn new(variant: CardVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Resume a session from a previously saved working set.
    pub fn with_working_set(variant: CardVariant, working_set: Vec<CardRecord>) -> Self {
        Self {
            variant,
            index: SelectionIndex::from_selected(&working_set),
            working_set,
            ..Self::default()
        }
    }

    pub fn variant(&self) -> CardVariant {
        self.variant
    }

    pub fn candidates(&self) -> &[CardRecord] {
        &self.candidates
    }

    pub fn working_set(&self) -> &[CardRecord] {
        &self.working_set
    }

    pub fn into_working_set(self) -> Vec<CardRecord> {
        self.working_set
    }

    /// Change the active variant. Loaded candidates never survive a switch;
    /// the working set does. Returns whether the variant changed.
    pub fn switch_variant(&mut self, variant: CardVariant) -> bool {
        if variant == self.variant {
            return false;
        }
        info!(from = %self.variant, to = %variant, "switching card variant");
        self.variant = variant;
        self.candidates.clear();
        // Loads started under the old variant must not land afterwards.
        self.load_generation += 1;
        true
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket {
            generation: self.load_generation,
            variant: self.variant,
        }
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.load_generation && ticket.variant == self.variant
    }

    /// Map `rows` into candidates if `ticket` is still the latest load.
    pub fn complete_load(&mut self, ticket: LoadTicket, rows: Vec<SourceRow>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                generation = ticket.generation,
                latest = self.load_generation,
                "discarding stale source load"
            );
            return false;
        }
        self.candidates = map_rows(&rows, self.variant);
        info!(
            candidates = self.candidates.len(),
            variant = %self.variant,
            "source loaded"
        );
        true
    }

    /// Record a failed load; the candidate set is left empty.
    pub fn fail_load(&mut self, ticket: LoadTicket, err: &SourceError) {
        if !self.is_current(ticket) {
            debug!(error = %err, "ignoring failure of stale source load");
            return;
        }
        warn!(error = %err, "source load failed; no candidates available");
        self.candidates.clear();
    }

    /// Install candidates directly, bypassing the load protocol.
    pub fn set_candidates(&mut self, rows: &[SourceRow]) {
        self.candidates = map_rows(rows, self.variant);
    }

    pub fn search(&self, term: &str) -> Vec<&CardRecord> {
        filter_candidates(&self.candidates, term)
    }

    pub fn selected_branch(&self, term: &str) -> Option<Branch> {
        detect_branch(&self.search(term))
    }

    pub fn is_selected(&self, candidate: &CardRecord) -> bool {
        self.index.is_selected(candidate)
    }

    /// Import the candidate at `candidate_index`; `false` when it is out of
    /// range or already in the working set.
    pub fn import_one(&mut self, candidate_index: usize) -> bool {
        let Some(candidate) = self.candidates.get(candidate_index) else {
            warn!(
                candidate_index,
                candidates = self.candidates.len(),
                "candidate index out of range"
            );
            return false;
        };
        self.index.select_one(&mut self.working_set, candidate)
    }

    /// Import every candidate matching `term` that is not already selected.
    pub fn import_all(&mut self, term: &str) -> usize {
        let filtered = filter_candidates(&self.candidates, term);
        let added = self.index.select_all(&mut self.working_set, filtered);
        info!(added, total = self.working_set.len(), "imported candidates");
        added
    }

    /// Add a hand-entered card of the active variant. Cards without a name
    /// are rejected.
    pub fn add_manual(&mut self, record: CardRecord) -> bool {
        if record.variant() != self.variant {
            warn!(
                card = %record.variant(),
                active = %self.variant,
                "manual card does not match the active variant"
            );
            return false;
        }
        if record.name().trim().is_empty() {
            warn!("manual card rejected: name is blank");
            return false;
        }
        self.index.insert(&record);
        self.working_set.push(record);
        true
    }

    /// Replace the card at `index`, keeping its id.
    pub fn update(&mut self, index: usize, mut record: CardRecord) -> bool {
        let Some(slot) = self.working_set.get_mut(index) else {
            return false;
        };
        if slot.variant() != record.variant() {
            warn!(index, "cannot change the variant of an existing card");
            return false;
        }
        let id = slot.id();
        match &mut record {
            CardRecord::Regular(card) => card.id = id,
            CardRecord::Safety(card) => card.id = id,
        }
        *slot = record;
        self.index.rebuild(&self.working_set);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<CardRecord> {
        if index >= self.working_set.len() {
            return None;
        }
        let removed = self.working_set.remove(index);
        self.index.rebuild(&self.working_set);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.working_set.clear();
        self.index.clear();
    }

    pub fn pages(&self) -> Vec<PageDescriptor<'_>> {
        paginate(&self.working_set, self.variant)
    }

    /// Pages for print or export; an empty result is an error.
    pub fn printable_pages(&self) -> Result<Vec<PageDescriptor<'_>>, RenderError> {
        let pages = self.pages();
        if pages.is_empty() {
            return Err(RenderError::EmptyWorkingSet);
        }
        Ok(pages)
    }
}

/// File name suggested for an export made on `date`.
pub fn default_export_name(date: NaiveDate) -> String {
    format!("ID Card {}", date.format("%d%m%Y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{RegularCard, SafetyCard};
    use pretty_assertions::assert_eq;

    fn regular_row(first: &str, code: &str) -> SourceRow {
        let mut cells = vec![""; 15];
        cells[3] = "B1";
        cells[4] = "Silom";
        cells[5] = code;
        cells[9] = first;
        cells.into_iter().collect()
    }

    fn loaded(rows: Vec<SourceRow>) -> Workspace {
        let mut ws = Workspace::new(CardVariant::Regular);
        let ticket = ws.begin_load();
        assert!(ws.complete_load(ticket, rows));
        ws
    }

    #[test]
    fn switching_variant_clears_candidates_only() {
        let mut ws = loaded(vec![regular_row("Anan", "E1"), regular_row("Boon", "E2")]);
        assert!(ws.import_one(0));
        assert!(ws.switch_variant(CardVariant::Safety));
        assert!(ws.candidates().is_empty());
        assert_eq!(ws.working_set().len(), 1);
        assert!(!ws.switch_variant(CardVariant::Safety));
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut ws = Workspace::new(CardVariant::Regular);
        let first = ws.begin_load();
        let second = ws.begin_load();
        assert!(!ws.complete_load(first, vec![regular_row("Old", "E0")]));
        assert!(ws.candidates().is_empty());
        assert!(ws.complete_load(second, vec![regular_row("New", "E9")]));
        assert_eq!(ws.candidates()[0].name(), "New");
    }

    #[test]
    fn ticket_from_before_variant_switch_is_stale() {
        let mut ws = Workspace::new(CardVariant::Regular);
        let ticket = ws.begin_load();
        ws.switch_variant(CardVariant::Safety);
        ws.switch_variant(CardVariant::Regular);
        assert!(!ws.complete_load(ticket, vec![regular_row("Anan", "E1")]));
    }

    #[test]
    fn failed_load_leaves_no_candidates() {
        let mut ws = loaded(vec![regular_row("Anan", "E1")]);
        let ticket = ws.begin_load();
        ws.fail_load(ticket, &SourceError::NoSheet);
        assert!(ws.candidates().is_empty());
    }

    #[test]
    fn import_all_respects_search_and_duplicates() {
        let mut ws = loaded(vec![
            regular_row("Anan", "E1"),
            regular_row("Boon", "E2"),
            regular_row("Chai", "E3"),
        ]);
        assert_eq!(ws.import_all("anan"), 1);
        assert_eq!(ws.import_all(""), 2);
        assert_eq!(ws.import_all(""), 0);
        assert!(!ws.import_one(1));
        assert!(!ws.import_one(42));
        assert_eq!(ws.working_set().len(), 3);
        assert_eq!(
            ws.selected_branch("boon"),
            Some(Branch {
                code: "B1".into(),
                name: "Silom".into()
            })
        );
    }

    #[test]
    fn manual_entry_needs_a_name_and_matching_variant() {
        let mut ws = Workspace::new(CardVariant::Regular);
        assert!(!ws.add_manual(RegularCard::default().into()));
        assert!(!ws.add_manual(
            SafetyCard {
                name: "Malee".into(),
                ..SafetyCard::default()
            }
            .into()
        ));
        assert!(ws.add_manual(
            RegularCard {
                name: "Dao".into(),
                id_code: "E4".into(),
                ..RegularCard::default()
            }
            .into()
        ));
        assert_eq!(ws.working_set().len(), 1);
    }

    #[test]
    fn update_keeps_id_and_remove_frees_the_key() {
        let mut ws = loaded(vec![regular_row("Anan", "E1")]);
        ws.import_one(0);
        let id = ws.working_set()[0].id();
        let edited = RegularCard {
            name: "Anan K.".into(),
            id_code: "E1".into(),
            ..RegularCard::default()
        };
        assert!(ws.update(0, edited.into()));
        assert_eq!(ws.working_set()[0].id(), id);
        assert_eq!(ws.working_set()[0].name(), "Anan K.");
        assert!(!ws.is_selected(&ws.candidates()[0]));

        assert!(ws.remove(0).is_some());
        assert!(ws.remove(0).is_none());
        assert!(ws.import_one(0));
    }

    #[test]
    fn empty_working_set_is_not_printable() {
        let mut ws = loaded(vec![regular_row("Anan", "E1")]);
        assert!(matches!(
            ws.printable_pages(),
            Err(RenderError::EmptyWorkingSet)
        ));
        ws.import_all("");
        assert_eq!(ws.printable_pages().map(|p| p.len()).ok(), Some(1));
        ws.clear();
        assert!(ws.pages().is_empty());
    }

    #[test]
    fn export_name_uses_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(default_export_name(date), "ID Card 07032025");
    }
}
