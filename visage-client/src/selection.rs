//! Multi-select with action-specific cardinality constraints.
//!
//! Each view owns its own [`SelectionStore`]; nothing here is shared across
//! views or hoisted to process-wide state. The store is bound to one
//! [`SelectionContext`] whose cap reflects the action it feeds: merging
//! takes exactly two albums, downloading takes any number of photos.

use std::fmt::Display;

use crate::notice::{Notice, NoticeLog};

/// The action an in-view selection feeds, with its cardinality cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionContext {
    action: &'static str,
    cap: Option<usize>,
}

impl SelectionContext {
    pub fn unconstrained(action: &'static str) -> Self {
        SelectionContext { action, cap: None }
    }

    pub fn capped(action: &'static str, cap: usize) -> Self {
        SelectionContext {
            action,
            cap: Some(cap),
        }
    }

    /// Context for merging albums: exactly two may be chosen.
    pub fn merge() -> Self {
        Self::capped("merging", 2)
    }

    /// Context for batch download: no cap.
    pub fn download() -> Self {
        Self::unconstrained("download")
    }

    pub fn action(&self) -> &'static str {
        self.action
    }

    pub fn cap(&self) -> Option<usize> {
        self.cap
    }
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Inserted,
    Removed,
    /// The insert would exceed the context's cap; membership is unchanged
    /// and the user got an advisory notice. Not an error.
    Refused,
}

/// Ordered set of selected entity identifiers.
///
/// Selection order is preserved; batch download iterates it as-is.
#[derive(Debug)]
pub struct SelectionStore<I> {
    context: SelectionContext,
    selected: Vec<I>,
}

impl<I: Copy + Eq + Display> SelectionStore<I> {
    pub fn new(context: SelectionContext) -> Self {
        SelectionStore {
            context,
            selected: Vec::new(),
        }
    }

    /// Insert or remove `id`. Inserting past the cap is refused with a
    /// notice instead of an error.
    pub fn toggle(&mut self, id: I, notices: &mut NoticeLog) -> ToggleOutcome {
        if let Some(position) = self.selected.iter().position(|selected| *selected == id) {
            self.selected.remove(position);
            return ToggleOutcome::Removed;
        }

        if let Some(cap) = self.context.cap
            && self.selected.len() >= cap
        {
            notices.push(Notice::info(format!(
                "Only {cap} items can be selected for {}",
                self.context.action
            )));
            return ToggleOutcome::Refused;
        }

        self.selected.push(id);
        ToggleOutcome::Inserted
    }

    /// Empty the selection unconditionally.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop `id` if present, bypassing the cap logic. Used when an entity
    /// disappears (deleted) rather than by user toggle.
    pub fn remove(&mut self, id: I) {
        self.selected.retain(|selected| *selected != id);
    }

    pub fn contains(&self, id: I) -> bool {
        self.selected.contains(&id)
    }

    pub fn ids(&self) -> &[I] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn context(&self) -> SelectionContext {
        self.context
    }

    /// The selected pair, when exactly two items are chosen.
    pub fn pair(&self) -> Option<(I, I)> {
        match self.selected[..] {
            [first, second] => Some((first, second)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_model::PersonId;

    #[test]
    fn toggle_is_idempotent_under_double_application() {
        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::download());

        assert_eq!(
            selection.toggle(PersonId(1), &mut notices),
            ToggleOutcome::Inserted
        );
        assert_eq!(
            selection.toggle(PersonId(1), &mut notices),
            ToggleOutcome::Removed
        );
        assert!(selection.is_empty());
    }

    #[test]
    fn merge_context_caps_at_two_with_advisory_notice() {
        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::merge());

        selection.toggle(PersonId(1), &mut notices);
        selection.toggle(PersonId(2), &mut notices);
        assert_eq!(
            selection.toggle(PersonId(3), &mut notices),
            ToggleOutcome::Refused
        );

        assert_eq!(selection.len(), 2);
        assert_eq!(notices.len(), 1);
        assert!(selection.pair().is_some());
    }

    #[test]
    fn deselect_works_even_at_cap() {
        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::merge());

        selection.toggle(PersonId(1), &mut notices);
        selection.toggle(PersonId(2), &mut notices);
        assert_eq!(
            selection.toggle(PersonId(2), &mut notices),
            ToggleOutcome::Removed
        );
        assert_eq!(selection.ids(), &[PersonId(1)]);
    }

    #[test]
    fn selection_order_is_preserved() {
        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::download());

        selection.toggle(PersonId(3), &mut notices);
        selection.toggle(PersonId(1), &mut notices);
        selection.toggle(PersonId(2), &mut notices);
        assert_eq!(selection.ids(), &[PersonId(3), PersonId(1), PersonId(2)]);
    }

    #[test]
    fn clear_is_unconditional() {
        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::merge());
        selection.toggle(PersonId(1), &mut notices);
        selection.clear();
        assert!(selection.is_empty());
    }
}
