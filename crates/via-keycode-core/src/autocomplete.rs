//! Suggestion list state machine
//!
//! ```text
//!            focus / input change
//!  ┌────────┐ ──────────────────────▶ ┌──────┐
//!  │ CLOSED │                         │ OPEN │ ◀─┐ next / previous /
//!  └────────┘ ◀────────────────────── └──────┘ ──┘ input change
//!             blur / escape / select
//! ```
//!
//! The candidate list is recomputed from the [`Catalog`] on every input
//! change; the list itself is never reused between queries.

use crate::catalog::Catalog;
use crate::model::{CandidateEntry, DEFAULT_SUGGESTION_LIMIT};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

/// Events produced by the input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEvent {
    Focus,
    Blur,
    Escape,
    InputChanged(String),
    HighlightNext,
    HighlightPrevious,
}

#[derive(Debug, Clone)]
pub struct Autocomplete {
    state: MenuState,
    items: Vec<CandidateEntry>,
    highlighted: Option<usize>,
    limit: usize,
}

impl Default for Autocomplete {
    fn default() -> Self {
        Self::new(DEFAULT_SUGGESTION_LIMIT)
    }
}

impl Autocomplete {
    pub fn new(limit: usize) -> Self {
        Self {
            state: MenuState::Closed,
            items: Vec::new(),
            highlighted: None,
            limit,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    /// Current candidates, regardless of open/closed
    pub fn items(&self) -> &[CandidateEntry] {
        &self.items
    }

    pub fn highlighted(&self) -> Option<&CandidateEntry> {
        self.highlighted.and_then(|idx| self.items.get(idx))
    }

    pub fn highlighted_index(&self) -> Option<usize> {
        self.highlighted
    }

    /// Whether the list should be rendered: open and non-empty
    pub fn is_visible(&self) -> bool {
        self.state == MenuState::Open && !self.items.is_empty()
    }

    /// Re-filter without changing open/closed state.
    pub fn refresh(&mut self, catalog: &Catalog, query: &str) {
        self.items = catalog.filter(query, self.limit);
        self.highlighted = None;
    }

    pub fn handle(&mut self, event: MenuEvent, catalog: &Catalog) {
        match event {
            MenuEvent::Focus => self.state = MenuState::Open,
            MenuEvent::Blur | MenuEvent::Escape => self.close(),
            MenuEvent::InputChanged(query) => {
                self.refresh(catalog, &query);
                self.state = MenuState::Open;
            }
            MenuEvent::HighlightNext => self.step(1),
            MenuEvent::HighlightPrevious => self.step(-1),
        }
    }

    /// Take the highlighted candidate and close the menu.
    pub fn select(&mut self) -> Option<CandidateEntry> {
        if self.state != MenuState::Open {
            return None;
        }
        let selected = self.highlighted().cloned();
        self.close();
        selected
    }

    fn close(&mut self) {
        self.state = MenuState::Closed;
        self.highlighted = None;
    }

    /// Move the highlight with wrap-around; opens the menu if it was closed.
    fn step(&mut self, delta: isize) {
        self.state = MenuState::Open;
        if self.items.is_empty() {
            self.highlighted = None;
            return;
        }

        let len = self.items.len() as isize;
        let next = match self.highlighted {
            None if delta >= 0 => 0,
            None => len - 1,
            Some(idx) => (idx as isize + delta).rem_euclid(len),
        };
        self.highlighted = Some(next as usize);
    }
}
