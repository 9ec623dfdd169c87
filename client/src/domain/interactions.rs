//! Optimistic interaction state for like, repost, and follow controls.
//!
//! The board keeps the last authoritative server state for each item and a
//! transient local override set by the user. Displayed values are always
//! derived, never stored, so no sequence of toggles and refreshes can drive a
//! counter below zero.
//!
//! ## Invariants
//! - Displayed counts are computed from server state plus override only.
//! - The override is a boolean per item, not an accumulator; toggling twice
//!   restores the original view.
//! - A reconcile discards overrides for every item it carries and forgets
//!   items it does not.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors for [`ItemId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemIdValidationError {
    /// The identifier was blank.
    #[error("item id must not be empty")]
    Empty,
    /// The identifier contained a path separator or whitespace.
    #[error("item id must not contain '/', '?', '#', or whitespace")]
    InvalidCharacters,
}

/// Opaque backend identifier for a post or user.
///
/// Identifiers are interpolated into request paths, so characters that would
/// change the path structure are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "IdRepr", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Validate and construct an identifier.
    ///
    /// # Examples
    /// ```
    /// use client::domain::ItemId;
    ///
    /// assert!(ItemId::new("post-42").is_ok());
    /// assert!(ItemId::new("../admin").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, ItemIdValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ItemIdValidationError::Empty);
        }
        if raw
            .chars()
            .any(|c| matches!(c, '/' | '?' | '#') || c.is_whitespace())
        {
            return Err(ItemIdValidationError::InvalidCharacters);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ItemId> for String {
    fn from(value: ItemId) -> Self {
        value.0
    }
}

/// Backends emit identifiers as either strings or integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(u64),
}

impl TryFrom<IdRepr> for ItemId {
    type Error = ItemIdValidationError;

    fn try_from(value: IdRepr) -> Result<Self, Self::Error> {
        match value {
            IdRepr::Text(text) => Self::new(text),
            IdRepr::Number(number) => Self::new(number.to_string()),
        }
    }
}

/// Kind of interactive control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteractionKind {
    /// Like on a post.
    Like,
    /// Repost of a post.
    Repost,
    /// Follow of a user.
    Follow,
}

impl InteractionKind {
    /// Path segment used by the backend for this interaction.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Repost => "repost",
            Self::Follow => "follow",
        }
    }
}

/// Board key: one control on one item.
pub type InteractionKey = (ItemId, InteractionKind);

/// Last authoritative state reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerState {
    /// Whether the current user has the interaction active.
    pub active: bool,
    /// Total count shown next to the control.
    pub count: u64,
}

/// Authoritative state for one control, as carried by a fresh fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionSnapshot {
    /// Item the control belongs to.
    pub item: ItemId,
    /// Control kind.
    pub kind: InteractionKind,
    /// Server state for the control.
    pub state: ServerState,
}

/// Derived state for rendering a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionView {
    /// Whether the control shows as active.
    pub active: bool,
    /// Count to display; never negative.
    pub count: u64,
}

/// Server state plus the user's pending override for one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionState {
    server: ServerState,
    local_override: Option<bool>,
}

impl InteractionState {
    /// Start from authoritative server state with no override.
    pub fn new(server: ServerState) -> Self {
        Self {
            server,
            local_override: None,
        }
    }

    /// Last authoritative server state.
    pub fn server(&self) -> ServerState {
        self.server
    }

    /// Pending local override, if the user has toggled since the last fetch.
    pub fn local_override(&self) -> Option<bool> {
        self.local_override
    }

    /// Flag the control currently shows.
    pub fn effective_active(&self) -> bool {
        self.local_override.unwrap_or(self.server.active)
    }

    /// Derived view for rendering.
    ///
    /// # Examples
    /// ```
    /// use client::domain::{InteractionState, ServerState};
    ///
    /// let mut state = InteractionState::new(ServerState { active: false, count: 0 });
    /// state.toggle();
    /// assert_eq!(state.view().count, 1);
    /// state.toggle();
    /// assert_eq!(state.view().count, 0);
    /// ```
    pub fn view(&self) -> InteractionView {
        let active = self.effective_active();
        let count = match (active, self.server.active) {
            (true, false) => self.server.count.saturating_add(1),
            (false, true) => self.server.count.saturating_sub(1),
            _ => self.server.count,
        };
        InteractionView { active, count }
    }

    /// Flip the displayed flag and report what the backend should be told.
    pub fn toggle(&mut self) -> PendingToggle {
        let previous_override = self.local_override;
        let desired = !self.effective_active();
        self.local_override = Some(desired);
        PendingToggle {
            desired,
            previous_override,
        }
    }

    /// Undo `pending` unless a newer toggle has superseded it.
    ///
    /// Returns whether the override was restored.
    pub fn revert(&mut self, pending: PendingToggle) -> bool {
        if self.local_override != Some(pending.desired) {
            return false;
        }
        self.local_override = pending.previous_override;
        true
    }

    /// Adopt authoritative state and drop the override.
    pub fn reconcile(&mut self, server: ServerState) {
        self.server = server;
        self.local_override = None;
    }
}

/// Outcome of a toggle, kept by the caller until the mutation settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingToggle {
    /// Flag the backend should now hold.
    pub desired: bool,
    /// Override in place before this toggle.
    pub previous_override: Option<bool>,
}

/// All interactive controls for one displayed collection.
#[derive(Debug, Clone, Default)]
pub struct InteractionBoard {
    entries: HashMap<InteractionKey, InteractionState>,
}

impl InteractionBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked controls.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the board tracks no controls.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw state for one control.
    pub fn state(&self, key: &InteractionKey) -> Option<&InteractionState> {
        self.entries.get(key)
    }

    /// Derived view for one control; unknown controls show as inactive/zero.
    pub fn view(&self, key: &InteractionKey) -> InteractionView {
        self.entries
            .get(key)
            .copied()
            .unwrap_or_default()
            .view()
    }

    /// Toggle one control, tracking it from a zero state if it is unknown.
    pub fn toggle(&mut self, key: InteractionKey) -> PendingToggle {
        self.entries.entry(key).or_default().toggle()
    }

    /// Undo a toggle whose mutation failed.
    pub fn revert(&mut self, key: &InteractionKey, pending: PendingToggle) -> bool {
        self.entries
            .get_mut(key)
            .is_some_and(|state| state.revert(pending))
    }

    /// Replace board contents with a fresh authoritative payload.
    ///
    /// Controls carried by `snapshots` adopt server state and lose their
    /// override; controls missing from the payload are dropped.
    pub fn reconcile<I>(&mut self, snapshots: I)
    where
        I: IntoIterator<Item = InteractionSnapshot>,
    {
        let mut next = HashMap::with_capacity(self.entries.len());
        for snapshot in snapshots {
            let key = (snapshot.item, snapshot.kind);
            let mut state = self.entries.remove(&key).unwrap_or_default();
            state.reconcile(snapshot.state);
            next.insert(key, state);
        }
        self.entries = next;
    }
}

#[cfg(test)]
#[path = "interactions_tests.rs"]
mod tests;
