// SPDX-FileCopyrightText: The cratedigger authors
// SPDX-License-Identifier: MPL-2.0

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

use crate::{Backend, Crate, CrateDraft, CrateId, Criteria, Match, Result, Rule};

/// Quiescence window after the last edit before a preview request is issued.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Live-preview sub-state.
///
/// Independent of the save sub-state. A failed preview is surfaced but
/// never fatal; editing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewState {
    /// An edit happened and the debounce window has not elapsed yet.
    Pending,
    /// Count of tracks matching the current criteria.
    Ready(u64),
    /// The last preview request failed.
    Failed(String),
}

/// Persistence sub-state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Saving,
    Saved,
    /// The last save failed; the draft is preserved for a retry.
    Failed(String),
}

/// Editing session for one crate draft.
///
/// Owns the draft exclusively until save or cancel. Edits are applied to
/// local state synchronously; network responses only update the derived
/// preview and save sub-states and never overwrite newer local edits.
///
/// Every mutation restarts a single debounce timer. Once the quiescence
/// window elapses, [`preview_due`](Self::preview_due) resolves and the
/// host is expected to call [`refresh_preview`](Self::refresh_preview).
/// Rapid successive edits coalesce into one request.
#[derive(Debug)]
pub struct BuilderSession {
    draft: CrateDraft,
    crate_id: Option<CrateId>,
    preview: PreviewState,
    save: SaveState,
    debounce: Duration,
    timer: Option<JoinHandle<()>>,
    due_tx: mpsc::Sender<()>,
    due_rx: mpsc::Receiver<()>,
}

impl BuilderSession {
    /// Opens a session for a brand-new draft.
    ///
    /// The empty draft previews as zero matches without a network call.
    #[must_use]
    pub fn open() -> Self {
        Self::with_debounce(DEFAULT_DEBOUNCE)
    }

    /// Opens a session with a custom quiescence window.
    #[must_use]
    pub fn with_debounce(debounce: Duration) -> Self {
        // Capacity 1: an undrained due signal coalesces with the next one.
        let (due_tx, due_rx) = mpsc::channel(1);
        Self {
            draft: CrateDraft::default(),
            crate_id: None,
            preview: PreviewState::Ready(0),
            save: SaveState::Idle,
            debounce,
            timer: None,
            due_tx,
            due_rx,
        }
    }

    /// Opens a session bound to an already persisted crate.
    ///
    /// The draft is pre-seeded from the persisted state and a preview is
    /// scheduled immediately. Saving issues an update keyed by the
    /// existing identifier, never a create.
    #[must_use]
    pub fn edit(persisted: &Crate) -> Self {
        let mut session = Self::open();
        session.draft = CrateDraft::from_crate(persisted);
        session.crate_id = Some(persisted.id.clone());
        session.touched();
        session
    }

    #[must_use]
    pub const fn draft(&self) -> &CrateDraft {
        &self.draft
    }

    /// Identifier of the bound persisted crate, if any.
    #[must_use]
    pub const fn crate_id(&self) -> Option<&CrateId> {
        self.crate_id.as_ref()
    }

    #[must_use]
    pub const fn preview(&self) -> &PreviewState {
        &self.preview
    }

    #[must_use]
    pub const fn save_state(&self) -> &SaveState {
        &self.save
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
        self.touched();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.draft.description = description;
        self.touched();
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.draft.color = color.into();
        self.touched();
    }

    pub fn set_icon(&mut self, icon: impl Into<String>) {
        self.draft.icon = icon.into();
        self.touched();
    }

    pub fn set_combinator(&mut self, logic: Match) {
        self.draft.criteria.logic = logic;
        self.touched();
    }

    /// Appends a rule on the first field with its default operator and
    /// value.
    pub fn add_rule(&mut self) {
        self.draft.criteria.add_rule();
        self.touched();
    }

    /// Replaces the rule at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn update_rule(&mut self, index: usize, rule: Rule) {
        self.draft.criteria.update_rule(index, rule);
        self.touched();
    }

    /// Removes the rule at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn remove_rule(&mut self, index: usize) {
        self.draft.criteria.remove_rule(index);
        self.touched();
    }

    /// Replaces the whole criteria, e.g. with a deserialized payload.
    pub fn replace_criteria(&mut self, criteria: Criteria) {
        self.draft.criteria = criteria;
        self.touched();
    }

    /// Restarts the debounce timer.
    ///
    /// The previous timer is aborted, so edits within the quiescence
    /// window coalesce into a single due signal.
    fn touched(&mut self) {
        self.preview = PreviewState::Pending;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let due_tx = self.due_tx.clone();
        let debounce = self.debounce;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            // A full channel means a due signal is already pending.
            let _unused = due_tx.try_send(());
        }));
    }

    /// Waits until the quiescence window after the last edit has elapsed.
    ///
    /// Pending forever if no edit is outstanding, which makes it suitable
    /// for `select!` loops.
    pub async fn preview_due(&mut self) {
        let _received = self.due_rx.recv().await;
    }

    /// Non-blocking variant of [`preview_due`](Self::preview_due) for
    /// polling hosts.
    pub fn try_preview_due(&mut self) -> bool {
        self.due_rx.try_recv().is_ok()
    }

    /// Fetches the preview count for the current criteria.
    ///
    /// An empty rule sequence counts zero matches locally without a
    /// network call. Responses are applied in arrival order; a stale
    /// count arriving late overwrites an earlier one, which is tolerated
    /// for a preview.
    pub async fn refresh_preview<B: Backend>(&mut self, backend: &B) {
        if self.draft.criteria.is_empty() {
            self.preview = PreviewState::Ready(0);
            return;
        }
        match backend.preview_count(&self.draft.criteria).await {
            Ok(count) => {
                self.preview = PreviewState::Ready(count);
            }
            Err(err) => {
                log::warn!("Preview request failed: {err}");
                self.preview = PreviewState::Failed(err.to_string());
            }
        }
    }

    /// Persists the draft: create without a bound identifier, update with
    /// one.
    ///
    /// Validation failures are returned synchronously and never reach the
    /// network. On success the session binds the backend-assigned
    /// identifier, so a subsequent save issues an update. On failure the
    /// draft is fully preserved and the caller may retry.
    pub async fn save<B: Backend>(&mut self, backend: &B) -> Result<Crate> {
        self.draft.validate()?;
        self.save = SaveState::Saving;
        let result = match &self.crate_id {
            Some(id) => backend.update_crate(id, &self.draft).await,
            None => backend.create_crate(&self.draft).await,
        };
        match result {
            Ok(saved) => {
                self.crate_id = Some(saved.id.clone());
                self.save = SaveState::Saved;
                Ok(saved)
            }
            Err(err) => {
                log::warn!("Failed to save crate \"{name}\": {err}", name = self.draft.name);
                self.save = SaveState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Discards the draft without contacting the backend.
    pub fn cancel(self) {
        // Dropping aborts the debounce timer.
    }
}

impl Drop for BuilderSession {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
