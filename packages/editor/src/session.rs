//! # Editor Session
//!
//! One open editor: the document plus everything needed to edit it
//! interactively (history, selection, drag state, viewport, zoom, save
//! status and the autosave timer).
//!
//! Every editing call is forgiving. An operation that cannot apply (stale
//! id, locked element, widget target, out-of-range index) is logged at
//! `debug` and ignored; the return value tells the host whether anything
//! changed.
//!
//! Discrete actions commit a history entry themselves. Live edits
//! (`update_position`, `update_size`, `update_properties`, `set_rotation`)
//! do not; the host finishes them with one of the `commit_*` calls so a
//! whole drag becomes a single undo step.

use crate::autosave::{AutosaveCache, AutosaveEntry, AutosaveScheduler};
use crate::config::EditorConfig;
use crate::document::{AddElementOptions, Document, ElementBox};
use crate::errors::{EditorError, MutationError};
use crate::geometry::ViewportMode;
use crate::history::History;
use crate::ids::{ElementId, IdGenerator, PageId, SectionId};
use crate::interaction::{
    DragController, DragPayload, DragState, DropContext, DropOutcome, DropTarget, DropValidation,
    DropValidator,
};
use crate::keyboard::{command_for, EditorCommand, KeyContext, KeyEvent};
use crate::model::{ElementType, PropertyMap, SectionKind};
use crate::persistence::{load_document, DocumentStore, Repair};
use crate::selection::{PresetRegion, Selection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveStatus {
    Saved,
    Unsaved,
    Saving,
}

/// What a key press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Handled(EditorCommand),
    /// The host should run its save flow
    SaveRequested,
}

/// Single open editor
#[derive(Debug)]
pub struct EditorSession {
    /// Unique session identifier (seeds ids and the autosave key)
    pub id: String,

    document: Document,
    history: History,
    selection: Selection,
    drag: DragController,
    viewport: ViewportMode,
    zoom: f64,
    visited: BTreeSet<ViewportMode>,
    preview: bool,
    save_status: SaveStatus,
    /// Bumped on every change to the document
    revision: u64,
    saving_revision: Option<u64>,
    autosave: AutosaveScheduler,
    config: EditorConfig,
    repairs: Vec<Repair>,
}

impl EditorSession {
    /// Session over a fresh default document
    pub fn new(id: impl Into<String>, config: EditorConfig) -> Self {
        let id = id.into();
        let document = Document::new(IdGenerator::new(&id)).with_config(&config);
        Self::with_document(id, document, config, Vec::new())
    }

    /// Session over a serialized document; `None` starts from the default
    pub fn load(id: impl Into<String>, json: Option<&str>, config: EditorConfig) -> Self {
        let id = id.into();
        let mut ids = IdGenerator::new(&id);
        let report = load_document(json, &mut ids);
        let document = Document::from_saved(report.document, ids).with_config(&config);
        Self::with_document(id, document, config, report.repairs)
    }

    pub fn from_store(
        id: impl Into<String>,
        store: &dyn DocumentStore,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let json = store.load()?;
        Ok(Self::load(id, json.as_deref(), config))
    }

    /// Resume a session from its autosave entry, if one exists
    pub fn recover(id: impl Into<String>, cache: &dyn AutosaveCache, config: EditorConfig) -> Option<Self> {
        let id = id.into();
        let raw = cache.read(&config.autosave_key(&id))?;
        let entry: Value = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(session = %id, error = %e, "discarding unreadable autosave entry");
                return None;
            }
        };
        let document = entry.get("document")?.to_string();

        let mut session = Self::load(id, Some(&document), config);
        session.save_status = SaveStatus::Unsaved;
        info!(session = %session.id, "recovered session from autosave");
        Some(session)
    }

    fn with_document(id: String, document: Document, config: EditorConfig, repairs: Vec<Repair>) -> Self {
        let history = History::new(document.snapshot(), config.max_history);
        Self {
            id,
            history,
            document,
            selection: Selection::None,
            drag: DragController::new(),
            viewport: ViewportMode::Desktop,
            zoom: ViewportMode::Desktop.default_zoom(),
            visited: BTreeSet::from([ViewportMode::Desktop]),
            preview: false,
            save_status: SaveStatus::Saved,
            revision: 0,
            saving_revision: None,
            autosave: AutosaveScheduler::new(config.autosave_debounce_ms),
            config,
            repairs,
        }
    }

    // -----------------------------------------------------------------
    // State
    // -----------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn viewport(&self) -> ViewportMode {
        self.viewport
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    pub fn save_status(&self) -> SaveStatus {
        self.save_status
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Repairs applied when the document was loaded
    pub fn repairs(&self) -> &[Repair] {
        &self.repairs
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn autosave_key(&self) -> String {
        self.config.autosave_key(&self.id)
    }

    fn viewport_width(&self) -> f64 {
        self.config.breakpoints.width(self.viewport)
    }

    // -----------------------------------------------------------------
    // Internal plumbing
    // -----------------------------------------------------------------

    fn touch(&mut self) {
        self.revision += 1;
        self.save_status = SaveStatus::Unsaved;
    }

    /// Keep a successful result, log and drop a rejected one
    fn accept<T>(&mut self, op: &'static str, result: Result<T, MutationError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.touch();
                Some(value)
            }
            Err(e) => {
                debug!(op, error = %e, "operation ignored");
                None
            }
        }
    }

    /// Drop selection entries that no longer exist
    fn prune_selection(&mut self) {
        let doc = &self.document;
        self.selection.retain_elements(|id| doc.element(id).is_some());
        self.selection.retain_section(|id| doc.section(id).is_some());
    }

    /// Record the end of a discrete action as one undo step
    pub fn commit(&mut self) -> bool {
        self.history.commit(self.document.snapshot())
    }

    /// Finish a live drag
    pub fn commit_position_change(&mut self) -> bool {
        self.commit()
    }

    /// Finish a live resize
    pub fn commit_size_change(&mut self) -> bool {
        self.commit()
    }

    /// Finish a property edit (e.g. on blur)
    pub fn commit_property_change(&mut self) -> bool {
        self.commit()
    }

    // -----------------------------------------------------------------
    // History
    // -----------------------------------------------------------------

    /// Step back one action. Uncommitted live edits count as an action.
    pub fn undo(&mut self) -> bool {
        self.commit();
        let Some(previous) = self.history.undo(self.document.snapshot()) else {
            return false;
        };
        self.document.restore(previous);
        self.prune_selection();
        self.touch();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(self.document.snapshot()) else {
            return false;
        };
        self.document.restore(next);
        self.prune_selection();
        self.touch();
        true
    }

    /// Replace the whole document (e.g. applying a template) and start a
    /// fresh history
    pub fn replace_document(&mut self, json: &str) -> Vec<Repair> {
        let mut ids = IdGenerator::new(&self.id);
        let report = load_document(Some(json), &mut ids);
        self.document = Document::from_saved(report.document, ids).with_config(&self.config);
        self.history.reset(self.document.snapshot());
        self.selection.clear();
        self.drag.cancel();
        self.visited = BTreeSet::from([ViewportMode::Desktop]);
        if self.viewport != ViewportMode::Desktop {
            let viewport = self.viewport;
            self.set_viewport(viewport);
        }
        self.touch();
        report.repairs
    }

    // -----------------------------------------------------------------
    // Sections
    // -----------------------------------------------------------------

    /// Append a section to the current page and select it
    pub fn add_section(&mut self, kind: SectionKind, properties: Option<&PropertyMap>) -> Option<SectionId> {
        let page = self.document.current_page_index();
        let result = self.document.add_section(page, kind, properties);
        let id = self.accept("add_section", result)?;
        self.selection.select_section(id.clone());
        self.commit();
        Some(id)
    }

    pub fn delete_section(&mut self, id: &SectionId) -> bool {
        let result = self.document.delete_section(id);
        if self.accept("delete_section", result).is_none() {
            return false;
        }
        self.prune_selection();
        self.commit();
        true
    }

    /// Reorder sections of the current page
    pub fn move_section(&mut self, from: usize, to: usize) -> bool {
        let page = self.document.current_page_index();
        let result = self.document.move_section(page, from, to);
        self.accept("move_section", result).is_some() && self.commit()
    }

    pub fn update_section_properties(&mut self, id: &SectionId, patch: &PropertyMap) -> bool {
        let result = self.document.update_section_properties(id, patch);
        self.accept("update_section_properties", result).is_some() && self.commit()
    }

    pub fn update_section_height(&mut self, id: &SectionId, height: f64) -> bool {
        let result = self.document.update_section_height(id, height);
        self.accept("update_section_height", result).is_some() && self.commit()
    }

    pub fn toggle_section_lock(&mut self, id: &SectionId) -> Option<bool> {
        let result = self.document.toggle_section_lock(id);
        let locked = self.accept("toggle_section_lock", result)?;
        self.commit();
        Some(locked)
    }

    // -----------------------------------------------------------------
    // Elements
    // -----------------------------------------------------------------

    /// Create an element, select it and commit
    #[allow(clippy::too_many_arguments)]
    pub fn add_element(
        &mut self,
        element_type: ElementType,
        x: f64,
        y: f64,
        viewport: ViewportMode,
        viewport_width: f64,
        container_height: f64,
        options: AddElementOptions,
    ) -> Option<ElementId> {
        let result = self.document.add_element(
            element_type,
            x,
            y,
            viewport,
            viewport_width,
            container_height,
            options,
        );
        let id = self.accept("add_element", result)?;
        self.selection.select_element(id.clone(), false);
        self.commit();
        Some(id)
    }

    /// Create an element horizontally centred at the current viewport.
    ///
    /// Targets `section_id` or the first blank section of the current page.
    pub fn add_element_to_section(
        &mut self,
        element_type: ElementType,
        section_id: Option<SectionId>,
    ) -> Option<ElementId> {
        let target = section_id.or_else(|| {
            self.document
                .current_page()
                .sections
                .iter()
                .find(|s| s.kind.is_blank())
                .map(|s| s.id.clone())
        });
        let Some(target) = target else {
            debug!(op = "add_element", "no blank section on the current page");
            return None;
        };
        let height = self
            .document
            .section(&target)
            .map(|s| s.height)
            .unwrap_or(0.0);
        let width = self.viewport_width();
        let x = ((width - element_type.base_size().0) / 2.0).max(0.0);

        self.add_element(
            element_type,
            x,
            0.0,
            self.viewport,
            width,
            height,
            AddElementOptions::in_section(target),
        )
    }

    /// Live move at the current viewport (uncommitted)
    pub fn update_position(&mut self, id: &ElementId, x: f64, y: f64) -> bool {
        let result = self.document.update_position(id, self.viewport, x, y);
        self.accept("update_position", result).is_some()
    }

    /// Live resize at the current viewport (uncommitted)
    pub fn update_size(&mut self, id: &ElementId, width: f64, height: f64, scale_font: bool) -> bool {
        let result = self
            .document
            .update_size(id, self.viewport, width, height, scale_font);
        self.accept("update_size", result).is_some()
    }

    /// Live property edit (uncommitted)
    pub fn update_properties(&mut self, id: &ElementId, patch: &PropertyMap) -> bool {
        let result = self.document.update_properties(id, patch);
        self.accept("update_properties", result).is_some()
    }

    /// Live rotation (uncommitted)
    pub fn set_rotation(&mut self, id: &ElementId, degrees: f64) -> bool {
        let result = self.document.set_rotation(id, degrees);
        self.accept("set_rotation", result).is_some()
    }

    pub fn duplicate_elements(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let result = self.document.duplicate_elements(ids);
        let Some(created) = self.accept("duplicate_elements", result) else {
            return Vec::new();
        };
        self.selection.select_elements(created.clone());
        self.commit();
        created
    }

    pub fn duplicate_selection(&mut self) -> Vec<ElementId> {
        let ids = self.selection.elements().to_vec();
        if ids.is_empty() {
            return Vec::new();
        }
        self.duplicate_elements(&ids)
    }

    pub fn bring_to_front(&mut self, id: &ElementId) -> bool {
        let result = self.document.bring_to_front(id);
        self.accept("bring_to_front", result).is_some() && self.commit()
    }

    pub fn send_to_back(&mut self, id: &ElementId) -> bool {
        let result = self.document.send_to_back(id);
        self.accept("send_to_back", result).is_some() && self.commit()
    }

    pub fn toggle_lock(&mut self, id: &ElementId) -> Option<bool> {
        let result = self.document.toggle_lock(id);
        let locked = self.accept("toggle_lock", result)?;
        self.commit();
        Some(locked)
    }

    pub fn delete_elements(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let result = self.document.delete_elements(ids);
        let Some(removed) = self.accept("delete_elements", result) else {
            return Vec::new();
        };
        self.prune_selection();
        self.commit();
        removed
    }

    /// Delete whatever is selected: elements, or a whole section
    pub fn delete_selection(&mut self) -> bool {
        match self.selection.clone() {
            Selection::Elements(ids) => !self.delete_elements(&ids).is_empty(),
            Selection::Section(id) => self.delete_section(&id),
            _ => false,
        }
    }

    // -----------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------

    pub fn select_element(&mut self, id: &ElementId, additive: bool) -> bool {
        if self.document.element(id).is_none() {
            debug!(op = "select_element", %id, "unknown element");
            return false;
        }
        self.selection.select_element(id.clone(), additive);
        true
    }

    pub fn select_section(&mut self, id: &SectionId) -> bool {
        if self.document.section(id).is_none() {
            debug!(op = "select_section", %id, "unknown section");
            return false;
        }
        self.selection.select_section(id.clone());
        true
    }

    pub fn select_preset(&mut self, region: PresetRegion) {
        self.selection.select_preset(region);
    }

    pub fn select_canvas(&mut self) {
        self.selection.select_canvas();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // -----------------------------------------------------------------
    // Drag and drop
    // -----------------------------------------------------------------

    pub fn set_drop_validator(&mut self, validator: impl DropValidator + 'static) {
        self.drag.set_validator(validator);
    }

    pub fn drag_start(&mut self, payload: DragPayload) {
        self.drag.drag_start(payload);
    }

    pub fn drag_over(&mut self, target: DropTarget) -> Option<DropValidation> {
        self.drag.drag_over(target, &self.document)
    }

    pub fn drag_leave(&mut self) {
        self.drag.drag_leave();
    }

    pub fn cancel_drag(&mut self) -> DropOutcome {
        self.drag.cancel()
    }

    /// Release the current drag; an accepted drop is one undo step
    pub fn drop(&mut self) -> DropOutcome {
        let ctx = DropContext {
            viewport: self.viewport,
            viewport_width: self.viewport_width(),
        };
        let outcome = self.drag.drop(&mut self.document, ctx);
        if !outcome.is_accepted() {
            return outcome;
        }

        self.touch();
        match &outcome {
            DropOutcome::AddedElement(id) | DropOutcome::MovedElement(id) => {
                self.selection.select_element(id.clone(), false)
            }
            DropOutcome::AddedSection(id) | DropOutcome::MovedSection(id) => {
                self.selection.select_section(id.clone())
            }
            DropOutcome::Rejected(_) | DropOutcome::Cancelled => {}
        }
        self.commit();
        outcome
    }

    // -----------------------------------------------------------------
    // Keyboard
    // -----------------------------------------------------------------

    pub fn handle_key(&mut self, event: &KeyEvent, text_input_focused: bool) -> KeyOutcome {
        let ctx = KeyContext {
            text_input_focused,
            preview: self.preview,
        };
        let Some(command) = command_for(event, ctx) else {
            return KeyOutcome::Ignored;
        };

        match command {
            EditorCommand::Undo => {
                self.undo();
            }
            EditorCommand::Redo => {
                self.redo();
            }
            EditorCommand::DeleteSelection => {
                self.delete_selection();
            }
            EditorCommand::DuplicateSelection => {
                self.duplicate_selection();
            }
            EditorCommand::Save => return KeyOutcome::SaveRequested,
            EditorCommand::ClearSelection => {
                if self.drag.is_dragging() {
                    self.drag.cancel();
                }
                self.selection.clear();
            }
        }
        KeyOutcome::Handled(command)
    }

    // -----------------------------------------------------------------
    // Viewport, zoom, preview
    // -----------------------------------------------------------------

    /// Switch viewport. The first visit to tablet or mobile bakes derived
    /// geometry for every element so edits there start from a sane layout.
    pub fn set_viewport(&mut self, mode: ViewportMode) {
        if self.visited.insert(mode) && mode != ViewportMode::Desktop {
            let clean = self.history.is_checkpoint(&self.document.snapshot());
            let width = self.config.breakpoints.width(mode);
            let baked = self.document.generate_breakpoint_positions(mode, width);
            if baked > 0 {
                if clean {
                    self.history.amend_checkpoint(self.document.snapshot());
                }
                self.touch();
            }
        }
        self.viewport = mode;
        self.zoom = mode.default_zoom();
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    pub fn set_preview(&mut self, preview: bool) {
        self.preview = preview;
        if preview {
            self.selection.clear();
            self.drag.cancel();
        }
    }

    // -----------------------------------------------------------------
    // Pages
    // -----------------------------------------------------------------

    /// Add a page and switch to it
    pub fn add_page(&mut self, title: Option<&str>) -> PageId {
        let index = self.document.add_page(title);
        if self.document.switch_page(index).is_ok() {
            self.selection.clear();
        }
        self.touch();
        self.commit();
        self.document.current_page().id.clone()
    }

    pub fn delete_page(&mut self, index: usize) -> bool {
        let result = self.document.delete_page(index);
        if self.accept("delete_page", result).is_none() {
            return false;
        }
        self.prune_selection();
        self.commit();
        true
    }

    /// Duplicate a page and switch to the copy
    pub fn duplicate_page(&mut self, index: usize) -> Option<PageId> {
        let result = self.document.duplicate_page(index);
        let copy = self.accept("duplicate_page", result)?;
        if self.document.switch_page(copy).is_ok() {
            self.selection.clear();
        }
        self.commit();
        Some(self.document.current_page().id.clone())
    }

    pub fn rename_page(&mut self, index: usize, title: &str, slug: Option<&str>) -> bool {
        let result = self.document.rename_page(index, title, slug);
        self.accept("rename_page", result).is_some() && self.commit()
    }

    pub fn reorder_pages(&mut self, from: usize, to: usize) -> bool {
        let result = self.document.reorder_pages(from, to);
        self.accept("reorder_pages", result).is_some() && self.commit()
    }

    /// Show another page; not an undoable edit
    pub fn switch_page(&mut self, index: usize) -> bool {
        match self.document.switch_page(index) {
            Ok(()) => {
                self.selection.clear();
                self.drag.cancel();
                true
            }
            Err(e) => {
                debug!(op = "switch_page", error = %e, "operation ignored");
                false
            }
        }
    }

    pub fn update_header_config(&mut self, patch: &PropertyMap) -> bool {
        let page = self.document.current_page_index();
        let result = self.document.update_header_config(page, patch);
        self.accept("update_header_config", result).is_some() && self.commit()
    }

    pub fn update_footer_config(&mut self, patch: &PropertyMap) -> bool {
        let page = self.document.current_page_index();
        let result = self.document.update_footer_config(page, patch);
        self.accept("update_footer_config", result).is_some() && self.commit()
    }

    pub fn update_canvas_config(&mut self, patch: &PropertyMap) -> bool {
        let page = self.document.current_page_index();
        let result = self.document.update_canvas_config(page, patch);
        self.accept("update_canvas_config", result).is_some() && self.commit()
    }

    // -----------------------------------------------------------------
    // Renderer queries (current page, current viewport)
    // -----------------------------------------------------------------

    pub fn element_boxes(&self) -> Vec<ElementBox> {
        self.document
            .element_boxes(self.document.current_page_index(), self.viewport)
    }

    pub fn effective_section_height(&self, id: &SectionId) -> Option<f64> {
        self.document.effective_section_height(id, self.viewport)
    }

    pub fn canvas_height(&self) -> f64 {
        self.document
            .canvas_height(self.document.current_page_index(), self.viewport)
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------
    // Saving
    // -----------------------------------------------------------------

    /// Serialize for an explicit save and mark the save in flight
    pub fn begin_save(&mut self) -> Result<String, EditorError> {
        let json = self.document.to_saved().to_json()?;
        self.save_status = SaveStatus::Saving;
        self.saving_revision = Some(self.revision);
        Ok(json)
    }

    /// Report the host's save result.
    ///
    /// Edits made while the save was in flight keep the session unsaved.
    pub fn finish_save(&mut self, result: Result<(), EditorError>) -> SaveStatus {
        if let Err(e) = &result {
            warn!(session = %self.id, error = %e, "save failed");
        }
        self.settle_save(result.is_ok())
    }

    fn settle_save(&mut self, succeeded: bool) -> SaveStatus {
        let saved_revision = self.saving_revision.take();
        self.save_status = if succeeded && saved_revision == Some(self.revision) {
            SaveStatus::Saved
        } else {
            SaveStatus::Unsaved
        };
        self.save_status
    }

    /// Save through a synchronous store
    pub fn save(&mut self, store: &mut dyn DocumentStore) -> Result<(), EditorError> {
        let json = self.begin_save()?;
        match store.save(&json) {
            Ok(()) => {
                self.settle_save(true);
                info!(session = %self.id, revision = self.revision, "saved document");
                Ok(())
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "save failed");
                self.settle_save(false);
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------
    // Autosave
    // -----------------------------------------------------------------

    /// Drive the autosave debounce; returns true when the cache was written
    pub fn poll_autosave(&mut self, now_ms: u64, cache: &mut dyn AutosaveCache) -> bool {
        if !self.autosave.poll(self.revision, now_ms) {
            return false;
        }
        self.write_autosave(now_ms, cache)
    }

    /// Write any pending change immediately (page unload)
    pub fn flush_autosave(&mut self, now_ms: u64, cache: &mut dyn AutosaveCache) -> bool {
        if !self.autosave.has_pending(self.revision) {
            return false;
        }
        self.write_autosave(now_ms, cache)
    }

    pub fn discard_autosave(&mut self, cache: &mut dyn AutosaveCache) {
        cache.remove(&self.autosave_key());
    }

    fn write_autosave(&mut self, now_ms: u64, cache: &mut dyn AutosaveCache) -> bool {
        let entry = AutosaveEntry {
            session_id: self.id.clone(),
            saved_at_ms: now_ms,
            document: self.document.to_saved(),
        };
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                debug!(error = %e, "autosave serialization failed");
                return false;
            }
        };

        match cache.write(&self.autosave_key(), &json) {
            Ok(()) => {
                self.autosave.mark_written(self.revision);
                true
            }
            Err(e) => {
                debug!(error = %e, "autosave write failed");
                false
            }
        }
    }
}
