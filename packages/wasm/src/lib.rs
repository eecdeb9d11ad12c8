use freeform_editor::{
    AutosaveCache, DragPayload, DropTarget, DropValidation, DropValidator, EditorConfig,
    EditorError, EditorSession, ElementId, ElementType, KeyEvent, KeyOutcome, MemoryCache,
    PropertyMap, SectionId, SectionKind, ViewportMode,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js(message: String) -> JsValue {
    JsValue::from_str(&message)
}

fn parse<T: for<'de> Deserialize<'de>>(what: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {}: {}", what, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

/// Host-supplied nesting rule: `dragged` may not be dropped on `target`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropRule {
    pub dragged: String,
    pub target: String,
    pub reason: String,
}

/// Validator built from a JSON rule list
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    rules: Vec<DropRule>,
}

impl DropValidator for RuleValidator {
    fn validate(&self, dragged_type: &str, target_type: &str, _target_id: &str) -> DropValidation {
        self.rules
            .iter()
            .find(|r| r.dragged == dragged_type && r.target == target_type)
            .map(|r| DropValidation::invalid(r.reason.clone()))
            .unwrap_or_else(DropValidation::valid)
    }
}

fn build_session(
    session_id: &str,
    document_json: Option<&str>,
    config_json: Option<&str>,
) -> Result<EditorSession, String> {
    let config = match config_json {
        Some(json) => EditorConfig::from_json(json).map_err(|e| e.to_string())?,
        None => EditorConfig::default(),
    };
    Ok(EditorSession::load(session_id, document_json, config))
}

fn recover_session(
    session_id: &str,
    entry_json: &str,
    config_json: Option<&str>,
) -> Result<Option<EditorSession>, String> {
    let config = match config_json {
        Some(json) => EditorConfig::from_json(json).map_err(|e| e.to_string())?,
        None => EditorConfig::default(),
    };
    let mut cache = MemoryCache::new();
    cache
        .write(&config.autosave_key(session_id), entry_json)
        .map_err(|e| e.to_string())?;
    Ok(EditorSession::recover(session_id, &cache, config))
}

fn key_outcome_name(outcome: KeyOutcome) -> String {
    match outcome {
        KeyOutcome::Ignored => "ignored".to_string(),
        KeyOutcome::SaveRequested => "save".to_string(),
        KeyOutcome::Handled(command) => serde_json::to_value(command)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "handled".to_string()),
    }
}

/// One editor session exposed to the browser host
#[wasm_bindgen]
pub struct FreeformEditor {
    session: EditorSession,
    /// Receives autosave writes; the host copies them to local storage
    cache: MemoryCache,
}

impl FreeformEditor {
    fn wrap(session: EditorSession) -> Self {
        Self {
            session,
            cache: MemoryCache::new(),
        }
    }

    fn document_json(&self) -> Result<String, String> {
        self.session
            .document()
            .to_saved()
            .to_json()
            .map_err(|e| e.to_string())
    }

    fn patch_json(json: &str) -> Result<PropertyMap, String> {
        parse("property patch", json)
    }

    fn take_autosave(&mut self) -> Option<String> {
        let key = self.session.autosave_key();
        let entry = self.cache.read(&key);
        self.cache.remove(&key);
        entry
    }
}

#[wasm_bindgen]
impl FreeformEditor {
    /// Open a session over a saved document (or a fresh one when absent)
    #[wasm_bindgen(constructor)]
    pub fn new(
        session_id: &str,
        document_json: Option<String>,
        config_json: Option<String>,
    ) -> Result<FreeformEditor, JsValue> {
        build_session(session_id, document_json.as_deref(), config_json.as_deref())
            .map(Self::wrap)
            .map_err(to_js)
    }

    /// Resume from an autosave entry previously returned by `pollAutosave`
    #[wasm_bindgen(js_name = fromAutosave)]
    pub fn from_autosave(
        session_id: &str,
        entry_json: &str,
        config_json: Option<String>,
    ) -> Result<Option<FreeformEditor>, JsValue> {
        recover_session(session_id, entry_json, config_json.as_deref())
            .map(|s| s.map(Self::wrap))
            .map_err(to_js)
    }

    // --- state -----------------------------------------------------------

    #[wasm_bindgen(js_name = document)]
    pub fn document_js(&self) -> Result<String, JsValue> {
        self.document_json().map_err(to_js)
    }

    #[wasm_bindgen(js_name = elementBoxes)]
    pub fn element_boxes(&self) -> Result<String, JsValue> {
        to_json(&self.session.element_boxes()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = canvasHeight)]
    pub fn canvas_height(&self) -> f64 {
        self.session.canvas_height()
    }

    #[wasm_bindgen(js_name = sectionHeight)]
    pub fn section_height(&self, section_id: &str) -> Option<f64> {
        self.session.effective_section_height(&SectionId::from(section_id))
    }

    pub fn selection(&self) -> Result<String, JsValue> {
        to_json(self.session.selection()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = saveStatus)]
    pub fn save_status(&self) -> Result<String, JsValue> {
        to_json(&self.session.save_status()).map_err(to_js)
    }

    pub fn repairs(&self) -> Vec<String> {
        self.session.repairs().iter().map(ToString::to_string).collect()
    }

    // --- history ---------------------------------------------------------

    pub fn commit(&mut self) -> bool {
        self.session.commit()
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    // --- sections --------------------------------------------------------

    #[wasm_bindgen(js_name = addSection)]
    pub fn add_section(&mut self, kind: &str, properties_json: Option<String>) -> Result<Option<String>, JsValue> {
        let properties = properties_json
            .as_deref()
            .map(Self::patch_json)
            .transpose()
            .map_err(to_js)?;
        Ok(self
            .session
            .add_section(SectionKind::from(kind), properties.as_ref())
            .map(|id| id.to_string()))
    }

    #[wasm_bindgen(js_name = deleteSection)]
    pub fn delete_section(&mut self, section_id: &str) -> bool {
        self.session.delete_section(&SectionId::from(section_id))
    }

    #[wasm_bindgen(js_name = moveSection)]
    pub fn move_section(&mut self, from: usize, to: usize) -> bool {
        self.session.move_section(from, to)
    }

    #[wasm_bindgen(js_name = updateSectionProperties)]
    pub fn update_section_properties(&mut self, section_id: &str, patch_json: &str) -> Result<bool, JsValue> {
        let patch = Self::patch_json(patch_json).map_err(to_js)?;
        Ok(self
            .session
            .update_section_properties(&SectionId::from(section_id), &patch))
    }

    #[wasm_bindgen(js_name = updateSectionHeight)]
    pub fn update_section_height(&mut self, section_id: &str, height: f64) -> bool {
        self.session
            .update_section_height(&SectionId::from(section_id), height)
    }

    #[wasm_bindgen(js_name = toggleSectionLock)]
    pub fn toggle_section_lock(&mut self, section_id: &str) -> Option<bool> {
        self.session.toggle_section_lock(&SectionId::from(section_id))
    }

    // --- elements --------------------------------------------------------

    /// Add an element of `element_type` (e.g. "heading") to a section or the
    /// first blank section of the current page
    #[wasm_bindgen(js_name = addElement)]
    pub fn add_element(&mut self, element_type: &str, section_id: Option<String>) -> Result<Option<String>, JsValue> {
        let element_type: ElementType =
            serde_json::from_value(serde_json::Value::String(element_type.to_string()))
                .map_err(|e| to_js(format!("Invalid element type: {}", e)))?;
        Ok(self
            .session
            .add_element_to_section(element_type, section_id.map(SectionId::from))
            .map(|id| id.to_string()))
    }

    #[wasm_bindgen(js_name = updatePosition)]
    pub fn update_position(&mut self, element_id: &str, x: f64, y: f64) -> bool {
        self.session
            .update_position(&ElementId::from(element_id), x, y)
    }

    #[wasm_bindgen(js_name = updateSize)]
    pub fn update_size(&mut self, element_id: &str, width: f64, height: f64, scale_font: bool) -> bool {
        self.session
            .update_size(&ElementId::from(element_id), width, height, scale_font)
    }

    #[wasm_bindgen(js_name = updateProperties)]
    pub fn update_properties(&mut self, element_id: &str, patch_json: &str) -> Result<bool, JsValue> {
        let patch = Self::patch_json(patch_json).map_err(to_js)?;
        Ok(self
            .session
            .update_properties(&ElementId::from(element_id), &patch))
    }

    #[wasm_bindgen(js_name = setRotation)]
    pub fn set_rotation(&mut self, element_id: &str, degrees: f64) -> bool {
        self.session.set_rotation(&ElementId::from(element_id), degrees)
    }

    #[wasm_bindgen(js_name = duplicateSelection)]
    pub fn duplicate_selection(&mut self) -> Vec<String> {
        self.session
            .duplicate_selection()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[wasm_bindgen(js_name = deleteSelection)]
    pub fn delete_selection(&mut self) -> bool {
        self.session.delete_selection()
    }

    #[wasm_bindgen(js_name = bringToFront)]
    pub fn bring_to_front(&mut self, element_id: &str) -> bool {
        self.session.bring_to_front(&ElementId::from(element_id))
    }

    #[wasm_bindgen(js_name = sendToBack)]
    pub fn send_to_back(&mut self, element_id: &str) -> bool {
        self.session.send_to_back(&ElementId::from(element_id))
    }

    #[wasm_bindgen(js_name = toggleLock)]
    pub fn toggle_lock(&mut self, element_id: &str) -> Option<bool> {
        self.session.toggle_lock(&ElementId::from(element_id))
    }

    // --- selection -------------------------------------------------------

    #[wasm_bindgen(js_name = selectElement)]
    pub fn select_element(&mut self, element_id: &str, additive: bool) -> bool {
        self.session
            .select_element(&ElementId::from(element_id), additive)
    }

    #[wasm_bindgen(js_name = selectSection)]
    pub fn select_section(&mut self, section_id: &str) -> bool {
        self.session.select_section(&SectionId::from(section_id))
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) {
        self.session.clear_selection();
    }

    // --- drag and drop ---------------------------------------------------

    /// Replace the nesting rules, e.g. `[{"dragged":"contactForm","target":"productGrid","reason":"..."}]`
    #[wasm_bindgen(js_name = setDropRules)]
    pub fn set_drop_rules(&mut self, rules_json: &str) -> Result<(), JsValue> {
        let rules: Vec<DropRule> = parse("drop rules", rules_json).map_err(to_js)?;
        self.session.set_drop_validator(RuleValidator { rules });
        Ok(())
    }

    #[wasm_bindgen(js_name = dragStart)]
    pub fn drag_start(&mut self, payload_json: &str) -> Result<(), JsValue> {
        let payload: DragPayload = parse("drag payload", payload_json).map_err(to_js)?;
        self.session.drag_start(payload);
        Ok(())
    }

    /// Returns the validation as JSON, or undefined when nothing is dragged
    #[wasm_bindgen(js_name = dragOver)]
    pub fn drag_over(&mut self, target_json: &str) -> Result<Option<String>, JsValue> {
        let target: DropTarget = parse("drop target", target_json).map_err(to_js)?;
        self.session
            .drag_over(target)
            .map(|v| to_json(&v))
            .transpose()
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = dragLeave)]
    pub fn drag_leave(&mut self) {
        self.session.drag_leave();
    }

    pub fn drop(&mut self) -> Result<String, JsValue> {
        to_json(&self.session.drop()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = cancelDrag)]
    pub fn cancel_drag(&mut self) {
        self.session.cancel_drag();
    }

    // --- keyboard, viewport, zoom ----------------------------------------

    /// Returns "ignored", "save", or the executed command name
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&mut self, event_json: &str, text_input_focused: bool) -> Result<String, JsValue> {
        let event: KeyEvent = parse("key event", event_json).map_err(to_js)?;
        Ok(key_outcome_name(
            self.session.handle_key(&event, text_input_focused),
        ))
    }

    #[wasm_bindgen(js_name = setViewport)]
    pub fn set_viewport(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode: ViewportMode = mode.parse().map_err(to_js)?;
        self.session.set_viewport(mode);
        Ok(())
    }

    pub fn viewport(&self) -> String {
        self.session.viewport().to_string()
    }

    pub fn zoom(&self) -> f64 {
        self.session.zoom()
    }

    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&mut self, zoom: f64) {
        self.session.set_zoom(zoom);
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) {
        self.session.zoom_in();
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) {
        self.session.zoom_out();
    }

    #[wasm_bindgen(js_name = setPreview)]
    pub fn set_preview(&mut self, preview: bool) {
        self.session.set_preview(preview);
    }

    // --- pages -----------------------------------------------------------

    #[wasm_bindgen(js_name = addPage)]
    pub fn add_page(&mut self, title: Option<String>) -> String {
        self.session.add_page(title.as_deref()).to_string()
    }

    #[wasm_bindgen(js_name = deletePage)]
    pub fn delete_page(&mut self, index: usize) -> bool {
        self.session.delete_page(index)
    }

    #[wasm_bindgen(js_name = duplicatePage)]
    pub fn duplicate_page(&mut self, index: usize) -> Option<String> {
        self.session.duplicate_page(index).map(|id| id.to_string())
    }

    #[wasm_bindgen(js_name = renamePage)]
    pub fn rename_page(&mut self, index: usize, title: &str, slug: Option<String>) -> bool {
        self.session.rename_page(index, title, slug.as_deref())
    }

    #[wasm_bindgen(js_name = reorderPages)]
    pub fn reorder_pages(&mut self, from: usize, to: usize) -> bool {
        self.session.reorder_pages(from, to)
    }

    #[wasm_bindgen(js_name = switchPage)]
    pub fn switch_page(&mut self, index: usize) -> bool {
        self.session.switch_page(index)
    }

    #[wasm_bindgen(js_name = updateCanvasConfig)]
    pub fn update_canvas_config(&mut self, patch_json: &str) -> Result<bool, JsValue> {
        let patch = Self::patch_json(patch_json).map_err(to_js)?;
        Ok(self.session.update_canvas_config(&patch))
    }

    #[wasm_bindgen(js_name = updateHeaderConfig)]
    pub fn update_header_config(&mut self, patch_json: &str) -> Result<bool, JsValue> {
        let patch = Self::patch_json(patch_json).map_err(to_js)?;
        Ok(self.session.update_header_config(&patch))
    }

    #[wasm_bindgen(js_name = updateFooterConfig)]
    pub fn update_footer_config(&mut self, patch_json: &str) -> Result<bool, JsValue> {
        let patch = Self::patch_json(patch_json).map_err(to_js)?;
        Ok(self.session.update_footer_config(&patch))
    }

    // --- saving ----------------------------------------------------------

    /// Document JSON for the host's save request
    #[wasm_bindgen(js_name = beginSave)]
    pub fn begin_save(&mut self) -> Result<String, JsValue> {
        self.session.begin_save().map_err(|e| to_js(e.to_string()))
    }

    /// Report the save result; returns the new save status
    #[wasm_bindgen(js_name = finishSave)]
    pub fn finish_save(&mut self, error: Option<String>) -> Result<String, JsValue> {
        let result = match error {
            Some(message) => Err(EditorError::Store(message)),
            None => Ok(()),
        };
        to_json(&self.session.finish_save(result)).map_err(to_js)
    }

    #[wasm_bindgen(js_name = autosaveKey)]
    pub fn autosave_key(&self) -> String {
        self.session.autosave_key()
    }

    /// Call on a timer with a monotonic clock; returns the entry to store
    /// under `autosaveKey()` when one is due
    #[wasm_bindgen(js_name = pollAutosave)]
    pub fn poll_autosave(&mut self, now_ms: f64) -> Option<String> {
        if self.session.poll_autosave(now_ms as u64, &mut self.cache) {
            self.take_autosave()
        } else {
            None
        }
    }

    /// Pending entry regardless of the debounce window (page unload)
    #[wasm_bindgen(js_name = flushAutosave)]
    pub fn flush_autosave(&mut self, now_ms: f64) -> Option<String> {
        if self.session.flush_autosave(now_ms as u64, &mut self.cache) {
            self.take_autosave()
        } else {
            None
        }
    }
}
