//! # Drag and Drop
//!
//! ```text
//! Idle ──drag_start──▶ Dragging { payload, over, validation }
//!   ▲                      │ drag_over(target) re-validates
//!   │                      ▼
//!   └──── drop / cancel ◀──┘
//! ```
//!
//! Palette payloads create elements or sections; canvas payloads move
//! existing ones. Every hover and the final drop are checked by an injected
//! [`DropValidator`]. A rejected or cancelled drop leaves the document
//! untouched and the controller idle.

use crate::document::{AddElementOptions, Document};
use crate::errors::MutationError;
use crate::geometry::ViewportMode;
use crate::ids::{ElementId, SectionId};
use crate::model::{ElementType, SectionKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// What is being dragged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum DragPayload {
    /// Element type picked from the palette
    NewElement(ElementType),
    /// Section type picked from the palette
    NewSection(SectionKind),
    ExistingElement(ElementId),
    ExistingSection(SectionId),
}

impl DragPayload {
    pub fn from_palette(&self) -> bool {
        matches!(self, DragPayload::NewElement(_) | DragPayload::NewSection(_))
    }

    /// Type name handed to the validator
    fn dragged_type(&self, doc: &Document) -> String {
        match self {
            DragPayload::NewElement(ty) => ty.as_str().to_string(),
            DragPayload::NewSection(kind) => kind.as_str().to_string(),
            DragPayload::ExistingElement(id) => doc
                .element(id)
                .map(|e| e.element_type.as_str().to_string())
                .unwrap_or_else(|| "element".to_string()),
            DragPayload::ExistingSection(id) => doc
                .section(id)
                .map(|s| s.kind.as_str().to_string())
                .unwrap_or_else(|| "section".to_string()),
        }
    }
}

/// Where the pointer is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropTarget {
    /// Between sections of the current page; `index` is the insertion slot
    Canvas { index: usize },
    Section { id: SectionId },
    Element { id: ElementId },
}

impl DropTarget {
    fn describe(&self, doc: &Document) -> Option<(String, String)> {
        match self {
            DropTarget::Canvas { .. } => Some(("canvas".to_string(), "canvas".to_string())),
            DropTarget::Section { id } => doc
                .section(id)
                .map(|s| (s.kind.as_str().to_string(), id.to_string())),
            DropTarget::Element { id } => doc
                .element(id)
                .map(|e| (e.element_type.as_str().to_string(), id.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropValidation {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DropValidation {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Nesting rules supplied by the host
pub trait DropValidator {
    fn validate(&self, dragged_type: &str, target_type: &str, target_id: &str) -> DropValidation;
}

impl<F> DropValidator for F
where
    F: Fn(&str, &str, &str) -> DropValidation,
{
    fn validate(&self, dragged_type: &str, target_type: &str, target_id: &str) -> DropValidation {
        self(dragged_type, target_type, target_id)
    }
}

/// Validator that accepts every drop
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl DropValidator for AllowAll {
    fn validate(&self, _: &str, _: &str, _: &str) -> DropValidation {
        DropValidation::valid()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        payload: DragPayload,
        over: Option<DropTarget>,
        validation: Option<DropValidation>,
    },
}

/// Result of releasing a drag
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "camelCase")]
pub enum DropOutcome {
    AddedElement(ElementId),
    AddedSection(SectionId),
    MovedElement(ElementId),
    MovedSection(SectionId),
    Rejected(String),
    Cancelled,
}

impl DropOutcome {
    /// Whether the document changed
    pub fn is_accepted(&self) -> bool {
        !matches!(self, DropOutcome::Rejected(_) | DropOutcome::Cancelled)
    }
}

/// Viewport the drop happens at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropContext {
    pub viewport: ViewportMode,
    pub viewport_width: f64,
}

pub struct DragController {
    state: DragState,
    validator: Box<dyn DropValidator>,
}

impl fmt::Debug for DragController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragController")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self::with_validator(AllowAll)
    }

    pub fn with_validator(validator: impl DropValidator + 'static) -> Self {
        Self {
            state: DragState::Idle,
            validator: Box::new(validator),
        }
    }

    pub fn set_validator(&mut self, validator: impl DropValidator + 'static) {
        self.validator = Box::new(validator);
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Begin dragging; any drag already in progress is abandoned
    pub fn drag_start(&mut self, payload: DragPayload) {
        self.state = DragState::Dragging {
            payload,
            over: None,
            validation: None,
        };
    }

    /// Pointer moved over a target; returns the validation for hover feedback
    pub fn drag_over(&mut self, target: DropTarget, doc: &Document) -> Option<DropValidation> {
        let DragState::Dragging { payload, .. } = &self.state else {
            return None;
        };
        let result = self.check(payload, &target, doc);

        if let DragState::Dragging { over, validation, .. } = &mut self.state {
            *over = Some(target);
            *validation = Some(result.clone());
        }
        Some(result)
    }

    /// Pointer left every target
    pub fn drag_leave(&mut self) {
        if let DragState::Dragging { over, validation, .. } = &mut self.state {
            *over = None;
            *validation = None;
        }
    }

    pub fn cancel(&mut self) -> DropOutcome {
        self.state = DragState::Idle;
        DropOutcome::Cancelled
    }

    /// Release the drag over the current target
    pub fn drop(&mut self, doc: &mut Document, ctx: DropContext) -> DropOutcome {
        let DragState::Dragging { payload, over, .. } = std::mem::take(&mut self.state) else {
            return DropOutcome::Cancelled;
        };
        let Some(target) = over else {
            return DropOutcome::Cancelled;
        };

        let validation = self.check(&payload, &target, doc);
        if !validation.is_valid {
            let reason = validation
                .reason
                .unwrap_or_else(|| "Invalid drop target".to_string());
            debug!(?payload, ?target, %reason, "drop rejected by validator");
            return DropOutcome::Rejected(reason);
        }

        match apply_drop(doc, payload, target, ctx) {
            Ok(outcome) => outcome,
            Err(MutationError::DropOntoSelf) => DropOutcome::Cancelled,
            Err(e) => {
                debug!(error = %e, "drop rejected");
                DropOutcome::Rejected(e.to_string())
            }
        }
    }

    fn check(&self, payload: &DragPayload, target: &DropTarget, doc: &Document) -> DropValidation {
        match target.describe(doc) {
            Some((target_type, target_id)) => {
                self.validator
                    .validate(&payload.dragged_type(doc), &target_type, &target_id)
            }
            None => DropValidation::invalid("Drop target no longer exists"),
        }
    }
}

fn add_element_into(
    doc: &mut Document,
    element_type: ElementType,
    section_id: Option<SectionId>,
    ctx: DropContext,
) -> Result<DropOutcome, MutationError> {
    let section_id = match section_id {
        Some(id) => id,
        None => doc
            .current_page()
            .sections
            .iter()
            .find(|s| s.kind.is_blank())
            .map(|s| s.id.clone())
            .ok_or_else(|| MutationError::SectionNotFound(SectionId::from("")))?,
    };
    let height = doc
        .section(&section_id)
        .map(|s| s.height)
        .ok_or_else(|| MutationError::SectionNotFound(section_id.clone()))?;
    let x = ((ctx.viewport_width - element_type.base_size().0) / 2.0).max(0.0);

    let id = doc.add_element(
        element_type,
        x,
        0.0,
        ctx.viewport,
        ctx.viewport_width,
        height,
        AddElementOptions::in_section(section_id),
    )?;
    Ok(DropOutcome::AddedElement(id))
}

fn section_of_element(doc: &Document, id: &ElementId) -> Result<SectionId, MutationError> {
    doc.element(id)
        .map(|e| e.section_id.clone())
        .ok_or_else(|| MutationError::ElementNotFound(id.clone()))
}

/// Page index and stack index of a section
fn section_slot(doc: &Document, id: &SectionId) -> Result<(usize, usize), MutationError> {
    let page = doc
        .page_of_section(id)
        .ok_or_else(|| MutationError::SectionNotFound(id.clone()))?;
    let index = doc.pages()[page]
        .section_index(id)
        .ok_or_else(|| MutationError::SectionNotFound(id.clone()))?;
    Ok((page, index))
}

fn move_section_to(
    doc: &mut Document,
    moved: SectionId,
    anchor: &SectionId,
) -> Result<DropOutcome, MutationError> {
    if &moved == anchor {
        return Err(MutationError::DropOntoSelf);
    }
    let (page, from) = section_slot(doc, &moved)?;
    let (anchor_page, to) = section_slot(doc, anchor)?;
    if page != anchor_page {
        return Err(MutationError::SectionNotFound(anchor.clone()));
    }
    doc.move_section(page, from, to)?;
    Ok(DropOutcome::MovedSection(moved))
}

fn apply_drop(
    doc: &mut Document,
    payload: DragPayload,
    target: DropTarget,
    ctx: DropContext,
) -> Result<DropOutcome, MutationError> {
    match (payload, target) {
        (DragPayload::NewElement(ty), DropTarget::Canvas { .. }) => add_element_into(doc, ty, None, ctx),
        (DragPayload::NewElement(ty), DropTarget::Section { id }) => {
            add_element_into(doc, ty, Some(id), ctx)
        }
        (DragPayload::NewElement(ty), DropTarget::Element { id }) => {
            let section = section_of_element(doc, &id)?;
            add_element_into(doc, ty, Some(section), ctx)
        }

        (DragPayload::NewSection(kind), DropTarget::Canvas { index }) => {
            let page = doc.current_page_index();
            let id = doc.insert_section(page, index, kind, None)?;
            Ok(DropOutcome::AddedSection(id))
        }
        (DragPayload::NewSection(kind), DropTarget::Section { id }) => {
            let (page, index) = section_slot(doc, &id)?;
            let id = doc.insert_section(page, index + 1, kind, None)?;
            Ok(DropOutcome::AddedSection(id))
        }
        (DragPayload::NewSection(kind), DropTarget::Element { id }) => {
            let section = section_of_element(doc, &id)?;
            let (page, index) = section_slot(doc, &section)?;
            let id = doc.insert_section(page, index + 1, kind, None)?;
            Ok(DropOutcome::AddedSection(id))
        }

        (DragPayload::ExistingElement(_), DropTarget::Canvas { .. }) => Ok(DropOutcome::Cancelled),
        (DragPayload::ExistingElement(moved), DropTarget::Section { id }) => {
            if section_of_element(doc, &moved)? == id {
                return Ok(DropOutcome::Cancelled);
            }
            doc.move_element(&moved, &id, None)?;
            Ok(DropOutcome::MovedElement(moved))
        }
        (DragPayload::ExistingElement(moved), DropTarget::Element { id }) => {
            if moved == id {
                return Err(MutationError::DropOntoSelf);
            }
            let section = section_of_element(doc, &id)?;
            // paint just above the element it was dropped on
            let slot = doc
                .section(&section)
                .map(|s| {
                    s.element_ids()
                        .iter()
                        .filter(|e| **e != moved)
                        .position(|e| *e == id)
                        .map_or(0, |p| p + 1)
                })
                .unwrap_or(0);
            doc.move_element(&moved, &section, Some(slot))?;
            Ok(DropOutcome::MovedElement(moved))
        }

        (DragPayload::ExistingSection(moved), DropTarget::Canvas { index }) => {
            let (page, from) = section_slot(doc, &moved)?;
            // insertion slot counts the dragged section itself
            let to = if index > from { index - 1 } else { index };
            if to == from {
                return Ok(DropOutcome::Cancelled);
            }
            doc.move_section(page, from, to)?;
            Ok(DropOutcome::MovedSection(moved))
        }
        (DragPayload::ExistingSection(moved), DropTarget::Section { id }) => {
            move_section_to(doc, moved, &id)
        }
        (DragPayload::ExistingSection(moved), DropTarget::Element { id }) => {
            let section = section_of_element(doc, &id)?;
            move_section_to(doc, moved, &section)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdGenerator;

    const DESKTOP: DropContext = DropContext {
        viewport: ViewportMode::Desktop,
        viewport_width: 1200.0,
    };

    fn doc() -> Document {
        Document::new(IdGenerator::from_seed("dnd"))
    }

    fn first_section(doc: &Document) -> SectionId {
        doc.current_page().sections[0].id.clone()
    }

    #[test]
    fn test_palette_element_into_section() {
        let mut doc = doc();
        let section = first_section(&doc);
        let mut drag = DragController::new();

        drag.drag_start(DragPayload::NewElement(ElementType::Button));
        let validation = drag.drag_over(DropTarget::Section { id: section.clone() }, &doc);
        assert_eq!(validation, Some(DropValidation::valid()));

        let outcome = drag.drop(&mut doc, DESKTOP);
        let DropOutcome::AddedElement(id) = outcome else {
            panic!("expected element, got {:?}", outcome);
        };
        let element = doc.element(&id).unwrap();
        assert_eq!(element.section_id, section);
        assert_eq!(element.base.x, (1200.0 - 160.0) / 2.0);
        assert_eq!(*drag.state(), DragState::Idle);
    }

    #[test]
    fn test_validator_blocks_nesting() {
        let mut doc = doc();
        let grid = doc.add_section(0, SectionKind::ProductGrid, None).unwrap();
        let before = doc.snapshot();

        let mut drag = DragController::with_validator(|dragged: &str, target: &str, _: &str| {
            if dragged.ends_with("Form") && target == "productGrid" {
                DropValidation::invalid("Forms cannot go inside a product grid")
            } else {
                DropValidation::valid()
            }
        });
        drag.drag_start(DragPayload::NewElement(ElementType::ContactForm));
        let hover = drag.drag_over(DropTarget::Section { id: grid }, &doc).unwrap();
        assert!(!hover.is_valid);

        let outcome = drag.drop(&mut doc, DESKTOP);
        assert_eq!(
            outcome,
            DropOutcome::Rejected("Forms cannot go inside a product grid".to_string())
        );
        assert_eq!(doc.snapshot(), before);
        assert_eq!(*drag.state(), DragState::Idle);
    }

    #[test]
    fn test_widget_target_is_rejected_without_validator() {
        let mut doc = doc();
        let gallery = doc.add_section(0, SectionKind::GalleryWidget, None).unwrap();
        let mut drag = DragController::new();

        drag.drag_start(DragPayload::NewElement(ElementType::Text));
        drag.drag_over(DropTarget::Section { id: gallery }, &doc);
        assert!(matches!(drag.drop(&mut doc, DESKTOP), DropOutcome::Rejected(_)));
        assert!(doc.elements().is_empty());
    }

    #[test]
    fn test_drop_onto_self_cancels() {
        let mut doc = doc();
        let section = first_section(&doc);
        let mut drag = DragController::new();

        drag.drag_start(DragPayload::ExistingSection(section.clone()));
        drag.drag_over(DropTarget::Section { id: section }, &doc);
        assert_eq!(drag.drop(&mut doc, DESKTOP), DropOutcome::Cancelled);
    }

    #[test]
    fn test_drop_without_target_cancels() {
        let mut doc = doc();
        let mut drag = DragController::new();
        drag.drag_start(DragPayload::NewSection(SectionKind::Blank));
        assert_eq!(drag.drop(&mut doc, DESKTOP), DropOutcome::Cancelled);
        assert_eq!(doc.current_page().sections.len(), 1);
    }

    #[test]
    fn test_palette_section_at_canvas_index() {
        let mut doc = doc();
        let mut drag = DragController::new();
        drag.drag_start(DragPayload::NewSection(SectionKind::ReviewCarousel));
        drag.drag_over(DropTarget::Canvas { index: 0 }, &doc);

        let outcome = drag.drop(&mut doc, DESKTOP);
        assert!(outcome.is_accepted());
        let first = &doc.current_page().sections[0];
        assert_eq!(first.kind, SectionKind::ReviewCarousel);
        assert_eq!(first.height, 400.0);
    }

    #[test]
    fn test_move_section_by_canvas_slot() {
        let mut doc = doc();
        let top = first_section(&doc);
        doc.add_section(0, SectionKind::BookingWidget, None).unwrap();
        doc.add_section(0, SectionKind::ProductGrid, None).unwrap();

        let mut drag = DragController::new();
        drag.drag_start(DragPayload::ExistingSection(top.clone()));
        drag.drag_over(DropTarget::Canvas { index: 3 }, &doc);
        assert_eq!(drag.drop(&mut doc, DESKTOP), DropOutcome::MovedSection(top.clone()));
        assert_eq!(doc.current_page().sections[2].id, top);
    }

    #[test]
    fn test_move_element_above_target() {
        let mut doc = doc();
        let from = first_section(&doc);
        let to = doc.add_section(0, SectionKind::Blank, None).unwrap();
        let a = doc
            .add_element(ElementType::Text, 0.0, 0.0, ViewportMode::Desktop, 1200.0, 600.0, AddElementOptions::in_section(from))
            .unwrap();
        let b = doc
            .add_element(ElementType::Image, 0.0, 0.0, ViewportMode::Desktop, 1200.0, 600.0, AddElementOptions::in_section(to.clone()))
            .unwrap();
        let c = doc
            .add_element(ElementType::Button, 0.0, 0.0, ViewportMode::Desktop, 1200.0, 600.0, AddElementOptions::in_section(to.clone()))
            .unwrap();

        let mut drag = DragController::new();
        drag.drag_start(DragPayload::ExistingElement(a.clone()));
        drag.drag_over(DropTarget::Element { id: b.clone() }, &doc);
        assert_eq!(drag.drop(&mut doc, DESKTOP), DropOutcome::MovedElement(a.clone()));

        assert_eq!(doc.section(&to).unwrap().element_ids(), &[b, a.clone(), c]);
        assert_eq!(doc.element(&a).unwrap().z_index, 1);
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut drag = DragController::new();
        drag.drag_start(DragPayload::NewElement(ElementType::Divider));
        assert!(drag.is_dragging());
        assert_eq!(drag.cancel(), DropOutcome::Cancelled);
        assert!(!drag.is_dragging());
    }
}
