//! Editor selection.
//!
//! Element, section, preset-region and canvas selection are mutually
//! exclusive; selecting in one mode clears the others.

use crate::ids::{ElementId, SectionId};
use serde::{Deserialize, Serialize};

/// Page-level regions rendered outside the section stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresetRegion {
    Header,
    Footer,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "target", rename_all = "camelCase")]
pub enum Selection {
    #[default]
    None,
    /// Selected elements in the order they were picked
    Elements(Vec<ElementId>),
    Section(SectionId),
    Preset(PresetRegion),
    Canvas,
}

impl Selection {
    /// Select an element; `additive` toggles it within a multi-selection
    pub fn select_element(&mut self, id: ElementId, additive: bool) {
        match self {
            Selection::Elements(ids) if additive => {
                if let Some(pos) = ids.iter().position(|e| e == &id) {
                    ids.remove(pos);
                    if ids.is_empty() {
                        *self = Selection::None;
                    }
                } else {
                    ids.push(id);
                }
            }
            _ => *self = Selection::Elements(vec![id]),
        }
    }

    pub fn select_elements(&mut self, ids: Vec<ElementId>) {
        *self = if ids.is_empty() {
            Selection::None
        } else {
            Selection::Elements(ids)
        };
    }

    pub fn select_section(&mut self, id: SectionId) {
        *self = Selection::Section(id);
    }

    pub fn select_preset(&mut self, region: PresetRegion) {
        *self = Selection::Preset(region);
    }

    pub fn select_canvas(&mut self) {
        *self = Selection::Canvas;
    }

    pub fn clear(&mut self) {
        *self = Selection::None;
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn elements(&self) -> &[ElementId] {
        match self {
            Selection::Elements(ids) => ids,
            _ => &[],
        }
    }

    pub fn contains_element(&self, id: &ElementId) -> bool {
        self.elements().contains(id)
    }

    pub fn section(&self) -> Option<&SectionId> {
        match self {
            Selection::Section(id) => Some(id),
            _ => None,
        }
    }

    /// Drop selected elements that no longer exist
    pub fn retain_elements(&mut self, mut exists: impl FnMut(&ElementId) -> bool) {
        if let Selection::Elements(ids) = self {
            ids.retain(|id| exists(id));
            if ids.is_empty() {
                *self = Selection::None;
            }
        }
    }

    /// Clear a section selection if the section no longer exists
    pub fn retain_section(&mut self, exists: impl FnOnce(&SectionId) -> bool) {
        if let Selection::Section(id) = self {
            if !exists(id) {
                *self = Selection::None;
            }
        }
    }
}
