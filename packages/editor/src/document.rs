//! # Document
//!
//! The authoritative in-memory site: pages, their sections and a flat list
//! of elements. Every operation validates its inputs and returns a
//! [`MutationError`] instead of changing anything when it cannot apply, so
//! stale ids from re-entrant UI callbacks are harmless.
//!
//! ## Invariants
//!
//! - every page holds at least one section
//! - widget sections never own elements
//! - an element's `section_id` and its section's element list agree
//! - z ranks inside a section are exactly `0..n` in paint order
//!
//! ```text
//! Document
//!  ├─ pages[]      Page → sections[] → element ids (paint order)
//!  └─ elements[]   Element (back-reference to its section)
//! ```

use crate::config::EditorConfig;
use crate::errors::MutationError;
use crate::geometry::{estimate_text_height, GeometryResolver, Rect, ViewportMode};
use crate::history::DocumentSnapshot;
use crate::ids::{ElementId, IdGenerator, PageId, SectionId};
use crate::model::{
    normalize_rotation, CanvasConfig, Element, ElementProps, ElementType, Page, PropertyMap,
    Section, SectionKind,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Height of the blank section on a new page and of added blank sections
pub const DEFAULT_BLANK_SECTION_HEIGHT: f64 = 600.0;

/// Space kept between a new element and the section/viewport edges
const FIT_MARGIN: f64 = 40.0;
const DUPLICATE_OFFSET: f64 = 20.0;
const MIN_ELEMENT_SIZE: f64 = 10.0;
const MIN_FONT_SIZE: f64 = 8.0;
const MAX_FONT_SIZE: f64 = 200.0;
const CANVAS_TRAILING_SPACE: f64 = 200.0;

/// Spacing rules used by placement and height queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRules {
    pub section_bottom_padding: f64,
    pub stack_gap: f64,
}

impl Default for LayoutRules {
    fn default() -> Self {
        Self {
            section_bottom_padding: 30.0,
            stack_gap: 20.0,
        }
    }
}

impl From<&EditorConfig> for LayoutRules {
    fn from(config: &EditorConfig) -> Self {
        Self {
            section_bottom_padding: config.section_bottom_padding,
            stack_gap: config.stack_gap,
        }
    }
}

/// Optional inputs of [`Document::add_element`]
#[derive(Debug, Clone, Default)]
pub struct AddElementOptions {
    /// Target section; defaults to the first blank section of the current page
    pub section_id: Option<SectionId>,
    /// Property overrides merged over the type defaults
    pub properties: Option<PropertyMap>,
    /// Place at the given `(x, y)` instead of stacking below siblings
    pub exact_position: bool,
}

impl AddElementOptions {
    pub fn in_section(section_id: SectionId) -> Self {
        Self {
            section_id: Some(section_id),
            ..Default::default()
        }
    }
}

/// Resolved element geometry handed to a renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBox {
    pub id: ElementId,
    pub section_id: SectionId,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Section-relative box at the requested viewport
    pub rect: Rect,
    /// Top of the owning section on the canvas (effective heights)
    pub section_offset: f64,
    pub rotation: f64,
    pub z_index: u32,
    pub locked: bool,
    pub visible: bool,
}

/// Editable site document
#[derive(Debug, Clone)]
pub struct Document {
    pages: Vec<Page>,
    elements: Vec<Element>,
    current_page: usize,
    resolver: GeometryResolver,
    layout: LayoutRules,
    ids: IdGenerator,
}

/// Page shown when a document has nothing usable
pub(crate) fn default_page(ids: &mut IdGenerator) -> Page {
    let mut page = Page::new(ids.page_id(), "Home", "home");
    page.sections.push(blank_section(ids));
    page
}

pub(crate) fn blank_section(ids: &mut IdGenerator) -> Section {
    Section::new(ids.section_id(), SectionKind::Blank).with_height(DEFAULT_BLANK_SECTION_HEIGHT)
}

fn missing(ids: &[ElementId]) -> MutationError {
    MutationError::ElementNotFound(ids.first().cloned().unwrap_or_else(|| ElementId::from("")))
}

fn invalid(e: serde_json::Error) -> MutationError {
    MutationError::InvalidProperties(e.to_string())
}

fn check_index(index: usize, len: usize) -> Result<(), MutationError> {
    if index < len {
        Ok(())
    } else {
        Err(MutationError::IndexOutOfRange { index, len })
    }
}

/// Shallow-merge `patch` into `target`; `null` removes a key
fn merge_map(target: &mut PropertyMap, patch: &PropertyMap) {
    for (key, value) in patch {
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Grow text boxes that became too short for their content
fn grow_to_fit_text(element: &mut Element) {
    let (Some(content), Some(font_size), Some(line_height)) = (
        element.props.content().map(str::to_string),
        element.props.font_size(),
        element.props.line_height(),
    ) else {
        return;
    };

    let grow = |rect: &mut Rect| {
        let needed = estimate_text_height(&content, font_size, line_height, rect.width);
        if rect.height < needed {
            rect.height = needed;
        }
    };

    grow(&mut element.base);
    for (_, rect) in element.breakpoints.iter_mut() {
        grow(rect);
    }
}

impl Document {
    /// Fresh document: one "Home" page with one blank section
    pub fn new(mut ids: IdGenerator) -> Self {
        let page = default_page(&mut ids);
        Self {
            pages: vec![page],
            elements: Vec::new(),
            current_page: 0,
            resolver: GeometryResolver::default(),
            layout: LayoutRules::default(),
            ids,
        }
    }

    /// Assemble a document from already repaired parts
    pub fn from_parts(
        pages: Vec<Page>,
        elements: Vec<Element>,
        current_page: usize,
        mut ids: IdGenerator,
    ) -> Self {
        for page in &pages {
            ids.observe(page.id.as_str());
            for section in &page.sections {
                ids.observe(section.id.as_str());
            }
        }
        for element in &elements {
            ids.observe(element.id.as_str());
        }

        let mut doc = Self {
            pages,
            elements,
            current_page,
            resolver: GeometryResolver::default(),
            layout: LayoutRules::default(),
            ids,
        };
        if doc.pages.is_empty() {
            let page = default_page(&mut doc.ids);
            doc.pages.push(page);
        }
        doc.current_page = doc.current_page.min(doc.pages.len() - 1);
        doc
    }

    pub fn with_config(mut self, config: &EditorConfig) -> Self {
        self.resolver = config.resolver();
        self.layout = LayoutRules::from(config);
        self
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page
    }

    pub fn current_page(&self) -> &Page {
        &self.pages[self.current_page]
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.locate_section(id)
            .map(|(p, s)| &self.pages[p].sections[s])
    }

    /// Index of the page owning a section
    pub fn page_of_section(&self, id: &SectionId) -> Option<usize> {
        self.locate_section(id).map(|(p, _)| p)
    }

    /// Elements of a section in paint order
    pub fn section_elements(&self, id: &SectionId) -> Vec<&Element> {
        self.section(id)
            .map(|section| {
                section
                    .element_ids()
                    .iter()
                    .filter_map(|id| self.element(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn resolver(&self) -> &GeometryResolver {
        &self.resolver
    }

    pub fn layout(&self) -> &LayoutRules {
        &self.layout
    }

    /// Effective box of an element at a viewport
    pub fn resolve(&self, id: &ElementId, viewport: ViewportMode) -> Option<Rect> {
        self.element(id).map(|e| self.resolver.resolve(e, viewport))
    }

    // -----------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            pages: self.pages.clone(),
            elements: self.elements.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: DocumentSnapshot) {
        self.pages = snapshot.pages;
        self.elements = snapshot.elements;
        if self.pages.is_empty() {
            let page = default_page(&mut self.ids);
            self.pages.push(page);
        }
        self.current_page = self.current_page.min(self.pages.len() - 1);
    }

    // -----------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------

    fn element_index(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    fn locate_section(&self, id: &SectionId) -> Option<(usize, usize)> {
        self.pages.iter().enumerate().find_map(|(p, page)| {
            page.section_index(id).map(|s| (p, s))
        })
    }

    fn section_mut(&mut self, id: &SectionId) -> Result<&mut Section, MutationError> {
        let (p, s) = self
            .locate_section(id)
            .ok_or_else(|| MutationError::SectionNotFound(id.clone()))?;
        Ok(&mut self.pages[p].sections[s])
    }

    fn page_mut(&mut self, index: usize) -> Result<&mut Page, MutationError> {
        self.pages
            .get_mut(index)
            .ok_or_else(|| MutationError::page_index(index))
    }

    /// Element that accepts geometry and property edits
    fn editable_element_mut(&mut self, id: &ElementId) -> Result<&mut Element, MutationError> {
        let index = self
            .element_index(id)
            .ok_or_else(|| MutationError::ElementNotFound(id.clone()))?;
        let element = &mut self.elements[index];
        if element.locked {
            return Err(MutationError::ElementLocked(id.clone()));
        }
        Ok(element)
    }

    /// Reassign z ranks of a section from its paint order
    fn renormalize(&mut self, section_id: &SectionId) {
        let Some(section) = self.section(section_id) else {
            return;
        };
        let order = section.element_ids().to_vec();
        for (rank, id) in order.iter().enumerate() {
            if let Some(index) = self.element_index(id) {
                self.elements[index].z_index = rank as u32;
            }
        }
    }

    /// Remove elements and their section memberships
    fn remove_elements(&mut self, ids: &[ElementId]) {
        let mut sections: Vec<SectionId> = Vec::new();
        for id in ids {
            if let Some(element) = self.element(id) {
                if !sections.contains(&element.section_id) {
                    sections.push(element.section_id.clone());
                }
            }
        }

        self.elements.retain(|e| !ids.contains(&e.id));
        for section_id in &sections {
            if let Ok(section) = self.section_mut(section_id) {
                if let Some(list) = section.elements.as_mut() {
                    list.retain(|id| !ids.contains(id));
                }
            }
            self.renormalize(section_id);
        }
    }

    fn store_geometry(element: &mut Element, viewport: ViewportMode, rect: Rect) {
        element.breakpoints.set(viewport, rect);
        if viewport == element.origin {
            element.base = rect;
        }
    }

    // -----------------------------------------------------------------
    // Sections
    // -----------------------------------------------------------------

    /// Append a section to a page
    pub fn add_section(
        &mut self,
        page_index: usize,
        kind: SectionKind,
        properties: Option<&PropertyMap>,
    ) -> Result<SectionId, MutationError> {
        let len = self
            .page(page_index)
            .ok_or_else(|| MutationError::page_index(page_index))?
            .sections
            .len();
        self.insert_section(page_index, len, kind, properties)
    }

    /// Insert a section at a position in a page's section stack
    pub fn insert_section(
        &mut self,
        page_index: usize,
        index: usize,
        kind: SectionKind,
        properties: Option<&PropertyMap>,
    ) -> Result<SectionId, MutationError> {
        let len = self
            .page(page_index)
            .ok_or_else(|| MutationError::page_index(page_index))?
            .sections
            .len();
        if index > len {
            return Err(MutationError::IndexOutOfRange { index, len });
        }

        let mut section = Section::new(self.ids.section_id(), kind);
        if section.kind.is_blank() {
            section.height = DEFAULT_BLANK_SECTION_HEIGHT;
        }
        if let Some(patch) = properties {
            section.properties = section.properties.merged(patch).map_err(invalid)?;
        }

        let id = section.id.clone();
        self.pages[page_index].sections.insert(index, section);
        Ok(id)
    }

    /// Remove a section and every element it owns.
    ///
    /// Returns the removed element ids. A page left without sections gets a
    /// fresh blank one.
    pub fn delete_section(&mut self, id: &SectionId) -> Result<Vec<ElementId>, MutationError> {
        let (p, s) = self
            .locate_section(id)
            .ok_or_else(|| MutationError::SectionNotFound(id.clone()))?;

        self.pages[p].sections.remove(s);
        let removed: Vec<ElementId> = self
            .elements
            .iter()
            .filter(|e| &e.section_id == id)
            .map(|e| e.id.clone())
            .collect();
        self.elements.retain(|e| &e.section_id != id);

        if self.pages[p].sections.is_empty() {
            let section = blank_section(&mut self.ids);
            self.pages[p].sections.push(section);
        }
        Ok(removed)
    }

    /// Move a section within its page's stack
    pub fn move_section(&mut self, page_index: usize, from: usize, to: usize) -> Result<(), MutationError> {
        let page = self.page_mut(page_index)?;
        let len = page.sections.len();
        check_index(from, len)?;
        check_index(to, len)?;

        let section = page.sections.remove(from);
        page.sections.insert(to, section);
        Ok(())
    }

    pub fn update_section_properties(&mut self, id: &SectionId, patch: &PropertyMap) -> Result<(), MutationError> {
        let section = self.section_mut(id)?;
        section.properties = section.properties.merged(patch).map_err(invalid)?;
        Ok(())
    }

    pub fn update_section_height(&mut self, id: &SectionId, height: f64) -> Result<(), MutationError> {
        if !height.is_finite() || height < 0.0 {
            return Err(MutationError::InvalidProperties(format!("section height {}", height)));
        }
        self.section_mut(id)?.height = height;
        Ok(())
    }

    pub fn toggle_section_lock(&mut self, id: &SectionId) -> Result<bool, MutationError> {
        let section = self.section_mut(id)?;
        section.locked = !section.locked;
        Ok(section.locked)
    }

    // -----------------------------------------------------------------
    // Elements
    // -----------------------------------------------------------------

    /// Create an element in a blank section.
    ///
    /// The element takes its type's default size (text grows to fit custom
    /// content), shrunk to fit inside the container and viewport. It stacks
    /// below its lowest sibling at `viewport`, or is centred vertically in an
    /// empty section. The creation geometry becomes the override at
    /// `viewport` and the element paints on top of its siblings.
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
    ) -> Result<ElementId, MutationError> {
        if ![x, y, viewport_width, container_height].iter().all(|v| v.is_finite()) {
            return Err(MutationError::InvalidProperties(
                "non-finite placement input".to_string(),
            ));
        }

        let section_id = match options.section_id {
            Some(id) => id,
            None => self
                .current_page()
                .sections
                .iter()
                .find(|s| s.kind.is_blank())
                .map(|s| s.id.clone())
                .ok_or_else(|| MutationError::SectionNotFound(SectionId::from("")))?,
        };
        let section = self
            .section(&section_id)
            .ok_or_else(|| MutationError::SectionNotFound(section_id.clone()))?;
        if !section.kind.is_blank() {
            return Err(MutationError::WidgetSection(section_id));
        }

        let mut props = ElementProps::defaults(element_type);
        if let Some(patch) = &options.properties {
            props = props.merged(element_type, patch).map_err(invalid)?;
        }

        let (mut width, mut height) = element_type.base_size();
        let has_custom_content = options
            .properties
            .as_ref()
            .is_some_and(|p| p.contains_key("content"));
        if element_type.is_text() && has_custom_content {
            if let (Some(content), Some(size), Some(line)) =
                (props.content(), props.font_size(), props.line_height())
            {
                height = height.max(estimate_text_height(content, size, line, width));
            }
        }

        let max_width = viewport_width - FIT_MARGIN;
        if max_width > 0.0 && width > max_width {
            width = max_width;
        }
        let max_height = container_height - FIT_MARGIN;
        if max_height > 0.0 && height > max_height {
            height = max_height;
        }

        let y = if options.exact_position {
            y.max(0.0)
        } else {
            let lowest = section
                .element_ids()
                .iter()
                .filter_map(|id| self.element(id))
                .map(|e| self.resolver.resolve(e, viewport).bottom())
                .fold(None, |acc: Option<f64>, bottom| Some(acc.map_or(bottom, |a| a.max(bottom))));
            match lowest {
                Some(bottom) => bottom + self.layout.stack_gap,
                None => ((container_height - height) / 2.0).max(0.0),
            }
        };
        let x = x.clamp(0.0, (viewport_width - width).max(0.0));

        let z_index = section.element_ids().len() as u32;
        let id = self.ids.element_id();
        let mut element = Element::new(
            id.clone(),
            element_type,
            section_id.clone(),
            Rect::new(x, y, width, height),
            viewport,
        );
        element.z_index = z_index;
        element.props = props;

        if let Some(list) = self.section_mut(&section_id)?.elements.as_mut() {
            list.push(id.clone());
        }
        self.elements.push(element);
        Ok(id)
    }

    /// Move an element at the given viewport
    pub fn update_position(
        &mut self,
        id: &ElementId,
        viewport: ViewportMode,
        x: f64,
        y: f64,
    ) -> Result<(), MutationError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(MutationError::InvalidProperties("non-finite position".to_string()));
        }
        let resolver = self.resolver;
        let element = self.editable_element_mut(id)?;
        let mut rect = resolver.resolve(element, viewport);
        rect.x = x;
        rect.y = y;
        Self::store_geometry(element, viewport, rect);
        Ok(())
    }

    /// Resize an element at the given viewport.
    ///
    /// With `scale_font`, headings, text and buttons scale their font with
    /// the width change.
    pub fn update_size(
        &mut self,
        id: &ElementId,
        viewport: ViewportMode,
        width: f64,
        height: f64,
        scale_font: bool,
    ) -> Result<(), MutationError> {
        if !width.is_finite() || !height.is_finite() {
            return Err(MutationError::InvalidProperties("non-finite size".to_string()));
        }
        let resolver = self.resolver;
        let element = self.editable_element_mut(id)?;
        let mut rect = resolver.resolve(element, viewport);
        let old_width = rect.width;
        rect.width = width.max(MIN_ELEMENT_SIZE);
        rect.height = height.max(MIN_ELEMENT_SIZE);
        Self::store_geometry(element, viewport, rect);

        if scale_font && element.element_type.scales_font() && old_width > 0.0 {
            if let Some(size) = element.props.font_size() {
                let scaled = (size * rect.width / old_width).round();
                element.props.set_font_size(scaled.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE));
            }
        }
        Ok(())
    }

    /// Shallow-merge a property patch
    pub fn update_properties(&mut self, id: &ElementId, patch: &PropertyMap) -> Result<(), MutationError> {
        let element = self.editable_element_mut(id)?;
        element.props = element.props.merged(element.element_type, patch).map_err(invalid)?;

        if element.element_type.is_text() && patch.contains_key("content") {
            grow_to_fit_text(element);
        }
        Ok(())
    }

    pub fn set_rotation(&mut self, id: &ElementId, degrees: f64) -> Result<(), MutationError> {
        let element = self.editable_element_mut(id)?;
        element.rotation = normalize_rotation(degrees);
        Ok(())
    }

    /// Clone elements with fresh ids, offset at every stored viewport and
    /// painted on top of their section
    pub fn duplicate_elements(&mut self, ids: &[ElementId]) -> Result<Vec<ElementId>, MutationError> {
        let mut created = Vec::new();
        let mut sections: Vec<SectionId> = Vec::new();

        for id in ids {
            let Some(mut copy) = self.element(id).cloned() else {
                continue;
            };
            copy.id = self.ids.element_id();
            copy.base = copy.base.offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
            for (_, rect) in copy.breakpoints.iter_mut() {
                *rect = rect.offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
            }

            if let Ok(section) = self.section_mut(&copy.section_id) {
                if let Some(list) = section.elements.as_mut() {
                    list.push(copy.id.clone());
                }
            }
            if !sections.contains(&copy.section_id) {
                sections.push(copy.section_id.clone());
            }
            created.push(copy.id.clone());
            self.elements.push(copy);
        }

        if created.is_empty() {
            return Err(missing(ids));
        }
        for section_id in &sections {
            self.renormalize(section_id);
        }
        Ok(created)
    }

    pub fn bring_to_front(&mut self, id: &ElementId) -> Result<(), MutationError> {
        self.restack(id, |list, id| list.push(id))
    }

    pub fn send_to_back(&mut self, id: &ElementId) -> Result<(), MutationError> {
        self.restack(id, |list, id| list.insert(0, id))
    }

    fn restack(
        &mut self,
        id: &ElementId,
        place: impl FnOnce(&mut Vec<ElementId>, ElementId),
    ) -> Result<(), MutationError> {
        let section_id = self
            .element(id)
            .map(|e| e.section_id.clone())
            .ok_or_else(|| MutationError::ElementNotFound(id.clone()))?;
        let section = self.section_mut(&section_id)?;
        let list = section
            .elements
            .as_mut()
            .ok_or_else(|| MutationError::WidgetSection(section_id.clone()))?;
        list.retain(|e| e != id);
        place(list, id.clone());
        self.renormalize(&section_id);
        Ok(())
    }

    pub fn toggle_lock(&mut self, id: &ElementId) -> Result<bool, MutationError> {
        let index = self
            .element_index(id)
            .ok_or_else(|| MutationError::ElementNotFound(id.clone()))?;
        let element = &mut self.elements[index];
        element.locked = !element.locked;
        Ok(element.locked)
    }

    /// Delete elements; non-deletable elements survive.
    ///
    /// Returns the ids actually removed.
    pub fn delete_elements(&mut self, ids: &[ElementId]) -> Result<Vec<ElementId>, MutationError> {
        let found: Vec<&Element> = ids.iter().filter_map(|id| self.element(id)).collect();
        if found.is_empty() {
            return Err(missing(ids));
        }

        let first = found[0].id.clone();
        let removable: Vec<ElementId> = found
            .into_iter()
            .filter(|e| e.deletable)
            .map(|e| e.id.clone())
            .collect();
        if removable.is_empty() {
            return Err(MutationError::NotDeletable(first));
        }
        self.remove_elements(&removable);
        Ok(removable)
    }

    /// Reparent an element into a blank section.
    ///
    /// `position` is the paint-order slot in the target (top when `None`).
    /// Section-relative coordinates are kept.
    pub fn move_element(
        &mut self,
        id: &ElementId,
        target: &SectionId,
        position: Option<usize>,
    ) -> Result<(), MutationError> {
        let source = self.editable_element_mut(id)?.section_id.clone();
        let target_section = self
            .section(target)
            .ok_or_else(|| MutationError::SectionNotFound(target.clone()))?;
        if !target_section.kind.is_blank() {
            return Err(MutationError::WidgetSection(target.clone()));
        }

        if let Ok(section) = self.section_mut(&source) {
            if let Some(list) = section.elements.as_mut() {
                list.retain(|e| e != id);
            }
        }
        if let Some(list) = self.section_mut(target)?.elements.as_mut() {
            let slot = position.unwrap_or(list.len()).min(list.len());
            list.insert(slot, id.clone());
        }
        if let Some(index) = self.element_index(id) {
            self.elements[index].section_id = target.clone();
        }

        self.renormalize(&source);
        self.renormalize(target);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Pages
    // -----------------------------------------------------------------

    /// Append a page named "Page N" with one blank section; returns its index
    pub fn add_page(&mut self, title: Option<&str>) -> usize {
        let mut n = self.pages.len() + 1;
        while self.pages.iter().any(|p| p.slug == format!("page-{}", n)) {
            n += 1;
        }
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| format!("Page {}", n));

        let mut page = Page::new(self.ids.page_id(), title, format!("page-{}", n));
        page.sections.push(blank_section(&mut self.ids));
        self.pages.push(page);
        self.pages.len() - 1
    }

    /// Delete a page and everything on it; the last page cannot be deleted
    pub fn delete_page(&mut self, index: usize) -> Result<PageId, MutationError> {
        if index >= self.pages.len() {
            return Err(MutationError::page_index(index));
        }
        if self.pages.len() == 1 {
            return Err(MutationError::LastPage);
        }

        let page = self.pages.remove(index);
        let sections: Vec<&SectionId> = page.sections.iter().map(|s| &s.id).collect();
        self.elements.retain(|e| !sections.contains(&&e.section_id));

        if self.current_page > index || self.current_page >= self.pages.len() {
            self.current_page = self.current_page.saturating_sub(1);
        }
        Ok(page.id)
    }

    /// Deep-copy a page with fresh ids right after the original; returns the copy's index
    pub fn duplicate_page(&mut self, index: usize) -> Result<usize, MutationError> {
        let source = self
            .pages
            .get(index)
            .cloned()
            .ok_or_else(|| MutationError::page_index(index))?;

        let mut copy = source.clone();
        copy.id = self.ids.page_id();
        copy.title = format!("{} (Copy)", source.title);
        copy.slug = format!("{}-copy", source.slug);

        let mut new_elements = Vec::new();
        for section in copy.sections.iter_mut() {
            section.id = self.ids.section_id();
            let Some(list) = section.elements.take() else {
                continue;
            };

            let mut new_list = Vec::with_capacity(list.len());
            for element_id in &list {
                let Some(mut element) = self.element(element_id).cloned() else {
                    continue;
                };
                element.id = self.ids.element_id();
                element.section_id = section.id.clone();
                new_list.push(element.id.clone());
                new_elements.push(element);
            }
            section.elements = Some(new_list);
        }

        self.pages.insert(index + 1, copy);
        self.elements.extend(new_elements);
        if self.current_page > index {
            self.current_page += 1;
        }
        Ok(index + 1)
    }

    pub fn rename_page(&mut self, index: usize, title: &str, slug: Option<&str>) -> Result<(), MutationError> {
        if title.trim().is_empty() {
            return Err(MutationError::InvalidProperties("page title is empty".to_string()));
        }
        let page = self.page_mut(index)?;
        page.title = title.to_string();
        if let Some(slug) = slug {
            page.slug = slug.to_string();
        }
        Ok(())
    }

    /// Move a page in the page list; the current page stays current
    pub fn reorder_pages(&mut self, from: usize, to: usize) -> Result<(), MutationError> {
        let len = self.pages.len();
        check_index(from, len)?;
        check_index(to, len)?;

        let current = self.pages[self.current_page].id.clone();
        let page = self.pages.remove(from);
        self.pages.insert(to, page);
        self.current_page = self
            .pages
            .iter()
            .position(|p| p.id == current)
            .unwrap_or(0);
        Ok(())
    }

    pub fn switch_page(&mut self, index: usize) -> Result<(), MutationError> {
        if index >= self.pages.len() {
            return Err(MutationError::page_index(index));
        }
        self.current_page = index;
        Ok(())
    }

    pub fn update_header_config(&mut self, index: usize, patch: &PropertyMap) -> Result<(), MutationError> {
        merge_map(&mut self.page_mut(index)?.header_config, patch);
        Ok(())
    }

    pub fn update_footer_config(&mut self, index: usize, patch: &PropertyMap) -> Result<(), MutationError> {
        merge_map(&mut self.page_mut(index)?.footer_config, patch);
        Ok(())
    }

    pub fn update_canvas_config(&mut self, index: usize, patch: &PropertyMap) -> Result<(), MutationError> {
        let page = self.page_mut(index)?;
        let mut map = match serde_json::to_value(&page.canvas_config).map_err(invalid)? {
            Value::Object(map) => map,
            _ => PropertyMap::new(),
        };
        merge_map(&mut map, patch);
        page.canvas_config = serde_json::from_value::<CanvasConfig>(Value::Object(map)).map_err(invalid)?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Breakpoints
    // -----------------------------------------------------------------

    /// Store derived geometry at `mode` for every element lacking an override.
    ///
    /// Desktop is never baked. Running it again without edits changes
    /// nothing. Returns the number of elements baked.
    pub fn generate_breakpoint_positions(&mut self, mode: ViewportMode, reference_width: f64) -> usize {
        if mode == ViewportMode::Desktop {
            return 0;
        }

        let resolver = self.resolver;
        let mut baked = 0;
        for element in self.elements.iter_mut() {
            if element.breakpoints.contains(mode) {
                continue;
            }
            let rect = resolver.derive(element, mode, reference_width);
            element.breakpoints.set(mode, rect);
            baked += 1;
        }

        if baked > 0 {
            info!(viewport = %mode, baked, "generated breakpoint positions");
        }
        baked
    }

    // -----------------------------------------------------------------
    // Renderer queries
    // -----------------------------------------------------------------

    /// Rendered height of a section: its stored height, grown to keep the
    /// lowest element plus bottom padding visible
    pub fn effective_section_height(&self, id: &SectionId, viewport: ViewportMode) -> Option<f64> {
        let section = self.section(id)?;
        Some(self.effective_height_of(section, viewport))
    }

    fn effective_height_of(&self, section: &Section, viewport: ViewportMode) -> f64 {
        let max_bottom = section
            .element_ids()
            .iter()
            .filter_map(|id| self.element(id))
            .map(|e| self.resolver.resolve(e, viewport).bottom())
            .fold(None, |acc: Option<f64>, bottom| Some(acc.map_or(bottom, |a| a.max(bottom))));

        match max_bottom {
            Some(bottom) => section.height.max(bottom + self.layout.section_bottom_padding),
            None => section.height,
        }
    }

    /// Total canvas height of a page plus trailing space
    pub fn canvas_height(&self, page_index: usize, viewport: ViewportMode) -> Option<f64> {
        let page = self.page(page_index)?;
        let sections: f64 = page
            .sections
            .iter()
            .map(|s| self.effective_height_of(s, viewport))
            .sum();
        Some(sections + CANVAS_TRAILING_SPACE)
    }

    /// Resolved boxes of every element on a page, section by section in paint order
    pub fn element_boxes(&self, page_index: usize, viewport: ViewportMode) -> Vec<ElementBox> {
        let Some(page) = self.page(page_index) else {
            return Vec::new();
        };

        let mut boxes = Vec::new();
        let mut offset = 0.0;
        for section in &page.sections {
            for element in section.element_ids().iter().filter_map(|id| self.element(id)) {
                boxes.push(ElementBox {
                    id: element.id.clone(),
                    section_id: section.id.clone(),
                    element_type: element.element_type,
                    rect: self.resolver.resolve(element, viewport),
                    section_offset: offset,
                    rotation: element.rotation,
                    z_index: element.z_index,
                    locked: element.locked,
                    visible: element.visible,
                });
            }
            offset += self.effective_height_of(section, viewport);
        }
        boxes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        Document::new(IdGenerator::from_seed("t"))
    }

    fn first_section(doc: &Document) -> SectionId {
        doc.current_page().sections[0].id.clone()
    }

    fn add(doc: &mut Document, ty: ElementType) -> ElementId {
        doc.add_element(ty, 100.0, 0.0, ViewportMode::Desktop, 1200.0, 600.0, AddElementOptions::default())
            .unwrap()
    }

    fn patch(value: Value) -> PropertyMap {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn z_ranks(doc: &Document, section: &SectionId) -> Vec<u32> {
        let mut ranks: Vec<u32> = doc.section_elements(section).iter().map(|e| e.z_index).collect();
        ranks.sort();
        ranks
    }

    #[test]
    fn test_new_document_has_home_page() {
        let doc = doc();
        assert_eq!(doc.pages().len(), 1);
        let page = doc.current_page();
        assert_eq!(page.title, "Home");
        assert_eq!(page.slug, "home");
        assert_eq!(page.sections.len(), 1);
        assert!(page.sections[0].kind.is_blank());
        assert_eq!(page.sections[0].height, 600.0);
    }

    #[test]
    fn test_add_element_centres_in_empty_section() {
        let mut doc = doc();
        let id = add(&mut doc, ElementType::Text);
        let el = doc.element(&id).unwrap();
        assert_eq!(el.base, Rect::new(100.0, 250.0, 300.0, 100.0));
        assert_eq!(el.breakpoints.get(ViewportMode::Desktop), Some(&el.base));
        assert_eq!(el.z_index, 0);
    }

    #[test]
    fn test_add_element_stacks_below_siblings() {
        let mut doc = doc();
        let first = add(&mut doc, ElementType::Text);
        let second = add(&mut doc, ElementType::Button);

        let first_bottom = doc.element(&first).unwrap().base.bottom();
        let second = doc.element(&second).unwrap();
        assert_eq!(second.base.y, first_bottom + 20.0);
        assert_eq!(second.z_index, 1);
    }

    #[test]
    fn test_add_element_fits_viewport() {
        let mut doc = doc();
        let id = doc
            .add_element(
                ElementType::Heading,
                900.0,
                0.0,
                ViewportMode::Mobile,
                375.0,
                600.0,
                AddElementOptions::default(),
            )
            .unwrap();
        let el = doc.element(&id).unwrap();
        assert_eq!(el.base.width, 335.0);
        assert_eq!(el.base.x, 40.0);
        assert_eq!(el.origin, ViewportMode::Mobile);
        assert!(el.breakpoints.contains(ViewportMode::Mobile));
        assert!(!el.breakpoints.contains(ViewportMode::Desktop));
    }

    #[test]
    fn test_add_element_grows_for_long_text() {
        let mut doc = doc();
        let options = AddElementOptions {
            properties: Some(patch(json!({ "content": "lorem ipsum ".repeat(40) }))),
            ..Default::default()
        };
        let id = doc
            .add_element(ElementType::Text, 0.0, 0.0, ViewportMode::Desktop, 1200.0, 600.0, options)
            .unwrap();
        assert!(doc.element(&id).unwrap().base.height > 100.0);
    }

    #[test]
    fn test_widget_section_rejects_elements() {
        let mut doc = doc();
        let gallery = doc.add_section(0, SectionKind::GalleryWidget, None).unwrap();
        let result = doc.add_element(
            ElementType::Button,
            0.0,
            0.0,
            ViewportMode::Desktop,
            1200.0,
            500.0,
            AddElementOptions::in_section(gallery.clone()),
        );
        assert_eq!(result, Err(MutationError::WidgetSection(gallery)));
        assert!(doc.elements().is_empty());
    }

    #[test]
    fn test_locked_element_rejects_edits() {
        let mut doc = doc();
        let id = add(&mut doc, ElementType::Button);
        let before = doc.element(&id).unwrap().clone();

        assert!(doc.toggle_lock(&id).unwrap());
        assert!(doc.update_position(&id, ViewportMode::Desktop, 5.0, 5.0).is_err());
        assert!(doc.update_size(&id, ViewportMode::Desktop, 50.0, 50.0, true).is_err());
        assert!(doc
            .update_properties(&id, &patch(json!({ "content": "Nope" })))
            .is_err());
        let mut after = doc.element(&id).unwrap().clone();
        after.locked = false;
        assert_eq!(after, before);

        assert!(!doc.toggle_lock(&id).unwrap());
        doc.update_position(&id, ViewportMode::Desktop, 5.0, 5.0).unwrap();
        assert_eq!(doc.element(&id).unwrap().base.x, 5.0);
    }

    #[test]
    fn test_tablet_edit_leaves_desktop_geometry() {
        let mut doc = doc();
        let id = add(&mut doc, ElementType::Image);
        let desktop = doc.resolve(&id, ViewportMode::Desktop).unwrap();

        doc.update_position(&id, ViewportMode::Tablet, 10.0, 20.0).unwrap();
        assert_eq!(doc.resolve(&id, ViewportMode::Desktop).unwrap(), desktop);
        let tablet = doc.resolve(&id, ViewportMode::Tablet).unwrap();
        assert_eq!((tablet.x, tablet.y), (10.0, 20.0));
    }

    #[test]
    fn test_resize_scales_font() {
        let mut doc = doc();
        let id = add(&mut doc, ElementType::Heading);
        doc.update_size(&id, ViewportMode::Desktop, 200.0, 60.0, true).unwrap();
        assert_eq!(doc.element(&id).unwrap().props.font_size(), Some(24.0));

        doc.update_size(&id, ViewportMode::Desktop, 2.0, 60.0, true).unwrap();
        assert_eq!(doc.element(&id).unwrap().props.font_size(), Some(MIN_FONT_SIZE));
    }

    #[test]
    fn test_z_order_stays_contiguous() {
        let mut doc = doc();
        let section = first_section(&doc);
        let a = add(&mut doc, ElementType::Text);
        let b = add(&mut doc, ElementType::Button);
        let c = add(&mut doc, ElementType::Image);

        doc.bring_to_front(&a).unwrap();
        assert_eq!(doc.element(&a).unwrap().z_index, 2);
        doc.send_to_back(&c).unwrap();
        assert_eq!(doc.element(&c).unwrap().z_index, 0);
        doc.delete_elements(&[b.clone()]).unwrap();
        assert_eq!(z_ranks(&doc, &section), vec![0, 1]);

        add(&mut doc, ElementType::Divider);
        doc.duplicate_elements(&[a.clone(), c.clone()]).unwrap();
        assert_eq!(z_ranks(&doc, &section), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_duplicate_offsets_every_stored_rect() {
        let mut doc = doc();
        let id = add(&mut doc, ElementType::Button);
        doc.update_position(&id, ViewportMode::Mobile, 5.0, 5.0).unwrap();

        let copies = doc.duplicate_elements(&[id.clone()]).unwrap();
        let original = doc.element(&id).unwrap();
        let copy = doc.element(&copies[0]).unwrap();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.base, original.base.offset(20.0, 20.0));
        assert_eq!(
            copy.breakpoints.get(ViewportMode::Mobile),
            Some(&Rect::new(25.0, 25.0, 50.0, 48.0))
        );
        assert_eq!(copy.z_index, 1);
    }

    #[test]
    fn test_non_deletable_elements_survive() {
        let mut doc = doc();
        let keep = add(&mut doc, ElementType::Text);
        let drop = add(&mut doc, ElementType::Text);
        let index = doc.element_index(&keep).unwrap();
        doc.elements[index].deletable = false;

        let removed = doc.delete_elements(&[keep.clone(), drop.clone()]).unwrap();
        assert_eq!(removed, vec![drop]);
        assert!(doc.element(&keep).is_some());
        assert!(doc.delete_elements(&[ElementId::from("ghost")]).is_err());
        assert_eq!(
            doc.delete_elements(&[keep.clone()]),
            Err(MutationError::NotDeletable(keep))
        );
    }

    #[test]
    fn test_delete_section_cascades() {
        let mut doc = doc();
        let extra = doc.add_section(0, SectionKind::Blank, None).unwrap();
        let id = doc
            .add_element(
                ElementType::Text,
                0.0,
                0.0,
                ViewportMode::Desktop,
                1200.0,
                600.0,
                AddElementOptions::in_section(extra.clone()),
            )
            .unwrap();

        let removed = doc.delete_section(&extra).unwrap();
        assert_eq!(removed, vec![id.clone()]);
        assert!(doc.element(&id).is_none());
        assert_eq!(doc.current_page().sections.len(), 1);
    }

    #[test]
    fn test_deleting_only_section_injects_blank() {
        let mut doc = doc();
        let only = first_section(&doc);
        doc.delete_section(&only).unwrap();
        let page = doc.current_page();
        assert_eq!(page.sections.len(), 1);
        assert_ne!(page.sections[0].id, only);
    }

    #[test]
    fn test_move_section_rejects_out_of_range() {
        let mut doc = doc();
        doc.add_section(0, SectionKind::ProductGrid, None).unwrap();
        assert_eq!(
            doc.move_section(0, 0, 5),
            Err(MutationError::IndexOutOfRange { index: 5, len: 2 })
        );
        doc.move_section(0, 0, 1).unwrap();
        assert_eq!(doc.current_page().sections[0].kind, SectionKind::ProductGrid);
    }

    #[test]
    fn test_effective_height_never_clips() {
        let mut doc = doc();
        let section = first_section(&doc);
        let id = add(&mut doc, ElementType::Image);
        assert_eq!(doc.effective_section_height(&section, ViewportMode::Desktop), Some(600.0));

        doc.update_position(&id, ViewportMode::Desktop, 0.0, 500.0).unwrap();
        assert_eq!(
            doc.effective_section_height(&section, ViewportMode::Desktop),
            Some(500.0 + 200.0 + 30.0)
        );
        assert_eq!(doc.section(&section).unwrap().height, 600.0);
        assert_eq!(doc.canvas_height(0, ViewportMode::Desktop), Some(730.0 + 200.0));
    }

    #[test]
    fn test_bake_is_idempotent() {
        let mut doc = doc();
        add(&mut doc, ElementType::Text);
        add(&mut doc, ElementType::Button);

        assert_eq!(doc.generate_breakpoint_positions(ViewportMode::Desktop, 1200.0), 0);
        assert_eq!(doc.generate_breakpoint_positions(ViewportMode::Tablet, 768.0), 2);
        let first = doc.snapshot();
        assert_eq!(doc.generate_breakpoint_positions(ViewportMode::Tablet, 768.0), 0);
        assert_eq!(doc.snapshot(), first);
    }

    #[test]
    fn test_move_element_between_sections() {
        let mut doc = doc();
        let from = first_section(&doc);
        let to = doc.add_section(0, SectionKind::Blank, None).unwrap();
        let a = add(&mut doc, ElementType::Text);
        let b = add(&mut doc, ElementType::Text);

        doc.move_element(&a, &to, None).unwrap();
        assert_eq!(doc.element(&a).unwrap().section_id, to);
        assert_eq!(doc.section(&to).unwrap().element_ids(), &[a.clone()]);
        assert_eq!(doc.section(&from).unwrap().element_ids(), &[b.clone()]);
        assert_eq!(doc.element(&b).unwrap().z_index, 0);

        let widget = doc.add_section(0, SectionKind::BookingWidget, None).unwrap();
        assert!(doc.move_element(&a, &widget, None).is_err());
    }

    #[test]
    fn test_page_lifecycle() {
        let mut doc = doc();
        let index = doc.add_page(None);
        assert_eq!(doc.page(index).unwrap().title, "Page 2");
        assert_eq!(doc.page(index).unwrap().slug, "page-2");

        doc.switch_page(1).unwrap();
        doc.reorder_pages(1, 0).unwrap();
        assert_eq!(doc.current_page_index(), 0);
        assert_eq!(doc.current_page().title, "Page 2");

        doc.rename_page(0, "About", Some("about")).unwrap();
        assert!(doc.rename_page(0, "  ", None).is_err());

        doc.delete_page(0).unwrap();
        assert_eq!(doc.delete_page(0), Err(MutationError::LastPage));
        assert_eq!(doc.current_page().title, "Home");
    }

    #[test]
    fn test_canvas_config_patch() {
        let mut doc = doc();
        doc.update_canvas_config(0, &patch(json!({ "transition": "fade", "background": "#fff" })))
            .unwrap();
        let config = &doc.current_page().canvas_config;
        assert_eq!(config.transition, Some(crate::animation::PageTransition::Fade));
        assert_eq!(config.background.as_deref(), Some("#fff"));

        doc.update_header_config(0, &patch(json!({ "logo": "Acme" }))).unwrap();
        doc.update_header_config(0, &patch(json!({ "logo": null }))).unwrap();
        assert!(doc.current_page().header_config.is_empty());
    }

    #[test]
    fn test_element_boxes_offset_by_section() {
        let mut doc = doc();
        let second = doc.add_section(0, SectionKind::Blank, None).unwrap();
        doc.add_element(
            ElementType::Spacer,
            0.0,
            0.0,
            ViewportMode::Desktop,
            1200.0,
            600.0,
            AddElementOptions::in_section(second),
        )
        .unwrap();

        let boxes = doc.element_boxes(0, ViewportMode::Desktop);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].section_offset, 600.0);
    }
}
