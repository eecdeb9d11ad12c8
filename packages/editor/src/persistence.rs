//! # Persistence
//!
//! The saved document format and the lenient loader.
//!
//! Loading never fails: a corrupt autosave cache must not strand the user.
//! Whatever cannot be understood is repaired or dropped, and every repair is
//! reported back as a [`Repair`] (and logged at `warn`).
//!
//! ```text
//! JSON ──parse──▶ RawDocument ──per page / section / element──▶ SavedDocument
//!                     │                                                 │
//!          unparseable or foreign                                   repairs[]
//!                     ▼
//!              default document
//! ```

use crate::document::{blank_section, default_page, Document};
use crate::errors::EditorError;
use crate::ids::{ElementId, IdGenerator, SectionId};
use crate::model::{Element, Page, Section};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

pub const FORMAT_TAG: &str = "freeform";
pub const FORMAT_VERSION: u32 = 1;

/// Serialized site document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDocument {
    pub format: String,
    pub version: u32,
    pub pages: Vec<Page>,
    /// Flat list; each element carries its owning section id
    pub elements: Vec<Element>,
    pub current_page_index: usize,
}

impl SavedDocument {
    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Something the loader had to fix
#[derive(Debug, Clone, PartialEq)]
pub enum Repair {
    /// Nothing usable; the default document was substituted
    DefaultDocument(String),
    DroppedPage { index: usize, reason: String },
    DroppedSection { page: String, index: usize, reason: String },
    /// A top-level field had the wrong type and was treated as empty
    MalformedField { field: &'static str },
    EmptyPageList,
    InjectedSection { page: String },
    DroppedElement { id: Option<String>, reason: String },
    RebuiltMembership { section: SectionId },
    WidgetElementsCleared { section: SectionId },
    ClampedPageIndex { from: i64, to: usize },
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repair::DefaultDocument(reason) => write!(f, "replaced with default document: {}", reason),
            Repair::DroppedPage { index, reason } => write!(f, "dropped page #{}: {}", index, reason),
            Repair::DroppedSection { page, index, reason } => {
                write!(f, "dropped section #{} of page {}: {}", index, page, reason)
            }
            Repair::MalformedField { field } => write!(f, "ignored malformed {:?}", field),
            Repair::EmptyPageList => write!(f, "no pages; added default Home page"),
            Repair::InjectedSection { page } => write!(f, "page {} had no sections; added a blank one", page),
            Repair::DroppedElement { id, reason } => write!(
                f,
                "dropped element {}: {}",
                id.as_deref().unwrap_or("<unknown>"),
                reason
            ),
            Repair::RebuiltMembership { section } => {
                write!(f, "rebuilt element list of section {}", section)
            }
            Repair::WidgetElementsCleared { section } => {
                write!(f, "cleared element list of widget section {}", section)
            }
            Repair::ClampedPageIndex { from, to } => {
                write!(f, "clamped current page index {} to {}", from, to)
            }
        }
    }
}

/// A loaded document with the repairs that were applied
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub document: SavedDocument,
    pub repairs: Vec<Repair>,
}

/// Top level read field by field, so one mistyped field cannot sink the rest
struct RawDocument {
    pages: Vec<Value>,
    elements: Vec<Value>,
    current_page_index: i64,
}

impl RawDocument {
    fn read(mut map: Map<String, Value>, repairs: &mut Vec<Repair>) -> Self {
        let mut list = |field: &'static str| match map.remove(field) {
            None => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                record(repairs, Repair::MalformedField { field });
                Vec::new()
            }
        };
        let pages = list("pages");
        let elements = list("elements");

        let current_page_index = match map.get("currentPageIndex") {
            None | Some(Value::Null) => 0,
            Some(value) => match integer(value) {
                Some(index) => index,
                None => {
                    record(
                        repairs,
                        Repair::MalformedField {
                            field: "currentPageIndex",
                        },
                    );
                    0
                }
            },
        };

        Self {
            pages,
            elements,
            current_page_index,
        }
    }
}

/// Whole numbers written as integers, floats or numeric strings
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.round() as i64),
        _ => None,
    }
}

fn default_saved(ids: &mut IdGenerator) -> SavedDocument {
    SavedDocument {
        format: FORMAT_TAG.to_string(),
        version: FORMAT_VERSION,
        pages: vec![default_page(ids)],
        elements: Vec::new(),
        current_page_index: 0,
    }
}

fn defaulted(ids: &mut IdGenerator, mut repairs: Vec<Repair>, reason: String) -> LoadReport {
    record(&mut repairs, Repair::DefaultDocument(reason));
    LoadReport {
        document: default_saved(ids),
        repairs,
    }
}

fn record(repairs: &mut Vec<Repair>, repair: Repair) {
    warn!("{}", repair);
    repairs.push(repair);
}

/// Parse and repair a serialized document.
///
/// `None` (no document yet) yields the default document without repairs.
pub fn load_document(json: Option<&str>, ids: &mut IdGenerator) -> LoadReport {
    let mut repairs = Vec::new();

    let Some(json) = json else {
        return LoadReport {
            document: default_saved(ids),
            repairs,
        };
    };

    let map = match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return defaulted(ids, repairs, "top level is not an object".to_string()),
        Err(e) => return defaulted(ids, repairs, format!("unparseable: {}", e)),
    };

    match map.get("format") {
        None | Some(Value::Null) => {}
        Some(Value::String(format)) if format == FORMAT_TAG => {}
        Some(other) => {
            let reason = format!("unknown format tag {}", other);
            return defaulted(ids, repairs, reason);
        }
    }
    match map.get("version") {
        None | Some(Value::Null) => {}
        Some(value) => match integer(value) {
            Some(version) if version > FORMAT_VERSION as i64 => {
                warn!(version, "document was written by a newer format version");
            }
            Some(_) => {}
            None => warn!(%value, "unreadable format version"),
        },
    }

    let raw = RawDocument::read(map, &mut repairs);
    let document = repair(raw, ids, &mut repairs);
    info!(
        pages = document.pages.len(),
        elements = document.elements.len(),
        repairs = repairs.len(),
        "loaded document"
    );
    LoadReport { document, repairs }
}

fn repair(raw: RawDocument, ids: &mut IdGenerator, repairs: &mut Vec<Repair>) -> SavedDocument {
    // Pages
    let mut pages: Vec<Page> = Vec::new();
    for (index, value) in raw.pages.into_iter().enumerate() {
        if let Some(page) = read_page(index, value, repairs) {
            pages.push(page);
        }
    }
    for page in &pages {
        ids.observe(page.id.as_str());
        for section in &page.sections {
            ids.observe(section.id.as_str());
        }
    }
    if pages.is_empty() {
        record(repairs, Repair::EmptyPageList);
        pages.push(default_page(ids));
    }
    for page in pages.iter_mut() {
        if page.sections.is_empty() {
            record(
                repairs,
                Repair::InjectedSection {
                    page: page.id.to_string(),
                },
            );
            page.sections.push(blank_section(ids));
        }
    }

    // Elements
    let blank_sections: HashSet<SectionId> = pages
        .iter()
        .flat_map(|p| p.sections.iter())
        .filter(|s| s.kind.is_blank())
        .map(|s| s.id.clone())
        .collect();

    let mut seen: HashSet<ElementId> = HashSet::new();
    let mut elements: Vec<Element> = Vec::new();
    for value in raw.elements {
        let id = value.get("id").and_then(Value::as_str).map(str::to_string);
        let element = match serde_json::from_value::<Element>(value) {
            Ok(element) => element,
            Err(e) => {
                record(
                    repairs,
                    Repair::DroppedElement {
                        id,
                        reason: e.to_string(),
                    },
                );
                continue;
            }
        };
        if !blank_sections.contains(&element.section_id) {
            record(
                repairs,
                Repair::DroppedElement {
                    id,
                    reason: format!("no blank section {}", element.section_id),
                },
            );
            continue;
        }
        if !seen.insert(element.id.clone()) {
            record(
                repairs,
                Repair::DroppedElement {
                    id,
                    reason: "duplicate id".to_string(),
                },
            );
            continue;
        }
        elements.push(element);
    }

    // Section membership follows element back-references; listed order wins
    for section in pages.iter_mut().flat_map(|p| p.sections.iter_mut()) {
        if !section.kind.is_blank() {
            if section.elements.take().is_some_and(|list| !list.is_empty()) {
                record(
                    repairs,
                    Repair::WidgetElementsCleared {
                        section: section.id.clone(),
                    },
                );
            }
            continue;
        }

        let listed = section.elements.take().unwrap_or_default();
        let owned = |id: &ElementId| elements.iter().any(|e| &e.id == id && e.section_id == section.id);

        let mut list: Vec<ElementId> = Vec::new();
        for id in &listed {
            if owned(id) && !list.contains(id) {
                list.push(id.clone());
            }
        }
        let mut unlisted: Vec<&Element> = elements
            .iter()
            .filter(|e| e.section_id == section.id && !list.contains(&e.id))
            .collect();
        unlisted.sort_by_key(|e| e.z_index);
        list.extend(unlisted.into_iter().map(|e| e.id.clone()));

        if list != listed {
            record(
                repairs,
                Repair::RebuiltMembership {
                    section: section.id.clone(),
                },
            );
        }
        section.elements = Some(list);
    }

    // Renormalize z ranks from paint order
    for section in pages.iter().flat_map(|p| p.sections.iter()) {
        for (rank, id) in section.element_ids().iter().enumerate() {
            if let Some(element) = elements.iter_mut().find(|e| &e.id == id) {
                element.z_index = rank as u32;
            }
        }
    }

    let requested = raw.current_page_index;
    let current_page_index = requested.clamp(0, pages.len() as i64 - 1) as usize;
    if requested != current_page_index as i64 {
        record(
            repairs,
            Repair::ClampedPageIndex {
                from: requested,
                to: current_page_index,
            },
        );
    }

    for element in &elements {
        ids.observe(element.id.as_str());
    }

    SavedDocument {
        format: FORMAT_TAG.to_string(),
        version: FORMAT_VERSION,
        pages,
        elements,
        current_page_index,
    }
}

/// Decode a page, keeping whichever of its sections are readable
fn read_page(index: usize, value: Value, repairs: &mut Vec<Repair>) -> Option<Page> {
    let Value::Object(mut map) = value else {
        record(
            repairs,
            Repair::DroppedPage {
                index,
                reason: "not an object".to_string(),
            },
        );
        return None;
    };
    let sections = match map.remove("sections") {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };

    let mut page = match serde_json::from_value::<Page>(Value::Object(map)) {
        Ok(page) => page,
        Err(e) => {
            record(
                repairs,
                Repair::DroppedPage {
                    index,
                    reason: e.to_string(),
                },
            );
            return None;
        }
    };
    for (position, value) in sections.into_iter().enumerate() {
        match serde_json::from_value::<Section>(value) {
            Ok(section) => page.sections.push(section),
            Err(e) => record(
                repairs,
                Repair::DroppedSection {
                    page: page.id.to_string(),
                    index: position,
                    reason: e.to_string(),
                },
            ),
        }
    }
    Some(page)
}

impl Document {
    /// Build an editable document from a repaired save
    pub fn from_saved(saved: SavedDocument, ids: IdGenerator) -> Self {
        Document::from_parts(saved.pages, saved.elements, saved.current_page_index, ids)
    }

    /// Export in the saved document format
    pub fn to_saved(&self) -> SavedDocument {
        SavedDocument {
            format: FORMAT_TAG.to_string(),
            version: FORMAT_VERSION,
            pages: self.pages().to_vec(),
            elements: self.elements().to_vec(),
            current_page_index: self.current_page_index(),
        }
    }
}

/// Durable storage supplied by the host
pub trait DocumentStore {
    /// Previously saved document, if any
    fn load(&self) -> Result<Option<String>, EditorError>;

    fn save(&mut self, json: &str) -> Result<(), EditorError>;
}

/// In-memory store for hosts without durable storage and for tests
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    contents: Option<String>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(json: impl Into<String>) -> Self {
        Self {
            contents: Some(json.into()),
            fail_saves: false,
        }
    }

    /// Make every following save fail (or succeed again)
    pub fn set_fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, EditorError> {
        Ok(self.contents.clone())
    }

    fn save(&mut self, json: &str) -> Result<(), EditorError> {
        if self.fail_saves {
            return Err(EditorError::Store("store rejected the save".to_string()));
        }
        self.contents = Some(json.to_string());
        Ok(())
    }
}

/// Store backed by a JSON file on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl DocumentStore for FileStore {
    fn load(&self) -> Result<Option<String>, EditorError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&self.path)?))
    }

    fn save(&mut self, json: &str) -> Result<(), EditorError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load(value: Value) -> LoadReport {
        let json = value.to_string();
        load_document(Some(&json), &mut IdGenerator::from_seed("load"))
    }

    #[test]
    fn test_absent_document_is_default() {
        let report = load_document(None, &mut IdGenerator::from_seed("x"));
        assert!(report.repairs.is_empty());
        assert_eq!(report.document.pages.len(), 1);
        assert_eq!(report.document.pages[0].title, "Home");
        assert_eq!(report.document.pages[0].sections[0].height, 600.0);
    }

    #[test]
    fn test_unparseable_json_is_default() {
        let report = load_document(Some("{not json"), &mut IdGenerator::from_seed("x"));
        assert!(matches!(report.repairs[0], Repair::DefaultDocument(_)));
        assert_eq!(report.document.pages[0].slug, "home");
    }

    #[test]
    fn test_foreign_format_is_default() {
        let report = load(json!({ "format": "other", "pages": [] }));
        assert!(matches!(report.repairs[0], Repair::DefaultDocument(_)));
    }

    #[test]
    fn test_page_without_sections_gets_blank_one() {
        let report = load(json!({
            "format": "freeform",
            "version": 1,
            "pages": [{ "id": "p1", "title": "About", "slug": "about", "sections": [] }],
            "elements": [],
            "currentPageIndex": 0
        }));
        let page = &report.document.pages[0];
        assert_eq!(page.sections.len(), 1);
        assert!(page.sections[0].kind.is_blank());
        assert_eq!(page.sections[0].height, 600.0);
        assert_eq!(report.repairs, vec![Repair::InjectedSection { page: "p1".to_string() }]);
    }

    #[test]
    fn test_page_index_is_clamped() {
        let report = load(json!({
            "format": "freeform",
            "pages": [
                { "id": "p1", "title": "Home", "slug": "home",
                  "sections": [{ "id": "s1", "type": "blank", "height": 600, "elements": [] }] }
            ],
            "currentPageIndex": 7
        }));
        assert_eq!(report.document.current_page_index, 0);
        assert!(report
            .repairs
            .contains(&Repair::ClampedPageIndex { from: 7, to: 0 }));
    }

    fn two_pages() -> Value {
        json!({
            "format": "freeform",
            "version": 1,
            "pages": [
                { "id": "p1", "title": "Home", "slug": "home",
                  "sections": [{ "id": "s1", "type": "blank", "height": 600, "elements": ["e1"] }] },
                { "id": "p2", "title": "About", "slug": "about",
                  "sections": [{ "id": "s2", "type": "blank", "height": 400, "elements": [] }] }
            ],
            "elements": [
                { "id": "e1", "type": "text", "sectionId": "s1", "x": 0, "y": 0, "width": 300, "height": 100 }
            ],
            "currentPageIndex": 1
        })
    }

    fn titles(report: &LoadReport) -> Vec<&str> {
        report.document.pages.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn test_float_page_index_is_coerced() {
        let mut doc = two_pages();
        doc["currentPageIndex"] = json!(1.0);
        let report = load(doc);
        assert!(report.repairs.is_empty());
        assert_eq!(titles(&report), vec!["Home", "About"]);
        assert_eq!(report.document.current_page_index, 1);
        assert_eq!(report.document.elements.len(), 1);
    }

    #[test]
    fn test_unreadable_page_index_falls_back_to_first_page() {
        let mut doc = two_pages();
        doc["currentPageIndex"] = json!({ "page": 1 });
        let report = load(doc);
        assert_eq!(titles(&report), vec!["Home", "About"]);
        assert_eq!(report.document.current_page_index, 0);
        assert_eq!(
            report.repairs,
            vec![Repair::MalformedField {
                field: "currentPageIndex"
            }]
        );
    }

    #[test]
    fn test_string_version_only_warns() {
        let mut doc = two_pages();
        doc["version"] = json!("1");
        let report = load(doc);
        assert!(report.repairs.is_empty());
        assert_eq!(report.document.elements.len(), 1);

        let mut doc = two_pages();
        doc["version"] = json!("next");
        let report = load(doc);
        assert!(report.repairs.is_empty());
        assert_eq!(titles(&report), vec!["Home", "About"]);
    }

    #[test]
    fn test_non_array_lists_are_treated_as_empty() {
        let mut doc = two_pages();
        doc["pages"] = Value::Null;
        let report = load(doc);
        assert_eq!(titles(&report), vec!["Home"]);
        assert_eq!(report.repairs[0], Repair::MalformedField { field: "pages" });
        assert!(report.repairs.contains(&Repair::EmptyPageList));

        let mut doc = two_pages();
        doc["elements"] = json!({ "e1": {} });
        let report = load(doc);
        assert_eq!(titles(&report), vec!["Home", "About"]);
        assert!(report.document.elements.is_empty());
        assert_eq!(report.repairs[0], Repair::MalformedField { field: "elements" });
    }

    #[test]
    fn test_section_without_height_gets_kind_default() {
        let mut doc = two_pages();
        doc["pages"][1]["sections"] = json!([{ "id": "s2", "type": "blank", "elements": [] }]);
        let report = load(doc);
        assert!(report.repairs.is_empty());
        assert_eq!(titles(&report), vec!["Home", "About"]);
        assert_eq!(report.document.pages[1].sections[0].height, 400.0);
    }

    #[test]
    fn test_null_sections_get_blank_section() {
        let mut doc = two_pages();
        doc["pages"][1]["sections"] = Value::Null;
        let report = load(doc);
        assert_eq!(titles(&report), vec!["Home", "About"]);
        assert_eq!(report.document.pages[1].sections.len(), 1);
        assert_eq!(
            report.repairs,
            vec![Repair::InjectedSection {
                page: "p2".to_string()
            }]
        );
    }

    #[test]
    fn test_bad_section_is_dropped_alone() {
        let mut doc = two_pages();
        doc["pages"][0]["sections"] = json!([
            { "id": "s1", "type": "blank", "height": 600, "elements": ["e1"] },
            { "type": "blank", "height": 300 }
        ]);
        let report = load(doc);
        assert_eq!(titles(&report), vec!["Home", "About"]);
        assert_eq!(report.document.pages[0].sections.len(), 1);
        assert_eq!(report.document.elements.len(), 1);
        assert!(matches!(
            &report.repairs[..],
            [Repair::DroppedSection { page, index: 1, .. }] if page == "p1"
        ));
    }

    #[test]
    fn test_orphans_dropped_and_membership_rebuilt() {
        let report = load(json!({
            "format": "freeform",
            "version": 1,
            "pages": [{
                "id": "p1", "title": "Home", "slug": "home",
                "sections": [
                    { "id": "s1", "type": "blank", "height": 600, "elements": ["e2", "ghost"] },
                    { "id": "s2", "type": "galleryWidget", "height": 500, "elements": ["e1"] }
                ]
            }],
            "elements": [
                { "id": "e1", "type": "text", "sectionId": "s1", "x": 0, "y": 0, "width": 300, "height": 100, "zIndex": 5 },
                { "id": "e2", "type": "button", "sectionId": "s1", "x": 0, "y": 0, "width": 160, "height": 48, "zIndex": 9 },
                { "id": "e3", "type": "image", "sectionId": "s2", "x": 0, "y": 0, "width": 10, "height": 10 },
                { "id": "e4", "type": "unknownThing", "sectionId": "s1" }
            ],
            "currentPageIndex": 0
        }));

        let doc = &report.document;
        let ids: Vec<&str> = doc.elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);

        let s1 = &doc.pages[0].sections[0];
        assert_eq!(s1.element_ids(), &[ElementId::from("e2"), ElementId::from("e1")]);
        assert!(doc.pages[0].sections[1].elements.is_none());

        let z: Vec<(String, u32)> = doc
            .elements
            .iter()
            .map(|e| (e.id.to_string(), e.z_index))
            .collect();
        assert_eq!(z, vec![("e1".to_string(), 1), ("e2".to_string(), 0)]);

        let dropped = report
            .repairs
            .iter()
            .filter(|r| matches!(r, Repair::DroppedElement { .. }))
            .count();
        assert_eq!(dropped, 2);
    }

    #[test]
    fn test_loaded_ids_advance_generator() {
        let mut ids = IdGenerator::from_seed("abc");
        let json = json!({
            "format": "freeform",
            "pages": [{ "id": "page-abc-3", "title": "Home", "slug": "home",
                        "sections": [{ "id": "section-abc-4", "type": "blank", "height": 600 }] }],
            "elements": [{ "id": "el-abc-9", "type": "text", "sectionId": "section-abc-4" }]
        })
        .to_string();
        load_document(Some(&json), &mut ids);
        assert_eq!(ids.element_id().as_str(), "el-abc-10");
    }

    #[test]
    fn test_saved_document_round_trips() {
        let doc = Document::new(IdGenerator::from_seed("rt"));
        let saved = doc.to_saved();
        let json = saved.to_json().unwrap();

        let report = load_document(Some(&json), &mut IdGenerator::from_seed("rt"));
        assert!(report.repairs.is_empty());
        assert_eq!(report.document, saved);
    }

    #[test]
    fn test_memory_store_failure() {
        let mut store = MemoryStore::new();
        store.save("{}").unwrap();
        assert_eq!(store.contents(), Some("{}"));

        store.set_fail_saves(true);
        assert!(matches!(store.save("{}"), Err(EditorError::Store(_))));
    }
}
