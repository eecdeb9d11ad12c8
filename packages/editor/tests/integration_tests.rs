//! Integration tests for the editor crate

use freeform_editor::{
    AddElementOptions, AutosaveCache, DocumentStore, DragPayload, DragState, DropOutcome,
    DropTarget, DropValidation, EditorConfig, EditorSession, ElementType, FileStore, MemoryCache,
    MemoryStore, Rect, Repair, SaveStatus, SectionKind, Selection, ViewportMode,
};
use serde_json::json;

fn session() -> EditorSession {
    EditorSession::new("integration", EditorConfig::default())
}

#[test]
fn test_add_then_undo() {
    let mut session = session();
    let section = session.document().current_page().sections[0].id.clone();
    let before = session.document().section(&section).cloned();

    let id = session
        .add_element(
            ElementType::Text,
            100.0,
            250.0,
            ViewportMode::Desktop,
            1200.0,
            600.0,
            AddElementOptions::default(),
        )
        .unwrap();

    let element = session.document().element(&id).unwrap();
    assert_eq!(element.base, Rect::new(100.0, 250.0, 300.0, 100.0));
    assert_eq!(session.document().elements().len(), 1);
    assert_eq!(*session.selection(), Selection::Elements(vec![id.clone()]));

    // an extra commit from the host is harmless
    assert!(!session.commit());
    assert!(session.undo());

    assert!(session.document().elements().is_empty());
    assert_eq!(session.document().section(&section).cloned(), before);
    assert!(session.selection().is_empty());
    assert!(session.can_redo());
}

#[test]
fn test_widget_section_rejects_element_add() {
    let mut session = session();
    let gallery = session.add_section(SectionKind::GalleryWidget, None).unwrap();
    let revision = session.revision();

    let id = session.add_element(
        ElementType::Button,
        0.0,
        0.0,
        ViewportMode::Desktop,
        1200.0,
        600.0,
        AddElementOptions::in_section(gallery),
    );

    assert!(id.is_none());
    assert!(session.document().elements().is_empty());
    assert_eq!(session.revision(), revision);
}

#[test]
fn test_drop_validation_blocks_invalid_nesting() {
    let mut session = session();
    let grid = session.add_section(SectionKind::ProductGrid, None).unwrap();
    session.set_drop_validator(|dragged: &str, target: &str, _: &str| {
        if dragged == "contactForm" && target == "productGrid" {
            DropValidation::invalid("Forms cannot be nested in a product grid")
        } else {
            DropValidation::valid()
        }
    });
    let revision = session.revision();
    let depth = session.history().undo_depth();

    session.drag_start(DragPayload::NewElement(ElementType::ContactForm));
    let hover = session.drag_over(DropTarget::Section { id: grid }).unwrap();
    assert!(!hover.is_valid);

    let outcome = session.drop();
    assert!(matches!(outcome, DropOutcome::Rejected(_)));
    assert_eq!(*session.drag_state(), DragState::Idle);
    assert_eq!(session.revision(), revision);
    assert_eq!(session.history().undo_depth(), depth);
}

#[test]
fn test_accepted_drop_selects_and_undoes() {
    let mut session = session();
    let section = session.document().current_page().sections[0].id.clone();

    session.drag_start(DragPayload::NewElement(ElementType::Image));
    session.drag_over(DropTarget::Section { id: section });
    let DropOutcome::AddedElement(id) = session.drop() else {
        panic!("drop should add an element");
    };
    assert!(session.selection().contains_element(&id));

    session.undo();
    assert!(session.document().element(&id).is_none());
}

#[test]
fn test_duplicate_page() {
    let mut session = session();
    let first = session.document().current_page().sections[0].id.clone();
    let second = session.add_section(SectionKind::Blank, None).unwrap();
    session.add_element_to_section(ElementType::Heading, Some(first.clone()));
    session.add_element_to_section(ElementType::Text, Some(first));
    let button = session
        .add_element_to_section(ElementType::Button, Some(second))
        .unwrap();
    session.update_properties(&button, json!({ "content": "Book now" }).as_object().unwrap());
    session.commit_property_change();

    let original = session.document().pages()[0].clone();
    session.duplicate_page(0).unwrap();

    let doc = session.document();
    assert_eq!(doc.pages().len(), 2);
    assert_eq!(doc.current_page_index(), 1);
    assert_eq!(doc.pages()[0], original);

    let copy = &doc.pages()[1];
    assert_ne!(copy.id, original.id);
    assert_eq!(copy.sections.len(), original.sections.len());
    assert_eq!(doc.elements().len(), 6);

    for (orig_section, copy_section) in original.sections.iter().zip(&copy.sections) {
        assert_ne!(orig_section.id, copy_section.id);
        assert_eq!(orig_section.kind, copy_section.kind);
        assert_eq!(orig_section.height, copy_section.height);

        let originals = doc.section_elements(&orig_section.id);
        let copies = doc.section_elements(&copy_section.id);
        assert_eq!(originals.len(), copies.len());
        for (a, b) in originals.iter().zip(&copies) {
            assert_ne!(a.id, b.id);
            assert_eq!(b.section_id, copy_section.id);
            assert_eq!(a.element_type, b.element_type);
            assert_eq!(a.props, b.props);
            assert_eq!(a.base, b.base);
        }
    }
}

#[test]
fn test_section_height_never_clips() {
    let mut session = session();
    let section = session.document().current_page().sections[0].id.clone();
    let id = session
        .add_element_to_section(ElementType::Image, Some(section.clone()))
        .unwrap();

    session.update_position(&id, 0.0, 550.0);
    session.commit_position_change();

    // bottom edge 750 plus 30 padding
    assert_eq!(session.effective_section_height(&section), Some(780.0));
    assert_eq!(session.document().section(&section).unwrap().height, 600.0);

    session.update_section_height(&section, 900.0);
    assert_eq!(session.effective_section_height(&section), Some(900.0));
}

#[test]
fn test_locked_element_ignores_edits() {
    let mut session = session();
    let id = session.add_element_to_section(ElementType::Button, None).unwrap();
    assert_eq!(session.toggle_lock(&id), Some(true));
    let before = session.document().element(&id).cloned();
    let revision = session.revision();

    assert!(!session.update_position(&id, 5.0, 5.0));
    assert!(!session.update_size(&id, 50.0, 50.0, false));
    assert!(!session.set_rotation(&id, 45.0));
    assert!(!session.update_properties(&id, json!({ "label": "x" }).as_object().unwrap()));

    assert_eq!(session.document().element(&id).cloned(), before);
    assert_eq!(session.revision(), revision);
}

#[test]
fn test_viewport_bake_is_idempotent() {
    let mut session = session();
    let id = session.add_element_to_section(ElementType::Heading, None).unwrap();

    session.set_viewport(ViewportMode::Mobile);
    let baked = session.document().element(&id).cloned().unwrap();
    assert!(baked.breakpoints.contains(ViewportMode::Mobile));

    session.set_viewport(ViewportMode::Desktop);
    session.set_viewport(ViewportMode::Mobile);
    assert_eq!(session.document().element(&id), Some(&baked));
    assert_eq!(session.zoom(), 0.95);
}

#[test]
fn test_mobile_edit_keeps_desktop_geometry() {
    let mut session = session();
    let id = session.add_element_to_section(ElementType::Button, None).unwrap();
    let desktop = session.document().resolve(&id, ViewportMode::Desktop).unwrap();

    session.set_viewport(ViewportMode::Mobile);
    session.update_position(&id, 10.0, 10.0);
    session.commit_position_change();

    assert_eq!(session.document().resolve(&id, ViewportMode::Desktop), Some(desktop));
    let mobile = session.document().resolve(&id, ViewportMode::Mobile).unwrap();
    assert_eq!((mobile.x, mobile.y), (10.0, 10.0));
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path().join("drafts").join("site.json"));

    let mut session = session();
    session.add_page(Some("About"));
    let id = session.add_element_to_section(ElementType::Quote, None).unwrap();
    session.save(&mut store).unwrap();
    assert_eq!(session.save_status(), SaveStatus::Saved);

    let reloaded = EditorSession::from_store("reload", &store, EditorConfig::default()).unwrap();
    assert!(reloaded.repairs().is_empty());
    assert_eq!(reloaded.document().pages(), session.document().pages());
    assert_eq!(reloaded.document().element(&id), session.document().element(&id));
    assert_eq!(reloaded.document().current_page_index(), 1);
}

#[test]
fn test_load_repairs_malformed_input() {
    let json = json!({
        "format": "freeform",
        "version": 1,
        "pages": [
            {
                "id": "p1",
                "title": "Home",
                "slug": "home",
                "sections": []
            }
        ],
        "elements": [
            { "id": "orphan", "type": "text", "sectionId": "nowhere" }
        ],
        "currentPageIndex": 7
    });

    let session = EditorSession::load(
        "repair",
        Some(&json.to_string()),
        EditorConfig::default(),
    );
    let doc = session.document();
    assert_eq!(doc.current_page().sections.len(), 1);
    assert!(doc.elements().is_empty());
    assert_eq!(doc.current_page_index(), 0);
    assert!(session
        .repairs()
        .iter()
        .any(|r| matches!(r, Repair::InjectedSection { .. })));

    let garbage = EditorSession::load("garbage", Some("{ not json"), EditorConfig::default());
    assert_eq!(garbage.document().pages().len(), 1);
    assert!(matches!(garbage.repairs(), [Repair::DefaultDocument(_)]));
}

#[test]
fn test_autosave_recovers_unsaved_work() {
    let mut cache = MemoryCache::new();
    let mut store = MemoryStore::new();

    let mut session = EditorSession::new("tab-a", EditorConfig::default());
    session.save(&mut store).unwrap();
    session.add_element_to_section(ElementType::Caption, None);

    session.poll_autosave(1_000, &mut cache);
    assert!(session.poll_autosave(2_500, &mut cache));

    // another tab keeps its own draft
    let other = EditorSession::new("tab-b", EditorConfig::default());
    assert_ne!(other.autosave_key(), session.autosave_key());

    let recovered = EditorSession::recover("tab-a", &cache, EditorConfig::default()).unwrap();
    assert_eq!(recovered.document().elements().len(), 1);

    session.save(&mut store).unwrap();
    session.discard_autosave(&mut cache);
    assert!(cache.read(&session.autosave_key()).is_none());
    assert!(store.load().unwrap().is_some());
}
