//! # FreeForm Editor
//!
//! Core editing engine for FreeForm, a free-positioning page builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: canvas UI, palette, storage, timers   │
//! └─────────────────────────────────────────────┘
//!                     ↓ calls / events
//! ┌─────────────────────────────────────────────┐
//! │ session: one open editor                    │
//! │  - History (snapshot undo/redo)             │
//! │  - Selection, drag and drop, shortcuts      │
//! │  - Viewport, zoom, preview                  │
//! │  - Save status and autosave debounce        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: pages → sections → elements       │
//! │  - Validated edits (locks, widget sections) │
//! │  - Responsive geometry per viewport         │
//! │  - Layout queries for the renderer          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ persistence: versioned JSON + load repair   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Desktop geometry is the base**: narrower viewports either store an
//!    override or derive one by proportional scaling
//! 2. **Edits never throw at the host**: invalid operations are ignored
//! 3. **One action, one undo step**: live drags and resizes commit once
//! 4. **Loading never fails**: malformed input is repaired, not rejected
//!
//! ## Usage
//!
//! ```rust,ignore
//! use freeform_editor::{EditorConfig, EditorSession, ElementType, MemoryStore};
//!
//! let mut session = EditorSession::new("tab-1", EditorConfig::default());
//! let id = session.add_element_to_section(ElementType::Heading, None).unwrap();
//!
//! session.update_position(&id, 120.0, 80.0);
//! session.commit_position_change();
//!
//! let mut store = MemoryStore::new();
//! session.save(&mut store)?;
//! ```

mod animation;
mod autosave;
mod config;
mod document;
mod errors;
mod geometry;
mod history;
mod ids;
mod interaction;
mod keyboard;
mod model;
mod persistence;
mod selection;
mod session;

pub use animation::{
    snap_speed, AnimationConfig, AnimationCss, AnimationPreset, IterationCount, PageTransition,
    ANIMATION_SPEEDS,
};
pub use autosave::{AutosaveCache, AutosaveEntry, AutosaveScheduler, MemoryCache};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use document::{
    AddElementOptions, Document, ElementBox, LayoutRules, DEFAULT_BLANK_SECTION_HEIGHT,
};
pub use errors::{EditorError, MutationError};
pub use geometry::{
    estimate_text_height, BreakpointTable, Breakpoints, GeometryResolver, Rect, ViewportMode,
};
pub use history::{DocumentSnapshot, History};
pub use ids::{session_seed, ElementId, IdGenerator, PageId, SectionId};
pub use interaction::{
    AllowAll, DragController, DragPayload, DragState, DropContext, DropOutcome, DropTarget,
    DropValidation, DropValidator,
};
pub use keyboard::{command_for, EditorCommand, KeyContext, KeyEvent};
pub use model::{
    normalize_rotation, ButtonProps, CanvasConfig, DividerProps, Element, ElementProps,
    ElementType, FormField, FormProps, FrameProps, GridProps, ImageProps, Page, PropertyMap,
    Section, SectionKind, SectionProperties, SpacerProps, TextProps,
};
pub use persistence::{
    load_document, DocumentStore, FileStore, LoadReport, MemoryStore, Repair, SavedDocument,
    FORMAT_TAG, FORMAT_VERSION,
};
pub use selection::{PresetRegion, Selection};
pub use session::{EditorSession, KeyOutcome, SaveStatus, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
