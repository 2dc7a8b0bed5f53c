//! # Clause Editor
//!
//! Editing engine for multi-page contract templates with embedded variable
//! fields.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ markup: stored page text ⇄ typed Content    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: TemplateController                  │
//! │  - LiveSurface (active page + selection)    │
//! │  - PageStore, History + Debounce            │
//! │  - Variable engine, resize, overflow guard  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ PersistenceAdapter: create / update / get   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Content model is source of truth**: rendering is a projection
//! 2. **Placeholders are leaves**: nesting cannot be represented
//! 3. **One history owner**: snapshots only, no host undo
//! 4. **Saves never lose edits**: a failed save leaves state untouched
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clause_editor::{EditorConfig, FieldType, MemoryAdapter, TemplateController};
//!
//! let adapter = MemoryAdapter::new();
//! let mut controller = TemplateController::new(EditorConfig::default());
//! controller.set_name("부동산 매매 계약서");
//! controller.insert_variable(FieldType::Text, "매도인 성명")?;
//! let id = controller.save(&adapter).await?;
//!
//! let reopened = TemplateController::load(&adapter, &id, EditorConfig::default()).await?;
//! ```

mod config;
mod controller;
mod errors;
mod history;
mod overflow;
mod pages;
mod persistence;
mod resize;
mod surface;
mod variables;

pub use config::EditorConfig;
pub use controller::{Arrow, EditKey, KeyOutcome, SaveRequest, TemplateController};
pub use errors::EditorError;
pub use history::{Debounce, History, DEFAULT_DEBOUNCE, DEFAULT_HISTORY_LIMIT};
pub use overflow::{KeyClass, KeyDecision, OverflowGuard, DEFAULT_PAGE_CAPACITY, DEFAULT_TOLERANCE};
pub use pages::PageStore;
pub use persistence::{MemoryAdapter, PersistenceAdapter, PersistenceError, TemplatePayload};
pub use resize::{
    CellBounds, ColumnResize, ColumnResizer, DragCapture, GlobalListeners, ImageResize, ImageResizer,
    ImageSize, ListenerHandle, ListenerKind, COLUMN_EDGE_THRESHOLD, MIN_COLUMN_WIDTH, MIN_IMAGE_WIDTH,
};
pub use surface::{CaretMove, LiveSurface, Position, Selection, SurfaceError};
pub use variables::{
    collect_schema, deserialize_document, deserialize_page, duplicate_keys, hydrate, insert_placeholder,
    placeholder_hint, prepare_placeholder, select_on_pointer, PointerSelection, VariableField, SPACER,
};

// Re-export common types for convenience
pub use clause_markup::{Content, FieldType, Node, NodePath, Placeholder};
