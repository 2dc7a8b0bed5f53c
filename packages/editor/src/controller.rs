//! # Template Controller
//!
//! Owns the live surface, the page store, history, the overflow guard and
//! both resize controllers, and drives save/load against a
//! [`PersistenceAdapter`].
//!
//! Time is an explicit argument (`now`) on everything that touches the
//! typing debounce; the host calls [`TemplateController::tick`] from its
//! timer.

use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::history::{Debounce, History};
use crate::overflow::{KeyClass, KeyDecision, OverflowGuard};
use crate::pages::PageStore;
use crate::persistence::{PersistenceAdapter, PersistenceError, TemplatePayload};
use crate::resize::{CellBounds, ColumnResizer, GlobalListeners, ImageResizer, ImageSize};
use crate::surface::{CaretMove, LiveSurface, SurfaceError};
use crate::variables::{
    collect_schema, deserialize_document, insert_placeholder, prepare_placeholder, select_on_pointer,
    PointerSelection, VariableField,
};
use clause_markup::{join_pages, serialize, Content, Element, FieldType, Node, NodePath};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Left,
    Right,
    Up,
    Down,
}

/// A key press as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Arrow(Arrow),
    Home,
    End,
    PageUp,
    PageDown,
    /// Ctrl/Cmd combination
    Shortcut { key: char, shift: bool },
}

impl EditKey {
    fn class(&self) -> KeyClass {
        match self {
            EditKey::Char(_) | EditKey::Enter | EditKey::Tab => KeyClass::Growing,
            _ => KeyClass::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Content changed; a typing snapshot is pending
    Edited,
    /// Caret moved or nothing to delete
    Unchanged,
    Undone(bool),
    Redone(bool),
    /// Suppressed by the overflow guard
    PageFull,
    /// Left to the host (clipboard, vertical movement, ...)
    Passthrough,
}

/// Payload captured by [`TemplateController::begin_save`]
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// `None` for a template that was never saved
    pub id: Option<String>,
    pub payload: TemplatePayload,
}

#[derive(Debug)]
pub struct TemplateController {
    config: EditorConfig,
    id: Option<String>,
    name: String,
    category: String,
    pages: PageStore,
    surface: LiveSurface,
    history: History,
    debounce: Debounce,
    guard: OverflowGuard,
    listeners: GlobalListeners,
    columns: ColumnResizer,
    images: ImageResizer,
    saving: bool,
}

impl TemplateController {
    /// Unsaved template opened on the starter page
    pub fn new(config: EditorConfig) -> Self {
        Self::with_pages(config, vec![Content::starter()])
    }

    pub fn with_pages(config: EditorConfig, pages: Vec<Content>) -> Self {
        let listeners = GlobalListeners::new();
        let pages = PageStore::new(pages);
        let mut surface = LiveSurface::default();
        pages.load_active(&mut surface);
        let mut history = History::new(config.history_limit);
        history.reset(surface.content().clone());

        Self {
            debounce: Debounce::new(config.debounce()),
            guard: OverflowGuard::new(config.page_capacity, config.overflow_tolerance),
            columns: ColumnResizer::new(listeners.clone()),
            images: ImageResizer::new(listeners.clone()),
            category: config.default_category.clone(),
            listeners,
            config,
            id: None,
            name: String::new(),
            pages,
            surface,
            history,
            saving: false,
        }
    }

    /// Controller over a stored template; placeholders are rebuilt from the schema
    pub fn from_payload(payload: TemplatePayload, config: EditorConfig) -> Self {
        let mut controller = Self::with_pages(config, Vec::new());
        controller.apply_payload(None, payload);
        controller
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn surface(&self) -> &LiveSurface {
        &self.surface
    }

    /// For caret and selection placement; content edits go through the controller
    pub fn surface_mut(&mut self) -> &mut LiveSurface {
        &mut self.surface
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn active_page(&self) -> usize {
        self.pages.active()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn listeners(&self) -> &GlobalListeners {
        &self.listeners
    }

    pub fn is_page_full(&self, measured_height: f64) -> bool {
        self.guard.is_full(measured_height)
    }

    /// All pages with the live surface standing in for the active one
    pub fn current_pages(&self) -> Vec<Content> {
        let mut pages = self.pages.pages().to_vec();
        pages[self.pages.active()] = self.surface.content().clone();
        pages
    }

    /// Schema the next save would store
    pub fn field_schema(&self) -> Vec<VariableField> {
        collect_schema(&self.current_pages())
    }

    // ---------------------------------------------------------------
    // Keyboard and input
    // ---------------------------------------------------------------

    /// Route one key press. `measured_height` is the page's rendered height before the key.
    pub fn handle_key(&mut self, key: EditKey, measured_height: f64, now: Instant) -> Result<KeyOutcome, EditorError> {
        self.history.settle();

        match key {
            EditKey::Shortcut { key, shift } => {
                return Ok(match (key.to_ascii_lowercase(), shift) {
                    ('z', false) => KeyOutcome::Undone(self.undo()),
                    ('z', true) | ('y', _) => KeyOutcome::Redone(self.redo()),
                    _ => KeyOutcome::Passthrough,
                });
            }
            _ if self.guard.check(key.class(), measured_height) == KeyDecision::PageFull => {
                return Ok(KeyOutcome::PageFull);
            }
            _ => {}
        }

        let changed = match key {
            EditKey::Char(c) => {
                let mut buffer = [0u8; 4];
                self.surface.insert_text(c.encode_utf8(&mut buffer))?;
                true
            }
            EditKey::Tab => {
                self.surface.insert_text("\t")?;
                true
            }
            EditKey::Enter => {
                self.surface.insert_node(Node::Element(Element::new("br")))?;
                true
            }
            EditKey::Backspace => self.surface.delete_backward()?,
            EditKey::Delete => self.surface.delete_forward()?,
            EditKey::Arrow(Arrow::Left) => self.move_caret(CaretMove::Left)?,
            EditKey::Arrow(Arrow::Right) => self.move_caret(CaretMove::Right)?,
            EditKey::Home => self.move_caret(CaretMove::Home)?,
            EditKey::End => self.move_caret(CaretMove::End)?,
            EditKey::Arrow(_) | EditKey::PageUp | EditKey::PageDown | EditKey::Shortcut { .. } => {
                return Ok(KeyOutcome::Passthrough);
            }
        };

        if changed {
            self.debounce.arm(now);
            Ok(KeyOutcome::Edited)
        } else {
            Ok(KeyOutcome::Unchanged)
        }
    }

    fn move_caret(&mut self, direction: CaretMove) -> Result<bool, SurfaceError> {
        self.surface.move_caret(direction)?;
        Ok(false)
    }

    /// Content changed through a host path (paste, IME).
    ///
    /// The host's echo of an undo/redo write leaves the live content equal to
    /// the current entry and arms nothing.
    pub fn notify_input(&mut self, now: Instant) {
        if self.history.is_restoring() || self.history.current() == Some(self.surface.content()) {
            return;
        }
        self.debounce.arm(now);
    }

    /// Take the typing snapshot once the quiet period has passed
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.debounce.fire_due(now) {
            return false;
        }
        let pushed = self.history.push(self.surface.content().clone());
        if pushed {
            debug!(entries = self.history.len(), "typing snapshot");
        }
        pushed
    }

    // ---------------------------------------------------------------
    // History
    // ---------------------------------------------------------------

    /// Explicit snapshot of the live content
    pub fn snapshot(&mut self) -> bool {
        self.debounce.cancel();
        self.history.push(self.surface.content().clone())
    }

    /// Step back one entry. Typing not yet snapshotted is captured first so it can be undone.
    pub fn undo(&mut self) -> bool {
        if self.debounce.is_armed() {
            self.snapshot();
        }
        let restored = self.history.undo().cloned();
        self.restore(restored)
    }

    pub fn redo(&mut self) -> bool {
        self.debounce.cancel();
        let restored = self.history.redo().cloned();
        self.restore(restored)
    }

    /// Write a history entry back; capture resumes as soon as the write is done
    fn restore(&mut self, content: Option<Content>) -> bool {
        let restored = match content {
            Some(content) => {
                self.surface.set_content(content);
                true
            }
            None => false,
        };
        self.history.settle();
        restored
    }

    fn reset_history(&mut self) {
        self.debounce.cancel();
        self.history.reset(self.surface.content().clone());
    }

    /// Run a structural edit as its own undo unit
    fn structural<T>(
        &mut self,
        edit: impl FnOnce(&mut LiveSurface) -> Result<T, SurfaceError>,
    ) -> Result<T, EditorError> {
        self.snapshot();
        let result = edit(&mut self.surface)?;
        self.snapshot();
        Ok(result)
    }

    // ---------------------------------------------------------------
    // Variables
    // ---------------------------------------------------------------

    /// Insert a placeholder at the caret. An empty label changes nothing.
    pub fn insert_variable(&mut self, field_type: FieldType, label: &str) -> Result<VariableField, EditorError> {
        let placeholder = prepare_placeholder(field_type, label)?;
        let field = VariableField::new(placeholder.field_type.clone(), placeholder.label.clone());
        self.structural(|surface| insert_placeholder(surface, placeholder))?;
        debug!(key = %field.key, "variable inserted");
        Ok(field)
    }

    pub fn pointer_on_placeholder(&mut self, path: &[usize]) -> Result<PointerSelection, EditorError> {
        Ok(select_on_pointer(&mut self.surface, path)?)
    }

    // ---------------------------------------------------------------
    // Structural edits
    // ---------------------------------------------------------------

    pub fn set_font_size(&mut self, points: u32) -> Result<bool, EditorError> {
        let size = format!("{}pt", points);
        self.structural(|surface| surface.apply_inline_style("font-size", &size))
    }

    pub fn set_block_style(&mut self, property: &str, value: &str) -> Result<usize, EditorError> {
        self.structural(|surface| surface.apply_block_style(property, value))
    }

    pub fn set_line_height(&mut self, value: &str) -> Result<usize, EditorError> {
        self.set_block_style("line-height", value)
    }

    pub fn set_paragraph_spacing(&mut self, value: &str) -> Result<usize, EditorError> {
        self.set_block_style("margin-bottom", value)
    }

    pub fn set_alignment(&mut self, align: &str) -> Result<usize, EditorError> {
        self.set_block_style("text-align", align)
    }

    pub fn toggle_hanging_indent(&mut self) -> Result<bool, EditorError> {
        self.structural(LiveSurface::toggle_hanging_indent)
    }

    pub fn insert_table(&mut self, rows: usize, cols: usize) -> Result<NodePath, EditorError> {
        self.structural(|surface| surface.insert_table(rows, cols))
    }

    pub fn add_table_row(&mut self) -> Result<NodePath, EditorError> {
        self.structural(LiveSurface::add_table_row)
    }

    pub fn add_table_column(&mut self) -> Result<usize, EditorError> {
        self.structural(LiveSurface::add_table_column)
    }

    pub fn delete_table(&mut self) -> Result<(), EditorError> {
        self.structural(LiveSurface::delete_table)
    }

    pub fn insert_image(&mut self, src: &str) -> Result<NodePath, EditorError> {
        self.structural(|surface| surface.insert_image(src))
    }

    pub fn insert_page_divider(&mut self) -> Result<NodePath, EditorError> {
        self.structural(LiveSurface::insert_page_divider)
    }

    // ---------------------------------------------------------------
    // Resizing
    // ---------------------------------------------------------------

    pub fn column_pointer_down(&mut self, cell: NodePath, bounds: CellBounds, x: f64) -> bool {
        self.columns.pointer_down(cell, bounds, x)
    }

    /// Apply the dragged width; returns it when a drag is active
    pub fn column_pointer_move(&mut self, x: f64) -> Result<Option<f64>, EditorError> {
        let Some(resize) = self.columns.pointer_move(x) else {
            return Ok(None);
        };
        self.surface
            .set_style(&resize.cell, "width", &format!("{}px", resize.width))?;
        Ok(Some(resize.width))
    }

    /// End a column drag; the committed width becomes one undo entry
    pub fn column_pointer_up(&mut self) -> bool {
        let ended = self.columns.pointer_up().is_some();
        if ended {
            self.snapshot();
        }
        ended
    }

    pub fn image_grab(&mut self, image: NodePath, size: ImageSize, x: f64) -> bool {
        self.images.grab(image, size, x)
    }

    pub fn image_pointer_move(&mut self, x: f64) -> Result<Option<(f64, f64)>, EditorError> {
        let Some(resize) = self.images.pointer_move(x) else {
            return Ok(None);
        };
        self.surface
            .set_style(&resize.image, "width", &format!("{}px", resize.width))?;
        self.surface
            .set_style(&resize.image, "height", &format!("{}px", resize.height))?;
        Ok(Some((resize.width, resize.height)))
    }

    pub fn image_release(&mut self) -> bool {
        let ended = self.images.release().is_some();
        if ended {
            self.snapshot();
        }
        ended
    }

    // ---------------------------------------------------------------
    // Pages
    // ---------------------------------------------------------------

    pub fn add_page(&mut self) -> usize {
        let index = self.pages.add_page(&mut self.surface);
        self.reset_history();
        index
    }

    pub fn delete_page(&mut self) -> Result<usize, EditorError> {
        match self.pages.delete_page(&mut self.surface) {
            Ok(index) => {
                self.reset_history();
                Ok(index)
            }
            Err(err) => {
                warn!("cannot delete the only page");
                Err(err)
            }
        }
    }

    pub fn go_to_page(&mut self, index: usize) -> Result<(), EditorError> {
        self.pages.go_to(index, &mut self.surface)?;
        self.reset_history();
        Ok(())
    }

    pub fn next_page(&mut self) -> bool {
        let moved = self.pages.next(&mut self.surface);
        if moved {
            self.reset_history();
        }
        moved
    }

    pub fn prev_page(&mut self) -> bool {
        let moved = self.pages.prev(&mut self.surface);
        if moved {
            self.reset_history();
        }
        moved
    }

    // ---------------------------------------------------------------
    // Save / load
    // ---------------------------------------------------------------

    /// Flush, validate and capture the payload to store.
    ///
    /// Editing stays available until [`complete_save`](Self::complete_save);
    /// a second save is refused meanwhile.
    pub fn begin_save(&mut self) -> Result<SaveRequest, EditorError> {
        if self.saving {
            return Err(EditorError::SaveInProgress);
        }
        self.pages.flush_active(&self.surface);

        let name = self.name.trim();
        if name.is_empty() {
            warn!("save rejected: empty template name");
            return Err(EditorError::EmptyTemplateName);
        }

        let pages = self.pages.pages();
        let document = join_pages(&pages.iter().map(serialize).collect::<Vec<_>>());
        let category = match self.category.trim() {
            "" => self.config.default_category.clone(),
            category => category.to_string(),
        };
        let payload = TemplatePayload {
            name: name.to_string(),
            category,
            field_schema: collect_schema(pages),
            document,
        };

        self.saving = true;
        Ok(SaveRequest {
            id: self.id.clone(),
            payload,
        })
    }

    /// Finish a save. `Ok(Some(id))` is a freshly assigned id; on failure nothing but the busy flag changes.
    pub fn complete_save(&mut self, outcome: Result<Option<String>, PersistenceError>) -> Result<String, EditorError> {
        self.saving = false;
        match outcome {
            Ok(assigned) => {
                if let Some(id) = assigned {
                    self.id = Some(id);
                }
                let id = self.id.clone().unwrap_or_default();
                info!(id = %id, name = %self.name, pages = self.pages.len(), "template saved");
                Ok(id)
            }
            Err(err) => {
                warn!(error = %err, "template save failed");
                Err(err.into())
            }
        }
    }

    /// Create or update the template through `adapter`; returns its id
    pub async fn save<A>(&mut self, adapter: &A) -> Result<String, EditorError>
    where
        A: PersistenceAdapter + ?Sized,
    {
        let request = self.begin_save()?;
        let outcome = match &request.id {
            Some(id) => adapter
                .update_template(id, &request.payload)
                .await
                .map(|_| None),
            None => adapter.create_template(&request.payload).await.map(Some),
        };
        self.complete_save(outcome)
    }

    /// Replace the open template with the stored one; a failed fetch leaves everything as it was.
    ///
    /// Refused while a save is outstanding so its assigned id stays with the saved template.
    pub async fn open<A>(&mut self, adapter: &A, id: &str) -> Result<(), EditorError>
    where
        A: PersistenceAdapter + ?Sized,
    {
        if self.saving {
            warn!(id, "load refused: save in progress");
            return Err(EditorError::SaveInProgress);
        }
        let payload = adapter.get_template(id).await.map_err(|err| {
            warn!(id, error = %err, "template load failed");
            err
        })?;
        self.apply_payload(Some(id.to_string()), payload);
        info!(id, pages = self.pages.len(), "template loaded");
        Ok(())
    }

    /// Load a stored template into a new controller
    pub async fn load<A>(adapter: &A, id: &str, config: EditorConfig) -> Result<Self, EditorError>
    where
        A: PersistenceAdapter + ?Sized,
    {
        let mut controller = Self::with_pages(config, Vec::new());
        controller.open(adapter, id).await?;
        Ok(controller)
    }

    fn apply_payload(&mut self, id: Option<String>, payload: TemplatePayload) {
        let pages = deserialize_document(&payload.document, &payload.field_schema);
        self.pages = PageStore::new(pages);
        self.pages.load_active(&mut self.surface);
        self.reset_history();
        self.id = id;
        self.name = payload.name;
        self.category = payload.category;
    }
}

impl Default for TemplateController {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
