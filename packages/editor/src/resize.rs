//! # Resize Controllers
//!
//! Pointer-drag state machines for table columns and images. Each is either
//! idle or resizing; global move/up listeners exist only while resizing.
//!
//! Listener lifetime is tied to a [`DragCapture`] owned by the resizing
//! state, so releasing the pointer, cancelling, or dropping the controller
//! all detach them.

use clause_markup::NodePath;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Distance from a cell's trailing border that starts a column drag
pub const COLUMN_EDGE_THRESHOLD: f64 = 5.0;

/// Narrowest a column can be dragged
pub const MIN_COLUMN_WIDTH: f64 = 20.0;

/// Narrowest an image can be dragged
pub const MIN_IMAGE_WIDTH: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    PointerMove,
    PointerUp,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    attached: Vec<(u64, ListenerKind)>,
}

/// The host's document-wide listener table
#[derive(Debug, Clone, Default)]
pub struct GlobalListeners {
    registry: Rc<RefCell<Registry>>,
}

impl GlobalListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, kind: ListenerKind) -> ListenerHandle {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.attached.push((id, kind));
        ListenerHandle {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Number of listeners currently attached
    pub fn attached(&self) -> usize {
        self.registry.borrow().attached.len()
    }

    pub fn is_attached(&self, kind: ListenerKind) -> bool {
        self.registry
            .borrow()
            .attached
            .iter()
            .any(|(_, attached)| *attached == kind)
    }
}

/// Detaches its listener when dropped
#[derive(Debug)]
pub struct ListenerHandle {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .attached
                .retain(|(id, _)| *id != self.id);
        }
    }
}

/// Move and up listeners held for the duration of one drag
#[derive(Debug)]
pub struct DragCapture {
    _pointer_move: ListenerHandle,
    _pointer_up: ListenerHandle,
}

impl DragCapture {
    pub fn capture(listeners: &GlobalListeners) -> Self {
        Self {
            _pointer_move: listeners.attach(ListenerKind::PointerMove),
            _pointer_up: listeners.attach(ListenerKind::PointerUp),
        }
    }
}

/// Measured geometry of a table cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBounds {
    /// x of the trailing border
    pub right: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnResize {
    pub cell: NodePath,
    pub width: f64,
}

#[derive(Debug)]
struct ColumnDrag {
    cell: NodePath,
    start_x: f64,
    start_width: f64,
    _capture: DragCapture,
}

#[derive(Debug)]
pub struct ColumnResizer {
    listeners: GlobalListeners,
    drag: Option<ColumnDrag>,
}

impl ColumnResizer {
    pub fn new(listeners: GlobalListeners) -> Self {
        Self {
            listeners,
            drag: None,
        }
    }

    pub fn is_resizing(&self) -> bool {
        self.drag.is_some()
    }

    /// Start a drag when the press lands on the cell's trailing border
    pub fn pointer_down(&mut self, cell: NodePath, bounds: CellBounds, x: f64) -> bool {
        if self.drag.is_some() || (bounds.right - x).abs() > COLUMN_EDGE_THRESHOLD {
            return false;
        }
        self.drag = Some(ColumnDrag {
            cell,
            start_x: x,
            start_width: bounds.width,
            _capture: DragCapture::capture(&self.listeners),
        });
        true
    }

    pub fn pointer_move(&self, x: f64) -> Option<ColumnResize> {
        let drag = self.drag.as_ref()?;
        let width = (drag.start_width + (x - drag.start_x)).max(MIN_COLUMN_WIDTH);
        Some(ColumnResize {
            cell: drag.cell.clone(),
            width,
        })
    }

    /// End the drag; returns the resized cell
    pub fn pointer_up(&mut self) -> Option<NodePath> {
        self.drag.take().map(|drag| drag.cell)
    }
}

/// Measured size of an image at grab time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageResize {
    pub image: NodePath,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug)]
struct ImageDrag {
    image: NodePath,
    start_x: f64,
    start: ImageSize,
    _capture: DragCapture,
}

impl ImageDrag {
    /// Height per unit of width; a zero-width start keeps the image square
    fn aspect(&self) -> f64 {
        if self.start.width > 0.0 {
            self.start.height / self.start.width
        } else {
            1.0
        }
    }
}

#[derive(Debug)]
pub struct ImageResizer {
    listeners: GlobalListeners,
    drag: Option<ImageDrag>,
}

impl ImageResizer {
    pub fn new(listeners: GlobalListeners) -> Self {
        Self {
            listeners,
            drag: None,
        }
    }

    pub fn is_resizing(&self) -> bool {
        self.drag.is_some()
    }

    /// Resize handle grabbed
    pub fn grab(&mut self, image: NodePath, size: ImageSize, x: f64) -> bool {
        if self.drag.is_some() {
            return false;
        }
        self.drag = Some(ImageDrag {
            image,
            start_x: x,
            start: size,
            _capture: DragCapture::capture(&self.listeners),
        });
        true
    }

    /// Width follows the pointer; height keeps the starting aspect ratio
    pub fn pointer_move(&self, x: f64) -> Option<ImageResize> {
        let drag = self.drag.as_ref()?;
        let width = (drag.start.width + (x - drag.start_x)).max(MIN_IMAGE_WIDTH);
        Some(ImageResize {
            image: drag.image.clone(),
            width,
            height: width * drag.aspect(),
        })
    }

    pub fn release(&mut self) -> Option<NodePath> {
        self.drag.take().map(|drag| drag.image)
    }
}
