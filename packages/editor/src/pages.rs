//! # Page Store
//!
//! Ordered page contents plus the active index. The live surface holds the
//! working copy of the active page; every switch flushes it back first so
//! navigation never loses edits.

use crate::errors::EditorError;
use crate::surface::LiveSurface;
use clause_markup::Content;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct PageStore {
    pages: Vec<Content>,
    active: usize,
}

impl PageStore {
    /// Store over `pages`; an empty list becomes one blank page
    pub fn new(pages: Vec<Content>) -> Self {
        let pages = if pages.is_empty() {
            vec![Content::blank()]
        } else {
            pages
        };
        Self { pages, active: 0 }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn pages(&self) -> &[Content] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Content> {
        self.pages.get(index)
    }

    /// Copy the live content into the active page
    pub fn flush_active(&mut self, surface: &LiveSurface) {
        self.pages[self.active] = surface.content().clone();
    }

    /// Write the active page into the surface
    pub fn load_active(&self, surface: &mut LiveSurface) {
        surface.set_content(self.pages[self.active].clone());
    }

    /// Append a blank page and make it active
    pub fn add_page(&mut self, surface: &mut LiveSurface) -> usize {
        self.flush_active(surface);
        self.pages.push(Content::blank());
        self.active = self.pages.len() - 1;
        self.load_active(surface);
        debug!(page = self.active, count = self.pages.len(), "page added");
        self.active
    }

    /// Remove the active page; the following page takes its place, or the new last page when the last one went
    pub fn delete_page(&mut self, surface: &mut LiveSurface) -> Result<usize, EditorError> {
        if self.pages.len() <= 1 {
            return Err(EditorError::LastPage);
        }
        self.pages.remove(self.active);
        self.active = self.active.min(self.pages.len() - 1);
        self.load_active(surface);
        debug!(page = self.active, count = self.pages.len(), "page deleted");
        Ok(self.active)
    }

    pub fn go_to(&mut self, index: usize, surface: &mut LiveSurface) -> Result<(), EditorError> {
        if index >= self.pages.len() {
            return Err(EditorError::PageOutOfRange {
                index,
                len: self.pages.len(),
            });
        }
        self.flush_active(surface);
        self.active = index;
        self.load_active(surface);
        debug!(page = index, "page switched");
        Ok(())
    }

    /// Move to the following page; `false` on the last page
    pub fn next(&mut self, surface: &mut LiveSurface) -> bool {
        if self.active + 1 >= self.pages.len() {
            return false;
        }
        self.go_to(self.active + 1, surface).is_ok()
    }

    /// Move to the preceding page; `false` on the first page
    pub fn prev(&mut self, surface: &mut LiveSurface) -> bool {
        if self.active == 0 {
            return false;
        }
        self.go_to(self.active - 1, surface).is_ok()
    }
}

impl Default for PageStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
