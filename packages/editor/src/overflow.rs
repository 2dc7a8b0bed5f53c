//! Page capacity guard.
//!
//! The host measures the rendered height of the page after each keystroke;
//! the guard decides whether the next key may grow the content.

use tracing::warn;

/// Full page height in CSS px (A4, 297mm at 96 dpi)
pub const DEFAULT_PAGE_CAPACITY: f64 = 1122.52;

/// Overshoot tolerated before the page counts as full
pub const DEFAULT_TOLERANCE: f64 = 1.0;

/// How a key relates to page growth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Inserts content (characters, Enter, Tab)
    Growing,
    /// Navigation, deletion, clipboard and other shortcuts
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDecision {
    Allow,
    /// Key suppressed; the caller should offer a new page
    PageFull,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverflowGuard {
    capacity: f64,
    tolerance: f64,
}

impl OverflowGuard {
    pub fn new(capacity: f64, tolerance: f64) -> Self {
        Self {
            capacity,
            tolerance,
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn is_full(&self, measured_height: f64) -> bool {
        measured_height > self.capacity + self.tolerance
    }

    /// Evaluated fresh on every key, so the guard lifts once content shrinks
    pub fn check(&self, key: KeyClass, measured_height: f64) -> KeyDecision {
        if key == KeyClass::Growing && self.is_full(measured_height) {
            warn!(
                height = measured_height,
                capacity = self.capacity,
                "page full, input suppressed"
            );
            return KeyDecision::PageFull;
        }
        KeyDecision::Allow
    }
}

impl Default for OverflowGuard {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_CAPACITY, DEFAULT_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_tolerance_allowed() {
        let guard = OverflowGuard::new(100.0, 1.0);
        assert_eq!(guard.check(KeyClass::Growing, 100.0), KeyDecision::Allow);
        assert_eq!(guard.check(KeyClass::Growing, 101.0), KeyDecision::Allow);
        assert_eq!(guard.check(KeyClass::Growing, 101.5), KeyDecision::PageFull);
    }

    #[test]
    fn test_neutral_keys_always_pass() {
        let guard = OverflowGuard::default();
        assert_eq!(guard.check(KeyClass::Neutral, 5000.0), KeyDecision::Allow);
    }

    #[test]
    fn test_guard_lifts_when_content_shrinks() {
        let guard = OverflowGuard::default();
        assert_eq!(guard.check(KeyClass::Growing, 1200.0), KeyDecision::PageFull);
        assert_eq!(guard.check(KeyClass::Growing, 1100.0), KeyDecision::Allow);
    }
}
