//! Process-wide installed flag.
//!
//! The flag starts false, flips to true exactly once when installation
//! finishes, and has no reset path for the lifetime of the process. Request
//! gating outside this crate reads it to decide whether install-mode
//! endpoints remain the effective entry point.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Cloneable handle to the installed flag.
///
/// All clones observe the same underlying value; `SeqCst` ordering gives
/// concurrent readers a consistent view once the flag is set (a visibility
/// guarantee, not a lock).
#[derive(Debug, Clone, Default)]
pub struct InstalledFlag {
    inner: Arc<AtomicBool>,
}

impl InstalledFlag {
    /// Creates a flag in the uninstalled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether installation has finished.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    /// Marks installation as finished. Transitions false -> true once;
    /// further calls are no-ops.
    pub fn mark_installed(&self) {
        if !self.inner.swap(true, Ordering::SeqCst) {
            info!("installation complete, leaving install mode");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninstalled() {
        let flag = InstalledFlag::new();
        assert!(!flag.is_installed());
    }

    #[test]
    fn mark_installed_is_one_way_and_idempotent() {
        let flag = InstalledFlag::new();
        flag.mark_installed();
        assert!(flag.is_installed());
        flag.mark_installed();
        assert!(flag.is_installed());
    }

    #[test]
    fn clones_observe_the_same_flag() {
        let flag = InstalledFlag::new();
        let reader = flag.clone();
        assert!(!reader.is_installed());
        flag.mark_installed();
        assert!(reader.is_installed());
    }
}
