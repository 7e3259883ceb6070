//! Filter mode: a one-way switch from active filtering to disabled.
//!
//! Shared by the engine and the gate through an `Arc`. Once disabled, every
//! thread sees every type permitted for the rest of the process lifetime.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Active,
    Disabled,
}

impl FilterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::Active => "active",
            FilterMode::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Default)]
pub struct FilterState {
    test_mode: bool,
    disabled: AtomicBool,
}

impl FilterState {
    pub fn new(test_mode: bool) -> Self {
        Self {
            test_mode,
            disabled: AtomicBool::new(false),
        }
    }

    /// Running under a recognized test configuration.
    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    pub fn mode(&self) -> FilterMode {
        if self.is_disabled() {
            FilterMode::Disabled
        } else {
            FilterMode::Active
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Flip to disabled. Returns true only for the call that flipped it.
    pub fn disable(&self, reason: &str) -> bool {
        let flipped = !self.disabled.swap(true, Ordering::AcqRel);
        if flipped {
            tracing::warn!(%reason, "disabling type filtering for the rest of this process");
        }
        flipped
    }
}
