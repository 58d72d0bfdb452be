//! # Environment Trait
//!
//! This is THE contract between the breakpoint engine and whatever knows the
//! current viewport: a browser window binding, a windowing toolkit, a test.
//!
//! ## Implementations
//!
//! | Environment | Module | Description |
//! |-------------|--------|-------------|
//! | `MemoryEnvironment` | `memory` | In-memory viewport for testing/embedding |

pub mod memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Result;

pub use memory::{MemoryEnvironment, EVALUATION_HISTORY_LIMIT};

/// Callback fired when a registered condition may have changed its result.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Opaque listener registration handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The media evaluation contract.
///
/// Implementations must not invoke listeners from inside `add_listener` or
/// `remove_listener`, and must release their own locks before invoking a
/// listener: listeners call back into `evaluate` and may remove themselves.
pub trait Environment: Send + Sync + 'static {
    /// Evaluate one media condition string against the current viewport.
    /// Malformed or unsupported conditions are errors, never `false`.
    fn evaluate(&self, condition: &str) -> Result<bool>;

    /// Register `listener` to fire whenever the result of `condition` may
    /// have changed.
    fn add_listener(&self, condition: &str, listener: Listener) -> Result<ListenerId>;

    /// Release a registration. Returns false if `id` was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}
