//! In-memory environment.
//!
//! This is the reference implementation of `Environment`.
//! It keeps a `Viewport` and the registered listeners behind RwLocks.
//!
//! ## Behaviour
//!
//! - **Change-only notification**: like a browser `MediaQueryList`, a listener
//!   fires only when its condition flips between matching and not matching.
//! - **Registration order**: listeners fire in the order they were added.
//! - **No locks held while notifying**: listeners may evaluate, add or remove.
//!
//! Use this environment for:
//! - Testing queries, flattening and bindings without a window
//! - Embedding in hosts that report their width explicitly (headless renderers,
//!   terminal UIs, layout engines)

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Environment, Listener, ListenerId};
use crate::media::{self, MediaQuery, Viewport};
use crate::Result;

// ============================================================================
// MemoryEnvironment
// ============================================================================

/// In-memory viewport with media listeners.
#[derive(Clone)]
pub struct MemoryEnvironment {
    inner: Arc<MemoryInner>,
}

/// How many evaluated condition strings `MemoryEnvironment` remembers.
pub const EVALUATION_HISTORY_LIMIT: usize = 64;

struct MemoryInner {
    viewport: RwLock<Viewport>,
    listeners: RwLock<BTreeMap<ListenerId, Registration>>,
    /// the last `EVALUATION_HISTORY_LIMIT` strings passed to `evaluate`
    evaluated: RwLock<VecDeque<String>>,
    next_listener_id: AtomicU64,
}

struct Registration {
    condition: String,
    query: MediaQuery,
    listener: Listener,
    /// result at registration or at the last notification
    matches: bool,
}

impl MemoryEnvironment {
    /// A viewport `width` CSS pixels wide with a 16px root font size.
    pub fn new(width: f64) -> Self {
        Self::with_viewport(Viewport::new(width))
    }

    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                viewport: RwLock::new(viewport),
                listeners: RwLock::new(BTreeMap::new()),
                evaluated: RwLock::new(VecDeque::with_capacity(EVALUATION_HISTORY_LIMIT)),
                next_listener_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn viewport(&self) -> Viewport {
        *self.inner.viewport.read()
    }

    pub fn width(&self) -> f64 {
        self.inner.viewport.read().width
    }

    /// Change the viewport width and notify listeners whose result flipped.
    pub fn resize(&self, width: f64) {
        self.update(|viewport| viewport.width = width);
    }

    /// Change the root font size (affects `rem`/`em` lengths) and notify.
    pub fn set_root_font_size(&self, px: f64) {
        self.update(|viewport| viewport.root_font_size = px);
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// Registered condition strings in registration order (duplicates kept).
    pub fn listened_conditions(&self) -> Vec<String> {
        self.inner
            .listeners
            .read()
            .values()
            .map(|registration| registration.condition.clone())
            .collect()
    }

    /// The most recently evaluated condition strings, oldest first.
    ///
    /// Only the last `EVALUATION_HISTORY_LIMIT` are kept.
    pub fn evaluated(&self) -> Vec<String> {
        self.inner.evaluated.read().iter().cloned().collect()
    }

    pub fn clear_evaluated(&self) {
        self.inner.evaluated.write().clear();
    }

    fn record(&self, condition: &str) {
        let mut evaluated = self.inner.evaluated.write();
        if evaluated.len() == EVALUATION_HISTORY_LIMIT {
            evaluated.pop_front();
        }
        evaluated.push_back(condition.to_string());
    }

    fn update(&self, change: impl FnOnce(&mut Viewport)) {
        let (viewport, fired) = {
            let mut viewport = self.inner.viewport.write();
            change(&mut viewport);
            let viewport = *viewport;

            let mut listeners = self.inner.listeners.write();
            let fired: Vec<Listener> = listeners
                .values_mut()
                .filter_map(|registration| match viewport.matches(&registration.query) {
                    Ok(matches) if matches != registration.matches => {
                        registration.matches = matches;
                        Some(registration.listener.clone())
                    }
                    Ok(_) => None,
                    Err(err) => {
                        tracing::warn!(condition = %registration.condition, %err, "listener condition no longer evaluates");
                        None
                    }
                })
                .collect();
            (viewport, fired)
        };

        tracing::debug!(
            width = viewport.width,
            root_font_size = viewport.root_font_size,
            fired = fired.len(),
            "viewport changed"
        );
        for listener in fired {
            listener();
        }
    }
}

impl Default for MemoryEnvironment {
    fn default() -> Self {
        Self::with_viewport(Viewport::default())
    }
}

impl std::fmt::Debug for MemoryEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEnvironment")
            .field("viewport", &self.viewport())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// ============================================================================
// Environment impl
// ============================================================================

impl Environment for MemoryEnvironment {
    fn evaluate(&self, condition: &str) -> Result<bool> {
        self.record(condition);
        let query = media::parse(condition)?;
        let viewport = self.viewport();
        viewport.matches(&query)
    }

    fn add_listener(&self, condition: &str, listener: Listener) -> Result<ListenerId> {
        let query = media::parse(condition)?;

        // same lock order as `update`: a resize cannot slip between the
        // initial evaluation and the insert
        let viewport = self.inner.viewport.read();
        let matches = viewport.matches(&query)?;
        let id = ListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.write().insert(
            id,
            Registration {
                condition: condition.to_string(),
                query,
                listener,
                matches,
            },
        );
        drop(viewport);
        tracing::trace!(%id, condition, "listener added");
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = self.inner.listeners.write().remove(&id).is_some();
        if removed {
            tracing::trace!(%id, "listener removed");
        }
        removed
    }
}

// ============================================================================
// Tests
// ============================================================================
