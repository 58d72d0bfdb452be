//! # media-breakpoints: Named Viewport Breakpoints as Live Media Queries
//!
//! Resolve named width thresholds and directional queries into CSS media
//! conditions, evaluate them against an injected environment, and keep the
//! answer live as the viewport changes.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `Environment` is the contract between the engine and the viewport
//! 2. **Clean DTOs**: `BreakpointMap`, `Query`, `MediaQuery` cross all boundaries
//! 3. **Conditions are data**: media conditions render to strings and parse back
//! 4. **Environment-agnostic planner**: planned queries don't know who evaluates them
//!
//! ## Quick Start
//!
//! ```rust
//! use media_breakpoints::{Breakpoints, MemoryEnvironment, Query};
//!
//! # fn example() -> media_breakpoints::Result<()> {
//! let breakpoints = Breakpoints::default();
//! let env = MemoryEnvironment::new(800.0);
//!
//! assert_eq!(
//!     breakpoints.condition(&Query::only("md"))?,
//!     "(min-width: 768px) and (max-width: 991.8px)",
//! );
//! assert!(breakpoints.matches(&Query::only("md"), &env)?);
//!
//! let query = Query::from_json(r#"{"md": "down", "sm": "up"}"#)?;
//! assert!(!breakpoints.matches(&query, &MemoryEnvironment::new(1024.0))?);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Environments
//!
//! | Environment | Module | Description |
//! |-------------|--------|-------------|
//! | `MemoryEnvironment` | `environment::memory` | In-memory viewport for testing/embedding |

use std::sync::{Arc, LazyLock};

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod media;
pub mod query;
pub mod planner;
pub mod execution;
pub mod environment;
pub mod binding;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{BreakpointMap, BreakpointValue, Direction, EXCLUSIVE_EPSILON_PX};
pub use media::{Length, MediaCondition, MediaQuery, Viewport, WidthFeature};
pub use query::{Directive, Query};

// ============================================================================
// Re-exports: Planning & Execution
// ============================================================================

pub use planner::{Combine, QueryOptions};
pub use execution::{ConditionOutcome, Evaluation};

// ============================================================================
// Re-exports: Environment & Binding
// ============================================================================

pub use environment::{Environment, Listener, ListenerId, MemoryEnvironment};
pub use binding::Binding;

// ============================================================================
// Top-level Breakpoints handle
// ============================================================================

/// The primary entry point. A `Breakpoints` handle is bound to one map and
/// one set of options, and answers any number of queries against them.
///
/// Cloning is cheap: the map is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Breakpoints {
    map: Arc<BreakpointMap>,
    options: QueryOptions,
}

impl Breakpoints {
    pub fn new(map: BreakpointMap) -> Self {
        Self::with_options(map, QueryOptions::default())
    }

    pub fn with_options(map: BreakpointMap, options: QueryOptions) -> Self {
        for (lower, upper) in map.descending_pairs() {
            tracing::warn!(lower, upper, "breakpoints are not in ascending order");
        }
        Self { map: Arc::new(map), options }
    }

    pub fn map(&self) -> &BreakpointMap {
        &self.map
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Build the media query for `query`.
    pub fn media_query(&self, query: &Query) -> Result<MediaQuery> {
        // Phase 1: Normalize
        let pairs = query::normalize(query)?;

        // Phase 2: Plan
        let planned = planner::plan(&self.map, &pairs, &self.options)?;

        // Phase 3: Optimize
        if self.options.flatten {
            Ok(planner::optimize(planned))
        } else {
            Ok(planned)
        }
    }

    /// The media query list for `query`, as one string.
    pub fn condition(&self, query: &Query) -> Result<String> {
        Ok(self.media_query(query)?.to_string())
    }

    /// Evaluate `query` once against `env`.
    pub fn matches<E: Environment + ?Sized>(&self, query: &Query, env: &E) -> Result<bool> {
        let media = self.media_query(query)?;
        Ok(execution::execute(env, &media)?.matches)
    }

    /// Keep `query` live against `env`; `on_change` receives every flip.
    pub fn bind<E, F>(&self, env: Arc<E>, query: &Query, on_change: F) -> Result<Binding<E>>
    where
        E: Environment,
        F: Fn(bool) + Send + Sync + 'static,
    {
        Binding::bind(env, self, query, on_change)
    }

    /// Name of the breakpoint whose exact span contains the viewport.
    ///
    /// The first breakpoint in map order wins; `None` when the viewport is
    /// below every breakpoint.
    pub fn current<E: Environment + ?Sized>(&self, env: &E) -> Result<Option<&str>> {
        for name in self.map.names() {
            let condition = planner::build_condition(&self.map, name, Direction::Only, self.options.epsilon_px)?;
            if execution::execute(env, &MediaQuery::single(condition))?.matches {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }
}

/// The default grid preset with default options.
impl Default for Breakpoints {
    fn default() -> Self {
        Self::new(BreakpointMap::preset())
    }
}

static DEFAULT_BREAKPOINTS: LazyLock<Breakpoints> = LazyLock::new(Breakpoints::default);

/// Shared handle on the default preset, built on first use.
pub fn breakpoints() -> &'static Breakpoints {
    &DEFAULT_BREAKPOINTS
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid query: breakpoint {breakpoint:?} has unrecognized direction {directive}")]
    InvalidQuery { breakpoint: String, directive: String },

    #[error("Unknown breakpoint: {0}")]
    UnknownBreakpoint(String),

    #[error("Invalid breakpoint value: {0}")]
    InvalidBreakpointValue(String),

    #[error("Media condition syntax error at position {position}: {message}")]
    InvalidCondition { position: usize, message: String },

    #[error("Unsupported media feature: {0}")]
    UnsupportedFeature(String),

    #[error("Unsupported length: {0}")]
    UnsupportedLength(String),

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
