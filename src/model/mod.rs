//! # Breakpoint Model
//!
//! Plain data that crosses every boundary: query ↔ planner ↔ execution ↔ user.
//!
//! Design rule: no environment types, no listeners here.
//! This module is pure data: no I/O, no state.

pub mod direction;
pub mod map;
pub mod value;

pub use direction::Direction;
pub use map::BreakpointMap;
pub use value::{BreakpointValue, EXCLUSIVE_EPSILON_PX};
