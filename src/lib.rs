//! # Canonical interval maps
//!
//! [`IntervalMap`] associates a value with every key of an ordered domain,
//! while storing only the points where the value changes. Assigning a value
//! to a half-open key range costs one logarithmic search plus work
//! proportional to the number of breakpoints it overwrites, and always leaves
//! the map in its unique minimal form.
//!
//! Breakpoints live in a two-level list: bounded sublists with a Fenwick tree
//! over their lengths. This lets `assign` keep a `(sublist, offset)` handle
//! from its single search and do every following insert and removal in place.

mod error;
mod interval_map;
#[cfg(feature = "serde")]
mod serde_impl;
mod sublists;

pub use error::InvariantError;
pub use interval_map::{IntervalMap, Run, Runs};
pub use sublists::{Iter, DEFAULT_NODE_CAPACITY};
