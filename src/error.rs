use thiserror::Error;

/// A broken representation invariant, as reported by
/// [`IntervalMap::check_invariants`](crate::IntervalMap::check_invariants).
///
/// Indices count breakpoints (or sublists) from zero in key order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("breakpoint {index} is not keyed strictly after its predecessor")]
    Unordered { index: usize },

    #[error("first breakpoint holds the base value")]
    LeadingRedundant,

    #[error("breakpoint {index} holds the same value as its predecessor")]
    AdjacentRedundant { index: usize },

    #[error("sublist {sublist} holds {len} breakpoints, over the node capacity of {capacity}")]
    OverfullSublist {
        sublist: usize,
        len: usize,
        capacity: usize,
    },

    #[error("sublist {sublist} is empty but is not the only sublist")]
    EmptySublist { sublist: usize },

    #[error("size index counts {indexed} breakpoints in sublist {sublist}, which holds {actual}")]
    SizeMismatch {
        sublist: usize,
        indexed: usize,
        actual: usize,
    },
}
