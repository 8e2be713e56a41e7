use std::fmt;
use std::ops::Index;
use tracing::trace;

use crate::error::InvariantError;
use crate::sublists::{Drained, Iter, Pos, Sublists, DEFAULT_NODE_CAPACITY};

/// A total map from `K` to `V` stored as a base value plus breakpoints.
///
/// Each breakpoint `(k, v)` says that every key from `k` up to (excluding) the
/// next breakpoint's key maps to `v`. Keys below the first breakpoint map to
/// the base value. The representation is kept canonical: the first breakpoint
/// never holds the base value and no two neighbouring breakpoints hold equal
/// values, so two maps describing the same function store the same
/// breakpoints.
///
/// Only `<` is ever called on keys and only `==` on values.
///
/// ```
/// use stepmap::IntervalMap;
///
/// let mut map = IntervalMap::new('A');
/// map.assign(2, 5, 'B');
/// map.assign(5, 8, 'C');
/// map.assign(4, 6, 'D');
///
/// assert_eq!(map.to_string(), "[2, B][4, D][6, C][8, A]");
/// assert_eq!(map[&3], 'B');
/// assert_eq!(*map.lookup(&100), 'A');
/// ```
#[derive(Debug)]
pub struct IntervalMap<K, V> {
    base: V,
    breakpoints: Sublists<K, V>,
}

/// A maximal run of keys sharing one value, yielded by [`IntervalMap::runs`].
///
/// `start` is `None` for the run extending to the lowest key, `end` is `None`
/// for the run extending past the highest breakpoint. The run covers
/// `[start, end)`.
#[derive(Debug, PartialEq, Eq)]
pub struct Run<'a, K, V> {
    pub start: Option<&'a K>,
    pub end: Option<&'a K>,
    pub value: &'a V,
}

pub struct Runs<'a, K: 'a, V: 'a> {
    breakpoints: Iter<'a, K, V>,
    start: Option<&'a K>,
    value: &'a V,
    done: bool,
}

impl<K, V> IntervalMap<K, V> {
    /// Creates the constant map sending every key to `base`.
    pub fn new(base: V) -> Self {
        Self::with_node_capacity(base, DEFAULT_NODE_CAPACITY)
    }

    /// Like [`new`](Self::new), with a custom number of breakpoints per
    /// storage block.
    ///
    /// # Panics
    ///
    /// Panics if `node_capacity` is zero.
    pub fn with_node_capacity(base: V, node_capacity: usize) -> Self {
        assert!(node_capacity > 0, "node capacity must be positive");
        IntervalMap {
            base,
            breakpoints: Sublists::new(node_capacity),
        }
    }

    pub fn base(&self) -> &V {
        &self.base
    }

    pub fn node_capacity(&self) -> usize {
        self.breakpoints.node_capacity()
    }

    /// Number of breakpoints, which is one less than the number of runs.
    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    /// Whether the map is constant.
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Drops every breakpoint, leaving the constant base map.
    pub fn clear(&mut self) {
        self.breakpoints.clear();
    }

    /// Breakpoints in increasing key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.breakpoints.iter()
    }

    /// The `index`-th breakpoint in key order.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.breakpoints.get_index(index).map(|(k, v)| (k, v))
    }

    /// Owned copy of the breakpoints in increasing key order.
    pub fn dump(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Maximal runs in increasing key order; always `len() + 1` of them.
    pub fn runs(&self) -> Runs<'_, K, V> {
        Runs {
            breakpoints: self.iter(),
            start: None,
            value: &self.base,
            done: false,
        }
    }

    /// Value in force just before `pos`.
    fn left_of(&self, pos: Pos) -> &V {
        self.breakpoints
            .prev(pos)
            .and_then(|prev| self.breakpoints.get(prev))
            .map_or(&self.base, |(_, v)| v)
    }
}

impl<K: Ord, V> IntervalMap<K, V> {
    /// Value associated with `key`.
    pub fn lookup(&self, key: &K) -> &V {
        self.left_of(self.breakpoints.upper_bound(key))
    }
}

impl<K: Ord, V: PartialEq> IntervalMap<K, V> {
    /// Associates every key in `[begin, end)` with `value`, leaving all other
    /// keys untouched. Does nothing unless `begin < end`.
    ///
    /// The storage is searched once; breakpoints inside the range are removed
    /// and at most two are inserted next to the search position. Operations
    /// on keys and values beyond that search are proportional to the number
    /// of breakpoints overwritten. A storage block that splits or empties
    /// additionally costs O(N / node capacity) to reindex the blocks, without
    /// touching any key or value.
    pub fn assign(&mut self, begin: K, end: K, value: V)
    where
        V: Clone,
    {
        if !(begin < end) {
            return;
        }

        let start = self.breakpoints.lower_bound(&begin);
        let Drained {
            mut pos,
            last,
            mut removed,
        } = self.breakpoints.drain_below(start, &end);
        let mut inserted = 0;

        // Some(held == value) when a breakpoint already sits exactly at `end`.
        let closed = self
            .breakpoints
            .get(pos)
            .filter(|(key, _)| !(end < *key))
            .map(|(_, held)| *held == value);

        match closed {
            Some(true) => {
                (_, pos) = self.breakpoints.remove_at(pos);
                removed += 1;
            }
            Some(false) => {}
            None => {
                let closing = match last {
                    Some(v) => v,
                    None => self.left_of(pos).clone(),
                };
                if closing != value {
                    pos = self.breakpoints.insert_at(pos, end, closing);
                    inserted += 1;
                }
            }
        }

        if *self.left_of(pos) != value {
            self.breakpoints.insert_at(pos, begin, value);
            inserted += 1;
        }

        trace!(removed, inserted, breakpoints = self.len(), "assigned range");
    }

    /// Verifies key ordering, canonical form and the storage layout, reporting
    /// the first violation found.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.breakpoints.check_structure()?;

        let mut prev: Option<(&K, &V)> = None;
        for (index, (key, value)) in self.iter().enumerate() {
            match prev {
                None if *value == self.base => return Err(InvariantError::LeadingRedundant),
                Some((prev_key, _)) if !(prev_key < key) => {
                    return Err(InvariantError::Unordered { index });
                }
                Some((_, prev_value)) if prev_value == value => {
                    return Err(InvariantError::AdjacentRedundant { index });
                }
                _ => {}
            }
            prev = Some((key, value));
        }
        Ok(())
    }
}

impl<K: Clone, V: Clone> Clone for IntervalMap<K, V> {
    fn clone(&self) -> Self {
        IntervalMap {
            base: self.base.clone(),
            breakpoints: self.breakpoints.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.base.clone_from(&source.base);
        self.breakpoints.clone_from(&source.breakpoints);
    }
}

impl<K: Ord, V> Index<&K> for IntervalMap<K, V> {
    type Output = V;

    fn index(&self, key: &K) -> &V {
        self.lookup(key)
    }
}

impl<K, V: Default> Default for IntervalMap<K, V> {
    fn default() -> Self {
        IntervalMap::new(V::default())
    }
}

impl<K, V> From<V> for IntervalMap<K, V> {
    fn from(base: V) -> Self {
        IntervalMap::new(base)
    }
}

/// Renders the breakpoints as `[k, v]` pairs; the constant map renders empty.
impl<K: fmt::Display, V: fmt::Display> fmt::Display for IntervalMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in self.iter() {
            write!(f, "[{k}, {v}]")?;
        }
        Ok(())
    }
}

impl<'a, K, V> IntoIterator for &'a IntervalMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> Iterator for Runs<'a, K, V> {
    type Item = Run<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.breakpoints.next();
        let run = Run {
            start: self.start,
            end: next.map(|(k, _)| k),
            value: self.value,
        };
        match next {
            Some((k, v)) => {
                self.start = Some(k);
                self.value = v;
            }
            None => self.done = true,
        }
        Some(run)
    }
}
