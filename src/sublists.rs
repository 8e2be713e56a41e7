use ftree::FenwickTree;
use std::fmt;
use std::iter::FlatMap;
use tracing::debug;

use crate::error::InvariantError;

/// Number of breakpoints a sublist may hold before it is split in two.
pub const DEFAULT_NODE_CAPACITY: usize = 64;

/// A `(sublist, offset)` handle into [`Sublists`].
///
/// Handles returned from this module are normalized: they point at an entry,
/// except for the end handle, which is the last sublist paired with its length.
pub(crate) type Pos = (usize, usize);

/// Ordered `(key, value)` entries kept in bounded sublists, with a Fenwick
/// tree over the sublist lengths.
///
/// Either there is exactly one sublist and it is empty, or no sublist is.
pub(crate) struct Sublists<K, V> {
    sublists: Vec<Vec<(K, V)>>,
    fenwick: FenwickTree<usize>,
    node_capacity: usize,
}

/// What [`Sublists::drain_below`] removed and where it stopped.
pub(crate) struct Drained<V> {
    /// First entry left at or past the bound, or the end handle.
    pub pos: Pos,
    /// Value of the last entry removed.
    pub last: Option<V>,
    pub removed: usize,
}

pub struct Iter<'a, K: 'a, V: 'a>(
    FlatMap<
        std::slice::Iter<'a, Vec<(K, V)>>,
        std::slice::Iter<'a, (K, V)>,
        fn(&'a Vec<(K, V)>) -> std::slice::Iter<'a, (K, V)>,
    >,
);

impl<K, V> Sublists<K, V> {
    pub fn new(node_capacity: usize) -> Self {
        let mut this = Sublists {
            sublists: Vec::new(),
            fenwick: FenwickTree::new(),
            node_capacity,
        };
        this.clear();
        this
    }

    pub fn clear(&mut self) {
        self.sublists = vec![Vec::with_capacity(self.node_capacity)];
        self.fenwick = FenwickTree::new();
        self.fenwick.push(0);
    }

    pub fn len(&self) -> usize {
        self.fenwick.prefix_sum(self.sublists.len(), 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_capacity(&self) -> usize {
        self.node_capacity
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter(self.sublists.iter().flat_map(|sublist| sublist.iter()))
    }

    pub fn get(&self, (sublist, offset): Pos) -> Option<&(K, V)> {
        self.sublists.get(sublist)?.get(offset)
    }

    /// Handle of the entry just before `pos`, if any.
    pub fn prev(&self, (sublist, offset): Pos) -> Option<Pos> {
        if offset > 0 {
            Some((sublist, offset - 1))
        } else if sublist > 0 {
            Some((sublist - 1, self.sublists[sublist - 1].len() - 1))
        } else {
            None
        }
    }

    pub fn get_index(&self, index: usize) -> Option<&(K, V)> {
        if index >= self.len() {
            return None;
        }
        let mut low = 0;
        let mut high = self.sublists.len();
        while low < high {
            let mid = low + (high - low) / 2;
            if self.fenwick.prefix_sum(mid, 0) <= index {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        let sublist = low - 1;
        let offset = index - self.fenwick.prefix_sum(sublist, 0);
        self.sublists[sublist].get(offset)
    }

    /// Inserts an entry so that it ends up at `pos`, shifting the entry there
    /// (if any) one step right. Returns the handle of the new entry.
    ///
    /// The caller keeps the keys ordered; nothing is compared here.
    pub fn insert_at(&mut self, (sublist_idx, offset): Pos, key: K, value: V) -> Pos {
        let sublist = &mut self.sublists[sublist_idx];
        sublist.insert(offset, (key, value));
        self.fenwick.add_at(sublist_idx, 1);
        if sublist.len() > self.node_capacity {
            let mid = sublist.len() / 2;
            self.split_sublist(sublist_idx);
            if offset >= mid {
                return (sublist_idx + 1, offset - mid);
            }
        }
        (sublist_idx, offset)
    }

    /// Removes the entry at `pos` and returns it with the handle of its
    /// successor.
    pub fn remove_at(&mut self, (sublist_idx, offset): Pos) -> ((K, V), Pos) {
        let entry = self.sublists[sublist_idx].remove(offset);
        self.fenwick.sub_at(sublist_idx, 1);
        if self.sublists[sublist_idx].is_empty() && self.sublists.len() > 1 {
            self.sublists.remove(sublist_idx);
            self.rebuild_fenwick();
            let next = if sublist_idx < self.sublists.len() {
                (sublist_idx, 0)
            } else {
                self.end()
            };
            return (entry, next);
        }
        (entry, self.normalize((sublist_idx, offset)))
    }

    /// Checks the storage invariants: bounded sublists, no stray empty
    /// sublist, and Fenwick entries matching the sublist lengths.
    pub fn check_structure(&self) -> Result<(), InvariantError> {
        for (i, sublist) in self.sublists.iter().enumerate() {
            if sublist.len() > self.node_capacity {
                return Err(InvariantError::OverfullSublist {
                    sublist: i,
                    len: sublist.len(),
                    capacity: self.node_capacity,
                });
            }
            if sublist.is_empty() && self.sublists.len() > 1 {
                return Err(InvariantError::EmptySublist { sublist: i });
            }
            let indexed = self.fenwick.prefix_sum(i + 1, 0) - self.fenwick.prefix_sum(i, 0);
            if indexed != sublist.len() {
                return Err(InvariantError::SizeMismatch {
                    sublist: i,
                    indexed,
                    actual: sublist.len(),
                });
            }
        }
        Ok(())
    }

    fn end(&self) -> Pos {
        let last = self.sublists.len() - 1;
        (last, self.sublists[last].len())
    }

    fn normalize(&self, (sublist, offset): Pos) -> Pos {
        if offset == self.sublists[sublist].len() && sublist + 1 < self.sublists.len() {
            (sublist + 1, 0)
        } else {
            (sublist, offset)
        }
    }

    fn split_sublist(&mut self, idx: usize) {
        let sublist = &mut self.sublists[idx];
        let mid = sublist.len() / 2;
        let new_sublist = sublist.split_off(mid);
        self.sublists.insert(idx + 1, new_sublist);
        self.rebuild_fenwick();
        debug!(sublist = idx, sublists = self.sublists.len(), "split sublist");
    }

    fn rebuild_fenwick(&mut self) {
        let sizes = self.sublists.iter().map(|s| s.len());
        self.fenwick = FenwickTree::from_iter(sizes);
    }
}

impl<K: Ord, V> Sublists<K, V> {
    /// Handle of the first entry whose key is not less than `key`.
    pub fn lower_bound(&self, key: &K) -> Pos {
        let idx = self
            .sublists
            .partition_point(|sublist| sublist.first().is_some_and(|(k, _)| k < key));
        let consider = idx.saturating_sub(1);
        let offset = self.sublists[consider].partition_point(|(k, _)| k < key);
        self.normalize((consider, offset))
    }

    /// Handle of the first entry whose key is greater than `key`.
    pub fn upper_bound(&self, key: &K) -> Pos {
        let idx = self
            .sublists
            .partition_point(|sublist| sublist.first().is_some_and(|(k, _)| !(key < k)));
        let consider = idx.saturating_sub(1);
        let offset = self.sublists[consider].partition_point(|(k, _)| !(key < k));
        self.normalize((consider, offset))
    }

    /// Removes entries from `from` onward while their key is less than
    /// `bound`. Each removed entry costs one key comparison, plus one for the
    /// entry the scan stops on.
    pub fn drain_below(&mut self, from: Pos, bound: &K) -> Drained<V> {
        let (mut sublist_idx, mut offset) = from;
        let mut last = None;
        let mut removed = 0;
        let mut restructured = false;

        while sublist_idx < self.sublists.len() {
            let sublist = &mut self.sublists[sublist_idx];
            let n = sublist[offset..]
                .iter()
                .take_while(|(k, _)| k < bound)
                .count();
            if n > 0 {
                if let Some((_, v)) = sublist.drain(offset..offset + n).next_back() {
                    last = Some(v);
                }
                removed += n;
                // indices shift once a sublist is dropped; rebuilt below
                if !restructured {
                    self.fenwick.sub_at(sublist_idx, n);
                }
            }
            if offset < sublist.len() {
                break;
            }
            if sublist.is_empty() && self.sublists.len() > 1 {
                self.sublists.remove(sublist_idx);
                restructured = true;
            } else {
                sublist_idx += 1;
            }
            offset = 0;
        }

        if restructured {
            self.rebuild_fenwick();
        }
        let pos = if sublist_idx < self.sublists.len() {
            (sublist_idx, offset)
        } else {
            self.end()
        };
        Drained { pos, last, removed }
    }
}

impl<K: Clone, V: Clone> Clone for Sublists<K, V> {
    fn clone(&self) -> Self {
        Sublists {
            sublists: self.sublists.clone(),
            fenwick: self.fenwick.clone(),
            node_capacity: self.node_capacity,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.sublists.clone_from(&source.sublists);
        self.fenwick.clone_from(&source.fenwick);
        self.node_capacity = source.node_capacity;
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Sublists<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(k, v)| (k, v))
    }
}
