use proptest::prelude::*;
use std::ops::Range;
use stepmap::IntervalMap;

/// Values of consecutive keys, concatenated.
#[allow(dead_code)]
pub(super) fn value_slice(map: &IntervalMap<i32, char>, keys: Range<i32>) -> String {
    keys.map(|k| map[&k]).collect()
}

#[allow(dead_code)]
/// One `key -> value` line per key.
#[allow(dead_code)]
pub(super) fn data_slice(map: &IntervalMap<i32, char>, keys: Range<i32>) -> String {
    keys.map(|k| format!("{k} -> {}\n", map[&k])).collect()
}

#[allow(dead_code)]
pub(super) type Assigns = Vec<(i32, i32, u8)>;

/// Keys are drawn from here; `WINDOW` extends past it on both sides.
#[allow(dead_code)]
pub(super) const KEYS: Range<i32> = -4..36;
#[allow(dead_code)]
pub(super) const WINDOW: Range<i32> = -8..44;

/// Random assignments over a small key range and a four-letter alphabet,
/// inverted and empty ranges included.
#[allow(dead_code)]
pub(super) fn assigns() -> impl Strategy<Value = Assigns> {
    prop::collection::vec((KEYS, KEYS, 0u8..4), 0..64)
}

/// Reference model storing one value per key of `WINDOW`.
#[allow(dead_code)]
pub(super) struct Oracle {
    values: Vec<u8>,
}

#[allow(dead_code)]
impl Oracle {
    pub(super) fn new(base: u8) -> Self {
        Oracle {
            values: vec![base; WINDOW.len()],
        }
    }

    pub(super) fn assign(&mut self, begin: i32, end: i32, value: u8) {
        for k in begin.max(WINDOW.start)..end.min(WINDOW.end) {
            self.values[(k - WINDOW.start) as usize] = value;
        }
    }

    pub(super) fn get(&self, key: i32) -> u8 {
        self.values[(key - WINDOW.start) as usize]
    }
}

#[allow(dead_code)]
pub(super) fn build(node_capacity: usize, assigns: &[(i32, i32, u8)]) -> IntervalMap<i32, u8> {
    let mut map = IntervalMap::with_node_capacity(0, node_capacity);
    for &(b, e, v) in assigns {
        map.assign(b, e, v);
    }
    map
}

/// Every lookup in `WINDOW`.
#[allow(dead_code)]
pub(super) fn snapshot(map: &IntervalMap<i32, u8>) -> Vec<u8> {
    WINDOW.map(|k| *map.lookup(&k)).collect()
}
