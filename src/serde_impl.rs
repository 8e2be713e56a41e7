use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::IntervalMap;

struct Breakpoints<'a, K, V>(&'a IntervalMap<K, V>);

impl<K: Serialize, V: Serialize> Serialize for Breakpoints<'_, K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Serializes as `{ "base": .., "breakpoints": [[k, v], ..] }`.
impl<K: Serialize, V: Serialize> Serialize for IntervalMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("IntervalMap", 2)?;
        state.serialize_field("base", self.base())?;
        state.serialize_field("breakpoints", &Breakpoints(self))?;
        state.end()
    }
}
