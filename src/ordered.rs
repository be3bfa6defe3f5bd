use std::{collections::HashMap, fmt, marker::PhantomData};

use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

/// A JSON object that remembers key order.
///
/// Keys that look like array indices (`"0"`, `"56"`, `"137"`) are walked first in
/// ascending numeric order, everything else keeps document order. The config files
/// and the bridge API are keyed this way, and which router wins depends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Replaces the value under `key` in place, or appends it. A repeated key keeps
    /// its first position and its last value. Linear in the map size; bulk loads go
    /// through [`collect_map`] instead.
    pub fn insert(&mut self, key: String, value: V) {
        self.put(key, value);
        self.settle();
    }

    fn put(&mut self, key: String, value: V) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    fn settle(&mut self) {
        self.0.sort_by_key(|(k, _)| match index_key(k) {
            Some(n) => (0, n),
            None => (1, 0),
        });
    }
}

impl<V: Clone> OrderedMap<V> {
    /// Returns a copy with `key` holding `value`.
    pub fn replaced(&self, key: &str, value: V) -> Self {
        let mut next = self.clone();
        next.insert(key.to_owned(), value);
        next
    }
}

fn index_key(key: &str) -> Option<u32> {
    let canonical = key == "0"
        || (!key.is_empty() && !key.starts_with('0') && key.bytes().all(|b| b.is_ascii_digit()));
    if !canonical {
        return None;
    }
    key.parse::<u32>().ok().filter(|n| *n != u32::MAX)
}

/// Drains a serde map into an [`OrderedMap`]. Shared with types that accept either
/// an array or an object.
pub(crate) fn collect_map<'de, A, V>(mut access: A) -> Result<OrderedMap<V>, A::Error>
where
    A: MapAccess<'de>,
    V: Deserialize<'de>,
{
    let mut entries: Vec<(String, V)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(entries.capacity());
    while let Some((key, value)) = access.next_entry::<String, V>()? {
        match slots.get(&key) {
            Some(&slot) => entries[slot].1 = value,
            None => {
                slots.insert(key.clone(), entries.len());
                entries.push((key, value));
            }
        }
    }
    let mut map = OrderedMap(entries);
    map.settle();
    Ok(map)
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    // `null` reads as an empty object
    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedMap::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<Self::Value, A::Error> {
        collect_map(access)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(OrderedMapVisitor(PhantomData))
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<V>(map: &OrderedMap<V>) -> Vec<&str> {
        map.iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn index_keys_come_first_in_numeric_order() {
        let map: OrderedMap<u8> =
            serde_json::from_str(r#"{"b": 1, "250": 2, "a": 3, "56": 4, "007": 5, "0": 6}"#)
                .unwrap();
        assert_eq!(keys(&map), ["0", "56", "250", "b", "a", "007"]);
    }

    #[test]
    fn repeated_key_keeps_first_slot_and_last_value() {
        let map: OrderedMap<u8> = serde_json::from_str(r#"{"x": 1, "y": 2, "x": 3}"#).unwrap();
        assert_eq!(keys(&map), ["x", "y"]);
        assert_eq!(map.get("x"), Some(&3));
    }

    #[test]
    fn large_object_with_repeats() {
        let body = (0..4000)
            .map(|i| format!(r#""k{}": {i}"#, i % 2000))
            .collect::<Vec<_>>()
            .join(",");
        let map: OrderedMap<u32> = serde_json::from_str(&format!("{{{body}}}")).unwrap();
        assert_eq!(map.len(), 2000);
        assert_eq!(map.iter().next(), Some(("k0", &2000)));
        assert_eq!(map.get("k1999"), Some(&3999));
    }

    #[test]
    fn null_is_empty() {
        let map: OrderedMap<u8> = serde_json::from_str("null").unwrap();
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn replaced_leaves_original_alone() {
        let map: OrderedMap<u8> = serde_json::from_str(r#"{"ChainA": 1, "ChainB": 2}"#).unwrap();
        let next = map.replaced("ChainA", 9);
        assert_eq!(map.get("ChainA"), Some(&1));
        assert_eq!(next.get("ChainA"), Some(&9));
        assert_eq!(keys(&next), ["ChainA", "ChainB"]);
    }

    #[test]
    fn serializes_in_walk_order() {
        let map: OrderedMap<u8> = serde_json::from_str(r#"{"z": 1, "10": 2, "2": 3}"#).unwrap();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"2":3,"10":2,"z":1}"#);
    }
}
