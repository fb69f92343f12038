//! Forgiving field access over already-parsed JSON objects
//!
//! Keys are folded (lowercased, separators stripped) so `flipAt`, `flip_at`
//! and `FLIP-AT` all resolve to the same field. Numbers that are missing or
//! not finite read as `None`.

use crate::joint::fold_key;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

pub(crate) struct Fields<'a> {
    map: FxHashMap<String, (&'a str, &'a Value)>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(object: &'a Map<String, Value>) -> Self {
        let map = object
            .iter()
            .map(|(k, v)| (fold_key(k), (k.as_str(), v)))
            .collect();
        Self { map }
    }

    /// First value present under any of `names` (already folded)
    pub(crate) fn get(&self, names: &[&str]) -> Option<&'a Value> {
        names.iter().find_map(|n| self.map.get(*n).map(|(_, v)| *v))
    }

    pub(crate) fn number(&self, names: &[&str]) -> Option<f32> {
        self.get(names).and_then(number)
    }

    pub(crate) fn flag(&self, names: &[&str]) -> Option<bool> {
        self.get(names).and_then(flag)
    }

    pub(crate) fn string(&self, names: &[&str]) -> Option<&'a str> {
        self.get(names).and_then(Value::as_str)
    }

    /// Iterate (original key, folded key, value)
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&'a str, &str, &'a Value)> + '_ {
        self.map.iter().map(|(folded, (raw, v))| (*raw, folded.as_str(), *v))
    }
}

/// Finite number, also accepting numeric strings
pub(crate) fn number(value: &Value) -> Option<f32> {
    let n = match value {
        Value::Number(n) => n.as_f64()? as f32,
        Value::String(s) => s.trim().parse::<f32>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

pub(crate) fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        _ => None,
    }
}

/// Percent map keyed by string id, dropping non-numeric entries
pub(crate) fn percent_map(value: &Value) -> FxHashMap<String, f32> {
    let Some(object) = value.as_object() else {
        return FxHashMap::default();
    };
    object
        .iter()
        .filter_map(|(k, v)| number(v).map(|p| (k.clone(), p.clamp(0.0, 1.0))))
        .collect()
}
