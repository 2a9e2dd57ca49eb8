//! Key/value variables as the API represents them.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A single `{ "key": ..., "value": ... }` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

impl Variable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Convert a declarative map into the API's list form, ordered by key.
pub fn variables_from_map(map: &BTreeMap<String, String>) -> Vec<Variable> {
    map.iter().map(|(k, v)| Variable::new(k, v)).collect()
}

/// Convert the API's list form into a map. Later duplicates win.
pub fn variables_to_map(variables: &[Variable]) -> BTreeMap<String, String> {
    variables
        .iter()
        .map(|v| (v.key.clone(), v.value.clone()))
        .collect()
}

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_to_list_is_sorted() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), "2".to_string());
        map.insert("a".to_string(), "1".to_string());

        let list = variables_from_map(&map);
        assert_eq!(list, vec![Variable::new("a", "1"), Variable::new("b", "2")]);
        assert_eq!(variables_to_map(&list), map);
    }

    #[test]
    fn test_null_value_is_empty() {
        let var: Variable = serde_json::from_str(r#"{"key":"a","value":null}"#).unwrap();
        assert_eq!(var, Variable::new("a", ""));
    }
}
