//! 客户端答题状态
//!
//! 元素标识 → 当前答案（任意 JSON 值）。整个映射是一次提交的最小单位，不做增量提交。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 客户端答题状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientState {
    elements: BTreeMap<String, JsonValue>,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新某个元素的答案，返回旧值
    pub fn set(&mut self, element_id: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.elements.insert(element_id.into(), value)
    }

    pub fn get(&self, element_id: &str) -> Option<&JsonValue> {
        self.elements.get(element_id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.elements.iter()
    }
}

impl FromIterator<(String, JsonValue)> for ClientState {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_as_plain_object_with_sorted_keys() {
        let mut state = ClientState::new();
        state.set("q2", json!("b"));
        state.set("q1", json!({"choice": 3}));

        let encoded = serde_json::to_string(&state).unwrap();
        assert_eq!(encoded, r#"{"q1":{"choice":3},"q2":"b"}"#);
    }

    #[test]
    fn set_replaces_previous_answer() {
        let mut state = ClientState::new();
        assert_eq!(state.set("q1", json!(1)), None);
        assert_eq!(state.set("q1", json!(2)), Some(json!(1)));
        assert_eq!(state.get("q1"), Some(&json!(2)));
        assert_eq!(state.len(), 1);
    }
}
