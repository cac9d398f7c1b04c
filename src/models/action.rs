use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 服务器下发的回调指令
///
/// 每个响应都是一个 `Action` 数组，按服务器给出的顺序逐个执行一次。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// 回调名称
    pub callback: String,
    /// 回调参数（不透明）
    #[serde(default)]
    pub data: JsonValue,
}

impl Action {
    pub fn new(callback: impl Into<String>, data: JsonValue) -> Self {
        Self {
            callback: callback.into(),
            data,
        }
    }
}

/// 随机学生接口的响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomStudent {
    pub registration: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_without_data_defaults_to_null() {
        let actions: Vec<Action> =
            serde_json::from_str(r#"[{"callback":"showMessage"}]"#).unwrap();
        assert_eq!(actions, vec![Action::new("showMessage", JsonValue::Null)]);
    }

    #[test]
    fn action_keeps_payload_verbatim() {
        let action: Action = serde_json::from_value(json!({
            "callback": "setElementContent",
            "data": {"element": "q1", "content": "<b>ok</b>"}
        }))
        .unwrap();
        assert_eq!(action.data["element"], "q1");
    }
}
