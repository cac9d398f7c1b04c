//! 回调注册表 - 业务能力层
//!
//! 回调名称 → 处理函数。会话初始化时显式注册，分发时按名称查找，
//! 找不到时返回明确的错误而不是中断整批回调。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, error};

use crate::error::DispatchError;
use crate::models::Action;

/// 回调处理函数
pub type ActionHandler = Arc<dyn Fn(&JsonValue) -> Result<(), DispatchError> + Send + Sync>;

/// 回调注册表
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, ActionHandler>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册回调，同名回调会被替换
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&JsonValue) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> Result<&ActionHandler, DispatchError> {
        self.handlers
            .get(name)
            .ok_or_else(|| DispatchError::UnknownCallback {
                callback: name.to_string(),
            })
    }

    /// 按顺序执行一批回调
    ///
    /// 未注册的回调和执行失败的回调都会记录错误并跳过，不影响同批的其他回调。
    pub fn dispatch(&self, actions: &[Action]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for action in actions {
            debug!("执行回调 {}: {}", action.callback, action.data);
            let result = self
                .lookup(&action.callback)
                .and_then(|handler| handler(&action.data));

            match result {
                Ok(()) => report.invoked.push(action.callback.clone()),
                Err(e) => {
                    error!("回调失败: {}", e);
                    report.errors.push(e);
                }
            }
        }

        report
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("ActionRegistry")
            .field("handlers", &names)
            .finish()
    }
}

/// 一批回调的执行结果
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// 成功执行的回调名称（按执行顺序）
    pub invoked: Vec<String>,
    /// 失败或未注册的回调
    pub errors: Vec<DispatchError>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// 将回调参数解析为具体类型
pub fn parse_payload<T: DeserializeOwned>(
    callback: &str,
    data: &JsonValue,
) -> Result<T, DispatchError> {
    T::deserialize(data).map_err(|source| DispatchError::InvalidPayload {
        callback: callback.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn recording_registry(seen: Arc<Mutex<Vec<String>>>) -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        for name in ["first", "second"] {
            let seen = seen.clone();
            registry.register(name, move |data| {
                seen.lock().unwrap().push(format!("{}:{}", name, data));
                Ok(())
            });
        }
        registry.register("broken", |_| {
            Err(DispatchError::HandlerFailed {
                callback: "broken".to_string(),
                message: "boom".to_string(),
            })
        });
        registry
    }

    #[test]
    fn unknown_callback_is_reported_and_siblings_still_run() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = recording_registry(seen.clone());

        let report = registry.dispatch(&[
            Action::new("first", json!(1)),
            Action::new("doesNotExist", json!(null)),
            Action::new("second", json!(2)),
        ]);

        assert_eq!(*seen.lock().unwrap(), vec!["first:1", "second:2"]);
        assert_eq!(report.invoked, vec!["first", "second"]);
        assert!(matches!(
            report.errors.as_slice(),
            [DispatchError::UnknownCallback { callback }] if callback == "doesNotExist"
        ));
    }

    #[test]
    fn handler_failure_does_not_stop_dispatch() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = recording_registry(seen.clone());

        let report = registry.dispatch(&[
            Action::new("broken", json!({})),
            Action::new("second", json!("x")),
        ]);

        assert!(!report.is_clean());
        assert_eq!(report.invoked, vec!["second"]);
    }

    #[test]
    fn lookup_returns_explicit_not_found() {
        let registry = ActionRegistry::new();
        assert!(!registry.contains("showMessage"));
        assert!(registry.lookup("showMessage").is_err());
    }

    #[test]
    fn parse_payload_reports_callback_name() {
        #[derive(Debug, serde::Deserialize)]
        struct Payload {
            #[allow(dead_code)]
            element: String,
        }

        let err = parse_payload::<Payload>("setElementContent", &json!({"x": 1})).unwrap_err();
        assert!(err.to_string().contains("setElementContent"));
    }
}
