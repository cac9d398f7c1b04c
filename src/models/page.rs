//! 页面模型
//!
//! 浏览器页面中与测验相关部分的内存表示：具名元素内容、学号输入框、
//! 当前焦点、日志显示区，以及提交忙碌指示。

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Local};

/// 学号输入框的元素标识
pub const REGISTRATION_FIELD: &str = "registrationNumber";

/// 提交忙碌指示
///
/// `Idle` 表示没有在途请求，也没有已安排的重试，`wait_idle` 以此为准。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusyIndicator {
    #[default]
    Idle,
    /// 正在提交
    Submitting,
    /// 提交失败
    ///
    /// 有待发修改时立即被 `Submitting` 取代；否则一直显示到延迟重试发出。
    Failed,
}

impl BusyIndicator {
    /// 显示给用户的文本，空闲时不显示
    pub fn message(&self) -> Option<&'static str> {
        match self {
            BusyIndicator::Idle => None,
            BusyIndicator::Submitting => Some("正在提交..."),
            BusyIndicator::Failed => Some("提交失败，稍后重试"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// 日志显示区的一条记录
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub at: DateTime<Local>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        };
        write!(
            f,
            "[{}] {} {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            tag,
            self.message
        )
    }
}

/// 页面模型
#[derive(Debug, Default)]
pub struct PageModel {
    elements: HashMap<String, String>,
    registration: String,
    focused: Option<String>,
    log: Vec<LogEntry>,
}

impl PageModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_content(&mut self, element: impl Into<String>, content: impl Into<String>) {
        self.elements.insert(element.into(), content.into());
    }

    pub fn content(&self, element: &str) -> Option<&str> {
        self.elements.get(element).map(String::as_str)
    }

    /// 学号输入框的原始值（未校验）
    pub fn registration(&self) -> &str {
        &self.registration
    }

    pub fn set_registration(&mut self, value: impl Into<String>) {
        self.registration = value.into();
    }

    pub fn focus(&mut self, element: impl Into<String>) {
        self.focused = Some(element.into());
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Info, message.into());
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Error, message.into());
    }

    pub fn log_entries(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn errors(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter().filter(|e| e.level == LogLevel::Error)
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        self.log.push(LogEntry {
            level,
            message,
            at: Local::now(),
        });
    }
}
