//! 测验上下文
//!
//! 封装"我正在作答哪场考试的哪个测验"这一信息

use std::fmt::Display;

use crate::config::Config;

/// 测验上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamCtx {
    /// 考试ID
    pub exam_id: String,

    /// 测验ID
    pub assessment_id: String,
}

impl ExamCtx {
    pub fn new(exam_id: impl Into<String>, assessment_id: impl Into<String>) -> Self {
        Self {
            exam_id: exam_id.into(),
            assessment_id: assessment_id.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.exam_id.clone(), config.assessment_id.clone())
    }
}

impl Display for ExamCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[考试 ID#{} 测验 ID#{}]", self.exam_id, self.assessment_id)
    }
}
