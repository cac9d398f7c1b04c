//! 编排层（Orchestration Layer）
//!
//! 本层负责应用生命周期，是整个系统的入口。
//!
//! ```text
//! orchestrator::App (答案文件 → 会话)
//!     ↓
//! workflow::AssessmentSession (页面事件 → 服务器调用 → 回调)
//!     ↓
//! services (能力层：提交序列化 / 回调分发)
//!     ↓
//! infrastructure (基础设施：HTTP 客户端 / Cookie)
//! ```

pub mod app;

pub use app::App;
