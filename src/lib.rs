//! # Assessment Client
//!
//! 在线测验的客户端：把学生的答题状态提交给服务器，加载已存答案和参考答案，
//! 并执行服务器返回的回调指令。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP 连接池、Cookie 文件），只暴露能力
//! - `AssessmentApi` - 考试服务器接口，`AssessmentClient` 是它的 reqwest 实现
//!
//! ### ② 业务能力层（Services）
//! - `SubmitMachine` - 提交状态机：最多一个请求在途，期间的修改合并为一次后续提交
//! - `SubmissionSerializer` - 驱动状态机，负责超时、延迟重试和忙碌指示
//! - `ActionRegistry` - 回调名称 → 处理函数
//!
//! ### ③ 流程层（Workflow）
//! - `AssessmentSession` - 会话上下文：答题、学号、加载答案、元素动作
//! - `ExamCtx` - 上下文封装（exam_id + assessment_id）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator::App` - 命令行入口，重放答案文件

pub mod api;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{AssessmentApi, AssessmentClient, CookieStore};
pub use models::{Action, BusyIndicator, ClientState, PageModel, RegistrationNumber};
pub use orchestrator::App;
pub use services::{ActionRegistry, SubmissionSerializer, SubmitMachine, SubmitPhase};
pub use workflow::{AssessmentSession, ExamCtx};
