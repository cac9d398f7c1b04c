//! API 模块
//!
//! 负责与考试服务器交互的路由定义

pub mod routes;

pub use routes::Routes;
