use std::fs::{self, OpenOptions};
use std::io::Write;

/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::LogEntry;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 debug 或 info。
/// 重复调用是安全的（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n测验提交日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header).map_err(|e| AppError::file_write_failed(log_file_path, e))
}

/// 将页面日志区的内容追加到日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `entries`: 页面日志记录
pub fn append_page_log(log_file_path: &str, entries: &[LogEntry]) -> AppResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;

    for entry in entries {
        writeln!(file, "{}", entry).map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    }
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 测验答题状态提交");
    info!("🌐 服务器: {}", config.base_url);
    info!(
        "⏱️ 请求超时 {} 秒, 失败重试间隔 {} 秒",
        config.request_timeout_secs, config.retry_delay_secs
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageModel;

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_text("答题状态已提交", 4), "答题状态...");
        assert_eq!(truncate_text("ok", 4), "ok");
    }

    #[test]
    fn page_log_is_appended_after_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let path = path.to_str().unwrap();

        let mut page = PageModel::new();
        page.log_error("提交失败");

        init_log_file(path).unwrap();
        append_page_log(path, page.log_entries()).unwrap();

        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with(&"=".repeat(60)));
        assert!(written.contains("ERROR 提交失败"));
    }
}
