use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 考试服务器基础地址
    pub base_url: String,
    /// 考试ID
    pub exam_id: String,
    /// 测验ID
    pub assessment_id: String,
    /// CSRF 令牌（来自页面上下文）
    pub csrf_token: String,
    /// 单次请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 提交失败后重试等待时间（秒）
    pub retry_delay_secs: u64,
    /// Cookie 存储文件
    pub cookie_file: String,
    /// 答案 TOML 文件存放目录
    pub answers_folder: String,
    /// 提交完成后是否自动加载已存答案
    pub auto_load_answers: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            exam_id: "1".to_string(),
            assessment_id: "1".to_string(),
            csrf_token: String::new(),
            request_timeout_secs: 10,
            retry_delay_secs: 15,
            cookie_file: "cookies.toml".to_string(),
            answers_folder: "answers_toml".to_string(),
            auto_load_answers: false,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            base_url: std::env::var("ASSESSMENT_BASE_URL").unwrap_or(default.base_url),
            exam_id: std::env::var("ASSESSMENT_EXAM_ID").unwrap_or(default.exam_id),
            assessment_id: std::env::var("ASSESSMENT_ID").unwrap_or(default.assessment_id),
            csrf_token: std::env::var("ASSESSMENT_CSRF_TOKEN").unwrap_or(default.csrf_token),
            request_timeout_secs: std::env::var("ASSESSMENT_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            retry_delay_secs: std::env::var("ASSESSMENT_RETRY_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_delay_secs),
            cookie_file: std::env::var("ASSESSMENT_COOKIE_FILE").unwrap_or(default.cookie_file),
            answers_folder: std::env::var("ASSESSMENT_ANSWERS_FOLDER").unwrap_or(default.answers_folder),
            auto_load_answers: std::env::var("ASSESSMENT_AUTO_LOAD_ANSWERS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.auto_load_answers),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}
