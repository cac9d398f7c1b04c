use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 客户端校验错误（请求不会发出）
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 回调分发错误
    #[error("回调错误: {0}")]
    Dispatch(#[from] DispatchError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 服务器返回非 2xx 状态码
    #[error("API返回错误状态 ({endpoint}): status={status}, body={body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 请求超时
    #[error("API请求超时 ({endpoint}), 超时预算: {after:?}")]
    Timeout { endpoint: String, after: Duration },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        source: serde_json::Error,
    },
}

/// 客户端校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 学号为空
    #[error("请输入学号")]
    MissingRegistration,
    /// 学号首尾含空白字符
    #[error("学号首尾不能包含空白字符: '{value}'")]
    RegistrationWhitespace { value: String },
    /// 元素标识为空（调用方误用）
    #[error("元素标识不能为空")]
    EmptyElementId,
}

/// 回调分发错误
#[derive(Debug, Error)]
pub enum DispatchError {
    /// 未注册的回调
    #[error("未注册的回调: {callback}")]
    UnknownCallback { callback: String },
    /// 回调参数无法解析
    #[error("回调 {callback} 参数无效: {source}")]
    InvalidPayload {
        callback: String,
        source: serde_json::Error,
    },
    /// 回调执行失败
    #[error("回调 {callback} 执行失败: {message}")]
    HandlerFailed { callback: String, message: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        source: toml::de::Error,
    },
    /// TOML 序列化失败
    #[error("TOML序列化失败 ({path}): {source}")]
    TomlSerializeFailed {
        path: String,
        source: toml::ser::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 基础地址无效
    #[error("基础地址无效 '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建API超时错误
    pub fn api_timeout(endpoint: impl Into<String>, after: Duration) -> Self {
        AppError::Api(ApiError::Timeout {
            endpoint: endpoint.into(),
            after,
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为客户端校验错误
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_into_app_error() {
        let err: AppError = ValidationError::MissingRegistration.into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "校验错误: 请输入学号");
    }

    #[test]
    fn file_read_error_names_path() {
        let err = AppError::file_read_failed(
            "answers_toml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("(answers_toml)"));
    }

    #[test]
    fn timeout_message_names_endpoint() {
        let err = AppError::api_timeout("state", Duration::from_secs(10));
        assert!(!err.is_validation());
        assert!(err.to_string().contains("state"));
    }
}
