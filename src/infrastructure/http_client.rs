//! 考试服务器 HTTP 客户端 - 基础设施层
//!
//! 持有 reqwest 连接池，只暴露"调用某个接口"的能力，不处理重试和回调分发

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::api::Routes;
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{Action, ClientState, RandomStudent, RegistrationNumber};
use crate::workflow::ExamCtx;

/// CSRF 令牌请求头
pub const CSRF_HEADER: &str = "Csrf-Token";

/// 考试服务器接口
///
/// 会话和提交序列化器只依赖这个 trait，测试中可以替换为假实现。
#[async_trait]
pub trait AssessmentApi: Send + Sync + 'static {
    /// 提交完整答题状态，返回回调指令
    async fn update_state(&self, state: &ClientState) -> AppResult<Vec<Action>>;

    /// 加载某学号的已存答案
    async fn load_answers(&self, registration: &RegistrationNumber) -> AppResult<Vec<Action>>;

    /// 加载参考答案
    async fn load_reference(&self) -> AppResult<Vec<Action>>;

    /// 随机抽取一个学生
    async fn random_student(&self) -> AppResult<RandomStudent>;

    /// Dynexite 导出的答案（纯文本）
    async fn dynexite_answers(&self, registration: &RegistrationNumber) -> AppResult<String>;

    /// 提交单个元素的动作
    async fn element_action(
        &self,
        element_name: &str,
        payload: &JsonValue,
    ) -> AppResult<Vec<Action>>;
}

/// 基于 reqwest 的考试服务器客户端
pub struct AssessmentClient {
    http: Client,
    routes: Routes,
    csrf_token: String,
    timeout: Duration,
}

impl AssessmentClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let routes = Routes::new(&config.base_url, ExamCtx::from_config(config))?;
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::api_request_failed("client", e))?;

        Ok(Self {
            http,
            routes,
            csrf_token: config.csrf_token.clone(),
            timeout: config.request_timeout(),
        })
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: Url) -> AppResult<T> {
        let body = self.send(endpoint, self.http.get(url)).await?;
        parse_json(endpoint, &body)
    }

    async fn post_json<B, T>(&self, endpoint: &str, url: Url, payload: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.send(endpoint, self.http.post(url).json(payload)).await?;
        parse_json(endpoint, &body)
    }

    /// 发送请求并返回成功响应的正文
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> AppResult<String> {
        let response = request
            .header(CSRF_HEADER, &self.csrf_token)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        debug!("{} 响应 {}: {} 字节", endpoint, status, body.len());

        if !status.is_success() {
            return Err(ApiError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(body)
    }

    fn transport_error(&self, endpoint: &str, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::api_timeout(endpoint, self.timeout)
        } else {
            AppError::api_request_failed(endpoint, err)
        }
    }
}

#[async_trait]
impl AssessmentApi for AssessmentClient {
    async fn update_state(&self, state: &ClientState) -> AppResult<Vec<Action>> {
        self.post_json("updateAction", self.routes.update_state(), state)
            .await
    }

    async fn load_answers(&self, registration: &RegistrationNumber) -> AppResult<Vec<Action>> {
        self.get_json("loadAnswers", self.routes.load_answers(registration))
            .await
    }

    async fn load_reference(&self) -> AppResult<Vec<Action>> {
        self.get_json("loadReference", self.routes.load_reference())
            .await
    }

    async fn random_student(&self) -> AppResult<RandomStudent> {
        self.get_json("randomStudent", self.routes.random_student())
            .await
    }

    async fn dynexite_answers(&self, registration: &RegistrationNumber) -> AppResult<String> {
        let url = self.routes.dynexite_answers(registration);
        self.send("dynexiteAnswers", self.http.get(url)).await
    }

    async fn element_action(
        &self,
        element_name: &str,
        payload: &JsonValue,
    ) -> AppResult<Vec<Action>> {
        self.post_json(
            "elementAction",
            self.routes.element_action(element_name),
            payload,
        )
        .await
    }
}

fn parse_json<T: DeserializeOwned>(endpoint: &str, body: &str) -> AppResult<T> {
    serde_json::from_str(body).map_err(|source| {
        ApiError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            source,
        }
        .into()
    })
}
