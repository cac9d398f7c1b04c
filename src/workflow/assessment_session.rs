//! 测验会话 - 流程层
//!
//! 核心职责：把页面上发生的事情（答题、输入学号、点击按钮）变成对服务器的调用，
//! 并把服务器返回的回调落到页面模型上。
//!
//! 会话是唯一的上下文对象：答题状态归提交序列化器所有，页面模型和回调注册表
//! 由会话持有，不存在任何全局变量。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use reqwest::Url;
use serde_json::Value as JsonValue;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

use crate::api::Routes;
use crate::error::{AppError, AppResult, DispatchError, ValidationError};
use crate::infrastructure::cookie_store::REGISTRATION_COOKIE;
use crate::infrastructure::{AssessmentApi, CookieStore, CookieWriter};
use crate::models::{Action, BusyIndicator, PageModel, RegistrationNumber, REGISTRATION_FIELD};
use crate::services::{
    ActionRegistry, ActionSink, DispatchReport, SubmissionSerializer, SubmitTimings,
};
use crate::workflow::exam_ctx::ExamCtx;
use crate::workflow::page_actions::{
    lock_page, register_page_actions, register_registration_action,
};

/// 测验会话
pub struct AssessmentSession<A: AssessmentApi> {
    api: Arc<A>,
    routes: Routes,
    cookies: CookieStore,
    cookie_writer: CookieWriter,
    page: Arc<Mutex<PageModel>>,
    registry: Arc<RwLock<ActionRegistry>>,
    serializer: SubmissionSerializer<A>,
}

/// 把提交成功后的回调分发到页面
struct PageSink {
    registry: Arc<RwLock<ActionRegistry>>,
    page: Arc<Mutex<PageModel>>,
}

impl ActionSink for PageSink {
    fn apply(&self, actions: Vec<Action>) {
        apply_actions(&self.registry, &self.page, &actions);
    }
}

fn apply_actions(
    registry: &RwLock<ActionRegistry>,
    page: &Mutex<PageModel>,
    actions: &[Action],
) -> DispatchReport {
    let report = registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .dispatch(actions);

    if !report.is_clean() {
        let mut page = lock_page(page);
        for err in &report.errors {
            page.log_error(err.to_string());
        }
    }
    report
}

impl<A: AssessmentApi> AssessmentSession<A> {
    /// 打开会话
    ///
    /// 注册内置页面回调，并用 Cookie 中保存的学号预填学号输入框。
    /// 后台任务（提交、Cookie 写入）运行在调用者所在的 tokio 运行时上。
    pub async fn open(
        api: Arc<A>,
        routes: Routes,
        cookies: CookieStore,
        timings: SubmitTimings,
    ) -> Self {
        let runtime = Handle::current();
        let page = Arc::new(Mutex::new(PageModel::new()));
        let cookie_writer = CookieWriter::spawn(cookies.clone(), &runtime);

        let mut registry = ActionRegistry::new();
        register_page_actions(&mut registry, page.clone());
        register_registration_action(&mut registry, page.clone(), cookie_writer.clone());
        let registry = Arc::new(RwLock::new(registry));

        let sink = Arc::new(PageSink {
            registry: registry.clone(),
            page: page.clone(),
        });
        let serializer = SubmissionSerializer::new(api.clone(), sink, timings, runtime);

        let session = Self {
            api,
            routes,
            cookies,
            cookie_writer,
            page,
            registry,
            serializer,
        };
        session.restore_registration().await;
        session
    }

    pub fn ctx(&self) -> &ExamCtx {
        self.routes.ctx()
    }

    /// 页面模型（不要跨越 `.await` 持有）
    pub fn page(&self) -> MutexGuard<'_, PageModel> {
        lock_page(&self.page)
    }

    pub fn serializer(&self) -> &SubmissionSerializer<A> {
        &self.serializer
    }

    pub fn busy(&self) -> BusyIndicator {
        self.serializer.busy()
    }

    /// 注册自定义回调，同名回调会替换内置回调
    pub fn register_action<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&JsonValue) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name, handler);
    }

    /// 执行一批回调
    pub fn apply_actions(&self, actions: &[Action]) -> DispatchReport {
        apply_actions(&self.registry, &self.page, actions)
    }

    /// 某个元素报告了新内容
    ///
    /// 元素标识为空属于调用方误用：记录错误并忽略本次更新，不中断执行。
    pub fn update_element(&self, element_id: &str, value: JsonValue) -> AppResult<()> {
        if element_id.is_empty() {
            let err = AppError::from(ValidationError::EmptyElementId);
            error!("{} {}", self.ctx(), err);
            self.page().log_error(err.to_string());
            return Err(err);
        }
        self.serializer.set_element(element_id, value);
        Ok(())
    }

    /// 请求提交当前答题状态
    pub fn request_submit(&self) {
        self.serializer.request_submit();
    }

    /// 等待所有提交完成
    pub async fn wait_idle(&self) {
        self.serializer.wait_idle().await;
    }

    /// 修改学号输入框，值变化时写入 Cookie
    ///
    /// 与 `setRegistration` 回调共用同一个写入队列，Cookie 总是跟随输入框的最后一次修改。
    pub async fn set_registration(&self, raw: &str) -> AppResult<()> {
        let pending = {
            let mut page = self.page();
            if page.registration() == raw {
                return Ok(());
            }
            page.set_registration(raw);
            self.cookie_writer.write(REGISTRATION_COOKIE, raw)
        };

        let written = match pending {
            Ok(pending) => pending.wait().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            self.report_failure("保存学号", &e);
            return Err(e);
        }
        Ok(())
    }

    /// 加载当前学号的已存答案
    pub async fn load_answers(&self) -> AppResult<DispatchReport> {
        let registration = self.registration()?;
        info!("{} 📥 加载学号 {} 的答案", self.ctx(), registration);
        let result = self.api.load_answers(&registration).await;
        self.dispatch_response("加载答案", result)
    }

    /// 加载参考答案
    pub async fn load_reference(&self) -> AppResult<DispatchReport> {
        info!("{} 📥 加载参考答案", self.ctx());
        let result = self.api.load_reference().await;
        self.dispatch_response("加载参考答案", result)
    }

    /// 随机抽取一个学生，填入学号并加载其答案
    pub async fn random_student(&self) -> AppResult<DispatchReport> {
        let student = match self.api.random_student().await {
            Ok(student) => student,
            Err(e) => {
                self.report_failure("随机抽取学生", &e);
                return Err(e);
            }
        };
        info!("{} 🎲 随机学生: {}", self.ctx(), student.registration);

        // Cookie 写入失败不影响加载答案
        let _ = self.set_registration(&student.registration).await;
        self.load_answers().await
    }

    /// Dynexite 导出的答案，显示在日志区
    pub async fn dynexite_answers(&self) -> AppResult<String> {
        let registration = self.registration()?;
        match self.api.dynexite_answers(&registration).await {
            Ok(text) => {
                self.page().log_info(text.clone());
                Ok(text)
            }
            Err(e) => {
                self.report_failure("加载 Dynexite 答案", &e);
                Err(e)
            }
        }
    }

    /// 在新标签页打开的 Dynexite PDF 地址
    pub fn dynexite_pdf_url(&self) -> AppResult<Url> {
        let registration = self.registration()?;
        Ok(self.routes.dynexite_pdf(&registration))
    }

    /// 在新标签页打开的 Dynexite 链接地址
    pub fn dynexite_link_url(&self) -> AppResult<Url> {
        let registration = self.registration()?;
        Ok(self.routes.dynexite_link(&registration))
    }

    /// 提交单个元素的动作并执行返回的回调，失败不重试
    pub async fn element_action(
        &self,
        element_name: &str,
        payload: &JsonValue,
    ) -> AppResult<DispatchReport> {
        if element_name.is_empty() {
            let err = AppError::from(ValidationError::EmptyElementId);
            error!("{} {}", self.ctx(), err);
            self.page().log_error(err.to_string());
            return Err(err);
        }
        let result = self.api.element_action(element_name, payload).await;
        self.dispatch_response("元素动作", result)
    }

    // ========== 内部辅助方法 ==========

    async fn restore_registration(&self) {
        match self.cookies.get(REGISTRATION_COOKIE).await {
            Ok(Some(saved)) => {
                info!("{} 从 Cookie 恢复学号: {}", self.ctx(), saved);
                self.page().set_registration(saved);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("{} 读取 Cookie 失败: {}", self.ctx(), e);
            }
        }
    }

    /// 校验学号输入框；失败时聚焦输入框并显示提示，请求不会发出
    fn registration(&self) -> AppResult<RegistrationNumber> {
        let mut page = self.page();
        match RegistrationNumber::parse(page.registration()) {
            Ok(registration) => Ok(registration),
            Err(e) => {
                warn!("{} ⚠️ {}", self.ctx(), e);
                page.focus(REGISTRATION_FIELD);
                page.log_error(e.to_string());
                Err(e.into())
            }
        }
    }

    fn dispatch_response(
        &self,
        what: &str,
        result: AppResult<Vec<Action>>,
    ) -> AppResult<DispatchReport> {
        match result {
            Ok(actions) => Ok(self.apply_actions(&actions)),
            Err(e) => {
                self.report_failure(what, &e);
                Err(e)
            }
        }
    }

    fn report_failure(&self, what: &str, err: &AppError) {
        error!("{} ❌ {}失败: {}", self.ctx(), what, err);
        self.page().log_error(format!("{}失败: {}", what, err));
    }
}
