//! 应用编排 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、HTTP 客户端、Cookie 存储、测验会话
//! 2. **重放答案**：扫描答案目录下的 TOML 文件，逐个元素交给会话，由提交序列化器合并提交
//! 3. **可选加载**：按配置加载当前学号的已存答案，并给出 Dynexite 链接
//! 4. **收尾**：把页面日志区写入日志文件，输出统计

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::{AssessmentClient, CookieStore};
use crate::models::{BusyIndicator, ClientState};
use crate::services::SubmitTimings;
use crate::utils::logging::{append_page_log, init_log_file, log_startup, truncate_text};
use crate::workflow::AssessmentSession;

/// 应用主结构
pub struct App {
    config: Config,
    session: AssessmentSession<AssessmentClient>,
}

/// 运行统计
#[derive(Debug, Default)]
struct RunStats {
    files: usize,
    elements: usize,
    rejected: usize,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let client = AssessmentClient::new(&config)?;
        let routes = client.routes().clone();
        let session = AssessmentSession::open(
            Arc::new(client),
            routes,
            CookieStore::new(&config.cookie_file),
            SubmitTimings::from(&config),
        )
        .await;

        info!("{} 会话已打开", session.ctx());

        Ok(Self { config, session })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        self.watch_busy();

        let answer_files = self.load_answer_files().await?;
        if answer_files.is_empty() {
            warn!("⚠️ 没有找到待提交的答案文件");
        }

        let mut stats = RunStats::default();
        for (name, state) in &answer_files {
            info!("📄 正在重放: {} ({} 个元素)", name, state.len());
            stats.files += 1;
            self.replay(state, &mut stats);
        }

        info!("⏳ 等待提交完成...");
        self.session.wait_idle().await;

        if self.config.auto_load_answers {
            self.load_stored_answers().await;
        }

        self.finish(&stats)?;
        Ok(())
    }

    async fn load_answer_files(&self) -> Result<Vec<(String, ClientState)>> {
        info!("\n📁 正在扫描答案目录: {}", self.config.answers_folder);
        Ok(crate::models::load_all_toml_files(&self.config.answers_folder).await?)
    }

    fn replay(&self, state: &ClientState, stats: &mut RunStats) {
        for (element_id, value) in state.iter() {
            if self.config.verbose_logging {
                info!(
                    "  {} = {}",
                    element_id,
                    truncate_text(&value.to_string(), 60)
                );
            }
            match self.session.update_element(element_id, value.clone()) {
                Ok(()) => stats.elements += 1,
                Err(_) => stats.rejected += 1,
            }
        }
    }

    async fn load_stored_answers(&self) {
        match self.session.load_answers().await {
            Ok(report) => {
                info!(
                    "✓ 已加载答案: 执行 {} 个回调, {} 个失败",
                    report.invoked.len(),
                    report.errors.len()
                );
            }
            Err(e) if e.is_validation() => {
                warn!("⚠️ 未加载答案: {}", e);
                return;
            }
            Err(e) => {
                error!("❌ 加载答案失败: {}", e);
            }
        }

        if let (Ok(pdf), Ok(link)) = (
            self.session.dynexite_pdf_url(),
            self.session.dynexite_link_url(),
        ) {
            info!("📎 Dynexite PDF: {}", pdf);
            info!("🔗 Dynexite 链接: {}", link);
        }
    }

    /// 在后台记录忙碌指示的变化
    fn watch_busy(&self) {
        let mut rx = self.session.serializer().subscribe_busy();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let busy = *rx.borrow_and_update();
                match busy.message() {
                    Some(message) if busy == BusyIndicator::Failed => warn!("{}", message),
                    Some(message) => info!("{}", message),
                    None => info!("✓ 提交完成"),
                }
            }
        });
    }

    fn finish(&self, stats: &RunStats) -> Result<()> {
        let page = self.session.page();
        append_page_log(&self.config.output_log_file, page.log_entries())?;
        let errors = page.errors().count();

        info!("\n{}", "=".repeat(60));
        info!("📊 运行统计");
        info!(
            "完成时间: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        info!("{}", "=".repeat(60));
        info!("📄 答案文件: {}", stats.files);
        info!("✅ 已提交元素: {}", stats.elements);
        info!("⚠️ 被拒绝元素: {}", stats.rejected);
        info!("❌ 页面错误: {}", errors);
        info!("{}", "=".repeat(60));
        info!("\n日志已保存至: {}", self.config.output_log_file);
        Ok(())
    }
}
