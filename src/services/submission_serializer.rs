//! 提交序列化器 - 业务能力层
//!
//! 驱动 [`SubmitMachine`]：持有客户端答题状态，负责真正发请求、超时、延迟重试，
//! 并通过 watch 通道发布忙碌指示。
//!
//! 状态机和答题状态放在同一把锁里，锁从不跨越 `.await`。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value as JsonValue;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::AssessmentApi;
use crate::models::{Action, BusyIndicator, ClientState};
use crate::services::submit_machine::{
    SettleOutcome, SubmitMachine, SubmitPhase, SubmitTimings, Transition,
};

/// 提交成功后接收回调指令的一方
pub trait ActionSink: Send + Sync {
    fn apply(&self, actions: Vec<Action>);
}

/// 提交序列化器
///
/// 提交在创建时传入的运行时上以后台任务执行，因此 `request_submit`
/// 可以从任意线程调用。
pub struct SubmissionSerializer<A: AssessmentApi> {
    inner: Arc<Inner<A>>,
}

impl<A: AssessmentApi> Clone for SubmissionSerializer<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<A> {
    api: Arc<A>,
    sink: Arc<dyn ActionSink>,
    timings: SubmitTimings,
    shared: Mutex<Shared>,
    busy: watch::Sender<BusyIndicator>,
    runtime: Handle,
}

struct Shared {
    machine: SubmitMachine,
    state: ClientState,
}

impl<A: AssessmentApi> SubmissionSerializer<A> {
    pub fn new(
        api: Arc<A>,
        sink: Arc<dyn ActionSink>,
        timings: SubmitTimings,
        runtime: Handle,
    ) -> Self {
        let (busy, _) = watch::channel(BusyIndicator::Idle);
        Self {
            inner: Arc::new(Inner {
                api,
                sink,
                timings,
                shared: Mutex::new(Shared {
                    machine: SubmitMachine::new(timings.retry_delay),
                    state: ClientState::new(),
                }),
                busy,
                runtime,
            }),
        }
    }

    /// 更新某个元素的答案并请求提交
    pub fn set_element(&self, element_id: impl Into<String>, value: JsonValue) {
        self.update_state(|state| {
            state.set(element_id, value);
        });
        self.request_submit();
    }

    /// 直接修改答题状态，不触发提交
    pub fn update_state<F: FnOnce(&mut ClientState)>(&self, f: F) {
        f(&mut self.inner.lock().state);
    }

    /// 请求提交当前答题状态
    ///
    /// 空闲时立即发送；已有请求在途时只标记待发，在途请求结束后
    /// 用那一刻的最新状态再发一次。
    pub fn request_submit(&self) {
        let snapshot = {
            let mut shared = self.inner.lock();
            match shared.machine.request_submit() {
                Transition::Send => {
                    self.inner.busy.send_replace(BusyIndicator::Submitting);
                    Some(shared.state.clone())
                }
                _ => {
                    debug!("已有提交在途，标记待发");
                    None
                }
            }
        };

        if let Some(snapshot) = snapshot {
            self.inner.runtime.spawn(self.inner.clone().run(snapshot));
        }
    }

    /// 当前答题状态的快照
    pub fn client_state(&self) -> ClientState {
        self.inner.lock().state.clone()
    }

    pub fn phase(&self) -> SubmitPhase {
        self.inner.lock().machine.phase()
    }

    pub fn busy(&self) -> BusyIndicator {
        *self.inner.busy.borrow()
    }

    pub fn subscribe_busy(&self) -> watch::Receiver<BusyIndicator> {
        self.inner.busy.subscribe()
    }

    /// 等待所有提交完成（包括已安排的重试）
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.busy.subscribe();
        // 发送端与 self 同生命周期，不会提前关闭
        let _ = rx.wait_for(|busy| *busy == BusyIndicator::Idle).await;
    }
}

impl<A: AssessmentApi> Inner<A> {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(self: Arc<Self>, mut snapshot: ClientState) {
        loop {
            let outcome = match self.submit_once(&snapshot).await {
                Ok(actions) => SettleOutcome::Success(actions),
                Err(e) => {
                    warn!("提交答题状态失败: {}", e);
                    SettleOutcome::Failure
                }
            };
            let failed = outcome == SettleOutcome::Failure;

            let transition = {
                let mut shared = self.lock();
                let transition = shared.machine.on_settled(outcome);
                match &transition {
                    Transition::Send => {
                        if failed {
                            self.busy.send_replace(BusyIndicator::Failed);
                        }
                        self.busy.send_replace(BusyIndicator::Submitting);
                        snapshot = shared.state.clone();
                    }
                    Transition::ScheduleRetry { .. } => {
                        self.busy.send_replace(BusyIndicator::Failed);
                    }
                    _ => {}
                }
                transition
            };

            match transition {
                Transition::Send => {
                    debug!("提交期间有新的修改，立即发送最新状态");
                }
                Transition::Apply(actions) => {
                    info!("✓ 答题状态已提交，执行 {} 个回调", actions.len());
                    self.sink.apply(actions);
                    let shared = self.lock();
                    if shared.machine.phase() == SubmitPhase::Idle {
                        self.busy.send_replace(BusyIndicator::Idle);
                    }
                    return;
                }
                Transition::ScheduleRetry { generation, delay } => {
                    info!("将在 {:?} 后重试提交", delay);
                    tokio::time::sleep(delay).await;

                    let next = {
                        let mut shared = self.lock();
                        match shared.machine.on_retry_due(generation) {
                            Transition::Send => {
                                self.busy.send_replace(BusyIndicator::Submitting);
                                Some(shared.state.clone())
                            }
                            _ => None,
                        }
                    };
                    match next {
                        Some(latest) => snapshot = latest,
                        None => {
                            debug!("重试 #{} 已被新的提交取代", generation);
                            return;
                        }
                    }
                }
                Transition::Deferred | Transition::Ignore => return,
            }
        }
    }

    async fn submit_once(&self, snapshot: &ClientState) -> AppResult<Vec<Action>> {
        debug!("提交答题状态: {} 个元素", snapshot.len());
        let timeout = self.timings.request_timeout;
        match tokio::time::timeout(timeout, self.api.update_state(snapshot)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::api_timeout("updateAction", timeout)),
        }
    }
}
