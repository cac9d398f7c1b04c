//! 提交状态机
//!
//! 纯状态机，不做任何 I/O。保证同一时刻最多只有一个提交请求在途：
//!
//! ```text
//! Idle ──request_submit──▶ Sending
//! Sending ──request_submit──▶ Sending (pending = true)
//! Sending ──成功, 无 pending──▶ Idle (执行回调)
//! Sending ──成功/失败, 有 pending──▶ Sending (立即发送最新状态)
//! Sending ──失败, 无 pending──▶ RetryScheduled
//! RetryScheduled ──重试到期 / request_submit──▶ Sending
//! ```
//!
//! 在途标志和待发标志只能由本状态机修改。

use std::time::Duration;

use crate::config::Config;
use crate::models::Action;

/// 提交相关的时间参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitTimings {
    /// 单次提交的超时预算
    pub request_timeout: Duration,
    /// 失败且无待发更新时的重试等待
    pub retry_delay: Duration,
}

impl Default for SubmitTimings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            retry_delay: Duration::from_secs(15),
        }
    }
}

impl From<&Config> for SubmitTimings {
    fn from(config: &Config) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            retry_delay: config.retry_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    Sending,
    RetryScheduled,
}

/// 一次提交的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SettleOutcome {
    Success(Vec<Action>),
    /// 网络错误、非 2xx 或超时
    Failure,
}

/// 状态机要求驱动方执行的动作
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// 立即用发送时刻的最新状态发起提交
    Send,
    /// 已有请求在途，只标记待发
    Deferred,
    /// 执行响应中的回调，进入空闲
    Apply(Vec<Action>),
    /// 等待 `delay` 后调用 `on_retry_due(generation)`
    ScheduleRetry { generation: u64, delay: Duration },
    /// 无需任何动作
    Ignore,
}

#[derive(Debug)]
pub struct SubmitMachine {
    in_flight: bool,
    pending: bool,
    scheduled_retry: Option<u64>,
    generation: u64,
    retry_delay: Duration,
}

impl SubmitMachine {
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            in_flight: false,
            pending: false,
            scheduled_retry: None,
            generation: 0,
            retry_delay,
        }
    }

    pub fn phase(&self) -> SubmitPhase {
        if self.in_flight {
            SubmitPhase::Sending
        } else if self.scheduled_retry.is_some() {
            SubmitPhase::RetryScheduled
        } else {
            SubmitPhase::Idle
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// 客户端状态发生变化
    pub fn request_submit(&mut self) -> Transition {
        if self.in_flight {
            self.pending = true;
            return Transition::Deferred;
        }
        // 立即发送会取代已安排的重试
        self.scheduled_retry = None;
        self.in_flight = true;
        Transition::Send
    }

    /// 在途提交结束
    pub fn on_settled(&mut self, outcome: SettleOutcome) -> Transition {
        if !self.in_flight {
            return Transition::Ignore;
        }
        self.in_flight = false;

        if self.pending {
            self.pending = false;
            self.in_flight = true;
            return Transition::Send;
        }

        match outcome {
            SettleOutcome::Success(actions) => Transition::Apply(actions),
            SettleOutcome::Failure => {
                self.generation += 1;
                self.scheduled_retry = Some(self.generation);
                Transition::ScheduleRetry {
                    generation: self.generation,
                    delay: self.retry_delay,
                }
            }
        }
    }

    /// 重试定时器到期，过期的定时器被忽略
    pub fn on_retry_due(&mut self, generation: u64) -> Transition {
        if self.in_flight || self.scheduled_retry != Some(generation) {
            return Transition::Ignore;
        }
        self.scheduled_retry = None;
        self.in_flight = true;
        Transition::Send
    }
}
