//! # Clock 模块
//!
//! 子阶段进度时钟。
//!
//! 每个子阶段（遮蔽 / 显露）持有一个独立的时钟实例：进度是 [0,1]
//! 区间内严格单调不减的标量，子阶段开始时重置为 0。

/// 转场子阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubPhase {
    /// 遮蔽：旧内容被逐渐盖住
    Cover,
    /// 显露：新内容被逐渐揭开
    Reveal,
}

/// 进度时钟
///
/// 管理单个子阶段从 0 到 1 的时间推进。不应用缓动——缓动属于
/// 各策略对进度的解释，时钟只保证单调性。
#[derive(Debug, Clone)]
pub struct ProgressClock {
    /// 已经过的时间（秒）
    elapsed: f32,
    /// 子阶段墙钟跨度（秒）
    span: f32,
}

impl ProgressClock {
    /// 创建新的进度时钟
    ///
    /// `span_secs` 为子阶段的总墙钟跨度；非正值视为立即完成。
    pub fn new(span_secs: f32) -> Self {
        Self {
            elapsed: 0.0,
            span: span_secs.max(0.0),
        }
    }

    /// 推进时钟
    ///
    /// 负的 `dt` 被忽略，保证进度严格单调不减。
    ///
    /// # 返回
    /// 推进后的进度值 (0.0 - 1.0)
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed += dt.max(0.0);
        self.progress()
    }

    /// 当前进度 (0.0 - 1.0)
    pub fn progress(&self) -> f32 {
        if self.span <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.span).clamp(0.0, 1.0)
        }
    }

    /// 已经过的时间（秒）
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// 时钟是否已走完
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.span
    }
}
