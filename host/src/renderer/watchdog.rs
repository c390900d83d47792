//! # Watchdog 模块
//!
//! 转场看门狗：为每个子阶段布防一个截止时限，自然完成信号迟迟不来时
//! 强制推进阶段，保证画面永远不会停在全遮蔽状态。
//!
//! 协作式实现：时限是随 tick 递减的倒计时，全部运行在单一逻辑线程
//! 上，不使用操作系统定时器。

/// 子阶段之外额外允许的松弛时间（秒）
pub const PHASE_SLACK_SECS: f32 = 0.040;

/// 看门狗触发事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogEvent {
    /// 遮蔽子阶段超时：应强制进入中间点
    CoverExpired,
    /// 显露子阶段超时：应强制回到空闲
    RevealExpired,
}

/// 转场看门狗
///
/// 每个活跃转场布防两个时限：遮蔽子阶段一个、显露子阶段一个。
/// 自然完成时对应时限被无条件撤防，因此不可能出现双重推进。
#[derive(Debug, Default)]
pub struct Watchdog {
    /// 遮蔽子阶段剩余时限（秒）
    cover: Option<f32>,
    /// 显露子阶段剩余时限（秒）
    reveal: Option<f32>,
}

impl Watchdog {
    /// 创建未布防的看门狗
    pub fn new() -> Self {
        Self::default()
    }

    /// 布防遮蔽子阶段时限
    pub fn arm_cover(&mut self, deadline_secs: f32) {
        self.cover = Some(deadline_secs.max(0.0));
    }

    /// 布防显露子阶段时限
    pub fn arm_reveal(&mut self, deadline_secs: f32) {
        self.reveal = Some(deadline_secs.max(0.0));
    }

    /// 撤防遮蔽时限（自然完成时调用，无条件）
    pub fn cancel_cover(&mut self) {
        self.cover = None;
    }

    /// 撤防显露时限（自然完成时调用，无条件）
    pub fn cancel_reveal(&mut self) {
        self.reveal = None;
    }

    /// 撤防所有时限
    pub fn cancel_all(&mut self) {
        self.cover = None;
        self.reveal = None;
    }

    /// 是否有布防中的时限
    pub fn is_armed(&self) -> bool {
        self.cover.is_some() || self.reveal.is_some()
    }

    /// 推进倒计时
    ///
    /// 两个时限同时倒数；同一 tick 内都到期时遮蔽优先（阶段顺序
    /// 在前）。触发的时限随即被撤防，因此每个时限最多触发一次。
    pub fn tick(&mut self, dt: f32) -> Option<WatchdogEvent> {
        let dt = dt.max(0.0);

        let mut fired = None;

        if let Some(remaining) = &mut self.cover {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.cover = None;
                fired = Some(WatchdogEvent::CoverExpired);
            }
        }

        if let Some(remaining) = &mut self.reveal {
            *remaining -= dt;
            if *remaining <= 0.0 && fired.is_none() {
                self.reveal = None;
                fired = Some(WatchdogEvent::RevealExpired);
            }
        }

        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_at_deadline() {
        let mut dog = Watchdog::new();
        dog.arm_cover(0.5);

        assert_eq!(dog.tick(0.3), None);
        assert_eq!(dog.tick(0.3), Some(WatchdogEvent::CoverExpired));
        // 触发后自动撤防，不会重复触发
        assert_eq!(dog.tick(10.0), None);
        assert!(!dog.is_armed());
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let mut dog = Watchdog::new();
        dog.arm_cover(0.5);
        dog.cancel_cover();

        assert_eq!(dog.tick(10.0), None);
    }

    #[test]
    fn test_cover_and_reveal_are_independent() {
        let mut dog = Watchdog::new();
        dog.arm_cover(0.2);
        dog.arm_reveal(1.0);

        assert_eq!(dog.tick(0.3), Some(WatchdogEvent::CoverExpired));
        // 显露时限继续倒数
        assert!(dog.is_armed());
        assert_eq!(dog.tick(0.8), Some(WatchdogEvent::RevealExpired));
    }

    #[test]
    fn test_cancel_all() {
        let mut dog = Watchdog::new();
        dog.arm_cover(0.1);
        dog.arm_reveal(0.1);
        dog.cancel_all();

        assert!(!dog.is_armed());
        assert_eq!(dog.tick(10.0), None);
    }

    #[test]
    fn test_zero_deadline_fires_on_next_tick() {
        let mut dog = Watchdog::new();
        dog.arm_cover(0.0);
        assert_eq!(dog.tick(0.016), Some(WatchdogEvent::CoverExpired));
    }
}
