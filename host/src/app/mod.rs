//! # App 模块
//!
//! UI 同步适配层：把协调器的阶段变化映射到应用其余部分关心的状态。
//!
//! 引擎保证的时序：
//! - `on_start` 同步触发 → 冻结导航输入
//! - `on_mid` 在画面全遮蔽时触发 → 这里是**唯一**挂载新视图的地方
//! - `on_end` 显露完成后触发 → 恢复交互

use stage_runtime::{TransitionSpec, ViewId};
use tracing::debug;

use crate::renderer::{FrameSource, StageHooks, TransitionCoordinator};

/// 舞台同步状态
///
/// 应用侧的影子状态：哪个视图已挂载、输入是否被冻结。
/// 只通过 [`StageHooks`] 回调变化，不自己做任何判断。
#[derive(Debug, Default)]
pub struct StageSync {
    /// 当前已挂载的视图
    mounted_view: Option<ViewId>,
    /// 转场期间为 true：导航输入应被忽略
    input_locked: bool,
    /// 总共完成的转场次数
    completed: usize,
}

impl StageSync {
    /// 创建初始状态
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前已挂载的视图
    pub fn mounted_view(&self) -> Option<&ViewId> {
        self.mounted_view.as_ref()
    }

    /// 导航输入是否被冻结
    pub fn is_input_locked(&self) -> bool {
        self.input_locked
    }

    /// 已完成的转场次数
    pub fn completed_count(&self) -> usize {
        self.completed
    }
}

impl StageHooks for StageSync {
    fn on_start(&mut self, target: &ViewId) {
        debug!(target_view = %target, "冻结导航输入");
        self.input_locked = true;
    }

    fn on_mid(&mut self, target: &ViewId) {
        debug!(target_view = %target, "中间点：挂载新视图");
        self.mounted_view = Some(target.clone());
    }

    fn on_end(&mut self, target: &ViewId) {
        debug!(target_view = %target, "转场完成：恢复交互");
        self.input_locked = false;
        self.completed += 1;
    }
}

/// 请求切换视图
///
/// 忙碌时返回 `false`，请求被丢弃（调用方可以选择稍后重试，
/// 引擎不排队）。
pub fn request_view_switch(
    coordinator: &mut TransitionCoordinator,
    sync: &mut StageSync,
    surface: &dyn FrameSource,
    target: ViewId,
    spec: &TransitionSpec,
) -> bool {
    coordinator.start_transition(target, spec, surface.viewport(), sync)
}

/// 每渲染 tick 驱动转场并同步 UI 状态
pub fn drive_transition(
    coordinator: &mut TransitionCoordinator,
    sync: &mut StageSync,
    surface: &mut dyn FrameSource,
    dt: f32,
) {
    if !coordinator.is_active() {
        return;
    }
    coordinator.tick(dt, surface, sync);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::SoftwareSurface;

    const DT: f32 = 0.016;

    #[test]
    fn test_input_locked_for_whole_transition() {
        let mut coordinator = TransitionCoordinator::new();
        let mut sync = StageSync::new();
        let mut surface = SoftwareSurface::new(640, 360);

        assert!(!sync.is_input_locked());

        let accepted = request_view_switch(
            &mut coordinator,
            &mut sync,
            &surface,
            ViewId::new("section1"),
            &TransitionSpec::simple("grid"),
        );
        assert!(accepted);
        // on_start 同步冻结输入
        assert!(sync.is_input_locked());

        for _ in 0..1000 {
            if !coordinator.is_active() {
                break;
            }
            drive_transition(&mut coordinator, &mut sync, &mut surface, DT);
            if coordinator.is_active() {
                assert!(sync.is_input_locked(), "转场中输入解冻过早");
            }
        }

        assert!(!sync.is_input_locked());
        assert_eq!(sync.completed_count(), 1);
    }

    #[test]
    fn test_view_mounts_exactly_at_mid() {
        let mut coordinator = TransitionCoordinator::new();
        let mut sync = StageSync::new();
        let mut surface = SoftwareSurface::new(640, 360);

        request_view_switch(
            &mut coordinator,
            &mut sync,
            &surface,
            ViewId::new("section1"),
            &TransitionSpec::simple("fade"),
        );
        assert_eq!(sync.mounted_view(), None);

        // 遮蔽尚未完成时视图不能被挂载
        drive_transition(&mut coordinator, &mut sync, &mut surface, DT);
        assert_eq!(sync.mounted_view(), None);

        for _ in 0..1000 {
            if !coordinator.is_active() {
                break;
            }
            drive_transition(&mut coordinator, &mut sync, &mut surface, DT);
        }
        assert_eq!(sync.mounted_view(), Some(&ViewId::new("section1")));
    }

    #[test]
    fn test_busy_request_dropped() {
        let mut coordinator = TransitionCoordinator::new();
        let mut sync = StageSync::new();
        let surface = SoftwareSurface::new(640, 360);

        assert!(request_view_switch(
            &mut coordinator,
            &mut sync,
            &surface,
            ViewId::new("a"),
            &TransitionSpec::simple("grid"),
        ));
        assert!(!request_view_switch(
            &mut coordinator,
            &mut sync,
            &surface,
            ViewId::new("b"),
            &TransitionSpec::simple("grid"),
        ));
    }
}
