//! # Coordinator 模块
//!
//! 转场协调器：顺序推进阶段、强制互斥、持有捕获资源、在精确的时点
//! 触发边界回调的状态机。
//!
//! ## 阶段序列
//!
//! ```text
//! Idle → Covering → Mid → Revealing → Idle
//! ```
//!
//! 严格按此顺序推进，不跳过、不重复；全系统同一时刻至多一个非 Idle
//! 的转场（忙碌标志是唯一的并发控制原语，多余的请求被丢弃而非排队）。
//!
//! ## 确定性挂载点
//!
//! `on_mid` 严格发生在遮蔽子阶段结束之后、显露子阶段开始之前——
//! 在回调里挂载新内容时画面必然处于全遮蔽状态，新内容不可能提前
//! 闪现。
//!
//! ## 失败语义
//!
//! 管线中任何一步都不允许向调用方抛错：采集失败静默降级为 fade，
//! 自然完成信号缺失由看门狗强制推进。最坏的用户可见后果是一次
//! 低保真的平淡渐变，而不是卡死的遮蔽画面。

use stage_runtime::{RevealConfig, TransitionSpec, ViewId};
use tracing::{debug, info, warn};

use super::capture::{CapturedFrame, FrameCapture};
use super::clock::{ProgressClock, SubPhase};
use super::strategies::resolver::{self, ResolvedTransition};
use super::strategies::{OverlayParams, RevealStrategy, SimpleFade};
use super::surface::{FrameSource, Viewport};
use super::watchdog::{PHASE_SLACK_SECS, Watchdog, WatchdogEvent};
use super::easing::EasingFunction;

/// 转场阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// 空闲，没有活跃转场
    Idle,
    /// 遮蔽子阶段：旧内容被逐渐盖住
    Covering,
    /// 中间点：画面全遮蔽，挂载新内容的唯一时机
    Mid,
    /// 显露子阶段：新内容被逐渐揭开
    Revealing,
}

/// 边界回调
///
/// 引擎与应用其余部分之间的全部接触面。默认实现为空操作，
/// 调用方只需要覆写关心的时点。
pub trait StageHooks {
    /// 转场被接受时同步触发；调用方借此冻结瞬态 UI（如禁用导航输入）
    fn on_start(&mut self, _target: &ViewId) {}

    /// 遮蔽完成时触发；**唯一**允许替换渲染内容的时点
    fn on_mid(&mut self, _target: &ViewId) {}

    /// 显露完成时触发；恢复完整交互是安全的
    fn on_end(&mut self, _target: &ViewId) {}
}

/// 空回调（测试与演示用）
impl StageHooks for () {}

/// 转场状态快照
#[derive(Debug, Clone)]
pub struct TransitionState {
    /// 当前阶段
    pub phase: TransitionPhase,
    /// 来源视图
    pub from_view: Option<ViewId>,
    /// 目标视图（Idle 时为 None）
    pub to_view: Option<ViewId>,
    /// 策略名称
    pub strategy: Option<&'static str>,
    /// 转场开始时的引擎时间（秒）
    pub started_at: Option<f32>,
}

/// 活跃转场的内部数据
struct ActiveTransition {
    from: Option<ViewId>,
    to: ViewId,
    strategy: Box<dyn RevealStrategy>,
    config: RevealConfig,
    clock: ProgressClock,
    viewport: Viewport,
    /// 捕获的旧帧（由本转场独占持有）
    captured: Option<CapturedFrame>,
    /// 是否在等待帧采集完成
    awaiting_capture: bool,
    started_at: f32,
}

/// 转场协调器
///
/// 所有可变状态（定时器、在途采集、捕获帧）都是本结构体的显式
/// 字段，没有任何环境全局量；一个应用的每个转场上下文恰好持有
/// 一个协调器实例。
pub struct TransitionCoordinator {
    phase: TransitionPhase,
    active: Option<ActiveTransition>,
    capture: FrameCapture,
    watchdog: Watchdog,
    /// 当前已挂载的视图（在中间点更新）
    current_view: Option<ViewId>,
    /// 引擎累计时间（秒）
    engine_time: f32,
}

impl TransitionCoordinator {
    /// 创建空闲的协调器
    pub fn new() -> Self {
        Self {
            phase: TransitionPhase::Idle,
            active: None,
            capture: FrameCapture::new(),
            watchdog: Watchdog::new(),
            current_view: None,
            engine_time: 0.0,
        }
    }

    // ========== 启动 ==========

    /// 请求开始一次转场
    ///
    /// # 返回
    /// - `true`: 请求被接受，`on_start` 已同步触发
    /// - `false`: 已有转场在进行中——互斥保护，没有任何状态被修改，
    ///   请求被丢弃（不排队）
    pub fn start_transition(
        &mut self,
        target: ViewId,
        spec: &TransitionSpec,
        viewport: Viewport,
        hooks: &mut dyn StageHooks,
    ) -> bool {
        if self.phase != TransitionPhase::Idle {
            debug!(target_view = %target, phase = ?self.phase, "转场进行中，丢弃新请求");
            return false;
        }

        let ResolvedTransition { strategy, config } = resolver::resolve(spec);
        self.start_resolved(target, strategy, config, viewport, hooks);
        true
    }

    /// 以解析完成的策略启动（内部入口，也供测试注入策略）
    pub(crate) fn start_resolved(
        &mut self,
        target: ViewId,
        mut strategy: Box<dyn RevealStrategy>,
        config: RevealConfig,
        viewport: Viewport,
        hooks: &mut dyn StageHooks,
    ) {
        info!(
            target_view = %target,
            strategy = strategy.name(),
            in_ms = config.in_duration_ms,
            out_ms = config.out_duration_ms,
            delay_ms = config.delay_span_ms,
            "转场开始"
        );

        hooks.on_start(&target);

        let cover_span = config.cover_span_ms() / 1000.0;
        strategy.begin(SubPhase::Cover, viewport);
        self.watchdog.arm_cover(cover_span + PHASE_SLACK_SECS);

        let awaiting_capture = strategy.needs_capture();
        if awaiting_capture {
            // 实际采集在之后的渲染 tick 上执行，保证画面已稳定
            self.capture.request();
        }

        self.phase = TransitionPhase::Covering;
        self.active = Some(ActiveTransition {
            from: self.current_view.clone(),
            to: target,
            strategy,
            config,
            clock: ProgressClock::new(cover_span),
            viewport,
            captured: None,
            awaiting_capture,
            started_at: self.engine_time,
        });
    }

    // ========== 每渲染 tick 驱动 ==========

    /// 推进转场
    ///
    /// 在每个渲染 tick 上调用。依次处理：帧采集等待、进度推进、
    /// 自然完成、看门狗超时。
    pub fn tick(&mut self, dt: f32, surface: &mut dyn FrameSource, hooks: &mut dyn StageHooks) {
        if self.phase == TransitionPhase::Idle {
            return;
        }
        self.engine_time += dt;

        let awaiting = self.active.as_ref().is_some_and(|a| a.awaiting_capture);
        if awaiting {
            // 等待期间时钟不推进；看门狗照常倒数，兜底采集卡死的情况
            if self.capture.tick() {
                self.finish_capture(surface);
            }
        } else {
            let mut finished_phase = None;
            if let Some(active) = self.active.as_mut() {
                let progress = active.clock.advance(dt);
                active.strategy.advance(progress);
                if active.clock.is_finished() && active.strategy.is_fully_revealed() {
                    finished_phase = Some(self.phase);
                }
            }
            match finished_phase {
                Some(TransitionPhase::Covering) => self.complete_cover(hooks),
                Some(TransitionPhase::Revealing) => self.complete_reveal(surface, hooks),
                _ => {}
            }
        }

        match self.watchdog.tick(dt) {
            Some(WatchdogEvent::CoverExpired) if self.phase == TransitionPhase::Covering => {
                warn!("遮蔽子阶段超时，看门狗强制进入中间点");
                self.complete_cover(hooks);
            }
            Some(WatchdogEvent::RevealExpired) if self.phase == TransitionPhase::Revealing => {
                warn!("显露子阶段超时，看门狗强制结束转场");
                self.complete_reveal(surface, hooks);
            }
            _ => {}
        }
    }

    /// 执行帧采集；失败时降级策略
    fn finish_capture(&mut self, surface: &mut dyn FrameSource) {
        match self.capture.attempt(surface) {
            Ok(frame) => {
                if let Some(active) = self.active.as_mut() {
                    debug!(
                        width = frame.width,
                        height = frame.height,
                        device_side = frame.texture_slot().is_some(),
                        "旧帧采集完成"
                    );
                    active.captured = Some(frame);
                    active.awaiting_capture = false;
                }
            }
            Err(e) => {
                if let Some(active) = self.active.as_mut() {
                    warn!(
                        error = %e,
                        strategy = active.strategy.name(),
                        "帧采集不可用，降级为 fade"
                    );
                    let easing = EasingFunction::from(active.config.easing);
                    active.strategy = Box::new(SimpleFade::new(easing));
                    active.strategy.begin(SubPhase::Cover, active.viewport);
                    active.awaiting_capture = false;
                }
            }
        }
    }

    /// 遮蔽完成：经过中间点，随即开始显露
    ///
    /// 自然完成与看门狗强制走同一条路径，`on_mid` 恰好触发一次。
    fn complete_cover(&mut self, hooks: &mut dyn StageHooks) {
        self.watchdog.cancel_cover();
        // 看门狗在采集等待期间触发时，丢弃未完成的采集请求
        self.capture.cancel();

        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.awaiting_capture = false;

        self.phase = TransitionPhase::Mid;
        debug!(target_view = %active.to, "阶段转换: Covering → Mid");

        let to = active.to.clone();
        hooks.on_mid(&to);
        self.current_view = Some(to);

        // 中间点不停留：挂载完成后立即以全新时钟进入显露子阶段
        let reveal_span = active.config.reveal_span_ms() / 1000.0;
        active.strategy.begin(SubPhase::Reveal, active.viewport);
        active.clock = ProgressClock::new(reveal_span);
        self.phase = TransitionPhase::Revealing;
        self.watchdog.arm_reveal(reveal_span + PHASE_SLACK_SECS);
        debug!("阶段转换: Mid → Revealing");
    }

    /// 显露完成：释放捕获资源，回到空闲
    ///
    /// 无论正常完成还是看门狗强制终止，捕获帧都在这里无条件释放。
    fn complete_reveal(&mut self, surface: &mut dyn FrameSource, hooks: &mut dyn StageHooks) {
        self.watchdog.cancel_all();
        self.capture.cancel();

        let Some(mut active) = self.active.take() else {
            return;
        };
        if let Some(frame) = active.captured.take() {
            if let Some(slot) = frame.texture_slot() {
                surface.release_texture(slot);
            }
        }

        self.phase = TransitionPhase::Idle;
        debug!(target_view = %active.to, "阶段转换: Revealing → Idle");
        hooks.on_end(&active.to);
    }

    // ========== 跳过控制 ==========

    /// 跳过遮蔽子阶段，直接到中间点（随即进入显露）
    pub fn skip_cover(&mut self, hooks: &mut dyn StageHooks) {
        if self.phase == TransitionPhase::Covering {
            self.complete_cover(hooks);
        }
    }

    /// 跳过整个转场
    ///
    /// 回调依然按顺序各触发一次，资源正常释放。
    pub fn skip_all(&mut self, surface: &mut dyn FrameSource, hooks: &mut dyn StageHooks) {
        match self.phase {
            TransitionPhase::Covering => {
                self.complete_cover(hooks);
                self.complete_reveal(surface, hooks);
            }
            TransitionPhase::Revealing => {
                self.complete_reveal(surface, hooks);
            }
            TransitionPhase::Idle | TransitionPhase::Mid => {}
        }
    }

    // ========== 查询 ==========

    /// 当前阶段
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// 是否有活跃转场
    pub fn is_active(&self) -> bool {
        self.phase != TransitionPhase::Idle
    }

    /// 当前已挂载的视图
    pub fn current_view(&self) -> Option<&ViewId> {
        self.current_view.as_ref()
    }

    /// 活跃策略名称
    pub fn strategy_name(&self) -> Option<&'static str> {
        self.active.as_ref().map(|a| a.strategy.name())
    }

    /// 活跃策略家族（合成层据此选择管线）
    pub fn strategy_family(&self) -> Option<super::strategies::StrategyFamily> {
        self.active.as_ref().map(|a| a.strategy.family())
    }

    /// 捕获帧的设备侧纹理句柄（若有）
    pub fn captured_texture(&self) -> Option<super::surface::TextureSlot> {
        self.active
            .as_ref()
            .and_then(|a| a.captured.as_ref())
            .and_then(|frame| frame.texture_slot())
    }

    /// 存活的捕获帧数量（泄漏检测钩子）
    pub fn live_captures(&self) -> usize {
        self.capture.live_captures()
    }

    /// 状态快照
    pub fn state(&self) -> TransitionState {
        TransitionState {
            phase: self.phase,
            from_view: self.active.as_ref().and_then(|a| a.from.clone()),
            to_view: self.active.as_ref().map(|a| a.to.clone()),
            strategy: self.active.as_ref().map(|a| a.strategy.name()),
            started_at: self.active.as_ref().map(|a| a.started_at),
        }
    }

    /// 导出合成层参数
    ///
    /// 空闲时返回 `None`（无遮罩可画）。
    pub fn overlay_params(&self) -> Option<OverlayParams> {
        self.active.as_ref().map(|active| {
            let mut params = active.strategy.overlay();
            params.has_capture = if active.captured.is_some() { 1.0 } else { 0.0 };
            params
        })
    }

    /// 采样当前遮罩（调试/软件合成用）
    pub fn mask_at(&self, u: f32, v: f32) -> Option<f32> {
        self.active.as_ref().map(|a| a.strategy.mask_at(u, v))
    }
}

impl Default for TransitionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransitionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionCoordinator")
            .field("phase", &self.phase)
            .field("strategy", &self.strategy_name())
            .field("live_captures", &self.live_captures())
            .finish()
    }
}
