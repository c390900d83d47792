//! # Renderer 模块
//!
//! 转场编排引擎的渲染侧：协调器、显露策略、帧采集、看门狗与
//! wgpu 合成通道。
//!
//! ## 分层
//!
//! 1. 纯逻辑层（协调器 / 策略 / 时钟 / 看门狗）——每个渲染 tick
//!    驱动，完全可以在没有 GPU 的环境下运行与测试
//! 2. 表面边界（[`FrameSource`]）——引擎采集旧帧的唯一通道
//! 3. 合成层（[`MaskPass`]）——把遮罩参数画到屏幕上，仅 wgpu 宿主
//!    需要

pub mod capture;
pub mod clock;
pub mod coordinator;
pub mod easing;
pub mod gpu;
pub mod mask_pass;
pub mod strategies;
pub mod surface;
pub mod watchdog;

pub use capture::{CaptureError, CapturedFrame, ColorSpace, FrameCapture, FrameData};
pub use clock::{ProgressClock, SubPhase};
pub use coordinator::{StageHooks, TransitionCoordinator, TransitionPhase, TransitionState};
pub use easing::EasingFunction;
pub use gpu::{WgpuFrameSource, create_headless_device};
pub use mask_pass::MaskPass;
pub use strategies::resolver::{ResolvedTransition, resolve};
pub use strategies::{
    GridCell, ImageMask, NoiseMask, OverlayParams, RevealStrategy, SimpleFade, StrategyError,
    StrategyFamily,
};
pub use surface::{FrameSource, PixelFrame, SoftwareSurface, TextureSlot, Viewport};
pub use watchdog::{PHASE_SLACK_SECS, Watchdog, WatchdogEvent};

use stage_runtime::{TransitionSpec, ViewId};

/// 渲染器
///
/// 协调器加上可选的 wgpu 合成通道。headless 宿主只用前者；
/// 窗口宿主在拿到设备后调用 [`init_gpu`](Renderer::init_gpu)。
pub struct Renderer {
    /// 转场协调器
    pub coordinator: TransitionCoordinator,
    /// wgpu 合成通道（headless 模式下为 None）
    mask_pass: Option<MaskPass>,
}

impl Renderer {
    /// 创建 headless 渲染器
    pub fn new() -> Self {
        Self {
            coordinator: TransitionCoordinator::new(),
            mask_pass: None,
        }
    }

    /// 初始化 GPU 合成资源
    ///
    /// 必须在设备可用之后调用一次。
    pub fn init_gpu(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
    ) {
        self.mask_pass = Some(MaskPass::new(device, queue, format));
    }

    /// 请求开始一次转场（透传协调器）
    pub fn start_transition(
        &mut self,
        target: ViewId,
        spec: &TransitionSpec,
        viewport: Viewport,
        hooks: &mut dyn StageHooks,
    ) -> bool {
        self.coordinator
            .start_transition(target, spec, viewport, hooks)
    }

    /// 每渲染 tick 推进转场
    pub fn update(&mut self, dt: f32, surface: &mut dyn FrameSource, hooks: &mut dyn StageHooks) {
        self.coordinator.tick(dt, surface, hooks);
    }

    /// 是否有活跃转场
    pub fn is_transition_active(&self) -> bool {
        self.coordinator.is_active()
    }

    /// 录制遮罩覆盖画面
    ///
    /// 空闲、或 GPU 资源未初始化时不录制任何内容，返回 `false`。
    /// 捕获帧以设备侧纹理持有时，由调用方通过
    /// [`WgpuFrameSource::texture_view`] 取视图传入 `old_view`。
    #[allow(clippy::too_many_arguments)]
    pub fn render_overlay(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        live_view: &wgpu::TextureView,
        old_view: Option<&wgpu::TextureView>,
        mask_view: Option<&wgpu::TextureView>,
    ) -> bool {
        let (Some(pass), Some(params), Some(family)) = (
            self.mask_pass.as_ref(),
            self.coordinator.overlay_params(),
            self.coordinator.strategy_family(),
        ) else {
            return false;
        };

        pass.render(
            device, queue, encoder, target, live_view, old_view, mask_view, family, params,
        );
        true
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("coordinator", &self.coordinator)
            .field("gpu_ready", &self.mask_pass.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_renderer_runs_transition() {
        let mut renderer = Renderer::new();
        let mut surface = SoftwareSurface::new(640, 360);

        assert!(renderer.start_transition(
            ViewId::new("next"),
            &TransitionSpec::simple("fade"),
            surface.viewport(),
            &mut (),
        ));
        assert!(renderer.is_transition_active());

        for _ in 0..1000 {
            if !renderer.is_transition_active() {
                break;
            }
            renderer.update(0.016, &mut surface, &mut ());
        }
        assert!(!renderer.is_transition_active());
    }
}
