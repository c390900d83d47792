//! # Host 层
//!
//! 转场编排引擎的宿主层实现。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 转场协调（阶段状态机、互斥、看门狗）
//! - 帧采集与捕获资源管理
//! - 显露策略（噪声遮罩 / 灰度图遮罩 / 网格擦除 / 纯渐变）
//! - wgpu 遮罩合成
//! - 把协调器阶段同步到应用状态
//!
//! Host 层不包含视图内容本身：视图通过 [`StageHooks`] 回调在
//! 中间点挂载，引擎只保证时序与互斥。

pub mod app;
pub mod renderer;

pub use renderer::{
    CaptureError, CapturedFrame, ColorSpace, EasingFunction, FrameCapture, FrameSource,
    MaskPass, OverlayParams, ProgressClock, Renderer, RevealStrategy, SoftwareSurface,
    StageHooks, StrategyError, StrategyFamily, SubPhase, TransitionCoordinator,
    TransitionPhase, TransitionState, Viewport, Watchdog, WatchdogEvent, WgpuFrameSource,
};
pub use renderer::{GridCell, ImageMask, NoiseMask, SimpleFade};

pub use app::{StageSync, drive_transition, request_view_switch};
