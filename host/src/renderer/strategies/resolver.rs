//! # Strategy Resolver
//!
//! 将 `stage_runtime::TransitionSpec` 解析为可执行的显露策略与配置。
//!
//! 这是 TransitionSpec → 策略 的**唯一转换入口**。
//! 所有参数提取、校验、默认值填充、资源降级都在这里完成；
//! 协调器拿到的永远是一个可以直接运行的策略。
//!
//! ## 效果名称映射（大小写不敏感）
//!
//! | 名称 | 策略 | 说明 |
//! |------|------|------|
//! | `noise` | [`NoiseMask`] | 程序化噪声遮罩 |
//! | `image` / `mask` | [`ImageMask`] | 灰度图遮罩；图加载失败降级为 noise |
//! | `grid` | [`GridCell`] | 径向错峰网格擦除 |
//! | `fade` | [`SimpleFade`] | 纯渐变 |
//! | 其他 | [`SimpleFade`]（降级） | 未知名称降级为 fade |
//!
//! ## 参数
//!
//! 通用（命名）：`duration`（同时设置 in/out）、`in`、`out`、`delay`、
//! `cell`、`center_u`、`center_v`、`easing`。
//! 噪声：`edge`、`scale`、`seed`、`capture`。
//! 图片：`mask`（命名或位置 0）、`reversed`、`edge`、`capture`。

use stage_runtime::{EasingKind, RevealConfig, TransitionSpec};
use tracing::warn;

use super::{GridCell, ImageMask, NoiseMask, RevealStrategy, SimpleFade};
use crate::renderer::easing::EasingFunction;

/// 解析完成的转场
///
/// 策略与配置一起返回：配置决定子阶段跨度，策略决定画面。
pub struct ResolvedTransition {
    /// 选定（可能已降级）的策略
    pub strategy: Box<dyn RevealStrategy>,
    /// 填充默认值并通过校验的配置
    pub config: RevealConfig,
}

/// 解析缓动名称
fn parse_easing(name: &str) -> Option<EasingKind> {
    match name.to_lowercase().as_str() {
        "linear" => Some(EasingKind::Linear),
        "ease_in" | "easein" => Some(EasingKind::EaseIn),
        "ease_out" | "easeout" => Some(EasingKind::EaseOut),
        "ease_in_out" | "easeinout" => Some(EasingKind::EaseInOut),
        "ease_out_quad" => Some(EasingKind::EaseOutQuad),
        "ease_in_out_quad" => Some(EasingKind::EaseInOutQuad),
        _ => None,
    }
}

/// 从 spec 参数构造配置
///
/// 非法值不会让转场失败：整体回退到默认配置并记录日志。
fn resolve_config(spec: &TransitionSpec) -> RevealConfig {
    let mut config = RevealConfig::default();

    if let Some(duration) = spec.get_number("duration", 0) {
        config.in_duration_ms = duration;
        config.out_duration_ms = duration;
    }
    if let Some(value) = spec.get_number("in", usize::MAX) {
        config.in_duration_ms = value;
    }
    if let Some(value) = spec.get_number("out", usize::MAX) {
        config.out_duration_ms = value;
    }
    if let Some(value) = spec.get_number("delay", usize::MAX) {
        config.delay_span_ms = value;
    }
    if let Some(value) = spec.get_number("cell", usize::MAX) {
        config.cell_size = value;
    }
    if let Some(u) = spec.get_number("center_u", usize::MAX) {
        config.center[0] = u;
    }
    if let Some(v) = spec.get_number("center_v", usize::MAX) {
        config.center[1] = v;
    }
    if let Some(name) = spec.get_text("easing", usize::MAX) {
        match parse_easing(name) {
            Some(kind) => config.easing = kind,
            None => warn!(easing = %name, "未知缓动名称，保持默认"),
        }
    }

    match config.validated() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "转场配置非法，回退到默认配置");
            RevealConfig::default()
        }
    }
}

/// 按参数构造噪声遮罩
fn build_noise(spec: &TransitionSpec) -> NoiseMask {
    let mut noise = NoiseMask::new();
    if let Some(edge) = spec.get_number("edge", usize::MAX) {
        noise = noise.with_edge_width(edge);
    }
    if let Some(scale) = spec.get_number("scale", usize::MAX) {
        noise = noise.with_scale(scale);
    }
    if let Some(seed) = spec.get_number("seed", usize::MAX) {
        noise = noise.with_seed(seed.max(0.0) as u32);
    }
    if spec.get_flag("capture", usize::MAX) == Some(false) {
        noise = noise.captureless();
    }
    noise
}

/// 将 `TransitionSpec` 解析为可执行转场
///
/// 这是策略解析的**唯一入口**，永远成功：未知名称与缺失资源都在
/// 这里降级，不会向调用方抛出错误。
pub fn resolve(spec: &TransitionSpec) -> ResolvedTransition {
    let config = resolve_config(spec);
    let name_lower = spec.name.to_lowercase();

    let strategy: Box<dyn RevealStrategy> = match name_lower.as_str() {
        "noise" => Box::new(build_noise(spec)),

        "image" | "mask" => {
            let path = spec.get_text("mask", 0).unwrap_or_default();
            let reversed = spec.get_flag("reversed", usize::MAX).unwrap_or(false);

            match ImageMask::load(path, reversed) {
                Ok(mut mask) => {
                    if let Some(edge) = spec.get_number("edge", usize::MAX) {
                        mask = mask.with_edge_width(edge);
                    }
                    if spec.get_flag("capture", usize::MAX) == Some(false) {
                        mask = mask.captureless();
                    }
                    Box::new(mask)
                }
                Err(e) => {
                    warn!(error = %e, "遮罩图不可用，降级为 noise");
                    Box::new(build_noise(spec))
                }
            }
        }

        "grid" => Box::new(GridCell::from_config(&config)),

        "fade" => Box::new(SimpleFade::new(EasingFunction::from(config.easing))),

        _ => {
            warn!(name = %spec.name, "未知效果名，降级为 fade");
            Box::new(SimpleFade::new(EasingFunction::from(config.easing)))
        }
    };

    ResolvedTransition { strategy, config }
}
