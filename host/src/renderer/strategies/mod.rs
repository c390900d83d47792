//! # Strategies 模块
//!
//! 显露策略：把标量进度变成逐像素/逐单元格的显露量。
//!
//! 四种策略共享同一调用契约（[`RevealStrategy`]），在
//! `start_transition` 时由 resolver 选定，协调器对具体算法一无所知：
//!
//! - [`NoiseMask`]：程序化多八度噪声遮罩
//! - [`ImageMask`]：作者预制的灰度图遮罩
//! - [`GridCell`]：径向错峰的网格擦除
//! - [`SimpleFade`]：纯透明度渐变（最后的兜底）
//!
//! ## 遮罩语义
//!
//! `mask_at(u, v)` 返回当前点在**当前子阶段内**的完成度：
//! 遮蔽子阶段中 1.0 表示完全被盖住，显露子阶段中 1.0 表示完全显露。
//! 子阶段方向的解释（盖住什么、露出什么）属于合成层，不属于策略。

mod grid_cell;
mod image_mask;
mod noise_mask;
pub mod resolver;
mod simple_fade;

pub use grid_cell::GridCell;
pub use image_mask::ImageMask;
pub use noise_mask::NoiseMask;
pub use simple_fade::SimpleFade;

use thiserror::Error;

use super::clock::SubPhase;
use super::surface::Viewport;

/// 策略资源错误
#[derive(Error, Debug)]
pub enum StrategyError {
    /// 策略依赖的资源缺失（例如遮罩图未能加载）
    #[error("策略资源缺失: {path} - {message}")]
    AssetMissing {
        /// 资源路径
        path: String,
        /// 错误消息
        message: String,
    },
}

/// 策略家族（合成层据此选择渲染管线）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyFamily {
    /// 程序化噪声遮罩
    Noise,
    /// 灰度图遮罩
    Image,
    /// 网格擦除
    Grid,
    /// 纯渐变
    Fade,
}

/// 合成层 uniform 参数
///
/// 所有策略家族共用一个 uniform 布局（64 字节，16 字节对齐），
/// 未用到的字段保持 0。
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OverlayParams {
    /// 视口像素尺寸
    pub resolution: [f32; 2],
    /// 子阶段进度 (0.0 - 1.0)
    pub progress: f32,
    /// 1.0 = 遮蔽子阶段，0.0 = 显露子阶段
    pub covering: f32,
    /// 径向中心（归一化 UV）
    pub center: [f32; 2],
    /// smoothstep 窗口 [lower, upper]（噪声/图片遮罩）
    pub window: [f32; 2],
    /// 网格单元格边长（像素）
    pub cell_size: f32,
    /// 单元格自身动画时长（秒）
    pub duration: f32,
    /// 错峰延迟跨度（秒）
    pub delay_span: f32,
    /// 噪声时间（随进度演化）
    pub time: f32,
    /// 1.0 = 反转遮罩亮度
    pub reversed: f32,
    /// 1.0 = 有旧帧纹理可供混合（协调器填写）
    pub has_capture: f32,
    /// 噪声频率
    pub scale: f32,
    /// 噪声种子
    pub seed: f32,
}

impl Default for OverlayParams {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

/// 显露策略
///
/// 核心契约只有两件事：`advance(progress)` 接收子阶段进度、
/// `is_fully_revealed()` 报告是否饱和。其余方法是协调器与合成层
/// 需要的能力查询。
pub trait RevealStrategy {
    /// 策略家族
    fn family(&self) -> StrategyFamily;

    /// 策略名称（日志用）
    fn name(&self) -> &'static str;

    /// 是否需要采集"旧帧"用于交叉混合
    fn needs_capture(&self) -> bool {
        false
    }

    /// 开始一个子阶段
    ///
    /// 重置内部进度并按视口重建空间数据（如网格划分）。
    fn begin(&mut self, sub_phase: SubPhase, viewport: Viewport);

    /// 接收子阶段进度（由协调器每个渲染 tick 喂入）
    fn advance(&mut self, progress: f32);

    /// 当前子阶段是否已对所有点饱和
    fn is_fully_revealed(&self) -> bool;

    /// 采样 (u, v) 处的遮罩值（当前子阶段完成度，0.0 - 1.0）
    fn mask_at(&self, u: f32, v: f32) -> f32;

    /// 导出合成层 uniform 参数
    fn overlay(&self) -> OverlayParams;
}

/// Hermite 平滑阶梯（与 WGSL 内建 `smoothstep` 同义）
pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// 由进度导出显露边界的 smoothstep 窗口 `[lower, upper]`
///
/// 半宽随进度增长（`0.03 + edge_width·p`，截断到 `[0, 0.5]`）：
/// 开始时边界锐利，结束时柔和。窗口中心的推移范围覆盖
/// `[-w, 1 + w]`，保证 p = 0 时全域未显露、p = 1 时全域显露，
/// 与阈值场的取值范围 [0,1] 无关。
pub(crate) fn threshold_window(progress: f32, edge_width: f32) -> (f32, f32) {
    let p = progress.clamp(0.0, 1.0);
    let w = (0.03 + edge_width * p).clamp(0.0, 0.5);
    let center = p * (1.0 + 2.0 * w) - w;
    (center - w, center + w)
}

/// 以阈值场的值与当前窗口计算显露量
///
/// 阈值低的点先显露；`smoothstep` 提供柔和边缘。
pub(crate) fn reveal_from_threshold(threshold: f32, window: (f32, f32)) -> f32 {
    1.0 - smoothstep(window.0, window.1, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 1.0), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_window_saturates_at_progress_one() {
        // p = 1 时窗口下沿恰好到达 1.0：任何阈值 <= 1 都完全显露
        for edge_width in [0.0, 0.2, 0.35, 1.0] {
            let window = threshold_window(1.0, edge_width);
            assert!(window.0 >= 1.0 - 1e-6, "edge_width={}", edge_width);
            for threshold in [0.0, 0.25, 0.5, 0.99, 1.0] {
                assert!(
                    (reveal_from_threshold(threshold, window) - 1.0).abs() < 1e-6,
                    "threshold={} 未饱和",
                    threshold
                );
            }
        }
    }

    #[test]
    fn test_window_closed_at_progress_zero() {
        let window = threshold_window(0.0, 0.35);
        assert!(window.1 <= 1e-6);
        for threshold in [0.0, 0.5, 1.0] {
            assert!(reveal_from_threshold(threshold, window) < 1e-6);
        }
    }

    #[test]
    fn test_half_width_clamped() {
        // edge_width 很大时半宽也不超过 0.5
        let (lower, upper) = threshold_window(0.6, 10.0);
        assert!((upper - lower) / 2.0 <= 0.5 + 1e-6);
    }

    #[test]
    fn test_lower_thresholds_reveal_first() {
        let window = threshold_window(0.5, 0.35);
        let dark = reveal_from_threshold(0.1, window);
        let bright = reveal_from_threshold(0.9, window);
        assert!(dark >= bright);
    }

    #[test]
    fn test_overlay_params_layout() {
        // uniform 布局必须保持 16 字节对齐的 64 字节
        assert_eq!(std::mem::size_of::<OverlayParams>(), 64);
    }
}
