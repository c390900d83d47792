//! # NoiseMask 模块
//!
//! 程序化噪声遮罩：逐像素评估多八度、随时间演化的二维值噪声场，
//! 以噪声值为显露阈值。噪声低的区域先显露，形成有机的侵蚀状边界。

use super::{
    OverlayParams, RevealStrategy, StrategyFamily, reveal_from_threshold, threshold_window,
};
use crate::renderer::clock::SubPhase;
use crate::renderer::surface::Viewport;

/// 默认边缘宽度系数
pub const DEFAULT_EDGE_WIDTH: f32 = 0.35;
/// 默认噪声频率（视口短边上的周期数）
pub const DEFAULT_SCALE: f32 = 6.0;
/// 噪声时间随进度演化的速率
const TIME_EVOLVE: f32 = 1.5;
/// 八度数
const OCTAVES: u32 = 4;

/// 整数坐标哈希，输出 [0, 1)
///
/// 纯整数混合，跨平台确定，测试可以依赖逐位一致的结果。
fn hash2(ix: i32, iy: i32, seed: u32) -> f32 {
    let mut h = (ix as u32)
        .wrapping_mul(0x85EB_CA6B)
        .wrapping_add((iy as u32).wrapping_mul(0xC2B2_AE35))
        .wrapping_add(seed.wrapping_mul(0x27D4_EB2F));
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297A_2D39);
    h ^= h >> 15;
    (h & 0x00FF_FFFF) as f32 / 16_777_216.0
}

/// 单八度值噪声，双线性 + Hermite 插值，输出 [0, 1)
fn value_noise(x: f32, y: f32, seed: u32) -> f32 {
    let xi = x.floor();
    let yi = y.floor();
    let xf = x - xi;
    let yf = y - yi;
    let (x0, y0) = (xi as i32, yi as i32);

    let u = xf * xf * (3.0 - 2.0 * xf);
    let v = yf * yf * (3.0 - 2.0 * yf);

    let a = hash2(x0, y0, seed);
    let b = hash2(x0 + 1, y0, seed);
    let c = hash2(x0, y0 + 1, seed);
    let d = hash2(x0 + 1, y0 + 1, seed);

    let ab = a + (b - a) * u;
    let cd = c + (d - c) * u;
    ab + (cd - ab) * v
}

/// 多八度分形噪声，随 `time` 漂移，输出归一化到 [0, 1)
fn fbm(x: f32, y: f32, time: f32, seed: u32) -> f32 {
    let mut sum = 0.0;
    let mut amplitude = 0.5;
    let mut frequency = 1.0;
    let mut total = 0.0;

    for octave in 0..OCTAVES {
        let drift = time * (0.3 + 0.2 * octave as f32);
        sum += amplitude * value_noise(x * frequency + drift, y * frequency - drift * 0.7, seed + octave);
        total += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    sum / total
}

/// 程序化噪声遮罩策略
#[derive(Debug, Clone)]
pub struct NoiseMask {
    /// 边缘宽度系数（窗口半宽 = 0.03 + edge_width·progress）
    edge_width: f32,
    /// 噪声频率
    scale: f32,
    /// 噪声种子
    seed: u32,
    /// 是否请求采集旧帧
    wants_capture: bool,
    sub_phase: SubPhase,
    viewport: Viewport,
    progress: f32,
    /// 噪声时间，由进度派生，保证确定性
    time: f32,
}

impl NoiseMask {
    /// 创建默认参数的噪声遮罩
    pub fn new() -> Self {
        Self {
            edge_width: DEFAULT_EDGE_WIDTH,
            scale: DEFAULT_SCALE,
            seed: 0,
            wants_capture: true,
            sub_phase: SubPhase::Cover,
            viewport: Viewport::new(1, 1),
            progress: 0.0,
            time: 0.0,
        }
    }

    /// 设置边缘宽度系数
    pub fn with_edge_width(mut self, edge_width: f32) -> Self {
        self.edge_width = edge_width.max(0.0);
        self
    }

    /// 设置噪声频率
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale.max(0.01);
        self
    }

    /// 设置噪声种子
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// 不采集旧帧，改为对遮蔽色混合
    pub fn captureless(mut self) -> Self {
        self.wants_capture = false;
        self
    }
}

impl Default for NoiseMask {
    fn default() -> Self {
        Self::new()
    }
}

impl RevealStrategy for NoiseMask {
    fn family(&self) -> StrategyFamily {
        StrategyFamily::Noise
    }

    fn name(&self) -> &'static str {
        "noise"
    }

    fn needs_capture(&self) -> bool {
        self.wants_capture
    }

    fn begin(&mut self, sub_phase: SubPhase, viewport: Viewport) {
        self.sub_phase = sub_phase;
        self.viewport = viewport;
        self.progress = 0.0;
        self.time = 0.0;
    }

    fn advance(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
        // 时间由进度派生而非挂钟，同一进度序列总是产生同一画面
        self.time = self.progress * TIME_EVOLVE;
    }

    fn is_fully_revealed(&self) -> bool {
        // p = 1 时窗口下沿到达 1.0，数学上保证全域饱和
        self.progress >= 1.0
    }

    fn mask_at(&self, u: f32, v: f32) -> f32 {
        let aspect = self.viewport.width as f32 / self.viewport.height.max(1) as f32;
        let n = fbm(u * self.scale * aspect, v * self.scale, self.time, self.seed);
        reveal_from_threshold(n, threshold_window(self.progress, self.edge_width))
    }

    fn overlay(&self) -> OverlayParams {
        let window = threshold_window(self.progress, self.edge_width);
        OverlayParams {
            resolution: [self.viewport.width as f32, self.viewport.height as f32],
            progress: self.progress,
            covering: if self.sub_phase == SubPhase::Cover { 1.0 } else { 0.0 },
            window: [window.0, window.1],
            time: self.time,
            scale: self.scale,
            seed: self.seed as f32,
            ..Default::default()
        }
    }
}
