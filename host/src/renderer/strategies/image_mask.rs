//! # ImageMask 模块
//!
//! 灰度图遮罩：与噪声遮罩共用同一套窗口/合成公式，但逐像素阈值来自
//! 作者预制的遮罩图亮度——确定的、内容导向的显露顺序，而非程序化
//! 随机。暗区先显露；`reversed` 翻转方向。

use image::GrayImage;

use super::{
    OverlayParams, RevealStrategy, StrategyError, StrategyFamily, reveal_from_threshold,
    threshold_window,
};
use crate::renderer::clock::SubPhase;
use crate::renderer::surface::Viewport;
use super::noise_mask::DEFAULT_EDGE_WIDTH;

/// 灰度图遮罩策略
#[derive(Debug, Clone)]
pub struct ImageMask {
    /// 亮度阈值场（归一化到 [0,1]，行优先）
    luma: Vec<f32>,
    /// 遮罩图宽度
    mask_width: u32,
    /// 遮罩图高度
    mask_height: u32,
    /// 是否反转亮度
    reversed: bool,
    /// 边缘宽度系数
    edge_width: f32,
    /// 是否请求采集旧帧
    wants_capture: bool,
    sub_phase: SubPhase,
    viewport: Viewport,
    progress: f32,
}

impl ImageMask {
    /// 从内存中的灰度图创建
    pub fn from_gray(mask: &GrayImage, reversed: bool) -> Self {
        let luma = mask.pixels().map(|p| p.0[0] as f32 / 255.0).collect();
        Self {
            luma,
            mask_width: mask.width(),
            mask_height: mask.height(),
            reversed,
            edge_width: DEFAULT_EDGE_WIDTH,
            wants_capture: true,
            sub_phase: SubPhase::Cover,
            viewport: Viewport::new(1, 1),
            progress: 0.0,
        }
    }

    /// 从文件加载遮罩图
    ///
    /// 彩色图按亮度转灰度。加载失败返回
    /// [`StrategyError::AssetMissing`]，由 resolver 决定降级。
    pub fn load(path: &str, reversed: bool) -> Result<Self, StrategyError> {
        let mask = image::open(path)
            .map_err(|e| StrategyError::AssetMissing {
                path: path.to_string(),
                message: e.to_string(),
            })?
            .to_luma8();

        if mask.width() == 0 || mask.height() == 0 {
            return Err(StrategyError::AssetMissing {
                path: path.to_string(),
                message: "遮罩图尺寸为空".to_string(),
            });
        }

        Ok(Self::from_gray(&mask, reversed))
    }

    /// 设置边缘宽度系数
    pub fn with_edge_width(mut self, edge_width: f32) -> Self {
        self.edge_width = edge_width.max(0.0);
        self
    }

    /// 不采集旧帧，改为对遮蔽色混合
    pub fn captureless(mut self) -> Self {
        self.wants_capture = false;
        self
    }

    /// 最近邻采样遮罩亮度
    fn threshold_at(&self, u: f32, v: f32) -> f32 {
        let x = (u.clamp(0.0, 1.0) * (self.mask_width - 1) as f32).round() as usize;
        let y = (v.clamp(0.0, 1.0) * (self.mask_height - 1) as f32).round() as usize;
        let value = self.luma[y * self.mask_width as usize + x];
        if self.reversed { 1.0 - value } else { value }
    }
}

impl RevealStrategy for ImageMask {
    fn family(&self) -> StrategyFamily {
        StrategyFamily::Image
    }

    fn name(&self) -> &'static str {
        "image"
    }

    fn needs_capture(&self) -> bool {
        self.wants_capture
    }

    fn begin(&mut self, sub_phase: SubPhase, viewport: Viewport) {
        self.sub_phase = sub_phase;
        self.viewport = viewport;
        self.progress = 0.0;
    }

    fn advance(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    fn is_fully_revealed(&self) -> bool {
        self.progress >= 1.0
    }

    fn mask_at(&self, u: f32, v: f32) -> f32 {
        reveal_from_threshold(
            self.threshold_at(u, v),
            threshold_window(self.progress, self.edge_width),
        )
    }

    fn overlay(&self) -> OverlayParams {
        let window = threshold_window(self.progress, self.edge_width);
        OverlayParams {
            resolution: [self.viewport.width as f32, self.viewport.height as f32],
            progress: self.progress,
            covering: if self.sub_phase == SubPhase::Cover { 1.0 } else { 0.0 },
            window: [window.0, window.1],
            reversed: if self.reversed { 1.0 } else { 0.0 },
            ..Default::default()
        }
    }
}
