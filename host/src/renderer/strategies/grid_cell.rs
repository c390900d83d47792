//! # GridCell 模块
//!
//! 网格擦除策略：把视口划分为边长 `cell_size` 的均匀网格，每个
//! 单元格按它到径向中心的距离错峰启动自己的透明度动画，形成阶梯状
//! 的"擦除"效果。
//!
//! ## 错峰方向
//!
//! - 遮蔽子阶段：延迟与距离**成反比**——外圈先动，遮蔽向内收拢
//! - 显露子阶段：延迟与距离**成正比**——内圈先动，显露向外扩散
//!
//! 距离用视口对角线半长归一化到 [0,1]；正好落在中心的单元格距离
//! 自然饱和到 0，无需特判。

use stage_runtime::RevealConfig;

use super::{OverlayParams, RevealStrategy, StrategyFamily};
use crate::renderer::clock::SubPhase;
use crate::renderer::easing::EasingFunction;
use crate::renderer::surface::Viewport;

/// 网格擦除策略
#[derive(Debug, Clone)]
pub struct GridCell {
    cell_size: f32,
    center: [f32; 2],
    in_duration_ms: f32,
    out_duration_ms: f32,
    delay_span_ms: f32,
    easing: EasingFunction,
    sub_phase: SubPhase,
    viewport: Viewport,
    /// 网格列数
    cols: u32,
    /// 网格行数
    rows: u32,
    /// 每个单元格的启动延迟（毫秒，行优先）
    delays_ms: Vec<f32>,
    /// 最大启动延迟（毫秒）
    max_delay_ms: f32,
    /// 子阶段内已经过的时间（毫秒，由进度映射得到）
    elapsed_ms: f32,
    progress: f32,
}

impl GridCell {
    /// 从转场配置创建
    pub fn from_config(config: &RevealConfig) -> Self {
        Self {
            cell_size: config.cell_size.max(1.0),
            center: config.center,
            in_duration_ms: config.in_duration_ms,
            out_duration_ms: config.out_duration_ms,
            delay_span_ms: config.delay_span_ms,
            easing: config.easing.into(),
            sub_phase: SubPhase::Cover,
            viewport: Viewport::new(1, 1),
            cols: 1,
            rows: 1,
            delays_ms: vec![0.0],
            max_delay_ms: 0.0,
            elapsed_ms: 0.0,
            progress: 0.0,
        }
    }

    /// 当前子阶段中单个单元格的动画时长（毫秒）
    fn duration_ms(&self) -> f32 {
        match self.sub_phase {
            SubPhase::Cover => self.in_duration_ms,
            SubPhase::Reveal => self.out_duration_ms,
        }
    }

    /// 当前子阶段的墙钟跨度（毫秒）
    fn span_ms(&self) -> f32 {
        self.duration_ms() + self.delay_span_ms
    }

    /// 网格尺寸（列, 行）
    pub fn grid_size(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// 重建网格与每个单元格的延迟表
    fn rebuild(&mut self) {
        let width = self.viewport.width.max(1) as f32;
        let height = self.viewport.height.max(1) as f32;
        self.cols = (width / self.cell_size).ceil().max(1.0) as u32;
        self.rows = (height / self.cell_size).ceil().max(1.0) as u32;

        let center_px = [self.center[0] * width, self.center[1] * height];
        let half_diagonal = self.viewport.half_diagonal();

        self.delays_ms = Vec::with_capacity((self.cols * self.rows) as usize);
        self.max_delay_ms = 0.0;

        for row in 0..self.rows {
            for col in 0..self.cols {
                let cx = (col as f32 + 0.5) * self.cell_size;
                let cy = (row as f32 + 0.5) * self.cell_size;
                let dx = cx - center_px[0];
                let dy = cy - center_px[1];
                let distance = ((dx * dx + dy * dy).sqrt() / half_diagonal).clamp(0.0, 1.0);

                let staggering = match self.sub_phase {
                    SubPhase::Cover => 1.0 - distance,
                    SubPhase::Reveal => distance,
                };
                let delay = (staggering * self.delay_span_ms).round();
                self.max_delay_ms = self.max_delay_ms.max(delay);
                self.delays_ms.push(delay);
            }
        }
    }

    /// 指定单元格当前的动画完成度
    fn cell_alpha(&self, col: u32, row: u32) -> f32 {
        let delay = self.delays_ms[(row * self.cols + col) as usize];
        let duration = self.duration_ms();
        let local = if duration <= 0.0 {
            if self.elapsed_ms >= delay { 1.0 } else { 0.0 }
        } else {
            ((self.elapsed_ms - delay) / duration).clamp(0.0, 1.0)
        };
        self.easing.apply(local)
    }
}

impl RevealStrategy for GridCell {
    fn family(&self) -> StrategyFamily {
        StrategyFamily::Grid
    }

    fn name(&self) -> &'static str {
        "grid"
    }

    fn begin(&mut self, sub_phase: SubPhase, viewport: Viewport) {
        self.sub_phase = sub_phase;
        self.viewport = viewport;
        self.elapsed_ms = 0.0;
        self.progress = 0.0;
        self.rebuild();
    }

    fn advance(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
        self.elapsed_ms = self.progress * self.span_ms();
    }

    fn is_fully_revealed(&self) -> bool {
        // 跨度 = duration + delay_span >= 任意单元格的 delay + duration，
        // 因此进度走满时必然全部饱和；这里按实际延迟表判定
        self.elapsed_ms + 1e-3 >= self.max_delay_ms + self.duration_ms()
    }

    fn mask_at(&self, u: f32, v: f32) -> f32 {
        let px = u.clamp(0.0, 1.0) * self.viewport.width.max(1) as f32;
        let py = v.clamp(0.0, 1.0) * self.viewport.height.max(1) as f32;
        let col = ((px / self.cell_size) as u32).min(self.cols - 1);
        let row = ((py / self.cell_size) as u32).min(self.rows - 1);
        self.cell_alpha(col, row)
    }

    fn overlay(&self) -> OverlayParams {
        OverlayParams {
            resolution: [self.viewport.width as f32, self.viewport.height as f32],
            progress: self.progress,
            covering: if self.sub_phase == SubPhase::Cover { 1.0 } else { 0.0 },
            center: self.center,
            cell_size: self.cell_size,
            duration: self.duration_ms() / 1000.0,
            delay_span: self.delay_span_ms / 1000.0,
            ..Default::default()
        }
    }
}
