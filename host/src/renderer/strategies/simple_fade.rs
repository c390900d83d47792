//! # SimpleFade 模块
//!
//! 纯透明度渐变：没有空间遮罩，整屏按缓动曲线统一变化。
//! 不需要任何帧采集，是降级链最后的兜底策略。

use super::{OverlayParams, RevealStrategy, StrategyFamily};
use crate::renderer::clock::SubPhase;
use crate::renderer::easing::EasingFunction;
use crate::renderer::surface::Viewport;

/// 纯渐变策略
#[derive(Debug, Clone)]
pub struct SimpleFade {
    easing: EasingFunction,
    sub_phase: SubPhase,
    viewport: Viewport,
    progress: f32,
}

impl SimpleFade {
    /// 创建纯渐变策略
    pub fn new(easing: EasingFunction) -> Self {
        Self {
            easing,
            sub_phase: SubPhase::Cover,
            viewport: Viewport::new(1, 1),
            progress: 0.0,
        }
    }
}

impl Default for SimpleFade {
    fn default() -> Self {
        Self::new(EasingFunction::default())
    }
}

impl RevealStrategy for SimpleFade {
    fn family(&self) -> StrategyFamily {
        StrategyFamily::Fade
    }

    fn name(&self) -> &'static str {
        "fade"
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

    fn mask_at(&self, _u: f32, _v: f32) -> f32 {
        self.easing.apply(self.progress)
    }

    fn overlay(&self) -> OverlayParams {
        OverlayParams {
            resolution: [self.viewport.width as f32, self.viewport.height as f32],
            progress: self.easing.apply(self.progress),
            covering: if self.sub_phase == SubPhase::Cover { 1.0 } else { 0.0 },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_across_space() {
        let mut fade = SimpleFade::default();
        fade.begin(SubPhase::Cover, Viewport::new(1280, 720));
        fade.advance(0.37);

        let a = fade.mask_at(0.0, 0.0);
        let b = fade.mask_at(0.5, 0.5);
        let c = fade.mask_at(1.0, 1.0);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_saturates_at_one() {
        let mut fade = SimpleFade::default();
        fade.begin(SubPhase::Reveal, Viewport::new(100, 100));

        fade.advance(0.5);
        assert!(!fade.is_fully_revealed());

        fade.advance(1.0);
        assert!(fade.is_fully_revealed());
        assert!((fade.mask_at(0.3, 0.7) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_capture_needed() {
        assert!(!SimpleFade::default().needs_capture());
    }

    #[test]
    fn test_easing_applied() {
        let mut fade = SimpleFade::new(EasingFunction::EaseInQuad);
        fade.begin(SubPhase::Cover, Viewport::new(100, 100));
        fade.advance(0.5);
        // t^2 在 0.5 处应为 0.25
        assert!((fade.mask_at(0.0, 0.0) - 0.25).abs() < 1e-6);
    }
}
