//! # Easing 模块
//!
//! 缓动函数库，用于子阶段进度与单元格透明度的时间插值。

use std::f32::consts::PI;

use stage_runtime::EasingKind;

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EasingFunction {
    /// 线性（匀速）
    Linear,
    /// 缓入（先慢后快）
    EaseIn,
    /// 缓出（先快后慢）
    EaseOut,
    /// 缓入缓出（两头慢中间快）
    #[default]
    EaseInOut,
    /// 二次缓入
    EaseInQuad,
    /// 二次缓出
    EaseOutQuad,
    /// 二次缓入缓出
    EaseInOutQuad,
    /// 正弦缓入
    EaseInSine,
    /// 正弦缓出
    EaseOutSine,
    /// 正弦缓入缓出
    EaseInOutSine,
}

impl EasingFunction {
    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)
    ///
    /// # 返回
    /// - 缓动后的进度值 (0.0 - 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseIn => t * t * t,
            EasingFunction::EaseOut => 1.0 - (1.0 - t).powi(3),
            EasingFunction::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            EasingFunction::EaseInQuad => t * t,
            EasingFunction::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EasingFunction::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            EasingFunction::EaseOutSine => (t * PI / 2.0).sin(),
            EasingFunction::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
        }
    }
}

impl From<EasingKind> for EasingFunction {
    /// 从声明式名称映射到具体曲线
    fn from(kind: EasingKind) -> Self {
        match kind {
            EasingKind::Linear => EasingFunction::Linear,
            EasingKind::EaseIn => EasingFunction::EaseIn,
            EasingKind::EaseOut => EasingFunction::EaseOut,
            EasingKind::EaseInOut => EasingFunction::EaseInOut,
            EasingKind::EaseOutQuad => EasingFunction::EaseOutQuad,
            EasingKind::EaseInOutQuad => EasingFunction::EaseInOutQuad,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let easing = EasingFunction::Linear;
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(0.5), 0.5);
        assert_eq!(easing.apply(1.0), 1.0);
    }

    #[test]
    fn test_endpoints_for_all_curves() {
        // 所有曲线都必须精确通过 (0,0) 和 (1,1)，否则遮罩无法完全闭合/显露
        let curves = [
            EasingFunction::Linear,
            EasingFunction::EaseIn,
            EasingFunction::EaseOut,
            EasingFunction::EaseInOut,
            EasingFunction::EaseInQuad,
            EasingFunction::EaseOutQuad,
            EasingFunction::EaseInOutQuad,
            EasingFunction::EaseInSine,
            EasingFunction::EaseOutSine,
            EasingFunction::EaseInOutSine,
        ];
        for curve in curves {
            assert!(curve.apply(0.0).abs() < 1e-6, "{:?} 起点不为 0", curve);
            assert!((curve.apply(1.0) - 1.0).abs() < 1e-6, "{:?} 终点不为 1", curve);
        }
    }

    #[test]
    fn test_ease_in_out_midpoint() {
        let easing = EasingFunction::EaseInOut;
        // 中点应该是 0.5
        let mid = easing.apply(0.5);
        assert!((mid - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_clamp() {
        let easing = EasingFunction::Linear;
        // 超出范围应该被限制
        assert_eq!(easing.apply(-0.5), 0.0);
        assert_eq!(easing.apply(1.5), 1.0);
    }

    #[test]
    fn test_from_kind() {
        assert_eq!(
            EasingFunction::from(EasingKind::Linear),
            EasingFunction::Linear
        );
        assert_eq!(
            EasingFunction::from(EasingKind::EaseInOut),
            EasingFunction::EaseInOut
        );
        assert_eq!(
            EasingFunction::from(EasingKind::EaseOutQuad),
            EasingFunction::EaseOutQuad
        );
    }
}
