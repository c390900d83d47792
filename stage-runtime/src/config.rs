//! # Config 模块
//!
//! 转场配置类型：一次转场的全部可调参数。
//!
//! 配置在 `start_transition` 时由调用方提供，在单次转场的生命周期内
//! 不可变。不存在任何持久化配置。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 缓动函数的声明式名称
///
/// 只是跨边界的名称，具体曲线实现由 Host 层的缓动库提供。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingKind {
    /// 线性（匀速）
    Linear,
    /// 缓入
    EaseIn,
    /// 缓出
    EaseOut,
    /// 缓入缓出
    #[default]
    EaseInOut,
    /// 二次缓出
    EaseOutQuad,
    /// 二次缓入缓出
    EaseInOutQuad,
}

/// 转场配置
///
/// 一次转场的全部可调参数。所有字段都有合理默认值，
/// 非法值通过 [`validated`](RevealConfig::validated) 拒绝。
///
/// ## 时长语义
///
/// - `in_duration_ms`：遮蔽子阶段中单个元素（整屏或单元格）的动画时长
/// - `out_duration_ms`：显露子阶段的对应时长
/// - `delay_span_ms`：错峰延迟的总跨度；子阶段的墙钟时长为
///   `duration + delay_span`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// 网格单元格边长（像素）
    pub cell_size: f32,
    /// 遮蔽子阶段时长（毫秒）
    pub in_duration_ms: f32,
    /// 显露子阶段时长（毫秒）
    pub out_duration_ms: f32,
    /// 错峰延迟跨度（毫秒）
    pub delay_span_ms: f32,
    /// 径向中心（归一化 UV 坐标）
    pub center: [f32; 2],
    /// 缓动函数
    pub easing: EasingKind,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            cell_size: 60.0,
            in_duration_ms: 280.0,
            out_duration_ms: 520.0,
            delay_span_ms: 460.0,
            center: [0.5, 0.5],
            easing: EasingKind::default(),
        }
    }
}

impl RevealConfig {
    /// 校验配置
    ///
    /// 成功时返回自身（所有权透传，便于链式调用），失败时返回第一个
    /// 发现的 [`ConfigError`]。
    pub fn validated(self) -> Result<Self, ConfigError> {
        if !(self.cell_size > 0.0) || !self.cell_size.is_finite() {
            return Err(ConfigError::InvalidCellSize {
                value: self.cell_size,
            });
        }
        for (field, value) in [
            ("in_duration_ms", self.in_duration_ms),
            ("out_duration_ms", self.out_duration_ms),
            ("delay_span_ms", self.delay_span_ms),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::InvalidDuration { field, value });
            }
        }
        let [u, v] = self.center;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return Err(ConfigError::InvalidCenter { u, v });
        }
        Ok(self)
    }

    /// 遮蔽子阶段的墙钟跨度（毫秒）
    pub fn cover_span_ms(&self) -> f32 {
        self.in_duration_ms + self.delay_span_ms
    }

    /// 显露子阶段的墙钟跨度（毫秒）
    pub fn reveal_span_ms(&self) -> f32 {
        self.out_duration_ms + self.delay_span_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RevealConfig::default();
        assert_eq!(config.cell_size, 60.0);
        assert_eq!(config.in_duration_ms, 280.0);
        assert_eq!(config.out_duration_ms, 520.0);
        assert_eq!(config.delay_span_ms, 460.0);
        assert_eq!(config.center, [0.5, 0.5]);
        assert_eq!(config.easing, EasingKind::EaseInOut);

        // 默认配置必须通过校验
        assert!(config.validated().is_ok());
    }

    #[test]
    fn test_span_helpers() {
        let config = RevealConfig::default();
        assert_eq!(config.cover_span_ms(), 740.0);
        assert_eq!(config.reveal_span_ms(), 980.0);
    }

    #[test]
    fn test_invalid_cell_size() {
        let config = RevealConfig {
            cell_size: 0.0,
            ..Default::default()
        };
        assert_eq!(
            config.validated(),
            Err(ConfigError::InvalidCellSize { value: 0.0 })
        );

        let config = RevealConfig {
            cell_size: f32::NAN,
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_invalid_duration() {
        let config = RevealConfig {
            in_duration_ms: -1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validated(),
            Err(ConfigError::InvalidDuration {
                field: "in_duration_ms",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_invalid_center() {
        let config = RevealConfig {
            center: [1.5, 0.5],
            ..Default::default()
        };
        assert!(matches!(
            config.validated(),
            Err(ConfigError::InvalidCenter { .. })
        ));
    }

    #[test]
    fn test_zero_durations_are_legal() {
        // 零时长合法：表示立即完成的子阶段
        let config = RevealConfig {
            in_duration_ms: 0.0,
            out_duration_ms: 0.0,
            delay_span_ms: 0.0,
            ..Default::default()
        };
        assert!(config.validated().is_ok());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = RevealConfig {
            cell_size: 48.0,
            center: [0.2, 0.8],
            easing: EasingKind::EaseOutQuad,
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: RevealConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        // easing 使用 snake_case 名称
        assert!(json.contains("\"ease_out_quad\""));
    }

    #[test]
    fn test_serde_partial_fills_defaults() {
        // 缺失字段由默认值补齐
        let config: RevealConfig = serde_json::from_str(r#"{"cell_size": 80.0}"#).unwrap();
        assert_eq!(config.cell_size, 80.0);
        assert_eq!(config.in_duration_ms, 280.0);
        assert_eq!(config.easing, EasingKind::EaseInOut);
    }
}
