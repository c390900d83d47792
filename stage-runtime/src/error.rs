//! # Error 模块
//!
//! 定义配置校验相关的错误类型。

use thiserror::Error;

/// 配置校验错误
///
/// 由 [`RevealConfig::validated`](crate::RevealConfig::validated) 返回。
/// Host 层捕获后以默认值替换并记录日志，不会让转场失败。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 单元格尺寸非法
    #[error("非法的单元格尺寸: {value}（必须为正数）")]
    InvalidCellSize {
        /// 传入的值
        value: f32,
    },

    /// 时长参数非法
    #[error("非法的时长参数 {field}: {value}（必须 >= 0）")]
    InvalidDuration {
        /// 参数名（in_duration_ms / out_duration_ms / delay_span_ms）
        field: &'static str,
        /// 传入的值
        value: f32,
    },

    /// 中心点坐标非法
    #[error("非法的中心点坐标: [{u}, {v}]（必须位于 [0,1] 区间）")]
    InvalidCenter {
        /// 归一化横坐标
        u: f32,
        /// 归一化纵坐标
        v: f32,
    },
}
