//! # Stage Runtime
//!
//! 转场编排引擎的纯逻辑数据层。
//!
//! ## 架构概述
//!
//! `stage-runtime` 不依赖任何 IO 或渲染引擎，只定义跨越宿主边界的
//! 声明式数据类型：
//!
//! ```text
//! 调用方                          Host 引擎
//!   │                               │
//!   │── TransitionSpec ───────────►│ resolve()
//!   │                               │ （解释语义、填充默认值）
//!   │◄── on_start / on_mid / on_end │
//! ```
//!
//! ## 核心类型
//!
//! - [`TransitionSpec`]：一次转场的声明式描述（效果名 + 参数）
//! - [`RevealConfig`]：经过校验的转场配置
//! - [`ViewId`]：视图标识
//! - [`EasingKind`]：缓动函数的声明式名称
//!
//! ## 设计原则
//!
//! - **声明式**：Spec 描述"要什么效果"，不描述"怎么画"
//! - **结构提取**：本 crate 只负责参数结构，语义解释由 Host 层负责
//! - **引擎无关**：不包含任何 wgpu 或其他渲染引擎的类型

pub mod config;
pub mod error;
pub mod spec;
pub mod view;

pub use config::{EasingKind, RevealConfig};
pub use error::ConfigError;
pub use spec::{SpecArg, TransitionSpec};
pub use view::ViewId;
