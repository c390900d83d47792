//! # Spec 模块
//!
//! 定义一次转场的声明式描述。
//! `TransitionSpec` 是调用方与引擎之间的**唯一配置入口**。
//!
//! ## 设计原则
//!
//! - **声明式**：Spec 描述"要什么效果"，不描述"怎么画"
//! - **结构提取**：本模块只负责参数结构，不解释具体语义
//! - **解释在 Host**：效果名到策略的映射、默认值填充都由 Host 层的
//!   resolver 完成

use serde::{Deserialize, Serialize};

/// 转场参数值
///
/// 调用方传入的单个参数，不解释具体语义。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpecArg {
    /// 数字参数，如 `460`
    Number(f64),
    /// 字符串参数，如 `"masks/wipe.png"`
    Text(String),
    /// 布尔参数，如 `true`
    Flag(bool),
}

/// 转场效果描述
///
/// 采用统一函数调用语法，支持位置参数和命名参数。
///
/// # 示例
///
/// ```text
/// grid                          -> TransitionSpec { name: "grid", args: [] }
/// grid(460)                     -> args: [(None, Number(460))]
/// grid(delay: 460, cell: 60)    -> args: [(Some("delay"), ...), (Some("cell"), ...)]
/// image(mask: "wipe.png", reversed: true)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    /// 效果名称（Host 解析时大小写不敏感）
    pub name: String,
    /// 参数列表
    /// - `None` = 位置参数
    /// - `Some(key)` = 命名参数
    pub args: Vec<(Option<String>, SpecArg)>,
}

impl TransitionSpec {
    /// 创建无参数的转场描述
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// 创建带位置参数的转场描述
    pub fn with_args(name: impl Into<String>, args: Vec<SpecArg>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().map(|a| (None, a)).collect(),
        }
    }

    /// 创建带命名参数的转场描述
    pub fn with_named_args(
        name: impl Into<String>,
        args: Vec<(Option<String>, SpecArg)>,
    ) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// 追加一个命名参数（链式构造用）
    pub fn arg(mut self, key: impl Into<String>, value: SpecArg) -> Self {
        self.args.push((Some(key.into()), value));
        self
    }

    /// 获取位置参数（按索引）
    pub fn get_positional(&self, index: usize) -> Option<&SpecArg> {
        self.args
            .iter()
            .filter(|(key, _)| key.is_none())
            .nth(index)
            .map(|(_, v)| v)
    }

    /// 获取命名参数（按 key）
    pub fn get_named(&self, key: &str) -> Option<&SpecArg> {
        self.args
            .iter()
            .find(|(k, _)| k.as_deref() == Some(key))
            .map(|(_, v)| v)
    }

    /// 获取参数值：优先命名参数，回退到位置参数
    pub fn get_arg(&self, key: &str, positional_index: usize) -> Option<&SpecArg> {
        self.get_named(key)
            .or_else(|| self.get_positional(positional_index))
    }

    /// 获取数字参数
    pub fn get_number(&self, key: &str, positional_index: usize) -> Option<f32> {
        self.get_arg(key, positional_index).and_then(|a| match a {
            SpecArg::Number(n) => Some(*n as f32),
            _ => None,
        })
    }

    /// 获取字符串参数
    pub fn get_text(&self, key: &str, positional_index: usize) -> Option<&str> {
        self.get_arg(key, positional_index).and_then(|a| match a {
            SpecArg::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// 获取布尔参数
    pub fn get_flag(&self, key: &str, positional_index: usize) -> Option<bool> {
        self.get_arg(key, positional_index).and_then(|a| match a {
            SpecArg::Flag(b) => Some(*b),
            _ => None,
        })
    }

    /// 判断是否全是位置参数
    pub fn is_all_positional(&self) -> bool {
        self.args.iter().all(|(k, _)| k.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_spec() {
        let spec = TransitionSpec::simple("grid");
        assert_eq!(spec.name, "grid");
        assert!(spec.args.is_empty());
        assert!(spec.is_all_positional());
    }

    #[test]
    fn test_positional_args() {
        let spec = TransitionSpec::with_args(
            "grid",
            vec![SpecArg::Number(460.0), SpecArg::Number(60.0)],
        );

        assert_eq!(spec.get_positional(0), Some(&SpecArg::Number(460.0)));
        assert_eq!(spec.get_positional(1), Some(&SpecArg::Number(60.0)));
        assert_eq!(spec.get_positional(2), None);
    }

    #[test]
    fn test_named_args() {
        let spec = TransitionSpec::simple("image")
            .arg("mask", SpecArg::Text("masks/wipe.png".to_string()))
            .arg("reversed", SpecArg::Flag(true));

        assert_eq!(spec.get_text("mask", 0), Some("masks/wipe.png"));
        assert_eq!(spec.get_flag("reversed", 1), Some(true));
        assert_eq!(spec.get_named("unknown"), None);
        assert!(!spec.is_all_positional());
    }

    #[test]
    fn test_named_takes_priority_over_positional() {
        let spec = TransitionSpec::with_named_args(
            "grid",
            vec![
                (None, SpecArg::Number(100.0)),
                (Some("delay".to_string()), SpecArg::Number(460.0)),
            ],
        );

        // 命名参数优先
        assert_eq!(spec.get_number("delay", 0), Some(460.0));
        // 没有同名命名参数时回退到位置参数
        assert_eq!(spec.get_number("cell", 0), Some(100.0));
    }

    #[test]
    fn test_typed_getters_reject_wrong_type() {
        let spec = TransitionSpec::simple("noise").arg("edge", SpecArg::Text("x".to_string()));

        assert_eq!(spec.get_number("edge", 0), None);
        assert_eq!(spec.get_text("edge", 0), Some("x"));
        assert_eq!(spec.get_flag("edge", 0), None);
    }

    #[test]
    fn test_serde_roundtrip() {
        let spec = TransitionSpec::simple("noise")
            .arg("edge", SpecArg::Number(0.4))
            .arg("capture", SpecArg::Flag(false));

        let json = serde_json::to_string(&spec).unwrap();
        let back: TransitionSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
