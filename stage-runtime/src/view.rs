//! # View 模块
//!
//! 视图标识类型。

use serde::{Deserialize, Serialize};

/// 视图标识
///
/// 引擎本身不理解视图内容，只在边界回调（`on_start` / `on_mid` /
/// `on_end`）中原样传递此标识，由调用方决定挂载什么。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(String);

impl ViewId {
    /// 创建视图标识
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 获取标识字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ViewId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ViewId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_id_roundtrip() {
        let id = ViewId::new("section1");
        assert_eq!(id.as_str(), "section1");
        assert_eq!(id.to_string(), "section1");

        // serde 透明序列化：应该是裸字符串
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"section1\"");

        let back: ViewId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_view_id_from() {
        let a: ViewId = "home".into();
        let b: ViewId = String::from("home").into();
        assert_eq!(a, b);
    }
}
