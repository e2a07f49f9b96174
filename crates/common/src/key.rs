//! 提供者复合键定义
//!
//! 复合键由类型标识与可选限定符组成，是注册表和实例缓存的索引。

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 提供者复合键
///
/// 标识"请求的是哪种东西"：类型级主键加可选的二级限定符。
/// 无限定符本身就是一个独立的键，不等价于任何限定符值。
#[derive(Debug, Clone)]
pub struct ProviderKey {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<String>,
}

impl ProviderKey {
    /// 从类型创建无限定符的键
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: short_type_name::<T>(),
            qualifier: None,
        }
    }

    /// 从类型创建带限定符的键
    pub fn qualified<T: 'static>(qualifier: impl Into<String>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: short_type_name::<T>(),
            qualifier: Some(qualifier.into()),
        }
    }

    /// 替换限定符
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// 类型标识
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// 简短类型名（不含模块路径）
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 限定符
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

/// 键的相等性只看类型标识与限定符，类型名仅用于展示
impl PartialEq for ProviderKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for ProviderKey {}

impl Hash for ProviderKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}::{}", self.type_name, q),
            None => f.write_str(self.type_name),
        }
    }
}

/// 获取简短的类型名称（不包含模块路径）
fn short_type_name<T: 'static>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
