//! 可注入的外部协作能力
//!
//! 核心引擎不假设任何反射机制：构造依赖的发现和未注册类型的
//! 零参构造都是由外部注入的能力，缺席时引擎走保守路径。

use crate::provider::SharedInstance;
use rong_common::{DependencyResult, ProviderKey};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// 依赖探测能力
///
/// 为没有显式依赖列表的构造提供者补全有序的依赖键序列。
/// 返回 `None` 表示该键不在探测范围内，引擎按零依赖构造。
pub trait DependencyProbe: Send + Sync {
    /// 探测指定键的构造依赖
    fn dependencies_of(&self, key: &ProviderKey) -> Option<Vec<ProviderKey>>;
}

/// 零参构造回退能力
///
/// 解析未注册的键时最后的机会：返回 `Some` 则以该结果作为实例，
/// 返回 `None` 则解析以未找到提供者失败。
pub trait ConstructFallback: Send + Sync {
    /// 尝试零参构造指定键对应的实例
    fn construct(&self, key: &ProviderKey) -> Option<DependencyResult<SharedInstance>>;
}

/// 静态依赖探测表
///
/// 以显式登记的映射模拟"构造参数类型来源"，顺序即声明顺序。
#[derive(Default)]
pub struct StaticDependencyProbe {
    entries: HashMap<ProviderKey, Vec<ProviderKey>>,
}

impl StaticDependencyProbe {
    /// 创建空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个类型的依赖键序列
    #[must_use]
    pub fn with<T: 'static>(mut self, deps: Vec<ProviderKey>) -> Self {
        self.entries.insert(ProviderKey::of::<T>(), deps);
        self
    }

    /// 登记一个复合键的依赖键序列
    #[must_use]
    pub fn with_key(mut self, key: ProviderKey, deps: Vec<ProviderKey>) -> Self {
        self.entries.insert(key, deps);
        self
    }
}

impl DependencyProbe for StaticDependencyProbe {
    fn dependencies_of(&self, key: &ProviderKey) -> Option<Vec<ProviderKey>> {
        self.entries.get(key).cloned()
    }
}

/// 默认构造来源
///
/// 登记一批可零参构造的具体类型，作为 [`ConstructFallback`] 的标准实现。
/// 限定符不参与匹配：回退构造只认类型本身。
#[derive(Default)]
pub struct DefaultConstructSource {
    ctors: HashMap<TypeId, Arc<dyn Fn() -> SharedInstance + Send + Sync>>,
}

impl DefaultConstructSource {
    /// 创建空来源
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个实现 `Default` 的类型
    #[must_use]
    pub fn with_default<T: Default + Send + Sync + 'static>(mut self) -> Self {
        self.ctors
            .insert(TypeId::of::<T>(), Arc::new(|| Arc::new(T::default())));
        self
    }

    /// 登记一个自定义零参构造函数
    #[must_use]
    pub fn with_ctor<T, F>(mut self, ctor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.ctors
            .insert(TypeId::of::<T>(), Arc::new(move || Arc::new(ctor())));
        self
    }

    /// 已登记的类型数量
    pub fn len(&self) -> usize {
        self.ctors.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.ctors.is_empty()
    }
}

impl ConstructFallback for DefaultConstructSource {
    fn construct(&self, key: &ProviderKey) -> Option<DependencyResult<SharedInstance>> {
        self.ctors.get(&key.type_id()).map(|ctor| Ok(ctor()))
    }
}
