//! 实例生命周期定义

/// 实例生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// 单例模式 - 整个容器树内只缓存一个实例（存放在根容器）
    Singleton,
    /// 作用域模式 - 每个作用域缓存各自的实例
    Scoped,
    /// 瞬时模式 - 每次解析都重新生产，不缓存也不追踪释放
    Transient,
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::Transient
    }
}

impl Lifetime {
    /// 该生命周期的实例是否会被缓存并追踪释放
    pub fn is_tracked(self) -> bool {
        !matches!(self, Self::Transient)
    }
}
