//! 错误类型定义

use thiserror::Error;

/// 依赖注入错误类型
///
/// 所有错误都携带复合键的渲染形式 `<类型名>[::<限定符>]`。
#[derive(Error, Debug)]
pub enum DependencyError {
    /// 同一复合键重复注册，且覆盖策略不允许替换
    #[error("提供者重复注册: {key}")]
    DuplicateProvider {
        /// 冲突的复合键
        key: String,
    },

    /// 未找到提供者，且没有可用的零参构造回退
    #[error("未找到提供者: {key}")]
    NoProvider {
        /// 请求的复合键
        key: String,
    },

    /// 同一调用栈上重入了正在解析中的键
    #[error("检测到循环依赖: {key}")]
    CircularDependency {
        /// 重入的复合键
        key: String,
    },

    /// 同步解析遇到了未能立即完成的异步生产方法
    #[error("同步解析遇到异步提供者: {key}, 请改用异步入口 get_async")]
    SyncOnAsync {
        /// 异步提供者的复合键
        key: String,
    },

    /// 解析出的实例无法转换为请求的类型
    #[error("实例类型转换失败: {key}, 期望类型: {expected}")]
    TypeMismatch {
        /// 请求的复合键
        key: String,
        /// 期望的具体类型名
        expected: String,
    },

    /// 生产方法本身执行失败
    #[error("实例创建失败: {key}, 原因: {source}")]
    ProductionFailed {
        /// 失败提供者的复合键
        key: String,
        /// 底层错误
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;

/// 释放钩子错误类型
///
/// 释放失败只记录日志、绝不向外传播，因此不需要结构化的错误枚举。
pub type DisposeError = Box<dyn std::error::Error + Send + Sync>;
