//! 实例释放能力定义
//!
//! 需要在容器关闭时清理资源的组件实现 [`Disposable`]，
//! 容器在注册时静态捕获该能力，不做运行时方法探测。

use crate::errors::DisposeError;
use async_trait::async_trait;

/// 显式释放能力 trait
///
/// 容器关闭时按创建顺序的逆序调用 [`dispose`](Disposable::dispose)。
/// 释放失败会被记录并吞掉，不会阻断其余实例的释放。
#[async_trait]
pub trait Disposable: Send + Sync {
    /// 释放实例持有的资源
    async fn dispose(&self) -> Result<(), DisposeError>;
}
