//! 进程级容器句柄
//!
//! 不做任何隐式构造：句柄必须显式初始化，多个独立容器可以在
//! 测试中并存而互不污染。生命周期为 init -> get -> reset。

use crate::container::Container;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::info;

static PROCESS_CONTAINER: Lazy<RwLock<Option<Container>>> = Lazy::new(|| RwLock::new(None));

/// 初始化进程级容器句柄，返回被替换的旧容器（若有）
pub fn init(container: Container) -> Option<Container> {
    info!("初始化进程级容器: {}", container.id());
    PROCESS_CONTAINER.write().replace(container)
}

/// 获取进程级容器句柄
pub fn get() -> Option<Container> {
    PROCESS_CONTAINER.read().clone()
}

/// 摘除进程级容器句柄
///
/// 只摘除句柄本身，不触发任何释放钩子；需要优雅停机时
/// 先对返回的容器调用 `shutdown`。
pub fn reset() -> Option<Container> {
    PROCESS_CONTAINER.write().take()
}
