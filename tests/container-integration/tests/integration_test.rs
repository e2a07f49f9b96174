//! rong-container 的集中集成测试

use async_trait::async_trait;
use rong_container::{
    downcast_shared, Container, ContainerOptions, DefaultConstructSource, DependencyError,
    Disposable, DisposeError, OverrideStrategy, Provider, ProviderKey, StaticDependencyProbe,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .try_init();
}

/// 测试组件：数据库句柄
#[derive(Debug)]
struct Database {
    url: String,
}

/// 测试组件：缓存客户端
#[derive(Debug)]
struct CacheClient {
    endpoint: String,
}

/// 带释放日志的连接
#[derive(Debug)]
struct Connection {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Disposable for Connection {
    async fn dispose(&self) -> Result<(), DisposeError> {
        self.log.lock().unwrap().push(self.name);
        Ok(())
    }
}

#[tokio::test]
async fn singleton_identity_across_root_and_scopes() {
    init_tracing();
    let container = Container::new();
    container
        .register(
            Provider::factory(|_ctx| {
                Ok(Database {
                    url: "postgres://localhost".into(),
                })
            })
            .singleton()
            .build(),
        )
        .unwrap();

    let first = container.get::<Database>().unwrap();
    let second = container.get::<Database>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // 子作用域解析到的是同一个根缓存实例
    let scope = container.begin_scope();
    let from_scope = scope.get::<Database>().unwrap();
    assert!(Arc::ptr_eq(&first, &from_scope));
    assert_eq!(from_scope.url, "postgres://localhost");
}

#[tokio::test]
async fn scoped_instances_are_per_scope() {
    let container = Container::new();
    container
        .register(
            Provider::factory(|_ctx| {
                Ok(CacheClient {
                    endpoint: "redis://cache".into(),
                })
            })
            .scoped()
            .build(),
        )
        .unwrap();

    let scope_a = container.begin_scope();
    let scope_b = container.begin_scope();

    let a1 = scope_a.get::<CacheClient>().unwrap();
    let a2 = scope_a.get::<CacheClient>().unwrap();
    let b1 = scope_b.get::<CacheClient>().unwrap();

    // 同一作用域内稳定，不同作用域互不相同
    assert!(Arc::ptr_eq(&a1, &a2));
    assert!(!Arc::ptr_eq(&a1, &b1));
    assert_eq!(b1.endpoint, "redis://cache");
}

#[test]
fn duplicate_registration_respects_override_policy() {
    // 默认策略：第二次注册报重复错误
    let strict = Container::new();
    strict.register(Provider::value(1_u32).build()).unwrap();
    let err = strict.register(Provider::value(2_u32).build()).unwrap_err();
    match err {
        DependencyError::DuplicateProvider { key } => assert_eq!(key, "u32"),
        other => panic!("意外的错误类型: {other:?}"),
    }
    assert_eq!(*strict.get::<u32>().unwrap(), 1);

    // 允许覆盖 + 后者生效：第二次注册静默取胜
    let lenient = Container::with_options(ContainerOptions::new().allow_override(true));
    lenient.register(Provider::value(1_u32).build()).unwrap();
    lenient.register(Provider::value(2_u32).build()).unwrap();
    assert_eq!(*lenient.get::<u32>().unwrap(), 2);
}

#[test]
fn qualifiers_select_independent_providers() {
    let container = Container::new();
    container
        .load([
            Provider::value(Database {
                url: "postgres://primary".into(),
            })
            .qualifier("primary")
            .build(),
            Provider::value(Database {
                url: "postgres://replica".into(),
            })
            .qualifier("replica")
            .build(),
        ])
        .unwrap();

    let primary = container.get_with::<Database>(Some("primary")).unwrap();
    let replica = container.get_with::<Database>(Some("replica")).unwrap();
    assert_eq!(primary.url, "postgres://primary");
    assert_eq!(replica.url, "postgres://replica");

    // 无限定符是独立的键，不落到任何限定符上
    let err = container.get::<Database>().unwrap_err();
    match err {
        DependencyError::NoProvider { key } => assert_eq!(key, "Database"),
        other => panic!("意外的错误类型: {other:?}"),
    }
}

#[test]
fn circular_dependency_is_detected_and_cleaned_up() {
    #[derive(Debug)]
    struct ServiceA;
    #[derive(Debug)]
    struct ServiceB;

    let container = Container::new();
    container
        .register(
            Provider::factory(|ctx| {
                let _b = ctx.get::<ServiceB>()?;
                Ok(ServiceA)
            })
            .singleton()
            .build(),
        )
        .unwrap();
    container
        .register(
            Provider::factory(|ctx| {
                let _a = ctx.get::<ServiceA>()?;
                Ok(ServiceB)
            })
            .singleton()
            .build(),
        )
        .unwrap();

    let err = container.get::<ServiceA>().unwrap_err();
    match err {
        DependencyError::CircularDependency { key } => assert_eq!(key, "ServiceA"),
        other => panic!("意外的错误类型: {other:?}"),
    }

    // 解析标记已随错误展开被清理，容器保持可用
    container.override_value(ServiceB, None);
    assert!(container.get::<ServiceA>().is_ok());
}

#[tokio::test]
async fn shutdown_disposes_in_reverse_creation_order() {
    init_tracing();
    let container = Container::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    for name in ["A", "B", "C"] {
        let log = log.clone();
        container
            .register(
                Provider::factory(move |_ctx| {
                    Ok(Connection {
                        name,
                        log: log.clone(),
                    })
                })
                .qualifier(name)
                .singleton()
                .disposable()
                .build(),
            )
            .unwrap();
    }

    container.get_with::<Connection>(Some("A")).unwrap();
    container.get_with::<Connection>(Some("B")).unwrap();
    container.get_with::<Connection>(Some("C")).unwrap();

    container.shutdown().await;
    assert_eq!(*log.lock().unwrap(), vec!["C", "B", "A"]);

    // 关闭后单例缓存已清空：再次解析会重新生产
    let fresh = container.get_with::<Connection>(Some("A")).unwrap();
    assert_eq!(fresh.name, "A");
}

#[tokio::test]
async fn failing_disposal_hook_is_swallowed() {
    let container = Container::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    container
        .register(
            Provider::factory({
                let log = log.clone();
                move |_ctx| {
                    Ok(Connection {
                        name: "ok",
                        log: log.clone(),
                    })
                }
            })
            .singleton()
            .disposable()
            .build(),
        )
        .unwrap();
    container
        .register(
            Provider::value(String::from("doomed"))
                .dispose_with(|_instance| async { Err::<(), DisposeError>("释放失败".into()) })
                .build(),
        )
        .unwrap();

    container.get::<Connection>().unwrap();
    container.get::<String>().unwrap();

    // 后创建的 String 先释放且失败，不影响 Connection 的释放
    container.shutdown().await;
    assert_eq!(*log.lock().unwrap(), vec!["ok"]);
}

#[tokio::test]
async fn async_disposal_hook_is_awaited() {
    let container = Container::new();
    let disposed = Arc::new(AtomicU32::new(0));

    container
        .register(
            Provider::value(Database {
                url: "postgres://teardown".into(),
            })
            .dispose_with({
                let disposed = disposed.clone();
                move |instance| {
                    let disposed = disposed.clone();
                    async move {
                        tokio::task::yield_now().await;
                        assert_eq!(instance.url, "postgres://teardown");
                        disposed.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }
            })
            .build(),
        )
        .unwrap();

    container.get::<Database>().unwrap();
    container.shutdown().await;
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sync_entry_point_rejects_pending_async_provider() {
    let container = Container::new();
    container
        .register(
            Provider::async_factory(|_ctx| async {
                tokio::task::yield_now().await;
                Ok(Database {
                    url: "postgres://async".into(),
                })
            })
            .singleton()
            .build(),
        )
        .unwrap();

    match container.get::<Database>() {
        Err(DependencyError::SyncOnAsync { key }) => assert_eq!(key, "Database"),
        other => panic!("意外的结果: {other:?}"),
    }

    // 同一个提供者走异步入口成功
    let resolved = container.get_async::<Database>().await.unwrap();
    assert_eq!(resolved.url, "postgres://async");

    // 单例已缓存，此后同步入口也能命中
    let cached = container.get::<Database>().unwrap();
    assert!(Arc::ptr_eq(&resolved, &cached));
}

#[tokio::test]
async fn async_factory_resolves_async_dependencies() -> anyhow::Result<()> {
    #[derive(Debug)]
    struct Pool {
        db: Arc<Database>,
    }

    let container = Container::new();
    container.register(
        Provider::async_factory(|_ctx| async {
            tokio::task::yield_now().await;
            Ok(Database {
                url: "postgres://pooled".into(),
            })
        })
        .singleton()
        .build(),
    )?;
    container.register(
        Provider::async_factory(|ctx| async move {
            let db = ctx.get_async::<Database>().await?;
            Ok(Pool { db })
        })
        .singleton()
        .build(),
    )?;

    let pool = container.get_async::<Pool>().await?;
    assert_eq!(pool.db.url, "postgres://pooled");
    Ok(())
}

#[test]
fn override_bypasses_production_pipeline() {
    let invocations = Arc::new(AtomicU32::new(0));
    let container = Container::new();
    container
        .register(
            Provider::factory({
                let invocations = invocations.clone();
                move |_ctx| {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    Ok(Database {
                        url: "postgres://original".into(),
                    })
                }
            })
            .singleton()
            .build(),
        )
        .unwrap();

    // 覆盖发生在首次解析之前：原生产方法从未被调用
    container.override_value(
        Database {
            url: "postgres://override".into(),
        },
        None,
    );

    let from_root = container.get::<Database>().unwrap();
    let scope = container.begin_scope();
    let from_scope = scope.get::<Database>().unwrap();

    assert_eq!(from_root.url, "postgres://override");
    assert!(Arc::ptr_eq(&from_root, &from_scope));
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[test]
fn override_replaces_existing_cached_instance() {
    let container = Container::new();
    container
        .register(Provider::value(String::from("旧值")).build())
        .unwrap();
    assert_eq!(container.get::<String>().unwrap().as_str(), "旧值");

    container.override_value(String::from("新值"), None);
    assert_eq!(container.get::<String>().unwrap().as_str(), "新值");
}

#[tokio::test]
async fn scope_shutdown_leaves_parent_and_siblings_intact() {
    let container = Container::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    container
        .register(
            Provider::factory({
                let log = log.clone();
                move |_ctx| {
                    Ok(Connection {
                        name: "scoped",
                        log: log.clone(),
                    })
                }
            })
            .scoped()
            .disposable()
            .build(),
        )
        .unwrap();

    let scope_a = container.begin_scope();
    let scope_b = container.begin_scope();
    let a = scope_a.get::<Connection>().unwrap();
    let b = scope_b.get::<Connection>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));

    scope_a.shutdown().await;
    assert_eq!(*log.lock().unwrap(), vec!["scoped"]);

    // 兄弟作用域的缓存不受影响
    let b_again = scope_b.get::<Connection>().unwrap();
    assert!(Arc::ptr_eq(&b, &b_again));
}

#[test]
fn reset_clears_without_running_hooks() {
    let container = Container::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    container
        .register(
            Provider::factory({
                let log = log.clone();
                move |_ctx| {
                    Ok(Connection {
                        name: "reset",
                        log: log.clone(),
                    })
                }
            })
            .singleton()
            .disposable()
            .build(),
        )
        .unwrap();

    container.get::<Connection>().unwrap();
    container.reset();

    // 钩子未执行，注册表与缓存全部清空
    assert!(log.lock().unwrap().is_empty());
    assert!(!container.contains::<Connection>());
    assert!(matches!(
        container.get::<Connection>(),
        Err(DependencyError::NoProvider { .. })
    ));
}

#[test]
fn construct_provider_resolves_declared_dependencies_in_order() {
    #[derive(Debug)]
    struct Report {
        count: u32,
        label: String,
    }

    let container = Container::new();
    container
        .load([
            Provider::value(7_u32).build(),
            Provider::value(String::from("widgets")).build(),
        ])
        .unwrap();
    container
        .register(
            Provider::construct(|deps| {
                let count = downcast_shared::<u32>(&ProviderKey::of::<u32>(), deps[0].clone())?;
                let label =
                    downcast_shared::<String>(&ProviderKey::of::<String>(), deps[1].clone())?;
                Ok(Report {
                    count: *count,
                    label: (*label).clone(),
                })
            })
            .dependencies(vec![ProviderKey::of::<u32>(), ProviderKey::of::<String>()])
            .singleton()
            .build(),
        )
        .unwrap();

    let report = container.get::<Report>().unwrap();
    assert_eq!(report.count, 7);
    assert_eq!(report.label, "widgets");
}

#[test]
fn dependency_probe_supplies_missing_dependency_list() {
    #[derive(Debug)]
    struct Summary {
        total: u32,
    }

    let container = Container::new();
    container.register(Provider::value(41_u32).build()).unwrap();
    container.install_dependency_probe(Arc::new(
        StaticDependencyProbe::new().with::<Summary>(vec![ProviderKey::of::<u32>()]),
    ));
    container
        .register(
            Provider::construct(|deps| {
                let base = downcast_shared::<u32>(&ProviderKey::of::<u32>(), deps[0].clone())?;
                Ok(Summary { total: *base + 1 })
            })
            .build(),
        )
        .unwrap();

    assert_eq!(container.get::<Summary>().unwrap().total, 42);
}

#[test]
fn construct_fallback_builds_unregistered_types() {
    #[derive(Debug, Default)]
    struct Plain {
        hits: u32,
    }

    let container = Container::new();
    container.install_construct_fallback(Arc::new(
        DefaultConstructSource::new().with_default::<Plain>(),
    ));

    let first = container.get::<Plain>().unwrap();
    let second = container.get::<Plain>().unwrap();
    assert_eq!(first.hits, 0);
    // 回退构造不缓存：每次解析都是新实例
    assert!(!Arc::ptr_eq(&first, &second));

    // 子作用域同样享有根上的回退能力
    let scope = container.begin_scope();
    assert!(scope.get::<Plain>().is_ok());
}

#[test]
fn child_scope_registrations_shadow_parent_lookups() {
    let container = Container::new();
    container
        .register(Provider::value(String::from("根层")).build())
        .unwrap();

    let scope = container.begin_scope();
    scope
        .register(Provider::value(String::from("子层")).scoped().build())
        .unwrap();

    assert_eq!(scope.get::<String>().unwrap().as_str(), "子层");
    // 父容器看不到子层注册
    assert_eq!(container.get::<String>().unwrap().as_str(), "根层");
}

#[test]
fn shadowing_survives_parent_singleton_caching() {
    let container = Container::new();
    container
        .register(Provider::value(String::from("根层")).build())
        .unwrap();

    let scope = container.begin_scope();
    scope
        .register(Provider::value(String::from("子层")).scoped().build())
        .unwrap();

    let local = scope.get::<String>().unwrap();
    assert_eq!(local.as_str(), "子层");

    // 父容器解析并缓存了根单例之后，子层遮蔽依然生效
    assert_eq!(container.get::<String>().unwrap().as_str(), "根层");
    let local_again = scope.get::<String>().unwrap();
    assert_eq!(local_again.as_str(), "子层");
    assert!(Arc::ptr_eq(&local, &local_again));
}

#[test]
fn options_deserialize_from_config_fixture() {
    let options: ContainerOptions =
        serde_json::from_str(r#"{"allow_override":true,"override_strategy":"last-wins"}"#)
            .unwrap();
    assert!(options.allow_override);
    assert_eq!(options.effective_strategy(), OverrideStrategy::LastWins);

    let defaults: ContainerOptions = serde_json::from_str("{}").unwrap();
    assert!(!defaults.allow_override);
    assert_eq!(defaults.effective_strategy(), OverrideStrategy::Error);
}
