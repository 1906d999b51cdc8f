use crate::{
    constant, AsyncReleasable, InjectError, InjectResult, Injector,
    IntoFallible, IntoRequestScoped, IntoSingleton, IntoTransient, Releasable,
    RequestScope, RequestScopeFactory, RequestScopeOptions, ResourceError,
    ScopeContext, ScopeError, ScopeId, ScopedResource, ScopedValue,
    ServiceInfo, Svc,
};
use async_trait::async_trait;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc, Mutex,
    },
    thread,
    time::Duration,
};

#[derive(Default)]
struct Svc1(pub i32);

struct Svc2 {
    pub dep1: Svc<Svc1>,
}

impl Svc2 {
    pub fn new(dep1: Svc<Svc1>) -> Self {
        Svc2 { dep1 }
    }
}

struct Svc3 {
    pub dep1: Svc<Svc1>,
    pub dep2: Svc<Svc2>,
}

impl Svc3 {
    pub fn new(dep1: Svc<Svc1>, dep2: Svc<Svc2>) -> Self {
        Svc3 { dep1, dep2 }
    }
}

/// Counts how many times it has been incremented within a request.
#[derive(Default)]
struct Counter(AtomicUsize);

impl Counter {
    fn increment(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

struct Handler {
    counter: Svc<Counter>,
}

impl Handler {
    fn new(counter: Svc<Counter>) -> Self {
        Handler { counter }
    }
}

struct Repository {
    counter: Svc<Counter>,
}

impl Repository {
    fn new(counter: Svc<Counter>) -> Self {
        Repository { counter }
    }
}

type ReleaseLog = Mutex<Vec<&'static str>>;

macro_rules! logged_resource {
    ($name:ident) => {
        struct $name(Svc<ReleaseLog>);

        impl Releasable for $name {
            fn release(&self) -> Result<(), ResourceError> {
                self.0.lock().unwrap().push(stringify!($name));
                Ok(())
            }
        }
    };
}

logged_resource!(A);
logged_resource!(B);
logged_resource!(C);

fn scoped_injector(
    options: RequestScopeOptions,
    configure: impl FnOnce(&mut crate::InjectorBuilder),
) -> (Injector, Svc<RequestScopeFactory>) {
    let mut builder = Injector::builder();
    builder.attach_request_scope(options);
    configure(&mut builder);

    let injector = builder.build();
    let factory = injector.get().unwrap();
    (injector, factory)
}

async fn wait_until_closed(scope: &RequestScope) {
    for _ in 0..200 {
        if scope.open_scopes() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{} request scopes were never closed", scope.open_scopes());
}

#[test]
fn can_make_svc3() {
    let mut builder = Injector::builder();
    builder.provide(Svc1::default.transient());
    builder.provide(Svc2::new.transient());
    builder.provide(Svc3::new.transient());

    let injector = builder.build();
    let service: Svc<Svc3> = injector.get().unwrap();
    assert!(!Svc::ptr_eq(&service.dep1, &service.dep2.dep1));
}

#[test]
fn cant_make_svc1_when_no_provider() {
    let injector = Injector::builder().build();
    let svc: InjectResult<Svc<Svc1>> = injector.get();
    match svc {
        Err(InjectError::MissingProvider { service_info })
            if service_info == ServiceInfo::of::<Svc1>() => {}
        Err(error) => Err(error).unwrap(),
        Ok(_) => unreachable!(),
    }

    let svc: Option<Svc<Svc1>> = injector.get().unwrap();
    assert!(svc.is_none());
}

#[test]
fn cant_make_svc3_when_no_provider_for_dependency() {
    let mut builder = Injector::builder();
    builder.provide(Svc2::new.transient());
    builder.provide(Svc3::new.transient());

    let injector = builder.build();
    match injector.get::<Svc<Svc3>>() {
        Err(InjectError::MissingDependency {
            dependency_info, ..
        }) if dependency_info == ServiceInfo::of::<Svc1>() => {}
        Err(error) => Err(error).unwrap(),
        Ok(_) => unreachable!("service should not be able to be activated"),
    }
}

#[test]
fn constants_are_shared() {
    fn make_svc1(counter: Svc<Mutex<i32>>) -> Svc1 {
        let mut counter = counter.lock().unwrap();
        *counter += 1;
        Svc1(*counter)
    }

    let mut builder = Injector::builder();
    builder.provide(constant(Mutex::new(0)));
    builder.provide(make_svc1.transient());
    builder.provide(Svc2::new.transient());
    builder.provide(Svc3::new.transient());

    let injector = builder.build();
    let svc1: Svc<Svc1> = injector.get().unwrap();
    let svc3: Svc<Svc3> = injector.get().unwrap();

    assert_eq!(1, svc1.0);
    assert_ne!(svc3.dep1.0, svc3.dep2.dep1.0);
}

#[test]
fn multiple_providers_are_collected() {
    let mut builder = Injector::builder();
    builder.provide(constant(1_i32));
    builder.provide((|| 2_i32).transient());

    let injector = builder.build();
    let values: Vec<Svc<i32>> = injector.get().unwrap();
    assert_eq!(vec![1, 2], values.iter().map(|v| **v).collect::<Vec<_>>());

    match injector.get::<Svc<i32>>() {
        Err(InjectError::MultipleProviders { providers: 2, .. }) => {}
        Err(error) => Err(error).unwrap(),
        Ok(_) => unreachable!("a single value should not be resolved"),
    }
}

#[test]
fn injector_returns_error_on_cycles() {
    struct Foo(#[allow(dead_code)] Svc<Bar>);
    struct Bar(#[allow(dead_code)] Svc<Foo>);

    let mut builder = Injector::builder();
    builder.provide(Foo.singleton());
    builder.provide(Bar.singleton());

    let injector = builder.build();
    match injector.get::<Svc<Foo>>() {
        Err(InjectError::CycleDetected {
            service_info,
            cycle,
        }) if service_info == ServiceInfo::of::<Foo>() => {
            assert_eq!(
                cycle,
                vec![
                    ServiceInfo::of::<Foo>(),
                    ServiceInfo::of::<Bar>(),
                    ServiceInfo::of::<Foo>(),
                ]
            );
        }
        Ok(_) => panic!("somehow created a Foo with a cyclic dependency"),
        Err(error) => Err(error).unwrap(),
    }
}

#[tokio::test]
async fn same_instance_within_a_request() {
    let (injector, factory) =
        scoped_injector(RequestScopeOptions::default(), |builder| {
            builder.provide(Counter::default.request_scoped());
            builder.provide(Handler::new.transient());
            builder.provide(Repository::new.transient());
        });

    let (handler, repository) = factory
        .create_scope(async {
            let handler: Svc<Handler> = injector.get().unwrap();
            let repository: Svc<Repository> = injector.get().unwrap();
            (handler, repository)
        })
        .await
        .unwrap();

    assert!(Svc::ptr_eq(&handler.counter, &repository.counter));
}

#[tokio::test]
async fn concurrent_requests_get_their_own_counter() {
    let (injector, factory) =
        scoped_injector(RequestScopeOptions::default(), |builder| {
            builder.provide(Counter::default.request_scoped());
            builder.provide(Handler::new.transient());
            builder.provide(Repository::new.transient());
        });
    let scope: Svc<RequestScope> = injector.get().unwrap();

    let request = |delay: u64| {
        let injector = injector.clone();
        let factory = factory.clone();
        async move {
            factory
                .create_scope(async move {
                    let handler: Svc<Handler> = injector.get().unwrap();
                    handler.counter.increment();
                    tokio::time::sleep(Duration::from_millis(delay)).await;

                    let repository: Svc<Repository> = injector.get().unwrap();
                    repository.counter.increment()
                })
                .await
                .unwrap()
        }
    };

    let (first, second) = tokio::join!(request(20), request(5));
    assert_eq!(first, 2);
    assert_eq!(second, 2);
    assert_eq!(scope.open_scopes(), 0);
}

#[tokio::test]
async fn sequential_requests_do_not_share_values() {
    let (injector, factory) =
        scoped_injector(RequestScopeOptions::default(), |builder| {
            builder.provide(Counter::default.request_scoped());
        });

    let mut seen = Vec::new();
    for _ in 0..2 {
        let counter = factory
            .create_scope(async {
                let counter: Svc<Counter> = injector.get().unwrap();
                counter.increment();
                counter
            })
            .await
            .unwrap();
        seen.push(counter);
    }

    assert!(!Svc::ptr_eq(&seen[0], &seen[1]));
    assert_eq!(seen[1].0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lookup_outside_a_request_fails() {
    let (injector, _factory) =
        scoped_injector(RequestScopeOptions::default(), |builder| {
            builder.provide(Counter::default.request_scoped());
        });

    assert!(!ScopeContext::is_established());
    assert!(matches!(
        injector.get::<Svc<Counter>>(),
        Err(InjectError::Scope(ScopeError::ScopeNotEstablished))
    ));
    assert!(matches!(
        injector.get::<ScopeId>(),
        Err(InjectError::Scope(ScopeError::ScopeNotEstablished))
    ));
}

#[tokio::test]
async fn producer_runs_once_per_request() {
    let calls = Svc::new(AtomicUsize::new(0));
    let producer_calls = calls.clone();
    let (injector, factory) =
        scoped_injector(RequestScopeOptions::default(), move |builder| {
            builder.provide(
                (move || {
                    producer_calls.fetch_add(1, Ordering::SeqCst);
                    Counter::default()
                })
                .request_scoped(),
            );
        });

    factory
        .create_scope(async {
            for _ in 0..5 {
                let _counter: Svc<Counter> = injector.get().unwrap();
            }
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lookups_share_one_instance() {
    let calls = Svc::new(AtomicUsize::new(0));
    let producer_calls = calls.clone();
    let (injector, factory) =
        scoped_injector(RequestScopeOptions::default(), move |builder| {
            builder.provide(
                (move || {
                    producer_calls.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    Counter::default()
                })
                .request_scoped(),
            );
        });

    let counters = factory
        .create_scope(async {
            let tasks: Vec<_> = (0..8)
                .map(|_| {
                    let injector = injector.clone();
                    ScopeContext::spawn(async move {
                        injector.get::<Svc<Counter>>().unwrap()
                    })
                })
                .collect();

            let mut counters = Vec::new();
            for task in tasks {
                counters.push(task.await.unwrap());
            }
            counters
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(counters.iter().all(|c| Svc::ptr_eq(c, &counters[0])));
}

#[tokio::test]
async fn failed_producer_is_retried() {
    #[derive(Debug, derive_more::Display, derive_more::Error)]
    #[display(fmt = "not yet")]
    struct NotYet;

    let attempts = Svc::new(AtomicUsize::new(0));
    let producer_attempts = attempts.clone();
    let (injector, factory) =
        scoped_injector(RequestScopeOptions::default(), move |builder| {
            builder.provide(
                (move || {
                    if producer_attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(NotYet)
                    } else {
                        Ok(Counter::default())
                    }
                })
                .fallible()
                .request_scoped(),
            );
        });

    factory
        .create_scope(async {
            assert!(matches!(
                injector.get::<Svc<Counter>>(),
                Err(InjectError::ActivationFailed { .. })
            ));
            let first: Svc<Counter> = injector.get().unwrap();
            let second: Svc<Counter> = injector.get().unwrap();
            assert!(Svc::ptr_eq(&first, &second));
        })
        .await
        .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cleanup_runs_in_reverse_creation_order() {
    let log = Svc::new(ReleaseLog::default());
    let (injector, factory) = scoped_injector(
        RequestScopeOptions::new().with_cleanup(true),
        |builder| {
            builder.provide(constant(log.clone()));
            builder.provide(
                (|log: Svc<Svc<ReleaseLog>>| A((*log).clone()))
                    .request_scoped()
                    .releasable(),
            );
            builder.provide(
                (|log: Svc<Svc<ReleaseLog>>| B((*log).clone()))
                    .request_scoped()
                    .releasable(),
            );
            builder.provide(
                (|log: Svc<Svc<ReleaseLog>>| C((*log).clone()))
                    .request_scoped()
                    .releasable(),
            );
        },
    );

    factory
        .create_scope(async {
            let _a: Svc<A> = injector.get().unwrap();
            let _b: Svc<B> = injector.get().unwrap();
            let _c: Svc<C> = injector.get().unwrap();
            let _a_again: Svc<A> = injector.get().unwrap();
        })
        .await
        .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["C", "B", "A"]);
}

#[tokio::test]
async fn cleanup_is_skipped_when_disabled() {
    let log = Svc::new(ReleaseLog::default());
    let (injector, factory) =
        scoped_injector(RequestScopeOptions::default(), |builder| {
            builder.provide(constant(log.clone()));
            builder.provide(
                (|log: Svc<Svc<ReleaseLog>>| A((*log).clone()))
                    .request_scoped()
                    .releasable(),
            );
        });

    factory
        .create_scope(async {
            let _a: Svc<A> = injector.get().unwrap();
        })
        .await
        .unwrap();

    assert!(log.lock().unwrap().is_empty());
}

#[derive(Default)]
struct Session {
    entered: AtomicBool,
    exited: AtomicBool,
}

#[async_trait]
impl AsyncReleasable for Session {
    async fn enter(&self) -> Result<(), ResourceError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.entered.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn release(&self) -> Result<(), ResourceError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.exited.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn async_resources_are_entered_and_released() {
    let (injector, factory) = scoped_injector(
        RequestScopeOptions::new().with_cleanup(true),
        |builder| {
            builder.provide(
                Session::default.request_scoped().async_releasable(),
            );
        },
    );

    let session = factory
        .create_scope(async {
            let session: Svc<Session> = injector.get().unwrap();
            assert!(session.entered.load(Ordering::SeqCst));
            assert!(!session.exited.load(Ordering::SeqCst));
            session
        })
        .await
        .unwrap();

    assert!(session.exited.load(Ordering::SeqCst));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_resources_work_on_multi_thread_runtimes() {
    let (injector, factory) = scoped_injector(
        RequestScopeOptions::new().with_cleanup(true),
        |builder| {
            builder.provide(
                Session::default.request_scoped().async_releasable(),
            );
        },
    );

    let session = factory
        .create_scope(async {
            let session: Svc<Session> = injector.get().unwrap();
            assert!(session.entered.load(Ordering::SeqCst));
            session
        })
        .await
        .unwrap();

    assert!(session.exited.load(Ordering::SeqCst));
}

#[test]
fn async_resources_work_without_a_runtime() {
    let (injector, factory) = scoped_injector(
        RequestScopeOptions::new().with_cleanup(true),
        |builder| {
            builder.provide(
                Session::default.request_scoped().async_releasable(),
            );
        },
    );

    let guard = factory.open_scope().unwrap();
    let session: Svc<Session> = guard.enter(|| injector.get()).unwrap();
    assert!(session.entered.load(Ordering::SeqCst));

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(guard.close())
        .unwrap();
    assert!(session.exited.load(Ordering::SeqCst));
}

#[tokio::test]
async fn failed_enter_is_not_cached() {
    struct Flaky(AtomicUsize);

    impl Releasable for Flaky {
        fn enter(&self) -> Result<(), ResourceError> {
            Err("connection refused".into())
        }

        fn release(&self) -> Result<(), ResourceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let (injector, factory) = scoped_injector(
        RequestScopeOptions::new().with_cleanup(true),
        |builder| {
            builder.provide(
                (|| Flaky(AtomicUsize::new(0))).request_scoped().releasable(),
            );
        },
    );
    let scope: Svc<RequestScope> = injector.get().unwrap();

    factory
        .create_scope(async {
            let id = ScopeContext::current().unwrap();
            assert!(matches!(
                injector.get::<Svc<Flaky>>(),
                Err(InjectError::Scope(ScopeError::EnterFailed { .. }))
            ));
            assert_eq!(scope.cache().cached_len(id), Some(0));
            assert_eq!(scope.cleanup().pending(id), 0);
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn release_failures_are_reported_after_all_releases() {
    struct Broken;

    impl Releasable for Broken {
        fn release(&self) -> Result<(), ResourceError> {
            Err("disk full".into())
        }
    }

    let log = Svc::new(ReleaseLog::default());
    let (injector, factory) = scoped_injector(
        RequestScopeOptions::new().with_cleanup(true),
        |builder| {
            builder.provide(constant(log.clone()));
            builder.provide(
                (|log: Svc<Svc<ReleaseLog>>| A((*log).clone()))
                    .request_scoped()
                    .releasable(),
            );
            builder.provide((|| Broken).request_scoped().releasable());
        },
    );
    let scope: Svc<RequestScope> = injector.get().unwrap();

    let result = factory
        .create_scope(async {
            let _a: Svc<A> = injector.get().unwrap();
            let _broken: Svc<Broken> = injector.get().unwrap();
        })
        .await;

    match result {
        Err(ScopeError::CleanupFailed { failures, .. }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].service_info, ServiceInfo::of::<Broken>());
        }
        other => panic!("expected a cleanup failure, got {other:?}"),
    }
    assert_eq!(*log.lock().unwrap(), vec!["A"]);
    assert_eq!(scope.open_scopes(), 0);
}

#[tokio::test]
async fn cancelled_request_is_still_torn_down() {
    let log = Svc::new(ReleaseLog::default());
    let (injector, factory) = scoped_injector(
        RequestScopeOptions::new().with_cleanup(true),
        |builder| {
            builder.provide(constant(log.clone()));
            builder.provide(
                (|log: Svc<Svc<ReleaseLog>>| A((*log).clone()))
                    .request_scoped()
                    .releasable(),
            );
        },
    );
    let scope: Svc<RequestScope> = injector.get().unwrap();

    let request = factory.create_scope(async {
        let _a: Svc<A> = injector.get().unwrap();
        std::future::pending::<()>().await;
    });
    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), request).await;
    assert!(timed_out.is_err());

    wait_until_closed(&scope).await;
    assert_eq!(*log.lock().unwrap(), vec!["A"]);
}

#[tokio::test]
async fn explicit_scopes_can_be_opened_and_closed() {
    let (injector, factory) =
        scoped_injector(RequestScopeOptions::default(), |builder| {
            builder.provide(Counter::default.request_scoped());
        });
    let scope: Svc<RequestScope> = injector.get().unwrap();

    let guard = factory.open_scope().unwrap();
    let id = guard.id();
    assert_eq!(scope.open_scopes(), 1);

    let first = guard
        .run(async { injector.get::<Svc<Counter>>().unwrap() })
        .await;
    let second = guard.enter(|| injector.get::<Svc<Counter>>().unwrap());
    assert!(Svc::ptr_eq(&first, &second));
    assert_eq!(
        guard.enter(|| injector.get::<ScopeId>().unwrap()),
        id
    );

    guard.close().await.unwrap();
    assert_eq!(scope.open_scopes(), 0);
    assert!(!ScopeContext::is_established());
}

#[tokio::test]
async fn request_scoped_services_can_depend_on_each_other() {
    let (injector, factory) =
        scoped_injector(RequestScopeOptions::default(), |builder| {
            builder.provide(Counter::default.request_scoped());
            builder.provide(Handler::new.request_scoped());
            builder.provide(Repository::new.request_scoped());
        });

    factory
        .create_scope(async {
            let handler: Svc<Handler> = injector.get().unwrap();
            let repository: Svc<Repository> = injector.get().unwrap();
            let counter: Svc<Counter> = injector.get().unwrap();
            assert!(Svc::ptr_eq(&handler.counter, &counter));
            assert!(Svc::ptr_eq(&repository.counter, &counter));
        })
        .await
        .unwrap();
}

macro_rules! delayed_resource {
    ($name:ident, $delay:expr) => {
        struct $name(Svc<AtomicUsize>);

        impl $name {
            fn new(releases: Svc<AtomicUsize>) -> Self {
                $name(releases)
            }
        }

        #[async_trait]
        impl AsyncReleasable for $name {
            async fn release(&self) -> Result<(), ResourceError> {
                tokio::time::sleep($delay).await;
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    };
}

delayed_resource!(SlowRelease, Duration::from_millis(200));
delayed_resource!(QuickRelease, Duration::from_millis(1));

#[tokio::test]
async fn interrupted_close_still_releases_everything() {
    let (injector, factory) = scoped_injector(
        RequestScopeOptions::new().with_cleanup(true),
        |builder| {
            builder.provide(constant(AtomicUsize::new(0)));
            builder.provide(
                SlowRelease::new.request_scoped().async_releasable(),
            );
            builder.provide(
                QuickRelease::new.request_scoped().async_releasable(),
            );
        },
    );
    let scope: Svc<RequestScope> = injector.get().unwrap();
    let releases: Svc<AtomicUsize> = injector.get().unwrap();

    let guard = factory.open_scope().unwrap();
    guard.enter(|| {
        injector.get::<Svc<SlowRelease>>().unwrap();
        injector.get::<Svc<QuickRelease>>().unwrap();
    });

    let closed =
        tokio::time::timeout(Duration::from_millis(20), guard.close()).await;
    assert!(closed.is_err());

    wait_until_closed(&scope).await;
    assert_eq!(releases.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn lookup_finishing_after_close_releases_its_resource() {
    let scope = Svc::new(RequestScope::new(
        RequestScopeOptions::new().with_cleanup(true),
    ));
    let factory = RequestScopeFactory::new(scope.clone());
    let log = Svc::new(ReleaseLog::default());

    let guard = factory.open_scope().unwrap();
    let id = guard.id();
    let (started_tx, started_rx) = mpsc::channel();
    let (resume_tx, resume_rx) = mpsc::channel::<()>();

    let lookup = thread::spawn({
        let scope = scope.clone();
        let log = log.clone();
        move || {
            scope.get_or_create(id, ServiceInfo::of::<A>(), || {
                started_tx.send(()).unwrap();
                resume_rx.recv().unwrap();

                let value = Svc::new(A(log));
                let resource = ScopedResource::releasable(value.clone());
                Ok(ScopedValue::with_resource(value, resource))
            })
        }
    });

    started_rx.recv().unwrap();
    guard.close().await.unwrap();
    resume_tx.send(()).unwrap();

    let result = lookup.join().unwrap();
    assert!(matches!(
        result,
        Err(InjectError::Scope(ScopeError::ScopeNotEstablished))
    ));
    assert_eq!(scope.cleanup().pending(id), 0);
    assert_eq!(scope.open_scopes(), 0);
    assert_eq!(*log.lock().unwrap(), vec!["A"]);
}

struct Reentrant;

#[tokio::test]
async fn reentrant_lookup_is_reported_as_a_cycle() {
    let detected = Svc::new(AtomicBool::new(false));
    let (injector, factory) =
        scoped_injector(RequestScopeOptions::default(), |builder| {
            let detected = detected.clone();
            builder.provide(
                (move |injector: Injector| {
                    let inner = injector.get::<Svc<Reentrant>>();
                    detected.store(
                        matches!(inner, Err(InjectError::CycleDetected { .. })),
                        Ordering::SeqCst,
                    );
                    Reentrant
                })
                .request_scoped(),
            );
        });

    factory
        .create_scope(async {
            let _reentrant: Svc<Reentrant> = injector.get().unwrap();
        })
        .await
        .unwrap();
    assert!(detected.load(Ordering::SeqCst));
}

#[tokio::test]
async fn unused_bindings_leave_nothing_behind() {
    let log = Svc::new(ReleaseLog::default());
    let (injector, factory) = scoped_injector(
        RequestScopeOptions::new().with_cleanup(true),
        |builder| {
            builder.provide(constant(log.clone()));
            builder.provide(
                (|log: Svc<Svc<ReleaseLog>>| A((*log).clone()))
                    .request_scoped()
                    .releasable(),
            );
        },
    );
    let scope: Svc<RequestScope> = injector.get().unwrap();

    let guard = factory.open_scope().unwrap();
    let id = guard.id();
    assert_eq!(guard.enter(|| injector.get::<ScopeId>().unwrap()), id);
    assert_eq!(scope.cache().cached_len(id), Some(0));
    assert_eq!(scope.cleanup().pending(id), 0);

    guard.close().await.unwrap();
    assert!(log.lock().unwrap().is_empty());
}
