use ferrous_bindings::{DiError, Lifetime, Resolver, ServiceCollection};
use std::sync::{Arc, Mutex};

#[test]
fn test_concrete_singleton() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(42usize);
    sc.add_singleton("hello".to_string());

    let sp = sc.build();

    let num1 = sp.get_required::<usize>();
    let num2 = sp.get_required::<usize>();
    let str1 = sp.get_required::<String>();
    let str2 = sp.get_required::<String>();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2));
    assert!(Arc::ptr_eq(&str1, &str2));
}

#[test]
fn test_factory_with_dependencies() {
    #[derive(Debug)]
    struct Config {
        port: u16,
    }

    #[derive(Debug)]
    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Config { port: 8080 });
    sc.add_singleton_factory::<Server, _>(|r| Server {
        config: r.get_required::<Config>(),
        name: "MyServer".to_string(),
    });

    let sp = sc.build();
    let server = sp.get_required::<Server>();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
}

#[test]
fn test_transient_creates_new_instances() {
    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<String, _>(move |_| {
        let mut c = counter_clone.lock().unwrap();
        *c += 1;
        format!("instance-{}", *c)
    });

    let sp = sc.build();

    let a = sp.get_required::<String>();
    let b = sp.get_required::<String>();
    let c = sp.get_required::<String>();

    assert_eq!(*a, "instance-1");
    assert_eq!(*b, "instance-2");
    assert_eq!(*c, "instance-3");
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&b, &c));
}

#[test]
fn test_not_found_error() {
    struct UnregisteredType;

    let sp = ServiceCollection::new().build();
    assert!(matches!(sp.get::<UnregisteredType>(), Err(DiError::NotFound(_))));
}

#[test]
fn test_last_registration_wins() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(1usize);
    sc.add_singleton(2usize);

    let sp = sc.build();
    assert_eq!(*sp.get_required::<usize>(), 2);
    let all: Vec<usize> = sp.get_all::<usize>().unwrap().iter().map(|v| **v).collect();
    assert_eq!(all, [1, 2]);
}

#[test]
fn test_complex_dependency_graph() {
    struct A {
        value: i32,
    }

    struct B {
        a: Arc<A>,
    }

    struct C {
        a: Arc<A>,
        b: Arc<B>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(A { value: 100 });
    sc.add_singleton_factory::<B, _>(|r| B {
        a: r.get_required::<A>(),
    });
    sc.add_singleton_factory::<C, _>(|r| C {
        a: r.get_required::<A>(),
        b: r.get_required::<B>(),
    });

    let sp = sc.build();
    let c = sp.get_required::<C>();

    assert_eq!(c.a.value, 100);
    assert_eq!(c.b.a.value, 100);
    assert!(Arc::ptr_eq(&c.a, &c.b.a));
}

#[test]
fn test_trait_multi_binding_preserves_order() {
    trait Plugin: Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct First;
    struct Second;

    impl Plugin for First {
        fn name(&self) -> &'static str {
            "first"
        }
    }

    impl Plugin for Second {
        fn name(&self) -> &'static str {
            "second"
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait::<dyn Plugin>(Arc::new(First));
    sc.add_transient_trait_factory::<dyn Plugin, _>(|_| Arc::new(Second));

    let sp = sc.build();
    let names: Vec<_> = sp.get_all::<dyn Plugin>().unwrap().iter().map(|p| p.name()).collect();
    assert_eq!(names, ["first", "second"]);
    assert_eq!(sp.get_required::<dyn Plugin>().name(), "second");
}

#[test]
fn test_scoped_lifetime_rules() {
    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<String, _>(|_| "request".to_string());

    assert_eq!(sc.get_service_descriptors()[0].lifetime, Lifetime::Scoped);

    let sp = sc.build();
    assert!(matches!(sp.get::<String>(), Err(DiError::WrongLifetime(_))));

    let scope = sp.create_scope();
    let first = scope.get_required::<String>();
    assert!(Arc::ptr_eq(&first, &scope.get_required::<String>()));
}

#[test]
fn test_named_singletons() {
    let mut sc = ServiceCollection::new();
    sc.add_named_singleton("primary", "db-1".to_string());
    sc.add_named_singleton("replica", "db-2".to_string());

    let sp = sc.build();
    assert_eq!(*sp.get_named_required::<String>("replica"), "db-2");
    assert!(sp.get::<String>().is_err());
}
