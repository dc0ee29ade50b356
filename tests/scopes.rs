use ferrous_ioc::{Container, DescriptorBuilder, Injectable, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static REQUESTS: AtomicUsize = AtomicUsize::new(0);

struct RequestId(usize);

impl Injectable for RequestId {
    fn describe(d: &mut DescriptorBuilder<Self>) {
        d.constructor()
            .build(|_| Ok(RequestId(REQUESTS.fetch_add(1, Ordering::SeqCst))));
    }
}

struct Database;

impl Injectable for Database {
    fn describe(d: &mut DescriptorBuilder<Self>) {
        d.constructor().build(|_| Ok(Database));
    }
}

struct Handler {
    request: Arc<RequestId>,
    db: Arc<Database>,
}

impl Injectable for Handler {
    fn describe(d: &mut DescriptorBuilder<Self>) {
        d.constructor()
            .param::<RequestId>()
            .param::<Database>()
            .build(|a| {
                Ok(Handler {
                    request: a.service(0)?,
                    db: a.service(1)?,
                })
            });
    }
}

fn container() -> Container {
    let container = Container::new();
    container
        .register_scoped::<RequestId, RequestId>()
        .register_singleton::<Database, Database>()
        .register_transient::<Handler, Handler>();
    container
}

#[test]
fn test_scoped_same_within_scope() {
    let root = container();
    let scope = root.create_scope();

    let a = scope.get_required::<RequestId>();
    let b = scope.get_required::<RequestId>();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_sibling_scopes_are_isolated() {
    let root = container();
    let scope1 = root.create_scope();
    let scope2 = root.create_scope();

    let a = scope1.get_required::<RequestId>();
    let b = scope2.get_required::<RequestId>();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(a.0, b.0);

    // never promoted to the parent
    assert_eq!(root.scoped_count(), 0);
    assert_eq!(scope1.scoped_count(), 1);
}

#[test]
fn test_root_is_a_scope_too() {
    let root = container();
    let a = root.get_required::<RequestId>();
    let b = root.get_required::<RequestId>();
    assert!(Arc::ptr_eq(&a, &b));

    let child = root.create_scope();
    assert!(!Arc::ptr_eq(&a, &child.get_required::<RequestId>()));
}

#[test]
fn test_nested_scope_does_not_see_parent_instances() {
    let root = container();
    let parent = root.create_scope();
    let child = parent.create_scope();

    let from_parent = parent.get_required::<RequestId>();
    let from_child = child.get_required::<RequestId>();
    assert!(!Arc::ptr_eq(&from_parent, &from_child));
}

#[test]
fn test_singletons_are_shared_across_scopes() {
    let root = container();
    let scope1 = root.create_scope();
    let scope2 = root.create_scope();

    let a = scope1.get_required::<Database>();
    let b = scope2.get_required::<Database>();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &root.get_required::<Database>()));
}

#[test]
fn test_transient_uses_current_scope_for_scoped_dependencies() {
    let root = container();
    let scope = root.create_scope();

    let h1 = scope.get_required::<Handler>();
    let h2 = scope.get_required::<Handler>();
    assert!(!Arc::ptr_eq(&h1, &h2));
    assert!(Arc::ptr_eq(&h1.request, &h2.request));
    assert!(Arc::ptr_eq(&h1.db, &h2.db));

    let other = root.create_scope().get_required::<Handler>();
    assert!(!Arc::ptr_eq(&h1.request, &other.request));
    assert!(Arc::ptr_eq(&h1.db, &other.db));
}

#[test]
fn test_registration_in_scope_is_visible_to_whole_tree() {
    struct Late;
    impl Injectable for Late {
        fn describe(d: &mut DescriptorBuilder<Self>) {
            d.constructor().build(|_| Ok(Late));
        }
    }

    let root = Container::new();
    let scope = root.create_scope();
    let sibling = root.create_scope();

    scope.register_transient::<Late, Late>();
    assert!(root.get::<Late>().is_ok());
    assert!(sibling.get::<Late>().is_ok());
}

#[test]
fn test_cloned_handle_shares_scope() {
    let root = container();
    let scope = root.create_scope();
    let handle = scope.clone();

    let a = scope.get_required::<RequestId>();
    let b = handle.get_required::<RequestId>();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_dropping_scope_leaves_others_intact() {
    let root = container();
    let keep = root.create_scope();
    let kept = keep.get_required::<RequestId>();

    {
        let temporary = root.create_scope();
        let _ = temporary.get_required::<RequestId>();
    }

    assert!(Arc::ptr_eq(&kept, &keep.get_required::<RequestId>()));
    // instances handed out outlive their scope
    let orphan = {
        let temporary = root.create_scope();
        temporary.get_required::<RequestId>()
    };
    assert!(orphan.0 != kept.0);
}
