//! Integration tests for path resolution against a store snapshot.

use std::sync::Arc;

use h5rest::resolve::{PathResolver, ResolvedTarget};
use h5rest::transport::MemoryTransport;
use h5rest::{ObjectKind, ObjectRef, Request, Transport, TransportError};

const STORE: &str = r#"{
    "/home/test/main.h5": {
        "/": {"root": "g-root", "version": "0.9.0"},
        "/groups/g-root/links/g1": {"link": {"class": "H5L_TYPE_HARD", "id": "g-1", "collection": "groups", "title": "g1"}},
        "/groups/g-1/links/g2": {"link": {"class": "H5L_TYPE_HARD", "id": "g-2", "collection": "groups", "title": "g2"}},
        "/groups/g-2/links/d1": {"link": {"class": "H5L_TYPE_HARD", "id": "d-1", "collection": "datasets", "title": "d1"}},
        "/groups/g-root/links/groups": {"link": {"class": "H5L_TYPE_HARD", "id": "g-groups", "collection": "groups"}},
        "/groups/g-groups/links/real": {"link": {"class": "H5L_TYPE_HARD", "id": "g-real", "collection": "groups"}},
        "/groups/g-2/links/sl": {"link": {"class": "H5L_TYPE_SOFT", "h5path": "/groups/real", "title": "sl"}},
        "/groups/g-2/links/rel": {"link": {"class": "H5L_TYPE_SOFT", "h5path": "g1/g2/d1", "title": "rel"}},
        "/groups/g-1/links/ext": {"link": {"class": "H5L_TYPE_EXTERNAL", "h5domain": "/home/test/other.h5", "h5path": "/t1"}},
        "/groups/g-1/links/extg": {"link": {"class": "H5L_TYPE_EXTERNAL", "h5domain": "/home/test/other.h5", "h5path": "/sub"}},
        "/groups/g-1/links/weird%20name": {"link": {"class": "H5L_TYPE_HARD", "id": "t-9", "collection": "datatypes"}}
    },
    "/home/test/other.h5": {
        "/": {"root": "g-other"},
        "/groups/g-other/links/t1": {"link": {"class": "H5L_TYPE_HARD", "id": "t-1", "collection": "datatypes"}},
        "/groups/g-other/links/sub": {"link": {"class": "H5L_TYPE_HARD", "id": "g-sub", "collection": "groups"}},
        "/groups/g-sub/links/leaf": {"link": {"class": "H5L_TYPE_HARD", "id": "d-leaf", "collection": "datasets"}}
    }
}"#;

fn setup() -> (MemoryTransport, ObjectRef) {
    let transport = MemoryTransport::from_store_json(STORE).expect("store");
    let domain = PathResolver::new(&transport).open_domain("/home/test/main.h5").expect("domain");
    let root = ObjectRef::root(Arc::new(domain));
    (transport, root)
}

#[test]
fn test_three_lookups_for_three_segments() {
    let (transport, root) = setup();
    let before = transport.request_count();
    let target = PathResolver::new(&transport).resolve(&root, "g1/g2/d1", None).expect("resolve");
    assert_eq!(target.kind, ObjectKind::Dataset);
    assert_eq!(target.uri, "d-1");
    assert_eq!(transport.request_count() - before, 3);
}

#[test]
fn test_soft_link_resolves_from_original_start() {
    let (transport, root) = setup();
    let r = PathResolver::new(&transport);

    let target = r.resolve(&root, "g1/g2/sl", None).expect("absolute soft link");
    assert_eq!(target.uri, "g-real");

    // a relative value is taken from the start object, not from g2
    let target = r.resolve(&root, "g1/g2/rel", None).expect("relative soft link");
    assert_eq!(target.uri, "d-1");
}

#[test]
fn test_external_link_switches_domain() {
    let (transport, root) = setup();
    let target = PathResolver::new(&transport).resolve(&root, "/g1/ext", None).expect("resolve");
    assert_eq!(
        target,
        ResolvedTarget {
            kind: ObjectKind::Datatype,
            uri: "t-1".into(),
            domain_path: "/home/test/other.h5".into(),
        }
    );
    assert_eq!(transport.released(), vec!["/home/test/other.h5".to_string()]);
}

/// Fails every fetch on a domain after it has been released.
struct ReleaseCheckingTransport(MemoryTransport);

impl Transport for ReleaseCheckingTransport {
    fn fetch(&self, request: &Request) -> Result<String, TransportError> {
        if self.0.released().contains(&request.domain) {
            return Err(TransportError::Failed {
                endpoint: request.endpoint.clone(),
                message: format!("{} already released", request.domain),
            });
        }
        self.0.fetch(request)
    }

    fn release_domain(&self, domain: &str) {
        self.0.release_domain(domain);
    }
}

#[test]
fn test_lookup_below_external_group() {
    let (transport, root) = setup();
    let transport = ReleaseCheckingTransport(transport);
    let target = PathResolver::new(&transport)
        .resolve(&root, "g1/extg/leaf", None)
        .expect("resolve below external link");
    assert_eq!(target.uri, "d-leaf");
    assert_eq!(target.domain_path, "/home/test/other.h5");

    let last = transport.0.requests().pop().expect("requests");
    assert_eq!(last.endpoint, "/groups/g-sub/links/leaf");
    assert_eq!(transport.0.released(), vec!["/home/test/other.h5".to_string()]);
}

#[test]
fn test_names_are_percent_encoded() {
    let (transport, root) = setup();
    let target = PathResolver::new(&transport).resolve(&root, "g1/weird name", None).expect("resolve");
    assert_eq!(target.uri, "t-9");
    assert!(transport
        .requests()
        .iter()
        .any(|r| r.endpoint == "/groups/g-1/links/weird%20name"));
}

#[test]
fn test_missing_link_is_not_found() {
    let (transport, root) = setup();
    let err = PathResolver::new(&transport).resolve(&root, "g1/nothing", None).unwrap_err();
    assert!(err.is_not_found());
    assert!(transport.released().is_empty());
}

#[test]
fn test_self_and_root_shortcuts() {
    let (transport, root) = setup();
    let before = transport.request_count();
    let r = PathResolver::new(&transport);
    let g2 = ObjectRef::new(ObjectKind::Group, "g-2", root.domain.clone());
    assert_eq!(r.resolve(&g2, ".", None).expect("self").uri, "g-2");
    assert_eq!(r.resolve(&g2, "/", None).expect("root").uri, "g-root");
    assert_eq!(r.resolve(&g2, " ./", None).expect("self").uri, "g-2");
    assert_eq!(transport.request_count(), before);
}
