//! Link-by-link path resolution.

use std::sync::Arc;

use serde_json::Value;

use crate::catalog::LinkClass;
use crate::object::{Domain, ObjectKind, ObjectRef};
use crate::transport::{Request, Transport};
use crate::util::json_scan::str_member;
use crate::util::{encode_component, encode_path, is_self_path, normalize_path, split_path, Error, Result};

/// Where a path ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub kind: ObjectKind,
    pub uri: String,
    /// Domain holding the object; differs from the start's after an external link
    pub domain_path: String,
}

impl ResolvedTarget {
    fn of(obj: &ObjectRef) -> Self {
        Self {
            kind: obj.kind,
            uri: obj.uri.clone(),
            domain_path: obj.domain.path.clone(),
        }
    }
}

/// Resolves object paths against a store through a [`Transport`].
pub struct PathResolver<'t, T: Transport + ?Sized> {
    transport: &'t T,
}

impl<'t, T: Transport + ?Sized> PathResolver<'t, T> {
    pub fn new(transport: &'t T) -> Self {
        Self { transport }
    }

    /// Open a domain by path, reading its root group URI.
    pub fn open_domain(&self, path: &str) -> Result<Domain> {
        let body = self.get("/".to_string(), path, path)?;
        let doc: Value = serde_json::from_str(&body)?;
        let root = str_member(&doc, "root")?;
        tracing::debug!(domain = path, root, "opened domain");
        Ok(Domain::new(path, root))
    }

    /// Resolve `path` from `start`.
    ///
    /// With `known = None` every segment is looked up as a link and soft or
    /// external links are followed. With a known kind the store resolves the
    /// whole path in a single request.
    ///
    /// Domains opened for external links stay open until this returns.
    pub fn resolve(&self, start: &ObjectRef, path: &str, known: Option<ObjectKind>) -> Result<ResolvedTarget> {
        let mut opened = Vec::new();
        self.resolve_at(start, path, known, 0, &mut opened)
    }

    #[tracing::instrument(level = "debug", skip(self, start, known, opened))]
    fn resolve_at(
        &self,
        start: &ObjectRef,
        path: &str,
        known: Option<ObjectKind>,
        depth: usize,
        opened: &mut Vec<DomainGuard<'t, T>>,
    ) -> Result<ResolvedTarget> {
        let path = normalize_path(path);
        if is_self_path(path) {
            return Ok(ResolvedTarget::of(start));
        }
        if path == "/" {
            return Ok(ResolvedTarget::of(&ObjectRef::root(start.domain.clone())));
        }

        match known {
            Some(kind) => self.resolve_known(start, path, kind),
            None => self.resolve_links(start, path, depth, opened),
        }
    }

    fn resolve_links(
        &self,
        start: &ObjectRef,
        path: &str,
        depth: usize,
        opened: &mut Vec<DomainGuard<'t, T>>,
    ) -> Result<ResolvedTarget> {
        let (dir, base) = split_path(path);
        let parent = if dir == "/" {
            ObjectRef::root(start.domain.clone())
        } else if is_self_path(dir) {
            start.clone()
        } else {
            let target = self.resolve_at(start, dir, None, depth + 1, opened)?;
            let domain = if target.domain_path == start.domain.path {
                start.domain.clone()
            } else {
                // reached through an external link; only its uri is used below
                Arc::new(Domain::new(target.domain_path, String::new()))
            };
            ObjectRef::new(target.kind, target.uri, domain)
        };
        if parent.kind != ObjectKind::Group {
            return Err(Error::invalid(format!(
                "'{dir}' is a {}, not a group",
                parent.kind
            )));
        }

        let endpoint = format!(
            "/groups/{}/links/{}",
            encode_component(&parent.uri),
            encode_component(base)
        );
        let body = self.get(endpoint, &parent.domain.path, path)?;
        let doc: Value = serde_json::from_str(&body)?;

        match LinkClass::from_json(&doc)? {
            LinkClass::Hard { target_uri, collection } => Ok(ResolvedTarget {
                kind: collection,
                uri: target_uri,
                domain_path: parent.domain.path.clone(),
            }),
            LinkClass::Soft { path: value } => {
                tracing::debug!(link = base, target = %value, "following soft link");
                self.resolve_at(start, &value, None, depth + 1, opened)
            }
            LinkClass::External { domain, path: value } => {
                tracing::debug!(link = base, domain = %domain, target = %value, "following external link");
                let target = Arc::new(self.open_domain(&domain)?);
                // released by `resolve` once the whole path is done
                opened.push(DomainGuard {
                    transport: self.transport,
                    path: target.path.clone(),
                });
                self.resolve_at(&ObjectRef::root(target), &value, None, depth + 1, opened)
            }
            LinkClass::UserDefined => Err(Error::unsupported(format!(
                "user-defined link '{path}'"
            ))),
        }
    }

    fn resolve_known(&self, start: &ObjectRef, path: &str, kind: ObjectKind) -> Result<ResolvedTarget> {
        let relative = !path.starts_with('/');
        let encoded = encode_path(path);
        let endpoint = match (kind, relative) {
            (ObjectKind::Group, true) => format!("/groups/{}?h5path={encoded}", encode_component(&start.uri)),
            (ObjectKind::Group, false) => format!("/groups/?h5path={encoded}"),
            (_, true) => format!(
                "/{}/?grpid={}&h5path={encoded}",
                kind.collection(),
                encode_component(&start.uri)
            ),
            (_, false) => format!("/{}/?h5path={encoded}", kind.collection()),
        };

        let body = self.get(endpoint, &start.domain.path, path)?;
        let doc: Value = serde_json::from_str(&body)?;
        let uri = doc
            .pointer("/link/id")
            .or_else(|| doc.get("id"))
            .or_else(|| doc.get("root"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::parse(format!("response for '{path}' carries no object id")))?;

        Ok(ResolvedTarget {
            kind,
            uri: uri.to_string(),
            domain_path: start.domain.path.clone(),
        })
    }

    /// One GET; a 404 becomes `NotFound(path)`.
    fn get(&self, endpoint: String, domain: &str, path: &str) -> Result<String> {
        let request = Request::new(endpoint, domain);
        self.transport.fetch(&request).map_err(|e| {
            if e.is_not_found() {
                Error::NotFound(path.to_string())
            } else {
                e.into()
            }
        })
    }
}

/// Releases a domain opened for an external link when dropped.
struct DomainGuard<'a, T: Transport + ?Sized> {
    transport: &'a T,
    path: String,
}

impl<T: Transport + ?Sized> Drop for DomainGuard<'_, T> {
    fn drop(&mut self) {
        tracing::trace!(domain = %self.path, "releasing domain");
        self.transport.release_domain(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryTransport, TransportError};

    const FILE: &str = "/home/test/f.h5";

    fn hard(id: &str, collection: &str) -> String {
        format!(r#"{{"link": {{"class": "H5L_TYPE_HARD", "id": "{id}", "collection": "{collection}"}}}}"#)
    }

    fn store() -> MemoryTransport {
        MemoryTransport::new()
            .with(FILE, "/groups/g-0/links/g1", hard("g-1", "groups"))
            .with(FILE, "/groups/g-0/links/g2", hard("g-9", "groups"))
            .with(FILE, "/groups/g-1/links/g2", hard("g-2", "groups"))
            .with(FILE, "/groups/g-2/links/d1", hard("d-1", "datasets"))
            .with(
                FILE,
                "/groups/g-1/links/sl",
                r#"{"link": {"class": "H5L_TYPE_SOFT", "h5path": "g2"}}"#,
            )
            .with(
                FILE,
                "/groups/g-0/links/ext",
                r#"{"link": {"class": "H5L_TYPE_EXTERNAL", "h5domain": "/o.h5", "h5path": "/data"}}"#,
            )
            .with(
                FILE,
                "/groups/g-0/links/broken",
                r#"{"link": {"class": "H5L_TYPE_EXTERNAL", "h5domain": "/o.h5", "h5path": "/missing"}}"#,
            )
            .with(FILE, "/groups/g-0/links/ud", r#"{"link": {"class": "H5L_TYPE_UD"}}"#)
            .with("/o.h5", "/", r#"{"root": "g-o"}"#)
            .with("/o.h5", "/groups/g-o/links/data", hard("d-o", "datasets"))
    }

    fn root() -> ObjectRef {
        ObjectRef::root(Arc::new(Domain::new(FILE, "g-0")))
    }

    #[test]
    fn test_segment_by_segment() {
        let t = store();
        let target = PathResolver::new(&t).resolve(&root(), "g1/g2/d1", None).unwrap();
        assert_eq!(target.kind, ObjectKind::Dataset);
        assert_eq!(target.uri, "d-1");
        assert_eq!(target.domain_path, FILE);
        assert_eq!(t.request_count(), 3);

        let absolute = PathResolver::new(&t).resolve(&root(), "/g1/g2/", None).unwrap();
        assert_eq!(absolute.uri, "g-2");
    }

    #[test]
    fn test_self_and_root_need_no_requests() {
        let t = store();
        let r = PathResolver::new(&t);
        let g1 = ObjectRef::new(ObjectKind::Group, "g-1", root().domain);
        assert_eq!(r.resolve(&g1, ".", None).unwrap().uri, "g-1");
        assert_eq!(r.resolve(&g1, "/", None).unwrap().uri, "g-0");
        assert_eq!(r.resolve(&g1, "/", Some(ObjectKind::Group)).unwrap().uri, "g-0");
        assert_eq!(t.request_count(), 0);
    }

    #[test]
    fn test_soft_link_relative_to_start() {
        let t = store();
        // sl lives in g1 but its value "g2" is looked up from the start, the root
        let target = PathResolver::new(&t).resolve(&root(), "g1/sl", None).unwrap();
        assert_eq!(target.uri, "g-9");
    }

    #[test]
    fn test_external_link_released() {
        let t = store();
        let r = PathResolver::new(&t);
        let target = r.resolve(&root(), "ext", None).unwrap();
        assert_eq!(
            target,
            ResolvedTarget {
                kind: ObjectKind::Dataset,
                uri: "d-o".into(),
                domain_path: "/o.h5".into()
            }
        );
        assert_eq!(t.released(), vec!["/o.h5".to_string()]);

        let err = r.resolve(&root(), "broken", None).unwrap_err();
        assert!(matches!(err, Error::NotFound(ref p) if p == "/missing"));
        assert_eq!(t.released().len(), 2);
    }

    /// Refuses any fetch on a domain that was already released.
    struct StrictTransport {
        inner: MemoryTransport,
    }

    impl Transport for StrictTransport {
        fn fetch(&self, request: &Request) -> std::result::Result<String, TransportError> {
            if self.inner.released().contains(&request.domain) {
                return Err(TransportError::Failed {
                    endpoint: request.endpoint.clone(),
                    message: "domain released".into(),
                });
            }
            self.inner.fetch(request)
        }

        fn release_domain(&self, domain: &str) {
            self.inner.release_domain(domain);
        }
    }

    fn strict_store() -> StrictTransport {
        StrictTransport {
            inner: store()
                .with(
                    FILE,
                    "/groups/g-0/links/ext_grp",
                    r#"{"link": {"class": "H5L_TYPE_EXTERNAL", "h5domain": "/o.h5", "h5path": "/grp"}}"#,
                )
                .with("/o.h5", "/groups/g-o/links/grp", hard("g-x", "groups"))
                .with("/o.h5", "/groups/g-x/links/d", hard("d-x", "datasets")),
        }
    }

    #[test]
    fn test_external_domain_open_until_resolved() {
        let t = strict_store();
        let target = PathResolver::new(&t).resolve(&root(), "ext_grp/d", None).unwrap();
        assert_eq!(target.uri, "d-x");
        assert_eq!(target.domain_path, "/o.h5");
        assert_eq!(t.inner.released(), vec!["/o.h5".to_string()]);

        // a failed last lookup still happens before the release
        let t = strict_store();
        let err = PathResolver::new(&t).resolve(&root(), "ext_grp/none", None).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(t.inner.released(), vec!["/o.h5".to_string()]);
    }

    #[test]
    fn test_failures() {
        let t = store();
        let r = PathResolver::new(&t);
        assert!(r.resolve(&root(), "nope", None).unwrap_err().is_not_found());
        assert!(matches!(r.resolve(&root(), "ud", None), Err(Error::Unsupported(_))));
        assert!(matches!(
            r.resolve(&root(), "g1/g2/d1/x", None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_known_kind_single_request() {
        let t = MemoryTransport::new()
            .with(FILE, "/datasets/?grpid=g-0&h5path=g1/d%20x", r#"{"id": "d-7"}"#)
            .with(FILE, "/groups/?h5path=/g1", r#"{"id": "g-1", "root": "g-0"}"#)
            .with(FILE, "/datatypes/?h5path=/t", r#"{"id": "t-3"}"#);
        let r = PathResolver::new(&t);

        let d = r.resolve(&root(), "g1/d x", Some(ObjectKind::Dataset)).unwrap();
        assert_eq!((d.kind, d.uri.as_str()), (ObjectKind::Dataset, "d-7"));
        assert_eq!(r.resolve(&root(), "/g1", Some(ObjectKind::Group)).unwrap().uri, "g-1");
        assert_eq!(r.resolve(&root(), "/t", Some(ObjectKind::Datatype)).unwrap().uri, "t-3");
        assert_eq!(t.request_count(), 3);
    }

    #[test]
    fn test_open_domain() {
        let t = store();
        let domain = PathResolver::new(&t).open_domain("/o.h5").unwrap();
        assert_eq!(domain, Domain::new("/o.h5", "g-o"));
        assert!(PathResolver::new(&t).open_domain("/none.h5").unwrap_err().is_not_found());
    }
}
