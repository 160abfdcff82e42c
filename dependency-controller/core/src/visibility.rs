//! Resolves the set of namespaces and hosts that a consuming namespace may reach.
//!
//! Resolution is a pure function of a namespace's own dependency declaration, the mesh-wide default
//! import mode, and the live set of namespaces (used to expand wildcard imports). Providers do not
//! participate: imports are declared by consumers, so a declaration only ever affects the
//! visibility of the namespace that owns it.

use crate::{ConfigScope, Declaration, HostMatch, ImportMode, ImportNamespace};
use anyhow::Result;
use futures::prelude::*;
use std::{
    collections::{BTreeSet, HashSet},
    hash::BuildHasher,
    pin::Pin,
};

/// Models visibility discovery for a consuming namespace.
#[async_trait::async_trait]
pub trait DiscoverVisibility<T> {
    async fn get_visibility(&self, target: T) -> Result<Visibility>;

    async fn watch_visibility(&self, target: T) -> Result<VisibilityStream>;

    async fn get_visible_artifacts(&self, target: T) -> Result<Vec<Artifact>>;
}

pub type VisibilityStream = Pin<Box<dyn Stream<Item = Visibility> + Send + Sync + 'static>>;

/// The live set of namespace names against which wildcard imports are expanded.
pub trait NamespaceSet {
    fn names(&self) -> impl Iterator<Item = &str>;
}

/// The resolved set of scopes visible to a single consuming namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Visibility {
    namespace: String,
    scopes: BTreeSet<VisibleScope>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisibleScope {
    pub namespace: NamespaceMatch,
    pub host: HostMatch,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamespaceMatch {
    /// Every namespace, as granted by the mesh-wide default import mode.
    All,
    Exact(String),
}

/// An exportable configuration object, e.g. a service, virtual service, or destination rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub namespace: String,
    pub name: String,
    pub hostnames: Vec<String>,
    pub scope: ConfigScope,
}

/// Computes the scopes visible to `namespace`.
///
/// The namespace always sees all of its own hosts. Without a declaration, the mesh-wide `mode`
/// applies. Otherwise, each import is added to the set, with wildcard namespace imports expanded
/// against `namespaces`. The result does not depend on the order of dependencies or imports.
pub fn resolve_visibility<N>(
    namespace: &str,
    declaration: Option<&Declaration>,
    mode: ImportMode,
    namespaces: &N,
) -> Visibility
where
    N: NamespaceSet + ?Sized,
{
    let mut scopes = BTreeSet::new();
    scopes.insert(VisibleScope::all_hosts(namespace));

    match declaration {
        None => {
            if mode == ImportMode::AllNamespaces {
                scopes.insert(VisibleScope::everything());
            }
        }
        Some(declaration) => {
            for import in declaration.imports() {
                match import.namespace {
                    ImportNamespace::All => {
                        for ns in namespaces.names() {
                            scopes.insert(VisibleScope {
                                namespace: NamespaceMatch::Exact(ns.to_string()),
                                host: import.host.clone(),
                            });
                        }
                    }
                    ImportNamespace::Name(ref ns) => {
                        scopes.insert(VisibleScope {
                            namespace: NamespaceMatch::Exact(ns.clone()),
                            host: import.host.clone(),
                        });
                    }
                }
            }
        }
    }

    // Host-narrowed imports are redundant for namespaces that are imported in full.
    let unrestricted = scopes
        .iter()
        .filter(|s| s.host.is_any())
        .map(|s| s.namespace.clone())
        .collect::<HashSet<_>>();
    scopes.retain(|s| s.host.is_any() || !unrestricted.contains(&s.namespace));

    Visibility {
        namespace: namespace.to_string(),
        scopes,
    }
}

// === impl Visibility ===

impl Visibility {
    /// The consuming namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn scopes(&self) -> impl Iterator<Item = &VisibleScope> {
        self.scopes.iter()
    }

    /// Iterates over the distinct namespaces that contribute visible hosts.
    pub fn namespaces(&self) -> impl Iterator<Item = &NamespaceMatch> {
        let mut last = None;
        self.scopes.iter().filter_map(move |s| {
            if last == Some(&s.namespace) {
                return None;
            }
            last = Some(&s.namespace);
            last
        })
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Indicates whether `host` in `namespace` is visible, without regard to config scope.
    pub fn allows(&self, namespace: &str, host: &str) -> bool {
        self.scopes
            .iter()
            .any(|s| s.namespace.matches(namespace) && s.host.matches(host))
    }

    /// Indicates whether an artifact is visible to the consuming namespace.
    ///
    /// Artifacts are always visible within their own namespace. Private artifacts are never
    /// visible outside of it, regardless of imports.
    pub fn is_visible(&self, artifact: &Artifact) -> bool {
        if artifact.namespace == self.namespace {
            return true;
        }
        if artifact.scope.is_private() {
            return false;
        }
        if artifact.hostnames.is_empty() {
            return self
                .scopes
                .iter()
                .any(|s| s.host.is_any() && s.namespace.matches(&artifact.namespace));
        }
        artifact
            .hostnames
            .iter()
            .any(|host| self.allows(&artifact.namespace, host))
    }
}

// === impl VisibleScope ===

impl VisibleScope {
    pub fn all_hosts(namespace: impl Into<String>) -> Self {
        Self {
            namespace: NamespaceMatch::Exact(namespace.into()),
            host: HostMatch::Any,
        }
    }

    pub fn everything() -> Self {
        Self {
            namespace: NamespaceMatch::All,
            host: HostMatch::Any,
        }
    }
}

// === impl NamespaceMatch ===

impl NamespaceMatch {
    pub fn matches(&self, namespace: &str) -> bool {
        match self {
            Self::All => true,
            Self::Exact(ns) => ns == namespace,
        }
    }
}

// === impl NamespaceSet ===

impl NamespaceSet for BTreeSet<String> {
    fn names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(String::as_str)
    }
}

impl<S: BuildHasher> NamespaceSet for HashSet<String, S> {
    fn names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dependency, Import};
    use maplit::{btreemap, btreeset};

    fn mk_namespaces(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn mk_import(namespace: &str, host: &str) -> Import {
        Import {
            namespace: namespace.parse().unwrap(),
            host: host.parse().unwrap(),
        }
    }

    fn mk_declaration(imports: Vec<Vec<Import>>) -> Declaration {
        Declaration {
            dependencies: imports
                .into_iter()
                .map(|imports| Dependency {
                    imports,
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn scopes(vis: &Visibility) -> BTreeSet<VisibleScope> {
        vis.scopes().cloned().collect()
    }

    #[test]
    fn undeclared_all_namespaces() {
        let namespaces = mk_namespaces(&["a", "b", "c"]);
        let vis = resolve_visibility("a", None, ImportMode::AllNamespaces, &namespaces);
        assert_eq!(
            scopes(&vis),
            btreeset![VisibleScope::all_hosts("a"), VisibleScope::everything()]
        );
        for ns in &namespaces {
            assert!(vis.allows(ns, "svc.example.com"), "{ns} must be visible");
        }
        // Namespaces that don't exist yet are visible, too.
        assert!(vis.allows("d", "svc.example.com"));
    }

    #[test]
    fn undeclared_same_namespace() {
        let namespaces = mk_namespaces(&["a", "b"]);
        let vis = resolve_visibility("a", None, ImportMode::SameNamespace, &namespaces);
        assert_eq!(scopes(&vis), btreeset![VisibleScope::all_hosts("a")]);
        assert!(!vis.allows("b", "svc.b.svc.cluster.local"));
    }

    #[test]
    fn explicit_namespace_import() {
        let namespaces = mk_namespaces(&["prod-us1", "prod-apis", "staging"]);
        let decl = mk_declaration(vec![vec![mk_import("prod-apis", "")]]);
        for mode in [ImportMode::SameNamespace, ImportMode::AllNamespaces] {
            let vis = resolve_visibility("prod-us1", Some(&decl), mode, &namespaces);
            assert_eq!(
                scopes(&vis),
                btreeset![
                    VisibleScope::all_hosts("prod-us1"),
                    VisibleScope::all_hosts("prod-apis"),
                ],
                "the default mode must not apply when a declaration exists"
            );
            assert!(!vis.allows("staging", "svc.staging.svc.cluster.local"));
        }
    }

    #[test]
    fn wildcard_import_expands_dynamically() {
        let mut namespaces = mk_namespaces(&["a", "b", "metrics-collection"]);
        let decl = mk_declaration(vec![vec![mk_import("*", "")]]);

        let vis = resolve_visibility(
            "metrics-collection",
            Some(&decl),
            ImportMode::SameNamespace,
            &namespaces,
        );
        assert_eq!(
            scopes(&vis),
            btreeset![
                VisibleScope::all_hosts("metrics-collection"),
                VisibleScope::all_hosts("a"),
                VisibleScope::all_hosts("b"),
            ]
        );

        namespaces.insert("c".to_string());
        let vis = resolve_visibility(
            "metrics-collection",
            Some(&decl),
            ImportMode::SameNamespace,
            &namespaces,
        );
        assert_eq!(
            scopes(&vis),
            btreeset![
                VisibleScope::all_hosts("metrics-collection"),
                VisibleScope::all_hosts("a"),
                VisibleScope::all_hosts("b"),
                VisibleScope::all_hosts("c"),
            ]
        );
    }

    #[test]
    fn own_namespace_is_always_visible() {
        let namespaces = mk_namespaces(&["a", "b"]);
        let decl = mk_declaration(vec![vec![mk_import("b", "api.example.com")]]);
        let empty = mk_declaration(vec![]);
        for decl in [Some(&decl), Some(&empty), None] {
            for mode in [ImportMode::SameNamespace, ImportMode::AllNamespaces] {
                let vis = resolve_visibility("a", decl, mode, &namespaces);
                assert!(scopes(&vis).contains(&VisibleScope::all_hosts("a")));
                assert!(vis.allows("a", "anything.a.svc.cluster.local"));
            }
        }
    }

    #[test]
    fn declaration_order_is_irrelevant() {
        let namespaces = mk_namespaces(&["a", "b", "c", "d"]);
        let forward = mk_declaration(vec![
            vec![mk_import("b", ""), mk_import("c", "*.example.com")],
            vec![mk_import("d", "api.example.com"), mk_import("b", "")],
        ]);
        let reversed = mk_declaration(vec![
            vec![mk_import("b", ""), mk_import("d", "api.example.com")],
            vec![mk_import("c", "*.example.com"), mk_import("b", "")],
        ]);
        let a = resolve_visibility("a", Some(&forward), ImportMode::SameNamespace, &namespaces);
        let b = resolve_visibility("a", Some(&reversed), ImportMode::SameNamespace, &namespaces);
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn host_narrowed_import() {
        let namespaces = mk_namespaces(&["a", "b"]);
        let decl = mk_declaration(vec![vec![mk_import("b", "*.example.com")]]);
        let vis = resolve_visibility("a", Some(&decl), ImportMode::SameNamespace, &namespaces);
        assert!(vis.allows("b", "api.example.com"));
        assert!(!vis.allows("b", "api.example.org"));
        assert_eq!(
            vis.namespaces().cloned().collect::<Vec<_>>(),
            vec![
                NamespaceMatch::Exact("a".to_string()),
                NamespaceMatch::Exact("b".to_string()),
            ]
        );
    }

    #[test]
    fn redundant_host_imports_are_pruned() {
        let namespaces = mk_namespaces(&["a", "b"]);
        let decl = mk_declaration(vec![vec![
            mk_import("b", "api.example.com"),
            mk_import("*", ""),
        ]]);
        let vis = resolve_visibility("a", Some(&decl), ImportMode::SameNamespace, &namespaces);
        assert_eq!(
            scopes(&vis),
            btreeset![VisibleScope::all_hosts("a"), VisibleScope::all_hosts("b")]
        );
    }

    #[test]
    fn labels_do_not_affect_resolution() {
        let namespaces = mk_namespaces(&["a", "b"]);
        let unlabeled = mk_declaration(vec![vec![mk_import("b", "")]]);
        let labeled = Declaration {
            dependencies: vec![Dependency {
                source_workload_labels: btreemap! { "app".to_string() => "web".to_string() },
                imports: vec![mk_import("b", "")],
            }],
        };
        assert_eq!(
            resolve_visibility("a", Some(&unlabeled), ImportMode::SameNamespace, &namespaces),
            resolve_visibility("a", Some(&labeled), ImportMode::SameNamespace, &namespaces),
        );
    }

    #[test]
    fn private_artifacts_are_not_exported() {
        let namespaces = mk_namespaces(&["a", "m"]);
        let decl = mk_declaration(vec![vec![mk_import("m", "")]]);
        let private = Artifact {
            namespace: "m".to_string(),
            name: "db".to_string(),
            hostnames: vec!["db.m.svc.cluster.local".to_string()],
            scope: ConfigScope::Private,
        };
        let public = Artifact {
            name: "api".to_string(),
            hostnames: vec!["api.m.svc.cluster.local".to_string()],
            scope: ConfigScope::Public,
            ..private.clone()
        };

        for (decl, mode) in [
            (Some(&decl), ImportMode::SameNamespace),
            (None, ImportMode::AllNamespaces),
        ] {
            let vis = resolve_visibility("a", decl, mode, &namespaces);
            assert!(vis.allows("m", "db.m.svc.cluster.local"));
            assert!(!vis.is_visible(&private));
            assert!(vis.is_visible(&public));
        }

        let own = resolve_visibility("m", None, ImportMode::SameNamespace, &namespaces);
        assert!(own.is_visible(&private));
    }

    #[test]
    fn artifacts_filtered_by_host() {
        let namespaces = mk_namespaces(&["a", "m"]);
        let decl = mk_declaration(vec![vec![mk_import("m", "api.m.svc.cluster.local")]]);
        let vis = resolve_visibility("a", Some(&decl), ImportMode::SameNamespace, &namespaces);
        let api = Artifact {
            namespace: "m".to_string(),
            name: "api".to_string(),
            hostnames: vec!["api.m.svc.cluster.local".to_string()],
            scope: ConfigScope::Public,
        };
        let web = Artifact {
            name: "web".to_string(),
            hostnames: vec!["web.m.svc.cluster.local".to_string()],
            ..api.clone()
        };
        let hostless = Artifact {
            name: "rule".to_string(),
            hostnames: vec![],
            ..api.clone()
        };
        assert!(vis.is_visible(&api));
        assert!(!vis.is_visible(&web));
        assert!(
            !vis.is_visible(&hostless),
            "host-narrowed imports must not expose artifacts without hosts"
        );
    }
}
