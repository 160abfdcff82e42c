//! Dependency Controller Index
//!
//! The index maintains the visibility of each namespace in the mesh. It watches the following
//! cluster resources:
//!
//! - Each `Namespace` is added to the set of namespaces against which wildcard (`*`) imports are
//!   expanded.
//! - A namespace may declare a single `ServiceDependency`, named `default`, that lists the
//!   namespaces (and hosts) its workloads import. Namespaces without a declaration use the
//!   mesh-wide default import mode.
//! - Each `Service` is an exportable artifact. Its config scope is read from an annotation; private
//!   services are never visible outside of their own namespace.
//!
//! ```text
//! [ Namespace ]* <- [ ServiceDependency ] -> [ Visibility ] -> [ Service ]*
//! ```
//!
//! The index is level-triggered: every change to the namespace set or to a declaration advances a
//! global epoch and the visibility of every watched namespace is recomputed from scratch. Cached
//! lookups are only served when they were resolved in the current epoch. A new namespace changes
//! the expansion of wildcard imports for every consumer, so invalidation is never scoped to a
//! single namespace.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cluster_info;
mod index;
pub mod metrics;
mod namespace;
mod service;
mod service_dependency;


pub use self::{
    cluster_info::ClusterInfo,
    index::{Index, SharedIndex},
    service::CONFIG_SCOPE_ANNOTATION,
};
