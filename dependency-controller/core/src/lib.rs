#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod declaration;
mod host_match;
mod scope;
pub mod visibility;

pub use self::{
    declaration::{Declaration, Dependency, Import, ImportNamespace},
    host_match::HostMatch,
    scope::{ConfigScope, ImportMode},
    visibility::{
        resolve_visibility, Artifact, DiscoverVisibility, NamespaceMatch, NamespaceSet,
        Visibility, VisibilityStream, VisibleScope,
    },
};

/// The only resource name under which a namespace may declare its dependencies.
pub const DECLARATION_NAME: &str = "default";
