use crate::HostMatch;
use std::collections::BTreeMap;

/// A namespace's declared dependencies on other namespaces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Declaration {
    pub dependencies: Vec<Dependency>,
}

/// Describes the imports of a set of workloads in the declaring namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dependency {
    /// Selects the workloads to which these imports apply. Empty selects all workloads.
    ///
    /// This is retained but is not yet used for resolution: imports apply to all workloads in the
    /// namespace.
    pub source_workload_labels: BTreeMap<String, String>,

    pub imports: Vec<Import>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub namespace: ImportNamespace,
    pub host: HostMatch,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImportNamespace {
    /// Every namespace in the mesh, including namespaces created after the import is declared.
    All,
    Name(String),
}

// === impl Declaration ===

impl Declaration {
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.dependencies.iter().flat_map(|dep| dep.imports.iter())
    }
}

// === impl ImportNamespace ===

impl ImportNamespace {
    pub const WILDCARD: &'static str = "*";
}

impl std::str::FromStr for ImportNamespace {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "" => anyhow::bail!("import namespace must not be empty"),
            Self::WILDCARD => Ok(Self::All),
            name => Ok(Self::Name(name.to_string())),
        }
    }
}
