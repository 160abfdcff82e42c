use crate::Index;
use anyhow::{Context, Result};
use dependency_controller_core::{
    Declaration, Dependency, HostMatch, Import, ImportNamespace, DECLARATION_NAME,
};
use dependency_controller_k8s_api::{
    networking::{ServiceDependency, ServiceDependencySpec},
    ResourceExt,
};
use kubert::index::NamespacedRemoved;
use tracing::info_span;

impl kubert::index::IndexNamespacedResource<ServiceDependency> for Index {
    fn apply(&mut self, sd: ServiceDependency) {
        let ns = sd.namespace().expect("ServiceDependency must be namespaced");
        let name = sd.name_unchecked();
        let _span = info_span!("apply", %ns, %name).entered();

        if self.apply_declaration(ns, name, sd.spec) {
            self.reindex();
        }
    }

    fn delete(&mut self, ns: String, name: String) {
        let _span = info_span!("delete", %ns, %name).entered();

        if name != DECLARATION_NAME {
            return;
        }
        if self.declarations.remove(&ns).is_some() {
            tracing::debug!("Deleted ServiceDependency");
            self.reindex();
        }
    }

    fn reset(&mut self, sds: Vec<ServiceDependency>, removed: NamespacedRemoved) {
        let _span = info_span!("reset").entered();

        let mut changed = false;
        for sd in sds.into_iter() {
            let ns = sd.namespace().expect("ServiceDependency must be namespaced");
            let name = sd.name_unchecked();
            changed = self.apply_declaration(ns, name, sd.spec) || changed;
        }
        for (ns, names) in removed.into_iter() {
            if names.contains(DECLARATION_NAME) && self.declarations.remove(&ns).is_some() {
                tracing::debug!(%ns, "Deleted ServiceDependency");
                changed = true;
            }
        }

        if changed {
            self.reindex();
        }
    }
}

impl Index {
    /// Records a namespace's declaration, returning true if the index changed.
    ///
    /// Resources not named `default` are ignored. A `default` resource that fails to convert is
    /// indexed as an empty declaration, so the namespace sees only itself.
    fn apply_declaration(&mut self, ns: String, name: String, spec: ServiceDependencySpec) -> bool {
        if name != DECLARATION_NAME {
            tracing::warn!(%ns, %name, "Ignoring ServiceDependency not named {DECLARATION_NAME:?}");
            return false;
        }

        let declaration = declaration(spec).unwrap_or_else(|error| {
            tracing::warn!(%ns, %name, %error, "Invalid ServiceDependency; importing no namespaces");
            Declaration::default()
        });

        tracing::debug!(%ns, ?declaration, "Indexing ServiceDependency");
        self.update_declaration(ns, declaration)
    }
}

fn declaration(spec: ServiceDependencySpec) -> Result<Declaration> {
    let dependencies = spec
        .dependencies
        .into_iter()
        .map(|dep| {
            let imports = dep
                .imports
                .into_iter()
                .map(|import| {
                    let namespace = import.namespace.parse::<ImportNamespace>()?;
                    let host = import
                        .host
                        .as_deref()
                        .unwrap_or_default()
                        .parse::<HostMatch>()
                        .with_context(|| format!("invalid import of {:?}", import.namespace))?;
                    Ok(Import { namespace, host })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Dependency {
                source_workload_labels: dep.source_workload_labels.unwrap_or_default(),
                imports,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Declaration { dependencies })
}
