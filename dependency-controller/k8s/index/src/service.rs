use crate::Index;
use anyhow::Result;
use dependency_controller_core::{Artifact, ConfigScope};
use dependency_controller_k8s_api::{ResourceExt, Service};
use std::collections::{hash_map::Entry, BTreeMap};
use tracing::info_span;

/// Marks a resource as `PUBLIC` (the default) or `PRIVATE` to its namespace.
pub const CONFIG_SCOPE_ANNOTATION: &str = "networking.istio.io/configScope";

impl kubert::index::IndexNamespacedResource<Service> for Index {
    fn apply(&mut self, svc: Service) {
        let ns = svc.namespace().expect("Service must have a namespace");
        let name = svc.name_unchecked();
        let _span = info_span!("apply", %ns, %name).entered();

        let scope = config_scope(svc.annotations()).unwrap_or_else(|error| {
            tracing::warn!(%error, "Invalid config scope; treating service as public");
            ConfigScope::default()
        });
        let artifact = Artifact {
            hostnames: vec![self.cluster_info.service_hostname(&ns, &name)],
            namespace: ns.clone(),
            name: name.clone(),
            scope,
        };

        tracing::debug!(?artifact, "Indexing Service");
        self.artifacts.entry(ns).or_default().insert(name, artifact);
    }

    fn delete(&mut self, ns: String, name: String) {
        let _span = info_span!("delete", %ns, %name).entered();

        if let Entry::Occupied(mut by_name) = self.artifacts.entry(ns) {
            by_name.get_mut().remove(&name);
            if by_name.get().is_empty() {
                by_name.remove();
            }
        }
    }
}

/// Reads a resource's config scope from its annotations, defaulting to `PUBLIC` when unset.
pub(crate) fn config_scope(annotations: &BTreeMap<String, String>) -> Result<ConfigScope> {
    let scope = annotations
        .get(CONFIG_SCOPE_ANNOTATION)
        .map(|v| v.parse::<ConfigScope>())
        .transpose()?;
    Ok(scope.unwrap_or_default())
}
