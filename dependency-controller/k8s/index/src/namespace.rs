use crate::Index;
use dependency_controller_k8s_api::{Namespace, ResourceExt};
use kubert::index::ClusterRemoved;
use std::collections::BTreeSet;
use tracing::info_span;

impl kubert::index::IndexClusterResource<Namespace> for Index {
    fn apply(&mut self, ns: Namespace) {
        let name = ns.name_unchecked();
        let _span = info_span!("apply", ns = %name).entered();

        if self.namespaces.insert(name) {
            tracing::debug!("Added namespace");
            self.reindex();
        }
    }

    fn delete(&mut self, name: String) {
        let _span = info_span!("delete", ns = %name).entered();

        if self.namespaces.remove(&name) {
            tracing::debug!("Removed namespace");
            self.reindex();
        }
    }

    fn reset(&mut self, namespaces: Vec<Namespace>, _removed: ClusterRemoved) {
        let _span = info_span!("reset").entered();

        // The live set replaces the index's namespaces wholesale.
        let namespaces = namespaces
            .into_iter()
            .map(|ns| ns.name_unchecked())
            .collect::<BTreeSet<_>>();
        if namespaces != self.namespaces {
            tracing::debug!(count = namespaces.len(), "Reset namespaces");
            self.namespaces = namespaces;
            self.reindex();
        }
    }
}
