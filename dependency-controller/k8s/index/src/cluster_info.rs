use dependency_controller_core::ImportMode;

/// Holds cluster metadata.
#[derive(Clone, Debug)]
pub struct ClusterInfo {
    /// The imports applied to namespaces that do not declare a `ServiceDependency`.
    pub default_import_mode: ImportMode,

    /// E.g. "cluster.local"
    pub dns_domain: String,
}

impl ClusterInfo {
    pub(crate) fn service_hostname(&self, ns: &str, svc: &str) -> String {
        format!("{}.{}.svc.{}", svc, ns, self.dns_domain)
    }
}
