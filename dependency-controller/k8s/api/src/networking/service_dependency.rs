use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Describes the namespaces (and hosts) that the workloads in a namespace depend on.
///
/// A namespace may hold at most one `ServiceDependency`, and it must be named `default`. Workloads
/// always see their own namespace; imports only add visibility into other namespaces.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema,
)]
#[kube(
    group = "networking.istio.io",
    version = "v1alpha3",
    kind = "ServiceDependency",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDependencySpec {
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// The imports of a set of workloads in the namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// Selects the workloads to which the imports apply. When unset, all workloads in the
    /// namespace are selected.
    ///
    /// Not yet enforced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_workload_labels: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub imports: Vec<Import>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    /// A namespace name, or `*` for all namespaces.
    pub namespace: String,

    /// An FQDN or a wildcard-prefixed DNS name (e.g. `*.example.com`). When unset, all hosts in
    /// the namespace are imported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::{CustomResourceExt, Resource};
    use maplit::btreemap;

    #[test]
    fn resource_type() {
        assert_eq!(ServiceDependency::group(&()), "networking.istio.io");
        assert_eq!(ServiceDependency::kind(&()), "ServiceDependency");
        assert_eq!(
            ServiceDependency::crd_name(),
            "servicedependencies.networking.istio.io"
        );
    }

    #[test]
    fn labels_round_trip() {
        let doc = serde_json::json!({
            "apiVersion": "networking.istio.io/v1alpha3",
            "kind": "ServiceDependency",
            "metadata": { "name": "default", "namespace": "prod-us1" },
            "spec": {
                "dependencies": [{
                    "sourceWorkloadLabels": { "app": "productpage" },
                    "imports": [
                        { "namespace": "prod-apis" },
                        { "namespace": "*", "host": "*.example.com" },
                    ],
                }],
            },
        });

        let sd = serde_json::from_value::<ServiceDependency>(doc.clone()).unwrap();
        assert_eq!(
            sd.spec.dependencies[0].source_workload_labels,
            Some(btreemap! { "app".to_string() => "productpage".to_string() })
        );
        assert_eq!(
            sd.spec.dependencies[0].imports,
            vec![
                Import {
                    namespace: "prod-apis".to_string(),
                    host: None,
                },
                Import {
                    namespace: "*".to_string(),
                    host: Some("*.example.com".to_string()),
                },
            ]
        );

        let spec = serde_json::to_value(&sd.spec).unwrap();
        assert_eq!(spec, doc["spec"]);
    }

    #[test]
    fn empty_spec() {
        let spec = serde_json::from_value::<ServiceDependencySpec>(serde_json::json!({})).unwrap();
        assert_eq!(spec, ServiceDependencySpec::default());
    }
}
