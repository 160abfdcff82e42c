use crate::{
    admission::Admission,
    core::ImportMode,
    index::{self, ClusterInfo},
    k8s::{self, networking::ServiceDependency, Client, Resource},
};
use anyhow::{bail, Result};
use clap::Parser;
use kube::runtime::watcher;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tracing::{info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "dependency",
    about = "Resolves namespace visibility from ServiceDependency resources"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "dependency=info,warn",
        env = "DEPENDENCY_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    server: kubert::ServerArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Disables the admission controller server.
    #[clap(long)]
    admission_controller_disabled: bool,

    #[clap(long, default_value = "cluster.local")]
    cluster_domain: String,

    /// The visibility of namespaces that do not declare their dependencies.
    #[clap(long, default_value = "all-namespaces")]
    default_import_mode: ImportMode,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            server,
            admission_controller_disabled,
            cluster_domain,
            default_import_mode,
        } = self;

        let server = if admission_controller_disabled {
            None
        } else {
            Some(server)
        };

        let cluster_info = Arc::new(ClusterInfo {
            default_import_mode,
            dns_domain: cluster_domain,
        });

        // Build the index which maintains the visibility of each namespace.
        let index = index::Index::shared(cluster_info);

        let mut prom = <Registry>::default();
        index::metrics::register(
            prom.sub_registry_with_prefix("visibility_index"),
            index.clone(),
        );
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .with_optional_server(server)
            .build()
            .await?;

        tracing::info!(%default_import_mode, "Resolving visibility");

        // Spawn resource watches.

        let namespaces = runtime.watch_all::<k8s::Namespace>(watcher::Config::default());
        tokio::spawn(
            kubert::index::cluster(index.clone(), namespaces).instrument(info_span!("namespaces")),
        );

        if api_resource_exists::<ServiceDependency>(&runtime.client()).await {
            let service_dependencies =
                runtime.watch_all::<ServiceDependency>(watcher::Config::default());
            tokio::spawn(
                kubert::index::namespaced(index.clone(), service_dependencies)
                    .instrument(info_span!("servicedependencies.networking.istio.io")),
            );
        } else {
            tracing::warn!(
                "servicedependencies.networking.istio.io resource kind not found, skipping watches"
            );
        }

        let services = runtime.watch_all::<k8s::Service>(watcher::Config::default());
        tokio::spawn(
            kubert::index::namespaced(index.clone(), services).instrument(info_span!("services")),
        );

        let runtime = runtime.spawn_server(Admission::new);

        // Block the main thread on the shutdown signal. Once it fires, wait for the background tasks to
        // complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

async fn api_resource_exists<T>(client: &Client) -> bool
where
    T: Resource,
    T::DynamicType: Default,
{
    let dt = Default::default();
    client
        .list_api_group_resources(&T::api_version(&dt))
        .await
        .ok()
        .iter()
        .flat_map(|r| r.resources.iter())
        .any(|r| r.kind == T::kind(&dt))
}
