use crate::SharedIndex;
use prometheus_client::{
    collector::Collector,
    encoding::{DescriptorEncoder, EncodeMetric},
    metrics::{gauge::ConstGauge, MetricType},
    registry::Registry,
};

#[derive(Debug)]
struct Instrumented(SharedIndex);

pub fn register(reg: &mut Registry, index: SharedIndex) {
    reg.register_collector(Box::new(Instrumented(index)));
}

impl Collector for Instrumented {
    fn encode(&self, mut encoder: DescriptorEncoder<'_>) -> Result<(), std::fmt::Error> {
        let this = self.0.read();

        let namespace_encoder = encoder.encode_descriptor(
            "namespace_index_size",
            "The number of entries in the namespace index",
            None,
            MetricType::Gauge,
        )?;
        let namespaces = ConstGauge::new(this.namespaces.len() as i64);
        namespaces.encode(namespace_encoder)?;

        let declaration_encoder = encoder.encode_descriptor(
            "declaration_index_size",
            "The number of entries in the service dependency index",
            None,
            MetricType::Gauge,
        )?;
        let declarations = ConstGauge::new(this.declarations.len() as i64);
        declarations.encode(declaration_encoder)?;

        let subscriber_encoder = encoder.encode_descriptor(
            "subscriber_index_size",
            "The number of namespaces with watched visibility",
            None,
            MetricType::Gauge,
        )?;
        let watches = ConstGauge::new(this.watches.len() as i64);
        watches.encode(subscriber_encoder)?;

        let epoch_encoder = encoder.encode_descriptor(
            "epoch",
            "The number of times the index has been reindexed",
            None,
            MetricType::Gauge,
        )?;
        let epoch = ConstGauge::new(this.epoch as i64);
        epoch.encode(epoch_encoder)?;

        let mut artifact_encoder = encoder.encode_descriptor(
            "artifact_index_size",
            "The number of entries in the artifact index",
            None,
            MetricType::Gauge,
        )?;
        for (ns, artifacts) in &this.artifacts {
            let labels = vec![("namespace", ns.as_str())];
            let size = ConstGauge::new(artifacts.len() as i64);
            let artifact_encoder = artifact_encoder.encode_family(&labels)?;
            size.encode(artifact_encoder)?;
        }

        Ok(())
    }
}
