#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use dependency_controller_core as core;
pub use dependency_controller_k8s_api as k8s;
pub use dependency_controller_k8s_index as index;

mod admission;
mod args;
mod validation;

pub use self::{admission::Admission, args::Args};

/// Serves namespace visibility from the shared index.
#[derive(Clone, Debug)]
pub struct VisibilityDiscover(index::SharedIndex);

impl VisibilityDiscover {
    pub fn new(index: index::SharedIndex) -> Self {
        Self(index)
    }
}

#[async_trait::async_trait]
impl core::DiscoverVisibility<String> for VisibilityDiscover {
    async fn get_visibility(&self, namespace: String) -> anyhow::Result<core::Visibility> {
        Ok(self.0.read().visibility(&namespace))
    }

    async fn watch_visibility(&self, namespace: String) -> anyhow::Result<core::VisibilityStream> {
        let rx = self.0.write().visibility_rx(&namespace);
        Ok(Box::pin(tokio_stream::wrappers::WatchStream::new(rx)))
    }

    async fn get_visible_artifacts(&self, namespace: String) -> anyhow::Result<Vec<core::Artifact>> {
        Ok(self.0.read().visible_artifacts(&namespace))
    }
}
