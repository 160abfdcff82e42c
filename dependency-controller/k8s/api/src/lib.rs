#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod networking;

pub use k8s_openapi::api::{
    self,
    core::v1::{Namespace, Service, ServiceSpec},
};
pub use kube::{
    api::{ObjectMeta, Resource, ResourceExt},
    Client,
};
