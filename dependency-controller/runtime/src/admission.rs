use super::validation;
use crate::{
    core::DECLARATION_NAME,
    k8s::networking::{ServiceDependency, ServiceDependencySpec},
};
use anyhow::{anyhow, bail, Context, Result};
use futures::future;
use http_body_util::BodyExt;
use hyper::{http, Request, Response};
use kube::{core::DynamicObject, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

#[derive(Clone, Debug, Default)]
pub struct Admission {}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read request body: {0}")]
    Request(#[from] hyper::Error),

    #[error("failed to encode json response: {0}")]
    Json(#[from] serde_json::Error),
}

type Review = kube::core::admission::AdmissionReview<DynamicObject>;
type AdmissionRequest = kube::core::admission::AdmissionRequest<DynamicObject>;
type AdmissionResponse = kube::core::admission::AdmissionResponse;
type AdmissionReview = kube::core::admission::AdmissionReview<DynamicObject>;

#[async_trait::async_trait]
trait Validate<T> {
    async fn validate(
        self,
        ns: &str,
        name: &str,
        annotations: &BTreeMap<String, String>,
        spec: T,
    ) -> Result<()>;
}

type Body = http_body_util::Full<bytes::Bytes>;

// === impl AdmissionService ===

impl tower::Service<Request<hyper::body::Incoming>> for Admission {
    type Response = Response<Body>;
    type Error = Error;
    type Future = future::BoxFuture<'static, Result<Response<Body>, Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<hyper::body::Incoming>) -> Self::Future {
        trace!(?req);
        if req.method() != http::Method::POST || req.uri().path() != "/" {
            return Box::pin(future::ok(not_found()));
        }

        let admission = self.clone();
        Box::pin(async move {
            let bytes = req.into_body().collect().await?.to_bytes();
            json_response(admission.review(&bytes).await)
        })
    }
}

impl Admission {
    pub fn new() -> Self {
        Self {}
    }

    /// Decodes an `AdmissionReview` and answers it.
    async fn review(self, bytes: &[u8]) -> AdmissionReview {
        let review: Review = match serde_json::from_slice(bytes) {
            Ok(review) => review,
            Err(error) => {
                warn!(%error, "Failed to parse request body");
                return AdmissionResponse::invalid(error).into_review();
            }
        };
        trace!(?review);

        let rsp = match review.try_into() {
            Ok(req) => {
                debug!(?req);
                self.admit(req).await
            }
            Err(error) => {
                warn!(%error, "Invalid admission request");
                AdmissionResponse::invalid(error)
            }
        };
        debug!(?rsp);
        rsp.into_review()
    }

    async fn admit(self, req: AdmissionRequest) -> AdmissionResponse {
        if is_kind::<ServiceDependency>(&req) {
            return self.admit_spec::<ServiceDependencySpec>(req).await;
        }

        AdmissionResponse::invalid(format_args!(
            "unsupported resource type: {}.{}.{}",
            req.kind.group, req.kind.version, req.kind.kind
        ))
    }

    async fn admit_spec<T>(self, req: AdmissionRequest) -> AdmissionResponse
    where
        T: DeserializeOwned,
        Self: Validate<T>,
    {
        let rsp = AdmissionResponse::from(&req);

        let kind = req.kind.kind.clone();
        let (obj, spec) = match parse_spec::<T>(req) {
            Ok(spec) => spec,
            Err(error) => {
                info!(%error, "Failed to parse {} spec", kind);
                return rsp.deny(error);
            }
        };

        let ns = obj.namespace().unwrap_or_default();
        let name = obj.name_any();
        let annotations = obj.annotations();

        if let Err(error) = self.validate(&ns, &name, annotations, spec).await {
            info!(%error, %ns, %name, %kind, "Denied");
            return rsp.deny(error);
        }

        rsp
    }
}

fn is_kind<T>(req: &AdmissionRequest) -> bool
where
    T: Resource,
    T::DynamicType: Default,
{
    let dt = Default::default();
    req.kind.group.eq_ignore_ascii_case(&T::group(&dt))
        && req.kind.kind.eq_ignore_ascii_case(&T::kind(&dt))
}

fn not_found() -> Response<Body> {
    Response::builder()
        .status(http::StatusCode::NOT_FOUND)
        .body(Body::default())
        .expect("not found response must be valid")
}

fn json_response(rsp: AdmissionReview) -> Result<Response<Body>, Error> {
    let bytes = serde_json::to_vec(&rsp)?;
    Ok(Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("admission review response must be valid"))
}

fn parse_spec<T: DeserializeOwned>(req: AdmissionRequest) -> Result<(DynamicObject, T)> {
    let obj = req
        .object
        .ok_or_else(|| anyhow!("admission request missing 'object"))?;

    let spec = {
        let data = obj
            .data
            .get("spec")
            .cloned()
            .ok_or_else(|| anyhow!("admission request missing 'spec'"))?;
        serde_json::from_value(data)?
    };

    Ok((obj, spec))
}

#[async_trait::async_trait]
impl Validate<ServiceDependencySpec> for Admission {
    async fn validate(
        self,
        _ns: &str,
        name: &str,
        _annotations: &BTreeMap<String, String>,
        spec: ServiceDependencySpec,
    ) -> Result<()> {
        // A namespace may hold at most one declaration.
        if name != DECLARATION_NAME {
            bail!("ServiceDependency must be named {DECLARATION_NAME:?}, not {name:?}");
        }

        if spec.dependencies.is_empty() {
            bail!("at least one dependency must be specified");
        }

        for (i, dep) in spec.dependencies.iter().enumerate() {
            if dep.imports.is_empty() {
                bail!("dependencies[{i}] must specify at least one import");
            }

            if let Some(labels) = &dep.source_workload_labels {
                if labels.keys().any(|k| k.is_empty()) {
                    bail!("dependencies[{i}].sourceWorkloadLabels must not have empty keys");
                }
            }

            for (j, import) in dep.imports.iter().enumerate() {
                validation::validate_import_namespace(&import.namespace)
                    .with_context(|| format!("dependencies[{i}].imports[{j}]"))?;
                validation::validate_import_host(import.host.as_deref().unwrap_or_default())
                    .with_context(|| format!("dependencies[{i}].imports[{j}]"))?;
            }
        }

        Ok(())
    }
}
