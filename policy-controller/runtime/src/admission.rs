use crate::{
    core::{evaluate_ingress, PolicyConfig, Verdict},
    k8s::{networking, Ingress},
    metrics::{AdmissionMetrics, Endpoint, Outcome},
    protocol,
};
use anyhow::{Context, Result};
use futures::future;
use http_body_util::BodyExt;
use hyper::{http, Request, Response};
use kube::{core::DynamicObject, Resource};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Serves admission requests for Ingress resources.
///
/// `POST /` accepts Kubernetes `AdmissionReview`s, evaluated with the
/// process-wide policy settings. `POST /validate` and
/// `POST /validate_settings` accept the Kubewarden envelope, which carries its
/// own settings.
#[derive(Clone, Debug)]
pub struct Admission {
    config: PolicyConfig,
    metrics: AdmissionMetrics,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read request body: {0}")]
    Request(Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to encode json response: {0}")]
    Json(#[from] serde_json::Error),
}

type AdmissionRequest = kube::core::admission::AdmissionRequest<DynamicObject>;
type AdmissionResponse = kube::core::admission::AdmissionResponse;
type AdmissionReview = kube::core::admission::AdmissionReview<DynamicObject>;

type Body = http_body_util::Full<bytes::Bytes>;

// === impl Admission ===

impl<B> tower::Service<Request<B>> for Admission
where
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = Response<Body>;
    type Error = Error;
    type Future = future::BoxFuture<'static, Result<Response<Body>, Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        trace!(method = %req.method(), uri = %req.uri());
        let endpoint = match req.uri().path() {
            "/" => Some(Endpoint::AdmissionReview),
            "/validate" => Some(Endpoint::Validate),
            "/validate_settings" => Some(Endpoint::ValidateSettings),
            _ => None,
        };
        let Some(endpoint) = endpoint.filter(|_| req.method() == http::Method::POST) else {
            return Box::pin(future::ok(
                Response::builder()
                    .status(http::StatusCode::NOT_FOUND)
                    .body(Body::default())
                    .expect("not found response must be valid"),
            ));
        };

        let admission = self.clone();
        Box::pin(async move {
            let bytes = req
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::Request(e.into()))?
                .to_bytes();

            match endpoint {
                Endpoint::AdmissionReview => json_response(&admission.review(&bytes)),
                Endpoint::Validate => {
                    let rsp = protocol::validate(&bytes);
                    admission.metrics.record(endpoint, outcome(&rsp));
                    debug!(?rsp);
                    json_response(&rsp)
                }
                Endpoint::ValidateSettings => {
                    let rsp = protocol::validate_settings(&bytes);
                    let outcome = if rsp.valid {
                        Outcome::Accepted
                    } else {
                        Outcome::Invalid
                    };
                    admission.metrics.record(endpoint, outcome);
                    json_response(&rsp)
                }
            }
        })
    }
}

impl Admission {
    pub fn new(config: PolicyConfig, metrics: AdmissionMetrics) -> Self {
        Self { config, metrics }
    }

    fn review(&self, bytes: &[u8]) -> AdmissionReview {
        let review: AdmissionReview = match serde_json::from_slice(bytes) {
            Ok(review) => review,
            Err(error) => {
                warn!(%error, "Failed to parse request body");
                self.metrics
                    .record(Endpoint::AdmissionReview, Outcome::Invalid);
                return AdmissionResponse::invalid(error).into_review();
            }
        };
        trace!(?review);

        let rsp = match review.try_into() {
            Ok(req) => {
                debug!(?req);
                self.admit(req)
            }
            Err(error) => {
                warn!(%error, "Invalid admission request");
                self.metrics
                    .record(Endpoint::AdmissionReview, Outcome::Invalid);
                AdmissionResponse::invalid(error)
            }
        };
        debug!(?rsp);
        rsp.into_review()
    }

    fn admit(&self, req: AdmissionRequest) -> AdmissionResponse {
        if !is_kind::<networking::Ingress>(&req) {
            self.metrics
                .record(Endpoint::AdmissionReview, Outcome::Invalid);
            return AdmissionResponse::invalid(format_args!(
                "unsupported resource type: {}.{}.{}",
                req.kind.group, req.kind.version, req.kind.kind
            ));
        }

        let rsp = AdmissionResponse::from(&req);
        let ingress = match parse_ingress(req) {
            Ok(ingress) => ingress,
            Err(error) => {
                info!(%error, "Failed to parse Ingress");
                self.metrics
                    .record(Endpoint::AdmissionReview, Outcome::Invalid);
                let mut rsp = rsp.deny(format!("{error:#}"));
                rsp.result.code = protocol::BAD_REQUEST;
                rsp.result.reason = "BadRequest".to_string();
                return rsp;
            }
        };

        let verdict = evaluate_ingress(self.config, &ingress);
        self.metrics
            .record_verdict(Endpoint::AdmissionReview, &verdict);
        match verdict {
            Verdict::Accept => rsp,
            Verdict::Reject(violation) => {
                let ns = ingress.namespace();
                let name = ingress.name();
                info!(%violation, %ns, %name, "Denied");
                rsp.deny(violation)
            }
        }
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

fn outcome(rsp: &protocol::ValidationResponse) -> Outcome {
    match (rsp.accepted, rsp.code) {
        (true, _) => Outcome::Accepted,
        (false, None) => Outcome::Rejected,
        (false, Some(_)) => Outcome::Invalid,
    }
}

fn json_response<T: Serialize>(rsp: &T) -> Result<Response<Body>, Error> {
    let bytes = serde_json::to_vec(rsp)?;
    Ok(Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("admission response must be valid"))
}

/// Decodes the Ingress carried by an admission request. A missing or null
/// `spec` is not a decoding error, and a request without an object (DELETE)
/// carries an empty Ingress.
fn parse_ingress(req: AdmissionRequest) -> Result<Ingress> {
    let Some(obj) = req.object else {
        return Ok(Ingress::default());
    };

    let spec = match obj.data.get("spec") {
        None | Some(serde_json::Value::Null) => None,
        Some(spec) => Some(
            serde_json::from_value(spec.clone()).context("Cannot decode Ingress object")?,
        ),
    };

    Ok(Ingress {
        metadata: Some(obj.metadata),
        spec,
    })
}
