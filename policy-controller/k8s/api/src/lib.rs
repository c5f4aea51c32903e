#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod ingress;

pub use self::ingress::{Ingress, IngressRule, IngressSpec, IngressTls};
pub use k8s_openapi::{
    api::{self, networking::v1 as networking},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};

pub type Annotations = std::collections::BTreeMap<String, String>;
