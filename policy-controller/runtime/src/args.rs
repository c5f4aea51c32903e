use crate::{admission::Admission, core::PolicyConfig, metrics::AdmissionMetrics};
use anyhow::{bail, Result};
use clap::Parser;
use prometheus_client::registry::Registry;
use tracing::info;

#[derive(Debug, Parser)]
#[clap(
    name = "ingress-tls-policy",
    about = "An admission controller for Ingress TLS consistency"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "ingress_tls_policy=info,warn",
        env = "INGRESS_TLS_POLICY_LOG"
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

    /// Requires Ingresses that set `force-ssl-redirect` to declare TLS hosts
    /// matching their rule hosts.
    ///
    /// Applies to AdmissionReview requests. Kubewarden-style requests carry
    /// their own settings.
    #[clap(long, env = "INGRESS_TLS_POLICY_VALIDATE_FORCE_SSL_REDIRECT")]
    validate_force_ssl_redirect: bool,
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
            validate_force_ssl_redirect,
        } = self;

        let config = PolicyConfig::new(validate_force_ssl_redirect);

        let mut prom = <Registry>::default();
        let metrics = AdmissionMetrics::register(prom.sub_registry_with_prefix("admission"));

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .with_server(server)
            .build()
            .await?;

        info!(?config, "Serving Ingress admission");
        let runtime = runtime.spawn_server(Admission::new(config, metrics));

        // The admission server drains in-flight reviews before `run` returns.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}
