//! Checks that Ingresses which force an HTTPS redirect terminate TLS for
//! exactly the hosts they route.

use crate::{HostMismatch, PolicyConfig, Verdict, Violation};
use ahash::AHashSet as HashSet;
use ingress_tls_policy_k8s_api::{Annotations, Ingress, IngressRule, IngressSpec, IngressTls};
use tracing::{debug, trace};

/// Annotation keys that enable the redirect, in priority order.
pub const ANNOTATION_KEYS: [&str; 2] = [
    "nginx.ingress.kubernetes.io/force-ssl-redirect",
    "force-ssl-redirect",
];

/// Evaluates a decoded Ingress, logging its identity and the outcome.
pub fn evaluate_ingress(config: PolicyConfig, ingress: &Ingress) -> Verdict {
    let name = ingress.name();
    let ns = ingress.namespace();
    debug!(%ns, %name, "Validating ingress");

    let verdict = evaluate(config, ingress.annotations(), ingress.spec.as_ref());
    match &verdict {
        Verdict::Accept => debug!(%ns, %name, "Accepted"),
        Verdict::Reject(violation) => debug!(%ns, %name, %violation, "Rejected"),
    }
    verdict
}

pub fn evaluate(
    config: PolicyConfig,
    annotations: Option<&Annotations>,
    spec: Option<&IngressSpec>,
) -> Verdict {
    if !config.enforce_consistency {
        trace!("force-ssl-redirect validation disabled");
        return Verdict::Accept;
    }

    if !force_ssl_redirect_enabled(annotations) {
        trace!("force-ssl-redirect not enabled");
        return Verdict::Accept;
    }

    check_tls_hosts(spec).into()
}

/// Returns true when the first recognized annotation present is set to
/// `true`, ignoring case and surrounding whitespace.
pub fn force_ssl_redirect_enabled(annotations: Option<&Annotations>) -> bool {
    let Some(annotations) = annotations else {
        return false;
    };

    ANNOTATION_KEYS
        .iter()
        .find_map(|key| annotations.get(*key))
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn check_tls_hosts(spec: Option<&IngressSpec>) -> Result<(), Violation> {
    let spec = spec.ok_or(Violation::MissingSpec)?;

    if spec.tls().is_empty() {
        return Err(Violation::MissingTls);
    }

    let rule_hosts = rule_hosts(spec.rules())?;
    let tls_hosts = tls_hosts(spec.tls())?;
    compare_hosts(&rule_hosts, &tls_hosts)
}

fn rule_hosts(rules: &[Option<IngressRule>]) -> Result<HashSet<&str>, Violation> {
    let mut hosts = HashSet::new();
    for rule in rules.iter().flatten() {
        match rule.host.as_deref() {
            Some(host) if !host.is_empty() => {
                hosts.insert(host);
            }
            _ => return Err(Violation::EmptyRuleHost),
        }
    }

    if hosts.is_empty() {
        return Err(Violation::NoRuleHosts);
    }
    Ok(hosts)
}

fn tls_hosts(tls: &[Option<IngressTls>]) -> Result<HashSet<&str>, Violation> {
    let hosts = tls
        .iter()
        .flatten()
        .flat_map(IngressTls::hosts)
        .filter(|h| !h.is_empty())
        .collect::<HashSet<_>>();

    if hosts.is_empty() {
        return Err(Violation::NoTlsHosts);
    }
    Ok(hosts)
}

fn compare_hosts(rule_hosts: &HashSet<&str>, tls_hosts: &HashSet<&str>) -> Result<(), Violation> {
    let missing = sorted(rule_hosts.difference(tls_hosts));
    let extra = sorted(tls_hosts.difference(rule_hosts));

    if missing.is_empty() && extra.is_empty() {
        return Ok(());
    }
    Err(Violation::HostMismatch(HostMismatch { missing, extra }))
}

fn sorted<H: ToString>(hosts: impl Iterator<Item = H>) -> Vec<String> {
    let mut hosts = hosts.map(|h| h.to_string()).collect::<Vec<_>>();
    hosts.sort();
    hosts
}
