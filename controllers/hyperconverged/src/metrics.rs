//! Prometheus metrics exposed by the operator.

use std::sync::LazyLock;

use prometheus::{
    Encoder, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};

/// Operator metrics registry.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Count of out-of-band modifications the operator overwrote, per component.
pub static OUT_OF_BAND_MODIFICATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let metric = IntCounterVec::new(
        Opts::new(
            "kubevirt_hco_out_of_band_modifications_total",
            "Count of out-of-band modifications overwritten by HCO",
        ),
        &["component_name"],
    )
    .expect("metric definition is valid");
    REGISTRY
        .register(Box::new(metric.clone()))
        .expect("metric registers exactly once");
    metric
});

/// Unsafe-modification annotations currently present on the CR.
pub static UNSAFE_MODIFICATIONS: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    let metric = IntGaugeVec::new(
        Opts::new(
            "kubevirt_hco_unsafe_modifications",
            "Count of unsafe modifications in the HyperConverged annotations",
        ),
        &["annotation_name", "namespace"],
    )
    .expect("metric definition is valid");
    REGISTRY
        .register(Box::new(metric.clone()))
        .expect("metric registers exactly once");
    metric
});

/// Whether the HyperConverged CR exists (1) or not (0).
pub static CR_EXISTS: LazyLock<IntGauge> = LazyLock::new(|| {
    let metric = IntGauge::new(
        "kubevirt_hco_hyperconverged_cr_exists",
        "Indicates whether the HyperConverged custom resource exists (1) or not (0)",
    )
    .expect("metric definition is valid");
    REGISTRY
        .register(Box::new(metric.clone()))
        .expect("metric registers exactly once");
    metric
});

/// Whether the cluster runs single-stack IPv6 (unsupported).
pub static SINGLE_STACK_IPV6: LazyLock<IntGauge> = LazyLock::new(|| {
    let metric = IntGauge::new(
        "kubevirt_hco_single_stack_ipv6",
        "Indicates whether the cluster runs single-stack IPv6 (1) or not (0)",
    )
    .expect("metric definition is valid");
    REGISTRY
        .register(Box::new(metric.clone()))
        .expect("metric registers exactly once");
    metric
});

/// Whether a descheduler is installed without the KubeVirt profile.
pub static MISCONFIGURED_DESCHEDULER: LazyLock<IntGauge> = LazyLock::new(|| {
    let metric = IntGauge::new(
        "kubevirt_hco_misconfigured_descheduler",
        "Indicates whether the cluster descheduler is misconfigured for KubeVirt (1) or not (0)",
    )
    .expect("metric definition is valid");
    REGISTRY
        .register(Box::new(metric.clone()))
        .expect("metric registers exactly once");
    metric
});

/// Records that the operator overwrote an out-of-band change on `component`.
pub fn record_overwritten_modification(component: &str) {
    OUT_OF_BAND_MODIFICATIONS
        .with_label_values(&[component])
        .inc();
}

/// Publishes how many unsafe jsonpatch annotations `namespace` carries for
/// `annotation`.
pub fn set_unsafe_modification(annotation: &str, namespace: &str, count: i64) {
    UNSAFE_MODIFICATIONS
        .with_label_values(&[annotation, namespace])
        .set(count);
}

/// Renders the registry in the Prometheus text format.
pub fn render() -> String {
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    // Touch the lazies so the endpoint always lists every metric.
    CR_EXISTS.get();
    SINGLE_STACK_IPV6.get();
    MISCONFIGURED_DESCHEDULER.get();
    OUT_OF_BAND_MODIFICATIONS.with_label_values(&["none"]).get();
    UNSAFE_MODIFICATIONS.with_label_values(&["none", "none"]).get();
    if encoder.encode(&REGISTRY.gather(), &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
