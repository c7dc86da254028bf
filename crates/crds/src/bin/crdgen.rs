//! Prints the merged HyperConverged CRD (v1beta1 stored, v1 served) as YAML.

use kube::core::crd::merge_crds;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crd = merge_crds(
        vec![crds::v1beta1::HyperConverged::crd(), crds::v1::HyperConverged::crd()],
        "v1beta1",
    )?;
    print!("{}", serde_yaml::to_string(&crd)?);
    Ok(())
}
