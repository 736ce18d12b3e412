use aicw_operator::crd::AIChatWorkspace;
use kube::core::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(&AIChatWorkspace::crd())?;
    println!("{}", yaml);
    Ok(())
}
