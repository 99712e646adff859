use std::path::Path;

use gridgate_core::{DeploymentDescriptor, Platform};

pub fn init(name: &str, platform: &str, output: &str) -> anyhow::Result<()> {
    let path = Path::new(output);
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(path, scaffold_toml(name, platform)?)?;
    println!("✓ Generated {}", path.display());
    println!("  Fill in the placeholder identifiers, then run `gridgate import --from {output}`.");
    Ok(())
}

pub fn scaffold_toml(name: &str, platform: &str) -> anyhow::Result<String> {
    let platform = Platform::parse(platform)?;
    DeploymentDescriptor::scaffold(name, platform).to_toml_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaffold_parses_back() {
        let text = scaffold_toml("gw", "eks").unwrap();
        let d = DeploymentDescriptor::from_toml_str(&text).unwrap();
        assert_eq!(d.platform().unwrap(), Platform::ExternalCluster);
        d.validate().unwrap();
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gridgate.toml");
        let out = out.to_str().unwrap();
        init("gw", "ecs", out).unwrap();
        assert!(init("gw", "ecs", out).is_err());
        assert!(scaffold_toml("gw", "swarm").is_err());
    }
}
