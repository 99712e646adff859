use gridgate_planner::TopologyPlan;
use gridgate_planner::report::{format_outputs, format_plan};

use super::{compile_with, load_descriptor};

pub fn validate(path: &str, data_dir: Option<&str>) -> anyhow::Result<()> {
    let descriptor = load_descriptor(path)?;
    let plan = compile_with(&descriptor, data_dir)?;
    println!(
        "✓ {} is valid ({} platform, {} resources)",
        path,
        plan.platform.label(),
        plan.resources.len()
    );
    Ok(())
}

pub fn plan(path: &str, data_dir: Option<&str>, format: &str) -> anyhow::Result<()> {
    let descriptor = load_descriptor(path)?;
    let plan = compile_with(&descriptor, data_dir)?;
    println!("{}", render_plan(&plan, format)?);
    Ok(())
}

pub fn outputs(path: &str, data_dir: Option<&str>, format: &str) -> anyhow::Result<()> {
    let descriptor = load_descriptor(path)?;
    let plan = compile_with(&descriptor, data_dir)?;
    print!("{}", render_outputs(&plan, format)?);
    Ok(())
}

pub fn render_plan(plan: &TopologyPlan, format: &str) -> anyhow::Result<String> {
    match format {
        "json" => Ok(plan.to_json_pretty()?),
        "text" => Ok(format_plan(plan)),
        other => unknown_format(other),
    }
}

pub fn render_outputs(plan: &TopologyPlan, format: &str) -> anyhow::Result<String> {
    match format {
        "json" => Ok(format!("{}\n", serde_json::to_string_pretty(&plan.outputs)?)),
        "text" => Ok(format_outputs(plan)),
        other => unknown_format(other),
    }
}

fn unknown_format(format: &str) -> anyhow::Result<String> {
    anyhow::bail!("unknown format '{format}' (expected text or json)")
}
