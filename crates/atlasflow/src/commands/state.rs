use crate::utils;
use atlasflow_cloud::StateManager;
use colored::Colorize;

pub async fn list(manager: &StateManager, resource_type: Option<&str>) -> anyhow::Result<()> {
    let state = manager.load().await?;
    let resources: Vec<_> = match resource_type {
        Some(t) => state.resources_of_type(t),
        None => state.resources.iter().collect(),
    };
    if resources.is_empty() {
        match resource_type {
            Some(t) => println!("{}", format!("No {} resources in state", t).dimmed()),
            None => println!("{}", "No resources in state".dimmed()),
        }
        return Ok(());
    }

    println!(
        "{:<48} {:<12} {}",
        "ADDRESS".bold(),
        "LAST OP".bold(),
        "UPDATED".bold()
    );
    for (addr, resource) in resources {
        println!(
            "{:<48} {:<12} {}",
            addr.cyan(),
            resource.last_operation.to_string(),
            resource.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

pub async fn show(manager: &StateManager, addr: &str) -> anyhow::Result<()> {
    let state = manager.load().await?;
    let resource = state
        .get_resource(addr)
        .ok_or_else(|| anyhow::anyhow!("'{}' is not in state", addr))?;

    println!("{}", addr.bold());
    println!("  id:             {}", resource.id.cyan());
    println!("  last operation: {}", resource.last_operation);
    println!("  created:        {}", resource.created_at.to_rfc3339());
    println!("  updated:        {}", resource.updated_at.to_rfc3339());
    println!();

    let mut record = resource.record();
    utils::redact(&mut record);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
