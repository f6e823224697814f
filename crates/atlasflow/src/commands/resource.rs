//! 単一リソースのライフサイクルコマンド
//!
//! 各コマンドはステートの読み込みから保存までロックを保持する。

use crate::utils;
use anyhow::Context;
use atlasflow_cloud::{
    CloudProvider, Operation, ResourceState, StateManager, address, parse_address,
};
use colored::Colorize;

pub async fn create(
    provider: &dyn CloudProvider,
    manager: &StateManager,
    addr: &str,
) -> anyhow::Result<()> {
    let (resource_type, _) = parse_address(addr)?;
    let handler = provider.require_resource(resource_type)?;
    let desired = utils::desired_resource(addr)?;

    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;
    if state.get_resource(addr).is_some() {
        anyhow::bail!("'{}' already exists in state; use `update` instead", addr);
    }

    println!("{}", format!("Creating {}...", addr).yellow());
    let record = handler
        .create(desired.config)
        .await
        .with_context(|| format!("creating {}", addr))?;
    let resource = ResourceState::from_record(resource_type, Operation::Create, record)
        .with_context(|| format!("{} was created remotely but cannot be recorded", addr))?;
    let id = resource.id.clone();
    tracing::info!("Created {} as {}", addr, id);

    println!();
    println!("{}", format!("✓ Created {} ({})", addr, id).green().bold());
    state.set_resource(addr.to_string(), resource);
    manager.save(&state).await.with_context(|| {
        format!(
            "{} exists remotely ({}) but state could not be saved",
            addr, id
        )
    })?;
    lock.release().await?;
    Ok(())
}

pub async fn read(
    provider: &dyn CloudProvider,
    manager: &StateManager,
    addr: &str,
) -> anyhow::Result<()> {
    let (resource_type, _) = parse_address(addr)?;
    let handler = provider.require_resource(resource_type)?;

    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;
    let current = state
        .get_resource(addr)
        .ok_or_else(|| anyhow::anyhow!("'{}' is not in state", addr))?;

    println!("{}", format!("Refreshing {}...", addr).yellow());
    let refreshed = handler
        .read(current.record())
        .await
        .with_context(|| format!("reading {}", addr))?;

    match refreshed {
        Some(record) => {
            let mut resource = current.clone();
            resource.refresh(Operation::Read, record)?;
            println!("{}", format!("✓ {} is up to date", addr).green().bold());
            state.set_resource(addr.to_string(), resource);
        }
        None => {
            tracing::warn!("{} no longer exists remotely, removing it from state", addr);
            println!(
                "{}",
                format!("ℹ {} no longer exists; removed from state", addr).dimmed()
            );
            state.remove_resource(addr);
        }
    }

    manager.save(&state).await?;
    lock.release().await?;
    Ok(())
}

pub async fn update(
    provider: &dyn CloudProvider,
    manager: &StateManager,
    addr: &str,
) -> anyhow::Result<()> {
    let (resource_type, _) = parse_address(addr)?;
    let handler = provider.require_resource(resource_type)?;
    let desired = utils::desired_resource(addr)?;

    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;
    let mut resource = state
        .get_resource(addr)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("'{}' is not in state; use `create` first", addr))?;

    let current = resource.record();
    let plan = utils::merge_plan(&current, &desired.config);

    println!("{}", format!("Updating {}...", addr).yellow());
    let record = handler
        .update(current, plan)
        .await
        .with_context(|| format!("updating {}", addr))?;
    resource.refresh(Operation::Update, record)?;

    println!();
    println!("{}", format!("✓ Updated {}", addr).green().bold());
    state.set_resource(addr.to_string(), resource);
    manager.save(&state).await?;
    lock.release().await?;
    Ok(())
}

pub async fn delete(
    provider: &dyn CloudProvider,
    manager: &StateManager,
    addr: &str,
) -> anyhow::Result<()> {
    let (resource_type, _) = parse_address(addr)?;
    let handler = provider.require_resource(resource_type)?;

    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;
    let current = state
        .get_resource(addr)
        .ok_or_else(|| anyhow::anyhow!("'{}' is not in state", addr))?;

    println!("{}", format!("Deleting {}...", addr).yellow());
    handler
        .delete(current.record())
        .await
        .with_context(|| format!("deleting {}", addr))?;
    state.remove_resource(addr);

    println!();
    println!("{}", format!("✓ Deleted {}", addr).green().bold());
    manager.save(&state).await?;
    lock.release().await?;
    Ok(())
}

pub async fn import(
    provider: &dyn CloudProvider,
    manager: &StateManager,
    resource_type: &str,
    name: &str,
    import_id: &str,
) -> anyhow::Result<()> {
    let handler = provider.require_resource(resource_type)?;
    let addr = address(resource_type, name);
    parse_address(&addr)?;

    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;
    if state.get_resource(&addr).is_some() {
        anyhow::bail!("'{}' already exists in state", addr);
    }

    println!("{}", format!("Importing {} as {}...", import_id, addr).yellow());
    let record = handler
        .import(import_id)
        .await
        .with_context(|| format!("importing {}", addr))?;
    let resource = ResourceState::from_record(resource_type, Operation::Import, record)?;
    let id = resource.id.clone();

    println!();
    println!("{}", format!("✓ Imported {} ({})", addr, id).green().bold());
    state.set_resource(addr.clone(), resource);
    manager
        .save(&state)
        .await
        .with_context(|| format!("saving state for {} ({})", addr, id))?;
    lock.release().await?;
    Ok(())
}
