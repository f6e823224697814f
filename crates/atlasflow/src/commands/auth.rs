use atlasflow_cloud::CloudProvider;
use colored::Colorize;

pub async fn handle(provider: &dyn CloudProvider) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("Checking {} credentials...", provider.display_name()).yellow()
    );

    let status = provider.check_auth().await?;
    if !status.authenticated {
        anyhow::bail!(
            "authentication failed: {}",
            status.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }

    println!();
    println!("{}", "✓ Authenticated".green().bold());
    if let Some(info) = status.account_info {
        println!("  {}", info.dimmed());
    }
    Ok(())
}
