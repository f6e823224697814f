use atlasflow_cloud::{CloudProvider, DataSource};
use atlasflow_cloud_atlas::SharedTierRestoreJobsDataSource;
use colored::Colorize;
use serde_json::{Value, json};

pub async fn handle(
    provider: &dyn CloudProvider,
    project_id: &str,
    cluster_name: &str,
) -> anyhow::Result<()> {
    let source = provider.require_data_source(SharedTierRestoreJobsDataSource::TYPE_NAME)?;
    let result = source
        .read(json!({"project_id": project_id, "cluster_name": cluster_name}))
        .await?;

    let total = result["total_count"].as_i64().unwrap_or_default();
    println!(
        "{}",
        format!("Restore jobs for {} ({} total)", cluster_name, total).bold()
    );

    let jobs = result["results"].as_array().cloned().unwrap_or_default();
    if jobs.is_empty() {
        println!("  {}", "no restore jobs".dimmed());
        return Ok(());
    }

    println!(
        "  {:<26} {:<12} {:<10} {}",
        "JOB ID", "STATUS", "DELIVERY", "FINISHED"
    );
    for job in &jobs {
        let status = field(job, "status");
        let status = match status.as_str() {
            "COMPLETED" => status.green(),
            "FAILED" => status.red(),
            _ => status.yellow(),
        };
        println!(
            "  {:<26} {:<12} {:<10} {}",
            field(job, "job_id"),
            status,
            field(job, "delivery_type"),
            field(job, "restore_finished_date"),
        );
    }
    Ok(())
}

fn field(job: &Value, key: &str) -> String {
    job[key].as_str().unwrap_or("-").to_string()
}
