use anyhow::Result;
use tenant_lab::LabConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = LabConfig::from_env()?;
    println!("[tenant-lab] resolving tenant from {}", config.url);

    let report = tenant_lab::run(&config).await?;

    println!("[tenant-lab] tenant:    {} (via {})", report.resolved, report.resolution_source);
    println!("[tenant-lab] css vars:  {}", report.css);
    println!("[tenant-lab] signed in: tenant {}", report.signed_in_under);
    if let Some(active) = &report.switched_to {
        println!(
            "[tenant-lab] switched:  active tenant {active}, identity still tagged {}",
            report
                .identity_tenant_after_switch
                .as_ref()
                .map(|t| t.as_str())
                .unwrap_or("<none>")
        );
    }

    Ok(())
}
