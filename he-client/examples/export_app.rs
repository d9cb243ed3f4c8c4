// he-client/examples/export_app.rs
// Export an application definition read from a JSON file

use anyhow::Context;
use he_client::{AppDef, HeClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,he_client=debug")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        println!("Usage: {} <app_def.json> [app_id]", args[0]);
        println!("  Requires HE_API_KEY; HE_URL and HE_WS_URL are optional");
        return Ok(());
    }

    let raw = std::fs::read_to_string(&args[1])
        .with_context(|| format!("reading {}", args[1]))?;
    let app_def: AppDef = serde_json::from_str(&raw).context("parsing app definition")?;

    let client = HeClient::from_env()?;
    tracing::info!(base_url = %client.config().base_url, app = %app_def.name, "Exporting");

    let response = client.export_app(args.get(2).map(String::as_str), &app_def).await?;
    println!("AppId:        {}", response.app_id);
    println!("AppDefFileId: {}", response.app_def_file_id);

    Ok(())
}
