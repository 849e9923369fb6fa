use anyhow::Context;
use blog_database::config::Config;
use blog_database::relational::{PgSession, SCHEMA_SCRIPT, SEED_SCRIPT};
use blog_database::telemetry::init_tracing;
use std::fs;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let sql_dir = &config.datasets.sql_dir;

    let schema_path = sql_dir.join(SCHEMA_SCRIPT);
    let seed_path = sql_dir.join(SEED_SCRIPT);
    let schema = fs::read_to_string(&schema_path)
        .with_context(|| format!("Failed to read {}", schema_path.display()))?;
    let seed = fs::read_to_string(&seed_path)
        .with_context(|| format!("Failed to read {}", seed_path.display()))?;

    let mut session = PgSession::connect(&config.postgres).await?;
    session.health_check().await?;

    session.apply_script(SCHEMA_SCRIPT, &schema).await?;
    println!("🏗️  Schema ready on {}", config.postgres.display_target());

    session.apply_script(SEED_SCRIPT, &seed).await?;
    println!("🌱 Sample data loaded (skipped if users already existed)");

    session.close().await?;
    Ok(())
}
