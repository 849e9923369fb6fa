use blog_database::config::Config;
use blog_database::document::{seed_database, MongoDocumentStore};
use blog_database::telemetry::init_tracing;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let store = MongoDocumentStore::connect(&config.mongo).await?;

    let summary = seed_database(&store, &config.datasets).await?;
    if summary.dropped_existing {
        println!("🗑️  Existing database '{}' dropped", config.mongo.database);
    }
    println!("👤 {} users imported", summary.users);
    println!("📝 {} posts imported", summary.posts);

    info!(
        database = %config.mongo.database,
        users = summary.users,
        posts = summary.posts,
        "import finished"
    );
    store.shutdown().await;
    Ok(())
}
