use blog_database::config::Config;
use blog_database::document::queries::{
    add_rating, append_comment, attach_metadata, find_by_metadata, search_comments,
};
use blog_database::document::report::{render_documents, render_update, section};
use blog_database::document::{DocumentDemo, MongoDocumentStore};
use blog_database::telemetry::init_tracing;
use blog_database::AppResult;
use chrono::Utc;
use tracing::error;

/// Prints a step's result. A failed step is logged and its section stays
/// empty; later steps run either way.
fn show<T>(step: &str, result: AppResult<T>, render: impl FnOnce(&T) -> String) {
    match result {
        Ok(value) => println!("{}", render(&value)),
        Err(e) => error!(step, error = %e, "step failed"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let store = match MongoDocumentStore::connect(&config.mongo).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    let demo = DocumentDemo::default();

    println!("{}", section("1. Add a rating field"));
    show(
        "add_rating",
        add_rating(&store, &demo.title, demo.rating).await,
        |outcome| render_update(&demo.title, outcome),
    );

    println!("{}", section("2. Append a comment"));
    show(
        "append_comment",
        append_comment(&store, &demo.title, &demo.comment, Utc::now()).await,
        |comment| render_documents(std::slice::from_ref(comment)),
    );

    println!(
        "{}",
        section(&format!("3. Comments matching '{}'", demo.search_pattern))
    );
    show(
        "search_comments",
        search_comments(&store, &demo.search_pattern).await,
        |posts| render_documents(posts),
    );

    println!("{}", section("4. Attach free-form metadata"));
    show(
        "attach_metadata",
        attach_metadata(&store, &demo.title, demo.metadata.clone()).await,
        |outcome| render_update(&demo.title, outcome),
    );

    println!("{}", section("5. Posts by metadata"));
    show(
        "find_by_metadata",
        find_by_metadata(&store, &demo.metadata_filter).await,
        |posts| render_documents(posts),
    );

    store.shutdown().await;
    Ok(())
}
