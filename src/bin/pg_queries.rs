use blog_database::config::Config;
use blog_database::relational::{run_suite, PgSession, RelationalDemo};
use blog_database::telemetry::init_tracing;
use std::io::{self, Write};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let mut session = match PgSession::connect(&config.postgres).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let demo = RelationalDemo::default();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let report = run_suite(&mut session, &demo, &mut out).await?;
    writeln!(out, "{}", report.render())?;
    out.flush()?;

    session.close().await?;
    Ok(())
}
