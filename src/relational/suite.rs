// Runs the six relational queries in order. A failing query is logged, prints
// nothing under its heading and is left out of the timings; the rest still run.

use std::io::{self, Write};
use std::time::Duration;
use tracing::{error, info};

use super::benchmark::BenchmarkReport;
use super::database::{PgSession, Timed};
use super::queries::{self, RelationalDemo};
use super::report;
use crate::error::AppResult;

fn emit<T, W: Write>(
    out: &mut W,
    name: &str,
    result: AppResult<Timed<T>>,
    render: impl FnOnce(&T) -> String,
) -> io::Result<Option<Duration>> {
    match result {
        Ok(timed) => {
            writeln!(out, "{}", report::timing_line(&timed))?;
            writeln!(out, "{}", render(&timed.value))?;
            Ok(Some(timed.elapsed))
        }
        Err(e) => {
            error!(query = name, error = %e, "query failed");
            Ok(None)
        }
    }
}

pub async fn run_suite<W: Write>(
    session: &mut PgSession,
    demo: &RelationalDemo,
    out: &mut W,
) -> io::Result<BenchmarkReport> {
    let mut bench = BenchmarkReport::new();

    writeln!(out, "{}", report::section("Query 1: article with its comments"))?;
    let result = queries::article_with_comments(session, &demo.title).await;
    let elapsed = emit(out, "query_1_article_with_comments", result, |rows| {
        report::render_article_with_comments(rows)
    })?;
    bench.record("query_1_article_with_comments", elapsed);

    writeln!(out, "{}", report::section("Query 2: add a rating"))?;
    let result = queries::add_rating(session, &demo.title, demo.rating).await;
    let elapsed = emit(out, "query_2_add_rating", result, |rows| report::render_rating(rows))?;
    bench.record("query_2_add_rating", elapsed);

    writeln!(out, "{}", report::section("Query 3: articles by tag"))?;
    let result = queries::articles_by_tag(session, &demo.tag).await;
    let elapsed = emit(out, "query_3_articles_by_tag", result, |rows| {
        report::render_articles_by_tag(&demo.tag, rows)
    })?;
    bench.record("query_3_articles_by_tag", elapsed);

    writeln!(out, "{}", report::section("Query 4: comment hierarchy"))?;
    let result = queries::comment_hierarchy(session, &demo.title).await;
    let elapsed = emit(out, "query_4_comment_hierarchy", result, |rows| {
        report::render_hierarchy(rows)
    })?;
    bench.record("query_4_comment_hierarchy", elapsed);

    writeln!(out, "{}", report::section("Query 5: user statistics"))?;
    let result = queries::user_statistics(session).await;
    let elapsed = emit(out, "query_5_user_statistics", result, |rows| {
        report::render_user_statistics(rows)
    })?;
    bench.record("query_5_user_statistics", elapsed);

    writeln!(out, "{}", report::section("Query 6: article overview"))?;
    let result = queries::article_overview(session).await;
    let elapsed = emit(out, "query_6_article_overview", result, |rows| {
        report::render_overview(rows)
    })?;
    bench.record("query_6_article_overview", elapsed);

    info!(
        failures = bench.failures(),
        total_ms = bench.total().as_secs_f64() * 1000.0,
        "relational suite finished"
    );
    Ok(bench)
}
