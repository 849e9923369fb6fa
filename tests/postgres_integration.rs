// Runs against a live PostgreSQL. Skipped unless BLOG_PG_TESTS=1. Each test
// works in its own schema, dropped at the end.

use blog_database::config::Config;
use blog_database::relational::queries::{
    add_rating, article_overview, article_with_comments, articles_by_tag, comment_hierarchy,
    user_statistics,
};
use blog_database::relational::{
    run_suite, PgSession, RelationalDemo, ARTICLE_RATING, SCHEMA_SCRIPT, SEED_SCRIPT,
};
use std::path::Path;
use uuid::Uuid;

fn enabled() -> bool {
    std::env::var("BLOG_PG_TESTS").map(|v| v == "1").unwrap_or(false)
}

fn script(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("sql").join(name);
    std::fs::read_to_string(path).unwrap()
}

async fn seeded_session() -> (PgSession, String) {
    let config = Config::from_env().unwrap();
    let mut session = PgSession::connect(&config.postgres).await.unwrap();
    let schema = format!("blog_test_{}", Uuid::new_v4().simple());

    session
        .apply_script(
            "scratch_schema",
            &format!("CREATE SCHEMA {0}; SET search_path TO {0}", schema),
        )
        .await
        .unwrap();
    session.apply_script(SCHEMA_SCRIPT, &script(SCHEMA_SCRIPT)).await.unwrap();
    session.apply_script(SEED_SCRIPT, &script(SEED_SCRIPT)).await.unwrap();
    (session, schema)
}

async fn teardown(mut session: PgSession, schema: &str) {
    session
        .apply_script("drop_schema", &format!("DROP SCHEMA {} CASCADE", schema))
        .await
        .unwrap();
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_queries_against_seeded_schema() {
    if !enabled() {
        return;
    }
    let (mut session, schema) = seeded_session().await;
    let demo = RelationalDemo::default();

    // Applying the seed again leaves existing rows alone.
    session.apply_script(SEED_SCRIPT, &script(SEED_SCRIPT)).await.unwrap();

    let articles = article_with_comments(&mut session, &demo.title).await.unwrap().value;
    assert_eq!(articles.len(), 1);
    let comments = &articles[0].commentaires.0;
    assert_eq!(comments.len(), 5);
    assert!(comments.windows(2).all(|pair| pair[0].date <= pair[1].date));

    let rated = add_rating(&mut session, &demo.title, demo.rating).await.unwrap().value;
    assert_eq!(rated.len(), 1);
    assert_eq!(rated[0].note, Some(4.5));
    assert!(!session.ensure_column(&ARTICLE_RATING).await.unwrap());

    let tagged = articles_by_tag(&mut session, &demo.tag).await.unwrap().value;
    assert_eq!(tagged.len(), 2);
    let first = tagged.iter().find(|a| a.titre == demo.title).unwrap();
    assert_eq!(first.tags, vec!["blog", "mongodb", "nosql"]);

    let threaded = comment_hierarchy(&mut session, &demo.title).await.unwrap().value;
    let ids: Vec<i32> = threaded.iter().map(|t| t.comment.id_commentaire).collect();
    let depths: Vec<usize> = threaded.iter().map(|t| t.depth).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(depths, vec![0, 1, 0, 1, 2]);

    let stats = user_statistics(&mut session).await.unwrap().value;
    assert_eq!(stats.len(), 5);
    assert_eq!(stats.iter().map(|s| s.total_vues).sum::<i64>(), 3550);
    assert_eq!(stats.iter().map(|s| s.nb_articles).sum::<i64>(), 4);
    assert_eq!(stats.iter().map(|s| s.nb_commentaires).sum::<i64>(), 7);
    let alice = stats.iter().find(|s| s.nom == "Alice Dupont").unwrap();
    assert_eq!((alice.nb_articles, alice.nb_commentaires, alice.total_vues), (2, 2, 2160));
    assert!(stats.windows(2).all(|pair| pair[0].total_vues >= pair[1].total_vues));

    // Unrated articles are ignored by the average; nothing rated gives zero.
    assert_eq!(alice.note_moyenne, 4.5);
    for name in ["Bruno Leroy", "Claire Martin", "David Morel", "Emma Girard"] {
        let user = stats.iter().find(|s| s.nom == name).unwrap();
        assert_eq!(user.note_moyenne, 0.0, "{}", name);
    }
    let claire = stats.iter().find(|s| s.nom == "Claire Martin").unwrap();
    assert_eq!((claire.nb_articles, claire.nb_commentaires, claire.total_vues), (0, 1, 0));
    let emma = stats.iter().find(|s| s.nom == "Emma Girard").unwrap();
    assert_eq!((emma.nb_articles, emma.nb_commentaires, emma.total_vues), (1, 0, 410));

    let overview = article_overview(&mut session).await.unwrap().value;
    assert_eq!(overview.len(), 4);
    let rated = overview.iter().find(|a| a.titre == demo.title).unwrap();
    assert_eq!(rated.note, Some(4.5));
    assert_eq!(rated.nb_commentaires, 5);
    assert_eq!(rated.tags.0.len(), 3);
    assert!(overview.iter().filter(|a| a.titre != demo.title).all(|a| a.note.is_none()));

    teardown(session, &schema).await;
}

#[tokio::test]
async fn test_outer_joins_keep_empty_sides() {
    if !enabled() {
        return;
    }
    let (mut session, schema) = seeded_session().await;
    session
        .apply_script(
            "empty_sides",
            r#"
            INSERT INTO Utilisateur (nom, email, role)
            VALUES ('Zoé Vide', 'zoe.vide@example.com', 'lecteur');
            INSERT INTO Article (titre, contenu, date_publication, vue, id_utilisateur)
            VALUES ('Brouillon sans tag', 'Rien encore.', '2024-04-01 10:00:00', 0, 5);
            "#,
        )
        .await
        .unwrap();
    session.ensure_column(&ARTICLE_RATING).await.unwrap();

    let articles = article_with_comments(&mut session, "Les index composés expliqués simplement")
        .await
        .unwrap()
        .value;
    assert_eq!(articles.len(), 1);
    assert!(articles[0].commentaires.0.is_empty());

    let overview = article_overview(&mut session).await.unwrap().value;
    let draft = overview.iter().find(|a| a.titre == "Brouillon sans tag").unwrap();
    assert!(draft.tags.0.is_empty());
    assert_eq!(draft.nb_commentaires, 0);
    assert_eq!(draft.note, None);

    let stats = user_statistics(&mut session).await.unwrap().value;
    let zoe = stats.iter().find(|s| s.nom == "Zoé Vide").unwrap();
    assert_eq!(
        (zoe.nb_articles, zoe.nb_commentaires, zoe.total_vues, zoe.note_moyenne),
        (0, 0, 0, 0.0)
    );

    teardown(session, &schema).await;
}

#[tokio::test]
async fn test_rating_column_added_once() {
    if !enabled() {
        return;
    }
    let (mut session, schema) = seeded_session().await;

    assert!(session.ensure_column(&ARTICLE_RATING).await.unwrap());
    assert!(!session.ensure_column(&ARTICLE_RATING).await.unwrap());

    teardown(session, &schema).await;
}

#[tokio::test]
async fn test_suite_times_every_query() {
    if !enabled() {
        return;
    }
    let (mut session, schema) = seeded_session().await;

    let mut out = Vec::new();
    let report = run_suite(&mut session, &RelationalDemo::default(), &mut out)
        .await
        .unwrap();

    assert_eq!(report.entries().len(), 6);
    assert_eq!(report.failures(), 0);
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("Execution time:").count(), 6);

    teardown(session, &schema).await;
}
