// The six relational operations. Each one is independent and returns its rows
// with the time spent in the database.

use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::types::Json;

use super::comment_tree::{thread_comments, FlatComment, ThreadedComment};
use super::database::{PgSession, Timed, ARTICLE_RATING};
use crate::document::queries::DEMO_TITLE;
use crate::error::AppResult;

/// Literals for one run of the relational suite.
#[derive(Debug, Clone)]
pub struct RelationalDemo {
    pub title: String,
    pub tag: String,
    pub rating: f64,
}

impl Default for RelationalDemo {
    fn default() -> Self {
        Self {
            title: DEMO_TITLE.to_string(),
            tag: "mongodb".to_string(),
            rating: 4.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JoinedComment {
    pub id_commentaire: i32,
    pub contenu: String,
    pub date: NaiveDateTime,
    pub auteur: String,
    pub id_parent: Option<i32>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleWithComments {
    pub id_article: i32,
    pub titre: String,
    pub contenu: String,
    pub date_publication: NaiveDateTime,
    pub vue: i64,
    pub auteur_nom: String,
    pub auteur_email: String,
    pub commentaires: Json<Vec<JoinedComment>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RatedArticle {
    pub id_article: i32,
    pub titre: String,
    pub note: Option<f64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaggedArticle {
    pub id_article: i32,
    pub titre: String,
    pub date_publication: NaiveDateTime,
    pub vue: i64,
    pub auteur: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserStatistics {
    pub id_utilisateur: i32,
    pub nom: String,
    pub email: String,
    pub role: String,
    pub nb_articles: i64,
    pub nb_commentaires: i64,
    pub total_vues: i64,
    pub note_moyenne: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagLabel {
    pub tag: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleOverview {
    pub id_article: i32,
    pub titre: String,
    pub date_publication: NaiveDateTime,
    pub vue: i64,
    pub note: Option<f64>,
    pub auteur: String,
    pub auteur_email: String,
    pub tags: Json<Vec<TagLabel>>,
    pub nb_commentaires: i64,
}

const ARTICLE_WITH_COMMENTS_SQL: &str = r#"
SELECT
    a.id_article,
    a.titre,
    a.contenu,
    a.date_publication,
    a.vue::BIGINT AS vue,
    u.nom AS auteur_nom,
    u.email AS auteur_email,
    COALESCE(
        json_agg(
            json_build_object(
                'id_commentaire', c.id_commentaire,
                'contenu', c.contenu,
                'date', c.date,
                'auteur', u2.nom,
                'id_parent', c.id_parent
            ) ORDER BY c.date, c.id_commentaire
        ) FILTER (WHERE c.id_commentaire IS NOT NULL),
        '[]'::json
    ) AS commentaires
FROM Article a
INNER JOIN Utilisateur u ON a.id_utilisateur = u.id_utilisateur
LEFT JOIN Commentaire c ON a.id_article = c.id_article
LEFT JOIN Utilisateur u2 ON c.id_utilisateur = u2.id_utilisateur
WHERE a.titre = $1
GROUP BY a.id_article, a.titre, a.contenu, a.date_publication, a.vue, u.nom, u.email
"#;

const SET_RATING_SQL: &str = r#"
UPDATE Article
SET note = CAST($1 AS DECIMAL(3,2))
WHERE titre = $2
RETURNING id_article, titre, note::FLOAT8 AS note
"#;

// Filtered through EXISTS so the aggregated tags cover the whole article,
// not only the tag searched for.
const ARTICLES_BY_TAG_SQL: &str = r#"
SELECT
    a.id_article,
    a.titre,
    a.date_publication,
    a.vue::BIGINT AS vue,
    u.nom AS auteur,
    array_agg(t.libelle::TEXT ORDER BY t.libelle) AS tags
FROM Article a
INNER JOIN Utilisateur u ON a.id_utilisateur = u.id_utilisateur
INNER JOIN Article_Tag atg ON a.id_article = atg.id_article
INNER JOIN Tag t ON atg.id_tag = t.id_tag
WHERE EXISTS (
    SELECT 1
    FROM Article_Tag searched
    INNER JOIN Tag st ON searched.id_tag = st.id_tag
    WHERE searched.id_article = a.id_article AND st.libelle = $1
)
GROUP BY a.id_article, a.titre, a.date_publication, a.vue, u.nom
ORDER BY a.date_publication DESC
"#;

const ARTICLE_COMMENTS_SQL: &str = r#"
SELECT
    c.id_commentaire,
    c.id_parent,
    c.contenu,
    c.date,
    u.nom AS auteur
FROM Commentaire c
INNER JOIN Utilisateur u ON c.id_utilisateur = u.id_utilisateur
WHERE c.id_article = (
    SELECT id_article FROM Article
    WHERE titre = $1
    ORDER BY id_article
    LIMIT 1
)
ORDER BY c.id_commentaire
"#;

// Articles and comments are aggregated separately before joining users, so a
// user's views are not multiplied by their comment count.
const USER_STATISTICS_SQL: &str = r#"
SELECT
    u.id_utilisateur,
    u.nom,
    u.email,
    u.role,
    COALESCE(a.nb_articles, 0) AS nb_articles,
    COALESCE(c.nb_commentaires, 0) AS nb_commentaires,
    COALESCE(a.total_vues, 0) AS total_vues,
    COALESCE(a.note_moyenne, 0) AS note_moyenne
FROM Utilisateur u
LEFT JOIN (
    SELECT
        id_utilisateur,
        COUNT(*) AS nb_articles,
        SUM(vue)::BIGINT AS total_vues,
        AVG(note)::FLOAT8 AS note_moyenne
    FROM Article
    GROUP BY id_utilisateur
) a ON a.id_utilisateur = u.id_utilisateur
LEFT JOIN (
    SELECT id_utilisateur, COUNT(*) AS nb_commentaires
    FROM Commentaire
    GROUP BY id_utilisateur
) c ON c.id_utilisateur = u.id_utilisateur
ORDER BY total_vues DESC, u.id_utilisateur
"#;

const ARTICLE_OVERVIEW_SQL: &str = r#"
SELECT
    a.id_article,
    a.titre,
    a.date_publication,
    a.vue::BIGINT AS vue,
    a.note::FLOAT8 AS note,
    u.nom AS auteur,
    u.email AS auteur_email,
    COALESCE(
        json_agg(DISTINCT jsonb_build_object('tag', t.libelle))
            FILTER (WHERE t.libelle IS NOT NULL),
        '[]'::json
    ) AS tags,
    COUNT(DISTINCT c.id_commentaire) AS nb_commentaires
FROM Article a
INNER JOIN Utilisateur u ON a.id_utilisateur = u.id_utilisateur
LEFT JOIN Article_Tag atg ON a.id_article = atg.id_article
LEFT JOIN Tag t ON atg.id_tag = t.id_tag
LEFT JOIN Commentaire c ON a.id_article = c.id_article
GROUP BY a.id_article, a.titre, a.date_publication, a.vue, a.note, u.nom, u.email
ORDER BY a.date_publication DESC
"#;

/// One article with its comments ordered by date. No comments gives an empty list.
pub async fn article_with_comments(
    session: &mut PgSession,
    title: &str,
) -> AppResult<Timed<Vec<ArticleWithComments>>> {
    session
        .fetch_all_timed(
            "article_with_comments",
            sqlx::query_as(ARTICLE_WITH_COMMENTS_SQL).bind(title),
        )
        .await
}

/// Ensures the rating column exists, then rates one article. Only the update
/// is timed.
pub async fn add_rating(
    session: &mut PgSession,
    title: &str,
    rating: f64,
) -> AppResult<Timed<Vec<RatedArticle>>> {
    session.ensure_column(&ARTICLE_RATING).await?;
    session
        .write_timed(
            "add_rating",
            sqlx::query_as(SET_RATING_SQL).bind(rating).bind(title),
        )
        .await
}

pub async fn articles_by_tag(
    session: &mut PgSession,
    tag: &str,
) -> AppResult<Timed<Vec<TaggedArticle>>> {
    session
        .fetch_all_timed("articles_by_tag", sqlx::query_as(ARTICLES_BY_TAG_SQL).bind(tag))
        .await
}

/// The reply tree of one article's comments, in pre-order.
pub async fn comment_hierarchy(
    session: &mut PgSession,
    title: &str,
) -> AppResult<Timed<Vec<ThreadedComment>>> {
    let flat = session
        .fetch_all_timed::<FlatComment>(
            "comment_hierarchy",
            sqlx::query_as(ARTICLE_COMMENTS_SQL).bind(title),
        )
        .await?;
    Ok(flat.map(thread_comments))
}

pub async fn user_statistics(session: &mut PgSession) -> AppResult<Timed<Vec<UserStatistics>>> {
    session
        .fetch_all_timed("user_statistics", sqlx::query_as(USER_STATISTICS_SQL))
        .await
}

/// Every article with tags, author and comment count. Joins four tables at once.
pub async fn article_overview(session: &mut PgSession) -> AppResult<Timed<Vec<ArticleOverview>>> {
    session
        .fetch_all_timed("article_overview", sqlx::query_as(ARTICLE_OVERVIEW_SQL))
        .await
}
