// Text rendering of the relational query results.

use super::comment_tree::ThreadedComment;
use super::database::Timed;
use super::queries::{ArticleOverview, ArticleWithComments, RatedArticle, TaggedArticle, UserStatistics};

const PREVIEW_CHARS: usize = 50;
const OVERVIEW_SHOWN: usize = 3;

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

pub fn section(title: &str) -> String {
    format!("\n=== {} ===", title)
}

pub fn timing_line<T>(timed: &Timed<T>) -> String {
    format!("Execution time: {:.2} ms", timed.elapsed_ms())
}

pub fn render_article_with_comments(rows: &[ArticleWithComments]) -> String {
    let mut lines = Vec::new();
    for row in rows {
        lines.push(format!("\nArticle: {}", row.titre));
        lines.push(format!("Author: {} ({})", row.auteur_nom, row.auteur_email));
        lines.push(format!("Views: {}", row.vue));

        let comments = &row.commentaires.0;
        if comments.is_empty() {
            lines.push("No comments".to_string());
            continue;
        }
        lines.push(format!("Comments ({}):", comments.len()));
        for comment in comments {
            let indent = if comment.id_parent.is_none() { "  " } else { "    " };
            lines.push(format!(
                "{}- {}: {}...",
                indent,
                comment.auteur,
                preview(&comment.contenu)
            ));
        }
    }
    lines.join("\n")
}

pub fn render_rating(rows: &[RatedArticle]) -> String {
    if rows.is_empty() {
        return "No article updated".to_string();
    }
    rows.iter()
        .map(|row| match row.note {
            Some(note) => format!("Article '{}' updated with rating: {:.2}", row.titre, note),
            None => format!("Article '{}' updated without rating", row.titre),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_articles_by_tag(tag: &str, rows: &[TaggedArticle]) -> String {
    let mut lines = vec![format!("Articles tagged '{}': {}", tag, rows.len())];
    for row in rows {
        lines.push(format!("\n- {} (by {})", row.titre, row.auteur));
        lines.push(format!("  Tags: {}", row.tags.join(", ")));
        lines.push(format!("  Views: {}", row.vue));
    }
    lines.join("\n")
}

pub fn render_hierarchy(rows: &[ThreadedComment]) -> String {
    if rows.is_empty() {
        return "No comments".to_string();
    }
    let mut lines = vec!["Comment hierarchy:".to_string()];
    lines.extend(rows.iter().map(ThreadedComment::render_line));
    lines.join("\n")
}

pub fn render_user_statistics(rows: &[UserStatistics]) -> String {
    let mut lines = vec![
        format!(
            "{:<15} {:<10} {:<10} {:<15} {:<15} {:<10}",
            "Name", "Role", "Articles", "Comments", "Total views", "Avg rating"
        ),
        "-".repeat(80),
    ];
    for row in rows {
        lines.push(format!(
            "{:<15} {:<10} {:<10} {:<15} {:<15} {:.2}",
            row.nom, row.role, row.nb_articles, row.nb_commentaires, row.total_vues, row.note_moyenne
        ));
    }
    lines.join("\n")
}

pub fn render_overview(rows: &[ArticleOverview]) -> String {
    let mut lines = vec![format!("Total articles: {}", rows.len())];
    for row in rows.iter().take(OVERVIEW_SHOWN) {
        let note = row
            .note
            .map(|n| format!("{:.2}", n))
            .unwrap_or_else(|| "N/A".to_string());
        lines.push(format!("\n📄 {}", row.titre));
        lines.push(format!(
            "   Author: {} | Views: {} | Comments: {} | Rating: {}",
            row.auteur, row.vue, row.nb_commentaires, note
        ));

        let tags: Vec<&str> = row.tags.0.iter().map(|t| t.tag.as_str()).collect();
        if !tags.is_empty() {
            lines.push(format!("   Tags: {}", tags.join(", ")));
        }
    }
    lines.join("\n")
}
