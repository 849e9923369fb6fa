use mongodb::bson::{Bson, Document};

use super::store::UpdateOutcome;

pub fn section(title: &str) -> String {
    format!("\n=== {} ===", title)
}

pub fn render_update(title: &str, outcome: &UpdateOutcome) -> String {
    if outcome.found() {
        format!(
            "Post '{}' updated (matched: {}, modified: {})",
            title, outcome.matched, outcome.modified
        )
    } else {
        format!("No post titled '{}'", title)
    }
}

/// Relaxed extended JSON, one pretty-printed block per document.
pub fn render_documents(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "No matching post".to_string();
    }

    let mut out = format!("{} post(s):", documents.len());
    for document in documents {
        let json = Bson::Document(document.clone()).into_relaxed_extjson();
        let pretty = serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string());
        out.push('\n');
        out.push_str(&pretty);
    }
    out
}
