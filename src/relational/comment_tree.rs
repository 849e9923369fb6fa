// Reply threads rebuilt from flat comment rows.
//
// Roots are comments without a parent. Children follow their parent
// depth-first, siblings in id order, which is the order a recursive query
// sorted by its id path would give.

use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};
use tracing::debug;

const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FlatComment {
    pub id_commentaire: i32,
    pub id_parent: Option<i32>,
    pub contenu: String,
    pub date: NaiveDateTime,
    pub auteur: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadedComment {
    pub comment: FlatComment,
    pub depth: usize,
    /// Ids from the root down to this comment, inclusive.
    pub path: Vec<i32>,
}

impl ThreadedComment {
    pub fn render_line(&self) -> String {
        let preview: String = self.comment.contenu.chars().take(PREVIEW_CHARS).collect();
        format!(
            "{}{}: {}...",
            "  ".repeat(self.depth),
            self.comment.auteur,
            preview
        )
    }
}

/// Orders comments as a pre-order walk of the reply tree. Comments whose
/// parent is not in `comments` are unreachable from a root and are left out.
pub fn thread_comments(mut comments: Vec<FlatComment>) -> Vec<ThreadedComment> {
    comments.sort_by_key(|comment| comment.id_commentaire);

    let mut roots = Vec::new();
    let mut children: HashMap<i32, Vec<usize>> = HashMap::new();
    for (index, comment) in comments.iter().enumerate() {
        match comment.id_parent {
            None => roots.push(index),
            Some(parent) => children.entry(parent).or_default().push(index),
        }
    }

    let total = comments.len();
    let mut slots: Vec<Option<FlatComment>> = comments.into_iter().map(Some).collect();
    let mut visited = HashSet::new();
    let mut threaded = Vec::with_capacity(total);

    // Pushed in reverse so the lowest id pops first.
    let mut stack: Vec<(usize, usize, Vec<i32>)> = roots
        .into_iter()
        .rev()
        .map(|index| (index, 0, Vec::new()))
        .collect();

    while let Some((index, depth, parent_path)) = stack.pop() {
        let Some(comment) = slots[index].take() else {
            continue;
        };
        if !visited.insert(comment.id_commentaire) {
            continue;
        }

        let mut path = parent_path;
        path.push(comment.id_commentaire);

        if let Some(replies) = children.get(&comment.id_commentaire) {
            for &reply in replies.iter().rev() {
                stack.push((reply, depth + 1, path.clone()));
            }
        }

        threaded.push(ThreadedComment {
            comment,
            depth,
            path,
        });
    }

    if threaded.len() < total {
        debug!(
            unreachable = total - threaded.len(),
            "comments not attached to any root"
        );
    }
    threaded
}
