//! Depth-limited comment thread assembly from flat parent-id rows.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Comment, RecordId};

#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// Assemble a tree from comments fetched for one parent object. Replies
/// nested deeper than `max_depth` are dropped from the view; input order
/// (chronological) is preserved among siblings.
pub fn build_comment_tree(comments: Vec<Comment>, max_depth: u32) -> Vec<CommentNode> {
    let mut children: HashMap<RecordId, Vec<Comment>> = HashMap::new();
    let mut roots: Vec<Comment> = Vec::new();
    for comment in comments {
        match comment.parent_comment_id {
            Some(parent_comment_id) => {
                children.entry(parent_comment_id).or_default().push(comment)
            }
            None => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|comment| attach_replies(comment, &mut children, 0, max_depth))
        .collect()
}

fn attach_replies(
    comment: Comment,
    children: &mut HashMap<RecordId, Vec<Comment>>,
    depth: u32,
    max_depth: u32,
) -> CommentNode {
    let replies = if depth < max_depth {
        children
            .remove(&comment.id)
            .unwrap_or_default()
            .into_iter()
            .map(|reply| attach_replies(reply, children, depth + 1, max_depth))
            .collect()
    } else {
        Vec::new()
    };
    CommentNode { comment, replies }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObjectType;

    fn comment(id: RecordId, parent_comment_id: Option<RecordId>, depth: u32) -> Comment {
        Comment {
            id,
            creator_id: 1,
            parent_type: ObjectType::Note,
            parent_id: 10,
            parent_comment_id,
            depth,
            body: format!("comment {}", id),
            created_at: id,
        }
    }

    #[test]
    fn test_tree_nests_replies_under_parents() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, None, 0),
            comment(4, Some(2), 2),
        ];
        let tree = build_comment_tree(comments, 5);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].comment.id, 1);
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].replies[0].comment.id, 4);
        assert!(tree[1].replies.is_empty());
    }

    #[test]
    fn test_depth_limit_prunes_deep_replies() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
        ];
        let tree = build_comment_tree(comments, 1);
        assert_eq!(tree[0].replies.len(), 1);
        assert!(tree[0].replies[0].replies.is_empty());
    }
}
