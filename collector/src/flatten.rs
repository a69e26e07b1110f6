//! Reply trees to flat, delimiter-joined comment strings.

use digest_core::{ReplyNode, COMMENT_DELIMITER};

/// Newlines become single spaces, then surrounding whitespace is trimmed.
pub fn collapse_newlines(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Reply bodies in depth-first pre-order. Continuation stubs are skipped
/// along with everything they stand for.
pub fn flatten_replies(replies: &[ReplyNode]) -> Vec<String> {
    let mut bodies = Vec::new();
    collect_bodies(replies, &mut bodies);
    bodies
}

fn collect_bodies(nodes: &[ReplyNode], out: &mut Vec<String>) {
    for node in nodes {
        match node {
            ReplyNode::Reply(reply) => {
                out.push(collapse_newlines(&reply.body));
                collect_bodies(&reply.children, out);
            }
            ReplyNode::Continuation { .. } => {}
        }
    }
}

/// Bodies are joined verbatim; a body containing the delimiter will split
/// into extra pieces when read back.
pub fn join_comments(bodies: &[String]) -> String {
    bodies.join(COMMENT_DELIMITER)
}

pub fn split_comments(comments: &str) -> Vec<&str> {
    if comments.is_empty() {
        Vec::new()
    } else {
        comments.split(COMMENT_DELIMITER).collect()
    }
}
