//! JSON output formatting.

use serde_json::{Value, json};

use crate::models::{FeedPage, Paper};

/// Create a compact paper representation for JSON output.
#[must_use]
pub fn compact_paper(paper: &Paper) -> Value {
    let mut obj = json!({
        "id": paper.id,
        "arxivId": paper.arxiv_id,
        "title": paper.title,
        "authors": paper.authors,
        "year": paper.year,
        "categories": paper.categories,
        "likes": paper.likes,
        "bookmarks": paper.bookmarks,
    });

    // Add optional fields only if present
    if let Some(pdf) = &paper.links.pdf {
        obj["pdf"] = json!(pdf);
    }

    if let Some(html) = &paper.links.html {
        obj["html"] = json!(html);
    }

    if let Some(doi) = &paper.links.doi {
        obj["doi"] = json!(doi);
    }

    if paper.is_liked_by_user {
        obj["liked"] = json!(true);
    }

    if paper.bookmarked {
        obj["bookmarked"] = json!(true);
    }

    obj
}

/// Create a compact page representation for JSON output.
#[must_use]
pub fn compact_page(page: &FeedPage) -> Value {
    json!({
        "offset": page.offset,
        "hasMore": page.has_more,
        "papers": page.papers.iter().map(compact_paper).collect::<Vec<_>>(),
    })
}
