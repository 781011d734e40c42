//! Markdown output formatting.

use std::borrow::Cow;

use crate::chat::{ChatMessage, Sender};
use crate::models::{FeedPage, Paper};

/// Abstract preview length in characters.
const ABSTRACT_PREVIEW: usize = 300;

/// Format a list of papers as Markdown.
#[must_use]
pub fn format_papers_markdown(papers: &[Paper]) -> String {
    if papers.is_empty() {
        return "No papers found.".to_string();
    }

    let mut output = format!("# Papers ({} results)\n\n", papers.len());

    for (i, paper) in papers.iter().enumerate() {
        output.push_str(&format_paper_markdown(paper, i + 1));
        output.push_str("\n---\n\n");
    }

    output
}

/// Format one fetched page, numbering cards from the page offset.
#[must_use]
pub fn format_page_markdown(page: &FeedPage) -> String {
    if page.is_empty() {
        return "No papers found.".to_string();
    }

    let mut output = format!(
        "# Papers {}-{}\n\n",
        page.offset + 1,
        page.offset + page.len()
    );

    for (i, paper) in page.papers.iter().enumerate() {
        output.push_str(&format_paper_markdown(paper, page.offset + i + 1));
        output.push_str("\n---\n\n");
    }

    if page.has_more {
        output.push_str(&format!("_More results from offset {}_\n", page.offset + page.len()));
    }

    output
}

/// Format a single paper card as Markdown.
#[must_use]
pub fn format_paper_markdown(paper: &Paper, index: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("## {index}. {}\n\n", paper.title));
    output.push_str(&format!("**Authors**: {}\n\n", paper.author_line()));

    // Year, counters and the user's own state
    let mut meta = vec![
        format!("**Year**: {}", paper.year),
        format!("**Likes**: {}", paper.likes),
        format!("**Bookmarks**: {}", paper.bookmarks),
    ];
    if paper.is_liked_by_user {
        meta.push("**Liked**".to_string());
    }
    if paper.bookmarked {
        meta.push("**Saved**".to_string());
    }
    output.push_str(&format!("{}\n\n", meta.join(" | ")));

    if !paper.categories.is_empty() {
        output.push_str(&format!("**Categories**: {}\n\n", paper.categories.join(", ")));
    }

    let mut links = Vec::new();
    if let Some(html) = &paper.links.html {
        links.push(format!("[arXiv]({html})"));
    }
    if let Some(pdf) = &paper.links.pdf {
        links.push(format!("[PDF]({pdf})"));
    }
    if let Some(doi) = &paper.links.doi {
        links.push(format!("[DOI](https://doi.org/{doi})"));
    }
    if !links.is_empty() {
        output.push_str(&format!("**Links**: {}\n\n", links.join(" | ")));
    }

    output.push_str(&format!("**Abstract**: {}\n", preview(&paper.abstract_text)));

    output
}

/// Format a chat transcript.
#[must_use]
pub fn format_chat_markdown(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| match m.sender {
            Sender::User => format!("**You**: {}", m.text),
            Sender::Ai => format!("**Assistant**: {}", m.text),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn preview(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(ABSTRACT_PREVIEW) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}
