//! arXiv Atom feed parsing and entry normalization.
//!
//! Parsing and normalization are separate passes: [`parse_feed`] collects
//! every `<entry>` into a [`RawEntry`] whose repeated elements (authors,
//! categories, links) are always sequences, whether the feed carried one or
//! many. [`normalize_entries`] then validates each raw entry and builds the
//! canonical [`Paper`].

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;

use crate::config::MissingDatePolicy;
use crate::error::{SourceError, SourceResult};
use crate::models::{Paper, PaperLinks, UNCATEGORIZED, UNKNOWN_AUTHOR};

static ABS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"abs/(.+?)(?:v\d+)?$").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A `<link>` element's attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLink {
    pub href: String,
    pub rel: Option<String>,
    pub title: Option<String>,
    pub mime: Option<String>,
}

/// One `<entry>` exactly as the feed carried it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    /// Number of `<author>` elements, named or not.
    pub author_elements: usize,
    pub author_names: Vec<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub primary_category: Option<String>,
    pub categories: Vec<String>,
    pub links: Vec<RawLink>,
    pub doi: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    Summary,
    Name,
    Published,
    Updated,
    Doi,
}

/// Parse an Atom document into raw entries.
///
/// # Errors
///
/// Returns [`SourceError::MalformedResponse`] when the document is not
/// well-formed XML or has no `<feed>` root.
pub fn parse_feed(xml: &str) -> SourceResult<Vec<RawEntry>> {
    let mut reader = Reader::from_str(xml);

    let mut saw_feed = false;
    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut field: Option<Field> = None;
    let mut in_author = false;
    let mut author_name = String::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            SourceError::malformed(format!(
                "XML error at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(ref e) => {
                let local = e.local_name();
                if local.as_ref() == b"feed" {
                    saw_feed = true;
                    continue;
                }
                if local.as_ref() == b"entry" {
                    current = Some(RawEntry::default());
                    continue;
                }
                let Some(entry) = current.as_mut() else {
                    continue;
                };
                field = match local.as_ref() {
                    b"id" => Some(Field::Id),
                    b"title" => Some(Field::Title),
                    b"summary" => Some(Field::Summary),
                    b"published" => Some(Field::Published),
                    b"updated" => Some(Field::Updated),
                    b"doi" => Some(Field::Doi),
                    b"name" if in_author => Some(Field::Name),
                    b"author" => {
                        in_author = true;
                        entry.author_elements += 1;
                        author_name.clear();
                        None
                    }
                    _ => {
                        read_attribute_element(entry, e);
                        None
                    }
                };
            }
            Event::Empty(ref e) => {
                if let Some(entry) = current.as_mut() {
                    if e.local_name().as_ref() == b"author" {
                        entry.author_elements += 1;
                    } else {
                        read_attribute_element(entry, e);
                    }
                }
            }
            Event::Text(ref e) => {
                let text = e
                    .unescape()
                    .map(std::borrow::Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned());
                append_text(current.as_mut(), field, &text, &mut author_name);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append_text(current.as_mut(), field, &text, &mut author_name);
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                    field = None;
                    in_author = false;
                }
                b"author" if in_author => {
                    if let Some(entry) = current.as_mut() {
                        entry.author_names.push(std::mem::take(&mut author_name));
                    }
                    in_author = false;
                    field = None;
                }
                _ => field = None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_feed {
        return Err(SourceError::malformed("response has no <feed> root element"));
    }

    Ok(entries)
}

fn append_text(entry: Option<&mut RawEntry>, field: Option<Field>, text: &str, name: &mut String) {
    let (Some(entry), Some(field)) = (entry, field) else {
        return;
    };
    let slot = match field {
        Field::Name => {
            name.push_str(text);
            return;
        }
        Field::Id => &mut entry.id,
        Field::Title => &mut entry.title,
        Field::Summary => &mut entry.summary,
        Field::Published => &mut entry.published,
        Field::Updated => &mut entry.updated,
        Field::Doi => &mut entry.doi,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

/// Read `<link>`, `<category>` and `<primary_category>` attributes.
fn read_attribute_element(entry: &mut RawEntry, e: &BytesStart<'_>) {
    let local = e.local_name();
    match local.as_ref() {
        b"link" => {
            let mut link = RawLink::default();
            for attr in e.attributes().flatten() {
                let value = attr
                    .unescape_value()
                    .map(std::borrow::Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                match attr.key.local_name().as_ref() {
                    b"href" => link.href = value,
                    b"rel" => link.rel = Some(value),
                    b"title" => link.title = Some(value),
                    b"type" => link.mime = Some(value),
                    _ => {}
                }
            }
            if !link.href.is_empty() {
                entry.links.push(link);
            }
        }
        b"category" | b"primary_category" => {
            let term = e
                .attributes()
                .flatten()
                .find(|a| a.key.local_name().as_ref() == b"term")
                .map(|a| String::from_utf8_lossy(&a.value).trim().to_string())
                .filter(|t| !t.is_empty());
            if let Some(term) = term {
                if local.as_ref() == b"primary_category" {
                    entry.primary_category = Some(term);
                } else {
                    entry.categories.push(term);
                }
            }
        }
        _ => {}
    }
}

/// Decode the common HTML entities and collapse whitespace.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let decoded = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// Extract the arXiv id from an abstract URL, dropping any version suffix.
///
/// `http://arxiv.org/abs/2401.01234v2` becomes `2401.01234`.
#[must_use]
pub fn extract_arxiv_id(raw: &str) -> Option<String> {
    ABS_ID.captures(raw.trim()).map(|c| c[1].to_string())
}

/// Identifier for entries whose id is not an arXiv abstract URL.
fn synthesize_id(title: &str) -> String {
    let slug: String = title
        .chars()
        .take(20)
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' })
        .collect();
    format!("generated-{slug}")
}

/// Return `base`, or `base-N` for the first N that is not yet used.
fn unique_id(base: String, used: &mut HashSet<String>) -> String {
    let mut candidate = base.clone();
    let mut counter = 1;
    while used.contains(&candidate) {
        candidate = format!("{base}-{counter}");
        counter += 1;
    }
    used.insert(candidate.clone());
    candidate
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok()).map(|d| d.with_timezone(&Utc))
}

fn non_blank(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Validate raw entries and build papers with page-unique ids.
///
/// Entries missing an id, title, author or summary are dropped and logged,
/// as are entries without a usable publication date under
/// [`MissingDatePolicy::Reject`].
#[must_use]
pub fn normalize_entries(
    entries: Vec<RawEntry>,
    policy: MissingDatePolicy,
    now: DateTime<Utc>,
) -> Vec<Paper> {
    let mut used = HashSet::new();
    let mut papers = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let missing: Vec<&str> = [
            ("id", non_blank(entry.id.as_ref())),
            ("title", non_blank(entry.title.as_ref())),
            ("author", entry.author_elements > 0),
            ("summary", non_blank(entry.summary.as_ref())),
        ]
        .into_iter()
        .filter_map(|(name, present)| (!present).then_some(name))
        .collect();

        if !missing.is_empty() {
            tracing::warn!(index, ?missing, id = ?entry.id, "Dropping arXiv entry with missing fields");
            continue;
        }

        let published = match (parse_timestamp(entry.published.as_deref()), policy) {
            (Some(ts), _) => ts,
            (None, MissingDatePolicy::CurrentTime) => {
                tracing::debug!(index, id = ?entry.id, "No publication date, using current time");
                now
            }
            (None, MissingDatePolicy::Reject) => {
                tracing::warn!(index, id = ?entry.id, "Dropping arXiv entry without publication date");
                continue;
            }
        };
        let updated = parse_timestamp(entry.updated.as_deref()).unwrap_or(published);

        let raw_title = entry.title.unwrap_or_default();
        let title = clean_text(&raw_title);
        let abstract_text = clean_text(&entry.summary.unwrap_or_default());

        let raw_id = entry.id.unwrap_or_default();
        let arxiv_id = extract_arxiv_id(&raw_id).unwrap_or_else(|| synthesize_id(&raw_title));
        let id = unique_id(arxiv_id.clone(), &mut used);

        let mut authors: Vec<String> = entry
            .author_names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if authors.is_empty() {
            authors.push(UNKNOWN_AUTHOR.to_string());
        }

        let mut categories: Vec<String> = Vec::new();
        for term in entry.primary_category.into_iter().chain(entry.categories) {
            if !categories.contains(&term) {
                categories.push(term);
            }
        }
        if categories.is_empty() {
            categories.push(UNCATEGORIZED.to_string());
        }

        let links = PaperLinks {
            pdf: entry
                .links
                .iter()
                .find(|l| {
                    l.title.as_deref() == Some("pdf") || l.mime.as_deref() == Some("application/pdf")
                })
                .map(|l| l.href.clone()),
            html: entry
                .links
                .iter()
                .find(|l| {
                    l.rel.as_deref() == Some("alternate") && l.mime.as_deref() == Some("text/html")
                })
                .map(|l| l.href.clone()),
            doi: entry.doi.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
        };

        papers.push(Paper {
            id,
            arxiv_id,
            title: if title.is_empty() { "Untitled".to_string() } else { title },
            abstract_text: if abstract_text.is_empty() {
                "No abstract available".to_string()
            } else {
                abstract_text
            },
            authors,
            year: published.year(),
            published: Some(published),
            updated: Some(updated),
            categories,
            links,
            likes: 0,
            bookmarks: 0,
            is_liked_by_user: false,
            bookmarked: false,
        });
    }

    papers
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <id>http://arxiv.org/api/query</id>
  <title type="html">ArXiv Query</title>
  <updated>2024-01-05T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/abs/2401.01234v2</id>
    <updated>2024-01-04T10:00:00Z</updated>
    <published>2024-01-03T10:00:00Z</published>
    <title>Attention
      Is &amp;lt;All&amp;gt; You Need</title>
    <summary>  We propose a
      new architecture.  </summary>
    <author><name> Ada Lovelace </name></author>
    <author><name>Grace Hopper</name></author>
    <arxiv:doi>10.1000/xyz</arxiv:doi>
    <link href="http://arxiv.org/abs/2401.01234v2" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.01234v2" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.09999v1</id>
    <published>2023-12-30T10:00:00Z</published>
    <title>Single Author Paper</title>
    <summary>Short.</summary>
    <author><name>Solo Researcher</name></author>
    <category term="cs.RO"/>
  </entry>
</feed>"#;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2030-06-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn normalize(xml: &str, policy: MissingDatePolicy) -> Vec<Paper> {
        normalize_entries(parse_feed(xml).unwrap(), policy, now())
    }

    #[test]
    fn test_parses_full_entry() {
        let papers = normalize(FEED, MissingDatePolicy::Reject);
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.id, "2401.01234");
        assert_eq!(first.arxiv_id, "2401.01234");
        assert_eq!(first.title, "Attention Is <All> You Need");
        assert_eq!(first.abstract_text, "We propose a new architecture.");
        assert_eq!(first.authors, vec!["Ada Lovelace", "Grace Hopper"]);
        assert_eq!(first.year, 2024);
        assert_eq!(first.categories, vec!["cs.CL", "cs.LG"]);
        assert_eq!(first.links.html.as_deref(), Some("http://arxiv.org/abs/2401.01234v2"));
        assert_eq!(first.links.pdf.as_deref(), Some("http://arxiv.org/pdf/2401.01234v2"));
        assert_eq!(first.links.doi.as_deref(), Some("10.1000/xyz"));
    }

    #[test]
    fn test_single_author_and_category() {
        let papers = normalize(FEED, MissingDatePolicy::Reject);
        let second = &papers[1];
        assert_eq!(second.authors, vec!["Solo Researcher"]);
        assert_eq!(second.categories, vec!["cs.RO"]);
        assert_eq!(second.year, 2023);
        assert!(second.links.pdf.is_none());
        assert!(second.links.html.is_none());
        assert_eq!(second.updated, second.published);
    }

    #[test]
    fn test_feed_level_elements_are_ignored() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.title.as_deref() != Some("ArXiv Query")));
    }

    #[test]
    fn test_entry_missing_summary_is_dropped() {
        let xml = r#"<feed><entry>
            <id>http://arxiv.org/abs/1</id><title>T</title>
            <author><name>A</name></author>
            <published>2020-01-01T00:00:00Z</published>
        </entry></feed>"#;
        assert!(normalize(xml, MissingDatePolicy::Reject).is_empty());
    }

    #[test]
    fn test_empty_author_names_fall_back() {
        let xml = r#"<feed><entry>
            <id>http://arxiv.org/abs/2101.00001v1</id><title>T</title><summary>S</summary>
            <author><name>   </name></author>
            <published>2021-01-01T00:00:00Z</published>
        </entry></feed>"#;
        let papers = normalize(xml, MissingDatePolicy::Reject);
        assert_eq!(papers[0].authors, vec![UNKNOWN_AUTHOR]);
        assert_eq!(papers[0].categories, vec![UNCATEGORIZED]);
    }

    #[test]
    fn test_missing_date_policy() {
        let xml = r#"<feed><entry>
            <id>http://arxiv.org/abs/2101.00001v1</id><title>T</title><summary>S</summary>
            <author><name>A</name></author>
        </entry></feed>"#;
        assert!(normalize(xml, MissingDatePolicy::Reject).is_empty());

        let papers = normalize(xml, MissingDatePolicy::CurrentTime);
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].year, 2030);
    }

    #[test]
    fn test_duplicate_ids_get_counter_suffix() {
        let entry = r#"<entry>
            <id>http://arxiv.org/abs/2101.00001v1</id><title>Same</title><summary>S</summary>
            <author><name>A</name></author><published>2021-01-01T00:00:00Z</published>
        </entry>"#;
        let xml = format!("<feed>{entry}{entry}{entry}</feed>");
        let ids: Vec<String> =
            normalize(&xml, MissingDatePolicy::Reject).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["2101.00001", "2101.00001-1", "2101.00001-2"]);
    }

    #[test]
    fn test_non_abs_id_is_synthesized_from_title() {
        let xml = r#"<feed><entry>
            <id>urn:uuid:1234</id><title>Graph Nets: A Survey of Everything</title>
            <summary>S</summary><author><name>A</name></author>
            <published>2021-01-01T00:00:00Z</published>
        </entry></feed>"#;
        let papers = normalize(xml, MissingDatePolicy::Reject);
        assert_eq!(papers[0].id, "generated-graph-nets--a-survey");
    }

    #[test]
    fn test_extract_arxiv_id() {
        assert_eq!(extract_arxiv_id("http://arxiv.org/abs/2401.01234v12").as_deref(), Some("2401.01234"));
        assert_eq!(extract_arxiv_id("http://arxiv.org/abs/hep-th/9901001v1").as_deref(), Some("hep-th/9901001"));
        assert_eq!(extract_arxiv_id("http://arxiv.org/abs/2401.01234").as_deref(), Some("2401.01234"));
        assert_eq!(extract_arxiv_id("not a url"), None);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a\n\t b &quot;c&quot; &#39;d&#39;  "), "a b \"c\" 'd'");
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        let err = parse_feed("<feed><entry></feed>").unwrap_err();
        assert!(matches!(err, SourceError::MalformedResponse { .. }));
    }

    #[test]
    fn test_missing_feed_root_is_rejected() {
        let err = parse_feed("<html><body>Service down</body></html>").unwrap_err();
        assert!(matches!(err, SourceError::MalformedResponse { .. }));
    }

    #[test]
    fn test_empty_feed_has_no_entries() {
        assert!(parse_feed("<feed></feed>").unwrap().is_empty());
    }
}
