//! Extraction of build rows and package links from Koji's HTML pages.
//!
//! Orchestration only sees [`parse_search_page`] and [`parse_detail_page`];
//! the markup walking stays in here.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// One build from the search results table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCandidate {
    pub name: String,
    pub build_id: String,
}

/// What a single search results page yielded.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub candidates: Vec<BuildCandidate>,
    /// Result rows seen on the page, including the ones the marker filter dropped.
    /// The next page's offset advances by this.
    pub rows: usize,
    pub has_next: bool,
}

/// An `<a>` element as found in the document.
#[derive(Debug)]
struct Anchor {
    href: Option<String>,
    text: String,
    /// Index of the enclosing `row-odd`/`row-even` row, if any.
    row: Option<usize>,
    in_first_cell: bool,
}

#[derive(Debug, Default)]
struct Document {
    anchors: Vec<Anchor>,
    rows: usize,
}

const BUILD_LINK: &str = "buildinfo?buildID=";

pub fn parse_search_page(html: &str, dist_marker: &str) -> SearchPage {
    let doc = scan(html);
    let mut candidates = Vec::new();

    for row in 0..doc.rows {
        let link = doc
            .anchors
            .iter()
            .find(|a| a.row == Some(row) && a.in_first_cell && a.href.is_some());
        let Some(link) = link else {
            continue;
        };
        let Some(build_id) = link.href.as_deref().and_then(build_id_from_href) else {
            continue;
        };
        let name = link.text.trim().to_string();
        if has_dist_marker(&name, dist_marker) {
            candidates.push(BuildCandidate { name, build_id });
        }
    }

    SearchPage {
        candidates,
        rows: doc.rows,
        has_next: doc.anchors.iter().any(|a| a.text.trim() == "Next"),
    }
}

/// Every hyperlink target on the page, in document order.
pub fn parse_detail_page(html: &str) -> Vec<String> {
    scan(html)
        .anchors
        .into_iter()
        .filter_map(|a| a.href)
        .collect()
}

/// Picks the binary RPM for `arch`: packages directory, not a source RPM,
/// non-debug preferred, first debug variant as a fallback.
pub fn pick_artifact<'a>(links: &'a [String], arch: &str) -> Option<&'a str> {
    let rpms: Vec<&str> = links
        .iter()
        .map(String::as_str)
        .filter(|href| {
            href.ends_with(".rpm")
                && href.contains("/packages/")
                && !href.ends_with(".src.rpm")
                && href.contains(arch)
        })
        .collect();

    rpms.iter()
        .find(|href| !file_name(href).contains("-debug"))
        .or_else(|| rpms.first())
        .copied()
}

/// `.fc` must be followed by a release number, e.g. `.fc40`.
pub fn has_dist_marker(name: &str, marker: &str) -> bool {
    name.match_indices(marker).any(|(at, _)| {
        name[at + marker.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

fn build_id_from_href(href: &str) -> Option<String> {
    let (_, rest) = href.rsplit_once(BUILD_LINK)?;
    let id: String = rest.chars().take_while(|c| *c != '&').collect();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(id)
}

fn file_name(href: &str) -> &str {
    href.rsplit('/').next().unwrap_or(href)
}

fn is_tag(e: &BytesStart, tag: &[u8]) -> bool {
    e.local_name().as_ref().eq_ignore_ascii_case(tag)
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.html_attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref().eq_ignore_ascii_case(key))
        .map(|attr| String::from_utf8_lossy(&attr.value).replace("&amp;", "&"))
}

fn is_result_row(e: &BytesStart) -> bool {
    attribute(e, b"class").is_some_and(|class| {
        class
            .split_whitespace()
            .any(|c| c == "row-odd" || c == "row-even")
    })
}

fn entity(name: &[u8]) -> String {
    match name {
        b"amp" => "&".to_string(),
        b"lt" => "<".to_string(),
        b"gt" => ">".to_string(),
        b"quot" => "\"".to_string(),
        b"apos" => "'".to_string(),
        b"nbsp" => " ".to_string(),
        [b'#', b'x' | b'X', hex @ ..] => char_ref(hex, 16, name),
        [b'#', dec @ ..] => char_ref(dec, 10, name),
        other => format!("&{};", String::from_utf8_lossy(other)),
    }
}

fn char_ref(digits: &[u8], radix: u32, raw: &[u8]) -> String {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|d| u32::from_str_radix(d, radix).ok())
        .and_then(char::from_u32)
        .map(String::from)
        .unwrap_or_else(|| format!("&{};", String::from_utf8_lossy(raw)))
}

/// Walks the page once, collecting anchors and result-row context.
/// HTML is not XML, so end-tag matching is switched off and script/style
/// bodies are skipped as raw text. Malformed markup such as a bare `&` is
/// skipped; the walk only gives up when the reader stops making progress.
fn scan(html: &str) -> Document {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut doc = Document::default();
    let mut row: Option<usize> = None;
    let mut cell = 0usize;
    let mut in_first_cell = false;
    let mut open: Option<Anchor> = None;
    let mut last_error_at = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if is_tag(&e, b"script") || is_tag(&e, b"style") {
                    if let Err(err) = reader.read_text(e.name()) {
                        log::debug!("Unterminated script/style block: {}", err);
                        break;
                    }
                } else if is_tag(&e, b"tr") {
                    row = if is_result_row(&e) {
                        doc.rows += 1;
                        Some(doc.rows - 1)
                    } else {
                        None
                    };
                    cell = 0;
                    in_first_cell = false;
                } else if is_tag(&e, b"td") && row.is_some() {
                    cell += 1;
                    in_first_cell = cell == 1;
                } else if is_tag(&e, b"a") {
                    if let Some(previous) = open.take() {
                        doc.anchors.push(previous);
                    }
                    open = Some(Anchor {
                        href: attribute(&e, b"href"),
                        text: String::new(),
                        row,
                        in_first_cell,
                    });
                }
            }
            Ok(Event::Empty(e)) if is_tag(&e, b"a") => {
                doc.anchors.push(Anchor {
                    href: attribute(&e, b"href"),
                    text: String::new(),
                    row,
                    in_first_cell,
                });
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if name.as_ref().eq_ignore_ascii_case(b"a") {
                    if let Some(anchor) = open.take() {
                        doc.anchors.push(anchor);
                    }
                } else if name.as_ref().eq_ignore_ascii_case(b"td") {
                    in_first_cell = false;
                } else if name.as_ref().eq_ignore_ascii_case(b"tr") {
                    row = None;
                    in_first_cell = false;
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(anchor) = open.as_mut() {
                    anchor.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if let Some(anchor) = open.as_mut() {
                    anchor.text.push_str(&entity(&r));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                let at = reader.buffer_position();
                log::debug!("Skipping malformed HTML at byte {}: {}", at, err);
                if last_error_at == Some(at) {
                    break;
                }
                last_error_at = Some(at);
            }
            _ => {}
        }
    }

    if let Some(anchor) = open.take() {
        doc.anchors.push(anchor);
    }
    doc
}
