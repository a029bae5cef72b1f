//! Parsing of EDGAR monthly XBRL RSS feeds.
//!
//! A feed is an RSS 2.0 document with one `item` per filing. Filing details
//! live in elements of the `edgar` namespace inside each item:
//!
//! ```xml
//! <item>
//!   <title>INTEL CORP (0000050863) (Filer)</title>
//!   <edgar:xbrlFiling>
//!     <edgar:companyName>INTEL CORP</edgar:companyName>
//!     <edgar:accessionNumber>0000050863-16-000105</edgar:accessionNumber>
//!     ...
//!     <edgar:xbrlFiles>
//!       <edgar:xbrlFile edgar:type="EX-101.INS" edgar:url="https://..."/>
//!     </edgar:xbrlFiles>
//!   </edgar:xbrlFiling>
//! </item>
//! ```
//!
//! The whole document is held in memory and read with a namespace-aware
//! pull parser.

use crate::error::Result;
use crate::record::{FeedField, FilingRecord};
use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Namespace of the filing detail elements.
pub const EDGAR_NS: &str = "http://www.sec.gov/Archives/edgar";

/// `xbrlFile` types that mark the XBRL instance document.
pub const INSTANCE_DOCUMENT_TYPES: [&str; 2] = ["EX-101.INS", "EX-100.INS"];

/// A non-fatal problem found while parsing a feed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedWarning {
    /// The item lists XBRL files but none of them is an instance document.
    MissingInstanceDocument {
        /// Title of the offending item
        title: Option<String>,
    },
    /// The item has no accession number and was skipped.
    MissingAccessionNumber {
        /// Title of the offending item
        title: Option<String>,
    },
}

/// Records extracted from one feed, in document order, with the warnings
/// raised along the way.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// One record per usable item
    pub records: Vec<FilingRecord>,
    /// Non-fatal problems, one per affected item
    pub warnings: Vec<FeedWarning>,
}

/// Read and parse a cached feed file.
pub fn parse_feed_file(path: &Path) -> Result<ParsedFeed> {
    info!(feed = %path.display(), "Parsing feed");
    let xml = std::fs::read_to_string(path)?;
    parse_feed(&xml)
}

/// Parse a feed document held in memory.
///
/// # Errors
/// Returns [`EdgarError::XmlParse`](crate::EdgarError::XmlParse) if the
/// document is not well-formed XML.
pub fn parse_feed(xml: &str) -> Result<ParsedFeed> {
    let mut reader = NsReader::from_str(xml);
    let mut feed = ParsedFeed::default();
    let mut item: Option<ItemState> = None;
    let mut depth = 0usize;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let scope = Scope::of(&ns);

        match event {
            Event::Start(e) => {
                depth += 1;
                open_element(&reader, &mut item, &e, scope, depth)?;
            }
            Event::Empty(e) => {
                open_element(&reader, &mut item, &e, scope, depth + 1)?;
                close_element(&mut item, &mut feed, depth + 1);
            }
            Event::End(_) => {
                close_element(&mut item, &mut feed, depth);
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) => {
                if let Some(capture) = item.as_mut().and_then(|s| s.capture.as_mut()) {
                    capture.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(capture) = item.as_mut().and_then(|s| s.capture.as_mut()) {
                    capture.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    debug!(
        records = feed.records.len(),
        warnings = feed.warnings.len(),
        "Parsed feed"
    );
    Ok(feed)
}

/// Namespace an element or attribute name resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Edgar,
    Unqualified,
    Other,
}

impl Scope {
    fn of(ns: &ResolveResult<'_>) -> Self {
        match ns {
            ResolveResult::Bound(Namespace(uri)) if *uri == EDGAR_NS.as_bytes() => Self::Edgar,
            ResolveResult::Unbound => Self::Unqualified,
            _ => Self::Other,
        }
    }
}

#[derive(Debug)]
enum Target {
    Field(FeedField),
    Title,
}

#[derive(Debug)]
struct Capture {
    target: Target,
    depth: usize,
    text: String,
}

/// Accumulated state of the `item` currently being read.
#[derive(Debug)]
struct ItemState {
    depth: usize,
    record: FilingRecord,
    seen: HashSet<FeedField>,
    title: Option<String>,
    capture: Option<Capture>,
    xbrl_files_depth: Option<usize>,
}

impl ItemState {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            record: FilingRecord::default(),
            seen: HashSet::new(),
            title: None,
            capture: None,
            xbrl_files_depth: None,
        }
    }

    fn finish(self, feed: &mut ParsedFeed) {
        let title = self.title;

        if !self.seen.contains(&FeedField::AccessionNumber) {
            warn!(title = title.as_deref().unwrap_or(""), "No accession number, skipping item");
            feed.warnings.push(FeedWarning::MissingAccessionNumber { title });
            return;
        }

        if self.seen.contains(&FeedField::XbrlFiles) && self.record.xbrl_files.is_none() {
            warn!(
                title = title.as_deref().unwrap_or(""),
                "No EX-101 or EX-100 instance document found"
            );
            feed.warnings.push(FeedWarning::MissingInstanceDocument { title });
        }

        feed.records.push(self.record);
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    item: &mut Option<ItemState>,
    e: &BytesStart<'_>,
    scope: Scope,
    depth: usize,
) -> Result<()> {
    let local = e.local_name();
    let local = local.as_ref();

    let Some(state) = item.as_mut() else {
        if scope == Scope::Unqualified && local == b"item" {
            *item = Some(ItemState::new(depth));
        }
        return Ok(());
    };

    // Field values are plain text; anything nested inside is ignored
    if state.capture.is_some() {
        return Ok(());
    }

    match scope {
        Scope::Edgar if local == b"xbrlFile" => {
            if state.xbrl_files_depth.is_some() && state.record.xbrl_files.is_none() {
                state.record.xbrl_files = instance_document_url(reader, e)?;
            }
        }
        Scope::Edgar => {
            let field = std::str::from_utf8(local)
                .ok()
                .and_then(FeedField::from_label);
            if let Some(field) = field
                && state.seen.insert(field)
            {
                if field == FeedField::XbrlFiles {
                    state.xbrl_files_depth = Some(depth);
                } else {
                    state.capture = Some(Capture {
                        target: Target::Field(field),
                        depth,
                        text: String::new(),
                    });
                }
            }
        }
        Scope::Unqualified
            if local == b"title" && depth == state.depth + 1 && state.title.is_none() =>
        {
            state.capture = Some(Capture {
                target: Target::Title,
                depth,
                text: String::new(),
            });
        }
        _ => {}
    }

    Ok(())
}

fn close_element(item: &mut Option<ItemState>, feed: &mut ParsedFeed, depth: usize) {
    let Some(state) = item.as_mut() else {
        return;
    };

    if state.capture.as_ref().is_some_and(|c| c.depth == depth)
        && let Some(capture) = state.capture.take()
    {
        match capture.target {
            Target::Field(field) => state.record.set(field, Some(capture.text)),
            Target::Title => state.title = Some(capture.text),
        }
    }

    if state.xbrl_files_depth == Some(depth) {
        state.xbrl_files_depth = None;
    }

    if state.depth == depth
        && let Some(state) = item.take()
    {
        state.finish(feed);
    }
}

/// URL of an `xbrlFile` element if its type marks an instance document.
fn instance_document_url(reader: &NsReader<&[u8]>, e: &BytesStart<'_>) -> Result<Option<String>> {
    let mut kind = None;
    let mut url = None;

    for attr in e.attributes() {
        let attr = attr?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        if Scope::of(&ns) != Scope::Edgar {
            continue;
        }
        match local.as_ref() {
            b"type" => kind = Some(attr.unescape_value()?.into_owned()),
            b"url" => url = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }

    match kind {
        Some(kind) if INSTANCE_DOCUMENT_TYPES.contains(&kind.as_str()) => Ok(url),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:edgar="{EDGAR_NS}">
<channel>
<title>All XBRL Data Submitted to the SEC for 2016-12</title>
{items}
</channel>
</rss>"#
        )
    }

    fn item(title: &str, accession: &str, files: &str) -> String {
        format!(
            r#"<item>
<title>{title}</title>
<edgar:xbrlFiling>
<edgar:companyName>{title}</edgar:companyName>
<edgar:formType>10-Q</edgar:formType>
<edgar:filingDate>12/01/2016</edgar:filingDate>
<edgar:cikNumber>0000012345</edgar:cikNumber>
<edgar:accessionNumber>{accession}</edgar:accessionNumber>
<edgar:xbrlFiles>
{files}
</edgar:xbrlFiles>
</edgar:xbrlFiling>
</item>"#
        )
    }

    #[test]
    fn test_items_in_document_order() {
        let xml = feed(&format!(
            "{}{}{}",
            item("A", "0001", r#"<edgar:xbrlFile edgar:type="EX-101.INS" edgar:url="http://x/a.xml"/>"#),
            item("B", "0002", r#"<edgar:xbrlFile edgar:type="EX-100.INS" edgar:url="http://x/b.xml"/>"#),
            item("C", "0003", r#"<edgar:xbrlFile edgar:type="EX-101.INS" edgar:url="http://x/c.xml"/>"#),
        ));

        let parsed = parse_feed(&xml).unwrap();
        let accessions: Vec<_> = parsed
            .records
            .iter()
            .map(|r| r.accession_number.as_str())
            .collect();
        assert_eq!(accessions, vec!["0001", "0002", "0003"]);
        assert_eq!(parsed.records[1].xbrl_files.as_deref(), Some("http://x/b.xml"));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_first_instance_document_wins() {
        let files = r#"<edgar:xbrlFile edgar:type="10-Q" edgar:url="http://x/doc.htm"/>
<edgar:xbrlFile edgar:type="EX-101.SCH" edgar:url="http://x/doc.xsd"/>
<edgar:xbrlFile edgar:type="EX-101.INS" edgar:url="http://x/first.xml"/>
<edgar:xbrlFile edgar:type="EX-100.INS" edgar:url="http://x/second.xml"/>"#;
        let parsed = parse_feed(&feed(&item("A", "0001", files))).unwrap();
        assert_eq!(
            parsed.records[0].xbrl_files.as_deref(),
            Some("http://x/first.xml")
        );
    }

    #[test]
    fn test_missing_instance_document_warns_once() {
        let files = r#"<edgar:xbrlFile edgar:type="10-K" edgar:url="http://x/doc.htm"/>
<edgar:xbrlFile edgar:type="EX-101.SCH" edgar:url="http://x/doc.xsd"/>"#;
        let parsed = parse_feed(&feed(&item("ACME CORP", "0001", files))).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].xbrl_files, None);
        assert_eq!(
            parsed.warnings,
            vec![FeedWarning::MissingInstanceDocument {
                title: Some("ACME CORP".to_string())
            }]
        );
    }

    #[test]
    fn test_absent_fields_are_null() {
        let xml = feed(
            r#"<item>
<title>Sparse</title>
<edgar:xbrlFiling>
<edgar:accessionNumber>0009</edgar:accessionNumber>
<edgar:period></edgar:period>
<edgar:fiscalYearEnd/>
</edgar:xbrlFiling>
</item>"#,
        );
        let parsed = parse_feed(&xml).unwrap();
        let record = &parsed.records[0];

        assert_eq!(record.accession_number, "0009");
        assert_eq!(record.company_name, None);
        assert_eq!(record.xbrl_files, None);
        // Present but empty elements keep their (empty) text
        assert_eq!(record.period.as_deref(), Some(""));
        assert_eq!(record.fiscal_year_end.as_deref(), Some(""));
        // No xbrlFiles element at all is not a warning
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_item_without_accession_is_skipped() {
        let xml = feed(
            r#"<item><title>No key</title><edgar:xbrlFiling>
<edgar:companyName>No key</edgar:companyName>
</edgar:xbrlFiling></item>"#,
        );
        let parsed = parse_feed(&xml).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(
            parsed.warnings,
            vec![FeedWarning::MissingAccessionNumber {
                title: Some("No key".to_string())
            }]
        );
    }

    #[test]
    fn test_other_namespaces_ignored() {
        let xml = r#"<rss xmlns:edgar="http://www.sec.gov/Archives/edgar" xmlns:other="urn:other">
<channel><item>
<title>T</title>
<other:accessionNumber>wrong</other:accessionNumber>
<edgar:accessionNumber>right</edgar:accessionNumber>
<edgar:companyName>A &amp; B INC</edgar:companyName>
</item></channel></rss>"#;
        let parsed = parse_feed(xml).unwrap();
        assert_eq!(parsed.records[0].accession_number, "right");
        assert_eq!(parsed.records[0].company_name.as_deref(), Some("A & B INC"));
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let result = parse_feed("<rss><channel><item></channel></rss>");
        assert!(matches!(result, Err(crate::EdgarError::XmlParse(_))));
    }
}
