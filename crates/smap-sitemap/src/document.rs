//! Sitemap page and index documents.
//!
//! Both documents follow the sitemaps.org 0.9 protocol:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" ...>
//!   <url>
//!     <loc>http://example.com/a</loc>
//!     <priority>0.5</priority>
//!   </url>
//! </urlset>
//! ```
//!
//! Encoding goes through `quick-xml`'s serde serializer, which escapes text
//! content, so locations are stored unescaped in [`Entry`].

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::{Entry, Priority};
use crate::error::DocumentError;

/// File name of the sitemap index inside the cache directory.
pub const INDEX_FILE_NAME: &str = "sitemapindex.xml";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const PAGE_SCHEMA_LOCATION: &str = "http://www.sitemaps.org/schemas/sitemap/0.9 \
                                    http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd";
const INDEX_SCHEMA_LOCATION: &str = "http://www.sitemaps.org/schemas/sitemap/0.9 \
                                     http://www.sitemaps.org/schemas/sitemap/0.9/siteindex.xsd";

/// File name of the page with the given 1-based number.
#[must_use]
pub fn page_file_name(number: usize) -> String {
    format!("sitemap_{number}.xml")
}

/// Page number encoded in a `sitemap_<N>.xml` file name.
///
/// Only the canonical spelling produced by [`page_file_name`] is accepted,
/// so `sitemap_01.xml` is not page 1.
pub(crate) fn parse_page_number(file_name: &str) -> Option<usize> {
    let digits = file_name.strip_prefix("sitemap_")?.strip_suffix(".xml")?;
    let canonical = digits.bytes().all(|b| b.is_ascii_digit()) && !digits.starts_with('0');
    if digits.is_empty() || !canonical {
        return None;
    }
    digits.parse().ok()
}

/// One sitemap page (`<urlset>`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SitemapPage {
    entries: Vec<Entry>,
}

impl SitemapPage {
    #[must_use]
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Encode the page as an XML document.
    pub fn to_xml(&self) -> Result<String, DocumentError> {
        let urls = self
            .entries
            .iter()
            .map(|entry| UrlOut {
                loc: entry.location(),
                lastmod: entry.last_modified().map(format_last_modified),
                changefreq: entry.change_frequency().map(|f| f.as_str()),
                priority: entry.priority().map(|p| p.to_string()),
            })
            .collect();

        encode(&UrlSetOut {
            xmlns: SITEMAP_NS,
            xmlns_xsi: XSI_NS,
            schema_location: PAGE_SCHEMA_LOCATION,
            url: urls,
        })
    }

    /// Parse a page document.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let doc: UrlSetIn = quick_xml::de::from_str(xml)?;
        let entries = doc
            .url
            .into_iter()
            .map(UrlIn::into_entry)
            .collect::<Result<_, _>>()?;
        Ok(Self { entries })
    }
}

/// The sitemap index (`<sitemapindex>`), listing absolute page URLs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SitemapIndex {
    locations: Vec<String>,
}

impl SitemapIndex {
    #[must_use]
    pub fn new(locations: Vec<String>) -> Self {
        Self { locations }
    }

    /// Absolute URLs of the referenced pages, in generation order.
    #[must_use]
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Encode the index as an XML document.
    pub fn to_xml(&self) -> Result<String, DocumentError> {
        encode(&SitemapIndexOut {
            xmlns: SITEMAP_NS,
            xmlns_xsi: XSI_NS,
            schema_location: INDEX_SCHEMA_LOCATION,
            sitemap: self
                .locations
                .iter()
                .map(|loc| SitemapRefOut { loc })
                .collect(),
        })
    }

    /// Parse an index document.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let doc: SitemapIndexIn = quick_xml::de::from_str(xml)?;
        Ok(Self {
            locations: doc.sitemap.into_iter().map(|r| r.loc).collect(),
        })
    }
}

fn encode<T: Serialize>(doc: &T) -> Result<String, DocumentError> {
    let mut xml = String::from(XML_DECLARATION);
    let mut serializer = quick_xml::se::Serializer::new(&mut xml);
    serializer.indent(' ', 2);
    doc.serialize(serializer)?;
    xml.push('\n');
    Ok(xml)
}

fn format_last_modified(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Accepts full W3C datetimes and plain `YYYY-MM-DD` dates.
fn parse_last_modified(value: &str) -> Result<DateTime<Utc>, DocumentError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| invalid_value("lastmod", value))
}

fn invalid_value(element: &'static str, value: &str) -> DocumentError {
    DocumentError::InvalidValue {
        element,
        value: value.to_owned(),
    }
}

#[derive(Serialize)]
#[serde(rename = "urlset")]
struct UrlSetOut<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@xmlns:xsi")]
    xmlns_xsi: &'a str,
    #[serde(rename = "@xsi:schemaLocation")]
    schema_location: &'a str,
    url: Vec<UrlOut<'a>>,
}

#[derive(Serialize)]
struct UrlOut<'a> {
    loc: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lastmod: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    changefreq: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<String>,
}

#[derive(Serialize)]
#[serde(rename = "sitemapindex")]
struct SitemapIndexOut<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@xmlns:xsi")]
    xmlns_xsi: &'a str,
    #[serde(rename = "@xsi:schemaLocation")]
    schema_location: &'a str,
    sitemap: Vec<SitemapRefOut<'a>>,
}

#[derive(Serialize)]
struct SitemapRefOut<'a> {
    loc: &'a str,
}

#[derive(Deserialize)]
struct UrlSetIn {
    #[serde(default)]
    url: Vec<UrlIn>,
}

#[derive(Deserialize)]
struct UrlIn {
    loc: String,
    lastmod: Option<String>,
    changefreq: Option<String>,
    priority: Option<String>,
}

impl UrlIn {
    fn into_entry(self) -> Result<Entry, DocumentError> {
        let mut entry = Entry::new(self.loc);
        if let Some(raw) = self.priority {
            let priority = raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|v| Priority::new(v).ok())
                .ok_or_else(|| invalid_value("priority", &raw))?;
            entry = entry.with_priority(priority);
        }
        if let Some(raw) = self.changefreq {
            let freq = raw
                .trim()
                .parse()
                .map_err(|_| invalid_value("changefreq", &raw))?;
            entry = entry.with_change_frequency(freq);
        }
        if let Some(raw) = self.lastmod {
            entry = entry.with_last_modified(parse_last_modified(raw.trim())?);
        }
        Ok(entry)
    }
}

#[derive(Deserialize)]
struct SitemapIndexIn {
    #[serde(default)]
    sitemap: Vec<SitemapRefIn>,
}

#[derive(Deserialize)]
struct SitemapRefIn {
    loc: String,
}
