use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::fetch::FetchedDocument;
use crate::parse::non_empty;
use crate::resolve::resolve;
use crate::Document;

/// Maximum length, in characters, of a description taken from body text.
pub const DESCRIPTION_MAX_CHARS: usize = 300;

/// Marker appended to truncated descriptions.
pub const ELLIPSIS: &str = "...";

/// Separator between page and site in `<title>` text, e.g. "Post - Site".
const TITLE_SEPARATOR: &str = " - ";

/// The four preview fields, each `None` when no strategy produced a value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub site_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    Image,
    SiteName,
}

/// One way of producing a value for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// `<meta property|name="key" content="…">`
    Meta(&'static str),
    /// `<title>` text.
    TitleTag,
    /// First `<h1>` text.
    FirstHeading,
    /// First `<p>` text, truncated.
    FirstParagraph,
    /// First `<img>` inside an `<article>`.
    ArticleImage,
    /// First `<img>` that is not an icon or logo.
    ContentImage,
    /// Last " - " segment of the `<title>` text.
    TitleSuffix,
}

const TITLE_CHAIN: &[Strategy] = &[
    Strategy::Meta("og:title"),
    Strategy::Meta("twitter:title"),
    Strategy::TitleTag,
    Strategy::FirstHeading,
];

const DESCRIPTION_CHAIN: &[Strategy] = &[
    Strategy::Meta("og:description"),
    Strategy::Meta("twitter:description"),
    Strategy::Meta("description"),
    Strategy::FirstParagraph,
];

const IMAGE_CHAIN: &[Strategy] = &[
    Strategy::Meta("og:image"),
    Strategy::Meta("twitter:image"),
    Strategy::ArticleImage,
    Strategy::ContentImage,
];

const SITE_NAME_CHAIN: &[Strategy] = &[Strategy::Meta("og:site_name"), Strategy::TitleSuffix];

/// A value proposed by one strategy, with its position in the chain.
#[derive(Debug)]
struct ExtractionCandidate {
    field: Field,
    strategy: Strategy,
    rank: usize,
    value: String,
}

impl Strategy {
    fn apply(self, doc: &Document) -> Option<String> {
        match self {
            Strategy::Meta(key) => doc.meta_content(key),
            Strategy::TitleTag => doc.title(),
            Strategy::FirstHeading => doc.select_first("h1").and_then(|el| non_empty(&el.text())),
            Strategy::FirstParagraph => doc
                .select_first("p")
                .and_then(|el| non_empty(&el.text()))
                .map(|text| truncate_description(&text)),
            Strategy::ArticleImage => doc
                .select_first("article img[src]")
                .and_then(|el| el.attr("src").and_then(non_empty)),
            Strategy::ContentImage => doc.select("img[src]").ok()?.iter().find_map(|el| {
                let src = el.attr("src")?;
                let lowered = src.to_lowercase();
                if lowered.contains("icon") || lowered.contains("logo") { None } else { non_empty(src) }
            }),
            Strategy::TitleSuffix => {
                let title = doc.title()?;
                let parts: Vec<&str> = title.split(TITLE_SEPARATOR).collect();
                if parts.len() > 1 { parts.last().and_then(|last| non_empty(last)) } else { None }
            }
        }
    }
}

/// Runs `chain` in order and returns the first candidate that survives `finish`.
///
/// `finish` post-processes a raw value; returning `None` from it makes the
/// chain move on to the next strategy.
fn select_candidate(
    doc: &Document, field: Field, chain: &[Strategy], finish: impl Fn(String) -> Option<String>,
) -> Option<ExtractionCandidate> {
    chain.iter().enumerate().find_map(|(rank, strategy)| {
        let value = strategy.apply(doc).and_then(&finish)?;
        Some(ExtractionCandidate { field, strategy: *strategy, rank, value })
    })
}

fn winner(candidate: Option<ExtractionCandidate>) -> Option<String> {
    let candidate = candidate?;
    debug!(
        field = ?candidate.field,
        strategy = ?candidate.strategy,
        rank = candidate.rank,
        "Selected preview field"
    );
    Some(candidate.value)
}

/// Cuts `text` to [`DESCRIPTION_MAX_CHARS`] characters plus [`ELLIPSIS`].
///
/// Counts characters, not bytes, so multi-byte text is never split inside
/// a code point.
pub fn truncate_description(text: &str) -> String {
    match text.char_indices().nth(DESCRIPTION_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

impl Document {
    /// Extract title with priority fallback:
    /// 1. Open Graph `og:title`
    /// 2. Twitter `twitter:title`
    /// 3. `<title>` element
    /// 4. First `<h1>` element
    pub fn extract_title(&self) -> Option<String> {
        winner(select_candidate(self, Field::Title, TITLE_CHAIN, Some))
    }

    /// Extract description with priority fallback:
    /// 1. Open Graph `og:description`
    /// 2. Twitter `twitter:description`
    /// 3. Meta `description`
    /// 4. First paragraph, truncated to 300 characters
    pub fn extract_description(&self) -> Option<String> {
        winner(select_candidate(self, Field::Description, DESCRIPTION_CHAIN, Some))
    }

    /// Extract image with priority fallback, resolved against `base`:
    /// 1. Open Graph `og:image`
    /// 2. Twitter `twitter:image`
    /// 3. First image inside `<article>`
    /// 4. First image whose source mentions neither "icon" nor "logo"
    ///
    /// A candidate that cannot be resolved to an http(s) URL is skipped.
    pub fn extract_image(&self, base: &Url) -> Option<String> {
        winner(select_candidate(self, Field::Image, IMAGE_CHAIN, |src| resolve(&src, base)))
    }

    /// Extract site name with priority fallback:
    /// 1. Open Graph `og:site_name`
    /// 2. Last segment of a `<title>` of the form "Page - Site"
    pub fn extract_site_name(&self) -> Option<String> {
        winner(select_candidate(self, Field::SiteName, SITE_NAME_CHAIN, Some))
    }

    /// Extract all preview fields at once.
    pub fn extract_fields(&self, base: &Url) -> ExtractedFields {
        ExtractedFields {
            title: self.extract_title(),
            description: self.extract_description(),
            image: self.extract_image(base),
            site_name: self.extract_site_name(),
        }
    }
}

/// Parses a fetched document and extracts its preview fields.
///
/// Relative references are resolved against the document's final URL. A
/// body with no recognizable markup yields all fields `None`.
pub fn extract(doc: &FetchedDocument) -> ExtractedFields {
    Document::parse(&doc.body).extract_fields(&doc.final_url)
}
