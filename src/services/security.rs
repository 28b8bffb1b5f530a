//! Security-fix detail extraction.
//!
//! Two-stage lookup: the releases index page links each OS release to a
//! security note; the note lists fixed issues as repeating blocks of a
//! component heading, three paragraphs, and a CVE paragraph.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::SourcesConfig;
use crate::error::{AppError, Result};
use crate::models::SecurityDetail;
use crate::utils::http::DocumentFetcher;
use crate::utils::{normalize_whitespace, resolve_url, truncate_line};

/// Maximum characters per extracted fix line, ellipsis included.
pub const FIX_LINE_MAX: usize = 120;

/// Placeholder when a release note exists but lists no fixes yet.
pub const NOT_PUBLISHED: &str = "Details not yet published.";

/// Locate the release-note URL for an OS release on the index page.
///
/// The anchor's visible text must contain both the OS name and the
/// version substring (case-insensitive); relative hrefs are resolved
/// against the index URL.
pub fn find_release_link(
    html: &str,
    index_url: &str,
    os: &str,
    version: &str,
) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let anchor_sel = parse_selector("a")?;

    let href_re = Regex::new(r"/en-us/(?:\d+|HT\d+)$")
        .map_err(|e| AppError::extract("release link", e))?;
    let base = Url::parse(index_url)?;

    let os_lower = os.to_lowercase();
    let version_lower = version.to_lowercase();

    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href_re.is_match(href) {
            continue;
        }

        let text = normalize_whitespace(&anchor.text().collect::<String>()).to_lowercase();
        if text.contains(&os_lower) && text.contains(&version_lower) {
            return Ok(Some(resolve_url(&base, href)));
        }
    }

    Ok(None)
}

/// Extract formatted fix lines from a release-note page.
///
/// A block is an `h3` component heading followed by three paragraphs and
/// a paragraph starting with a CVE identifier. Lines longer than
/// [`FIX_LINE_MAX`] characters are truncated with an ellipsis.
pub fn extract_fix_lines(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let heading_sel = parse_selector("h3")?;

    let cve_re =
        Regex::new(r"^CVE-\d{4}-\d+").map_err(|e| AppError::extract("fix block", e))?;

    let mut fixes = Vec::new();

    for heading in document.select(&heading_sel) {
        let paragraphs: Vec<ElementRef> = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take_while(|el| el.value().name() == "p")
            .take(4)
            .collect();

        if paragraphs.len() < 4 {
            continue;
        }

        let cve = element_text(paragraphs[3]);
        if !cve_re.is_match(&cve) {
            continue;
        }

        let component = element_text(heading);
        let impact = element_text(paragraphs[1]);
        let description = element_text(paragraphs[2]);

        let line = format!("• {component} → {impact} | {description} | {cve}");
        fixes.push(truncate_line(&line, FIX_LINE_MAX));
    }

    Ok(fixes)
}

fn element_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::extract(s, format!("{e:?}")))
}

/// Service resolving security details for an OS release.
pub struct SecurityService<'a> {
    fetcher: &'a dyn DocumentFetcher,
    sources: &'a SourcesConfig,
}

impl<'a> SecurityService<'a> {
    pub fn new(fetcher: &'a dyn DocumentFetcher, sources: &'a SourcesConfig) -> Self {
        Self { fetcher, sources }
    }

    /// Fetch and extract the fix details for one OS release.
    ///
    /// Never fails: any fetch or lookup problem on this path degrades to
    /// a single error line with no link, so the check cycle continues.
    pub async fn details(&self, os: &str, version: &str) -> SecurityDetail {
        match self.try_details(os, version).await {
            Ok(detail) => detail,
            Err(e) => {
                log::warn!("Security detail lookup failed for {} {}: {}", os, version, e);
                SecurityDetail::placeholder(os, format!("Error: {e}"))
            }
        }
    }

    async fn try_details(&self, os: &str, version: &str) -> Result<SecurityDetail> {
        let index_html = self
            .fetcher
            .fetch_text(&self.sources.releases_index_url)
            .await?;

        let link = find_release_link(&index_html, &self.sources.releases_index_url, os, version)?
            .ok_or_else(|| {
                AppError::extract(
                    "release link",
                    format!("no security release note found for {os} {version}"),
                )
            })?;

        let page_html = self.fetcher.fetch_text(&link).await?;
        let mut fixes = extract_fix_lines(&page_html)?;
        if fixes.is_empty() {
            fixes.push(NOT_PUBLISHED.to_string());
        }

        Ok(SecurityDetail {
            os: os.to_string(),
            fixes,
            link: Some(link),
        })
    }
}
