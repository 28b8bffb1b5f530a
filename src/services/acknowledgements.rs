//! Acknowledgement extraction.
//!
//! The acknowledgements page groups credited reporters under month
//! headings ("June 2025") each followed by a list of names. Only the
//! first such block is taken; the page lists the most recent month first.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::AckSnapshot;
use crate::utils::normalize_whitespace;

/// Extract the most recent acknowledgement block from the page.
///
/// Returns `None` when no month-heading/list pair is present; an
/// unmatched page is "nothing new", not an error.
pub fn extract_latest(html: &str) -> Result<Option<AckSnapshot>> {
    let document = Html::parse_document(html);
    let heading_sel = parse_selector("h3")?;
    let item_sel = parse_selector("li")?;

    let month_re = Regex::new(r"^[A-Za-z]+ \d{4}$")
        .map_err(|e| AppError::extract("acknowledgements", e))?;

    for heading in document.select(&heading_sel) {
        let month = normalize_whitespace(&heading.text().collect::<String>());
        if !month_re.is_match(&month) {
            continue;
        }

        // The list must immediately follow its month heading.
        let Some(list) = next_element_sibling(heading) else {
            continue;
        };
        if list.value().name() != "ul" {
            continue;
        }

        let names: Vec<String> = list
            .select(&item_sel)
            .map(|item| normalize_whitespace(&item.text().collect::<String>()))
            .filter(|name| !name.is_empty())
            .collect();

        return Ok(Some(AckSnapshot { month, names }));
    }

    Ok(None)
}

fn next_element_sibling(element: ElementRef) -> Option<ElementRef> {
    element.next_siblings().find_map(ElementRef::wrap)
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::extract(s, format!("{e:?}")))
}
