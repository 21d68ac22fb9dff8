// Listing extraction and "next page" detection for one loaded page

use crate::normalize::{SENTINEL, collapse_whitespace, normalize};
use crate::result::ListingRecord;
use crate::selectors::CompiledProfile;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Raw field values of one listing item, in column order.
pub type RawFields = [String; 7];

/// What the pagination area of a page offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextControl {
    Absent,
    Hidden,
    Disabled,
    MissingTarget,
    Target(Url),
}

#[derive(Debug, Clone)]
pub struct RecordExtractor {
    profile: Arc<CompiledProfile>,
}

impl RecordExtractor {
    pub fn new(profile: Arc<CompiledProfile>) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &CompiledProfile {
        &self.profile
    }

    /// True if the primary listing marker is present.
    pub fn has_marker(&self, document: &Html) -> bool {
        document.select(&self.profile.listing_marker).next().is_some()
    }

    /// One tuple per listing item, in document order. A selector miss yields the
    /// sentinel for that field only.
    pub fn extract_raw(&self, document: &Html) -> Vec<RawFields> {
        let p = &self.profile;
        document
            .select(&p.listing_item)
            .map(|item| {
                [
                    first_text(item, &p.title),
                    first_text(item, &p.schedule),
                    first_text(item, &p.description),
                    joined_text(item, &p.location),
                    first_text(item, &p.phone),
                    first_text(item, &p.email),
                    first_attr(item, &p.website, &p.website_attr),
                ]
            })
            .collect()
    }

    /// Extract and normalize every listing on the page.
    pub fn extract(&self, document: &Html) -> Vec<ListingRecord> {
        let records: Vec<ListingRecord> = self
            .extract_raw(document)
            .into_iter()
            .map(ListingRecord::from_fields)
            .collect();
        debug!("Extracted {} listings", records.len());
        records
    }

    /// Locate the first visible next-page control and resolve its target.
    pub fn find_next(&self, document: &Html, current: &Url) -> NextControl {
        let mut saw_hidden = false;

        for control in document.select(&self.profile.next_control) {
            if is_hidden(control) {
                saw_hidden = true;
                continue;
            }
            if is_disabled(control) {
                return NextControl::Disabled;
            }
            return match control.value().attr("href").and_then(|href| resolve_href(current, href)) {
                Some(target) => NextControl::Target(target),
                None => NextControl::MissingTarget,
            };
        }

        if saw_hidden {
            NextControl::Hidden
        } else {
            NextControl::Absent
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize(collapse_whitespace(&element.text().collect::<String>()))
}

fn first_text(item: ElementRef<'_>, selector: &Selector) -> String {
    item.select(selector)
        .next()
        .map(element_text)
        .unwrap_or_else(|| SENTINEL.to_string())
}

fn joined_text(item: ElementRef<'_>, selector: &Selector) -> String {
    let fragments: Vec<String> = item
        .select(selector)
        .map(element_text)
        .filter(|fragment| !fragment.is_empty())
        .collect();

    if fragments.is_empty() {
        SENTINEL.to_string()
    } else {
        fragments.join(", ")
    }
}

fn first_attr(item: ElementRef<'_>, selector: &Selector, attr: &str) -> String {
    item.select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(normalize)
        .unwrap_or_else(|| SENTINEL.to_string())
}

/// The control and its ancestors up to the pagination list.
fn control_chain(control: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    let mut reached_list = false;
    std::iter::once(control)
        .chain(control.ancestors().filter_map(ElementRef::wrap))
        .take_while(move |element| {
            if reached_list {
                return false;
            }
            reached_list = has_class(*element, "pagination");
            true
        })
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn is_hidden(control: ElementRef<'_>) -> bool {
    control_chain(control).any(|element| {
        let value = element.value();
        has_class(element, "d-none")
            || value.attr("hidden").is_some()
            || value.attr("aria-hidden") == Some("true")
            || value
                .attr("style")
                .map(|style| style.replace(' ', "").to_lowercase().contains("display:none"))
                .unwrap_or(false)
    })
}

fn is_disabled(control: ElementRef<'_>) -> bool {
    control_chain(control).any(|element| {
        let value = element.value();
        has_class(element, "disabled")
            || value.attr("disabled").is_some()
            || value.attr("aria-disabled") == Some("true")
    })
}

/// Resolve an href against the page it was found on. Non-navigable hrefs yield None.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}
