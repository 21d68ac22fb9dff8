// Site profile: which CSS selectors identify categories, listings and pagination

use crate::error::{Result, ScrapeError};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Selector for each listing field. Location may match several fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSelectors {
    pub title: String,
    pub schedule: String,
    pub description: String,
    pub location: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    /// Attribute read from the website element instead of its text.
    pub website_attr: String,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            title: "h3 a".to_string(),
            schedule: ".clearfix.mt-1.mb-3.font-weight-bold".to_string(),
            description: ".result-hit-body .mb-2".to_string(),
            location: ".comma_split_line".to_string(),
            phone: ".fa-phone + .comma_split_line, .fa-phone + a".to_string(),
            email: ".fa-envelope + a".to_string(),
            website: ".fa-globe + a".to_string(),
            website_attr: "href".to_string(),
        }
    }
}

/// Markup conventions of one directory site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub category_container: String,
    pub category_link: String,
    pub listing_marker: String,
    pub listing_item: String,
    pub next_control: String,
    pub fields: FieldSelectors,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            category_container: "li.category-block, div.category-block".to_string(),
            category_link: "a".to_string(),
            listing_marker: ".result_hit".to_string(),
            listing_item: ".result_hit".to_string(),
            next_control: r#"ol.pagination .page-item .page-link[title="Go to Next Page"]"#
                .to_string(),
            fields: FieldSelectors::default(),
        }
    }
}

impl SiteProfile {
    /// Load a profile from a JSON file. Keys absent from the file keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ScrapeError::ProfileError(e.to_string()))
    }

    /// Parse every selector up front so a typo fails before any request goes out.
    pub fn compile(&self) -> Result<CompiledProfile> {
        let f = &self.fields;
        Ok(CompiledProfile {
            category_container: parse("category_container", &self.category_container)?,
            category_link: parse("category_link", &self.category_link)?,
            listing_marker: parse("listing_marker", &self.listing_marker)?,
            listing_item: parse("listing_item", &self.listing_item)?,
            next_control: parse("next_control", &self.next_control)?,
            title: parse("title", &f.title)?,
            schedule: parse("schedule", &f.schedule)?,
            description: parse("description", &f.description)?,
            location: parse("location", &f.location)?,
            phone: parse("phone", &f.phone)?,
            email: parse("email", &f.email)?,
            website: parse("website", &f.website)?,
            website_attr: f.website_attr.clone(),
        })
    }
}

fn parse(field: &str, selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| ScrapeError::SelectorError {
        field: field.to_string(),
        selector: selector.to_string(),
    })
}

/// A [`SiteProfile`] with every selector parsed.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub category_container: Selector,
    pub category_link: Selector,
    pub listing_marker: Selector,
    pub listing_item: Selector,
    pub next_control: Selector,
    pub title: Selector,
    pub schedule: Selector,
    pub description: Selector,
    pub location: Selector,
    pub phone: Selector,
    pub email: Selector,
    pub website: Selector,
    pub website_attr: String,
}
