use crate::normalize::or_sentinel;
use serde::{Deserialize, Serialize};

/// Fixed output column order.
pub const COLUMNS: [&str; 7] = [
    "Title",
    "Schedule",
    "Description",
    "Location",
    "Phone",
    "Email",
    "Website",
];

/// One directory listing. Every field holds either extracted text or [`SENTINEL`](crate::SENTINEL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Schedule")]
    pub schedule: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Website")]
    pub website: String,
}

impl ListingRecord {
    /// Build a record from raw field values in column order, normalizing each one.
    /// Values that normalize to nothing become the sentinel.
    pub fn from_fields(fields: [String; 7]) -> Self {
        let [title, schedule, description, location, phone, email, website] =
            fields.map(|value| or_sentinel(Some(value)));

        Self {
            title,
            schedule,
            description,
            location,
            phone,
            email,
            website,
        }
    }

    /// A record with every field set to the sentinel.
    pub fn empty() -> Self {
        Self::from_fields(Default::default())
    }

    /// Field values in [`COLUMNS`] order.
    pub fn to_row(&self) -> [&str; 7] {
        [
            &self.title,
            &self.schedule,
            &self.description,
            &self.location,
            &self.phone,
            &self.email,
            &self.website,
        ]
    }
}

/// Records scraped from exactly one leaf category, in page order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub category: String,
    pub source_url: String,
    pub pages_visited: usize,
    pub records: Vec<ListingRecord>,
}

impl CrawlResult {
    pub fn new(category: String, source_url: String) -> Self {
        Self {
            category,
            source_url,
            pages_visited: 0,
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
