//! Search request and response models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One candidate value of a facet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetItem {
    #[serde(default)]
    pub value: Value,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub hits: Option<u64>,
}

/// A server-defined facet and its candidate values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub items: Vec<FacetItem>,
}

/// Pagination block of a search page
///
/// Every field is optional on the wire; a missing `total_pages` reads as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub current_page: Option<u32>,

    #[serde(default)]
    pub next_page: Option<u32>,

    #[serde(default)]
    pub prev_page: Option<u32>,

    #[serde(default)]
    pub total_pages: u32,

    #[serde(default)]
    pub limit_value: Option<u32>,

    #[serde(default)]
    pub offset_value: Option<u64>,

    #[serde(default)]
    pub total_count: Option<u64>,

    #[serde(default, rename = "first_page?")]
    pub first_page: Option<bool>,

    #[serde(default, rename = "last_page?")]
    pub last_page: Option<bool>,
}

/// Items from one or more pages with the facets and pagination of the last page fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults<T> {
    pub items: Vec<T>,
    pub facets: Vec<Facet>,
    pub pages: Pagination,
}

impl<T> SearchResults<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total matches reported by the server, if it said
    pub fn total_count(&self) -> Option<u64> {
        self.pages.total_count
    }
}

/// Media search parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaSearch {
    /// Free-text query, searched across all fields
    pub query: Option<String>,

    /// e.g. "Mesh", "CT Image Series"
    pub media_type: Option<String>,

    /// Publication status, see [`DownloadVisibility`](crate::models::DownloadVisibility)
    pub visibility: Option<String>,

    pub media_tag: Option<String>,

    /// Type of the physical object the media depicts
    pub object_type: Option<String>,

    pub per_page: Option<u32>,

    /// Fetch only this page instead of every page
    pub page: Option<u32>,
}

impl MediaSearch {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = Some(visibility.into());
        self
    }

    pub fn media_tag(mut self, tag: impl Into<String>) -> Self {
        self.media_tag = Some(tag.into());
        self
    }

    pub fn object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Physical object search parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSearch {
    pub query: Option<String>,

    /// "Biological Specimen" or "Cultural Heritage Object"
    pub object_type: Option<String>,

    /// GBIF taxonomy term
    pub taxonomy: Option<String>,

    pub media_type: Option<String>,

    pub media_tag: Option<String>,

    pub per_page: Option<u32>,

    pub page: Option<u32>,
}

impl ObjectSearch {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn taxonomy(mut self, taxonomy: impl Into<String>) -> Self {
        self.taxonomy = Some(taxonomy.into());
        self
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn media_tag(mut self, tag: impl Into<String>) -> Self {
        self.media_tag = Some(tag.into());
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}
