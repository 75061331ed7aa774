//! Facet names and the query parameters built from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Solr field names the API facets media on.
pub mod media_facets {
    pub const MEDIA_TYPE: &str = "human_readable_media_type_ssim";
    pub const PUBLICATION: &str = "publication_status_ssi";
    pub const TAG: &str = "keyword_ssim";
    pub const OBJECT_TYPE: &str = "media_physical_object_type_ssim";
}

/// Solr field names the API facets physical objects on.
pub mod object_facets {
    pub const OBJECT_TYPE: &str = "human_readable_type_sim";
    pub const TAXONOMY_GBIF: &str = "external_taxonomy_ssim";
    pub const MEDIA_TYPE: &str = "public_media_type_ssim";
    pub const MEDIA_TAG: &str = "public_media_keyword_ssim";
}

/// How a facet name becomes a query parameter name.
///
/// The API has used both conventions over time; a client picks one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetStyle {
    /// `f[<facet>][]`
    #[default]
    Bracket,
    /// `f.<facet>`
    Dot,
}

impl FacetStyle {
    pub fn param_name(&self, facet: &str) -> String {
        match self {
            FacetStyle::Bracket => format!("f[{}][]", facet),
            FacetStyle::Dot => format!("f.{}", facet),
        }
    }
}

/// Facet filters for one search request.
///
/// Keys are already-formatted parameter names. Empty values are never stored,
/// and iteration is sorted by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetParams {
    style: FacetStyle,
    params: BTreeMap<String, String>,
}

impl FacetParams {
    pub fn new(style: FacetStyle) -> Self {
        Self {
            style,
            params: BTreeMap::new(),
        }
    }

    /// Add a filter on `facet` if `value` is present and non-empty.
    pub fn insert(&mut self, facet: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.params
                .insert(self.style.param_name(facet), value.to_string());
        }
        self
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, facet: &str, value: Option<&str>) -> Self {
        self.insert(facet, value);
        self
    }

    pub fn style(&self) -> FacetStyle {
        self.style
    }

    pub fn get(&self, param: &str) -> Option<&str> {
        self.params.get(param).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
