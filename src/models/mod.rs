//! Core data models for MorphoSource records and search operations.

mod download;
mod facets;
mod record;
mod search;

pub use download::{
    DownloadConfig, DownloadRequestBody, DEFAULT_USE_CATEGORY, DEFAULT_USE_STATEMENT,
};
pub use facets::{media_facets, object_facets, FacetParams, FacetStyle};
pub use record::{
    scalar_field, DownloadVisibility, Media, ObjectRecord, PhysicalObject, RawRecord,
    BIOLOGICAL_SPECIMEN_KEY, BIOLOGICAL_SPECIMEN_TYPE, CULTURAL_HERITAGE_OBJECT_KEY,
    CULTURAL_HERITAGE_OBJECT_TYPE,
};
pub use search::{Facet, FacetItem, MediaSearch, ObjectSearch, Pagination, SearchResults};
