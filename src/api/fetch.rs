//! Fetches single records and one or many pages of search results.

use serde_json::Value;
use tracing::debug;

use crate::api::ApiError;
use crate::config::DEFAULT_PER_PAGE;
use crate::models::{Facet, FacetParams, Pagination};
use crate::utils::Transport;

const PER_PAGE_PARAM: &str = "per_page";
const PAGE_PARAM: &str = "page";
const QUERY_PARAM: &str = "q";
const SEARCH_FIELD_PARAM: &str = "search_field";
const SEARCH_ALL_FIELDS_VALUE: &str = "all_fields";

const RESPONSE_KEY: &str = "response";
const FACETS_KEY: &str = "facets";
const PAGES_KEY: &str = "pages";

/// Raw items plus the facets and pagination that came with the last page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub items: Vec<Value>,
    pub facets: Vec<Facet>,
    pub pages: Pagination,
}

/// Fetch search results from a paginated endpoint.
///
/// With `page` set, exactly that page is fetched. Without it every page is
/// fetched in order, starting at 1, until a page reports `total_pages` not
/// greater than its own number. Items are concatenated in page order; facets
/// and pagination are those of the last page. Any failed page fails the call.
/// A `page` or `per_page` of 0 is rejected before any request is sent.
pub async fn fetch_items(
    transport: &dyn Transport,
    url: &str,
    query: Option<&str>,
    facets: &FacetParams,
    per_page: Option<u32>,
    page: Option<u32>,
    items_key: &str,
) -> Result<FetchedPage, ApiError> {
    if page == Some(0) {
        return Err(ApiError::InvalidConfig("page must be at least 1".to_string()));
    }
    if per_page == Some(0) {
        return Err(ApiError::InvalidConfig(
            "per_page must be at least 1".to_string(),
        ));
    }

    let params = search_params(query, facets);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);

    match page {
        Some(page) => fetch_one_page(transport, url, &params, per_page, page, items_key).await,
        None => fetch_all_pages(transport, url, &params, per_page, items_key).await,
    }
}

/// Fetch one resource and strip the `response` envelope.
pub async fn fetch_item(transport: &dyn Transport, url: &str) -> Result<Value, ApiError> {
    debug!(url, "Fetching record");
    let body = transport.get_json(url, &[]).await?;
    unwrap_response(body)
}

fn search_params(query: Option<&str>, facets: &FacetParams) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = facets
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        params.push((
            SEARCH_FIELD_PARAM.to_string(),
            SEARCH_ALL_FIELDS_VALUE.to_string(),
        ));
        params.push((QUERY_PARAM.to_string(), query.to_string()));
    }

    params
}

async fn fetch_all_pages(
    transport: &dyn Transport,
    url: &str,
    params: &[(String, String)],
    per_page: u32,
    items_key: &str,
) -> Result<FetchedPage, ApiError> {
    let mut page = 1;
    let mut items = Vec::new();

    loop {
        let fetched = fetch_one_page(transport, url, params, per_page, page, items_key).await?;
        items.extend(fetched.items);

        if fetched.pages.total_pages <= page {
            return Ok(FetchedPage {
                items,
                facets: fetched.facets,
                pages: fetched.pages,
            });
        }
        page += 1;
    }
}

async fn fetch_one_page(
    transport: &dyn Transport,
    url: &str,
    params: &[(String, String)],
    per_page: u32,
    page: u32,
    items_key: &str,
) -> Result<FetchedPage, ApiError> {
    let mut request_params = params.to_vec();
    request_params.push((PER_PAGE_PARAM.to_string(), per_page.to_string()));
    request_params.push((PAGE_PARAM.to_string(), page.to_string()));

    debug!(url, page, per_page, "Fetching page");
    let body = transport.get_json(url, &request_params).await?;
    parse_page(unwrap_response(body)?, items_key)
}

fn unwrap_response(mut body: Value) -> Result<Value, ApiError> {
    match body.get_mut(RESPONSE_KEY) {
        Some(response) => Ok(response.take()),
        None => Err(ApiError::Parse(format!(
            "Missing '{}' envelope in API response",
            RESPONSE_KEY
        ))),
    }
}

fn parse_page(mut response: Value, items_key: &str) -> Result<FetchedPage, ApiError> {
    let items = match response.get_mut(items_key).map(Value::take) {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ApiError::Parse(format!(
                "Expected '{}' to be a list, got {}",
                items_key, other
            )))
        }
        None => {
            return Err(ApiError::Parse(format!(
                "Missing '{}' in search response",
                items_key
            )))
        }
    };

    let facets = match response.get_mut(FACETS_KEY).map(Value::take) {
        None | Some(Value::Null) => Vec::new(),
        Some(facets) => serde_json::from_value(facets)?,
    };

    let pages = match response.get_mut(PAGES_KEY).map(Value::take) {
        None | Some(Value::Null) => Pagination::default(),
        Some(pages) => serde_json::from_value(pages)?,
    };

    Ok(FetchedPage {
        items,
        facets,
        pages,
    })
}
