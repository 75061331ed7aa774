//! Typed MorphoSource operations.

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tracing::instrument;

use crate::api::download;
use crate::api::fetch::{fetch_item, fetch_items, FetchedPage};
use crate::api::ApiError;
use crate::config::Config;
use crate::models::{
    media_facets, object_facets, DownloadConfig, FacetParams, Media, MediaSearch, ObjectSearch,
    PhysicalObject, SearchResults, BIOLOGICAL_SPECIMEN_TYPE, CULTURAL_HERITAGE_OBJECT_TYPE,
};
use crate::utils::{HttpClient, Transport};

const MEDIA_PATH: &str = "media";
const PHYSICAL_OBJECTS_PATH: &str = "physical-objects";
const MEDIA_ITEMS_KEY: &str = "media";
const PHYSICAL_OBJECTS_ITEMS_KEY: &str = "physical_objects";

/// MorphoSource API client
///
/// Cheap to clone; clones share one transport. The client keeps no state
/// between calls.
#[derive(Debug, Clone)]
pub struct MorphoSource {
    transport: Arc<dyn Transport>,
    config: Config,
}

impl MorphoSource {
    /// Create a client from the environment and defaults
    pub fn new() -> Result<Self, ApiError> {
        Self::with_config(Config::default())
    }

    /// Create a client over HTTP with the given configuration
    pub fn with_config(config: Config) -> Result<Self, ApiError> {
        config.validate()?;
        let client = HttpClient::from_config(&config)?;
        Ok(Self {
            transport: Arc::new(client),
            config,
        })
    }

    /// Create with a custom transport (for testing)
    pub fn with_transport(transport: Arc<dyn Transport>, config: Config) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn media_endpoint(&self) -> String {
        format!("{}/{}", self.config.base_url(), MEDIA_PATH)
    }

    pub fn physical_objects_endpoint(&self) -> String {
        format!("{}/{}", self.config.base_url(), PHYSICAL_OBJECTS_PATH)
    }

    /// Search media. Without `search.page`, every page is fetched.
    pub async fn search_media(
        &self,
        search: &MediaSearch,
    ) -> Result<SearchResults<Media>, ApiError> {
        let facets = FacetParams::new(self.config.facet_style)
            .with(media_facets::MEDIA_TYPE, search.media_type.as_deref())
            .with(media_facets::PUBLICATION, search.visibility.as_deref())
            .with(media_facets::TAG, search.media_tag.as_deref())
            .with(media_facets::OBJECT_TYPE, search.object_type.as_deref());

        let page = fetch_items(
            self.transport.as_ref(),
            &self.media_endpoint(),
            search.query.as_deref(),
            &facets,
            Some(search.per_page.unwrap_or(self.config.default_per_page)),
            search.page,
            MEDIA_ITEMS_KEY,
        )
        .await?;

        into_results(page, Media::try_from)
    }

    /// Fetch one media record
    pub async fn get_media(&self, media_id: &str) -> Result<Media, ApiError> {
        let url = format!("{}/{}", self.media_endpoint(), urlencoding::encode(media_id));
        let mut response = fetch_item(self.transport.as_ref(), &url)
            .await
            .map_err(|err| {
                not_found_as(err, || format!("No media found with id {}", media_id))
            })?;

        let media = response
            .get_mut(MEDIA_ITEMS_KEY)
            .map(Value::take)
            .ok_or_else(|| ApiError::Parse("Missing 'media' in media response".to_string()))?;
        Media::try_from(media)
    }

    /// Search physical objects. Without `search.page`, every page is fetched.
    pub async fn search_objects(
        &self,
        search: &ObjectSearch,
    ) -> Result<SearchResults<PhysicalObject>, ApiError> {
        let facets = FacetParams::new(self.config.facet_style)
            .with(object_facets::OBJECT_TYPE, search.object_type.as_deref())
            .with(object_facets::TAXONOMY_GBIF, search.taxonomy.as_deref())
            .with(object_facets::MEDIA_TYPE, search.media_type.as_deref())
            .with(object_facets::MEDIA_TAG, search.media_tag.as_deref());

        let page = fetch_items(
            self.transport.as_ref(),
            &self.physical_objects_endpoint(),
            search.query.as_deref(),
            &facets,
            Some(search.per_page.unwrap_or(self.config.default_per_page)),
            search.page,
            PHYSICAL_OBJECTS_ITEMS_KEY,
        )
        .await?;

        into_results(page, PhysicalObject::try_from)
    }

    /// Search physical objects restricted to biological specimens
    pub async fn search_biological_specimens(
        &self,
        search: ObjectSearch,
    ) -> Result<SearchResults<PhysicalObject>, ApiError> {
        self.search_objects(&search.object_type(BIOLOGICAL_SPECIMEN_TYPE))
            .await
    }

    /// Search physical objects restricted to cultural heritage objects
    pub async fn search_cultural_heritage_objects(
        &self,
        search: ObjectSearch,
    ) -> Result<SearchResults<PhysicalObject>, ApiError> {
        let mut search = search.object_type(CULTURAL_HERITAGE_OBJECT_TYPE);
        search.taxonomy = None;
        self.search_objects(&search).await
    }

    /// Fetch one physical object
    pub async fn get_object(&self, object_id: &str) -> Result<PhysicalObject, ApiError> {
        let url = format!(
            "{}/{}",
            self.physical_objects_endpoint(),
            urlencoding::encode(object_id)
        );
        let response = fetch_item(self.transport.as_ref(), &url)
            .await
            .map_err(|err| {
                not_found_as(err, || {
                    format!("No physical object found with id {}", object_id)
                })
            })?;

        PhysicalObject::from_envelope(response)
    }

    /// Media depicting the physical object `object_id`.
    ///
    /// Searches media for the id and keeps only records whose
    /// `physical_object_id` matches; with `open_only`, only open downloads.
    pub async fn media_for_object(
        &self,
        object_id: &str,
        open_only: bool,
    ) -> Result<Vec<Media>, ApiError> {
        let results = self.search_media(&MediaSearch::new(object_id)).await?;

        Ok(results
            .items
            .into_iter()
            .filter(|media| media.belongs_to(object_id))
            .filter(|media| !open_only || media.is_open_download())
            .collect())
    }

    /// Exchange `media_id` and the attestation in `config` for a signed URL
    pub async fn download_url(
        &self,
        media_id: &str,
        config: &DownloadConfig,
    ) -> Result<String, ApiError> {
        download::get_download_url(
            self.transport.as_ref(),
            self.config.base_url(),
            media_id,
            config,
        )
        .await
    }

    /// Download the bundle of `media_id` into a file at `path`
    #[instrument(skip(self, path, config), fields(path = %path.display()))]
    pub async fn download_media_bundle(
        &self,
        media_id: &str,
        path: &Path,
        config: &DownloadConfig,
    ) -> Result<u64, ApiError> {
        download::download_media_bundle(
            self.transport.as_ref(),
            self.config.base_url(),
            media_id,
            path,
            config,
        )
        .await
    }

    /// Download the bundle of `media_id` into any async sink
    pub async fn download_media_bundle_to<W>(
        &self,
        media_id: &str,
        sink: &mut W,
        config: &DownloadConfig,
    ) -> Result<u64, ApiError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        download::download_media_bundle_to(
            self.transport.as_ref(),
            self.config.base_url(),
            media_id,
            sink,
            config,
        )
        .await
    }

    /// Download the bundle of an already-fetched media record
    pub async fn download_media(
        &self,
        media: &Media,
        path: &Path,
        config: &DownloadConfig,
    ) -> Result<u64, ApiError> {
        let media_id = media
            .id
            .as_deref()
            .ok_or_else(|| ApiError::InvalidConfig("Media record has no id".to_string()))?;
        self.download_media_bundle(media_id, path, config).await
    }

    /// Default research attestation using the configured API key
    pub fn default_download_config(&self) -> Result<DownloadConfig, ApiError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ApiError::InvalidConfig(format!(
                "No API key configured; set {}",
                crate::config::API_KEY_ENV
            ))
        })?;
        DownloadConfig::research(api_key)
    }
}

fn not_found_as(err: ApiError, message: impl FnOnce() -> String) -> ApiError {
    if err.is_http_not_found() {
        ApiError::NotFound(message())
    } else {
        err
    }
}

fn into_results<T>(
    page: FetchedPage,
    convert: impl Fn(Value) -> Result<T, ApiError>,
) -> Result<SearchResults<T>, ApiError> {
    let items = page
        .items
        .into_iter()
        .map(convert)
        .collect::<Result<Vec<T>, ApiError>>()?;

    Ok(SearchResults {
        items,
        facets: page.facets,
        pages: page.pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DownloadVisibility, FacetStyle};
    use crate::utils::{MockTransport, RecordedRequest};
    use serde_json::json;

    fn ms_media() -> Value {
        json!([
            {
                "id": ["000390223"],
                "title": ["Dentary Teeth [Mesh] [CT]"],
                "media_type": ["Mesh"],
                "visibility": ["Open Download"]
            },
            {"id": ["000390218"], "title": ["Maxillary Teeth [Mesh] [CT]"], "media_type": ["Mesh"]}
        ])
    }

    fn ms_pages() -> Value {
        json!({
            "current_page": 1,
            "next_page": null,
            "prev_page": null,
            "total_pages": 1,
            "limit_value": 10,
            "offset_value": 0,
            "total_count": 2,
            "first_page?": true,
            "last_page?": true
        })
    }

    fn client(transport: &Arc<MockTransport>) -> MorphoSource {
        let config = Config::default().api_url("http://api");
        MorphoSource::with_transport(transport.clone(), config)
    }

    #[tokio::test]
    async fn test_search_media() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "response": {
                "media": ms_media(),
                "facets": [{"name": "generic_type_sim", "items": [], "label": "Generic Type Sim"}],
                "pages": ms_pages()
            }
        }));

        let results = client(&transport)
            .search_media(&MediaSearch::new("Fruitadens"))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        let first = &results.items[0];
        assert_eq!(first.id.as_deref(), Some("000390223"));
        assert_eq!(first.title.as_deref(), Some("Dentary Teeth [Mesh] [CT]"));
        assert_eq!(first.media_type.as_deref(), Some("Mesh"));
        assert_eq!(first.visibility.as_deref(), Some(DownloadVisibility::OPEN));
        assert_eq!(Value::Object(first.data.clone()), ms_media()[0]);
        assert_eq!(results.items[1].id.as_deref(), Some("000390218"));
        assert_eq!(results.facets.len(), 1);
        assert_eq!(results.total_count(), Some(2));
        assert_eq!(results.pages.last_page, Some(true));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url(), "http://api/media");
        assert_eq!(
            requests[0],
            RecordedRequest::Get {
                url: "http://api/media".to_string(),
                params: vec![
                    ("search_field".to_string(), "all_fields".to_string()),
                    ("q".to_string(), "Fruitadens".to_string()),
                    ("per_page".to_string(), "10".to_string()),
                    ("page".to_string(), "1".to_string()),
                ],
            }
        );
    }

    #[tokio::test]
    async fn test_search_media_advanced() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "response": {"media": ms_media(), "facets": [], "pages": {"total_pages": 9}}
        }));

        let search = MediaSearch::new("Fruitadens")
            .media_type("Mesh")
            .visibility(DownloadVisibility::OPEN)
            .media_tag("pelvis")
            .per_page(8)
            .page(2);
        client(&transport).search_media(&search).await.unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.param("f[human_readable_media_type_ssim][]"), Some("Mesh"));
        assert_eq!(request.param("f[publication_status_ssi][]"), Some("Open Download"));
        assert_eq!(request.param("f[keyword_ssim][]"), Some("pelvis"));
        assert_eq!(request.param("f[media_physical_object_type_ssim][]"), None);
        assert_eq!(request.param("per_page"), Some("8"));
        assert_eq!(request.param("page"), Some("2"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_dot_facet_style() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({"response": {"physical_objects": [], "pages": {}}}));

        let config = Config::default()
            .api_url("http://api")
            .facet_style(FacetStyle::Dot);
        let client = MorphoSource::with_transport(transport.clone(), config);
        client
            .search_objects(&ObjectSearch::default().taxonomy("Aves"))
            .await
            .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.url(), "http://api/physical-objects");
        assert_eq!(request.param("f.external_taxonomy_ssim"), Some("Aves"));
        assert_eq!(request.param("f[external_taxonomy_ssim][]"), None);
        assert_eq!(request.param("q"), None);
    }

    #[tokio::test]
    async fn test_get_media() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({"response": {"media": ms_media()[0]}}));

        let media = client(&transport).get_media("123").await.unwrap();

        assert_eq!(media.id.as_deref(), Some("000390223"));
        assert_eq!(media.visibility.as_deref(), Some("Open Download"));
        assert_eq!(transport.requests()[0].url(), "http://api/media/123");
    }

    #[tokio::test]
    async fn test_get_media_not_found() {
        let transport = Arc::new(MockTransport::new());
        transport.push_status(404);

        let err = client(&transport).get_media("123").await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.to_string(), "No media found with id 123");
    }

    #[tokio::test]
    async fn test_get_media_server_error_passes_through() {
        let transport = Arc::new(MockTransport::new());
        transport.push_status(500);

        let err = client(&transport).get_media("123").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_search_404_is_transport_error() {
        let transport = Arc::new(MockTransport::new());
        transport.push_status(404);
        transport.push_status(404);
        let client = client(&transport);

        let err = client
            .search_media(&MediaSearch::new("Fruitadens"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(!matches!(err, ApiError::NotFound(_)));

        let err = client
            .search_objects(&ObjectSearch::new("Fruitadens"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(!matches!(err, ApiError::NotFound(_)));

        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_get_object() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "response": {
                "biological_specimen": {
                    "id": ["000S27385"],
                    "title": ["Fruitadens haagarorum"],
                    "taxonomy": ["Fruitadens"]
                }
            }
        }));

        let object = client(&transport).get_object("000S27385").await.unwrap();

        assert!(matches!(object, PhysicalObject::BiologicalSpecimen { .. }));
        assert_eq!(object.taxonomy(), Some("Fruitadens"));
        assert_eq!(
            transport.requests()[0].url(),
            "http://api/physical-objects/000S27385"
        );
    }

    #[tokio::test]
    async fn test_get_object_not_found() {
        let transport = Arc::new(MockTransport::new());
        transport.push_status(404);

        let err = client(&transport).get_object("42").await.unwrap_err();
        assert_eq!(err.to_string(), "No physical object found with id 42");
    }

    #[tokio::test]
    async fn test_search_cultural_heritage_objects() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "response": {
                "physical_objects": [{"id": ["1"], "human_readable_type": ["Cultural Heritage Object"]}],
                "pages": {"total_pages": 1}
            }
        }));

        let results = client(&transport)
            .search_cultural_heritage_objects(ObjectSearch::new("bowl").taxonomy("ignored"))
            .await
            .unwrap();

        assert!(matches!(
            results.items[0],
            PhysicalObject::CulturalHeritageObject { .. }
        ));
        let request = &transport.requests()[0];
        assert_eq!(
            request.param("f[human_readable_type_sim][]"),
            Some("Cultural Heritage Object")
        );
        assert_eq!(request.param("f[external_taxonomy_ssim][]"), None);
    }

    #[tokio::test]
    async fn test_media_for_object_filters_by_object_id() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "response": {
                "media": [
                    {"id": ["m1"], "physical_object_id": ["obj"], "visibility": ["Open Download"]},
                    {"id": ["m2"], "physical_object_id": ["other"], "visibility": ["Open Download"]},
                    {"id": ["m3"], "physical_object_id": ["obj"], "visibility": ["Restricted Download"]}
                ],
                "pages": {"total_pages": 1}
            }
        }));
        transport.push_json(json!({
            "response": {
                "media": [
                    {"id": ["m1"], "physical_object_id": ["obj"], "visibility": ["Open Download"]},
                    {"id": ["m3"], "physical_object_id": ["obj"], "visibility": ["Restricted Download"]}
                ],
                "pages": {"total_pages": 1}
            }
        }));

        let client = client(&transport);
        let all = client.media_for_object("obj", false).await.unwrap();
        let ids: Vec<_> = all.iter().filter_map(|m| m.id.as_deref()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);

        let open = client.media_for_object("obj", true).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id.as_deref(), Some("m1"));

        assert_eq!(transport.requests()[0].param("q"), Some("obj"));
    }

    #[tokio::test]
    async fn test_download_media_bundle_to_sink() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({"response": {"media": {"download_url": ["http://files/b.zip"]}}}));
        transport.push_stream(vec![b"zip".to_vec(), b"bytes".to_vec()]);

        let config = DownloadConfig::research("Secret").unwrap();
        let mut sink: Vec<u8> = Vec::new();
        let bytes = client(&transport)
            .download_media_bundle_to("000390223", &mut sink, &config)
            .await
            .unwrap();

        assert_eq!(bytes, 8);
        assert_eq!(sink, b"zipbytes");
        let requests = transport.requests();
        assert_eq!(requests[0].url(), "http://api/download/000390223");
        assert_eq!(
            requests[1],
            RecordedRequest::Stream {
                url: "http://files/b.zip".to_string(),
                authorization: "Secret".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_download_media_without_id() {
        let transport = Arc::new(MockTransport::new());
        let media = Media::try_from(json!({"title": ["No id"]})).unwrap();
        let config = DownloadConfig::research("Secret").unwrap();

        let err = client(&transport)
            .download_media(&media, Path::new("/tmp/unused.zip"), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidConfig(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_default_download_config_requires_key() {
        let transport = Arc::new(MockTransport::new());
        let mut config = Config::default();
        config.api_key = None;
        let client = MorphoSource::with_transport(transport.clone(), config.clone());
        assert!(client.default_download_config().is_err());

        let client = MorphoSource::with_transport(transport, config.api_key("Secret"));
        assert_eq!(client.default_download_config().unwrap().api_key(), "Secret");
    }
}
