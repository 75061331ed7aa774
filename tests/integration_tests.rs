//! Integration tests for the MorphoSource client
//!
//! These tests drive the real HTTP transport against a local mock server and
//! check what goes over the wire.

use mockito::{Matcher, Server, ServerGuard};
use morphosource::models::{FacetStyle, PhysicalObject};
use morphosource::{ApiError, Config, DownloadConfig, MediaSearch, MorphoSource, ObjectSearch};
use serde_json::{json, Value};

fn client_for(server: &ServerGuard) -> MorphoSource {
    let config = Config::default()
        .api_url(format!("{}/api", server.url()))
        .api_key("Secret");
    MorphoSource::with_config(config).unwrap()
}

fn json_body(value: Value) -> String {
    value.to_string()
}

#[tokio::test]
async fn test_search_media_sends_query_parameters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/media")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("f[human_readable_media_type_ssim][]".into(), "Mesh".into()),
            Matcher::UrlEncoded("search_field".into(), "all_fields".into()),
            Matcher::UrlEncoded("q".into(), "Fruitadens".into()),
            Matcher::UrlEncoded("per_page".into(), "10".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "response": {
                "media": [
                    {"id": ["000390223"], "title": ["Dentary Teeth [Mesh] [CT]"], "media_type": ["Mesh"]},
                    {"id": ["000390218"], "title": ["Maxillary Teeth [Mesh] [CT]"], "media_type": ["Mesh"]}
                ],
                "facets": [{"name": "generic_type_sim", "label": "Generic Type Sim", "items": []}],
                "pages": {"current_page": 1, "total_pages": 1, "total_count": 2}
            }
        })))
        .create_async()
        .await;

    let results = client_for(&server)
        .search_media(&MediaSearch::new("Fruitadens").media_type("Mesh"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results.items[0].id.as_deref(), Some("000390223"));
    assert_eq!(results.facets[0].name, "generic_type_sim");
    assert_eq!(results.total_count(), Some(2));
}

#[tokio::test]
async fn test_search_objects_dot_facets() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/physical-objects")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("f.external_taxonomy_ssim".into(), "Aves".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "response": {
                "physical_objects": [
                    {"id": ["000S1"], "object_type": ["Biological Specimen"], "taxonomy": ["Aves"]}
                ],
                "pages": {"total_pages": 1}
            }
        })))
        .create_async()
        .await;

    let config = Config::default()
        .api_url(format!("{}/api", server.url()))
        .facet_style(FacetStyle::Dot);
    let client = MorphoSource::with_config(config).unwrap();
    let results = client
        .search_objects(&ObjectSearch::default().taxonomy("Aves"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(matches!(
        results.items[0],
        PhysicalObject::BiologicalSpecimen { .. }
    ));
    assert_eq!(results.items[0].taxonomy(), Some("Aves"));
}

#[tokio::test]
async fn test_search_aggregates_all_pages() {
    let mut server = Server::new_async().await;
    let page1 = server
        .mock("GET", "/api/media")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "response": {
                "media": [{"id": ["a"]}, {"id": ["b"]}],
                "facets": [{"name": "first"}],
                "pages": {"current_page": 1, "total_pages": 2}
            }
        })))
        .create_async()
        .await;
    let page2 = server
        .mock("GET", "/api/media")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "response": {
                "media": [{"id": ["c"]}],
                "facets": [{"name": "second"}],
                "pages": {"current_page": 2, "total_pages": 2}
            }
        })))
        .create_async()
        .await;

    let results = client_for(&server)
        .search_media(&MediaSearch::new("salamander"))
        .await
        .unwrap();

    page1.assert_async().await;
    page2.assert_async().await;
    let ids: Vec<_> = results
        .items
        .iter()
        .filter_map(|media| media.id.as_deref())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(results.facets[0].name, "second");
    assert_eq!(results.pages.current_page, Some(2));
}

#[tokio::test]
async fn test_get_media_404_is_not_found() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/media/123")
        .with_status(404)
        .create_async()
        .await;

    let err = client_for(&server).get_media("123").await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.to_string(), "No media found with id 123");
}

#[tokio::test]
async fn test_get_object() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/physical-objects/000S2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "response": {
                "cultural_heritage_object": {"id": ["000S2"], "title": ["Bowl"]}
            }
        })))
        .create_async()
        .await;

    let object = client_for(&server).get_object("000S2").await.unwrap();

    mock.assert_async().await;
    assert!(matches!(object, PhysicalObject::CulturalHeritageObject { .. }));
    assert_eq!(object.title(), Some("Bowl"));
}

#[tokio::test]
async fn test_download_url_exchange() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/download/000390223")
        .match_header("authorization", "Secret")
        .match_body(Matcher::Json(json!({
            "use_statement": "Downloading this data as part of a research project.",
            "agreements_accepted": true,
            "use_categories": ["Research"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "response": {"media": {"download_url": ["https://files.example.org/signed"]}}
        })))
        .create_async()
        .await;

    let config = DownloadConfig::research("Secret").unwrap();
    let url = client_for(&server)
        .download_url("000390223", &config)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(url, "https://files.example.org/signed");
}

#[tokio::test]
async fn test_download_exchange_404_is_restricted() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/download/123")
        .with_status(404)
        .create_async()
        .await;

    let config = DownloadConfig::research("Secret").unwrap();
    let err = client_for(&server)
        .download_url("123", &config)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, ApiError::RestrictedDownload(_)));
    assert!(err.to_string().ends_with("request download permission for media id: 123"));
}

#[tokio::test]
async fn test_download_media_bundle_to_file() {
    let mut server = Server::new_async().await;
    let signed_url = format!("{}/files/bundle.zip", server.url());
    let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

    let exchange = server
        .mock("POST", "/api/download/000390223")
        .match_header("authorization", "Secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "response": {"media": {"download_url": signed_url}}
        })))
        .create_async()
        .await;
    let file = server
        .mock("GET", "/files/bundle.zip")
        .match_header("authorization", "Secret")
        .with_status(200)
        .with_body(payload.clone())
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("000390223.zip");
    let config = DownloadConfig::research("Secret").unwrap();
    let bytes = client_for(&server)
        .download_media_bundle("000390223", &path, &config)
        .await
        .unwrap();

    exchange.assert_async().await;
    file.assert_async().await;
    assert_eq!(bytes, payload.len() as u64);
    assert_eq!(std::fs::read(&path).unwrap(), payload);
}

#[tokio::test]
async fn test_download_stream_error_status() {
    let mut server = Server::new_async().await;
    let signed_url = format!("{}/files/expired.zip", server.url());

    server
        .mock("POST", "/api/download/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "response": {"media": {"download_url": signed_url}}
        })))
        .create_async()
        .await;
    server
        .mock("GET", "/files/expired.zip")
        .with_status(403)
        .create_async()
        .await;

    let config = DownloadConfig::research("Secret").unwrap();
    let mut sink: Vec<u8> = Vec::new();
    let err = client_for(&server)
        .download_media_bundle_to("1", &mut sink, &config)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert!(sink.is_empty());
}
