// SPDX-License-Identifier: PMPL-1.0-or-later
//! Integration tests for the content gateway against a mock backend

use content_gateway::{
    models::{ArticleKind, ArticlePatch, ArticleStatus, NewArticle, Profile, Role},
    ArticleFilter, BackendClient, BackendConfig, ContentGateway, GatewayError, ObjectStorage,
    StorageError, StorageFolder, UploadFile,
};
use serde_json::json;
use uuid::Uuid;
use wiremock::{
    matchers::{body_json, header, method, path, path_regex, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn config_for(server: &MockServer) -> BackendConfig {
    BackendConfig {
        url: Some(server.uri()),
        anon_key: Some("anon-key".to_string()),
        ..Default::default()
    }
}

fn article_row(kind: &str, slug: &str, status: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "kind": kind,
        "title": "Launch",
        "slug": slug,
        "content": "<p>Body</p>",
        "cover_image": null,
        "status": status,
        "created_at": "2026-05-01T08:00:00Z",
        "updated_at": "2026-05-01T08:00:00Z"
    })
}

fn profile(role: Role) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        email: "staff@agency.example".to_string(),
        role,
    }
}

#[tokio::test]
async fn test_public_listing_requests_published_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/articles"))
        .and(query_param("kind", "eq.news"))
        .and(query_param("status", "eq.published"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            article_row("news", "launch", "published")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = ContentGateway::new(BackendClient::new(config_for(&server)).unwrap());
    let articles = gateway
        .list_articles(&ArticleFilter::published(ArticleKind::News), None)
        .await
        .unwrap();

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].slug, "launch");
}

#[tokio::test]
async fn test_draft_listing_requires_editor() {
    let server = MockServer::start().await;
    let gateway = ContentGateway::new(BackendClient::new(config_for(&server)).unwrap());

    let filter = ArticleFilter {
        include_drafts: true,
        ..ArticleFilter::published(ArticleKind::Project)
    };
    let result = gateway.list_articles(&filter, None).await;
    assert!(matches!(result, Err(GatewayError::Unauthenticated)));

    let editor = profile(Role::NewsEditor);
    let result = gateway.list_articles(&filter, Some(&editor)).await;
    assert!(matches!(result, Err(GatewayError::Forbidden { .. })));
}

#[tokio::test]
async fn test_draft_hidden_from_anonymous_visitors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/articles"))
        .and(query_param("slug", "eq.coming-soon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            article_row("news", "coming-soon", "draft")
        ])))
        .mount(&server)
        .await;

    let gateway = ContentGateway::new(BackendClient::new(config_for(&server)).unwrap());

    let hidden = gateway
        .get_article_by_slug(ArticleKind::News, "coming-soon", None)
        .await;
    assert!(matches!(hidden, Err(GatewayError::NotFound(_))));

    let editor = profile(Role::NewsEditor);
    let visible = gateway
        .get_article_by_slug(ArticleKind::News, "coming-soon", Some(&editor))
        .await
        .unwrap();
    assert_eq!(visible.status, ArticleStatus::Draft);
}

#[tokio::test]
async fn test_create_article_fills_slug_and_author() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/articles"))
        .and(header("Prefer", "return=representation"))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            article_row("news", "du-an-moi", "draft")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = BackendClient::new(config_for(&server))
        .unwrap()
        .with_access_token("user-jwt");
    let gateway = ContentGateway::new(client);
    let editor = profile(Role::NewsEditor);

    let created = gateway
        .create_article(&editor, NewArticle::new(ArticleKind::News, "Dự án mới", ArticleStatus::Draft))
        .await
        .unwrap();
    assert_eq!(created.slug, "du-an-moi");

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["slug"], "du-an-moi");
    assert_eq!(sent["author_id"], json!(editor.id));
}

#[tokio::test]
async fn test_forbidden_mutation_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = ContentGateway::new(BackendClient::new(config_for(&server)).unwrap());
    let editor = profile(Role::ProjectEditor);

    let result = gateway
        .create_article(&editor, NewArticle::new(ArticleKind::News, "Hello", ArticleStatus::Published))
        .await;
    assert!(matches!(result, Err(GatewayError::Forbidden { .. })));
}

#[tokio::test]
async fn test_backend_error_status_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let gateway = ContentGateway::new(BackendClient::new(config_for(&server)).unwrap());
    match gateway.list_services().await {
        Err(GatewayError::Backend { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upload_returns_public_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/media/cv/[0-9a-f-]{36}\.pdf$"))
        .and(header("content-type", "application/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "media/cv/x.pdf" })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = ObjectStorage::new(BackendClient::new(config_for(&server)).unwrap());
    let file = UploadFile {
        file_name: "Nguyen_CV.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: b"%PDF-1.7".to_vec(),
    };

    let url = storage.upload(&file, StorageFolder::Cv).await.unwrap();
    let prefix = format!("{}/storage/v1/object/public/media/cv/", server.uri());
    assert!(url.starts_with(&prefix), "unexpected url {url}");
    assert!(url.ends_with(".pdf"));
}

#[tokio::test]
async fn test_upload_rejects_oversized_file_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let storage = ObjectStorage::new(BackendClient::new(config_for(&server)).unwrap()).with_max_bytes(4);
    let file = UploadFile {
        file_name: "big.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: vec![0; 5],
    };

    let result = storage.upload(&file, StorageFolder::Cv).await;
    assert!(matches!(result, Err(StorageError::FileTooLarge { size: 5, limit: 4 })));
}

#[tokio::test]
async fn test_delete_foreign_url_is_noop() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let storage = ObjectStorage::new(BackendClient::new(config_for(&server)).unwrap());
    tokio_test::assert_ok!(storage.delete("https://cdn.elsewhere.example/img.png").await);
}

#[tokio::test]
async fn test_delete_own_url_removes_object() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/media"))
        .and(body_json(json!({ "prefixes": ["news/cover.png"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let storage = ObjectStorage::new(BackendClient::new(config_for(&server)).unwrap());
    let url = format!("{}/storage/v1/object/public/media/news/cover.png", server.uri());
    tokio_test::assert_ok!(storage.delete(&url).await);
}

fn stored_row(id: Uuid, kind: &str, status: &str, cover: Option<String>) -> serde_json::Value {
    let mut row = article_row(kind, "stored", status);
    row["id"] = json!(id);
    row["cover_image"] = json!(cover);
    row
}

#[tokio::test]
async fn test_update_other_kind_forbidden_without_patch() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            stored_row(id, "project", "published", None)
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = ContentGateway::new(BackendClient::new(config_for(&server)).unwrap());
    let patch = ArticlePatch {
        title: Some("Renamed".to_string()),
        ..Default::default()
    };

    let result = gateway
        .update_article(&profile(Role::NewsEditor), id, patch)
        .await;
    assert!(matches!(
        result,
        Err(GatewayError::Forbidden {
            kind: ArticleKind::Project,
            ..
        })
    ));
}

#[tokio::test]
async fn test_publishing_draft_stamps_timestamps() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            stored_row(id, "news", "draft", None)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/articles"))
        .and(query_param("id", format!("eq.{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            stored_row(id, "news", "published", None)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = ContentGateway::new(BackendClient::new(config_for(&server)).unwrap());
    let patch = ArticlePatch {
        status: Some(ArticleStatus::Published),
        ..Default::default()
    };

    let updated = gateway
        .update_article(&profile(Role::NewsEditor), id, patch)
        .await
        .unwrap();
    assert!(updated.is_published());

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests.last().unwrap().body).unwrap();
    assert_eq!(sent["status"], "published");
    assert!(sent["published_at"].is_string());
    assert!(sent["updated_at"].is_string());
    assert!(sent.get("title").is_none());
}

#[tokio::test]
async fn test_delete_article_removes_bucket_cover() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let cover = format!("{}/storage/v1/object/public/media/projects/cover.png", server.uri());
    Mock::given(method("GET"))
        .and(path("/rest/v1/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            stored_row(id, "project", "published", Some(cover.clone()))
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/articles"))
        .and(query_param("id", format!("eq.{id}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/media"))
        .and(body_json(json!({ "prefixes": ["projects/cover.png"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = BackendClient::new(config_for(&server)).unwrap();
    let storage = ObjectStorage::new(client.clone());
    let gateway = ContentGateway::new(client);

    tokio_test::assert_ok!(
        gateway
            .delete_article(&profile(Role::ProjectEditor), id, Some(&storage))
            .await
    );
}

#[tokio::test]
async fn test_delete_other_kind_forbidden_without_delete() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            stored_row(id, "news", "published", None)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = ContentGateway::new(BackendClient::new(config_for(&server)).unwrap());

    let result = gateway
        .delete_article(&profile(Role::ProjectEditor), id, None)
        .await;
    assert!(matches!(result, Err(GatewayError::Forbidden { .. })));
}
