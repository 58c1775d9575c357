use std::sync::Arc;

use salon_clients::models::ClientFilterPatch;
use salon_clients::{Backend, ClientListStore};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, offset: &str, range: &str, ids: &[&str]) {
    let rows: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .and(query_param("offset", offset))
        .and(query_param("limit", "2"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", range)
                .set_body_json(rows),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn store_pages_through_repository() {
    let server = MockServer::start().await;
    mount_page(&server, "0", "0-1/3", &["c1", "c2"]).await;
    mount_page(&server, "2", "2-2/3", &["c3"]).await;

    let repository = Backend::new(&server.uri(), "test-key").repository();
    let store = ClientListStore::new(Arc::new(repository));

    store
        .update_filters(ClientFilterPatch {
            limit: Some(2),
            ..ClientFilterPatch::default()
        })
        .await;
    let state = store.snapshot();
    assert_eq!(state.clients.len(), 2);
    assert_eq!(state.total, 3);
    assert!(state.has_more);

    store.load_more().await;
    let state = store.snapshot();
    let ids: Vec<&str> = state.clients.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c1", "c2", "c3"]);
    assert_eq!(state.page, 2);
    assert!(!state.has_more);
    assert!(!state.is_loading_more);
}

#[tokio::test]
async fn backend_failure_leaves_store_empty_and_idle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let repository = Backend::new(&server.uri(), "test-key").repository();
    let store = ClientListStore::new(Arc::new(repository));

    store.search("ann").await;

    let state = store.snapshot();
    assert!(state.clients.is_empty());
    assert_eq!(state.total_pages, 0);
    assert!(!state.is_busy());
}

#[tokio::test]
async fn failed_next_page_keeps_loaded_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "0", "0-1/5", &["c1", "c2"]).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let repository = Backend::new(&server.uri(), "test-key").repository();
    let store = ClientListStore::new(Arc::new(repository));

    store
        .update_filters(ClientFilterPatch {
            limit: Some(2),
            ..ClientFilterPatch::default()
        })
        .await;
    store.load_more().await;

    let state = store.snapshot();
    let ids: Vec<&str> = state.clients.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c1", "c2"]);
    assert_eq!(state.total, 5);
    assert_eq!(state.page, 1);
    assert_eq!(state.total_pages, 3);
    assert!(state.has_more);
    assert!(!state.is_busy());
}

#[tokio::test]
async fn failed_search_keeps_current_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .and(query_param(
            "or",
            "(first_name.ilike.%ann%,last_name.ilike.%ann%,email.ilike.%ann%,phone.ilike.%ann%)",
        ))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "0", "0-1/5", &["c1", "c2"]).await;

    let repository = Backend::new(&server.uri(), "test-key").repository();
    let store = ClientListStore::new(Arc::new(repository));

    store
        .update_filters(ClientFilterPatch {
            limit: Some(2),
            ..ClientFilterPatch::default()
        })
        .await;
    store.search("ann").await;

    let state = store.snapshot();
    assert_eq!(state.clients.len(), 2);
    assert_eq!(state.total, 5);
    assert_eq!(state.total_pages, 3);
    assert!(state.has_more);
    assert!(!state.is_loading);
}
