mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_create_link_generates_slug() {
    let server = common::test_server(common::memory_state(false));
    let token = common::register(&server, "owner@example.com").await;

    let link = common::create_link(&server, &token, json!({ "url": "https://example.com/a" })).await;

    let slug = link["slug"].as_str().unwrap();
    assert_eq!(slug.len(), 6);
    assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    assert_eq!(link["short_url"], format!("{}/{}", common::BASE_URL, slug));
    assert_eq!(link["original_url"], "https://example.com/a");
    assert_eq!(link["click_count"], 0);
    assert_eq!(link["has_password"], false);
    assert!(link.get("password_hash").is_none());
}

#[tokio::test]
async fn test_create_link_normalizes_custom_slug_and_keeps_qr_style() {
    let server = common::test_server(common::memory_state(false));
    let token = common::register(&server, "owner@example.com").await;

    let link = common::create_link(
        &server,
        &token,
        json!({
            "url": "https://example.com",
            "customSlug": "  Spring-Sale ",
            "qrStyle": { "fgColor": "#111111", "bgColor": "#eeeeee", "style": "rounded" }
        }),
    )
    .await;

    assert_eq!(link["slug"], "spring-sale");
    assert_eq!(link["qr_style"]["style"], "rounded");
}

#[tokio::test]
async fn test_create_link_requires_auth_unless_anonymous_allowed() {
    let closed = common::test_server(common::memory_state(false));
    let response = closed
        .post("/api/links")
        .json(&json!({ "url": "https://example.com" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let open = common::test_server(common::memory_state(true));
    let response = open
        .post("/api/links")
        .json(&json!({ "url": "https://example.com" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["owner_id"], Value::Null);
}

#[tokio::test]
async fn test_invalid_bearer_token_is_rejected_even_when_anonymous_allowed() {
    let server = common::test_server(common::memory_state(true));

    let response = server
        .post("/api/links")
        .authorization_bearer("not-a-jwt")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_link_validation_errors() {
    let server = common::test_server(common::memory_state(false));
    let token = common::register(&server, "owner@example.com").await;

    for body in [
        json!({ "url": "javascript:alert(1)" }),
        json!({ "url": "not a url" }),
        json!({ "url": "https://example.com", "customSlug": "ab" }),
        json!({ "url": "https://example.com", "customSlug": "has space" }),
        json!({ "url": "https://example.com", "customSlug": "api" }),
        json!({ "nope": true }),
    ] {
        let response = server
            .post("/api/links")
            .authorization_bearer(&token)
            .json(&body)
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(response.json::<Value>()["code"], "validation_error");
    }
}

#[tokio::test]
async fn test_duplicate_custom_slug_conflicts() {
    let server = common::test_server(common::memory_state(false));
    let token = common::register(&server, "owner@example.com").await;
    common::create_link(
        &server,
        &token,
        json!({ "url": "https://example.com", "customSlug": "promo1" }),
    )
    .await;

    let response = server
        .post("/api/links")
        .authorization_bearer(&token)
        .json(&json!({ "url": "https://other.example", "customSlug": "PROMO1" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "conflict");
}

#[tokio::test]
async fn test_list_links_is_owner_scoped_and_paginated() {
    let server = common::test_server(common::memory_state(false));
    let alice = common::register(&server, "alice@example.com").await;
    let bob = common::register(&server, "bob@example.com").await;

    for slug in ["alice-1", "alice-2", "alice-3"] {
        common::create_link(
            &server,
            &alice,
            json!({ "url": "https://example.com", "customSlug": slug }),
        )
        .await;
    }
    common::create_link(
        &server,
        &bob,
        json!({ "url": "https://example.com", "customSlug": "bob-1" }),
    )
    .await;

    let all = server
        .get("/api/links")
        .authorization_bearer(&alice)
        .await
        .json::<Vec<Value>>();
    let slugs: Vec<&str> = all.iter().map(|l| l["slug"].as_str().unwrap()).collect();
    assert_eq!(slugs, ["alice-3", "alice-2", "alice-1"]);

    let page = server
        .get("/api/links")
        .add_query_param("limit", 1)
        .add_query_param("offset", 1)
        .authorization_bearer(&alice)
        .await
        .json::<Vec<Value>>();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["slug"], "alice-2");

    let bad = server
        .get("/api/links")
        .add_query_param("limit", 0)
        .authorization_bearer(&alice)
        .await;
    assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

    let export = server
        .get("/api/links/export")
        .authorization_bearer(&bob)
        .await
        .json::<Vec<Value>>();
    assert_eq!(export.len(), 1);
    assert_eq!(export[0]["slug"], "bob-1");
}

#[tokio::test]
async fn test_management_requires_auth() {
    let server = common::test_server(common::memory_state(true));

    for path in ["/api/links", "/api/links/export", "/api/links/1"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn test_non_owner_cannot_read_update_or_delete() {
    let server = common::test_server(common::memory_state(false));
    let alice = common::register(&server, "alice@example.com").await;
    let bob = common::register(&server, "bob@example.com").await;

    let link = common::create_link(
        &server,
        &alice,
        json!({ "url": "https://example.com/original", "customSlug": "mine" }),
    )
    .await;
    let path = format!("/api/links/{}", link["id"]);

    let read = server.get(&path).authorization_bearer(&bob).await;
    assert_eq!(read.status_code(), StatusCode::NOT_FOUND);

    let update = server
        .patch(&path)
        .authorization_bearer(&bob)
        .json(&json!({ "originalUrl": "https://evil.example" }))
        .await;
    assert_eq!(update.status_code(), StatusCode::NOT_FOUND);

    let delete = server.delete(&path).authorization_bearer(&bob).await;
    assert_eq!(delete.status_code(), StatusCode::NOT_FOUND);

    let unchanged = server
        .get(&path)
        .authorization_bearer(&alice)
        .await
        .json::<Value>();
    assert_eq!(unchanged["original_url"], "https://example.com/original");
}

#[tokio::test]
async fn test_patch_link_fields() {
    let server = common::test_server(common::memory_state(false));
    let token = common::register(&server, "owner@example.com").await;

    let link = common::create_link(
        &server,
        &token,
        json!({
            "url": "https://example.com",
            "customSlug": "before",
            "password": "secret1",
            "expiresAt": "2099-01-01T00:00:00Z"
        }),
    )
    .await;
    let path = format!("/api/links/{}", link["id"]);

    let renamed = server
        .patch(&path)
        .authorization_bearer(&token)
        .json(&json!({ "slug": "after", "originalUrl": "https://example.org" }))
        .await
        .json::<Value>();
    assert_eq!(renamed["slug"], "after");
    assert_eq!(renamed["original_url"], "https://example.org");
    assert_eq!(renamed["has_password"], true);
    assert!(renamed["expires_at"].is_string());

    let cleared = server
        .patch(&path)
        .authorization_bearer(&token)
        .json(&json!({ "password": null, "expiresAt": null }))
        .await
        .json::<Value>();
    assert_eq!(cleared["has_password"], false);
    assert_eq!(cleared["expires_at"], Value::Null);

    assert_eq!(
        server.get("/after").await.status_code(),
        StatusCode::MOVED_PERMANENTLY
    );
    assert_eq!(server.get("/before").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_rename_onto_taken_slug_conflicts() {
    let server = common::test_server(common::memory_state(false));
    let token = common::register(&server, "owner@example.com").await;
    common::create_link(
        &server,
        &token,
        json!({ "url": "https://example.com", "customSlug": "taken" }),
    )
    .await;
    let link = common::create_link(
        &server,
        &token,
        json!({ "url": "https://example.com", "customSlug": "free" }),
    )
    .await;

    let response = server
        .patch(&format!("/api/links/{}", link["id"]))
        .authorization_bearer(&token)
        .json(&json!({ "slug": "taken" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_and_bulk_delete() {
    let server = common::test_server(common::memory_state(false));
    let alice = common::register(&server, "alice@example.com").await;
    let bob = common::register(&server, "bob@example.com").await;

    let a1 = common::create_link(&server, &alice, json!({ "url": "https://a.example" })).await;
    let a2 = common::create_link(&server, &alice, json!({ "url": "https://b.example" })).await;
    let a3 = common::create_link(&server, &alice, json!({ "url": "https://c.example" })).await;
    let b1 = common::create_link(&server, &bob, json!({ "url": "https://d.example" })).await;

    let deleted = server
        .delete(&format!("/api/links/{}", a1["id"]))
        .authorization_bearer(&alice)
        .await;
    deleted.assert_status_ok();
    assert_eq!(deleted.json::<Value>(), json!({ "success": true }));

    let bulk = server
        .post("/api/links/bulk-delete")
        .authorization_bearer(&alice)
        .json(&json!({ "ids": [a2["id"], a3["id"], b1["id"], 9999] }))
        .await;
    bulk.assert_status_ok();
    assert_eq!(bulk.json::<Value>(), json!({ "success": true, "deleted": 2 }));

    let remaining = server
        .get("/api/links")
        .authorization_bearer(&bob)
        .await
        .json::<Vec<Value>>();
    assert_eq!(remaining.len(), 1);

    let empty = server
        .post("/api/links/bulk-delete")
        .authorization_bearer(&alice)
        .json(&json!({ "ids": [] }))
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_link_owner_lookup() {
    let server = common::test_server(common::memory_state(true));
    let token = common::register(&server, "Owner@Example.com").await;
    common::create_link(
        &server,
        &token,
        json!({ "url": "https://example.com", "customSlug": "owned" }),
    )
    .await;

    server
        .post("/api/links")
        .json(&json!({ "url": "https://example.com", "customSlug": "anon" }))
        .await
        .assert_status(StatusCode::CREATED);

    let owned = server.get("/api/links/owner/owned").await;
    owned.assert_status_ok();
    assert_eq!(owned.json::<Value>(), json!({ "email": "owner@example.com" }));

    let anonymous = server.get("/api/links/owner/anon").await;
    assert_eq!(anonymous.status_code(), StatusCode::NOT_FOUND);
}
