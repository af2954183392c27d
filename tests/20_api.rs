mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{call, test_app, token_for};
use elio_api::store::{CollectionPath, DocumentStore};

#[tokio::test]
async fn bad_tokens_are_unauthorized() {
    let (router, _) = test_app();

    let (status, _) = call(&router, Method::POST, "/create_user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&router, Method::POST, "/create_user", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn create_user_uses_token_identity() {
    let (router, store) = test_app();
    let token = token_for("u1", None);

    let (status, body) = call(&router, Method::POST, "/create_user", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["uid"], "u1");
    assert_eq!(body["data"]["email"], "");
    assert_eq!(body["data"]["role"], "user");
    assert_eq!(body["data"]["onboardingStep"], 0);

    let path = CollectionPath::root("users").unwrap().doc("u1").unwrap();
    assert!(store.get(&path).await.unwrap().is_some());
}

#[tokio::test]
async fn update_user_is_limited_to_own_profile() {
    let (router, store) = test_app();
    store.insert("users", "u1", json!({"uid": "u1", "role": "user"})).await.unwrap();
    let token = token_for("u1", None);

    let (status, body) = call(
        &router,
        Method::PUT,
        "/update_user/u2",
        Some(&token),
        Some(json!({"firstName": "Eve"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = call(
        &router,
        Method::PUT,
        "/update_user/u1",
        Some(&token),
        Some(json!({"firstName": "Ada", "role": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["firstName"], "Ada");
    assert!(body["data"].get("role").is_none());

    let (status, _) = call(
        &router,
        Method::PUT,
        "/update_user/u1",
        Some(&token),
        Some(json!({"role": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_requires_profession_and_filters() {
    let (router, store) = test_app();
    store
        .insert(
            "replacements",
            "r1",
            json!({"professionId": "nurse", "establishmentId": "e1", "startDate": "2025-05-01T08:00:00Z"}),
        )
        .await
        .unwrap();
    store
        .insert(
            "replacements",
            "r2",
            json!({"professionId": "nurse", "establishmentId": "e2", "startDate": "2025-06-01T08:00:00Z"}),
        )
        .await
        .unwrap();
    store
        .insert("replacements", "r3", json!({"professionId": "doctor", "establishmentId": "e1"}))
        .await
        .unwrap();
    let token = token_for("u1", None);

    let (status, body) = call(&router, Method::POST, "/search_replacements", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = call(
        &router,
        Method::POST,
        "/search_replacements",
        Some(&token),
        Some(json!({"professionId": "nurse", "establishmentIds": ["e1"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["data"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "r1");
    assert_eq!(results[0]["startDate"], "2025-05-01T08:00:00.000Z");

    let (status, body) = call(
        &router,
        Method::POST,
        "/search_replacements",
        Some(&token),
        Some(json!({"professionId": "nurse", "startDate": "2025-05-15T00:00:00Z", "endDate": "2025-06-30T00:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&Value> = body["data"].as_array().unwrap().iter().map(|r| &r["id"]).collect();
    assert_eq!(ids, vec![&json!("r2")]);
}

#[tokio::test]
async fn null_search_filters_are_ignored() {
    let (router, store) = test_app();
    for (id, establishment) in [("r1", "e1"), ("r2", "e2")] {
        store
            .insert("replacements", id, json!({"professionId": "nurse", "establishmentId": establishment}))
            .await
            .unwrap();
    }
    let token = token_for("u1", None);

    let (status, body) = call(
        &router,
        Method::POST,
        "/search_replacements",
        Some(&token),
        Some(json!({"professionId": "nurse", "establishmentIds": null, "specialtyIds": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (router, _) = test_app();
    let token = token_for("u1", None);
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/search_replacements")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = tower::ServiceExt::oneshot(router, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn messaging_flow() {
    let (router, store) = test_app();
    store
        .insert("conversations", "c1", json!({"participants": ["alice", "bob"]}))
        .await
        .unwrap();
    let alice = token_for("alice", None);
    let bob = token_for("bob", None);
    let mallory = token_for("mallory", None);

    let send = |content: &str| json!({"conversationId": "c1", "type": "user", "content": content});

    let (status, _) = call(&router, Method::POST, "/send_message", Some(&mallory), Some(send("hi"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &router,
        Method::POST,
        "/send_message",
        Some(&alice),
        Some(json!({"conversationId": "c1", "type": "fax", "content": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = call(&router, Method::POST, "/send_message", Some(&alice), Some(send("hello"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["readBy"], json!(["alice"]));

    let uri = format!("/delete_message/c1/{}", message_id);
    let (status, _) = call(&router, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&router, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["messageId"], message_id.as_str());

    let (status, _) = call(&router, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let conversation = CollectionPath::root("conversations").unwrap().doc("c1").unwrap();
    let doc = store.get(&conversation).await.unwrap().unwrap();
    assert_eq!(doc.get("lastMessage"), Some(&Value::Null));
}

#[tokio::test]
async fn delete_in_missing_conversation_is_not_found() {
    let (router, _) = test_app();
    let token = token_for("alice", None);
    let (status, _) = call(&router, Method::DELETE, "/delete_message/nope/m1", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
