mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{bearer, create_task, register, send, spawn_app, TestContext, PASSWORD};
use taskmanager::store::TaskRepository;

#[actix_rt::test]
async fn test_register_login_and_profile_flow() {
    let ctx = TestContext::new();
    let app = spawn_app(&ctx).await;

    let (user, token) = register(&app, "Ada", "Ada@Example.com").await;
    assert_eq!(user["name"], "Ada");
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["age"], 0);
    assert!(user.get("password_hash").is_none());
    assert!(user.get("tokens").is_none());

    // Same email in a different case conflicts.
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "name": "Other", "email": "ADA@example.com", "password": PASSWORD }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT, "Body: {}", body);

    // Login.
    let req = test::TestRequest::post()
        .uri("/users/login")
        .set_json(json!({ "email": "ada@example.com", "password": PASSWORD }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "Body: {}", body);
    assert_eq!(body["user"]["id"], user["id"]);
    let login_token = body["token"].as_str().unwrap().to_string();
    assert_ne!(login_token, token);

    // Both sessions are live.
    for t in [&token, &login_token] {
        let req = test::TestRequest::get()
            .uri("/users/me")
            .insert_header(bearer(t))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");
        assert!(body.get("tokens").is_none());
    }
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let ctx = TestContext::new();
    let app = spawn_app(&ctx).await;

    let test_cases = vec![
        (json!({ "email": "a@x.com", "password": PASSWORD }), "missing name"),
        (json!({ "name": "A", "password": PASSWORD }), "missing email"),
        (json!({ "name": "A", "email": "a@x.com" }), "missing password"),
        (json!({ "name": "   ", "email": "a@x.com", "password": PASSWORD }), "blank name"),
        (json!({ "name": "A", "email": "invalid-email", "password": PASSWORD }), "invalid email"),
        (json!({ "name": "A", "email": "a@x.com", "password": "short" }), "short password"),
        (json!({ "name": "A", "email": "a@x.com", "password": "Password99" }), "contains password"),
        (json!({ "name": "A", "email": "a@x.com", "password": PASSWORD, "age": -3 }), "negative age"),
        (json!({ "name": "A", "email": "a@x.com", "password": PASSWORD, "age": "old" }), "non-numeric age"),
    ];

    for (payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(&payload)
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(
            status,
            StatusCode::BAD_REQUEST,
            "Test case failed: {}. Body: {}",
            description,
            body
        );
        assert!(body["error"].is_string(), "No error message for {}", description);
    }
}

#[actix_rt::test]
async fn test_login_failures_share_one_message() {
    let ctx = TestContext::new();
    let app = spawn_app(&ctx).await;
    register(&app, "A", "a@x.com").await;

    for payload in [
        json!({ "email": "a@x.com", "password": "wrong-secret" }),
        json!({ "email": "nobody@x.com", "password": PASSWORD }),
    ] {
        let req = test::TestRequest::post()
            .uri("/users/login")
            .set_json(&payload)
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unable to login");
    }
}

#[actix_rt::test]
async fn test_logout_and_logout_all() {
    let ctx = TestContext::new();
    let app = spawn_app(&ctx).await;
    let (_, first) = register(&app, "A", "a@x.com").await;

    let req = test::TestRequest::post()
        .uri("/users/login")
        .set_json(json!({ "email": "a@x.com", "password": PASSWORD }))
        .to_request();
    let (_, body) = send(&app, req).await;
    let second = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/users/logout")
        .insert_header(bearer(&first))
        .to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer(&first))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please authenticate.");

    let req = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer(&second))
        .to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/users/logoutAll")
        .insert_header(bearer(&second))
        .to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer(&second))
        .to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();
    let app = spawn_app(&ctx).await;

    for req in [
        test::TestRequest::get().uri("/users/me").to_request(),
        test::TestRequest::post().uri("/users/logout").to_request(),
        test::TestRequest::get().uri("/tasks").to_request(),
        test::TestRequest::get()
            .uri("/tasks")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request(),
    ] {
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Please authenticate.");
    }
}

#[actix_rt::test]
async fn test_update_profile() {
    let ctx = TestContext::new();
    let app = spawn_app(&ctx).await;
    let (_, token) = register(&app, "A", "a@x.com").await;

    let req = test::TestRequest::patch()
        .uri("/users/me")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": " Bea ", "age": 41, "password": "brandnew1" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "Body: {}", body);
    assert_eq!(body["name"], "Bea");
    assert_eq!(body["age"], 41);

    let req = test::TestRequest::post()
        .uri("/users/login")
        .set_json(json!({ "email": "a@x.com", "password": "brandnew1" }))
        .to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::OK);

    for payload in [
        json!({ "tokens": [] }),
        json!({ "age": -1 }),
        json!({ "email": "not-an-email" }),
    ] {
        let req = test::TestRequest::patch()
            .uri("/users/me")
            .insert_header(bearer(&token))
            .set_json(&payload)
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "Payload {} gave {}", payload, body);
    }
}

#[actix_rt::test]
async fn test_update_email_to_taken_address_conflicts() {
    let ctx = TestContext::new();
    let app = spawn_app(&ctx).await;
    register(&app, "A", "a@x.com").await;
    let (_, token) = register(&app, "B", "b@x.com").await;

    let req = test::TestRequest::patch()
        .uri("/users/me")
        .insert_header(bearer(&token))
        .set_json(json!({ "email": "A@X.com" }))
        .to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn test_delete_user_removes_owned_tasks() {
    let ctx = TestContext::new();
    let app = spawn_app(&ctx).await;
    let (user, token) = register(&app, "A", "a@x.com").await;
    let (other, other_token) = register(&app, "B", "b@x.com").await;

    for i in 0..3 {
        create_task(&app, &token, &format!("task {}", i)).await;
    }
    create_task(&app, &other_token, "keep me").await;

    let req = test::TestRequest::delete()
        .uri("/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user["id"]);

    let user_id = user["id"].as_str().unwrap().parse().unwrap();
    let other_id = other["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(ctx.store.count_tasks(user_id).await.unwrap(), 0);
    assert_eq!(ctx.store.count_tasks(other_id).await.unwrap(), 1);

    // The deleted account can no longer authenticate or log in.
    let req = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/users/login")
        .set_json(json!({ "email": "a@x.com", "password": PASSWORD }))
        .to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_session_count_is_bounded() {
    let ctx = TestContext::with_max_sessions(2);
    let app = spawn_app(&ctx).await;
    let (_, first) = register(&app, "A", "a@x.com").await;

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/users/login")
            .set_json(json!({ "email": "a@x.com", "password": PASSWORD }))
            .to_request();
        assert_eq!(send(&app, req).await.0, StatusCode::OK);
    }

    let req = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer(&first))
        .to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_avatar_upload_and_fetch() {
    let ctx = TestContext::new();
    let app = spawn_app(&ctx).await;
    let (user, token) = register(&app, "A", "a@x.com").await;
    let png: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    let avatar_uri = format!("/users/{}/avatar", user["id"].as_str().unwrap());

    let req = test::TestRequest::post()
        .uri("/users/me/avatar")
        .insert_header(bearer(&token))
        .set_payload("plain text, not an image")
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please upload an image");

    let req = test::TestRequest::post()
        .uri("/users/me/avatar")
        .insert_header(bearer(&token))
        .set_payload(png)
        .to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::OK);

    // Public: no token needed.
    let req = test::TestRequest::get().uri(&avatar_uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap().to_str().unwrap(),
        "image/png"
    );
    assert_eq!(test::read_body(resp).await.as_ref(), png);

    let req = test::TestRequest::delete()
        .uri("/users/me/avatar")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::OK);

    let req = test::TestRequest::get().uri(&avatar_uri).to_request();
    assert_eq!(send(&app, req).await.0, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_health_is_public() {
    let ctx = TestContext::new();
    let app = spawn_app(&ctx).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
