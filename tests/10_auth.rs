mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::get(server.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["storage"], "memory");
    Ok(())
}

#[tokio::test]
async fn register_login_whoami() -> Result<()> {
    let server = common::ensure_server().await?;
    let email = common::unique_email("Asha");

    let res = common::register(server, &email, json!({ "phone": "9845012345" })).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], email.to_lowercase());
    assert_eq!(body["data"]["user"]["role"], "user");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let token = common::login(server, &email.to_uppercase(), common::PASSWORD).await?;
    let res = reqwest::Client::new()
        .get(server.url("/api/auth/whoami"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["user"]["phone"], "9845012345");
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    let server = common::ensure_server().await?;
    let email = common::unique_email("dup");

    assert_eq!(common::register(server, &email, json!({})).await?.status(), StatusCode::CREATED);
    let res = common::register(server, &email, json!({})).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn registration_validates_input() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::register(server, "not-an-email", json!({})).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["email"].is_string());

    let email = common::unique_email("short");
    let res = common::register(server, &email, json!({ "password": "abc" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Workers must name services from the catalogue
    let res = common::register(server, &email, json!({ "role": "worker" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Admin self-signup is switched off for this server
    let res = common::register(server, &email, json!({ "role": "admin" })).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_alike() -> Result<()> {
    let server = common::ensure_server().await?;
    let email = common::unique_email("login");
    common::register(server, &email, json!({})).await?;
    let client = reqwest::Client::new();

    let mut messages = Vec::new();
    for (email, password) in [(email.as_str(), "wrong-password"), ("nobody@homeserve.test", common::PASSWORD)] {
        let res = client
            .post(server.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = res.json().await?;
        messages.push(body["message"].clone());
    }
    assert_eq!(messages[0], messages[1]);
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_and_forged_tokens() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/auth/whoami")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(server.url("/api/auth/whoami"))
        .bearer_auth("eyJhbGciOiJIUzI1NiJ9.e30.invalid")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
