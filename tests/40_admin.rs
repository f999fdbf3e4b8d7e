mod common;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn admin_routes_need_the_admin_role() -> Result<()> {
    let server = common::ensure_server().await?;
    let (customer, _) = common::customer(server).await?;
    let (worker, _) = common::worker(server, &["plumber"]).await?;
    let client = Client::new();

    for path in ["/api/admin/users", "/api/admin/workers", "/api/admin/requests", "/api/admin/stats"] {
        let res = client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
        for token in [&customer, &worker] {
            let res = client.get(server.url(path)).bearer_auth(token).send().await?;
            assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", path);
        }
    }
    Ok(())
}

#[tokio::test]
async fn bootstrap_admin_can_log_in() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::admin(server).await?;
    let body: Value = Client::new()
        .get(server.url("/api/auth/whoami"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert_eq!(body["data"]["user"]["email"], common::ADMIN_EMAIL);
    Ok(())
}

#[tokio::test]
async fn admin_oversight() -> Result<()> {
    let server = common::ensure_server().await?;
    let admin = common::admin(server).await?;
    let (worker, worker_id) = common::worker(server, &["ac-repair"]).await?;
    let (customer, _) = common::customer(server).await?;
    let client = Client::new();

    let created: Value = client
        .post(server.url("/api/requests"))
        .bearer_auth(&customer)
        .json(&json!({ "workerId": worker_id, "serviceType": "ac-repair", "description": "No cooling" }))
        .send()
        .await?
        .json()
        .await?;
    let request_id = created["data"]["id"].as_str().unwrap_or_default().to_string();
    for status in ["accepted", "completed"] {
        let res = client
            .put(server.url(&format!("/api/requests/{}/status", request_id)))
            .bearer_auth(&worker)
            .json(&json!({ "status": status }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let users: Value = client.get(server.url("/api/admin/users")).bearer_auth(&admin).send().await?.json().await?;
    let users = users["data"].as_array().cloned().unwrap_or_default();
    assert!(users.iter().any(|u| u["id"] == worker_id.as_str()));
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));

    let requests: Value = client.get(server.url("/api/admin/requests")).bearer_auth(&admin).send().await?.json().await?;
    assert!(requests["data"]
        .as_array()
        .map_or(false, |all| all.iter().any(|r| r["id"] == request_id.as_str())));

    let res = client
        .put(server.url(&format!("/api/admin/workers/{}/verify", worker_id)))
        .bearer_auth(&admin)
        .json(&json!({ "verified": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["verified"], true);

    let workers: Value = client.get(server.url("/api/admin/workers")).bearer_auth(&admin).send().await?.json().await?;
    let listed = workers["data"]
        .as_array()
        .and_then(|all| all.iter().find(|w| w["id"] == worker_id.as_str()).cloned())
        .unwrap_or_default();
    assert_eq!(listed["verified"], true);

    let stats: Value = client.get(server.url("/api/admin/stats")).bearer_auth(&admin).send().await?.json().await?;
    let stats = &stats["data"];
    assert!(stats["totalUsers"].as_u64().unwrap_or(0) >= 3);
    assert!(stats["usersByRole"]["admin"].as_u64().unwrap_or(0) >= 1);
    assert!(stats["requestsByStatus"]["completed"].as_u64().unwrap_or(0) >= 1);
    assert!(stats["revenue"].as_u64().unwrap_or(0) >= 250);
    assert!(stats["verifiedWorkers"].as_u64().unwrap_or(0) >= 1);
    Ok(())
}

#[tokio::test]
async fn verifying_an_unknown_worker_is_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let admin = common::admin(server).await?;
    let res = Client::new()
        .put(server.url(&format!("/api/admin/workers/{}/verify", uuid::Uuid::new_v4())))
        .bearer_auth(&admin)
        .json(&json!({ "verified": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
