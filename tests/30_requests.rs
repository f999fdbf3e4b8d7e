mod common;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

async fn book(server: &common::TestServer, token: &str, worker_id: &str, service: &str) -> Result<reqwest::Response> {
    Ok(Client::new()
        .post(server.url("/api/requests"))
        .bearer_auth(token)
        .json(&json!({
            "workerId": worker_id,
            "serviceType": service,
            "description": "Bathroom tap keeps dripping",
            "location": "Koramangala, Bengaluru",
            "scheduledTime": "2024-07-01T10:00",
            "paymentMethod": "upi"
        }))
        .send()
        .await?)
}

async fn put(server: &common::TestServer, token: &str, path: &str, body: Value) -> Result<(StatusCode, Value)> {
    let res = Client::new()
        .put(server.url(path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await?;
    let status = res.status();
    Ok((status, res.json().await?))
}

async fn list(server: &common::TestServer, token: &str, path: &str) -> Result<Vec<Value>> {
    let body: Value = Client::new()
        .get(server.url(path))
        .bearer_auth(token)
        .send()
        .await?
        .json()
        .await?;
    body["data"].as_array().cloned().context("expected a list")
}

#[tokio::test]
async fn full_booking_lifecycle() -> Result<()> {
    let server = common::ensure_server().await?;
    let (worker, worker_id) = common::worker(server, &["plumber"]).await?;
    let (customer, customer_id) = common::customer(server).await?;

    let res = book(server, &customer, &worker_id, "plumber").await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let request = &created["data"];
    assert_eq!(request["status"], "pending");
    assert_eq!(request["paymentStatus"], "pending");
    assert_eq!(request["paymentMethod"], "upi");
    assert_eq!(request["advanceAmount"], 250);
    assert_eq!(request["totalAmount"], 700);
    assert_eq!(request["userId"], customer_id.as_str());
    assert_eq!(request["userPhone"], "9000000001");
    let id = request["id"].as_str().context("id")?.to_string();

    assert_eq!(list(server, &customer, "/api/requests/mine").await?.len(), 1);
    let assigned = list(server, &worker, "/api/requests/assigned").await?;
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0]["id"], id.as_str());

    let status_path = format!("/api/requests/{}/status", id);
    let (status, body) = put(server, &worker, &status_path, json!({ "status": "accepted" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["acceptedAt"].is_string());

    let payment_path = format!("/api/requests/{}/payment", id);
    let (status, _) = put(server, &customer, &payment_path, json!({ "paymentStatus": "advance_paid" })).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = put(server, &worker, &status_path, json!({ "status": "completed" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["completedAt"].is_string());

    let (status, body) = put(server, &customer, &payment_path, json!({ "paymentStatus": "paid" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["paymentStatus"], "paid");
    Ok(())
}

#[tokio::test]
async fn illegal_transitions_conflict() -> Result<()> {
    let server = common::ensure_server().await?;
    let (worker, worker_id) = common::worker(server, &["electrician"]).await?;
    let (customer, _) = common::customer(server).await?;

    let created: Value = book(server, &customer, &worker_id, "electrician").await?.json().await?;
    let id = created["data"]["id"].as_str().context("id")?.to_string();
    let status_path = format!("/api/requests/{}/status", id);
    let payment_path = format!("/api/requests/{}/payment", id);

    let (status, body) = put(server, &worker, &status_path, json!({ "status": "completed" })).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = put(server, &worker, &status_path, json!({ "status": "rejected" })).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = put(server, &worker, &status_path, json!({ "status": "accepted" })).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Rejected bookings cannot be paid for
    let (status, _) = put(server, &customer, &payment_path, json!({ "paymentStatus": "paid" })).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn only_the_right_parties_may_act() -> Result<()> {
    let server = common::ensure_server().await?;
    let (worker, worker_id) = common::worker(server, &["painter"]).await?;
    let (other_worker, _) = common::worker(server, &["painter"]).await?;
    let (customer, _) = common::customer(server).await?;
    let (stranger, _) = common::customer(server).await?;

    // Workers cannot book
    let res = book(server, &worker, &worker_id, "painter").await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let created: Value = book(server, &customer, &worker_id, "painter").await?.json().await?;
    let id = created["data"]["id"].as_str().context("id")?.to_string();
    let status_path = format!("/api/requests/{}/status", id);
    let payment_path = format!("/api/requests/{}/payment", id);

    for token in [&customer, &other_worker] {
        let (status, _) = put(server, token, &status_path, json!({ "status": "accepted" })).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
    for token in [&stranger, &worker] {
        let (status, _) = put(server, token, &payment_path, json!({ "paymentStatus": "paid" })).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let res = Client::new()
        .get(server.url("/api/requests/assigned"))
        .bearer_auth(&customer)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn booking_checks_worker_and_service() -> Result<()> {
    let server = common::ensure_server().await?;
    let (_, worker_id) = common::worker(server, &["cleaner"]).await?;
    let (customer, _) = common::customer(server).await?;

    let res = book(server, &customer, &worker_id, "plumber").await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = book(server, &customer, &uuid::Uuid::new_v4().to_string(), "cleaner").await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let (status, _) = put(
        server,
        &customer,
        &format!("/api/requests/{}/payment", uuid::Uuid::new_v4()),
        json!({ "paymentStatus": "paid" }),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn ratings_follow_completed_work() -> Result<()> {
    let server = common::ensure_server().await?;
    let (worker, worker_id) = common::worker(server, &["pest-control"]).await?;
    let (customer, _) = common::customer(server).await?;
    let rating_path = server.url(&format!("/api/workers/{}/rating", worker_id));
    let client = Client::new();

    let rate = |token: &str, rating: u8| {
        client
            .post(&rating_path)
            .bearer_auth(token)
            .json(&json!({ "rating": rating, "review": "Thorough job" }))
            .send()
    };

    assert_eq!(rate(customer.as_str(), 5).await?.status(), StatusCode::FORBIDDEN);

    let created: Value = book(server, &customer, &worker_id, "pest-control").await?.json().await?;
    let id = created["data"]["id"].as_str().context("id")?.to_string();
    let status_path = format!("/api/requests/{}/status", id);
    put(server, &worker, &status_path, json!({ "status": "accepted" })).await?;
    put(server, &worker, &status_path, json!({ "status": "completed" })).await?;

    assert_eq!(rate(customer.as_str(), 9).await?.status(), StatusCode::BAD_REQUEST);
    assert_eq!(rate(worker.as_str(), 5).await?.status(), StatusCode::FORBIDDEN);

    let res = rate(customer.as_str(), 4).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["rating"], 4.0);
    assert_eq!(body["data"]["totalRatings"], 1);
    assert_eq!(body["data"]["reviews"][0]["review"], "Thorough job");
    Ok(())
}
