#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const ADMIN_EMAIL: &str = "admin@homeserve.test";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const PASSWORD: &str = "password123";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_homeserve-api"));
        cmd.env("APP_ENV", "development")
            .env("HOST", "127.0.0.1")
            .env("HOMESERVE_PORT", port.to_string())
            .env("STORAGE_BACKEND", "memory")
            .env("JWT_SECRET", "integration-test-secret")
            .env("SECURITY_ALLOW_ADMIN_SIGNUP", "false")
            .env("BOOTSTRAP_ADMIN_EMAIL", ADMIN_EMAIL)
            .env("BOOTSTRAP_ADMIN_PASSWORD", ADMIN_PASSWORD)
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// An email no other test in the run will use.
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@homeserve.test", prefix, uuid::Uuid::new_v4().simple())
}

/// POST /auth/register; `extra` is merged into the base body.
pub async fn register(server: &TestServer, email: &str, extra: Value) -> Result<reqwest::Response> {
    let mut body = json!({ "name": "Test Person", "email": email, "password": PASSWORD });
    if let (Some(target), Value::Object(extra)) = (body.as_object_mut(), extra) {
        target.extend(extra);
    }
    Ok(reqwest::Client::new()
        .post(server.url("/auth/register"))
        .json(&body)
        .send()
        .await?)
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> Result<String> {
    let res = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
    let body: Value = res.json().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("login response has no token")
}

/// Register a customer and return (token, user id).
pub async fn customer(server: &TestServer) -> Result<(String, String)> {
    let email = unique_email("customer");
    let res = register(server, &email, json!({ "phone": "9000000001", "address": "12 MG Road" })).await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
    let body: Value = res.json().await?;
    let id = body["data"]["user"]["id"].as_str().context("no id")?.to_string();
    Ok((login(server, &email, PASSWORD).await?, id))
}

/// Register a worker offering `services` and return (token, worker id).
pub async fn worker(server: &TestServer, services: &[&str]) -> Result<(String, String)> {
    let email = unique_email("worker");
    let res = register(
        server,
        &email,
        json!({ "role": "worker", "worker": { "serviceTypes": services, "hourlyRate": 700, "advancePayment": 250 } }),
    )
    .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
    let body: Value = res.json().await?;
    let id = body["data"]["workerProfile"]["id"].as_str().context("no worker id")?.to_string();
    Ok((login(server, &email, PASSWORD).await?, id))
}

pub async fn admin(server: &TestServer) -> Result<String> {
    login(server, ADMIN_EMAIL, ADMIN_PASSWORD).await
}
