#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub const SEED_PASSWORD: &str = "123456";

const READY_TIMEOUT: Duration = Duration::from_secs(30);
const READY_POLL: Duration = Duration::from_millis(150);

/// One `dscatalog serve --in-memory --seed` process shared by every test in a binary.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    _process: Child,
}

static SHARED: OnceLock<Result<TestServer, String>> = OnceLock::new();

impl TestServer {
    fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("no free port available")?;

        let process = Command::new(env!("CARGO_BIN_EXE_dscatalog"))
            .args(["serve", "--in-memory", "--seed", "--port", &port.to_string()])
            .env("APP_ENV", "development")
            .env("RUST_LOG", "dscatalog=warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("could not start dscatalog")?;

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            _process: process,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn is_healthy(&self, client: &reqwest::Client) -> bool {
        matches!(
            client.get(self.url("/health")).send().await,
            Ok(res) if res.status() == StatusCode::OK
        )
    }
}

/// Start the shared server on first use and block until `/health` answers.
pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SHARED
        .get_or_init(|| TestServer::start().map_err(|e| format!("{:#}", e)))
        .as_ref()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let client = reqwest::Client::new();
    let polled = tokio::time::timeout(READY_TIMEOUT, async {
        while !server.is_healthy(&client).await {
            tokio::time::sleep(READY_POLL).await;
        }
    })
    .await;
    polled.with_context(|| format!("{} not healthy after {:?}", server.base_url, READY_TIMEOUT))?;
    Ok(server)
}

/// Log in as a seeded account and return the bearer token
pub async fn login(server: &TestServer, email: &str) -> Result<String> {
    let res = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .json(&json!({ "username": email, "password": SEED_PASSWORD }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

    let body: Value = res.json().await?;
    body["data"]["access_token"]
        .as_str()
        .map(str::to_string)
        .context("missing access_token")
}

pub async fn get_json(server: &TestServer, path: &str) -> Result<(StatusCode, Value)> {
    let res = reqwest::Client::new().get(server.url(path)).send().await?;
    let status = res.status();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, body))
}
