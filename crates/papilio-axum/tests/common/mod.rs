//! Shared fixtures for router tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use papilio_axum::{AxumContext, CorsConfig, UploadStore, create_router};
use papilio_core::{
    CancellationToken, CommandResolver, CommandSpec, FlashOrchestrator, PortListError,
    ProcessExecutor, ProcessOutcome, SerialPortInfo, SerialPortLister,
};
use tempfile::TempDir;

pub const BOUNDARY: &str = "papilio-test-boundary";

/// One programmer invocation seen by [`FakeExecutor`].
#[derive(Debug, Clone)]
pub struct Invocation {
    pub spec: CommandSpec,
    /// Whether the artifact argument existed while the programmer "ran".
    pub artifact_existed: bool,
}

/// Replays a fixed outcome and records what it was asked to run.
pub struct FakeExecutor {
    outcome: ProcessOutcome,
    seen: Mutex<Vec<Invocation>>,
}

impl FakeExecutor {
    pub fn new(outcome: ProcessOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessExecutor for FakeExecutor {
    async fn execute(&self, spec: &CommandSpec, _cancel: CancellationToken) -> ProcessOutcome {
        let artifact_existed = spec.args().iter().any(|a| Path::new(a).is_file());
        self.seen.lock().unwrap().push(Invocation {
            spec: spec.clone(),
            artifact_existed,
        });
        self.outcome.clone()
    }
}

/// Returns a fixed port list or error.
pub struct FakeLister(pub Result<Vec<SerialPortInfo>, PortListError>);

impl SerialPortLister for FakeLister {
    fn list_ports(&self) -> Result<Vec<SerialPortInfo>, PortListError> {
        self.0.clone()
    }
}

pub struct TestApp {
    pub router: Router,
    pub executor: Arc<FakeExecutor>,
    pub orchestrator: FlashOrchestrator,
    pub upload_dir: TempDir,
}

pub struct TestAppBuilder {
    outcome: ProcessOutcome,
    ports: Result<Vec<SerialPortInfo>, PortListError>,
    api_key: Option<String>,
    max_upload_bytes: u64,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            outcome: ProcessOutcome::completed(0, "Programming completed", ""),
            ports: Ok(Vec::new()),
            api_key: None,
            max_upload_bytes: 1024 * 1024,
        }
    }
}

impl TestAppBuilder {
    pub fn outcome(mut self, outcome: ProcessOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn ports(mut self, ports: Result<Vec<SerialPortInfo>, PortListError>) -> Self {
        self.ports = ports;
        self
    }

    pub fn api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub async fn build(self) -> TestApp {
        let upload_dir = tempfile::tempdir().unwrap();
        let executor = FakeExecutor::new(self.outcome);
        let orchestrator = FlashOrchestrator::new(CommandResolver::new(), executor.clone());

        let ctx = AxumContext {
            orchestrator: orchestrator.clone(),
            ports: Arc::new(FakeLister(self.ports)),
            uploads: UploadStore::prepare(upload_dir.path(), self.max_upload_bytes)
                .await
                .unwrap(),
            api_key: self.api_key.map(Arc::from),
        };

        TestApp {
            router: create_router(ctx, &CorsConfig::AllowAll),
            executor,
            orchestrator,
            upload_dir,
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::default()
    }

    /// Files left in the upload directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }
}

/// A multipart part: `(name, filename, bytes)`.
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

/// A plain text field.
pub fn text<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    (name, None, value.as_bytes())
}

/// The `file` field.
pub fn file<'a>(filename: &'a str, data: &'a [u8]) -> Part<'a> {
    ("file", Some(filename), data)
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(path: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn get_request(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A header that looks like an ESP32 application image.
pub fn esp_image() -> Vec<u8> {
    let mut image = vec![0u8; 64];
    image[0] = 0xE9;
    image
}

/// A header that looks like a padded FPGA bitstream.
pub fn fpga_bitstream() -> Vec<u8> {
    vec![0xFF; 64]
}
