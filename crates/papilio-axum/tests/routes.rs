//! Router-level tests driven through `tower::ServiceExt::oneshot`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use papilio_core::{PortListError, ProcessOutcome, SerialPortInfo, SpawnFailure};
use tower::ServiceExt;

use common::{
    TestApp, esp_image, file, fpga_bitstream, get_request, json_body, text, upload_request,
};

#[tokio::test]
async fn health_reports_service_name() {
    let app = TestApp::builder().build().await;

    let response = app.router.oneshot(get_request("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "papilio-loader-web");
}

#[tokio::test]
async fn fpga_upload_flashes_and_removes_the_staged_file() {
    let app = TestApp::builder()
        .outcome(ProcessOutcome::completed(0, "Programming completed", ""))
        .build()
        .await;
    let bitstream = fpga_bitstream();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(
            "/api/upload/fpga",
            &[
                text("port", "/dev/ttyUSB0"),
                file("design.bit", &bitstream),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "FPGA bitfile loaded successfully to /dev/ttyUSB0");
    assert_eq!(json["details"], "Programming completed");
    assert!(json.get("warning").is_none());

    let calls = app.executor.invocations();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].spec.program(), "papilio-prog");
    assert_eq!(calls[0].spec.args()[4], "/dev/ttyUSB0");
    assert!(calls[0].spec.args()[2].ends_with("-design.bit"));
    assert!(calls[0].artifact_existed);
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn esp32_upload_uses_address_or_default() {
    let image = esp_image();
    for (address, expected) in [(Some("0x10000"), "0x10000"), (None, "0x1000"), (Some("  "), "0x1000")] {
        let app = TestApp::builder().build().await;
        let mut parts: Vec<common::Part<'_>> = vec![
            file("app.bin", &image),
            text("port", "COM3"),
        ];
        if let Some(address) = address {
            parts.push(text("address", address));
        }

        let response = app
            .router
            .clone()
            .oneshot(upload_request("/api/upload/esp32", &parts))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["message"], "ESP32 firmware loaded successfully to COM3");

        let calls = app.executor.invocations();
        assert_eq!(calls[0].spec.program(), "esptool.py");
        assert_eq!(calls[0].spec.args()[8], expected);
    }
}

#[tokio::test]
async fn missing_file_is_bad_request() {
    let app = TestApp::builder().build().await;

    let response = app
        .router
        .clone()
        .oneshot(upload_request("/api/upload/fpga", &[text("port", "COM3")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "No file uploaded");
    assert!(app.executor.invocations().is_empty());
}

#[tokio::test]
async fn missing_port_is_bad_request_and_cleans_up() {
    let app = TestApp::builder().build().await;
    let bitstream = fpga_bitstream();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(
            "/api/upload/fpga",
            &[file("design.bit", &bitstream)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Serial port not specified");
    assert!(app.executor.invocations().is_empty());
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn unsupported_extension_is_rejected() {
    let app = TestApp::builder().build().await;

    let response = app
        .router
        .clone()
        .oneshot(upload_request(
            "/api/upload/esp32",
            &[text("port", "COM3"), file("notes.txt", b"hello")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Only .bit and .bin files are allowed"
    );
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn oversize_upload_is_payload_too_large() {
    let app = TestApp::builder().max_upload_bytes(16).build().await;
    let bitstream = fpga_bitstream();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(
            "/api/upload/fpga",
            &[text("port", "COM3"), file("design.bit", &bitstream)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.executor.invocations().is_empty());
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn missing_programmer_is_server_error_with_kind() {
    let app = TestApp::builder()
        .outcome(ProcessOutcome::SpawnFailed(SpawnFailure::NotFound))
        .build()
        .await;
    let image = esp_image();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(
            "/api/upload/esp32",
            &[text("port", "COM3"), file("app.bin", &image)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["kind"], "PROGRAMMER_NOT_INSTALLED");
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .starts_with("Command 'esptool.py' not found")
    );
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn non_zero_exit_is_server_error() {
    let app = TestApp::builder()
        .outcome(ProcessOutcome::completed(1, "", "JTAG chain broken"))
        .build()
        .await;
    let bitstream = fpga_bitstream();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(
            "/api/upload/fpga",
            &[text("port", "COM4"), file("design.bit", &bitstream)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["kind"], "PROGRAMMER_EXITED_NON_ZERO");
    assert_eq!(
        json["error"],
        "Failed to load firmware (exit code 1): JTAG chain broken"
    );
}

#[tokio::test]
async fn busy_port_is_conflict() {
    let app = TestApp::builder().build().await;
    let _held = app.orchestrator.leases().try_acquire("COM5").unwrap();
    let bitstream = fpga_bitstream();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(
            "/api/upload/fpga",
            &[text("port", "COM5"), file("design.bit", &bitstream)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["kind"], "PORT_BUSY");
    assert!(app.executor.invocations().is_empty());
}

#[tokio::test]
async fn mismatched_artifact_still_flashes_with_warning() {
    let app = TestApp::builder().build().await;
    let image = esp_image();

    let response = app
        .router
        .clone()
        .oneshot(upload_request(
            "/api/upload/fpga",
            &[text("port", "COM3"), file("oops.bin", &image)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["warning"].as_str().unwrap().contains("ESP32 firmware"));
    assert_eq!(app.executor.invocations().len(), 1);
}

#[tokio::test]
async fn non_multipart_body_is_bad_request() {
    let app = TestApp::builder().build().await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/fpga")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn ports_default_manufacturer_to_unknown() {
    let ftdi = SerialPortInfo {
        manufacturer: Some("FTDI".to_string()),
        vendor_id: Some("0403".to_string()),
        product_id: Some("6010".to_string()),
        ..SerialPortInfo::bare("/dev/ttyUSB0")
    };
    let app = TestApp::builder()
        .ports(Ok(vec![ftdi, SerialPortInfo::bare("/dev/ttyS0")]))
        .build()
        .await;

    let response = app.router.oneshot(get_request("/api/ports")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["ports"][0]["manufacturer"], "FTDI");
    assert_eq!(json["ports"][0]["vendorId"], "0403");
    assert_eq!(json["ports"][1]["path"], "/dev/ttyS0");
    assert_eq!(json["ports"][1]["manufacturer"], "Unknown");
}

#[tokio::test]
async fn port_enumeration_failure_is_server_error() {
    let app = TestApp::builder()
        .ports(Err(PortListError("permission denied".to_string())))
        .build()
        .await;

    let response = app.router.oneshot(get_request("/api/ports")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("permission denied"));
}
