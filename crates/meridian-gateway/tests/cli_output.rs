//! The binary's stdout carries only the command's JSON; logs go to stderr.

use std::path::Path;
use std::process::Output;

use serde_json::{json, Value};
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn service(title: &str, route: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "openapi": "3.0.0",
            "info": { "title": title, "version": "1.0.0" },
            "paths": { route: { "get": { "operationId": "list" } } }
        })))
        .mount(&server)
        .await;
    server
}

fn write_config(dir: &Path, services: &[(&str, &MockServer)]) -> std::path::PathBuf {
    let mut toml = String::from("[telemetry.logging]\nlevel = \"info\"\nformat = \"json\"\n");
    for (name, server) in services {
        toml.push_str(&format!(
            "\n[[discovery.services]]\nid = \"1\"\nname = \"{name}\"\nhost = \"127.0.0.1\"\nhttp_port = {}\n",
            server.address().port()
        ));
    }
    let path = dir.join("gateway.toml");
    std::fs::write(&path, toml).unwrap();
    path
}

async fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_meridian-gateway"))
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_discover_stdout_is_json() {
    let users = service("User Service", "/users").await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &[("users", &users)]);

    let output = run(dir.path(), &["discover", "-c", config.to_str().unwrap()]).await;

    assert!(output.status.success());
    let routes: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(routes.as_array().unwrap().len(), 1);
    assert_eq!(routes[0]["path"], "/users");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Starting Meridian gateway"));
}

#[tokio::test]
async fn test_merge_stdout_is_json() {
    let users = service("User Service", "/users").await;
    let orders = service("Order Service", "/orders").await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &[("users", &users), ("orders", &orders)]);

    let output = run(dir.path(), &["merge", "--config", config.to_str().unwrap()]).await;

    assert!(output.status.success());
    let merged: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(merged["paths"].get("/users").is_some());
    assert!(merged["paths"].get("/orders").is_some());
}
