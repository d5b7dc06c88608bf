//! End-to-end tests of the client and kernel listeners over loopback TCP.

use serde_json::{json, Value};
use shieldrule::server::{serve_client, serve_kernel};
use shieldrule::{Classifier, Feature, Guard, Policy};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

struct Conn {
    lines: tokio::io::Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Conn {
    async fn open(addr: SocketAddr) -> Self {
        let (reader, writer) = TcpStream::connect(addr).await.unwrap().into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) -> Value {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        let reply = self.lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&reply).unwrap()
    }
}

async fn start(policy_path: Option<PathBuf>) -> (Guard, SocketAddr, SocketAddr) {
    let classifier = Arc::new(Classifier::default());
    classifier.refresh("||ads.example^\n@@||ok.ads.example^\n");
    let guard = Guard::new(Arc::new(Policy::new()), classifier);

    let client = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let kernel = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client_addr = client.local_addr().unwrap();
    let kernel_addr = kernel.local_addr().unwrap();

    tokio::spawn(serve_client(client, guard.clone(), policy_path));
    tokio::spawn(serve_kernel(kernel, guard.clone()));

    (guard, client_addr, kernel_addr)
}

#[tokio::test]
async fn test_client_toggles_drive_kernel_verdicts() {
    let (_guard, client_addr, kernel_addr) = start(None).await;
    let mut client = Conn::open(client_addr).await;
    let mut kernel = Conn::open(kernel_addr).await;

    let query = json!({ "domain": "tracker.ads.example" }).to_string();
    assert_eq!(kernel.send(&query).await, json!({ "block": false }));

    let reply = client
        .send(&json!({ "code": "50", "content": "on", "operation": "50" }).to_string())
        .await;
    assert_eq!(reply["code"], "100");

    assert_eq!(kernel.send(&query).await, json!({ "block": true }));
    let excepted = json!({ "domain": "ok.ads.example" }).to_string();
    assert_eq!(kernel.send(&excepted).await, json!({ "block": false }));
}

#[tokio::test]
async fn test_invalid_json_keeps_connection_open() {
    let (_guard, client_addr, _) = start(None).await;
    let mut client = Conn::open(client_addr).await;

    let reply = client.send("this is not json").await;
    assert_eq!(reply, json!({ "code": "101", "content": "Invalid JSON format." }));

    let reply = client.send(&json!({ "code": "54" }).to_string()).await;
    assert_eq!(reply["code"], "100");
    assert_eq!(reply["content"]["domains"], json!([]));
}

#[tokio::test]
async fn test_mutations_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.json");
    let (guard, client_addr, kernel_addr) = start(Some(path.clone())).await;

    let mut client = Conn::open(client_addr).await;
    let reply = client
        .send(&json!({ "code": "52", "content": "example.com", "operation": "52" }).to_string())
        .await;
    assert_eq!(reply["content"]["message"], "Domain has been successfully blocked.");

    let mut kernel = Conn::open(kernel_addr).await;
    let reply = kernel.send(&json!({ "domain": "example.com" }).to_string()).await;
    assert_eq!(reply, json!({ "block": true }));

    // The save finishes before the response is written
    let saved = Policy::load(&path).unwrap();
    assert!(saved.is_manually_blocked("www.example.com"));
    assert!(!saved.is_enabled(Feature::AdBlock));
    assert_eq!(saved.snapshot().domains, guard.policy().blocked_domains());
}
