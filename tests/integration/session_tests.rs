//! Integration tests for session provisioning
//!
//! A loopback listener stands in for the proxy's control port so the full
//! authenticate / signal / quit exchange runs over a real socket.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use veilcrawl::config::{parse_config, Config};
use veilcrawl::crawler::{CrawlLoop, HtmlCrawler};
use veilcrawl::session::SessionProvisioner;
use veilcrawl::VeilError;

/// Accepts control connections until dropped, accepting `password` only
async fn fake_control_port(password: &'static str) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut received = Vec::new();
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            received.push(line.clone());
            let reply = if line.starts_with("AUTHENTICATE") {
                if line == format!("AUTHENTICATE \"{}\"", password) {
                    "250 OK\r\n"
                } else {
                    "515 Authentication failed: Password did not match\r\n"
                }
            } else if line == "SIGNAL NEWNYM" {
                "250 OK\r\n"
            } else if line == "QUIT" {
                writer.write_all(b"250 closing connection\r\n").await.unwrap();
                break;
            } else {
                "510 Unrecognized command\r\n"
            };
            writer.write_all(reply.as_bytes()).await.unwrap();
        }
        received
    });

    (port, handle)
}

fn config_for(control_port: u16, credential: &str) -> Config {
    parse_config(&format!(
        r#"
[crawler]
delay-seconds = 0

[anonymizer]
proxy-endpoint = "socks5h://127.0.0.1:9050"
control-port = {}
credential = "{}"
control-timeout = 5

[identity]
pool = ["IntegrationAgent/1.0"]
"#,
        control_port, credential
    ))
    .unwrap()
}

#[tokio::test]
async fn test_create_session_through_control_port() {
    let (port, handle) = fake_control_port("s3cret").await;
    let provisioner = SessionProvisioner::from_config(&config_for(port, "s3cret")).unwrap();

    let session = provisioner.create_session().await.unwrap();

    assert_eq!(session.identity(), "IntegrationAgent/1.0");
    assert_eq!(session.proxy_endpoint(), Some("socks5h://127.0.0.1:9050"));

    let received = handle.await.unwrap();
    assert_eq!(
        received,
        vec!["AUTHENTICATE \"s3cret\"", "SIGNAL NEWNYM", "QUIT"]
    );
}

#[tokio::test]
async fn test_rejected_credential() {
    let (port, _handle) = fake_control_port("s3cret").await;
    let provisioner = SessionProvisioner::from_config(&config_for(port, "guess")).unwrap();

    let result = provisioner.create_session().await;

    assert!(matches!(result, Err(VeilError::Authentication(_))));
}

#[tokio::test]
async fn test_control_port_unreachable() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let provisioner = SessionProvisioner::from_config(&config_for(port, "s3cret")).unwrap();

    let result = provisioner.renew_identity().await;

    assert!(matches!(result, Err(VeilError::ControlChannel(_))));
}

#[tokio::test]
async fn test_crawl_aborts_when_identity_cannot_be_renewed() {
    let (port, _handle) = fake_control_port("s3cret").await;
    let config = config_for(port, "wrong");
    let provisioner = SessionProvisioner::from_config(&config).unwrap();
    let crawl_loop = CrawlLoop::new(
        vec!["https://example.com/".to_string()],
        config.crawler.clone(),
        provisioner,
    );

    let result = crawl_loop.crawl(&HtmlCrawler::new()).await;

    assert!(matches!(result, Err(VeilError::Authentication(_))));
}

#[tokio::test]
async fn test_empty_crawl_never_contacts_control_port() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = config_for(port, "s3cret");
    let provisioner = SessionProvisioner::from_config(&config).unwrap();
    let crawl_loop = CrawlLoop::new(Vec::new(), config.crawler.clone(), provisioner);

    let report = tokio::time::timeout(Duration::from_secs(5), crawl_loop.crawl(&HtmlCrawler::new()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.targets, 0);
    assert!(report.pages.is_empty());
}
