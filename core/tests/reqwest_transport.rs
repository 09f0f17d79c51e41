//! `ReqwestTransport` against the live mock sync server.
//!
//! Only built with `--features reqwest`.

#![cfg(feature = "reqwest")]

use std::time::Duration;

use todoist_core::items::{self, AddItem};
use todoist_core::{
    ApiError, CommandExecutor, HttpMethod, HttpRequest, ReqwestTransport, TempId, TodoistClient,
    Transport, TransportError,
};

/// Start the mock server on a random port and return its base URL.
async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

fn get(url: String) -> HttpRequest {
    HttpRequest {
        method: HttpMethod::Get,
        path: url,
        headers: Vec::new(),
        body: None,
    }
}

#[tokio::test]
async fn executes_batch_over_http() {
    let base_url = start_server().await;
    let executor = CommandExecutor::new(TodoistClient::new(&base_url), ReqwestTransport::default());

    let temp = TempId::new("t1");
    let report = executor
        .submit(vec![items::add(temp.clone(), &AddItem::new("Milk")).unwrap()])
        .await
        .unwrap();
    let id = report.resolve(&temp).unwrap().to_string();

    let response = executor
        .transport()
        .send(get(format!("{base_url}/items")))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    let items: Vec<mock_server::Item> = serde_json::from_str(&response.body).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, id);
}

#[tokio::test]
async fn response_headers_are_copied() {
    let base_url = start_server().await;
    let response = ReqwestTransport::default()
        .send(get(format!("{base_url}/projects")))
        .await
        .unwrap();

    let content_type = response
        .headers
        .iter()
        .find(|(name, _)| name == "content-type")
        .map(|(_, value)| value.as_str());
    assert_eq!(content_type, Some("application/json"));
}

#[tokio::test]
async fn error_status_is_a_response() {
    let base_url = start_server().await;
    let response = ReqwestTransport::default()
        .send(get(format!("{base_url}/nowhere")))
        .await
        .unwrap();
    assert_eq!(response.status, 404);

    // A malformed batch is rejected by the server, not by the transport.
    let request = HttpRequest {
        method: HttpMethod::Post,
        path: format!("{base_url}/sync"),
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(r#"[{"uuid":"u1"}]"#.to_string()),
    };
    let response = ReqwestTransport::default().send(request).await.unwrap();
    assert_eq!(response.status, 422);
}

#[tokio::test]
async fn silent_server_times_out() {
    // Accepts connections through the backlog but never answers.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let err = ReqwestTransport::new(client)
        .send(get(format!("http://{addr}/items")))
        .await
        .unwrap_err();

    assert_eq!(err, TransportError::Timeout);
    drop(listener);
}

#[tokio::test]
async fn unreachable_server_is_connection_error() {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let executor = CommandExecutor::new(
        TodoistClient::new(&format!("http://{addr}")),
        ReqwestTransport::default(),
    );

    let err = executor
        .submit(vec![items::add(TempId::new("t1"), &AddItem::new("Lost")).unwrap()])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(TransportError::Connection(_))));
}
