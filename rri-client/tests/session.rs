//! Session tests against an in-process mock RRI server.

use rri_client::{Client, ClientError, ConnectionConfig, Direction, SessionState};
use rri_protocol::{censor, read_frame, write_frame, Action, FrameError, Query};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const USER: &str = "DENIC-1000011-RRI";
const PASSWORD: &str = "secret-password";
/// DELETE replies arrive this late.
const SLOW_REPLY: Duration = Duration::from_millis(200);

struct MockServer {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = received.clone();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let log = log.clone();
                tokio::spawn(async move {
                    while let Ok(request) = read_frame(&mut socket).await {
                        log.lock().unwrap().push(request.clone());
                        match reply_to(&request) {
                            Some(reply) => {
                                if request.contains("action: DELETE") {
                                    tokio::time::sleep(SLOW_REPLY).await;
                                }
                                if write_frame(&mut socket, &reply).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                });
            }
        });

        Self { addr, received }
    }

    fn config(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.addr.to_string())
    }

    fn count(&self, action: &str) -> usize {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.contains(&format!("action: {}", action)))
            .count()
    }
}

fn reply_to(request: &str) -> Option<String> {
    let query = Query::parse(request).unwrap();
    let reply = match query.action() {
        Some(Action::Login) => {
            if query.get("user") == Some(USER) && query.get("password") == Some(PASSWORD) {
                "RESULT: success\nSTID: login-1".to_string()
            } else {
                "RESULT: failed\nSTID: login-2\nERROR: 53000100 Login failed".to_string()
            }
        }
        Some(Action::Check) => {
            let domain = query.get("domain").unwrap_or_default();
            if domain.ends_with(".de") {
                format!("RESULT: success\nINFO: 83000000 Domain is free\ndomain: {}\nstatus: free", domain)
            } else {
                "RESULT: failed\nERROR: 53000000 Invalid domain".to_string()
            }
        }
        Some(Action::Delete) | Some(Action::Info) => format!(
            "RESULT: success\ndomain: {}",
            query.get("domain").unwrap_or_default()
        ),
        Some(Action::Other(name)) if name == "BROKEN" => "this is not a response".to_string(),
        Some(Action::Other(name)) if name == "HANGUP" => return None,
        _ => "RESULT: success".to_string(),
    };
    Some(reply)
}

#[tokio::test]
async fn test_login_success_and_logout_on_close() {
    let server = MockServer::start().await;
    let client = Client::connect(server.config()).await.unwrap();
    assert_eq!(client.state(), SessionState::Connected);

    client.login(USER, PASSWORD).await.unwrap();
    assert_eq!(client.state(), SessionState::Authenticated);
    assert!(client.is_authenticated());

    let response = client
        .send_query(&Query::check_domain("denic.de"))
        .await
        .unwrap();
    assert!(response.is_successful());
    assert_eq!(response.field("status"), Some("free"));

    client.close().await.unwrap();
    assert_eq!(client.state(), SessionState::Closed);
    assert_eq!(server.count("LOGOUT"), 1);
}

#[tokio::test]
async fn test_login_failure_keeps_state() {
    let server = MockServer::start().await;
    let client = Client::connect(server.config()).await.unwrap();

    let err = client.login(USER, "wrong").await.unwrap_err();
    match &err {
        ClientError::QueryFailed { action, message } => {
            assert_eq!(action, "LOGIN");
            assert_eq!(message, "53000100 Login failed");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!err.is_fatal());
    assert_eq!(client.state(), SessionState::Connected);

    // still usable after a rejected login
    let response = client
        .send_query(&Query::check_domain("denic.de"))
        .await
        .unwrap();
    assert!(response.is_successful());

    client.close().await.unwrap();
    assert_eq!(server.count("LOGOUT"), 0);
}

#[tokio::test]
async fn test_close_twice() {
    let server = MockServer::start().await;
    let client = Client::connect(server.config()).await.unwrap();
    client.login(USER, PASSWORD).await.unwrap();

    client.close().await.unwrap();
    client.close().await.unwrap();

    assert_eq!(server.count("LOGOUT"), 1);
    assert!(client.is_closed());
}

#[tokio::test]
async fn test_query_after_close() {
    let server = MockServer::start().await;
    let client = Client::connect(server.config()).await.unwrap();
    client.close().await.unwrap();

    let result = client.send_query(&Query::check_domain("denic.de")).await;
    assert!(matches!(result, Err(ClientError::Closed)));
}

#[tokio::test]
async fn test_failed_query_is_still_a_response() {
    let server = MockServer::start().await;
    let client = Client::connect(server.config()).await.unwrap();

    let response = client
        .send_query(&Query::check_domain("invalid"))
        .await
        .unwrap();
    assert!(!response.is_successful());
    assert_eq!(
        response.error_message().as_deref(),
        Some("53000000 Invalid domain")
    );

    let err = client
        .execute(&Query::check_domain("invalid"))
        .await
        .unwrap_err();
    assert_eq!(err.server_message(), Some("53000000 Invalid domain"));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_observer_sees_raw_traffic() {
    let server = MockServer::start().await;
    let seen: Arc<Mutex<Vec<(Direction, String)>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    let client = Client::connect_with_observer(
        server.config(),
        Arc::new(move |direction: Direction, raw: &str| sink.lock().unwrap().push((direction, raw.to_string()))),
    )
    .await
    .unwrap();

    client.login(USER, PASSWORD).await.unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, Direction::Outbound);
    assert!(seen[0].1.contains(PASSWORD));
    assert!(censor(&seen[0].1).contains("password: ******"));
    assert_eq!(seen[1], (Direction::Inbound, "RESULT: success\nSTID: login-1".to_string()));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_malformed_response_is_protocol_error() {
    let server = MockServer::start().await;
    let client = Client::connect(server.config()).await.unwrap();

    let result = client
        .send_query(&Query::new(Action::Other("BROKEN".to_string())))
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, ClientError::Protocol(_)));
    assert!(err.is_fatal());
    assert_eq!(client.state(), SessionState::Closed);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_server_hangup_is_framing_error() {
    let server = MockServer::start().await;
    let client = Client::connect(server.config()).await.unwrap();

    let result = client
        .send_query(&Query::new(Action::Other("HANGUP".to_string())))
        .await;
    assert!(matches!(
        result,
        Err(ClientError::Framing(FrameError::ConnectionClosed { expected: 4 }))
    ));
    assert!(client.is_closed());

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_batch_stops_at_first_failure() {
    let server = MockServer::start().await;
    let client = Client::connect(server.config()).await.unwrap();

    let queries = vec![
        Query::check_domain("a.de"),
        Query::check_domain("broken"),
        Query::check_domain("b.de"),
    ];
    let mut seen = Vec::new();
    let err = client
        .run_batch(&queries, |index, _, response| {
            seen.push((index, response.field("domain").map(str::to_string)))
        })
        .await
        .unwrap_err();

    assert_eq!(err.index, 1);
    assert!(matches!(err.source, ClientError::QueryFailed { .. }));
    assert_eq!(seen, vec![(0, Some("a.de".to_string()))]);
    assert_eq!(server.count("CHECK"), 2);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_batch_runs_all() {
    let server = MockServer::start().await;
    let client = Client::connect(server.config()).await.unwrap();

    let queries = vec![Query::check_domain("a.de"), Query::check_domain("b.de")];
    let executed = client.run_batch(&queries, |_, _, _| {}).await.unwrap();
    assert_eq!(executed, 2);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_callers_are_serialized() {
    let server = MockServer::start().await;
    let client = Arc::new(Client::connect(server.config()).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..8 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let domain = format!("domain-{}.de", i);
            let response = client.execute(&Query::check_domain(&domain)).await.unwrap();
            assert_eq!(response.field("domain"), Some(domain.as_str()));
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(server.count("CHECK"), 8);
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_timeout_drops_session() {
    let server = MockServer::start().await;
    let config = server
        .config()
        .with_request_timeout(Some(Duration::from_millis(100)));
    let client = Client::connect(config).await.unwrap();
    client.login(USER, PASSWORD).await.unwrap();

    let result = client.send_query(&Query::delete_domain("first.de")).await;
    assert!(matches!(result, Err(ClientError::Timeout)));
    assert_eq!(client.state(), SessionState::Closed);

    // the late DELETE reply must never be read as the answer to this one
    let result = client.send_query(&Query::info_domain("second.de")).await;
    assert!(matches!(result, Err(ClientError::Closed)));

    client.close().await.unwrap();
    tokio::time::sleep(SLOW_REPLY).await;
    assert_eq!(server.count("INFO"), 0);
    assert_eq!(server.count("LOGOUT"), 0);
}

#[tokio::test]
async fn test_fatal_batch_error_closes_session() {
    let server = MockServer::start().await;
    let client = Client::connect(server.config()).await.unwrap();
    client.login(USER, PASSWORD).await.unwrap();

    let queries = vec![
        Query::check_domain("a.de"),
        Query::new(Action::Other("HANGUP".to_string())),
        Query::check_domain("b.de"),
    ];
    let err = client.run_batch(&queries, |_, _, _| {}).await.unwrap_err();

    assert_eq!(err.index, 1);
    assert!(err.source.is_fatal());
    assert!(client.is_closed());
    assert!(matches!(
        client.send_query(&Query::check_domain("c.de")).await,
        Err(ClientError::Closed)
    ));

    client.close().await.unwrap();
    assert_eq!(server.count("CHECK"), 1);
    assert_eq!(server.count("LOGOUT"), 0);
}
