use super::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one connection: send `reply` verbatim, optionally close the write
/// side, then hold the socket until the client goes away
async fn raw_server(reply: Vec<u8>, close_after_reply: bool) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await;

        socket.write_all(&reply).await.unwrap();
        socket.flush().await.unwrap();
        if close_after_reply {
            socket.shutdown().await.ok();
        }
        let _ = socket.read(&mut request).await;
    });

    addr
}

/// A response that promises `promised` bytes but only carries `sent`
fn short_response(promised: usize, sent: usize) -> Vec<u8> {
    let mut reply = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: video/mpeg\r\nContent-Length: {}\r\n\r\n",
        promised
    )
    .into_bytes();
    reply.extend(vec![0x47u8; sent]);
    reply
}

/// Send `sent` of `promised` bytes, then hang up
async fn hang_up_server(promised: usize, sent: usize) -> String {
    let addr = raw_server(short_response(promised, sent), true).await;
    format!("http://{}/11.ts", addr)
}

#[tokio::test]
async fn test_device_hanging_up_counts_as_completion() {
    let uri = hang_up_server(10_000, 4_000).await;
    let (engine, dir) = create_test_engine(
        vec![folder("10", "News"), video("11", "10", "Tonight", uri, 10_000)],
        false,
    );
    let mut rx = engine.subscribe();

    let outcomes = engine
        .run(DownloadQueue::from_iter(["11"]), CancellationToken::new())
        .await;

    assert!(outcomes[0].is_completed(), "unexpected outcome {:?}", outcomes[0]);
    let saved = std::fs::read(dir.path().join("News Tonight.tts")).unwrap();
    assert_eq!(saved.len(), 4_000);

    let events = drain(&mut rx);
    assert!(!events.iter().any(|e| matches!(e, Event::Failed { .. })));
    assert!(matches!(
        events.last().unwrap(),
        Event::QueueFinished { completed: 1, failed: 0 }
    ));
}

#[tokio::test]
async fn test_connection_refused_fails_item() {
    // bind then drop to get a port nothing listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let (engine, _dir) = create_test_engine(
        vec![
            folder("10", "News"),
            video("11", "10", "Tonight", format!("http://{}/11.ts", addr), 100),
        ],
        false,
    );

    let outcomes = engine
        .run(DownloadQueue::from_iter(["11"]), CancellationToken::new())
        .await;

    assert!(matches!(
        &outcomes[0],
        DownloadOutcome::Failed { stage: Stage::Streaming, .. }
    ));
}

#[tokio::test]
async fn test_progress_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 2048]))
        .mount(&server)
        .await;

    let (engine, _dir) = create_test_engine(
        vec![
            folder("10", "News"),
            video("11", "10", "Tonight", format!("{}/11.ts", server.uri()), 2048),
        ],
        false,
    );
    let mut rx = engine.subscribe();

    engine
        .run(DownloadQueue::from_iter(["11"]), CancellationToken::new())
        .await;

    let last_progress = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            Event::Progress { report, .. } => Some(report),
            _ => None,
        })
        .last()
        .unwrap();
    assert_eq!(last_progress.received, 2048);
    assert_eq!(last_progress.total, 2048);
}

#[tokio::test]
async fn test_invalid_uri_is_rejected_before_opening_file() {
    let (engine, dir) = create_test_engine(
        vec![
            folder("10", "News"),
            video("11", "10", "Tonight", "not a uri".into(), 100),
        ],
        false,
    );

    let outcomes = engine
        .run(DownloadQueue::from_iter(["11"]), CancellationToken::new())
        .await;

    assert!(matches!(
        &outcomes[0],
        DownloadOutcome::Failed { stage: Stage::MetadataFetching, error, .. } if error.contains("invalid media URI")
    ));
    assert!(!dir.path().join("News Tonight.tts").exists());
}

#[tokio::test]
async fn test_corrupt_body_fails_item_and_queue_continues() {
    let corrupt = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nGGGG\r\nzz\r\n".to_vec();
    let addr = raw_server(corrupt, false).await;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/12.ts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x47u8; 64]))
        .mount(&server)
        .await;

    let (engine, dir) = create_test_engine(
        vec![
            folder("10", "News"),
            video("11", "10", "Tonight", format!("http://{}/11.ts", addr), 1000),
            video("12", "10", "Late", format!("{}/12.ts", server.uri()), 64),
        ],
        false,
    );

    let outcomes = engine
        .run(DownloadQueue::from_iter(["11", "12"]), CancellationToken::new())
        .await;

    assert_eq!(outcomes.len(), 2);
    assert!(
        matches!(
            &outcomes[0],
            DownloadOutcome::Failed { id, stage: Stage::Streaming, error } if id == "11" && error.contains("transfer failed")
        ),
        "unexpected outcome {:?}",
        outcomes[0]
    );
    assert!(outcomes[1].is_completed());
    assert_eq!(std::fs::read(dir.path().join("News Late.tts")).unwrap().len(), 64);
}

#[tokio::test]
async fn test_cancel_mid_transfer_reports_bytes_written() {
    // promises more than it sends and never closes, so the transfer stalls
    let addr = raw_server(short_response(10_000, 4_000), false).await;
    let (engine, dir) = create_test_engine(
        vec![
            folder("10", "News"),
            video("11", "10", "Tonight", format!("http://{}/11.ts", addr), 10_000),
        ],
        false,
    );
    let mut rx = engine.subscribe();
    let cancel = CancellationToken::new();

    let runner = {
        let engine = engine.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { engine.run(DownloadQueue::from_iter(["11"]), cancel).await })
    };

    loop {
        if let Event::Transferring { .. } = rx.recv().await.unwrap() {
            break;
        }
    }
    tokio::time::sleep(Duration::from_millis(300)).await;
    cancel.cancel();

    let outcomes = runner.await.unwrap();
    assert_eq!(
        outcomes,
        vec![DownloadOutcome::Cancelled {
            id: "11".into(),
            written: 4_000
        }]
    );
    let partial = std::fs::read(dir.path().join("News Tonight.tts")).unwrap();
    assert_eq!(partial.len(), 4_000);
}
