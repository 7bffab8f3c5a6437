//! Worker pool behavior under simultaneous clients.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{local_config, RecordingHandler};
use framed_listener::{FrameClient, FrameServer};
use tokio::sync::Barrier;
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_workers_serve_connections_in_parallel() {
    const CLIENTS: usize = 4;

    // every handler blocks until all four are inside it at once
    let barrier = Arc::new(Barrier::new(CLIENTS));
    let handler = RecordingHandler::new().with_barrier(barrier);
    let recorded = handler.recorded.clone();
    let server = FrameServer::new(local_config(CLIENTS), handler).unwrap();
    let addr = server.start().await.unwrap();

    let mut tasks = JoinSet::new();
    for i in 0..CLIENTS {
        tasks.spawn(async move {
            let mut client = FrameClient::connect(addr).await.unwrap();
            let payload = format!("client-{i}");
            let reply = client.request(payload.as_bytes()).await.unwrap();
            assert_eq!(reply, payload.as_bytes());
        });
    }

    let all_served = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(res) = tasks.join_next().await {
            res.unwrap();
        }
    })
    .await;
    assert!(all_served.is_ok(), "handlers did not run concurrently");

    assert_eq!(recorded.calls(), CLIENTS);
    let mut payloads = recorded.payloads();
    payloads.sort();
    let mut expected: Vec<Vec<u8>> = (0..CLIENTS)
        .map(|i| format!("client-{i}").into_bytes())
        .collect();
    expected.sort();
    assert_eq!(payloads, expected);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_excess_connections_are_delayed_not_dropped() {
    const CLIENTS: usize = 3;
    let delay = Duration::from_millis(150);

    let handler = RecordingHandler::new().with_delay(delay);
    let recorded = handler.recorded.clone();
    let server = FrameServer::new(local_config(1), handler).unwrap();
    let addr = server.start().await.unwrap();

    let started = Instant::now();
    let mut tasks = JoinSet::new();
    for i in 0..CLIENTS {
        tasks.spawn(async move {
            let mut client = FrameClient::connect(addr).await.unwrap();
            let reply = client.request(&[i as u8]).await.unwrap();
            assert_eq!(&reply[..], &[i as u8]);
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    // a single worker serves them one after another
    assert!(started.elapsed() >= delay * CLIENTS as u32);
    assert_eq!(recorded.calls(), CLIENTS);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_clients_with_varied_payload_sizes() {
    let handler = RecordingHandler::new();
    let recorded = handler.recorded.clone();
    let server = FrameServer::new(local_config(8), handler).unwrap();
    let addr = server.start().await.unwrap();

    let mut tasks = JoinSet::new();
    for i in 0..64usize {
        tasks.spawn(async move {
            let mut client = FrameClient::connect(addr).await.unwrap();
            let payload = vec![(i & 0xFF) as u8; i * 97];
            let reply = client.request(&payload).await.unwrap();
            assert_eq!(reply.len(), payload.len());
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    assert_eq!(recorded.calls(), 64);
    assert_eq!(server.metrics().snapshot().frames_received, 64);

    server.stop().await;
    assert_eq!(server.active_workers(), 0);
}
