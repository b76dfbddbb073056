//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! End-to-end tests for the Netline server over real loopback sockets

use netline_message::Message;
use netline_server::{ClientId, Server, ServerConfig, ServerEvent};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

async fn start_server() -> Server {
    Server::start(ServerConfig::new(0)).await.unwrap()
}

async fn connect(server: &Server) -> TcpStream {
    TcpStream::connect(("127.0.0.1", server.listen_port()))
        .await
        .unwrap()
}

/// Wait for a specific event, skipping nothing: the next event must match.
async fn expect_event(server: &Server, expected: ServerEvent) {
    let event = timeout(Duration::from_secs(2), server.wait_event())
        .await
        .expect("event should arrive");
    assert_eq!(event, expected);
}

async fn read_message(reader: &mut BufReader<TcpStream>) -> Message {
    let mut line = String::new();
    timeout(Duration::from_secs(2), reader.read_line(&mut line))
        .await
        .expect("line should arrive")
        .unwrap();
    Message::decode(line.trim_end()).unwrap()
}

#[tokio::test]
async fn test_client_ids_are_sequential_in_acceptance_order() {
    let server = start_server().await;

    let mut peers = Vec::new();
    for n in 1..=4u64 {
        peers.push(connect(&server).await);
        expect_event(&server, ServerEvent::NewClient(ClientId::new(n))).await;
    }

    // Ids are never reused, even after a disconnect.
    drop(peers.remove(0));
    expect_event(&server, ServerEvent::ClientDisconnected(ClientId::new(1))).await;

    peers.push(connect(&server).await);
    expect_event(&server, ServerEvent::NewClient(ClientId::new(5))).await;

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_two_clients_emit_new_client_in_order() {
    let server = start_server().await;

    let _c1 = connect(&server).await;
    expect_event(&server, ServerEvent::NewClient(ClientId::new(1))).await;
    let _c2 = connect(&server).await;
    expect_event(&server, ServerEvent::NewClient(ClientId::new(2))).await;

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_poll_event_is_bounded_when_idle() {
    let server = start_server().await;

    let start = Instant::now();
    assert_eq!(server.poll_event().await, ServerEvent::NoNewEvents);
    assert!(start.elapsed() < Duration::from_secs(2));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_inbound_message_surfaces_with_payload() {
    let server = start_server().await;

    let mut peer = connect(&server).await;
    expect_event(&server, ServerEvent::NewClient(ClientId::new(1))).await;

    peer.write_all(b"{\"op\":\"ping\"}\n").await.unwrap();

    match timeout(Duration::from_secs(2), server.wait_event())
        .await
        .unwrap()
    {
        ServerEvent::NewMessage(id, message) => {
            assert_eq!(id, ClientId::new(1));
            assert_eq!(message.get_str("op"), Some("ping"));
        }
        other => panic!("expected NewMessage, got {:?}", other),
    }

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_heartbeat_frame_never_surfaces_as_message() {
    let server = start_server().await;

    let mut peer = connect(&server).await;
    expect_event(&server, ServerEvent::NewClient(ClientId::new(1))).await;

    let frame = Message::heartbeat().encode().unwrap();
    peer.write_all(format!("{}\n", frame).as_bytes())
        .await
        .unwrap();
    peer.write_all(b"{\"real\":1}\n").await.unwrap();

    // The heartbeat is consumed; the next event is the application message.
    match timeout(Duration::from_secs(2), server.wait_event())
        .await
        .unwrap()
    {
        ServerEvent::NewMessage(_, message) => assert!(message.contains_key("real")),
        other => panic!("expected NewMessage, got {:?}", other),
    }

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_round_trip_message_decodes_equal() {
    let server = start_server().await;

    let peer = connect(&server).await;
    expect_event(&server, ServerEvent::NewClient(ClientId::new(1))).await;

    let original = Message::new().with("a", 1.0).with("b", 2.0).with("op", "+");
    server.send_to_client(ClientId::new(1), original.clone());

    let mut reader = BufReader::new(peer);
    let received = read_message(&mut reader).await;
    assert_eq!(received, original);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_silent_client_receives_heartbeat_and_stays_connected() {
    let server = Server::start(
        ServerConfig::new(0).with_heartbeat_timeout(Some(Duration::from_millis(200))),
    )
    .await
    .unwrap();

    let peer = connect(&server).await;
    expect_event(&server, ServerEvent::NewClient(ClientId::new(1))).await;

    // A client that sends nothing gets a heartbeat within ~2 intervals.
    let mut reader = BufReader::new(peer);
    let start = Instant::now();
    let frame = read_message(&mut reader).await;
    assert!(frame.is_heartbeat());
    assert!(start.elapsed() < Duration::from_millis(600));

    // The connection stays open: no disconnect event follows.
    assert_eq!(server.poll_event().await, ServerEvent::NoNewEvents);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_broadcast_reaches_all_connected_clients_only() {
    let server = start_server().await;

    let mut peers = Vec::new();
    for n in 1..=3u64 {
        peers.push(BufReader::new(connect(&server).await));
        expect_event(&server, ServerEvent::NewClient(ClientId::new(n))).await;
    }

    // A fourth client connects and immediately disconnects.
    let fourth = connect(&server).await;
    expect_event(&server, ServerEvent::NewClient(ClientId::new(4))).await;
    drop(fourth);
    expect_event(&server, ServerEvent::ClientDisconnected(ClientId::new(4))).await;

    let payload = Message::new().with("msg", "hi");
    server.broadcast(payload.clone());

    for reader in &mut peers {
        assert_eq!(read_message(reader).await, payload);
    }

    // The departed client caused no error and no further events.
    assert_eq!(server.poll_event().await, ServerEvent::NoNewEvents);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_disconnect_client_emits_exactly_one_event_and_send_is_noop() {
    let server = start_server().await;

    let peer = connect(&server).await;
    expect_event(&server, ServerEvent::NewClient(ClientId::new(1))).await;

    server.disconnect_client(ClientId::new(1));
    expect_event(&server, ServerEvent::ClientDisconnected(ClientId::new(1))).await;

    // Peer observes the close as EOF.
    let mut reader = BufReader::new(peer);
    let mut line = String::new();
    let read = timeout(Duration::from_secs(2), reader.read_line(&mut line))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(read, 0, "peer should see EOF");

    // A later send to the retired id is a silent no-op; no duplicate
    // disconnect event appears.
    server.send_to_client(ClientId::new(1), Message::new().with("msg", "late"));
    assert_eq!(server.poll_event().await, ServerEvent::NoNewEvents);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_disconnect_all_closes_every_session() {
    let server = start_server().await;

    let mut peers = Vec::new();
    for n in 1..=3u64 {
        peers.push(connect(&server).await);
        expect_event(&server, ServerEvent::NewClient(ClientId::new(n))).await;
    }
    drop(peers);
    // Drain the hangup disconnects before testing disconnect_all itself.
    for _ in 0..3 {
        match timeout(Duration::from_secs(2), server.wait_event())
            .await
            .unwrap()
        {
            ServerEvent::ClientDisconnected(_) => {}
            other => panic!("expected ClientDisconnected, got {:?}", other),
        }
    }

    let _held = connect(&server).await;
    expect_event(&server, ServerEvent::NewClient(ClientId::new(4))).await;

    server.disconnect_all();
    expect_event(&server, ServerEvent::ClientDisconnected(ClientId::new(4))).await;

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_leaves_existing_sessions_alive() {
    let server = start_server().await;
    let port = server.listen_port();

    let mut peer = connect(&server).await;
    expect_event(&server, ServerEvent::NewClient(ClientId::new(1))).await;

    server.stop().await.unwrap();

    // New connections are no longer accepted as sessions...
    tokio::time::sleep(Duration::from_millis(100)).await;
    if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
        // Backlog artifacts aside, no NewClient event may appear.
        assert_eq!(server.poll_event().await, ServerEvent::NoNewEvents);
    }

    // ...but the established session still exchanges messages.
    peer.write_all(b"{\"still\":\"here\"}\n").await.unwrap();
    match timeout(Duration::from_secs(2), server.wait_event())
        .await
        .unwrap()
    {
        ServerEvent::NewMessage(id, message) => {
            assert_eq!(id, ClientId::new(1));
            assert_eq!(message.get_str("still"), Some("here"));
        }
        other => panic!("expected NewMessage, got {:?}", other),
    }
}
