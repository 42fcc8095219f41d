// Mock Home Assistant websocket endpoint for control channel tests
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const TOKEN: &str = "supervisor-token";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SaveReply {
    Accept,
    Reject,
    /// Never answer the save command
    Ignore,
}

#[derive(Debug, Clone)]
pub struct Behavior {
    pub save_reply: SaveReply,
    /// `lovelace_updated` events pushed right after a subscription
    pub events_after_subscribe: usize,
    /// Drop the connection once those events are sent
    pub close_after_events: bool,
    /// Answer `subscribe_events` with a failed result
    pub reject_subscribe: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            save_reply: SaveReply::Accept,
            events_after_subscribe: 0,
            close_after_events: false,
            reject_subscribe: false,
        }
    }
}

pub struct MockHomeAssistant {
    pub url: String,
    received: Arc<Mutex<Vec<Value>>>,
    connections: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MockHomeAssistant {
    pub async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/api/websocket", listener.local_addr().unwrap());
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let handle = {
            let received = received.clone();
            let connections = connections.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(handle_connection(
                        stream,
                        behavior.clone(),
                        received.clone(),
                    ));
                }
            })
        };

        Self {
            url,
            received,
            connections,
            handle,
        }
    }

    /// Client messages of the given type, in arrival order
    pub fn received(&self, message_type: &str) -> Vec<Value> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m["type"] == message_type)
            .cloned()
            .collect()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockHomeAssistant {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn send(ws: &mut tokio_tungstenite::WebSocketStream<TcpStream>, value: Value) -> bool {
    ws.send(Message::Text(value.to_string())).await.is_ok()
}

async fn handle_connection(stream: TcpStream, behavior: Behavior, received: Arc<Mutex<Vec<Value>>>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };
    if !send(&mut ws, json!({"type": "auth_required", "ha_version": "2024.10.0"})).await {
        return;
    }

    while let Some(Ok(frame)) = ws.next().await {
        let Message::Text(text) = frame else {
            continue;
        };
        let message: Value = serde_json::from_str(&text).unwrap();
        received.lock().unwrap().push(message.clone());

        match message["type"].as_str() {
            Some("auth") if message["access_token"] == TOKEN => {
                send(&mut ws, json!({"type": "auth_ok", "ha_version": "2024.10.0"})).await;
            }
            Some("auth") => {
                send(&mut ws, json!({"type": "auth_invalid", "message": "Invalid access token or password"})).await;
                return;
            }
            Some("subscribe_events") if behavior.reject_subscribe => {
                let id = message["id"].clone();
                send(&mut ws, json!({"id": id, "type": "result", "success": false,
                    "error": {"code": "unauthorized", "message": "Unauthorized"}})).await;
            }
            Some("subscribe_events") => {
                let id = message["id"].clone();
                send(&mut ws, json!({"id": id, "type": "result", "success": true, "result": null})).await;
                for _ in 0..behavior.events_after_subscribe {
                    send(
                        &mut ws,
                        json!({"id": id, "type": "event", "event": {
                            "event_type": "lovelace_updated",
                            "data": {"url_path": "dashboard-main", "mode": "storage"},
                            "origin": "LOCAL"
                        }}),
                    )
                    .await;
                }
                if behavior.close_after_events {
                    return;
                }
            }
            Some("lovelace/config/save") => {
                let id = message["id"].clone();
                match behavior.save_reply {
                    SaveReply::Accept => {
                        send(&mut ws, json!({"id": id, "type": "result", "success": true, "result": null})).await;
                    }
                    SaveReply::Reject => {
                        send(&mut ws, json!({"id": id, "type": "result", "success": false,
                            "error": {"code": "home_assistant_error", "message": "Config is read-only"}})).await;
                    }
                    SaveReply::Ignore => {}
                }
            }
            _ => {}
        }
    }
}
