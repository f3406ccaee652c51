//! Live result stream
//!
//! `GET /ws` upgrades to a WebSocket that receives every relayed prediction
//! response as a text frame, from connect until the client closes. Messages
//! from the client are ignored.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

/// Stream connection state
pub struct StreamState {
    pub results: broadcast::Sender<String>,
}

impl StreamState {
    pub fn new(results: broadcast::Sender<String>) -> Self {
        StreamState { results }
    }
}

/// Handle WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<StreamState>>) -> Response {
    let results = state.results.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, results))
}

async fn handle_socket(socket: WebSocket, mut results: broadcast::Receiver<String>) {
    let (mut sender, mut receiver) = socket.split();
    log::info!("Stream client connected");

    let send_task = tokio::spawn(async move {
        loop {
            match results.recv().await {
                Ok(msg) => {
                    if sender.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Stream client lagging, skipped {} results", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    // Dropping the subscription tells the relay this client is gone
    send_task.abort();
    log::info!("Stream client disconnected");
}

/// Create the stream router
pub fn stream_router(results: broadcast::Sender<String>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(Arc::new(StreamState::new(results)))
}

/// Serve the stream on `bind` until `shutdown` resolves
pub async fn serve_stream<F>(
    bind: &str,
    results: broadcast::Sender<String>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("Streaming results on ws://{}/ws", listener.local_addr()?);
    axum::serve(listener, stream_router(results))
        .with_graceful_shutdown(shutdown)
        .await
}
