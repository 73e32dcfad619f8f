use crate::machine_logic::config::Config;
use crate::machine_logic::model::{ClientMessage, ServerMessage};
use crate::machine_logic::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use futures_util::StreamExt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

static NEXT_CLIENT_ID: AtomicUsize = AtomicUsize::new(1);

pub async fn run(config: Config, app_state: AppState, mut shutdown: broadcast::Receiver<()>) {
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    tracing::info!("Subscriber server listening on {}", addr);

    if let (Some(cert_path), Some(key_path)) =
        (config.tls_cert_path.clone(), config.tls_key_path.clone())
    {
        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .expect("Failed to load TLS configuration");

        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
            .unwrap();
    } else {
        let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.recv().await.ok();
                tracing::info!("Subscriber server shutting down.");
            })
            .await
            .unwrap();
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn health_handler() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "OK")
}

/// One task per subscriber: Connecting -> Authenticating -> Subscribed
/// -> Closed, folded into a single select loop over inbound messages,
/// the push tick and process shutdown.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    tracing::info!("Client {} connected", client_id);

    let mut shutdown = state.shutdown_tx.subscribe();

    // Initial full snapshot, pushed before any inbound traffic. Display
    // access is unauthenticated; only on-demand queries need a token.
    if send_snapshot(&mut socket, &state).await.is_err() {
        tracing::info!("Client {} disconnected", client_id);
        return;
    }

    let mut authenticated: Option<String> = None;

    // First periodic push lands one interval after the initial snapshot
    let mut push_tick = tokio::time::interval_at(
        tokio::time::Instant::now() + state.push_interval,
        state.push_interval,
    );
    push_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // Handle incoming messages from the client
            inbound = socket.next() => {
                let Some(Ok(msg)) = inbound else {
                    // client disconnected
                    break;
                };
                match msg {
                    Message::Text(text) => {
                        if handle_client_message(&text, &mut socket, &state, &mut authenticated)
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Message::Close(_) => {
                        break;
                    }
                    _ => {}
                }
            }
            // Re-resolve and push the three projections on a fixed tick,
            // regardless of authentication state
            _ = push_tick.tick() => {
                if send_snapshot(&mut socket, &state).await.is_err() {
                    break;
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Closing client {} on server shutdown", client_id);
                break;
            }
        }
    }

    tracing::info!("Client {} disconnected", client_id);
}

/// Dispatches one inbound message. `Err` means the socket is gone; any
/// protocol-level problem is answered with an `error` message instead of
/// a connection drop.
async fn handle_client_message(
    text: &str,
    socket: &mut WebSocket,
    state: &AppState,
    authenticated: &mut Option<String>,
) -> Result<(), axum::Error> {
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(_) => {
            tracing::warn!("Unknown message type received.");
            return send(socket, &ServerMessage::error("Unknown message type")).await;
        }
    };

    match msg {
        ClientMessage::Authenticate { token } => match state.db.resolve_token(&token).await {
            Ok(Some(username)) => {
                tracing::info!("Client authenticated as {}.", username);
                *authenticated = Some(username);
                send_snapshot(socket, state).await?;
            }
            Ok(None) => {
                tracing::warn!("Invalid token provided.");
                send(socket, &ServerMessage::error("Invalid token")).await?;
            }
            Err(e) => {
                tracing::warn!("Token lookup failed: {}", e);
                send(socket, &ServerMessage::error("Invalid token")).await?;
            }
        },
        ClientMessage::GetMachineData => {
            if authenticated.is_some() {
                let msg = machine_data_message(state).await;
                send(socket, &msg).await?;
            } else {
                send_not_authenticated(socket).await?;
            }
        }
        ClientMessage::GetToolData => {
            if authenticated.is_some() {
                let msg = tool_data_message(state).await;
                send(socket, &msg).await?;
            } else {
                send_not_authenticated(socket).await?;
            }
        }
        ClientMessage::GetAxisData => {
            if authenticated.is_some() {
                let msg = axis_data_message(state).await;
                send(socket, &msg).await?;
            } else {
                send_not_authenticated(socket).await?;
            }
        }
    }
    Ok(())
}

async fn send_not_authenticated(socket: &mut WebSocket) -> Result<(), axum::Error> {
    tracing::warn!("Unauthenticated client requested on-demand data.");
    send(socket, &ServerMessage::error("Not authenticated")).await
}

/// All three latest-per-key projections, in a fixed order.
async fn send_snapshot(socket: &mut WebSocket, state: &AppState) -> Result<(), axum::Error> {
    let msg = machine_data_message(state).await;
    send(socket, &msg).await?;
    let msg = tool_data_message(state).await;
    send(socket, &msg).await?;
    let msg = axis_data_message(state).await;
    send(socket, &msg).await
}

async fn machine_data_message(state: &AppState) -> ServerMessage {
    match state.db.latest_machines().await {
        Ok(data) => ServerMessage::MachineData { data },
        Err(e) => {
            tracing::error!("machine snapshot query failed: {}", e);
            ServerMessage::error("Failed to load machine data")
        }
    }
}

async fn tool_data_message(state: &AppState) -> ServerMessage {
    match state.db.latest_tool_samples().await {
        Ok(data) => ServerMessage::ToolData { data },
        Err(e) => {
            tracing::error!("tool snapshot query failed: {}", e);
            ServerMessage::error("Failed to load tool data")
        }
    }
}

async fn axis_data_message(state: &AppState) -> ServerMessage {
    match state.db.latest_axis_samples().await {
        Ok(data) => ServerMessage::AxisData { data },
        Err(e) => {
            tracing::error!("axis snapshot query failed: {}", e);
            ServerMessage::error("Failed to load axis data")
        }
    }
}

async fn send(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            Ok(())
        }
    }
}
