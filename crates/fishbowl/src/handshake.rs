//! First contact with a new WebSocket client.
//!
//! The flow is:
//!   1. Upgrade the TCP stream to a WebSocket (bounded wait)
//!   2. Receive a `{"gid": ..., "token": ...}` handshake (bounded wait)
//!   3. Authenticate the token for that session, get a [`UserId`]
//!   4. Reply `{"status":"ok"}`
//!   5. Hand the connection to the [`SessionRegistry`](fishbowl_session::SessionRegistry)
//!
//! All of it runs on the connection's own task, so a client that stalls
//! anywhere here only holds up itself.

use std::net::SocketAddr;
use std::sync::Arc;

use fishbowl_auth::Authenticator;
use fishbowl_protocol::{Codec, Handshake, JsonCodec, ServerMessage, SessionId, UserId};
use fishbowl_transport::{Connection, WebSocketConnection};
use tokio::net::TcpStream;

use crate::FishbowlError;
use crate::server::ServerState;

/// Handles a single accepted TCP stream from upgrade to close.
pub(crate) async fn handle_connection<A: Authenticator>(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState<A>>,
) -> Result<(), FishbowlError> {
    let conn = match tokio::time::timeout(
        state.handshake_timeout,
        WebSocketConnection::upgrade(stream, peer),
    )
    .await
    {
        Ok(upgraded) => upgraded?,
        Err(_) => {
            tracing::info!(%peer, "websocket upgrade timed out");
            return Err(FishbowlError::Handshake("websocket upgrade timed out".into()));
        }
    };

    let conn_id = conn.id();
    tracing::debug!(%conn_id, %peer, "handling new connection");

    let (session_id, user) = match perform_handshake(&conn, &state).await {
        Ok(identity) => identity,
        Err(e) => {
            if let Err(close_err) = conn.close().await {
                tracing::debug!(%conn_id, error = %close_err, "close after failed handshake");
            }
            return Err(e);
        }
    };
    tracing::info!(%conn_id, %session_id, %user, "client authenticated");

    state
        .registry
        .handle_connection(&session_id, user, conn)
        .await?;
    Ok(())
}

async fn perform_handshake<A: Authenticator>(
    conn: &WebSocketConnection,
    state: &ServerState<A>,
) -> Result<(SessionId, UserId), FishbowlError> {
    let data = match tokio::time::timeout(state.handshake_timeout, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(FishbowlError::Handshake(
                "connection closed before handshake".into(),
            ));
        }
        Ok(Err(e)) => return Err(FishbowlError::Transport(e)),
        Err(_) => return Err(FishbowlError::Handshake("handshake timed out".into())),
    };

    let handshake: Handshake = match JsonCodec.decode(&data) {
        Ok(handshake) => handshake,
        Err(e) => {
            tracing::debug!(conn_id = %conn.id(), error = %e, "bad handshake");
            reply(conn, &ServerMessage::error("expected a handshake with a gid")).await?;
            return Err(FishbowlError::Handshake(e.to_string()));
        }
    };
    if handshake.gid.as_str().trim().is_empty() {
        reply(conn, &ServerMessage::error("gid must not be empty")).await?;
        return Err(FishbowlError::Handshake("empty gid".into()));
    }

    let user = match state
        .auth
        .validate(&handshake.gid, handshake.token.as_deref())
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::info!(conn_id = %conn.id(), session_id = %handshake.gid, error = %e, "authentication failed");
            reply(conn, &ServerMessage::error(e.to_string())).await?;
            return Err(e.into());
        }
    };

    reply(conn, &ServerMessage::ack()).await?;
    Ok((handshake.gid, user))
}

async fn reply(conn: &WebSocketConnection, message: &ServerMessage) -> Result<(), FishbowlError> {
    let bytes = JsonCodec.encode(message)?;
    conn.send(&bytes).await?;
    Ok(())
}
