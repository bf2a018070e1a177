//! Socket.io bridge relaying wall broadcasts to browser viewers.
//!
//! Every socket joins the `ephemeral-wall` room on connect. Events published
//! on the pub/sub channel are re-emitted to that room under their event name
//! with the `data` payload.

use std::sync::Arc;

use socketioxide::{SocketIo, extract::SocketRef};

use wall_core::domain::{WALL_CHANNEL, WallEvent};
use wall_core::ports::{PubSub, PubSubError, PubSubMessage, handler};

/// Configure the connection handler on the default namespace.
pub fn configure_socket_handlers(io: &SocketIo) {
    io.ns("/", |socket: SocketRef| async move {
        tracing::info!(socket_id = %socket.id, "Viewer connected");

        socket.join(WALL_CHANNEL).ok();

        socket.on_disconnect(|socket: SocketRef| async move {
            tracing::info!(socket_id = %socket.id, "Viewer disconnected");
        });
    });
}

/// Forward every wall event from `pubsub` to connected sockets.
pub async fn relay_wall_events(io: SocketIo, pubsub: Arc<dyn PubSub>) -> Result<(), PubSubError> {
    pubsub
        .subscribe_with_status(
            WALL_CHANNEL,
            handler(move |msg: PubSubMessage| {
                let io = io.clone();
                async move {
                    let event = match WallEvent::from_payload(&msg.payload) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(error = %e, "Dropping malformed wall event");
                            return;
                        }
                    };
                    let data = match event.data() {
                        Ok(data) => data,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to encode wall event");
                            return;
                        }
                    };

                    if let Err(e) = io.to(WALL_CHANNEL).emit(event.name(), &data) {
                        tracing::warn!(event = event.name(), error = %e, "Failed to emit to viewers");
                    }
                }
            }),
            Box::new(|up: bool| {
                if up {
                    tracing::info!("Broadcast relay reconnected");
                } else {
                    tracing::warn!("Broadcast relay lost its subscription");
                }
            }),
        )
        .await?;
    Ok(())
}

/// Serve the socket.io endpoint and start relaying wall events.
pub async fn serve(host: String, port: u16, pubsub: Arc<dyn PubSub>) -> std::io::Result<()> {
    let (layer, io) = SocketIo::new_layer();
    configure_socket_handlers(&io);
    relay_wall_events(io, pubsub)
        .await
        .map_err(std::io::Error::other)?;

    let app = axum::Router::new().layer(layer);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!("Socket.io bridge listening on {}:{}", host, port);

    axum::serve(listener, app).await
}
