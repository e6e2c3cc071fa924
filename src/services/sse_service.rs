use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::{
        game::ConsoleSnapshot,
        sse::{Handshake, ServerEvent},
    },
    state::SharedState,
};

/// Subscribe to the player stream and build the handshake sent first.
pub async fn subscribe_player(
    state: &SharedState,
) -> (broadcast::Receiver<ServerEvent>, Option<ServerEvent>) {
    // Subscribe before capturing so no change slips between snapshot and stream.
    let receiver = state.sse().subscribe();
    let snapshot = {
        let console = state.console().read().await;
        ConsoleSnapshot::capture(&console, state.is_degraded())
    };
    let handshake = Handshake {
        stream: "player".into(),
        message: "player stream connected".into(),
        degraded: state.is_degraded(),
        snapshot,
    };

    match ServerEvent::json(Some("handshake".to_string()), &handshake) {
        Ok(event) => (receiver, Some(event)),
        Err(err) => {
            warn!(error = %err, "failed to serialize SSE handshake");
            (receiver, None)
        }
    }
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    first: Option<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        if let Some(first) = first {
            if tx.send(Ok(to_event(first))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Skip lagged messages but keep the stream alive.
                            debug!(skipped, "player SSE stream lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!("player SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
