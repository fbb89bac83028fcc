use std::{io, time::Duration};

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::ServerConfig;
use crate::resp::{decoder::{ProtocolError, RESPDecoder}, reply::Reply, router::CommandRouter};
use crate::store::Store;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("socket failure: {0}")]
    Io(#[from] io::Error),
    #[error("incomplete frame of {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },
}

/**
 * Accepts clients forever, one task per connection
 */
pub async fn listen(listener: TcpListener, store: Store, config: ServerConfig) {
    loop {
        match listener.accept().await {
            Ok((socket, addr)) => {
                info!(client = %addr, "Accepted new client");
                let router = CommandRouter::new(store.clone());

                tokio::spawn(
                    async move {
                        match handle_connection(socket, &router, &config).await {
                            Ok(()) => info!("Client disconnected"),
                            Err(err) => error!(%err, "Connection closed unexpectedly"),
                        }
                    }
                    .instrument(info_span!("connection", client = %addr)),
                );
            },
            Err(err) => error!(%err, "Couldn't accept client"),
        }
    }
}

/**
 * Reads requests until the peer hangs up, answering each in arrival order.
 * Bad requests are answered with an error reply and the connection stays open.
 */
pub async fn handle_connection<S>(
    mut stream: S,
    router: &CommandRouter,
    config: &ServerConfig,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = BytesMut::with_capacity(config.read_buffer_capacity);
    let mut replies = BytesMut::new();

    loop {
        if stream.read_buf(&mut buffer).await? == 0 {
            if !buffer.is_empty() {
                debug!(pending = buffer.len(), "Peer closed mid-frame");
            }
            return Ok(());
        }

        process_buffer(&mut buffer, router, &mut replies);
        if !replies.is_empty() {
            stream.write_all(&replies).await?;
            replies.clear();
        }

        if buffer.len() > config.max_frame_bytes {
            return Err(ConnectionError::FrameTooLarge { size: buffer.len(), max: config.max_frame_bytes });
        }
    }
}

/**
 * Answers every complete request in `buffer`, leaving a trailing partial frame in place
 */
fn process_buffer(buffer: &mut BytesMut, router: &CommandRouter, replies: &mut BytesMut) {
    while !buffer.is_empty() {
        match RESPDecoder::decode(buffer) {
            Ok((request, consumed)) => {
                buffer.advance(consumed);
                if request.is_empty() {
                    continue;
                }
                debug!(?request, "Request");

                let reply = router.dispatch(&request).unwrap_or_else(|err| {
                    warn!(%err, "Command failed");
                    Reply::error(err)
                });
                debug!(?reply, "Response");
                reply.encode(replies);
            },
            Err(ProtocolError::Incomplete) => break,
            Err(err) => {
                warn!(%err, dropped = buffer.len(), "Malformed frame");
                buffer.clear();
                Reply::error(format!("Protocol error: {}", err)).encode(replies);
            },
        }
    }
}

/**
 * Periodically reclaims memory held by expired keys
 */
pub fn spawn_expiry_sweeper(store: Store, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = store.len(), "Purged expired keys");
            }
        }
    })
}
