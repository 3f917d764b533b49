//! The player actor: one per connection.
//!
//! A player runs three duties as separate tasks:
//!
//! ```text
//!   transport ──read──→ [reader] ──inbound──→ [dispatcher] ──→ handlers
//!                                                  │
//!   transport ←─write── [writer] ←──outbound───────┘ (and room broadcasts)
//! ```
//!
//! All three watch one [`CancellationToken`]. Whichever duty fails first
//! cancels it, the other two observe it and return, and the supervisor
//! ([`Player::run`]) tears the player down: it leaves every room it may be
//! a member of (waiting for each room's acknowledgment), closes both
//! mailboxes, and removes itself from the registry.

use std::sync::Arc;

use roomcast_protocol::{
    encode_frame, Codec, Envelope, FrameDecoder, JsonCodec, PlayerId,
    ProtocolError,
};
use roomcast_room::{mailbox, Mailbox, MailboxError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{PlayerConfig, PlayerContext, PlayerHandlers, Registry};

/// What the rest of the server holds to reach a player.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    id: PlayerId,
    inbound: Mailbox<Envelope>,
    outbox: Mailbox<Envelope>,
    cancel: CancellationToken,
}

impl PlayerHandle {
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Enqueues `msg` for the writer. Never blocks; a full outbox drops it.
    pub fn send(&self, msg: Envelope) -> Result<(), MailboxError> {
        self.outbox.offer(msg)
    }

    pub fn outbox(&self) -> &Mailbox<Envelope> {
        &self.outbox
    }

    /// Messages dropped so far because the outbox was full.
    pub fn outbound_dropped(&self) -> u64 {
        self.outbox.dropped()
    }

    /// Requests the reader dropped so far because the inbound mailbox was
    /// full.
    pub fn inbound_dropped(&self) -> u64 {
        self.inbound.dropped()
    }

    /// Asks the player's tasks to stop. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A player actor that has been built but not started.
pub struct Player<R, W> {
    id: PlayerId,
    reader: R,
    writer: W,
    inbound: Mailbox<Envelope>,
    inbound_rx: mpsc::Receiver<Envelope>,
    outbox: Mailbox<Envelope>,
    outbound_rx: mpsc::Receiver<Envelope>,
    cancel: CancellationToken,
    registry: Arc<Registry>,
    handlers: Arc<PlayerHandlers>,
    config: PlayerConfig,
}

impl<R, W> Player<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Builds the player's mailboxes and handle over the given stream halves.
    pub fn new(
        id: PlayerId,
        reader: R,
        writer: W,
        registry: Arc<Registry>,
        handlers: Arc<PlayerHandlers>,
        config: PlayerConfig,
    ) -> (PlayerHandle, Self) {
        let (inbound, inbound_rx) =
            mailbox(format!("{id}/inbound"), config.inbound_capacity);
        let (outbox, outbound_rx) =
            mailbox(format!("{id}/outbound"), config.outbound_capacity);
        let cancel = CancellationToken::new();

        let handle = PlayerHandle {
            id: id.clone(),
            inbound: inbound.clone(),
            outbox: outbox.clone(),
            cancel: cancel.clone(),
        };
        let player = Self {
            id,
            reader,
            writer,
            inbound,
            inbound_rx,
            outbox,
            outbound_rx,
            cancel,
            registry,
            handlers,
            config,
        };
        (handle, player)
    }

    /// Runs the three duties to completion, then tears the player down.
    pub async fn run(self) {
        let Self {
            id,
            reader,
            writer,
            inbound,
            inbound_rx,
            outbox,
            outbound_rx,
            cancel,
            registry,
            handlers,
            config,
        } = self;

        tracing::info!(player_id = %id, "player connected");

        let reader_task = tokio::spawn(read_loop(
            id.clone(),
            reader,
            inbound,
            cancel.clone(),
            config.clone(),
        ));
        let writer_task = tokio::spawn(write_loop(
            id.clone(),
            writer,
            outbound_rx,
            cancel.clone(),
            config.max_frame_len,
        ));
        let ctx = PlayerContext::new(
            id.clone(),
            outbox,
            Arc::clone(&registry),
            config,
        );
        let dispatch_task = tokio::spawn(dispatch_loop(
            ctx,
            inbound_rx,
            handlers,
            cancel.clone(),
        ));

        let (read, write, dispatch) =
            tokio::join!(reader_task, writer_task, dispatch_task);

        if let Err(e) = read {
            tracing::error!(player_id = %id, error = %e, "reader task failed");
        }
        let mut outbound_rx = match write {
            Ok(rx) => Some(rx),
            Err(e) => {
                tracing::error!(player_id = %id, error = %e, "writer task failed");
                None
            }
        };
        let (ctx, mut inbound_rx) = match dispatch {
            Ok((ctx, rx)) => (Some(ctx), Some(rx)),
            Err(e) => {
                tracing::error!(player_id = %id, error = %e, "dispatcher task failed");
                (None, None)
            }
        };

        let rooms = ctx.as_ref().map(PlayerContext::memberships).unwrap_or_default();
        let timeout = registry.room_config().reply_timeout;
        for room_id in rooms {
            let Some(room) = registry.room(room_id) else {
                continue;
            };
            match room.leave(id.clone(), timeout).await {
                Ok(outcome) => {
                    tracing::debug!(
                        player_id = %id,
                        %room_id,
                        ret = ?outcome.ret,
                        "left room on disconnect"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        player_id = %id,
                        %room_id,
                        error = %e,
                        "leave on disconnect failed"
                    );
                }
            }
        }

        if let Some(rx) = inbound_rx.as_mut() {
            rx.close();
        }
        if let Some(rx) = outbound_rx.as_mut() {
            rx.close();
        }
        registry.remove_player(&id);
        tracing::info!(player_id = %id, "player disconnected");
    }
}

/// Reads from the transport, cuts frames, and feeds the inbound mailbox.
async fn read_loop<R>(
    id: PlayerId,
    mut reader: R,
    inbound: Mailbox<Envelope>,
    cancel: CancellationToken,
    config: PlayerConfig,
) where
    R: AsyncRead + Unpin,
{
    let codec = JsonCodec;
    let mut decoder = FrameDecoder::new(config.max_frame_len);
    let mut buf = vec![0u8; config.read_buffer_size.max(1)];

    'conn: loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    tracing::debug!(player_id = %id, "connection closed by peer");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!(player_id = %id, error = %e, "read failed");
                    break;
                }
            },
        };
        decoder.extend(&buf[..n]);

        loop {
            let frame = match decoder.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(
                        player_id = %id,
                        error = %e,
                        "unrecoverable frame, closing connection"
                    );
                    break 'conn;
                }
            };

            let envelope: Envelope = match codec.decode(&frame) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::debug!(player_id = %id, error = %e, "dropping malformed frame");
                    continue;
                }
            };

            let delivered = tokio::select! {
                _ = cancel.cancelled() => break 'conn,
                delivered = inbound.deliver(envelope, config.inbound_overflow) => delivered,
            };
            match delivered {
                Ok(()) | Err(MailboxError::Full(_)) => {}
                Err(MailboxError::Closed(_)) => break 'conn,
            }
        }
    }

    cancel.cancel();
}

/// Drains the outbound mailbox onto the transport.
///
/// Returns the receiver so the supervisor can close it.
async fn write_loop<W>(
    id: PlayerId,
    mut writer: W,
    mut outbound: mpsc::Receiver<Envelope>,
    cancel: CancellationToken,
    max_frame_len: usize,
) -> mpsc::Receiver<Envelope>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = outbound.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };

        let frame = match frame_envelope(&msg, max_frame_len) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    player_id = %id,
                    kind = %msg.id,
                    error = %e,
                    "dropping unencodable message"
                );
                continue;
            }
        };

        let written = tokio::select! {
            _ = cancel.cancelled() => break,
            written = writer.write_all(&frame) => written,
        };
        if let Err(e) = written {
            tracing::debug!(player_id = %id, error = %e, "write failed");
            break;
        }
    }

    cancel.cancel();
    outbound
}

/// Runs each inbound message through its handler, in arrival order.
///
/// A handler is awaited to completion before the next message is taken,
/// so a pending room rendezvous is never abandoned halfway.
async fn dispatch_loop(
    mut ctx: PlayerContext,
    mut inbound: mpsc::Receiver<Envelope>,
    handlers: Arc<PlayerHandlers>,
    cancel: CancellationToken,
) -> (PlayerContext, mpsc::Receiver<Envelope>) {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = inbound.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };

        let kind = msg.id;
        let Some(handler) = handlers.get(&kind).copied() else {
            tracing::trace!(player_id = %ctx.id(), %kind, "no handler for message");
            continue;
        };

        tracing::debug!(
            player_id = %ctx.id(),
            %kind,
            serial = msg.msg_serial_no,
            "dispatching message"
        );
        if let Err(e) = handler(&mut ctx, msg).await {
            tracing::debug!(player_id = %ctx.id(), %kind, error = %e, "handler failed");
        }
    }

    cancel.cancel();
    (ctx, inbound)
}

/// Encodes `envelope` into one wire frame.
pub fn frame_envelope(
    envelope: &Envelope,
    max_frame_len: usize,
) -> Result<Vec<u8>, ProtocolError> {
    let payload = JsonCodec.encode(envelope)?;
    encode_frame(&payload, max_frame_len)
}
