//! Bounded mailboxes with an explicit overflow policy.
//!
//! Every actor in Roomcast receives through a bounded `mpsc` channel. The
//! sending side is wrapped in a [`Mailbox`], which never blocks by default:
//! when the channel is full the *new* message is dropped, counted, and
//! logged. The counter is shared by every clone, so the owner can expose it
//! as a metric.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

/// What to do when a mailbox is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop the message being delivered and count it.
    #[default]
    DropNewest,
    /// Wait for the receiver to make room.
    Wait,
}

/// Errors returned when delivering to a mailbox.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    /// The mailbox was full and the message was dropped.
    #[error("mailbox {0} is full, message dropped")]
    Full(Arc<str>),

    /// The receiving actor has gone away.
    #[error("mailbox {0} is closed")]
    Closed(Arc<str>),
}

/// The sending side of an actor's bounded mailbox.
pub struct Mailbox<T> {
    label: Arc<str>,
    sender: mpsc::Sender<T>,
    dropped: Arc<AtomicU64>,
}

/// Creates a bounded mailbox. `label` names the mailbox in logs and errors.
pub fn mailbox<T>(
    label: impl Into<Arc<str>>,
    capacity: usize,
) -> (Mailbox<T>, mpsc::Receiver<T>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let mailbox = Mailbox {
        label: label.into(),
        sender,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (mailbox, receiver)
}

impl<T> Mailbox<T> {
    /// Enqueues `msg` without waiting. Full mailboxes drop it.
    pub fn offer(&self, msg: T) -> Result<(), MailboxError> {
        match self.sender.try_send(msg) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    mailbox = %self.label,
                    dropped,
                    "mailbox full, dropping message"
                );
                Err(MailboxError::Full(Arc::clone(&self.label)))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(MailboxError::Closed(Arc::clone(&self.label)))
            }
        }
    }

    /// Enqueues `msg` according to `policy`.
    pub async fn deliver(
        &self,
        msg: T,
        policy: OverflowPolicy,
    ) -> Result<(), MailboxError> {
        match policy {
            OverflowPolicy::DropNewest => self.offer(msg),
            OverflowPolicy::Wait => self
                .sender
                .send(msg)
                .await
                .map_err(|_| MailboxError::Closed(Arc::clone(&self.label))),
        }
    }

    /// Total number of messages dropped because the mailbox was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// `true` once the receiver is closed or dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self {
            label: Arc::clone(&self.label),
            sender: self.sender.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<T> fmt::Debug for Mailbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("label", &self.label)
            .field("dropped", &self.dropped())
            .finish()
    }
}
