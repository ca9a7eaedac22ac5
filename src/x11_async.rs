//! X11 Async Event Stream
//!
//! Non-blocking X11 event polling: mio watches the connection's file
//! descriptor on a blocking task and wakes the event loop when it becomes
//! readable. Events come out already decoded for the dispatcher.

use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{Notify, oneshot};
use x11rb::connection::Connection;
use x11rb::rust_connection::RustConnection;

use crate::wm::event::XEvent;

/// How often the polling task checks whether the stream was dropped
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub struct X11EventStream {
    conn: Arc<RustConnection>,
    notify: Arc<Notify>,
    _task_guard: oneshot::Receiver<()>,
}

impl X11EventStream {
    /// Start polling the connection's file descriptor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(conn: Arc<RustConnection>) -> Result<Self> {
        let fd = conn.stream().as_raw_fd();
        let notify = Arc::new(Notify::new());
        let task_notify = notify.clone();

        // The polling task exits once the receiver half is dropped
        let (guard, task_guard) = oneshot::channel::<()>();
        let mut poll = mio::Poll::new().context("Failed to create mio Poll")?;
        let mut events = mio::Events::with_capacity(1);

        poll.registry()
            .register(
                &mut mio::unix::SourceFd(&fd),
                mio::Token(0),
                mio::Interest::READABLE,
            )
            .context("Failed to register X11 FD with mio")?;

        tokio::task::spawn_blocking(move || {
            loop {
                if guard.is_closed() {
                    tracing::info!("X11 socket polling thread shutting down");
                    return;
                }

                if let Err(err) = poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                    tracing::warn!("X11 socket poll failed: {:?}", err);
                    continue;
                }

                events
                    .iter()
                    .filter(|event| event.token() == mio::Token(0))
                    .for_each(|_| task_notify.notify_one());
            }
        });

        Ok(Self {
            conn,
            notify,
            _task_guard: task_guard,
        })
    }

    /// Next already-received event, if any. Never blocks.
    pub fn poll_next_event(&self) -> Result<Option<XEvent>> {
        let event = self
            .conn
            .poll_for_event()
            .context("X11 connection lost")?;
        Ok(event.as_ref().map(XEvent::from_x11))
    }

    /// Wait until the X11 file descriptor becomes readable
    pub async fn wait_readable(&self) {
        self.notify.notified().await;
    }

    /// Send all queued requests to the server
    pub fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}
