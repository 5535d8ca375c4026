//! Callback connection dengan background listener thread
//!
//! ```text
//! ┌────────────────────┐  cloned socket  ┌─────────────────┐
//! │ CallbackConnection │ ──────────────► │ listener thread │ ─► on_data / on_error
//! │ (sync / async)     │                 │ MessageReader   │
//! └────────────────────┘                 └─────────────────┘
//! ```
//!
//! Mutex hanya menjaga transisi start/stop. Listener berhenti saat flag
//! `running` di-clear (setelah message berikutnya) atau saat error fatal.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::connection::{Connection, ConnectionOptions};
use crate::error::Error;
use crate::protocol::Message;

const STOP_TIMEOUT: Duration = Duration::from_millis(500);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Penerima event dari listener thread
pub trait MessageHandler: Send + Sync + 'static {
    fn on_data(&self, message: Message);

    fn on_error(&self, error: &Error);
}

struct ListenerHandle {
    running: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

pub struct CallbackConnection {
    connection: Connection,
    handler: Arc<dyn MessageHandler>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl CallbackConnection {
    pub fn new(options: ConnectionOptions, handler: Arc<dyn MessageHandler>) -> Self {
        Self::from_connection(Connection::new(options), handler)
    }

    pub fn from_connection(connection: Connection, handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            connection,
            handler,
            listener: Mutex::new(None),
        }
    }

    /// Listener thread sedang berjalan
    pub fn is_listening(&self) -> bool {
        match self.listener.lock() {
            Ok(guard) => guard
                .as_ref()
                .is_some_and(|l| l.running.load(Ordering::Acquire) && !l.thread.is_finished()),
            Err(_) => false,
        }
    }

    /// Start listener thread. No-op jika sudah berjalan.
    pub fn start_listener(&self) -> Result<(), Error> {
        let mut guard = self
            .listener
            .lock()
            .map_err(|_| Error::Connection("listener lock poisoned".into()))?;

        if let Some(existing) = guard.as_ref() {
            if !existing.thread.is_finished() {
                return Ok(());
            }
        }

        let mut reader = self.connection.reader_clone()?;
        let running = Arc::new(AtomicBool::new(true));
        let handler = Arc::clone(&self.handler);
        let flag = Arc::clone(&running);
        let peer = self.connection.to_string();

        let thread = thread::Builder::new()
            .name("qwire-listener".into())
            .spawn(move || {
                tracing::debug!(peer = %peer, "listener started");
                while flag.load(Ordering::Acquire) {
                    match reader.read(false) {
                        Ok(message) => handler.on_data(message),
                        Err(e) => {
                            let error = Error::from(e);
                            if !flag.load(Ordering::Acquire) {
                                break;
                            }
                            let recoverable = error.is_recoverable();
                            handler.on_error(&error);
                            if !recoverable {
                                tracing::error!(peer = %peer, error = %error, "listener stopped on fatal error");
                                break;
                            }
                        }
                    }
                }
                flag.store(false, Ordering::Release);
                tracing::debug!(peer = %peer, "listener finished");
            })?;

        *guard = Some(ListenerHandle { running, thread });
        Ok(())
    }

    /// Stop listener; tunggu maksimal 500 ms. Thread yang masih blocked
    /// di read dilepas dan berhenti setelah message berikutnya.
    pub fn stop_listener(&self) {
        let handle = match self.listener.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return;
        };

        handle.running.store(false, Ordering::Release);
        let deadline = Instant::now() + STOP_TIMEOUT;
        while !handle.thread.is_finished() && Instant::now() < deadline {
            thread::sleep(STOP_POLL_INTERVAL);
        }

        if handle.thread.is_finished() {
            let _ = handle.thread.join();
        } else {
            tracing::debug!(peer = %self.connection, "listener still blocked in read, detached");
        }
    }
}

impl Deref for CallbackConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.connection
    }
}

impl DerefMut for CallbackConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }
}

impl Drop for CallbackConnection {
    fn drop(&mut self) {
        self.stop_listener();
    }
}
