//! Protocol debug dumps
//!
//! Saat decode gagal, reader menyerahkan header, payload, dan error ke
//! sink. `FileDumpSink` menulis hex dump ke
//! `<dir>/QWIRE_PROTOCOL_DEBUG.<unix-nanos>`. Failure saat menulis dump
//! hanya di-log; error decode asli tetap dipropagasi.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ReaderError;

/// Environment variable yang mengaktifkan file dumps
pub const PROTOCOL_DEBUG_ENV: &str = "QWIRE_PROTOCOL_DEBUG";

/// Penerima dump untuk message yang gagal di-decode
pub trait ProtocolDebugSink: Send + Sync {
    fn dump(&self, header: &[u8], payload: &[u8], error: &ReaderError);
}

/// Tulis dump sebagai file hex di satu directory
#[derive(Debug, Clone)]
pub struct FileDumpSink {
    dir: PathBuf,
}

impl FileDumpSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `Some` jika `QWIRE_PROTOCOL_DEBUG` di-set (dan tidak kosong)
    pub fn from_env() -> Option<Self> {
        std::env::var_os(PROTOCOL_DEBUG_ENV)
            .filter(|dir| !dir.is_empty())
            .map(Self::new)
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn render(header: &[u8], payload: &[u8], error: &ReaderError) -> String {
        let mut out = String::with_capacity((header.len() + payload.len()) * 2 + 128);
        out.push_str(&hex(header));
        out.push_str(&hex(payload));
        out.push('\n');
        let _ = writeln!(out, "{error}");
        out
    }
}

impl ProtocolDebugSink for FileDumpSink {
    fn dump(&self, header: &[u8], payload: &[u8], error: &ReaderError) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = self.dir.join(format!("{PROTOCOL_DEBUG_ENV}.{nanos}"));

        match fs::write(&path, Self::render(header, payload, error)) {
            Ok(()) => tracing::debug!(path = %path.display(), "protocol debug dump written"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot write protocol debug dump"),
        }
    }
}

#[inline]
fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
