//! Blocking connection ke q process
//!
//! Handshake:
//! ```text
//! client ──► "user:pass" 0x03 0x00
//! client ◄── 1 byte capability (protocol version)
//!
//! jika tidak ada jawaban: reconnect, kirim "user:pass" 0x00 (tanpa capability)
//! ```
//!
//! Satu socket, tiga handle: writer (milik connection), reader (milik
//! connection), dan reader tambahan untuk listener thread.

use std::fmt;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

use crate::core::Value;
use crate::error::{Error, ReaderError, WriterError};
use crate::protocol::{
    FileDumpSink, Message, MessageReader, MessageType, MessageWriter, ProtocolDebugSink,
    TextEncoding, DEFAULT_MAX_READING_CHUNK, MAX_PROTOCOL_VERSION,
};

/// Batas jumlah parameter untuk satu query
pub const MAX_QUERY_PARAMETERS: usize = 8;

const CAPABILITY: u8 = 3;

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub encoding: TextEncoding,
    pub max_reading_chunk: usize,
    /// `SO_RCVBUF`; `None` = OS default
    pub receive_buffer_size: Option<usize>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 0,
            username: None,
            password: None,
            encoding: TextEncoding::Utf8,
            max_reading_chunk: DEFAULT_MAX_READING_CHUNK,
            receive_buffer_size: None,
        }
    }
}

impl ConnectionOptions {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn max_reading_chunk(mut self, chunk: usize) -> Self {
        self.max_reading_chunk = chunk;
        self
    }

    pub fn receive_buffer_size(mut self, size: usize) -> Self {
        self.receive_buffer_size = Some(size);
        self
    }

    /// `user:pass` jika password ada, selain itu username saja
    fn credentials(&self) -> String {
        let username = self.username.as_deref().unwrap_or_default();
        match &self.password {
            Some(password) => format!("{username}:{password}"),
            None => username.to_string(),
        }
    }
}

/// Socket aktif beserta reader/writer-nya
struct Session {
    stream: TcpStream,
    reader: MessageReader<TcpStream>,
    writer: MessageWriter<TcpStream>,
}

pub struct Connection {
    options: ConnectionOptions,
    session: Option<Session>,
    protocol_version: u8,
    debug_sink: Option<Arc<dyn ProtocolDebugSink>>,
}

impl Connection {
    /// Belum terhubung; panggil `open`. Debug sink diambil dari
    /// `QWIRE_PROTOCOL_DEBUG` jika di-set.
    pub fn new(options: ConnectionOptions) -> Self {
        let debug_sink = FileDumpSink::from_env().map(|s| Arc::new(s) as Arc<dyn ProtocolDebugSink>);
        Self {
            options,
            session: None,
            protocol_version: 0,
            debug_sink,
        }
    }

    pub fn with_debug_sink(mut self, sink: Arc<dyn ProtocolDebugSink>) -> Self {
        self.debug_sink = Some(sink);
        self
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Versi hasil handshake (0 sebelum `open`)
    #[inline(always)]
    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    /// Connect dan handshake. No-op jika sudah terhubung.
    pub fn open(&mut self) -> Result<(), Error> {
        if self.is_connected() {
            return Ok(());
        }
        if self.options.host.is_empty() {
            return Err(Error::Connection("host cannot be empty".into()));
        }

        let credentials = self.options.credentials();
        let encoding = self.options.encoding;

        let mut stream = self.connect()?;
        let mut request = encoding.encode(&credentials)?.into_owned();
        request.extend_from_slice(&[CAPABILITY, 0]);
        stream.write_all(&request)?;

        let response = match read_capability(&mut stream) {
            Some(v) => v,
            None => {
                tracing::debug!(peer = %self, "no capability byte, retrying handshake without it");
                let _ = stream.shutdown(Shutdown::Both);
                stream = self.connect()?;
                let mut request = encoding.encode(&credentials)?.into_owned();
                request.push(0);
                stream.write_all(&request)?;
                read_capability(&mut stream)
                    .ok_or_else(|| Error::Connection("Connection denied".into()))?
            }
        };

        self.protocol_version = response.min(MAX_PROTOCOL_VERSION);

        let reader = MessageReader::new(stream.try_clone()?, encoding)
            .with_max_reading_chunk(self.options.max_reading_chunk)
            .with_debug_sink(self.debug_sink.clone());
        let writer = MessageWriter::new(stream.try_clone()?, self.protocol_version, encoding);
        self.session = Some(Session {
            stream,
            reader,
            writer,
        });

        tracing::info!(peer = %self, protocol_version = self.protocol_version, "connection opened");
        Ok(())
    }

    fn connect(&self) -> Result<TcpStream, Error> {
        let stream = TcpStream::connect((self.options.host.as_str(), self.options.port))
            .map_err(|e| Error::Connection(format!("cannot connect to {self}: {e}")))?;
        stream.set_nodelay(true)?;

        if let Some(size) = self.options.receive_buffer_size {
            set_receive_buffer(&stream, size)?;
        }
        Ok(stream)
    }

    /// Tutup socket. No-op jika belum terhubung.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = session.stream.shutdown(Shutdown::Both);
            tracing::info!(peer = %self, "connection closed");
        }
    }

    /// Tutup lalu buka ulang
    pub fn reset(&mut self) -> Result<(), Error> {
        self.close();
        self.open()
    }

    /// Socket masih terbuka dan peer belum menutup koneksi
    pub fn is_connected(&self) -> bool {
        match &self.session {
            Some(session) => {
                session.stream.peer_addr().is_ok()
                    && matches!(session.stream.take_error(), Ok(None))
            }
            None => false,
        }
    }

    /// Kirim query synchronous dan tunggu response.
    pub fn sync(&mut self, query: &str, parameters: &[Value]) -> Result<Value, Error> {
        self.query(MessageType::Sync, query, parameters)?;
        let response = self.receive(false)?;

        if response.kind == MessageType::Response {
            return Ok(response.data);
        }

        let reply_kind = match response.kind {
            MessageType::Async => MessageType::Async,
            _ => MessageType::Response,
        };
        self.session_mut()?.writer.write(
            &Value::Error("nyi: qwire expected response message".into()),
            reply_kind,
        )?;
        Err(Error::Reader(ReaderError::UnexpectedMessage(format!(
            "received {} message where response was expected",
            response.kind
        ))))
    }

    /// Fire-and-forget query
    pub fn send_async(&mut self, query: &str, parameters: &[Value]) -> Result<(), Error> {
        self.query(MessageType::Async, query, parameters)?;
        Ok(())
    }

    /// Kirim query dengan message type tertentu; return jumlah byte terkirim.
    ///
    /// Tanpa parameter query dikirim sebagai string, selain itu sebagai
    /// general list `(query; p1; ...; pn)`.
    pub fn query(
        &mut self,
        kind: MessageType,
        query: &str,
        parameters: &[Value],
    ) -> Result<usize, Error> {
        let session = self.session_mut()?;
        if parameters.len() > MAX_QUERY_PARAMETERS {
            return Err(WriterError::TooManyParameters(parameters.len()).into());
        }

        let request = if parameters.is_empty() {
            Value::string(query)
        } else {
            let mut items = Vec::with_capacity(parameters.len() + 1);
            items.push(Value::string(query));
            items.extend_from_slice(parameters);
            Value::List(items)
        };

        Ok(session.writer.write(&request, kind)?)
    }

    /// Kirim value apa saja sebagai satu message
    pub fn write(&mut self, value: &Value, kind: MessageType) -> Result<usize, Error> {
        Ok(self.session_mut()?.writer.write(value, kind)?)
    }

    /// Baca message berikutnya dari stream
    pub fn receive(&mut self, raw: bool) -> Result<Message, Error> {
        Ok(self.session_mut()?.reader.read(raw)?)
    }

    /// Reader independen di atas socket yang sama, untuk listener thread
    pub(crate) fn reader_clone(&self) -> Result<MessageReader<TcpStream>, Error> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| Error::Connection("connection has not been initialized".into()))?;
        Ok(MessageReader::new(session.stream.try_clone()?, self.options.encoding)
            .with_max_reading_chunk(self.options.max_reading_chunk)
            .with_debug_sink(self.debug_sink.clone()))
    }

    fn session_mut(&mut self) -> Result<&mut Session, Error> {
        self.session
            .as_mut()
            .ok_or_else(|| Error::Connection("connection has not been initialized".into()))
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}:{}", self.options.host, self.options.port)
    }
}

/// Satu byte jawaban handshake; `None` jika peer menutup atau read gagal
fn read_capability(stream: &mut TcpStream) -> Option<u8> {
    let mut response = [0u8; 1];
    match stream.read(&mut response) {
        Ok(1) => Some(response[0]),
        _ => None,
    }
}

#[cfg(unix)]
fn set_receive_buffer(stream: &TcpStream, size: usize) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let optval = libc::c_int::try_from(size).unwrap_or(libc::c_int::MAX);
    // SAFETY: fd valid selama `stream` hidup; optval hidup sepanjang call
    let rc = unsafe {
        libc::setsockopt(
            stream.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_receive_buffer(_stream: &TcpStream, size: usize) -> std::io::Result<()> {
    tracing::debug!(size, "SO_RCVBUF not supported on this platform, ignored");
    Ok(())
}
