//! Connection tests terhadap fake q process di loopback
//!
//! Server palsu menjalankan handshake lalu membaca/menulis message dengan
//! `MessageReader` / `MessageWriter` yang sama dengan client.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use qwire::network::{CallbackConnection, Connection, ConnectionOptions, MessageHandler};
use qwire::protocol::{Message, MessageReader, MessageType, MessageWriter, TextEncoding};
use qwire::{Error, ReaderError, Value, WriterError};

const TIMEOUT: Duration = Duration::from_secs(5);

fn spawn_server<F>(serve: F) -> (u16, JoinHandle<()>)
where
    F: FnOnce(TcpListener) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (port, thread::spawn(move || serve(listener)))
}

/// Terima satu client, baca credentials sampai NUL, balas `reply` jika ada
fn accept(listener: &TcpListener, reply: Option<u8>) -> (TcpStream, Vec<u8>) {
    let (mut stream, _) = listener.accept().unwrap();
    let mut credentials = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        stream.read_exact(&mut byte).unwrap();
        if byte[0] == 0 {
            break;
        }
        credentials.push(byte[0]);
    }
    if let Some(version) = reply {
        stream.write_all(&[version]).unwrap();
    }
    (stream, credentials)
}

fn peer(stream: &TcpStream) -> (MessageReader<TcpStream>, MessageWriter<TcpStream>) {
    (
        MessageReader::new(stream.try_clone().unwrap(), TextEncoding::Utf8),
        MessageWriter::new(stream.try_clone().unwrap(), 3, TextEncoding::Utf8),
    )
}

fn options(port: u16) -> ConnectionOptions {
    ConnectionOptions::default().host("127.0.0.1").port(port)
}

#[test]
fn test_handshake_and_sync_query() {
    let (port, server) = spawn_server(|listener| {
        let (stream, credentials) = accept(&listener, Some(3));
        assert_eq!(credentials, b"user:pwd\x03");

        let (mut reader, mut writer) = peer(&stream);
        let request = reader.read(false).unwrap();
        assert_eq!(request.kind, MessageType::Sync);
        assert_eq!(request.data, Value::string("til 3"));
        writer
            .write(&Value::LongList(vec![0, 1, 2]), MessageType::Response)
            .unwrap();
    });

    let mut q = Connection::new(options(port).username("user").password("pwd"));
    q.open().unwrap();
    assert!(q.is_connected());
    assert_eq!(q.protocol_version(), 3);
    assert_eq!(q.sync("til 3", &[]).unwrap(), Value::LongList(vec![0, 1, 2]));

    server.join().unwrap();
    q.close();
    assert!(!q.is_connected());
}

#[test]
fn test_capability_is_capped() {
    let (port, server) = spawn_server(|listener| {
        let _ = accept(&listener, Some(6));
    });
    let mut q = Connection::new(options(port));
    q.open().unwrap();
    assert_eq!(q.protocol_version(), 3);
    server.join().unwrap();
}

#[test]
fn test_query_with_parameters() {
    let (port, server) = spawn_server(|listener| {
        let (stream, _) = accept(&listener, Some(3));
        let (mut reader, _) = peer(&stream);
        let request = reader.read(false).unwrap();
        assert_eq!(request.kind, MessageType::Async);
        assert_eq!(
            request.data,
            Value::List(vec![
                Value::string("asynchMult"),
                Value::Long(1),
                Value::symbol("x"),
            ])
        );
    });

    let mut q = Connection::new(options(port));
    q.open().unwrap();
    q.send_async("asynchMult", &[Value::Long(1), Value::symbol("x")])
        .unwrap();
    server.join().unwrap();
}

#[test]
fn test_too_many_parameters() {
    let (port, server) = spawn_server(|listener| {
        let _ = accept(&listener, Some(3));
    });
    let mut q = Connection::new(options(port));
    q.open().unwrap();

    let params = vec![Value::Long(0); 9];
    let err = q.query(MessageType::Sync, "f", &params).unwrap_err();
    assert!(matches!(err, Error::Writer(WriterError::TooManyParameters(9))));
    server.join().unwrap();
}

#[test]
fn test_remote_error_from_sync() {
    let (port, server) = spawn_server(|listener| {
        let (stream, _) = accept(&listener, Some(3));
        let (mut reader, mut writer) = peer(&stream);
        reader.read(false).unwrap();
        writer
            .write(&Value::Error("type".into()), MessageType::Response)
            .unwrap();
    });

    let mut q = Connection::new(options(port));
    q.open().unwrap();
    let err = q.sync("1+`a", &[]).unwrap_err();
    assert!(matches!(err, Error::Remote(ref m) if m == "type"));
    server.join().unwrap();
}

#[test]
fn test_sync_rejects_non_response() {
    let (port, server) = spawn_server(|listener| {
        let (stream, _) = accept(&listener, Some(3));
        let (mut reader, mut writer) = peer(&stream);
        reader.read(false).unwrap();
        writer.write(&Value::Long(1), MessageType::Async).unwrap();

        // client membalas dengan error, dengan message type yang sama
        let mut raw = MessageReader::new(stream.try_clone().unwrap(), TextEncoding::Utf8);
        let reply = raw.read(true).unwrap();
        assert_eq!(reply.kind, MessageType::Async);
        let mut decoded = MessageReader::new(
            std::io::Cursor::new(reply_bytes(&reply)),
            TextEncoding::Utf8,
        );
        assert!(matches!(
            decoded.read(false),
            Err(ReaderError::Remote(ref m)) if m == "nyi: qwire expected response message"
        ));
    });

    let mut q = Connection::new(options(port));
    q.open().unwrap();
    let err = q.sync("x", &[]).unwrap_err();
    assert!(matches!(err, Error::Reader(ReaderError::UnexpectedMessage(_))));
    server.join().unwrap();
}

/// Rekonstruksi message lengkap dari raw read
fn reply_bytes(message: &Message) -> Vec<u8> {
    let payload = message.raw_bytes().unwrap();
    let mut bytes = vec![1, message.kind as u8, 0, 0];
    bytes.extend_from_slice(&(message.size as i32).to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn test_handshake_falls_back_without_capability() {
    let (port, server) = spawn_server(|listener| {
        let (first, credentials) = accept(&listener, None);
        assert_eq!(credentials, b"user\x03");
        drop(first);

        let (_second, credentials) = accept(&listener, Some(0));
        assert_eq!(credentials, b"user");
    });

    let mut q = Connection::new(options(port).username("user"));
    q.open().unwrap();
    assert_eq!(q.protocol_version(), 0);
    server.join().unwrap();
}

#[test]
fn test_handshake_denied() {
    let (port, server) = spawn_server(|listener| {
        let _ = accept(&listener, None);
        let _ = accept(&listener, None);
    });

    let mut q = Connection::new(options(port).username("intruder"));
    let err = q.open().unwrap_err();
    assert!(matches!(err, Error::Connection(ref m) if m == "Connection denied"));
    assert!(!q.is_connected());
    server.join().unwrap();
}

#[derive(Debug)]
enum Event {
    Data(Value),
    Error { recoverable: bool },
}

struct ChannelHandler(Mutex<Sender<Event>>);

impl ChannelHandler {
    fn new() -> (Arc<Self>, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Self(Mutex::new(tx))), rx)
    }

    fn send(&self, event: Event) {
        if let Ok(tx) = self.0.lock() {
            let _ = tx.send(event);
        }
    }
}

impl MessageHandler for ChannelHandler {
    fn on_data(&self, message: Message) {
        self.send(Event::Data(message.data));
    }

    fn on_error(&self, error: &Error) {
        self.send(Event::Error {
            recoverable: error.is_recoverable(),
        });
    }
}

#[test]
fn test_listener_forwards_data_and_errors() {
    let (port, server) = spawn_server(|listener| {
        let (stream, _) = accept(&listener, Some(3));
        let (_, mut writer) = peer(&stream);
        writer.write(&Value::Long(1), MessageType::Async).unwrap();
        writer
            .write(&Value::Error("oops".into()), MessageType::Async)
            .unwrap();
        writer.write(&Value::symbol("b"), MessageType::Async).unwrap();
        // stream ditutup: error fatal untuk listener
    });

    let (handler, events) = ChannelHandler::new();
    let mut q = CallbackConnection::new(options(port), handler);
    q.open().unwrap();
    q.start_listener().unwrap();
    server.join().unwrap();

    assert!(matches!(events.recv_timeout(TIMEOUT).unwrap(), Event::Data(Value::Long(1))));
    assert!(matches!(
        events.recv_timeout(TIMEOUT).unwrap(),
        Event::Error { recoverable: true }
    ));
    assert!(matches!(
        events.recv_timeout(TIMEOUT).unwrap(),
        Event::Data(Value::Symbol(ref s)) if s == "b"
    ));
    assert!(matches!(
        events.recv_timeout(TIMEOUT).unwrap(),
        Event::Error { recoverable: false }
    ));

    let deadline = Instant::now() + TIMEOUT;
    while q.is_listening() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(!q.is_listening());
    q.stop_listener();
}

#[test]
fn test_stop_listener_returns_promptly() {
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let (port, server) = spawn_server(move |listener| {
        let (_stream, _) = accept(&listener, Some(3));
        let _ = done_rx.recv_timeout(TIMEOUT);
    });

    let (handler, _events) = ChannelHandler::new();
    let mut q = CallbackConnection::new(options(port), handler);
    q.open().unwrap();
    q.start_listener().unwrap();
    q.start_listener().unwrap();
    assert!(q.is_listening());

    let started = Instant::now();
    q.stop_listener();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!q.is_listening());

    q.close();
    done_tx.send(()).unwrap();
    server.join().unwrap();
}
