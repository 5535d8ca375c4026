//! Message I/O di atas blocking stream
//!
//! ```text
//! MessageReader:  stream ─► header (8) ─► payload ─► decompress? ─► Decoder ─► Message
//! MessageWriter:  Value ─► Encoder buffer ─► write_all ─► flush
//! ```
//!
//! Reader membaca payload dalam chunk berukuran `max_reading_chunk` sampai
//! lengkap. Stream yang tertutup di tengah message menghasilkan
//! `io::ErrorKind::UnexpectedEof`.

use std::io::{self, Read, Write};
use std::sync::Arc;

use super::compression::decompress;
use super::debug::ProtocolDebugSink;
use super::decoder::Decoder;
use super::encoder::Encoder;
use super::message::{Message, MessageHeader, MessageType, HEADER_SIZE};
use super::text::TextEncoding;
use crate::core::Value;
use crate::error::{ReaderError, WriterError};

/// Default chunk size per `read` call
pub const DEFAULT_MAX_READING_CHUNK: usize = 65536;

pub struct MessageReader<R> {
    stream: R,
    encoding: TextEncoding,
    max_reading_chunk: usize,
    debug_sink: Option<Arc<dyn ProtocolDebugSink>>,
}

impl<R: Read> MessageReader<R> {
    pub fn new(stream: R, encoding: TextEncoding) -> Self {
        Self {
            stream,
            encoding,
            max_reading_chunk: DEFAULT_MAX_READING_CHUNK,
            debug_sink: None,
        }
    }

    /// Chunk minimal 1 byte
    pub fn with_max_reading_chunk(mut self, chunk: usize) -> Self {
        self.max_reading_chunk = chunk.max(1);
        self
    }

    pub fn with_debug_sink(mut self, sink: Option<Arc<dyn ProtocolDebugSink>>) -> Self {
        self.debug_sink = sink;
        self
    }

    #[inline(always)]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn get_ref(&self) -> &R {
        &self.stream
    }

    pub fn into_inner(self) -> R {
        self.stream
    }

    /// Baca satu message lengkap.
    ///
    /// Dengan `raw = true` payload dikembalikan apa adanya sebagai
    /// `Value::ByteList`, tanpa decompression maupun decoding.
    pub fn read(&mut self, raw: bool) -> Result<Message, ReaderError> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        self.read_fully(&mut header_bytes)?;
        let parsed = MessageHeader::parse(&header_bytes);

        // payload selalu di-drain supaya stream tetap ter-frame
        let payload_len = MessageHeader::declared_size(&header_bytes).saturating_sub(HEADER_SIZE);
        let payload = self.read_payload(payload_len)?;
        let header = parsed?;

        tracing::trace!(
            kind = %header.kind,
            size = header.size,
            compressed = header.compressed,
            "message received"
        );

        if raw {
            let data_size = payload.len();
            return Ok(Message {
                kind: header.kind,
                endianness: header.endianness,
                compressed: header.compressed,
                raw: true,
                size: header.size,
                data_size,
                data: Value::ByteList(payload),
            });
        }

        match self.decode(&header, &payload) {
            Ok((data, data_size)) => Ok(Message {
                kind: header.kind,
                endianness: header.endianness,
                compressed: header.compressed,
                raw: false,
                size: header.size,
                data_size,
                data,
            }),
            Err(e) => {
                if !matches!(e, ReaderError::Remote(_)) {
                    tracing::debug!(error = %e, "failed to decode message");
                    if let Some(sink) = &self.debug_sink {
                        sink.dump(&header_bytes, &payload, &e);
                    }
                }
                Err(e)
            }
        }
    }

    fn decode(&self, header: &MessageHeader, payload: &[u8]) -> Result<(Value, usize), ReaderError> {
        if header.compressed {
            let data = decompress(payload, header.endianness)?;
            let value = Decoder::new(&data, header.endianness, self.encoding).read_object()?;
            Ok((value, data.len()))
        } else {
            let value = Decoder::new(payload, header.endianness, self.encoding).read_object()?;
            Ok((value, payload.len()))
        }
    }

    /// Buffer tumbuh per chunk, bukan langsung sebesar declared size
    fn read_payload(&mut self, len: usize) -> Result<Vec<u8>, ReaderError> {
        let mut payload = Vec::with_capacity(len.min(self.max_reading_chunk));
        while payload.len() < len {
            let start = payload.len();
            let end = start + self.max_reading_chunk.min(len - start);
            payload.resize(end, 0);
            self.read_fully(&mut payload[start..end]).map_err(|e| match e {
                ReaderError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    ReaderError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("stream closed inside {len}-byte payload"),
                    ))
                }
                other => other,
            })?;
        }
        Ok(payload)
    }

    fn read_fully(&mut self, buffer: &mut [u8]) -> Result<(), ReaderError> {
        let mut read = 0;
        while read < buffer.len() {
            let end = read + self.max_reading_chunk.min(buffer.len() - read);
            match self.stream.read(&mut buffer[read..end]) {
                Ok(0) => {
                    return Err(ReaderError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("stream closed after {read} of {} bytes", buffer.len()),
                    )));
                }
                Ok(n) => read += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(ReaderError::Io(e)),
            }
        }
        Ok(())
    }
}

pub struct MessageWriter<W> {
    stream: W,
    encoder: Encoder,
}

impl<W: Write> MessageWriter<W> {
    pub fn new(stream: W, protocol_version: u8, encoding: TextEncoding) -> Self {
        Self {
            stream,
            encoder: Encoder::new(protocol_version, encoding),
        }
    }

    #[inline(always)]
    pub fn protocol_version(&self) -> u8 {
        self.encoder.protocol_version()
    }

    pub fn set_protocol_version(&mut self, version: u8) {
        self.encoder.set_protocol_version(version);
    }

    pub fn get_ref(&self) -> &W {
        &self.stream
    }

    pub fn into_inner(self) -> W {
        self.stream
    }

    /// Serialisasi lalu kirim satu message; return jumlah byte yang ditulis.
    /// Tidak ada byte yang dikirim jika serialisasi gagal.
    pub fn write(&mut self, value: &Value, kind: MessageType) -> Result<usize, WriterError> {
        let bytes = self.encoder.encode(value, kind)?;
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        tracing::trace!(kind = %kind, size = bytes.len(), "message sent");
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Endianness;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Reader yang mengembalikan maksimal `step` byte per call
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ProtocolDebugSink for Recorder {
        fn dump(&self, _header: &[u8], _payload: &[u8], error: &ReaderError) {
            self.0.lock().unwrap().push(error.to_string());
        }
    }

    #[test]
    fn test_write_then_read() {
        let mut writer = MessageWriter::new(Vec::new(), 3, TextEncoding::Utf8);
        let value = Value::symbols(["a", "b"]);
        let written = writer.write(&value, MessageType::Sync).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(written, bytes.len());

        let mut reader = MessageReader::new(Cursor::new(bytes), TextEncoding::Utf8);
        let msg = reader.read(false).unwrap();
        assert_eq!(msg.kind, MessageType::Sync);
        assert_eq!(msg.endianness, Endianness::Little);
        assert_eq!(msg.size, written);
        assert_eq!(msg.data, value);
    }

    #[test]
    fn test_small_chunks() {
        let bytes = [1, 2, 0, 0, 17, 0, 0, 0, 0xf9, 1, 0, 0, 0, 0, 0, 0, 0];
        let mut reader = MessageReader::new(Trickle { data: &bytes, step: 3 }, TextEncoding::Utf8)
            .with_max_reading_chunk(2);
        assert_eq!(reader.read(false).unwrap().data, Value::Long(1));
    }

    #[test]
    fn test_raw_mode() {
        let bytes = [1, 2, 0, 0, 10, 0, 0, 0, 0xff, 0x01];
        let mut reader = MessageReader::new(Cursor::new(bytes), TextEncoding::Utf8);
        let msg = reader.read(true).unwrap();
        assert!(msg.raw);
        assert_eq!(msg.raw_bytes(), Some(&[0xff, 0x01][..]));
    }

    #[test]
    fn test_truncated_stream_is_io_error() {
        let bytes = [1, 2, 0, 0, 17, 0, 0, 0, 0xf9, 1];
        let mut reader = MessageReader::new(Cursor::new(bytes), TextEncoding::Utf8);
        let err = reader.read(false).unwrap_err();
        assert!(matches!(err, ReaderError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_unknown_kind_drains_payload() {
        let mut bytes = vec![1, 5, 0, 0, 20, 0, 0, 0];
        bytes.extend_from_slice(&[0xf9, 7, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        bytes.extend_from_slice(&[1, 2, 0, 0, 17, 0, 0, 0, 0xf9, 42, 0, 0, 0, 0, 0, 0, 0]);
        let mut reader = MessageReader::new(Cursor::new(bytes), TextEncoding::Utf8);

        assert!(matches!(
            reader.read(false),
            Err(ReaderError::UnexpectedMessage(ref m)) if m == "message type 5"
        ));
        let msg = reader.read(false).unwrap();
        assert_eq!(msg.kind, MessageType::Response);
        assert_eq!(msg.data, Value::Long(42));
    }

    #[test]
    fn test_oversized_declared_payload_fails_without_full_allocation() {
        // 2 GiB dideklarasikan, hanya 3 byte dikirim
        let bytes = [1, 2, 0, 0, 0xff, 0xff, 0xff, 0x7f, 0xf9, 1, 0];
        let mut reader = MessageReader::new(Cursor::new(bytes), TextEncoding::Utf8);
        let err = reader.read(false).unwrap_err();
        assert!(matches!(err, ReaderError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_decode_failure_reaches_sink() {
        let recorder = Arc::new(Recorder::default());
        let sink: Arc<dyn ProtocolDebugSink> = recorder.clone();
        // tag 77 tidak terdaftar
        let bytes = [1, 2, 0, 0, 9, 0, 0, 0, 77];
        let mut reader =
            MessageReader::new(Cursor::new(bytes), TextEncoding::Utf8).with_debug_sink(Some(sink));
        assert!(reader.read(false).is_err());
        assert_eq!(recorder.0.lock().unwrap().len(), 1);

        // remote error tidak di-dump
        let bytes = [1, 2, 0, 0, 14, 0, 0, 0, 0x80, b't', b'y', b'p', b'e', 0];
        let mut reader = MessageReader::new(Cursor::new(bytes), TextEncoding::Utf8)
            .with_debug_sink(Some(recorder.clone() as Arc<dyn ProtocolDebugSink>));
        assert!(matches!(reader.read(false), Err(ReaderError::Remote(ref m)) if m == "type"));
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }
}
