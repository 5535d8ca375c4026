//! Codec tests terhadap captured q IPC payloads
//!
//! Setiap fixture adalah payload (tanpa header) seperti yang dikirim q,
//! dibungkus ke message lengkap lalu dibaca lewat `MessageReader`.

use std::io::Cursor;

use qwire::core::{
    Date, Dictionary, Function, KeyedTable, Lambda, Projection, Table, Time, Timespan, Timestamp,
};
use qwire::protocol::{
    Encoder, Endianness, MessageReader, MessageType, MessageWriter, QType, TextEncoding,
    HEADER_SIZE,
};
use qwire::{ReaderError, Value, WriterError};
use uuid::Uuid;

fn hex(text: &str) -> Vec<u8> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    digits
        .chunks(2)
        .map(|pair| u8::from_str_radix(std::str::from_utf8(pair).unwrap(), 16).unwrap())
        .collect()
}

/// Little-endian response message di sekitar payload
fn frame(payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![1, 2, 0, 0];
    bytes.extend_from_slice(&((payload.len() + HEADER_SIZE) as i32).to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

fn decode(payload: &[u8]) -> Result<Value, ReaderError> {
    let mut reader = MessageReader::new(Cursor::new(frame(payload)), TextEncoding::Utf8);
    reader.read(false).map(|m| m.data)
}

fn encode(value: &Value) -> Vec<u8> {
    let mut encoder = Encoder::new(3, TextEncoding::Utf8);
    encoder.encode(value, MessageType::Sync).unwrap()[HEADER_SIZE..].to_vec()
}

fn lambda() -> Value {
    Value::Function(Function::Lambda(Lambda::new("{x+y}").unwrap()))
}

fn positions_table() -> Table {
    Table::new(
        vec!["pos".into(), "dates".into()],
        vec![
            Value::symbols(["d1", "d2", "d3"]),
            Value::DateList(vec![Date::new(366), Date::new(121), Date::NULL]),
        ],
    )
    .unwrap()
}

fn fixtures() -> Vec<(&'static str, Value)> {
    vec![
        ("f9 0100000000000000", Value::Long(1)),
        ("fa 01000000", Value::Int(1)),
        ("fb 16ff", Value::Short(-234)),
        ("ff 01", Value::Bool(true)),
        ("fc 2a", Value::Byte(0x2a)),
        ("0a00 03000000 616263", Value::string("abc")),
        ("f5 61626300", Value::symbol("abc")),
        ("6500", Value::Null),
        ("64 00 0a00 05000000 7b782b797d", lambda()),
        (
            "68 02000000 64000a00050000007b782b797d f9 0300000000000000",
            Value::Function(Function::Projection(Projection::new(vec![
                lambda(),
                Value::Long(3),
            ]))),
        ),
        (
            "63 0b00 01000000 6100 07 00 01000000 0100000000000000",
            Dictionary::new(Value::symbols(["a"]), Value::LongList(vec![1]))
                .unwrap()
                .into(),
        ),
        (
            "62 00 63 0b00 02000000 706f7300 646174657300 00 00 02000000 \
             0b00 03000000 643100 643200 643300 0e00 03000000 6e010000 79000000 00000080",
            Value::Table(positions_table()),
        ),
        (
            "fe 8c680a015a495aab5a65d4bfddb6a661",
            Value::Guid(Uuid::parse_str("8c680a01-5a49-5aab-5a65-d4bfddb6a661").unwrap()),
        ),
    ]
}

#[test]
fn test_decode_fixtures() {
    for (payload, expected) in fixtures() {
        assert_eq!(decode(&hex(payload)).unwrap(), expected, "payload {payload}");
    }
}

#[test]
fn test_encode_fixtures() {
    for (payload, value) in fixtures() {
        assert_eq!(encode(&value), hex(payload), "value {value}");
    }
}

#[test]
fn test_remote_error_is_raised() {
    let err = decode(&hex("80 7479706500")).unwrap_err();
    assert!(matches!(err, ReaderError::Remote(ref m) if m == "type"));
}

#[test]
fn test_decode_table_rows() {
    let table = match decode(&hex(fixtures()[11].0)).unwrap() {
        Value::Table(t) => t,
        other => panic!("expected table, got {other}"),
    };
    assert_eq!(table.rows_count(), 3);
    assert_eq!(table.column_index("dates"), Some(1));
    let row = table.row(1).unwrap();
    assert_eq!(row.get(0), Some(Value::symbol("d2")));
    assert_eq!(row.get(1), Some(Value::Date(Date::new(121))));
    assert_eq!(row.get(1).unwrap().to_string(), "2000.05.01");
    assert!(table.row(2).unwrap().get(1).unwrap().is_null());
}

#[test]
fn test_keyed_table_round_trip() {
    let keys = Table::new(vec!["eid".into()], vec![Value::LongList(vec![1001, 1002, 1003])]).unwrap();
    let keyed = KeyedTable::new(keys, positions_table()).unwrap();
    let payload = encode(&Value::KeyedTable(Box::new(keyed.clone())));
    assert_eq!(payload[0], 99);
    assert_eq!(payload[1], 98);

    match decode(&payload).unwrap() {
        Value::KeyedTable(decoded) => {
            assert_eq!(decoded.keys().rows_count(), 3);
            assert_eq!(decoded.values().rows_count(), 3);
            assert_eq!(*decoded, keyed);
        }
        other => panic!("expected keyed table, got {other}"),
    }
}

#[test]
fn test_dictionary_with_table_values() {
    let dict = Dictionary::new(
        Value::symbols(["x", "y", "z"]),
        Value::Table(positions_table()),
    )
    .unwrap();
    let value = Value::from(dict);
    assert_eq!(decode(&encode(&value)).unwrap(), value);
}

#[test]
fn test_compressed_message() {
    // 10#`q, compressed oleh q
    let bytes = hex(
        "01 00 01 00 1a000000 \
         22000000 00 0b000a000000 7100 03 7104 710a",
    );
    let mut reader = MessageReader::new(Cursor::new(bytes), TextEncoding::Utf8);
    let message = reader.read(false).unwrap();
    assert_eq!(message.kind, MessageType::Async);
    assert!(message.compressed);
    assert_eq!(message.size, 26);
    assert_eq!(message.data_size, 26);
    assert_eq!(message.data, Value::symbols(vec!["q"; 10]));
}

#[test]
fn test_compressed_empty_payload_is_rejected() {
    let bytes = hex("01 02 01 00 08000000");
    let mut reader = MessageReader::new(Cursor::new(bytes), TextEncoding::Utf8);
    assert!(matches!(
        reader.read(false),
        Err(ReaderError::InvalidCompressedSize(_))
    ));
}

#[test]
fn test_big_endian_message() {
    let bytes = hex("00 02 00 00 0000000d fa 00000001");
    let mut reader = MessageReader::new(Cursor::new(bytes), TextEncoding::Utf8);
    let message = reader.read(false).unwrap();
    assert_eq!(message.endianness, Endianness::Big);
    assert_eq!(message.data, Value::Int(1));
}

#[test]
fn test_time_text_round_trip() {
    let time: Time = "51:46:39.001".parse().unwrap();
    assert_eq!(time.value(), 186_399_001);
    assert_eq!(time.to_string(), "51:46:39.001");
}

#[test]
fn test_guid_rejected_before_version_3() {
    let guid = Value::Guid(Uuid::from_u128(0x8c68_0a01_5a49_5aab_5a65_d4bf_ddb6_a661));
    let mut writer = MessageWriter::new(Vec::new(), 0, TextEncoding::Utf8);
    let err = writer.write(&guid, MessageType::Sync).unwrap_err();
    assert!(matches!(
        err,
        WriterError::ProtocolVersion {
            qtype: QType::Guid,
            required: 3,
            negotiated: 0
        }
    ));
    assert!(writer.get_ref().is_empty());

    writer.set_protocol_version(3);
    assert!(writer.write(&guid, MessageType::Sync).is_ok());
}

#[test]
fn test_nanosecond_types_need_version_1() {
    let mut encoder = Encoder::new(0, TextEncoding::Utf8);
    for value in [
        Value::Timestamp(Timestamp::new(0)),
        Value::Timespan(Timespan::new(0)),
        Value::TimestampList(vec![]),
        Value::TimespanList(vec![]),
    ] {
        assert!(encoder.encode(&value, MessageType::Async).is_err(), "{value}");
    }
    encoder.set_protocol_version(1);
    assert!(encoder
        .encode(&Value::Timestamp(Timestamp::new(0)), MessageType::Async)
        .is_ok());
}

#[test]
fn test_nested_general_list_round_trip() {
    let value = Value::List(vec![
        Value::string("f"),
        Value::symbols(["a", "b"]),
        Value::List(vec![Value::Float(1.5), Value::Char('x'), Value::Null]),
        Value::FloatList(vec![f64::NAN, 2.0]),
        Value::TimeList(vec![Time::new(1), Time::NULL]),
    ]);
    assert_eq!(decode(&encode(&value)).unwrap(), value);
}

#[test]
fn test_latin1_symbols() {
    let mut encoder = Encoder::new(3, TextEncoding::Latin1);
    let bytes = encoder
        .encode(&Value::symbol("café"), MessageType::Async)
        .unwrap()
        .to_vec();
    assert_eq!(&bytes[HEADER_SIZE..], &[0xf5, b'c', b'a', b'f', 0xe9, 0]);

    let mut reader = MessageReader::new(Cursor::new(bytes), TextEncoding::Latin1);
    assert_eq!(reader.read(false).unwrap().data, Value::symbol("café"));
}

#[test]
fn test_unknown_tag_is_type_error() {
    assert!(matches!(decode(&[0x4d]), Err(ReaderError::Type(_))));
}

#[test]
fn test_table_round_trip_at_version_1() {
    let mut encoder = Encoder::new(1, TextEncoding::Utf8);
    let table = Value::Table(positions_table());
    let payload = encoder.encode(&table, MessageType::Sync).unwrap()[HEADER_SIZE..].to_vec();

    let decoded = decode(&payload).unwrap();
    assert_eq!(decoded, table);
    let dates = decoded.as_table().unwrap().column("dates").unwrap();
    assert_eq!(dates.element(2).unwrap().to_string(), "0Nd");
}
