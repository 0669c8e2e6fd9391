// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::Buf;
use bytes::Bytes;
use std::io::Cursor;
use std::string::FromUtf8Error;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    #[error("expected '*', got '{}'", char::from(*.0))]
    ExpectedArray(u8),
    #[error("expected '$', got '{}'", char::from(*.0))]
    ExpectedBulkString(u8),
    #[error("invalid length '{0}'")]
    InvalidLength(String),
    #[error("bulk string length mismatch")]
    LengthMismatch,
    /// Invalid message encoding.
    #[error("{0}")]
    Other(crate::Error),
}

/// A single RESP2 value. Every reply the server produces is one of these variants, and requests are
/// always an `Array` of `Bulk` strings.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

// Protocol specification: https://redis.io/docs/reference/protocol-spec/
impl Frame {
    /// Parses any RESP2 value. Used to read replies (e.g. by clients and tests); the server reads
    /// requests with [`Frame::parse_request`].
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        // The first byte in an RESP-serialized payload always identifies its type.
        // Subsequent bytes constitute the type's contents.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => {
                let bytes = get_line(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Simple(string))
            }
            DataType::SimpleError => {
                let bytes = get_line(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Error(string))
            }
            DataType::Integer => {
                let line = get_line(src)?;
                let integer = parse_decimal::<i64>(line)?;

                Ok(Frame::Integer(integer))
            }
            // $<length>\r\n<data>\r\n
            DataType::BulkString => match get_length(src)? {
                Some(length) => get_bulk(src, length).map(Frame::Bulk),
                None => Ok(Frame::Null),
            },
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => {
                let length = match get_length(src)? {
                    Some(length) => length,
                    None => return Ok(Frame::Null),
                };

                let mut frames = Vec::with_capacity(length.min(1024));
                for _ in 0..length {
                    let frame = Self::parse(src)?;
                    frames.push(frame);
                }

                Ok(Frame::Array(frames))
            }
        }
    }

    /// Parses a client request: an array marker line with the element count, followed by exactly
    /// that many bulk strings. Anything else is a protocol error.
    pub fn parse_request(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let first_byte = get_byte(src)?;
        if first_byte != u8::from(DataType::Array) {
            return Err(Error::ExpectedArray(first_byte));
        }

        let count = get_length(src)?.ok_or_else(|| Error::InvalidLength("-1".to_string()))?;

        let mut parts = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let marker = get_byte(src)?;
            if marker != u8::from(DataType::BulkString) {
                return Err(Error::ExpectedBulkString(marker));
            }

            let length =
                get_length(src)?.ok_or_else(|| Error::InvalidLength("-1".to_string()))?;
            parts.push(Frame::Bulk(get_bulk(src, length)?));
        }

        Ok(Frame::Array(parts))
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::Simple(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleString));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Error(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleError));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Integer(i) => {
                let digits = i.to_string();
                let mut bytes = Vec::with_capacity(1 + digits.len() + CRLF.len());
                bytes.push(u8::from(DataType::Integer));
                bytes.extend_from_slice(digits.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Bulk(bytes) => {
                let length_str = bytes.len().to_string();
                let mut result = Vec::with_capacity(
                    1 + length_str.len() + CRLF.len() + bytes.len() + CRLF.len(),
                );
                result.push(u8::from(DataType::BulkString));
                result.extend_from_slice(length_str.as_bytes());
                result.extend_from_slice(CRLF);
                result.extend_from_slice(bytes);
                result.extend_from_slice(CRLF);
                result
            }
            // RESP2 null bulk string, also used for nil elements inside arrays.
            Frame::Null => b"$-1\r\n".to_vec(),
            Frame::Array(arr) => {
                let length_str = arr.len().to_string();
                let mut bytes = Vec::with_capacity(1 + length_str.len() + CRLF.len());
                bytes.push(u8::from(DataType::Array));
                bytes.extend_from_slice(length_str.as_bytes());
                bytes.extend_from_slice(CRLF);
                for frame in arr {
                    bytes.extend(frame.serialize());
                }
                bytes
            }
        }
    }

    /// Builds a request frame, the way a client would send it.
    pub fn request<I, T>(parts: I) -> Frame
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        Frame::Array(
            parts
                .into_iter()
                .map(|part| Frame::Bulk(part.into()))
                .collect(),
        )
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(arr) => {
                write!(f, "*{}\r\n", arr.len())?;
                for frame in arr {
                    write!(f, "{}\r\n", frame)?;
                }
                Ok(())
            }
        }
    }
}

/// Reads up to the next CRLF and moves the cursor past it.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let end = src.get_ref().len();

    let line_end = src.get_ref()[start..end]
        .windows(2)
        .position(|window| window == CRLF)
        .ok_or(Error::Incomplete)
        .map(|index| start + index)?;

    src.set_position((line_end + CRLF.len()) as u64);

    Ok(&src.get_ref()[start..line_end])
}

/// Reads a length line. `-1` means null; any other negative value is rejected.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, Error> {
    let line = get_line(src)?;
    let length = parse_decimal::<i64>(line)?;

    match length {
        -1 => Ok(None),
        length if length < 0 => Err(Error::InvalidLength(length.to_string())),
        length => Ok(Some(length as usize)),
    }
}

/// Reads exactly `length` bytes followed by a CRLF terminator.
fn get_bulk(src: &mut Cursor<&[u8]>, length: usize) -> Result<Bytes, Error> {
    let start = src.position() as usize;
    let available = src.get_ref().len() - start;

    if available < length + CRLF.len() {
        return Err(Error::Incomplete);
    }

    let data = &src.get_ref()[start..start + length];
    if &src.get_ref()[start + length..start + length + CRLF.len()] != CRLF {
        return Err(Error::LengthMismatch);
    }

    src.set_position((start + length + CRLF.len()) as u64);

    Ok(Bytes::copy_from_slice(data))
}

fn parse_decimal<T: std::str::FromStr>(line: &[u8]) -> Result<T, Error> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| Error::InvalidLength(String::from_utf8_lossy(line).into_owned()))
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    Array,        // '*'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::Array => b'*',
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        "protocol error; invalid frame format".into()
    }
}

impl From<&str> for Error {
    fn from(src: &str) -> Error {
        src.to_string().into()
    }
}

impl From<String> for Error {
    fn from(src: String) -> Error {
        Error::Other(src.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_string_frame() {
        let data = b"+OK\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(frame, Ok(Frame::Simple(ref s)) if s == "OK"));
    }

    #[test]
    fn parse_simple_error_frame() {
        let data = b"-Error message\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(
            frame,
            Ok(Frame::Error(ref s)) if s == "Error message"
        ));
    }

    fn parse_integer_frame(data: &[u8], expected: i64) {
        let mut cursor = Cursor::new(data);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(frame, Ok(Frame::Integer(i)) if i == expected));
    }

    #[test]
    fn parse_integer_frame_positive() {
        parse_integer_frame(b":1000\r\n", 1000);
    }

    #[test]
    fn parse_integer_frame_negative() {
        parse_integer_frame(b":-1000\r\n", -1000);
    }

    #[test]
    fn parse_integer_frame_positive_signed() {
        parse_integer_frame(b":+1000\r\n", 1000);
    }

    #[test]
    fn parse_bulk_string_frame() {
        let data = b"$6\r\nfoobar\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(
            frame,
            Ok(Frame::Bulk(ref b)) if b == &Bytes::from("foobar")
        ));
    }

    #[test]
    fn parse_bulk_string_with_crlf_inside() {
        let data = b"$8\r\nfoo\r\nbar\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor).unwrap();

        assert_eq!(frame, Frame::Bulk(Bytes::from("foo\r\nbar")));
    }

    #[test]
    fn parse_bulk_string_frame_empty() {
        let data = b"$0\r\n\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(
            frame,
            Ok(Frame::Bulk(ref b)) if b == &Bytes::from("")
        ));
    }

    #[test]
    fn parse_bulk_string_frame_null() {
        let data = b"$-1\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(frame, Ok(Frame::Null)));
    }

    #[test]
    fn parse_array_frame_nested() {
        let data = b"*2\r\n*3\r\n:1\r\n:2\r\n:3\r\n*2\r\n+Hello\r\n-World\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor).unwrap();

        assert_eq!(
            frame,
            Frame::Array(vec![
                Frame::Array(vec![
                    Frame::Integer(1),
                    Frame::Integer(2),
                    Frame::Integer(3)
                ]),
                Frame::Array(vec![
                    Frame::Simple("Hello".to_string()),
                    Frame::Error("World".to_string())
                ])
            ])
        );
    }

    #[test]
    fn parse_array_frame_null_in_the_middle() {
        let data = b"*3\r\n$5\r\nhello\r\n$-1\r\n$5\r\nworld\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor).unwrap();

        assert_eq!(
            frame,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("hello")),
                Frame::Null,
                Frame::Bulk(Bytes::from("world")),
            ])
        );
    }

    #[test]
    fn parse_request() {
        let data = b"*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$5\r\nMarko\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse_request(&mut cursor).unwrap();

        assert_eq!(frame, Frame::request(["SET", "name", "Marko"]));
        assert_eq!(cursor.position() as usize, data.len());
    }

    #[test]
    fn parse_request_incomplete() {
        let data = b"*2\r\n$4\r\nECHO\r\n$5\r\nhel";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse_request(&mut cursor);

        assert!(matches!(frame, Err(Error::Incomplete)));
    }

    #[test]
    fn parse_request_requires_array() {
        let data = b"+PING\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse_request(&mut cursor);

        assert!(matches!(frame, Err(Error::ExpectedArray(b'+'))));
    }

    #[test]
    fn parse_request_invalid_count() {
        let data = b"*abc\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse_request(&mut cursor);

        assert!(matches!(frame, Err(Error::InvalidLength(ref s)) if s == "abc"));
    }

    #[test]
    fn parse_request_requires_bulk_strings() {
        let data = b"*1\r\n:1\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse_request(&mut cursor);

        assert!(matches!(frame, Err(Error::ExpectedBulkString(b':'))));
    }

    #[test]
    fn parse_request_negative_bulk_length() {
        let data = b"*1\r\n$-5\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse_request(&mut cursor);

        assert!(matches!(frame, Err(Error::InvalidLength(_))));
    }

    #[test]
    fn parse_request_length_mismatch() {
        let data = b"*1\r\n$3\r\nPING\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse_request(&mut cursor);

        assert!(matches!(frame, Err(Error::LengthMismatch)));
    }

    #[test]
    fn serialize_null_as_resp2_bulk() {
        assert_eq!(Frame::Null.serialize(), b"$-1\r\n".to_vec());
    }

    #[test]
    fn serialize_array_with_null() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("a")),
            Frame::Null,
            Frame::Integer(3),
        ]);

        assert_eq!(frame.serialize(), b"*3\r\n$1\r\na\r\n$-1\r\n:3\r\n".to_vec());
    }

    #[test]
    fn replies_survive_a_wire_trip() {
        let replies = vec![
            Frame::Simple("OK".to_string()),
            Frame::Error("ERR unknown command 'foo'".to_string()),
            Frame::Integer(-2),
            Frame::Bulk(Bytes::from("Marko!")),
            Frame::Null,
            Frame::Array(vec![Frame::Bulk(Bytes::from("x")), Frame::Null]),
        ];

        for reply in replies {
            let bytes = reply.serialize();
            let mut cursor = Cursor::new(&bytes[..]);
            assert_eq!(Frame::parse(&mut cursor).unwrap(), reply);
        }
    }
}
