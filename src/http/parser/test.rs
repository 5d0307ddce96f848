use bytes::BytesMut;

use super::{HeadParser, MAX_HEAD_SIZE, parse_header, parse_status_line};
use crate::common::ParseResult;
use crate::http::{ProtoError, StatusCode, Version};

macro_rules! ready {
    ($e:expr) => {
        match $e {
            ParseResult::Ok(ok) => ok,
            ParseResult::Err(err) => panic!("unexpected `ParseResult::Err`: {err:?}"),
            ParseResult::Pending => panic!("unexpected `ParseResult::Pending`"),
        }
    };
}

#[test]
fn test_parse_status_line() {
    macro_rules! test {
        (#[pending] $input:literal) => {
            let mut bytes = BytesMut::from(&$input[..]);
            match parse_status_line(&mut bytes) {
                ParseResult::Pending => {}
                ParseResult::Ok(val) => panic!("expected `Pending`, but its `Ok` with: {val:?}"),
                ParseResult::Err(val) => panic!("expected `Pending`, but its `Err` with: {val:?}"),
            }
            assert_eq!(&bytes[..], $input);
        };
        (#[error($err:ident)] $input:literal) => {
            let mut bytes = BytesMut::from(&$input[..]);
            match parse_status_line(&mut bytes) {
                ParseResult::Ok(ok) => panic!("expected `Err` but returns `Ok` with {ok:?}"),
                ParseResult::Err(err) => assert_eq!(err, ProtoError::$err),
                ParseResult::Pending => panic!("line {}, unexpected Pending", line!()),
            }
        };
        {
            $input:literal;
            $v:ident, $code:literal, $reason:literal;
            $rest:literal
        } => {
            let mut bytes = BytesMut::from(&$input[..]);

            let line = ready!(parse_status_line(&mut bytes));

            assert_eq!(line.version, Version::$v);
            assert_eq!(line.status.as_u16(), $code);
            assert_eq!(line.reason, $reason);
            assert_eq!(&bytes[..], $rest, "invalid remaining bytes");
        };
    }

    test! {
        b"HTTP/1.1 200 OK\r\n";
        HTTP_11, 200, "OK";
        b""
    }
    test! {
        b"HTTP/1.0 404 Not Found\nContent-Type: text/html\r\n";
        HTTP_10, 404, "Not Found";
        b"Content-Type: text/html\r\n"
    }
    test! {
        b"HTTP/1.1 204\r\n\r\n";
        HTTP_11, 204, "";
        b"\r\n"
    }
    test! {
        b"HTTP/1.1 599 \r\n";
        HTTP_11, 599, "";
        b""
    }

    test!(#[pending] b"");
    test!(#[pending] b"HTTP/1.1 200 OK");
    test!(#[pending] b"HTTP/1.1 200 OK\r");

    test!(#[error(InvalidSeparator)] b"HTTP/1.1 200 OK\rX");
    test!(#[error(InvalidStatusLine)] b"ICY 200 OK\r\n");
    test!(#[error(InvalidStatusLine)] b"HTTP/1.1\r\n");
    test!(#[error(UnsupportedVersion)] b"HTTP/2.0 200 OK\r\n");
    test!(#[error(InvalidStatus)] b"HTTP/1.1 2x0 OK\r\n");
    test!(#[error(InvalidStatus)] b"HTTP/1.1 2000 OK\r\n");
    test!(#[error(InvalidStatus)] b"HTTP/1.1 099 Nope\r\n");
}

#[test]
fn test_parse_header() {
    macro_rules! test {
        (#[pending] $input:literal) => {
            let mut bytes = BytesMut::from(&$input[..]);
            assert!(parse_header(&mut bytes).is_pending());
            assert_eq!(&bytes[..], $input);
        };
        (#[end] $input:literal; $rest:literal) => {
            let mut bytes = BytesMut::from(&$input[..]);
            assert!(ready!(parse_header(&mut bytes)).is_none());
            assert_eq!(&bytes[..], $rest);
        };
        (#[error] $input:literal) => {
            let mut bytes = BytesMut::from(&$input[..]);
            assert!(matches!(parse_header(&mut bytes), ParseResult::Err(_)));
        };
        ($input:literal; $name:literal, $value:literal; $rest:literal) => {
            let mut bytes = BytesMut::from(&$input[..]);
            let header = ready!(parse_header(&mut bytes)).expect("expected header");
            assert_eq!(header.name, $name);
            assert_eq!(header.value, $value);
            assert_eq!(&bytes[..], $rest, "invalid remaining bytes");
        };
    }

    test!(b"Content-Type: text/plain\r\n"; "Content-Type", "text/plain"; b"");
    test!(b"Content-Length:13\n\r\n"; "Content-Length", "13"; b"\r\n");
    test!(b"X-Empty:\r\nX-Next: 1\r\n"; "X-Empty", ""; b"X-Next: 1\r\n");
    test!(b"X-Pad: \t spaced \t\r\n"; "X-Pad", "spaced"; b"");

    test!(#[end] b"\r\nbody"; b"body");
    test!(#[end] b"\nbody"; b"body");

    test!(#[pending] b"");
    test!(#[pending] b"\r");
    test!(#[pending] b"Content-Type: text/");

    test!(#[error] b"\rX");
    test!(#[error] b"No colon\r\n");
    test!(#[error] b": empty name\r\n");
    test!(#[error] b"Bad Name: x\r\n");
}

#[test]
fn test_head_parser() {
    let mut parser = HeadParser::new();
    let mut bytes = BytesMut::from(&b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nSet-"[..]);
    assert!(parser.parse(&mut bytes).is_pending());
    assert_eq!(&bytes[..], b"Set-");

    bytes.extend_from_slice(b"Cookie: a=1\r\nset-cookie: b=2\r\n\r\nHello");
    let head = ready!(parser.parse(&mut bytes));

    assert_eq!(head.version, Version::HTTP_10);
    assert_eq!(head.status, StatusCode::OK);
    assert_eq!(head.reason, "OK");
    assert_eq!(head.headers.len(), 2);
    assert_eq!(head.headers.get("content-type"), Some("text/plain"));
    assert_eq!(head.headers.get("SET-COOKIE"), Some("a=1, b=2"));
    assert_eq!(head.headers.get("x-missing"), None);
    assert_eq!(
        head.headers.raw(),
        "Content-Type: text/plain\r\nSet-Cookie: a=1\r\nset-cookie: b=2\r\n"
    );
    assert_eq!(&bytes[..], b"Hello");
}

#[test]
fn test_head_too_large() {
    let mut parser = HeadParser::new();
    let mut bytes = BytesMut::from(&b"HTTP/1.1 200 OK\r\n"[..]);
    bytes.extend_from_slice(b"X-Big: ");
    bytes.extend_from_slice(&vec![b'a'; MAX_HEAD_SIZE]);

    match parser.parse(&mut bytes) {
        ParseResult::Err(err) => assert_eq!(err, ProtoError::TooLarge),
        other => panic!("expected `TooLarge`, got {other:?}"),
    }
}
