use bytes::{BufMut, BytesMut};

use crate::url::Url;

/// Write `GET` request head.
///
/// With `absolute`, the request target is the absolute url, as required when talking to a proxy.
pub fn write_get(dst: &mut BytesMut, url: &Url, absolute: bool, user_agent: &str) {
    dst.put_slice(b"GET ");
    if absolute {
        dst.put_slice(url.scheme().as_bytes());
        dst.put_slice(b"://");
        dst.put_slice(url.host().as_bytes());
    }
    if url.path().is_empty() {
        dst.put_u8(b'/');
    }
    dst.put_slice(url.path_and_query().as_bytes());

    dst.put_slice(b" HTTP/1.0\r\nHost: ");
    dst.put_slice(url.host().as_bytes());
    dst.put_slice(b"\r\nAccept: */*\r\n");
    if !user_agent.is_empty() {
        dst.put_slice(b"User-Agent: ");
        dst.put_slice(user_agent.as_bytes());
        dst.put_slice(b"\r\n");
    }
    dst.put_slice(b"Connection: close\r\n\r\n");
}

/// Write `CONNECT` request head for a proxy tunnel.
pub fn write_connect(dst: &mut BytesMut, hostname: &str, port: u16) {
    let mut port_buf = itoa::Buffer::new();
    let port = port_buf.format(port);

    dst.put_slice(b"CONNECT ");
    dst.put_slice(hostname.as_bytes());
    dst.put_u8(b':');
    dst.put_slice(port.as_bytes());
    dst.put_slice(b" HTTP/1.0\r\nHost: ");
    dst.put_slice(hostname.as_bytes());
    dst.put_u8(b':');
    dst.put_slice(port.as_bytes());
    dst.put_slice(b"\r\n\r\n");
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_get() {
        let mut dst = BytesMut::new();
        write_get(&mut dst, &Url::parse("http://localhost:8080").unwrap(), false, "");
        assert_eq!(
            &dst[..],
            b"GET / HTTP/1.0\r\nHost: localhost:8080\r\nAccept: */*\r\nConnection: close\r\n\r\n"
        );

        let mut dst = BytesMut::new();
        let url = Url::parse("http://example.com/a/b?q=1#frag").unwrap();
        write_get(&mut dst, &url, false, "fetch/1.0");
        assert_eq!(
            &dst[..],
            b"GET /a/b?q=1 HTTP/1.0\r\nHost: example.com\r\nAccept: */*\r\n\
            User-Agent: fetch/1.0\r\nConnection: close\r\n\r\n"
        );

        let mut dst = BytesMut::new();
        write_get(&mut dst, &Url::parse("http://example.com?q").unwrap(), true, "");
        assert_eq!(
            &dst[..],
            b"GET http://example.com/?q HTTP/1.0\r\nHost: example.com\r\nAccept: */*\r\n\
            Connection: close\r\n\r\n"
        );
    }

    #[test]
    fn test_write_connect() {
        let mut dst = BytesMut::new();
        write_connect(&mut dst, "example.com", 443);
        assert_eq!(
            &dst[..],
            b"CONNECT example.com:443 HTTP/1.0\r\nHost: example.com:443\r\n\r\n"
        );
    }
}
