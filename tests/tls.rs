use std::{
    io::{Read, Write},
    net::{Shutdown, TcpListener},
    sync::Arc,
    thread::{self, JoinHandle},
};
use rustls::{
    ServerConfig, ServerConnection, StreamOwned,
    crypto::ring::default_provider,
    pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer},
};
use urlstream::{
    Error, OptionSet, StreamBuf, Url,
    http::StatusCode,
    option::{Proxy, TlsVerify},
};

// ===== Tls Server =====

fn server_config() -> Arc<ServerConfig> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let key = PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());
    let certs = vec![cert.cert.der().clone()];

    let config = ServerConfig::builder_with_provider(Arc::new(default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(certs, PrivateKeyDer::from(key))
        .unwrap();
    Arc::new(config)
}

/// Serve one https exchange per connection with a self signed `localhost` certificate.
///
/// With `proxy`, each connection starts with a `CONNECT` request which is accepted before the
/// handshake. Every received request head is recorded.
struct TlsServer {
    port: u16,
    handle: JoinHandle<Vec<String>>,
}

impl TlsServer {
    fn start(connections: usize, proxy: bool, response: &'static [u8]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = server_config();

        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for _ in 0..connections {
                let (mut io, _) = listener.accept().unwrap();
                if proxy {
                    requests.push(read_request(&mut io));
                    io.write_all(b"HTTP/1.0 200 Connection established\r\n\r\n").unwrap();
                }

                let conn = ServerConnection::new(config.clone()).unwrap();
                let mut tls = StreamOwned::new(conn, io);
                // handshake failure leaves the request empty
                requests.push(read_request(&mut tls));

                let _ = tls.write_all(response);
                tls.conn.send_close_notify();
                let _ = tls.flush();
                let _ = tls.sock.shutdown(Shutdown::Write);
            }
            requests
        });

        Self { port, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("https://localhost:{}{path}", self.port)
    }

    fn stop(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}

fn read_request(io: &mut impl Read) -> String {
    let mut request = Vec::new();
    let mut byte = [0u8; 1];
    while !request.ends_with(b"\r\n\r\n") {
        match io.read(&mut byte) {
            Ok(1) => request.push(byte[0]),
            _ => break,
        }
    }
    String::from_utf8(request).unwrap()
}

fn read_all(stream: &mut StreamBuf) -> Result<Vec<u8>, Error> {
    let mut content = Vec::new();
    let mut buf = [0u8; 16];
    loop {
        match stream.read(&mut buf)? {
            0 => return Ok(content),
            n => content.extend_from_slice(&buf[..n]),
        }
    }
}

const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 13\r\n\r\nHello, World!";

// ===== Https =====

#[test]
fn https_without_verification() {
    let server = TlsServer::start(1, false, RESPONSE);

    let mut stream = StreamBuf::new();
    stream.set_option(TlsVerify(false));
    stream.open(server.url("/secure")).unwrap();

    assert_eq!(stream.status(), Some(StatusCode::OK));
    assert_eq!(stream.content_length(), Some(13));
    assert_eq!(read_all(&mut stream).unwrap(), b"Hello, World!");
    assert!(stream.error().is_none());

    let port = server.port;
    let requests = server.stop();
    assert_eq!(
        requests[0],
        format!(
            "GET /secure HTTP/1.0\r\nHost: localhost:{port}\r\nAccept: */*\r\n\
            Connection: close\r\n\r\n"
        )
    );
}

#[test]
fn https_untrusted_certificate() {
    let server = TlsServer::start(1, false, RESPONSE);

    let mut stream = StreamBuf::new();
    let err = stream.open(server.url("/")).unwrap_err();

    assert!(matches!(err, Error::Tls(_)), "{err:?}");
    assert_eq!(stream.error(), Some(&err));
    assert!(!stream.is_open());

    // nothing reaches the server without a handshake
    assert_eq!(server.stop(), vec![String::new()]);
}

#[test]
fn https_through_proxy() {
    let server = TlsServer::start(1, true, RESPONSE);

    let mut options = OptionSet::new();
    options.set_option(TlsVerify(false));
    options.set_option(Proxy(Some(
        Url::parse(&format!("http://127.0.0.1:{}", server.port)).unwrap(),
    )));

    let mut stream = StreamBuf::new();
    stream.open_with("https://localhost:8443/tunnel", &options).unwrap();
    assert_eq!(read_all(&mut stream).unwrap(), b"Hello, World!");

    let requests = server.stop();
    assert_eq!(
        requests[0],
        "CONNECT localhost:8443 HTTP/1.0\r\nHost: localhost:8443\r\n\r\n"
    );
    // origin form inside the tunnel
    assert!(requests[1].starts_with("GET /tunnel HTTP/1.0\r\nHost: localhost:8443\r\n"));
}

#[test]
fn https_proxy_refuses_tunnel() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut io, _) = listener.accept().unwrap();
        let request = read_request(&mut io);
        io.write_all(b"HTTP/1.0 403 Forbidden\r\n\r\n").unwrap();
        request
    });

    let mut stream = StreamBuf::new();
    stream.set_option(Proxy(Some(Url::parse(&format!("http://127.0.0.1:{port}")).unwrap())));
    let err = stream.open("https://localhost:8443/").unwrap_err();

    assert_eq!(err, Error::Http(StatusCode::FORBIDDEN));
    assert!(!stream.is_open());
    assert!(handle.join().unwrap().starts_with("CONNECT localhost:8443 HTTP/1.0\r\n"));
}
