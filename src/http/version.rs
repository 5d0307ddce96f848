/// HTTP/1 Version of a response.
///
/// [httpwg](https://httpwg.org/specs/rfc9112.html#http.version)
#[derive(Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Version(Inner);

#[derive(PartialEq, PartialOrd, Copy, Clone, Eq, Ord, Hash)]
enum Inner {
    Http10,
    Http11,
}

impl Version {
    /// `HTTP/1.0`
    pub const HTTP_10: Version = Version(Inner::Http10);

    /// `HTTP/1.1`
    pub const HTTP_11: Version = Version(Inner::Http11);

    /// Parse the version token of a status line, e.g: `b"HTTP/1.1"`.
    #[inline]
    pub const fn from_bytes(bytes: &[u8; 8]) -> Option<Version> {
        match bytes {
            b"HTTP/1.0" => Some(Self::HTTP_10),
            b"HTTP/1.1" => Some(Self::HTTP_11),
            _ => None,
        }
    }

    /// Returns string representation of HTTP version, e.g: `HTTP/1.1`
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self.0 {
            Inner::Http10 => "HTTP/1.0",
            Inner::Http11 => "HTTP/1.1",
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "\"{self}\"")
    }
}
