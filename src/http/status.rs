use std::num::NonZeroU16;

/// HTTP [Status Code][rfc].
///
/// Any three digit code received from a server is representable, common codes have named
/// constants.
///
/// [rfc]: <https://datatracker.ietf.org/doc/html/rfc9110#name-status-codes>
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(NonZeroU16);

impl StatusCode {
    /// Create [`StatusCode`] from a three digit integer.
    #[inline]
    pub const fn from_u16(code: u16) -> Option<Self> {
        match code {
            100..=999 => match NonZeroU16::new(code) {
                Some(code) => Some(Self(code)),
                None => None,
            },
            _ => None,
        }
    }

    /// Returns status code value, e.g: `200`.
    #[inline]
    pub const fn as_u16(&self) -> u16 {
        self.0.get()
    }

    /// Returns `true` for `1xx` codes.
    #[inline]
    pub const fn is_informational(&self) -> bool {
        matches!(self.0.get(), 100..=199)
    }

    /// Returns `true` for `2xx` codes.
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self.0.get(), 200..=299)
    }

    /// Returns `true` for redirection codes that carry a `Location`.
    #[inline]
    pub const fn is_redirect(&self) -> bool {
        matches!(self.0.get(), 301 | 302 | 303 | 307 | 308)
    }

    /// Returns `true` if a response with this status never has a message body.
    #[inline]
    pub const fn is_bodyless(&self) -> bool {
        self.is_informational() || matches!(self.0.get(), 204 | 304)
    }
}

macro_rules! status_code {
    (
        $(
            $(#[$doc:meta])*
            $int:literal $id:ident $msg:literal;
        )*
    ) => {
        impl StatusCode {
            /// Returns the canonical reason phrase, e.g: `"Not Found"`.
            ///
            /// Returns `None` for codes without a named constant.
            #[inline]
            pub const fn reason(&self) -> Option<&'static str> {
                match self.0.get() {
                    $(
                        $int => Some($msg),
                    )*
                    _ => None,
                }
            }
        }

        impl StatusCode {
            $(
                $(#[$doc])*
                pub const $id: Self = Self(NonZeroU16::new($int).unwrap());
            )*
        }
    };
}

status_code! {
    /// `100`. The client should continue the request.
    100 CONTINUE "Continue";
    /// `200`. The request succeeded.
    200 OK "OK";
    /// `201`. The request succeeded, and a new resource was created as a result.
    201 CREATED "Created";
    /// `204`. There is no content to send for this request, but the headers are useful.
    204 NO_CONTENT "No Content";
    /// `206`. Only part of the resource is sent.
    206 PARTIAL_CONTENT "Partial Content";
    /// `301`. The URL of the requested resource has been changed permanently.
    301 MOVED_PERMANENTLY "Moved Permanently";
    /// `302`. The URI of requested resource has been changed temporarily.
    302 FOUND "Found";
    /// `303`. The server directs the client to get the requested resource at another URI.
    303 SEE_OTHER "See Other";
    /// `304`. The response has not been modified.
    304 NOT_MODIFIED "Not Modified";
    /// `307`. Temporary redirect with the same method.
    307 TEMPORARY_REDIRECT "Temporary Redirect";
    /// `308`. Permanent redirect with the same method.
    308 PERMANENT_REDIRECT "Permanent Redirect";
    /// `400`. The server cannot or will not process the request due to something that is
    /// perceived to be a client error.
    400 BAD_REQUEST "Bad Request";
    /// `401`. Semantically this response means "unauthenticated".
    401 UNAUTHORIZED "Unauthorized";
    /// `403`. The client does not have access rights to the content.
    403 FORBIDDEN "Forbidden";
    /// `404`. The server cannot find the requested resource.
    404 NOT_FOUND "Not Found";
    /// `405`. The request method is not supported by the target resource.
    405 METHOD_NOT_ALLOWED "Method Not Allowed";
    /// `407`. Authentication is needed to be done by a proxy.
    407 PROXY_AUTHENTICATION_REQUIRED "Proxy Authentication Required";
    /// `408`. The server would like to shut down this unused connection.
    408 REQUEST_TIMEOUT "Request Timeout";
    /// `410`. The requested content has been permanently deleted from server.
    410 GONE "Gone";
    /// `429`. The user has sent too many requests in a given amount of time.
    429 TOO_MANY_REQUESTS "Too Many Requests";
    /// `500`. The server has encountered a situation it does not know how to handle.
    500 INTERNAL_SERVER_ERROR "Internal Server Error";
    /// `501`. The request method is not supported by the server and cannot be handled.
    501 NOT_IMPLEMENTED "Not Implemented";
    /// `502`. The server, while working as a gateway, got an invalid response.
    502 BAD_GATEWAY "Bad Gateway";
    /// `503`. The server is not ready to handle the request.
    503 SERVICE_UNAVAILABLE "Service Unavailable";
    /// `504`. The server is acting as a gateway and cannot get a response in time.
    504 GATEWAY_TIMEOUT "Gateway Timeout";
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{} {reason}", self.as_u16()),
            None => write!(f, "{}", self.as_u16()),
        }
    }
}

impl std::fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StatusCode").field(&self.as_u16()).finish()
    }
}

#[test]
fn test_status_code() {
    assert_eq!(StatusCode::from_u16(404), Some(StatusCode::NOT_FOUND));
    assert_eq!(StatusCode::from_u16(99), None);
    assert_eq!(StatusCode::from_u16(1000), None);

    let unnamed = StatusCode::from_u16(599).unwrap();
    assert_eq!(unnamed.reason(), None);
    assert_eq!(unnamed.to_string(), "599");
    assert_eq!(StatusCode::NOT_FOUND.to_string(), "404 Not Found");

    assert!(StatusCode::OK.is_success());
    assert!(StatusCode::FOUND.is_redirect());
    assert!(!StatusCode::NOT_MODIFIED.is_redirect());
    assert!(StatusCode::NOT_MODIFIED.is_bodyless());
    assert!(StatusCode::CONTINUE.is_bodyless());
    assert!(!StatusCode::OK.is_bodyless());
}
