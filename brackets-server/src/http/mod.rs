mod v1;

use crate::{Error, State, StatusCodeError};

use std::convert::Infallible;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use futures::Future;
use hyper::header::{HeaderValue, IntoHeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::http::request::Parts;
use hyper::server::conn::Http;
use hyper::service::service_fn;
use hyper::{Body, HeaderMap, Method, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::Instant;

pub type Result = std::result::Result<Response, Error>;

/// The maximum accepted size of a request body in bytes.
const MAX_BODY_SIZE: u64 = 16384;

pub async fn bind<F>(
    addr: SocketAddr,
    state: State,
    shutdown: F,
) -> std::result::Result<(), crate::Error>
where
    F: Future<Output = ()>,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on {}", addr);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            res = listener.accept() => {
                let (stream, addr) = match res {
                    Ok((stream, addr)) => (stream, addr),
                    Err(err) => {
                        log::warn!("Failed to accept connection: {:?}", err);
                        continue;
                    }
                };
                log::debug!("Accepting new connection from {:?}", addr);

                let state = state.clone();
                let mut shutdown_rx = shutdown_rx.clone();
                tokio::task::spawn(async move {
                    let service = service_fn(move |req| service_root(req, state.clone()));

                    let conn = Http::new()
                        .http1_keep_alive(true)
                        .serve_connection(stream, service);
                    tokio::pin!(conn);

                    tokio::select! {
                        res = conn.as_mut() => {
                            if let Err(err) = res {
                                log::warn!("Http error: {:?}", err);
                            }
                        }
                        _ = shutdown_rx.changed() => {
                            log::debug!("Shutting down connection");
                            conn.as_mut().graceful_shutdown();

                            if let Err(err) = conn.await {
                                log::warn!("Http error: {:?}", err);
                            }
                        }
                    }
                });
            }
            // Shut down the server.
            _ = &mut shutdown => {
                log::info!("Shutting down http server");
                let _ = shutdown_tx.send(());
                return Ok(());
            }
        }
    }
}

async fn service_root(
    req: hyper::Request<Body>,
    state: State,
) -> std::result::Result<hyper::Response<Body>, Infallible> {
    log::trace!("Received Request:");
    log::trace!("Head: {} {}", req.method(), req.uri());
    log::trace!("Headers: {:?}", req.headers());

    let req = Request::new(req, state);

    if req.method() == Method::POST || req.method() == Method::PUT {
        match req.content_length() {
            Ok(length) if length > MAX_BODY_SIZE => {
                return Ok(error_response(StatusCodeError::payload_too_large()));
            }
            Ok(_) => (),
            Err(err) => return Ok(finish(Err(err))),
        }
    }

    let path = String::from(req.uri().path());
    let mut uri = RequestUri::new(&path);

    log::debug!("{} {:?}", req.method(), uri);

    let res = match uri.take_str() {
        Some("v1") => v1::route(req, uri).await,
        _ => Err(StatusCodeError::not_found().into()),
    };

    Ok(finish(res))
}

/// Turns the result of a route into the response sent to the client.
fn finish(res: Result) -> hyper::Response<Body> {
    match res {
        Ok(resp) => resp.build(),
        Err(err) => match err.into_status_code_error() {
            Some(err) => error_response(err),
            None => error_response(StatusCodeError::internal_server_error()),
        },
    }
}

fn error_response(err: StatusCodeError) -> hyper::Response<Body> {
    log::debug!("Responding with error: {}", err);

    let body = ErrorResponse {
        code: err.code.as_u16(),
        message: err.message,
    };

    match Response::ok().status(err.code).json(&body) {
        Ok(resp) => resp.build(),
        Err(err) => {
            log::error!("Failed to serialize error response: {}", err);

            Response::ok()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error")
                .build()
        }
    }
}

#[derive(Debug)]
pub struct Request {
    pub parts: Parts,
    pub body: Option<Body>,
    state: State,
}

impl Request {
    #[inline]
    fn new(req: hyper::Request<Body>, state: State) -> Self {
        let (parts, body) = req.into_parts();

        Self {
            parts,
            body: Some(body),
            state,
        }
    }

    #[inline]
    pub fn state(&self) -> &State {
        &self.state
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        &self.parts.headers
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Returns the value of the query parameter `key`, `None` if it is absent.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.uri().query()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k == key).then_some(v)
        })
    }

    pub async fn json<T>(&mut self) -> std::result::Result<T, Error>
    where
        T: DeserializeOwned,
    {
        const DUR: Duration = Duration::new(30, 0);

        let deadline = Instant::now() + DUR;

        let body = self
            .body
            .take()
            .ok_or_else(|| StatusCodeError::bad_request().message("Body already consumed"))?;

        let bytes = tokio::select! {
            res = hyper::body::to_bytes(body) => {
                res?
            }
            _ = tokio::time::sleep_until(deadline) => {
                log::info!("Client failed to transmit body in {}s, dropping connection", DUR.as_secs());
                return Err(StatusCodeError::request_timeout().into());
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(err) => Err(StatusCodeError::new(StatusCode::BAD_REQUEST, err).into()),
        }
    }

    /// Returns the value of the "Content-Length" header. If the header is not present or has an
    /// invalid value an error is returned.
    pub fn content_length(&self) -> std::result::Result<u64, Error> {
        match self.headers().get(CONTENT_LENGTH) {
            Some(value) => match value.to_str().ok().and_then(|value| value.parse().ok()) {
                Some(value) => Ok(value),
                None => {
                    log::debug!("Failed to parse \"Content-Length\" header: {:?}", value);

                    Err(StatusCodeError::bad_request().into())
                }
            },
            None => Err(StatusCodeError::length_required().into()),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct RequestUri<'a> {
    path: &'a str,
}

impl<'a> RequestUri<'a> {
    pub fn new(mut path: &'a str) -> Self {
        if let Some(rem) = path.strip_prefix('/') {
            path = rem;
        }

        Self { path }
    }

    pub fn take(&mut self) -> Option<UriPart<'a>> {
        let part = self.take_str()?;

        Some(UriPart { part })
    }

    pub fn take_str(&mut self) -> Option<&'a str> {
        if self.path.is_empty() {
            None
        } else {
            Some(match self.path.split_once('/') {
                Some((part, rem)) => {
                    self.path = rem;
                    part
                }
                None => {
                    let path = self.path;
                    self.path = "";
                    path
                }
            })
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct UriPart<'a> {
    part: &'a str,
}

impl<'a> UriPart<'a> {
    pub fn parse<T>(&self) -> std::result::Result<T, Error>
    where
        T: FromStr,
    {
        match self.part.parse() {
            Ok(v) => Ok(v),
            Err(_) => Err(StatusCodeError::bad_request()
                .message(format!("Invalid path segment: {}", self.part))
                .into()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    /// 200 OK
    pub fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    /// 201 Created
    pub fn created() -> Self {
        Self::ok().status(StatusCode::CREATED)
    }

    /// 204 No Content
    pub fn no_content() -> Self {
        Self::ok().status(StatusCode::NO_CONTENT)
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn body<T>(mut self, body: T) -> Self
    where
        T: Into<Body>,
    {
        self.body = body.into();
        self
    }

    pub fn json<T>(mut self, body: &T) -> std::result::Result<Self, Error>
    where
        T: Serialize,
    {
        self.body = Body::from(serde_json::to_vec(body)?);
        Ok(self.header(CONTENT_TYPE, HeaderValue::from_static("application/json")))
    }

    pub fn header<K>(mut self, key: K, value: HeaderValue) -> Self
    where
        K: IntoHeaderName,
    {
        self.headers.append(key, value);
        self
    }

    fn build(self) -> hyper::Response<Body> {
        let mut resp = hyper::Response::new(self.body);
        *resp.status_mut() = self.status;
        *resp.headers_mut() = self.headers;
        resp
    }
}

/// Checks the request method and runs the specified path. If no matching method is found
/// an method_not_allowed error is returned.
#[macro_export]
macro_rules! method {
    ($req:expr, {$($method:expr => $branch:expr),* $(,)?}) => {
        match $req.method() {
            $(
                method if method == $method => $branch,
            )*
            method if method == hyper::Method::OPTIONS => {
                use $crate::http::Response;
                use hyper::header::{HeaderValue, ALLOW};

                let allow = [$($method.as_str()),*].join(",");

                let mut resp = Response::no_content();
                if let Ok(allow) = HeaderValue::from_str(&allow) {
                    resp = resp.header(ALLOW, allow);
                }

                Ok(resp)
            }
            _ => Err($crate::StatusCodeError::method_not_allowed().into()),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::{service_root, RequestUri};
    use crate::{Config, State};

    use hyper::{Body, Method, Request, StatusCode};

    #[test]
    fn test_request_uri() {
        let mut uri = RequestUri::new("/v1/tournaments/3/advance");

        assert_eq!(uri.take_str(), Some("v1"));
        assert_eq!(uri.take_str(), Some("tournaments"));
        assert_eq!(uri.take().unwrap().parse::<u64>().unwrap(), 3);
        assert_eq!(uri.take_str(), Some("advance"));
        assert_eq!(uri.take_str(), None);

        let mut uri = RequestUri::new("/");
        assert_eq!(uri.take_str(), None);
    }

    #[tokio::test]
    async fn test_service_root_not_found() {
        let state = State::new(Config::default());

        let req = Request::builder()
            .uri("/v2/tournaments")
            .body(Body::empty())
            .unwrap();
        let resp = service_root(req, state).await.unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_service_root_content_length() {
        let state = State::new(Config::default());

        let req = Request::builder()
            .method(Method::POST)
            .uri("/v1/tournaments")
            .body(Body::empty())
            .unwrap();
        let resp = service_root(req, state.clone()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::LENGTH_REQUIRED);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/v1/tournaments")
            .header("Content-Length", "100000")
            .body(Body::empty())
            .unwrap();
        let resp = service_root(req, state.clone()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/v1/tournaments")
            .header("Content-Length", "abc")
            .body(Body::empty())
            .unwrap();
        let resp = service_root(req, state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
