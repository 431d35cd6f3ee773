//! HTTP plumbing shared by every operation.
//!
//! [`Transport`] is the seam between the API logic and the wire. The default
//! [`HttpTransport`] issues requests with `reqwest`; tests swap in a
//! recording implementation.

use crate::error::{FinicityError, TransportError};
use crate::xml;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap};
use reqwest::{Client as HttpClient, Method, StatusCode, Url};
use std::time::Duration;

pub const BASE_URL: &str = "https://api.finicity.com/aggregation";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const APP_KEY_HEADER: &str = "Finicity-App-Key";
pub const APP_TOKEN_HEADER: &str = "Finicity-App-Token";
pub const MFA_SESSION_HEADER: &str = "MFA-Session";

/// One API call, described independently of the HTTP stack.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<String>,
    pub headers: Vec<(&'static str, String)>,
}

impl Request {
    pub fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::GET, segments)
    }

    pub fn post(segments: &[&str]) -> Self {
        Self::new(Method::POST, segments)
    }

    pub fn put(segments: &[&str]) -> Self {
        Self::new(Method::PUT, segments)
    }

    pub fn delete(segments: &[&str]) -> Self {
        Self::new(Method::DELETE, segments)
    }

    pub fn query(mut self, name: &'static str, value: impl ToString) -> Self {
        self.query.push((name, value.to_string()));
        self
    }

    /// Add a query parameter only when a value is present.
    pub fn query_opt(self, name: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    pub fn body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Request path with a leading slash, unencoded.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw answer from the API: any status code is a valid response here.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub body: String,
    pub headers: HeaderMap,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request. Only network or protocol failures are errors.
    async fn execute(&self, request: Request) -> Result<Response, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FinicityError> {
        let base_url = Url::parse(base_url)
            .map_err(|_| FinicityError::InvalidParameter("base_url must be an absolute URL"))?;
        if base_url.cannot_be_a_base() {
            return Err(FinicityError::InvalidParameter(
                "base_url must be a hierarchical URL",
            ));
        }
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::from)?;
        Ok(Self { http, base_url })
    }

    fn url_for(&self, request: &Request) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TransportError::new("base URL cannot carry a path"))?;
            segments.pop_if_empty().extend(&request.segments);
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .query
                    .iter()
                    .map(|(name, value)| (*name, value.as_str())),
            );
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let url = self.url_for(&request)?;
        debug!("{} request to {}", request.method, url);

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, xml::CONTENT_TYPE)
            .header(ACCEPT, xml::CONTENT_TYPE);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        // The API wants an explicit zero length on bodiless writes.
        if request.body.is_some() || request.method == Method::POST || request.method == Method::PUT
        {
            builder = builder.body(request.body.unwrap_or_default());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        debug!("Received status {}", status);
        Ok(Response {
            status,
            body,
            headers,
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};
    use std::sync::Mutex;

    #[derive(Clone)]
    enum Reply {
        Respond {
            status: u16,
            body: String,
            headers: Vec<(&'static str, String)>,
        },
        Fail,
    }

    struct Route {
        method: Method,
        path: String,
        reply: Reply,
    }

    /// Recording transport with canned replies keyed by method and path.
    ///
    /// Several replies for the same route are served in order; the last one
    /// repeats.
    #[derive(Default)]
    pub(crate) struct MockTransport {
        routes: Mutex<Vec<Route>>,
        requests: Mutex<Vec<Request>>,
        delay: Option<Duration>,
    }

    impl MockTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Accepts partner authentication and hands out `token`.
        pub(crate) fn authenticating(token: &str) -> Self {
            Self::new().respond(
                Method::POST,
                "/v2/partners/authentication",
                200,
                &format!("<access><token>{token}</token></access>"),
            )
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn respond(self, method: Method, path: &str, status: u16, body: &str) -> Self {
            self.respond_with_headers(method, path, status, body, &[])
        }

        pub(crate) fn respond_with_headers(
            self,
            method: Method,
            path: &str,
            status: u16,
            body: &str,
            headers: &[(&'static str, &str)],
        ) -> Self {
            self.push(
                method,
                path,
                Reply::Respond {
                    status,
                    body: body.to_string(),
                    headers: headers.iter().map(|(n, v)| (*n, v.to_string())).collect(),
                },
            );
            self
        }

        pub(crate) fn fail(self, method: Method, path: &str) -> Self {
            self.push(method, path, Reply::Fail);
            self
        }

        fn push(&self, method: Method, path: &str, reply: Reply) {
            self.routes.lock().unwrap().push(Route {
                method,
                path: path.to_string(),
                reply,
            });
        }

        pub(crate) fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn count(&self, method: Method, path: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.method == method && r.path() == path)
                .count()
        }

        fn next_reply(&self, request: &Request) -> Option<Reply> {
            let mut routes = self.routes.lock().unwrap();
            let path = request.path();
            let matching: Vec<usize> = routes
                .iter()
                .enumerate()
                .filter(|(_, r)| r.method == request.method && r.path == path)
                .map(|(i, _)| i)
                .collect();
            match matching.as_slice() {
                [] => None,
                [only] => Some(routes[*only].reply.clone()),
                [first, ..] => Some(routes.remove(*first).reply),
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn execute(&self, request: Request) -> Result<Response, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.next_reply(&request) {
                None => Ok(Response {
                    status: StatusCode::NOT_FOUND,
                    body: format!("no route for {} {}", request.method, request.path()),
                    headers: HeaderMap::new(),
                }),
                Some(Reply::Fail) => Err(TransportError::new("connection refused")),
                Some(Reply::Respond {
                    status,
                    body,
                    headers,
                }) => {
                    let mut map = HeaderMap::new();
                    for (name, value) in headers {
                        map.insert(
                            HeaderName::from_bytes(name.as_bytes()).unwrap(),
                            HeaderValue::from_str(&value).unwrap(),
                        );
                    }
                    Ok(Response {
                        status: StatusCode::from_u16(status).unwrap(),
                        body,
                        headers: map,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_url_from_segments_and_query() {
        let transport = HttpTransport::new(BASE_URL, DEFAULT_TIMEOUT).unwrap();
        let request = Request::get(&["v1", "institutions"])
            .query("search", "first bank")
            .query_opt("limit", Some(25))
            .query_opt("start", None::<u32>);
        let url = transport.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.finicity.com/aggregation/v1/institutions?search=first+bank&limit=25"
        );
    }

    #[test]
    fn encodes_caller_supplied_segments() {
        let transport = HttpTransport::new("http://localhost:8080/", DEFAULT_TIMEOUT).unwrap();
        let request = Request::get(&["v1", "customers", "a/b c"]);
        let url = transport.url_for(&request).unwrap();
        assert_eq!(url.path(), "/v1/customers/a%2Fb%20c");
    }

    #[test]
    fn rejects_relative_base_url() {
        let err = HttpTransport::new("not a url", DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, FinicityError::InvalidParameter(_)));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let request = Request::post(&["v1"]).header(MFA_SESSION_HEADER, "S1");
        assert_eq!(request.header_value("mfa-session"), Some("S1"));
        assert_eq!(request.path(), "/v1");
    }
}
