use actix_web::http::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method,
};
use ahash::{HashMap, HashMapExt};
use fw_forms::MultiDict;

/// An incoming request, detached from the server that received it.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: MultiDict,
    post: MultiDict,
    cookies: HashMap<String, String>,
    headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, path: &str, query: MultiDict) -> Self {
        Self {
            method,
            path: path.to_owned(),
            query,
            post: MultiDict::new(),
            cookies: HashMap::new(),
            headers: HeaderMap::new(),
        }
    }

    /// GET request for `url`, a path with an optional query string.
    pub fn blank(url: &str) -> Self {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let path = match path {
            "" => "/",
            path => path,
        };
        Self::new(Method::GET, path, MultiDict::from_urlencoded(query))
    }

    /// Switches the request to POST with `post` as its body.
    pub fn with_post(mut self, post: MultiDict) -> Self {
        self.method = Method::POST;
        self.post = post;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Invalid header names or values are dropped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => fw_log::warn(None, format!("[Request] Dropped invalid header {name:?}")),
        }
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string parameters.
    pub fn get(&self) -> &MultiDict {
        &self.query
    }

    /// Form body parameters.
    pub fn post(&self) -> &MultiDict {
        &self.post
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}
