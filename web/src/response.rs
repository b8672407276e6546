use actix_web::{
    cookie::Cookie,
    http::{
        header::{self, HeaderMap, HeaderName, HeaderValue},
        StatusCode,
    },
};
use url::{Position, Url};

const HTML: &str = "text/html; charset=utf-8";

/// Percent-encodes a redirect target so it fits into a `Location` header.
///
/// Absolute URLs are normalized by `url`; paths are resolved against a dummy
/// origin and only the part from the path on is kept.
pub fn encode_location(location: &str) -> String {
    if location.is_ascii() {
        return location.to_owned();
    }
    if let Ok(url) = Url::parse(location) {
        return url.to_string();
    }
    let Ok(url) = Url::parse("http://localhost/").and_then(|base| base.join(location)) else {
        return location.to_owned();
    };
    let encoded = &url[Position::BeforePath..];
    match location.starts_with('/') {
        true => encoded.to_owned(),
        false => encoded.trim_start_matches('/').to_owned(),
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    cookies: Vec<Cookie<'static>>,
    body: String,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML));
        Self {
            status,
            headers,
            cookies: Vec::new(),
            body: String::new(),
        }
    }

    pub fn html(body: String) -> Self {
        Self::new(StatusCode::OK).with_body(body)
    }

    /// Empty response pointing at `location`.
    pub fn redirect(status: StatusCode, location: &str) -> Self {
        let mut response = Self::new(status);
        response.set_location(location);
        response
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = body;
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(err) => fw_log::warn(
                None,
                format!("[Response] Dropped invalid value of header {name}: {err}"),
            ),
        }
    }

    pub fn set_location(&mut self, location: &str) {
        self.set_header(header::LOCATION, &encode_location(location));
    }

    pub fn set_cookie(&mut self, name: &str, value: &str, path: &str) {
        let mut cookie = Cookie::new(name.to_owned(), value.to_owned());
        cookie.set_path(path.to_owned());
        cookie.set_http_only(true);
        self.cookies.push(cookie);
    }

    /// Expires the cookie on the client: empty value, max-age 0.
    pub fn delete_cookie(&mut self, name: &str, path: &str) {
        let mut cookie = Cookie::new(name.to_owned(), "");
        cookie.set_path(path.to_owned());
        cookie.make_removal();
        self.cookies.push(cookie);
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn location(&self) -> Option<&str> {
        self.header(header::LOCATION.as_str())
    }

    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie<'static>> {
        self.cookies.iter().rev().find(|cookie| cookie.name() == name)
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
