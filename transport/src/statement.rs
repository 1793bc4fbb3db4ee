use std::time::Duration;

use bytes::Bytes;
use reqwest::{header::HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    errors::{Error, Result, TransportError},
    request::RequestInfo,
};

pub const EXCEPTION_CODE_HEADER: &str = "X-ClickHouse-Exception-Code";

/// The server's side of an exchange.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    elapsed: Duration,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }
}

/// A completed request and its response.
#[derive(Debug, Clone)]
pub struct Statement {
    info: RequestInfo,
    response: Response,
}

impl Statement {
    pub fn new(info: RequestInfo, response: Response) -> Self {
        Self { info, response }
    }

    pub fn sql(&self) -> &str {
        &self.info.sql
    }

    pub fn format(&self) -> Option<&str> {
        self.info.format.as_deref()
    }

    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.response.headers
    }

    /// Empty when the body was streamed to a sink.
    pub fn body(&self) -> &[u8] {
        &self.response.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.response.body).into_owned()
    }

    pub fn elapsed(&self) -> Duration {
        self.response.elapsed
    }

    pub fn exception_code(&self) -> Option<i32> {
        self.response
            .headers
            .get(EXCEPTION_CODE_HEADER)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    pub fn is_error(&self) -> bool {
        !self.response.status.is_success()
            || self.response.headers.contains_key(EXCEPTION_CODE_HEADER)
    }

    /// Surface the failure, if any, as a [`TransportError`].
    pub fn error(&self) -> Result<()> {
        if !self.is_error() {
            return Ok(());
        }
        Err(Error::Transport(TransportError {
            status: self.response.status,
            code: self.exception_code(),
            body: self.text().trim_end().to_string(),
        }))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        self.error()?;
        Ok(serde_json::from_slice(&self.response.body)?)
    }

    /// The `data` rows of a `JSON` formatted result.
    pub fn rows(&self) -> Result<Vec<Map<String, Value>>> {
        let mut document: Map<String, Value> = self.json()?;
        match document.remove("data") {
            Some(Value::Array(rows)) => rows
                .into_iter()
                .map(|row| match row {
                    Value::Object(row) => Ok(row),
                    other => Err(Error::Response(format!("expected a row object, got {other}"))),
                })
                .collect(),
            _ => Err(Error::Response("result has no `data` array".to_string())),
        }
    }

    /// The `rows` counter of a `JSON` formatted result.
    pub fn count_rows(&self) -> Result<u64> {
        let document: Map<String, Value> = self.json()?;
        document
            .get("rows")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::Response("result has no `rows` counter".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn statement(status: u16, headers: HeaderMap, body: &'static str) -> Statement {
        Statement::new(
            RequestInfo::new("select 1", Some("JSON".to_string())),
            Response::new(StatusCode::from_u16(status).unwrap(), headers, body),
        )
    }

    #[test]
    fn test_success() {
        let s = statement(
            200,
            HeaderMap::new(),
            r#"{"meta":[],"data":[{"x":1},{"x":2}],"rows":2}"#,
        );
        assert!(!s.is_error());
        assert!(s.error().is_ok());
        assert_eq!(s.rows().unwrap().len(), 2);
        assert_eq!(s.count_rows().unwrap(), 2);
        assert_eq!(s.format(), Some("JSON"));
    }

    #[test]
    fn test_http_failure_surfaces_body() {
        let s = statement(404, HeaderMap::new(), "Code: 60. DB::Exception: Table missing\n");
        assert!(s.is_error());
        match s.error() {
            Err(Error::Transport(e)) => {
                assert_eq!(e.status, StatusCode::NOT_FOUND);
                assert_eq!(e.code, None);
                assert_eq!(e.body, "Code: 60. DB::Exception: Table missing");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_exception_header_marks_error() {
        let mut headers = HeaderMap::new();
        headers.insert(EXCEPTION_CODE_HEADER, HeaderValue::from_static("241"));
        let s = statement(200, headers, "partial");
        assert!(s.is_error());
        assert_eq!(s.exception_code(), Some(241));
        assert!(matches!(s.rows(), Err(Error::Transport(_))));
    }
}
