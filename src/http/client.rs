use super::debug::{
    HttpDebugConfig, format_headers, redact_text_body, redact_url, truncate_for_log,
};
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::fmt;
#[cfg(test)]
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    debug: HttpDebugConfig,
    sink: LogSink,
}

#[derive(Clone)]
enum LogSink {
    Tracing,
    #[cfg(test)]
    Buffer(Arc<Mutex<Vec<String>>>),
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("debug", &self.debug)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponseData {
    pub status: u16,
    pub body: String,
}

impl HttpResponseData {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl HttpClient {
    pub fn new(inner: Client, debug: HttpDebugConfig) -> Self {
        Self {
            inner,
            debug,
            sink: LogSink::Tracing,
        }
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        bearer_token: Option<&str>,
        payload: &T,
    ) -> Result<HttpResponseData, reqwest::Error> {
        let body_json = serde_json::to_string(payload)
            .unwrap_or_else(|err| format!("{{\"_serialization_error\":\"{err}\"}}"));

        let mut builder = self.inner.post(url).json(payload);
        if let Some(token) = bearer_token {
            builder = builder.bearer_auth(token);
        }
        let request = builder.build()?;
        self.execute(request, &body_json).await
    }

    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<HttpResponseData, reqwest::Error> {
        let request = self.inner.get(url).query(query).build()?;
        self.execute(request, "").await
    }

    async fn execute(
        &self,
        request: reqwest::Request,
        body_for_log: &str,
    ) -> Result<HttpResponseData, reqwest::Error> {
        self.log_request(&request, body_for_log);

        let response = self.inner.execute(request).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        self.log_response(status, &headers, &body);
        Ok(HttpResponseData { status, body })
    }

    fn log_request(&self, request: &reqwest::Request, body: &str) {
        if !self.debug.enabled {
            return;
        }

        for line in request_log_lines(self.debug, request, body) {
            self.log_line(line);
        }
    }

    fn log_response(&self, status: u16, headers: &HeaderMap, body: &str) {
        if !self.debug.enabled {
            return;
        }

        for line in response_log_lines(self.debug, status, headers, body) {
            self.log_line(line);
        }
    }

    fn log_line(&self, line: String) {
        match &self.sink {
            LogSink::Tracing => tracing::info!(target: "simple_chatbot::http", "{line}"),
            #[cfg(test)]
            LogSink::Buffer(buffer) => {
                if let Ok(mut lines) = buffer.lock() {
                    lines.push(line);
                }
            }
        }
    }

    #[cfg(test)]
    pub fn with_buffer_sink(
        inner: Client,
        debug: HttpDebugConfig,
    ) -> (Self, Arc<Mutex<Vec<String>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let client = Self {
            inner,
            debug,
            sink: LogSink::Buffer(Arc::clone(&buffer)),
        };
        (client, buffer)
    }
}

fn request_log_lines(
    debug: HttpDebugConfig,
    request: &reqwest::Request,
    body: &str,
) -> Vec<String> {
    let url = redact_url(request.url(), debug.redact_secrets);
    let body = redact_text_body(body, debug.redact_secrets);
    let body = truncate_for_log(&body, debug.max_body_chars);

    let mut lines = vec![format!("[http-debug] > {} {}", request.method(), url)];
    for header in format_headers(request.headers(), debug.redact_secrets) {
        lines.push(format!("[http-debug] > {header}"));
    }
    lines.push("[http-debug] >".to_string());
    append_body_lines(&mut lines, '>', &body);
    lines
}

fn response_log_lines(
    debug: HttpDebugConfig,
    status: u16,
    headers: &HeaderMap,
    body: &str,
) -> Vec<String> {
    let body = redact_text_body(body, debug.redact_secrets);
    let body = truncate_for_log(&body, debug.max_body_chars);

    let mut lines = vec![format!("[http-debug] < HTTP {status}")];
    for header in format_headers(headers, debug.redact_secrets) {
        lines.push(format!("[http-debug] < {header}"));
    }
    lines.push("[http-debug] <".to_string());
    append_body_lines(&mut lines, '<', &body);
    lines
}

fn append_body_lines(lines: &mut Vec<String>, direction: char, body: &str) {
    if body.is_empty() {
        lines.push(format!("[http-debug] {direction} <empty body>"));
        return;
    }

    for line in body.lines() {
        lines.push(format!("[http-debug] {direction} {line}"));
    }
}
