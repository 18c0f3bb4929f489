use http::Method;
use may_minihttp::Request;
use std::collections::HashMap;
use tracing::{debug, Span};

/// Parsed request data threaded through the middleware chain.
///
/// Built once per request by [`parse_request`]; stages may attach a logging
/// span but never mutate the request line itself.
#[derive(Debug)]
pub struct RequestContext {
    /// HTTP method
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Parsed query string parameters
    pub query_params: HashMap<String, String>,
    /// Logger context attached by the request-log middleware
    pub span: Option<Span>,
}

/// Parse query string parameters from a URL path
pub fn parse_query_params(path: &str) -> HashMap<String, String> {
    if let Some(pos) = path.find('?') {
        let query_str = &path[pos + 1..];
        url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    } else {
        HashMap::new()
    }
}

/// Extract the pieces of a `may_minihttp::Request` the pipeline consumes.
pub fn parse_request(req: Request) -> RequestContext {
    let method = Method::from_bytes(req.method().as_bytes()).unwrap_or(Method::GET);
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let query_params = parse_query_params(&raw_path);
    debug!(method = %method, path = %path, header_count = headers.len(), "request parsed");

    RequestContext {
        method,
        path,
        headers,
        query_params,
        span: None,
    }
}
