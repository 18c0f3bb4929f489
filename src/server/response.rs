use may_minihttp::Response;
use serde_json::Value;
use std::path::Path;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Content-Type header line for a file path, by extension.
///
/// `may_minihttp` takes header lines as `&'static str`, so the set of served
/// types is a closed table rather than a mime database.
pub fn content_type_header(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "html" => "Content-Type: text/html",
        "css" => "Content-Type: text/css",
        "js" => "Content-Type: application/javascript",
        "json" => "Content-Type: application/json",
        "svg" => "Content-Type: image/svg+xml",
        "png" => "Content-Type: image/png",
        "txt" => "Content-Type: text/plain",
        _ => "Content-Type: application/octet-stream",
    }
}

pub fn write_html(res: &mut Response, status: u16, body: Vec<u8>) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: text/html");
    res.body_vec(body);
}

pub fn write_file(res: &mut Response, path: &Path, body: Vec<u8>) {
    res.status_code(200, "OK");
    res.header(content_type_header(path));
    res.body_vec(body);
}

pub fn write_json(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}

pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    write_json(res, status, body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(418), "OK");
    }

    #[test]
    fn test_content_type_header() {
        assert_eq!(
            content_type_header(Path::new("a/bundle.js")),
            "Content-Type: application/javascript"
        );
        assert_eq!(
            content_type_header(Path::new("index.HTML")),
            "Content-Type: text/html"
        );
        assert_eq!(
            content_type_header(Path::new("blob")),
            "Content-Type: application/octet-stream"
        );
    }
}
