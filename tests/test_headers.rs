//! Tests for status and header validation

use gantry::http::headers::{HeaderError, normalize_headers, normalize_status, status_code};

#[test]
fn test_headers_are_trimmed_in_order() {
    let headers = normalize_headers([(" Content-Type ", " text/html "), ("X-A", "1")]).unwrap();

    assert_eq!(
        headers,
        vec![
            ("Content-Type".to_string(), "text/html".to_string()),
            ("X-A".to_string(), "1".to_string()),
        ]
    );
}

#[test]
fn test_latin1_values_are_accepted() {
    let headers = normalize_headers([("X-City", "Z\u{fc}rich")]).unwrap();

    assert_eq!(headers[0].1, "Z\u{fc}rich");
}

#[test]
fn test_non_latin1_value_is_rejected() {
    let err = normalize_headers([("X-Price", "5 \u{20ac}")]).unwrap_err();

    assert_eq!(err, HeaderError::NonLatin1Value { name: "X-Price".to_string() });
}

#[test]
fn test_non_ascii_name_is_rejected() {
    let err = normalize_headers([("X-\u{e9}", "v")]).unwrap_err();

    assert!(matches!(err, HeaderError::NonAsciiName(_)));
}

#[test]
fn test_embedded_line_break_is_rejected() {
    let err = normalize_headers([("X-Evil", "a\r\nSet-Cookie: x")]).unwrap_err();

    assert!(matches!(err, HeaderError::LineBreak { .. }));
}

#[test]
fn test_empty_name_is_rejected() {
    assert_eq!(normalize_headers([("  ", "v")]).unwrap_err(), HeaderError::EmptyName);
}

#[test]
fn test_status_validation() {
    assert_eq!(normalize_status(" 200 OK ").unwrap(), "200 OK");
    assert_eq!(normalize_status("404").unwrap(), "404");
    assert!(normalize_status("OK").is_err());
    assert!(normalize_status("2000 Too Long").is_err());
    assert!(normalize_status("200 OK\r\nX: y").is_err());
}

#[test]
fn test_status_code() {
    assert_eq!(status_code("200 OK"), Some(200));
    assert_eq!(status_code("304 Not Modified"), Some(304));
    assert_eq!(status_code("abc"), None);
}
