use axum::http::{HeaderMap, HeaderValue, header};
use campusdesk::middleware::auth::extract_token;

fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.append(name.clone(), HeaderValue::from_str(value).unwrap());
    }
    map
}

#[test]
fn test_bearer_header_is_used() {
    let map = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
    assert_eq!(extract_token(&map, "token").as_deref(), Some("abc.def.ghi"));
}

#[test]
fn test_cookie_is_used_without_header() {
    let map = headers(&[(header::COOKIE, "theme=dark; token=from-cookie")]);
    assert_eq!(extract_token(&map, "token").as_deref(), Some("from-cookie"));
}

#[test]
fn test_bearer_wins_over_cookie() {
    let map = headers(&[
        (header::AUTHORIZATION, "Bearer from-header"),
        (header::COOKIE, "token=from-cookie"),
    ]);
    assert_eq!(extract_token(&map, "token").as_deref(), Some("from-header"));
}

#[test]
fn test_other_schemes_and_empty_values_are_ignored() {
    let map = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
    assert_eq!(extract_token(&map, "token"), None);

    let map = headers(&[(header::AUTHORIZATION, "Bearer   ")]);
    assert_eq!(extract_token(&map, "token"), None);

    let map = headers(&[(header::COOKIE, "token=")]);
    assert_eq!(extract_token(&map, "token"), None);
}

#[test]
fn test_cookie_name_is_configurable() {
    let map = headers(&[(header::COOKIE, "session=xyz")]);
    assert_eq!(extract_token(&map, "token"), None);
    assert_eq!(extract_token(&map, "session").as_deref(), Some("xyz"));
}
