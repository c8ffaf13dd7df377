//! [`RequestLike`] for the `http` types axum hands to handlers.
use std::borrow::Cow;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, Method, Request, Uri};
use serde_json::Value;

use super::like::{BodyView, ConnectionInfo, Headers, RequestLike};
use super::Result;

/// Bodies that can be inspected without consuming them. Empty bodies count as absent.
pub trait RequestBody {
    fn view(&self) -> Option<BodyView<'_>>;
}

impl RequestBody for () {
    fn view(&self) -> Option<BodyView<'_>> {
        None
    }
}

impl RequestBody for String {
    fn view(&self) -> Option<BodyView<'_>> {
        (!self.is_empty()).then(|| BodyView::Text(Cow::Borrowed(self.as_str())))
    }
}

impl RequestBody for Bytes {
    fn view(&self) -> Option<BodyView<'_>> {
        if self.is_empty() {
            return None;
        }
        Some(match std::str::from_utf8(self) {
            Ok(text) => BodyView::Text(Cow::Borrowed(text)),
            Err(_) => BodyView::Binary(self.len()),
        })
    }
}

impl RequestBody for Value {
    fn view(&self) -> Option<BodyView<'_>> {
        match self {
            Value::Null => None,
            Value::String(s) => Some(BodyView::Text(Cow::Borrowed(s.as_str()))),
            other => Some(BodyView::Json(Cow::Borrowed(other))),
        }
    }
}

/// Header map as JSON; repeated headers become arrays.
fn header_map_to_json(headers: &HeaderMap) -> Headers {
    let mut out = Headers::new();
    for name in headers.keys() {
        let mut values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        out.insert(name.as_str().to_owned(), value);
    }
    out
}

/// Remote address recorded by `into_make_service_with_connect_info`.
fn connect_info(extensions: &Extensions) -> Option<ConnectionInfo> {
    let ConnectInfo(addr) = extensions.get::<ConnectInfo<SocketAddr>>()?;
    let family = if addr.is_ipv4() { "IPv4" } else { "IPv6" };
    Some(ConnectionInfo {
        remote_address: Some(addr.ip().to_string()),
        remote_port: Some(addr.port()),
        remote_family: Some(family.to_owned()),
    })
}

fn method_of(method: &Method) -> Result<Option<String>> {
    Ok(Some(method.as_str().to_owned()))
}

fn url_of(uri: &Uri) -> Result<Option<String>> {
    Ok(Some(uri.to_string()))
}

fn scheme_of(uri: &Uri) -> Result<Option<String>> {
    Ok(uri.scheme_str().map(str::to_owned))
}

impl<B: RequestBody> RequestLike for Request<B> {
    fn method(&self) -> Result<Option<String>> {
        method_of(self.method())
    }

    fn url(&self) -> Result<Option<String>> {
        url_of(self.uri())
    }

    fn protocol(&self) -> Result<Option<String>> {
        scheme_of(self.uri())
    }

    fn headers(&self) -> Result<Option<Headers>> {
        Ok(Some(header_map_to_json(self.headers())))
    }

    fn connection(&self) -> Result<Option<ConnectionInfo>> {
        Ok(connect_info(self.extensions()))
    }

    fn body(&self) -> Result<Option<BodyView<'_>>> {
        Ok(self.body().view())
    }
}

/// Request heads, e.g. inside a `FromRequestParts` extractor. There is no body.
impl RequestLike for Parts {
    fn method(&self) -> Result<Option<String>> {
        method_of(&self.method)
    }

    fn url(&self) -> Result<Option<String>> {
        url_of(&self.uri)
    }

    fn protocol(&self) -> Result<Option<String>> {
        scheme_of(&self.uri)
    }

    fn headers(&self) -> Result<Option<Headers>> {
        Ok(Some(header_map_to_json(&self.headers)))
    }

    fn connection(&self) -> Result<Option<ConnectionInfo>> {
        Ok(connect_info(&self.extensions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::detect_facts;
    use crate::probe::StaticHost;
    use crate::request::{RequestReport, extract_request_info};
    use axum::Json;
    use axum::routing::post;
    use tower::ServiceExt;

    #[test]
    fn test_request_accessors() {
        let mut req = Request::builder()
            .method("DELETE")
            .uri("https://api.example.com/items/3?force=1")
            .header("accept", "text/plain")
            .header("accept", "application/json")
            .header("host", "api.example.com")
            .body(String::from("bye"))
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 20], 40000))));

        assert_eq!(RequestLike::method(&req).unwrap().as_deref(), Some("DELETE"));
        assert_eq!(
            RequestLike::url(&req).unwrap().as_deref(),
            Some("https://api.example.com/items/3?force=1")
        );
        assert_eq!(req.protocol().unwrap().as_deref(), Some("https"));

        let headers = RequestLike::headers(&req).unwrap().unwrap();
        assert_eq!(headers["host"], "api.example.com");
        assert_eq!(
            headers["accept"],
            serde_json::json!(["text/plain", "application/json"])
        );

        let conn = req.connection().unwrap().unwrap();
        assert_eq!(conn.remote_address.as_deref(), Some("192.168.1.20"));
        assert_eq!(conn.remote_port, Some(40000));
        assert_eq!(conn.remote_family.as_deref(), Some("IPv4"));

        assert_eq!(
            RequestLike::body(&req).unwrap(),
            Some(BodyView::Text(Cow::Borrowed("bye")))
        );
    }

    #[test]
    fn test_origin_form_has_no_scheme() {
        let (parts, ()) = Request::builder()
            .uri("/health")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(parts.protocol().unwrap(), None);
        assert_eq!(RequestLike::url(&parts).unwrap().as_deref(), Some("/health"));
        assert_eq!(parts.connection().unwrap(), None);
    }

    #[test]
    fn test_bytes_bodies() {
        assert_eq!(Bytes::new().view(), None);
        assert_eq!(
            Bytes::from_static(&[0xff, 0xfe, 0x00]).view(),
            Some(BodyView::Binary(3))
        );
        assert_eq!(
            Bytes::from_static(b"ok").view(),
            Some(BodyView::Text(Cow::Borrowed("ok")))
        );
    }

    async fn echo(request: axum::extract::Request) -> Json<RequestReport> {
        let facts = detect_facts(&StaticHost::node("v20.11.1"));
        let (parts, body) = request.into_parts();
        let report = match axum::body::to_bytes(body, 64 * 1024).await {
            Ok(bytes) => extract_request_info(&facts, Some(&Request::from_parts(parts, bytes))),
            Err(err) => RequestReport::failure(err.to_string()),
        };
        Json(report)
    }

    #[tokio::test]
    async fn test_extract_inside_axum_handler() {
        let router = axum::Router::new().route("/echo", post(echo));

        let mut request = Request::builder()
            .method("POST")
            .uri("/echo?page=2&page=3")
            .header("Host", "svc.internal:8080")
            .header("Content-Type", "application/json")
            .header("X-Requested-With", "XMLHttpRequest")
            .body(axum::body::Body::from(r#"{"name":"x","tags":[1,2]}"#))
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 5555))));

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let report: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(report["method"], "POST");
        assert_eq!(report["url"]["pathname"], "/echo");
        assert_eq!(report["url"]["full"], "http://svc.internal:8080/echo?page=2&page=3");
        assert_eq!(report["query"]["page"], "3");
        assert_eq!(report["headers"]["host"], "svc.internal:8080");
        assert_eq!(report["headers"]["contentType"], "application/json");
        assert_eq!(report["client"]["ip"], "10.1.2.3");
        assert_eq!(report["client"]["port"], 5555);
        assert_eq!(report["body"]["type"], "string");
        assert_eq!(report["isXmlHttpRequest"], true);
        assert_eq!(report["isSecure"], false);
    }
}
