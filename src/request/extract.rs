use serde_json::Value;
use url::Url;

use crate::environment::{FactTable, RuntimeKind};

use super::like::{BodyView, Headers, RequestLike};
use super::models::{BodyInfo, ClientInfo, HeaderInfo, RequestInfo, RequestReport, UrlInfo};
use super::{RequestError, Result};

/// Authority used to resolve relative URLs when the request has no `host` header.
pub const FALLBACK_HOST: &str = "localhost";

const DEFAULT_METHOD: &str = "GET";

/// Client address reported on browser-like hosts, which never see one.
pub const BROWSER_CLIENT_IP: &str = "N/A";

/// Normalizes a request into a [`RequestInfo`].
///
/// Never fails. A missing request (or JSON `null`) yields `{"error": "No request object
/// provided"}`; any error during extraction yields `{"error": <message>}` and drops
/// everything extracted so far.
pub fn extract_request_info<R: RequestLike + ?Sized>(
    facts: &FactTable,
    request: Option<&R>,
) -> RequestReport {
    let Some(request) = request.filter(|req| !req.is_absent()) else {
        return RequestReport::missing();
    };

    match extract(facts, request) {
        Ok(info) => RequestReport::Info(Box::new(info)),
        Err(err) => {
            log::debug!("Failed to extract request info: {}", err);
            RequestReport::failure(err.to_string())
        }
    }
}

fn extract<R: RequestLike + ?Sized>(facts: &FactTable, request: &R) -> Result<RequestInfo> {
    let headers = request.headers()?;
    let header_info = headers.map(normalize_headers);
    let protocol = request.protocol()?;

    let mut info = RequestInfo {
        method: request
            .method()?
            .filter(|method| !method.is_empty())
            .unwrap_or_else(|| DEFAULT_METHOD.to_owned()),
        ..Default::default()
    };

    let mut scheme = protocol.clone();
    if let Some(raw) = request.url()? {
        let host = header_info
            .as_ref()
            .map(|h| h.host.as_str())
            .filter(|host| !host.is_empty())
            .unwrap_or(FALLBACK_HOST);
        let parsed = resolve_url(&raw, host)?;

        info.query = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let url_protocol = protocol.unwrap_or_else(|| parsed.scheme().to_owned());
        scheme = Some(url_protocol.clone());
        info.url = Some(UrlInfo {
            full: parsed.as_str().to_owned(),
            pathname: parsed.path().to_owned(),
            search: prefixed('?', parsed.query()),
            hash: prefixed('#', parsed.fragment()),
            protocol: url_protocol,
        });
    }

    info.client = match facts.runtime_kind() {
        RuntimeKind::Node => server_client(request, header_info.as_ref())?,
        RuntimeKind::Browser | RuntimeKind::WebWorker => ClientInfo {
            ip: Some(BROWSER_CLIENT_IP.to_owned()),
            kind: Some("browser".to_owned()),
            ..Default::default()
        },
        _ => ClientInfo::default(),
    };

    info.body = request.body()?.map(describe_body).transpose()?;

    info.is_secure = request.secure()?.unwrap_or(false) || scheme.as_deref() == Some("https");
    info.is_xml_http_request = header_info
        .as_ref()
        .and_then(|h| find_header_ignore_case(&h.all, "x-requested-with"))
        .is_some_and(|v| v == "XMLHttpRequest");
    info.headers = header_info;

    Ok(info)
}

/// Resolves a request target against `http://{host}`.
fn resolve_url(raw: &str, host: &str) -> Result<Url> {
    let base_str = format!("http://{host}");
    let base = Url::parse(&base_str).map_err(|source| RequestError::InvalidUrl {
        url: base_str.clone(),
        source,
    })?;
    base.join(raw).map_err(|source| RequestError::InvalidUrl {
        url: raw.to_owned(),
        source,
    })
}

fn prefixed(prefix: char, part: Option<&str>) -> String {
    match part {
        Some(part) if !part.is_empty() => format!("{prefix}{part}"),
        _ => String::new(),
    }
}

fn server_client<R: RequestLike + ?Sized>(
    request: &R,
    headers: Option<&HeaderInfo>,
) -> Result<ClientInfo> {
    let connection = request.connection()?.unwrap_or_default();
    let forwarded = headers.and_then(|h| header_value(&h.all, "x-forwarded-for"));

    let ip = [request.ip()?, forwarded, connection.remote_address]
        .into_iter()
        .flatten()
        .find(|ip| !ip.is_empty())
        .unwrap_or_default();

    Ok(ClientInfo {
        ip: Some(ip),
        port: connection.remote_port,
        family: connection.remote_family,
        kind: None,
    })
}

fn describe_body(body: BodyView<'_>) -> Result<BodyInfo> {
    Ok(match body {
        BodyView::Text(text) => BodyInfo {
            size: utf16_len(&text),
            kind: "string".to_owned(),
            keys: None,
        },
        BodyView::Json(value) => {
            let serialized = serde_json::to_string(value.as_ref())?;
            let (kind, keys) = match value.as_ref() {
                Value::Object(map) => ("object", Some(map.keys().cloned().collect())),
                // arrays are objects keyed by index
                Value::Array(items) => (
                    "object",
                    Some((0..items.len()).map(|i| i.to_string()).collect()),
                ),
                Value::Number(_) => ("number", None),
                Value::Bool(_) => ("boolean", None),
                Value::String(_) => ("string", None),
                Value::Null => ("null", None),
            };
            BodyInfo {
                size: utf16_len(&serialized),
                kind: kind.to_owned(),
                keys,
            }
        }
        BodyView::Binary(len) => BodyInfo {
            size: len,
            kind: "binary".to_owned(),
            keys: None,
        },
    })
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

fn normalize_headers(all: Headers) -> HeaderInfo {
    let get = |name: &str| header_value(&all, name).unwrap_or_default();
    HeaderInfo {
        user_agent: get("user-agent"),
        host: get("host"),
        content_type: get("content-type"),
        origin: get("origin"),
        referer: get("referer"),
        all,
    }
}

/// `user-agent` -> `User-Agent`.
fn capitalize_header(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Looks a header up by its lower-case name, then by its capitalized name.
fn header_value(headers: &Headers, lower: &str) -> Option<String> {
    [lower.to_owned(), capitalize_header(lower)]
        .iter()
        .find_map(|name| headers.get(name).and_then(header_text).filter(|v| !v.is_empty()))
}

fn find_header_ignore_case(headers: &Headers, name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| header_text(value))
}

fn header_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(header_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Object(_) => None,
    }
}
