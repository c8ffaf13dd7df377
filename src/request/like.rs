use std::borrow::Cow;

use serde_json::{Map, Value};

use super::{RequestError, Result};

/// Header mapping exactly as the request carried it.
pub type Headers = Map<String, Value>;

/// Remote end of the connection a request arrived on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub remote_address: Option<String>,
    pub remote_port: Option<u16>,
    /// `IPv4` or `IPv6`.
    pub remote_family: Option<String>,
}

/// A borrowed view of a request body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyView<'a> {
    Text(Cow<'a, str>),
    Json(Cow<'a, Value>),
    /// Raw bytes that are not UTF-8; only the length is known.
    Binary(usize),
}

/// Something that looks enough like an HTTP request to be normalized.
///
/// Frameworks disagree on the shape of a request, so every accessor is optional and
/// defaults to "not present". An accessor returns an error when the field exists but
/// has a shape that cannot be used.
pub trait RequestLike {
    /// Returns `true` if the value stands for "no request", e.g. JSON `null`.
    fn is_absent(&self) -> bool {
        false
    }

    fn method(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Request target, absolute or origin-relative.
    fn url(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Explicit scheme, taking precedence over the one in the URL.
    fn protocol(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn secure(&self) -> Result<Option<bool>> {
        Ok(None)
    }

    fn headers(&self) -> Result<Option<Headers>> {
        Ok(None)
    }

    /// Client address resolved by the framework, e.g. behind a trusted proxy.
    fn ip(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn connection(&self) -> Result<Option<ConnectionInfo>> {
        Ok(None)
    }

    fn body(&self) -> Result<Option<BodyView<'_>>> {
        Ok(None)
    }
}

/// Returns the named field, treating `null` as missing. Non-objects have no fields.
fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value
        .as_object()
        .and_then(|obj| obj.get(name))
        .filter(|v| !v.is_null())
}

fn string_field(value: &Value, name: &'static str) -> Result<Option<String>> {
    match field(value, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RequestError::InvalidField {
            field: name,
            expected: "a string",
        }),
    }
}

fn connection_from(value: &Value) -> Option<ConnectionInfo> {
    let obj = value.as_object()?;
    let text = |name: &str| obj.get(name).and_then(Value::as_str).map(str::to_owned);

    Some(ConnectionInfo {
        remote_address: text("remoteAddress"),
        remote_port: obj
            .get("remotePort")
            .and_then(Value::as_u64)
            .and_then(|port| u16::try_from(port).ok()),
        remote_family: text("remoteFamily"),
    })
}

/// Untyped requests, e.g. a deserialized framework request object.
///
/// Remote connection details are read from `connection`, falling back to `socket`.
impl RequestLike for Value {
    fn is_absent(&self) -> bool {
        self.is_null()
    }

    fn method(&self) -> Result<Option<String>> {
        string_field(self, "method")
    }

    fn url(&self) -> Result<Option<String>> {
        string_field(self, "url")
    }

    fn protocol(&self) -> Result<Option<String>> {
        string_field(self, "protocol")
    }

    fn secure(&self) -> Result<Option<bool>> {
        Ok(field(self, "secure").map(|v| v.as_bool() == Some(true)))
    }

    fn headers(&self) -> Result<Option<Headers>> {
        match field(self, "headers") {
            None => Ok(None),
            Some(Value::Object(headers)) => Ok(Some(headers.clone())),
            Some(_) => Err(RequestError::InvalidField {
                field: "headers",
                expected: "an object",
            }),
        }
    }

    fn ip(&self) -> Result<Option<String>> {
        string_field(self, "ip")
    }

    fn connection(&self) -> Result<Option<ConnectionInfo>> {
        Ok(["connection", "socket"]
            .into_iter()
            .find_map(|name| field(self, name).and_then(connection_from)))
    }

    fn body(&self) -> Result<Option<BodyView<'_>>> {
        Ok(field(self, "body").map(|body| match body {
            Value::String(s) => BodyView::Text(Cow::Borrowed(s.as_str())),
            other => BodyView::Json(Cow::Borrowed(other)),
        }))
    }
}
