use std::collections::BTreeMap;

use super::error::NO_REQUEST;
use super::like::Headers;

/// Canonical description of a request.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    /// Absent when the request carried no URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<UrlInfo>,
    /// Absent when the request carried no headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HeaderInfo>,
    pub method: String,
    pub client: ClientInfo,
    /// Query parameters; a repeated key keeps its last value.
    pub query: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyInfo>,
    pub is_secure: bool,
    pub is_xml_http_request: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlInfo {
    pub full: String,
    pub pathname: String,
    /// Query string including the leading `?`, or empty.
    pub search: String,
    /// Fragment including the leading `#`, or empty.
    pub hash: String,
    /// Scheme without the trailing `:`.
    pub protocol: String,
}

/// Headers as supplied plus normalized convenience fields. Missing headers are empty strings.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderInfo {
    pub all: Headers,
    pub user_agent: String,
    pub host: String,
    pub content_type: String,
    pub origin: String,
    pub referer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyInfo {
    /// Length in UTF-16 code units of the text or its JSON serialization; bytes for binary bodies.
    pub size: usize,
    #[serde(rename = "type")]
    pub kind: String,
    /// Top-level keys of structured bodies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
}

/// Result of [`extract_request_info`](super::extract_request_info).
///
/// Serializes as either the full [`RequestInfo`] or `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum RequestReport {
    Info(Box<RequestInfo>),
    Error { error: String },
}

impl RequestReport {
    pub fn failure(message: impl Into<String>) -> Self {
        RequestReport::Error {
            error: message.into(),
        }
    }

    /// The record for a missing request.
    pub fn missing() -> Self {
        Self::failure(NO_REQUEST)
    }

    pub fn info(&self) -> Option<&RequestInfo> {
        match self {
            RequestReport::Info(info) => Some(info),
            RequestReport::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestReport::Info(_) => None,
            RequestReport::Error { error } => Some(error),
        }
    }
}
