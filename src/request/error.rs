/// Message of the record returned when no request was given.
pub const NO_REQUEST: &str = "No request object provided";

/// Errors raised while normalizing a request.
///
/// None of them escape [`extract_request_info`](super::extract_request_info); they
/// become the `error` field of a [`RequestReport`](super::RequestReport).
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("failed to serialize request body: {0}")]
    Body(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RequestError>;
