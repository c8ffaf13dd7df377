//! Request normalization.
//!
//! Turns request-like values of any shape ([`RequestLike`]) into one canonical
//! [`RequestInfo`], failing soft with an error record.
mod error;
mod extract;
mod http;
mod like;
mod models;

pub use error::{NO_REQUEST, RequestError, Result};
pub use extract::{BROWSER_CLIENT_IP, FALLBACK_HOST, extract_request_info};
pub use http::RequestBody;
pub use like::{BodyView, ConnectionInfo, Headers, RequestLike};
pub use models::{BodyInfo, ClientInfo, HeaderInfo, RequestInfo, RequestReport, UrlInfo};
