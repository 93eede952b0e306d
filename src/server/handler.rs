//! Request handling for the issuance service
//!
//! # Endpoints
//!
//! * `GET /generate-upload-url?fileName=<name>` - issue a pre-signed PUT URL
//! * `GET /health` - health check (returns "ok")
//! * `OPTIONS *` - CORS preflight
//!
//! Every response allows any origin.

use crate::issuance::{
    ErrorResponse, IssuanceError, UploadUrlIssuer, UploadUrlResponse, GENERIC_ERROR_MESSAGE,
    INVALID_NAME_MESSAGE, UPLOAD_URL_PATH,
};
use crate::metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS, CONTENT_TYPE, VARY,
};
use hyper::{Method, Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info};

/// Query parameter carrying the object name.
pub const FILE_NAME_PARAM: &str = "fileName";

const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Handle one HTTP request
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    issuer: Arc<UploadUrlIssuer>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Handling {} {}", method, path);

    let (route, mut response) = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => ("preflight", preflight_response(&req)),
        (&Method::GET, "/health") => ("/health", text_response(StatusCode::OK, "ok")),
        (&Method::GET, UPLOAD_URL_PATH) => {
            let file_name = query_param(req.uri().query(), FILE_NAME_PARAM).unwrap_or_default();
            (UPLOAD_URL_PATH, generate_upload_url(&issuer, &file_name).await)
        }
        _ => (
            "unmatched",
            json_response(
                StatusCode::NOT_FOUND,
                &ErrorResponse {
                    error: "Not Found".into(),
                },
            ),
        ),
    };

    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

    metrics::record_http_request(route, response.status().as_u16());
    Ok(response)
}

async fn generate_upload_url(issuer: &UploadUrlIssuer, file_name: &str) -> Response<Full<Bytes>> {
    match issuer.issue_upload_url(file_name).await {
        Ok(issued) => {
            info!(key = %issued.key, expires_at = %issued.expires_at, "Issued upload URL");
            json_response(
                StatusCode::OK,
                &UploadUrlResponse {
                    upload_url: issued.url,
                },
            )
        }
        Err(IssuanceError::InvalidName(_)) => json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: INVALID_NAME_MESSAGE.into(),
            },
        ),
        // Cause already logged by the issuer; never echoed to the caller
        Err(IssuanceError::Signing(_)) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorResponse {
                error: GENERIC_ERROR_MESSAGE.into(),
            },
        ),
    }
}

fn preflight_response<B>(req: &Request<B>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;

    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    if let Some(requested) = req.headers().get(ACCESS_CONTROL_REQUEST_HEADERS) {
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        headers.insert(VARY, HeaderValue::from_static("Access-Control-Request-Headers"));
    }
    response
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(Full::new(Bytes::from(bytes)));
            *response.status_mut() = status;
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            );
            response
        }
        Err(e) => {
            metrics::record_error("serialize");
            tracing::error!(error = %e, "Failed to serialize response body");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_MESSAGE)
        }
    }
}

/// Find the first value of `name` in a query string, percent-decoded and with
/// `+` read as a space.
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?
        .split('&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let mut kv = pair.splitn(2, '=');
            let key = decode_component(kv.next()?);
            (key == name).then(|| decode_component(kv.next().unwrap_or("")))
        })
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
