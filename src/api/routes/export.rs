//! Journey export handler.

use crate::api::AppState;
use crate::error::{Error, MISSING_CREDENTIALS_MESSAGE, Result};
use crate::relay::{ExportBody, ExportFile};
use crate::types::Credentials;
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{
        HeaderMap, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        request::Parts,
    },
    response::Response,
};

/// Request header carrying the platform e-mail
pub const EMAIL_HEADER: &str = "email";
/// Request header carrying the platform password
pub const PASSWORD_HEADER: &str = "password";
/// Response header with the SHA-256 of the file (integrity mode only)
pub const SHA256_HEADER: &str = "x-content-sha256";
/// Response header with the MD5 of the file (integrity mode only)
pub const MD5_HEADER: &str = "x-content-md5";

/// Credentials taken from the `email` and `password` request headers
///
/// Rejects with a 400 when either header is missing or blank.
pub struct HeaderCredentials(pub Credentials);

#[async_trait]
impl<S> FromRequestParts<S> for HeaderCredentials
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let email = header_value(&parts.headers, EMAIL_HEADER);
        let password = header_value(&parts.headers, PASSWORD_HEADER);

        match (email, password) {
            (Some(email), Some(password)) => {
                Ok(HeaderCredentials(Credentials::new(email, password)))
            }
            _ => Err(Error::Validation(MISSING_CREDENTIALS_MESSAGE.to_string())),
        }
    }
}

/// Read a header as text, treating only absent or blank values as missing.
///
/// Values are decoded as UTF-8, falling back to Latin-1 for clients that send
/// raw ISO-8859-1 bytes.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let bytes = headers.get(name)?.as_bytes();
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// GET /api/journey-export - Download yesterday's journey export
#[utoipa::path(
    get,
    path = "/api/journey-export",
    tag = "export",
    params(
        ("email" = String, Header, description = "Platform account e-mail"),
        ("password" = String, Header, description = "Platform account password")
    ),
    responses(
        (status = 200, description = "The export file", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Missing credentials", body = crate::error::ApiError),
        (status = 401, description = "Platform rejected the credentials", body = crate::error::ApiError),
        (status = 500, description = "Resolution or download failed", body = crate::error::ApiError)
    )
)]
pub async fn journey_export(
    State(state): State<AppState>,
    HeaderCredentials(credentials): HeaderCredentials,
) -> Result<Response> {
    // Dropping this handler (caller disconnected) cancels the token and
    // stops any poll in progress.
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let (_, file) = state.exporter.export(&credentials, &cancel).await?;
    file_response(file, &state.exporter.config().relay.download_filename)
}

fn file_response(file: ExportFile, filename: &str) -> Result<Response> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, file.content_type)
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        );

    if let Some(length) = file.content_length {
        builder = builder.header(CONTENT_LENGTH, length);
    }
    if let Some(digests) = &file.digests {
        builder = builder
            .header(SHA256_HEADER, &digests.sha256)
            .header(MD5_HEADER, &digests.md5);
    }

    let body = match file.body {
        ExportBody::Stream(stream) => Body::from_stream(stream),
        ExportBody::Buffered(bytes) => Body::from(bytes),
    };

    builder
        .body(body)
        .map_err(|e| Error::ApiServerError(format!("failed to build file response: {e}")))
}
