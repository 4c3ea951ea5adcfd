//! Form body extraction.
//!
//! Endpoints accept either `multipart/form-data` (required when a file is
//! attached) or `application/x-www-form-urlencoded` bodies. Text fields are
//! collected by name; the part named `file` becomes the optional upload.

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{
        FromRequest, Multipart, Request,
        multipart::{MultipartError, MultipartRejection},
        rejection::BytesRejection,
    },
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::core::staging::Upload;

/// Name of the multipart part carrying the upload.
pub const FILE_FIELD: &str = "file";

/// Text fields and optional upload of a form request.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    file: Option<Upload>,
}

impl FormData {
    /// A text field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A text field that the endpoint cannot do without.
    pub fn require(&self, name: &str) -> Result<&str, FormRejection> {
        self.field(name)
            .ok_or_else(|| FormRejection::MissingField(name.to_string()))
    }

    /// Take the upload out of the form.
    pub fn take_file(&mut self) -> Option<Upload> {
        self.file.take()
    }

    async fn read_multipart(mut multipart: Multipart) -> Result<Self, FormRejection> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if name == FILE_FIELD {
                let filename = field.file_name().map(str::to_owned);
                let upload = Upload::new(filename, field.bytes().await?);
                if !upload.is_empty() {
                    form.file = Some(upload);
                }
            } else {
                let text = field.text().await?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    fn read_urlencoded(body: &[u8]) -> Result<Self, FormRejection> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;
        Ok(Self {
            fields: pairs.into_iter().collect(),
            file: None,
        })
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = FormRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await?;
            Self::read_multipart(multipart).await
        } else if content_type.is_empty()
            || content_type.starts_with("application/x-www-form-urlencoded")
        {
            let body = Bytes::from_request(req, state).await?;
            Self::read_urlencoded(&body)
        } else {
            Err(FormRejection::UnsupportedContentType(content_type))
        }
    }
}

/// Reasons a form body could not be extracted.
#[derive(Debug, Error)]
pub enum FormRejection {
    #[error("missing form field '{0}'")]
    MissingField(String),

    #[error("unsupported content type '{0}', expected a form")]
    UnsupportedContentType(String),

    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartRejection),

    #[error("invalid multipart field: {0}")]
    MultipartField(#[from] MultipartError),

    #[error("unreadable body: {0}")]
    Body(#[from] BytesRejection),

    #[error("invalid urlencoded body: {0}")]
    Urlencoded(#[from] serde_urlencoded::de::Error),
}

impl FormRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Multipart(e) => client_status(e.status()),
            Self::MultipartField(e) => client_status(e.status()),
            Self::Body(e) => client_status(e.status()),
            Self::Urlencoded(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// A body that cannot be read is the client's fault; never answer 5xx for it.
fn client_status(status: StatusCode) -> StatusCode {
    if status.is_server_error() {
        StatusCode::BAD_REQUEST
    } else {
        status
    }
}

impl IntoResponse for FormRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
