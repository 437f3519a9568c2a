//! Error objects and error documents.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::doc::DocItem;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLinks {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub about: String,
}

impl ErrorLinks {
    pub fn is_empty(&self) -> bool {
        self.about.is_empty()
    }
}

/// Where in the request an error originated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSource {
    /// JSON pointer into the request document (e.g. `/data/attributes/title`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pointer: String,
    /// Query parameter that caused the error.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parameter: String,
}

impl ErrorSource {
    pub fn is_empty(&self) -> bool {
        self.pointer.is_empty() && self.parameter.is_empty()
    }
}

/// A JSON:API error object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "ErrorLinks::is_empty")]
    pub links: ErrorLinks,
    /// HTTP reason phrase, e.g. `"Not Found"`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    /// Numeric HTTP status rendered as a string, e.g. `"404"`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    #[serde(default, skip_serializing_if = "ErrorSource::is_empty")]
    pub source: ErrorSource,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl ErrorObject {
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status: status_text(status).to_string(),
            code: status.to_string(),
            detail: detail.into(),
            ..Self::default()
        }
    }
}

impl DocItem {
    /// Build an error document with one error object per failure.
    pub fn from_errors<I, E>(status: u16, errors: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Display,
    {
        Self {
            data: None,
            errors: errors
                .into_iter()
                .map(|err| ErrorObject::new(status, err.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    /// 404 error document.
    pub fn not_found<E: Display>(err: E) -> Self {
        Self::from_errors(404, [err])
    }

    /// 500 error document.
    pub fn internal_error<E: Display>(err: E) -> Self {
        Self::from_errors(500, [err])
    }

    /// 422 error document pointing at the offending part of the request.
    pub fn unprocessable<E: Display>(pointer: impl Into<String>, err: E) -> Self {
        let mut doc = Self::from_errors(422, [err]);
        let pointer = pointer.into();
        for error in &mut doc.errors {
            error.source.pointer = pointer.clone();
        }
        doc
    }
}

/// Reason phrase for the HTTP status codes this crate produces.
pub fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        409 => "Conflict",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "",
    }
}
