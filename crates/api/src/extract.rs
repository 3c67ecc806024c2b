//! Body and query extractors that report decoding failures per field.
//!
//! A request that is well-formed JSON (or a well-formed query string) but
//! does not fit the target type is answered with `VALIDATION_ERROR` and a
//! `fields` entry naming the offending key, the same shape the field rules
//! produce.

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use secplan_core::error::CoreError;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body.
///
/// Size, content-type and syntax failures are rejected through
/// [`JsonRejection`](axum::extract::rejection::JsonRejection).
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<serde_json::Value>::from_request(req, state).await?;
        serde_path_to_error::deserialize(value)
            .map(JsonBody)
            .map_err(|err| AppError::Core(field_error(err, "body")))
    }
}

/// Query string parameters. An absent query decodes like an empty one.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        let deserializer =
            serde_urlencoded::Deserializer::new(form_urlencoded::parse(query.as_bytes()));
        serde_path_to_error::deserialize(deserializer)
            .map(QueryParams)
            .map_err(|err| AppError::Core(field_error(err, "query")))
    }
}

/// Turn a decoding error into a single-field [`CoreError::InvalidFields`].
///
/// A missing key is reported at the key itself, not at its parent. Errors
/// with no path are reported against `root`.
fn field_error<E>(err: serde_path_to_error::Error<E>, root: &str) -> CoreError
where
    E: std::fmt::Display,
{
    let path = err.path().to_string();
    let message = err.inner().to_string();
    let at_root = path == ".";
    let field = match missing_field(&message) {
        Some(name) if at_root => name.to_string(),
        Some(name) => format!("{path}.{name}"),
        None if at_root => root.to_string(),
        None => path,
    };
    tracing::debug!(field = %field, error = %message, "Rejected request input");
    CoreError::field(field, message)
}

/// The key named by serde's "missing field `x`" message.
fn missing_field(message: &str) -> Option<&str> {
    message.strip_prefix("missing field `")?.split('`').next()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Body {
        name: String,
        typology_id: i64,
        year: Option<i32>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Params {
        page: Option<i64>,
        search: Option<String>,
    }

    fn decode_json(raw: &str) -> CoreError {
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        let err = serde_path_to_error::deserialize::<_, Body>(value).unwrap_err();
        field_error(err, "body")
    }

    fn decode_query(raw: &str) -> CoreError {
        let deserializer =
            serde_urlencoded::Deserializer::new(form_urlencoded::parse(raw.as_bytes()));
        let err = serde_path_to_error::deserialize::<_, Params>(deserializer).unwrap_err();
        field_error(err, "query")
    }

    #[test]
    fn missing_key_is_named() {
        assert_matches!(
            decode_json(r#"{"name": "Sin tipología"}"#),
            CoreError::InvalidFields(fields) => {
                assert_eq!(fields[0].field, "typology_id");
            }
        );
    }

    #[test]
    fn wrong_type_is_reported_at_its_key() {
        assert_matches!(
            decode_json(r#"{"name": "Plaza", "typology_id": 3, "year": "dos mil"}"#),
            CoreError::InvalidFields(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "year");
            }
        );
    }

    #[test]
    fn non_object_body_is_reported_at_root() {
        assert_matches!(
            decode_json("true"),
            CoreError::InvalidFields(fields) => assert_eq!(fields[0].field, "body")
        );
    }

    #[test]
    fn unparsable_query_value_is_named() {
        assert_matches!(
            decode_query("search=plaza&page=abc"),
            CoreError::InvalidFields(fields) => assert_eq!(fields[0].field, "page")
        );
    }

    #[test]
    fn missing_field_reads_backticked_name() {
        assert_eq!(missing_field("missing field `name`"), Some("name"));
        assert_eq!(missing_field("invalid type: null"), None);
    }
}
