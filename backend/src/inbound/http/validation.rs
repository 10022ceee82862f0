//! Shared validation helpers for the ballot endpoint.
//!
//! Every helper yields a 400 [`Error`] tagged `VALIDATION_ERROR` whose
//! `details` name the offending field.

use serde_json::json;

use crate::domain::{Error, IdentifierValidationError, PhoneNumber, Round, validation_error};

/// Detail codes for request validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldErrorCode {
    MissingField,
    InvalidValue,
}

impl FieldErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidValue => "invalid_value",
        }
    }
}

/// Wire name of a request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) const CODE_ID: FieldName = FieldName::new("codeId");
pub(crate) const VOTER_ID: FieldName = FieldName::new("voterId");
pub(crate) const CANDIDATE_IDS: FieldName = FieldName::new("candidateIds");
pub(crate) const CATEGORY_ID: FieldName = FieldName::new("categoryId");
pub(crate) const ROUND: FieldName = FieldName::new("round");
pub(crate) const PHONE: FieldName = FieldName::new("phone");

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    validation_error(format!("missing required field: {field}")).with_details(json!({
        "field": field,
        "code": FieldErrorCode::MissingField.as_str(),
    }))
}

pub(crate) fn invalid_field_error(field: FieldName, message: impl Into<String>) -> Error {
    validation_error(message).with_details(json!({
        "field": field.as_str(),
        "code": FieldErrorCode::InvalidValue.as_str(),
    }))
}

fn invalid_index_error(field: FieldName, index: usize, message: impl Into<String>) -> Error {
    validation_error(message).with_details(json!({
        "field": field.as_str(),
        "index": index,
        "code": FieldErrorCode::InvalidValue.as_str(),
    }))
}

/// Surrounding whitespace is not part of an identifier.
fn trimmed(raw: String) -> String {
    let inner = raw.trim();
    if inner.len() == raw.len() {
        raw
    } else {
        inner.to_owned()
    }
}

/// Parse a required identifier; absent and blank values are both missing.
pub(crate) fn parse_required<T>(
    value: Option<String>,
    field: FieldName,
    parse: impl FnOnce(String) -> Result<T, IdentifierValidationError>,
) -> Result<T, Error> {
    match value {
        Some(raw) if !raw.trim().is_empty() => {
            parse(trimmed(raw)).map_err(|err| invalid_field_error(field, err.to_string()))
        }
        _ => Err(missing_field_error(field)),
    }
}

/// Parse an optional identifier; blank values count as absent.
pub(crate) fn parse_optional<T>(
    value: Option<String>,
    field: FieldName,
    parse: impl FnOnce(String) -> Result<T, IdentifierValidationError>,
) -> Result<Option<T>, Error> {
    match value {
        Some(raw) if !raw.trim().is_empty() => parse(trimmed(raw))
            .map(Some)
            .map_err(|err| invalid_field_error(field, err.to_string())),
        _ => Ok(None),
    }
}

/// Parse a non-empty list of identifiers, reporting the first bad index.
pub(crate) fn parse_required_list<T>(
    values: Option<Vec<String>>,
    field: FieldName,
    parse: impl Fn(String) -> Result<T, IdentifierValidationError>,
) -> Result<Vec<T>, Error> {
    let values = values.unwrap_or_default();
    if values.is_empty() {
        return Err(missing_field_error(field));
    }
    values
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            parse(trimmed(raw))
                .map_err(|err| invalid_index_error(field, index, err.to_string()))
        })
        .collect()
}

/// Parse the round number, defaulting to the first round.
pub(crate) fn parse_round(value: Option<i64>) -> Result<Round, Error> {
    value.map_or(Ok(Round::default()), |raw| {
        Round::try_from(raw).map_err(|err| invalid_field_error(ROUND, err.to_string()))
    })
}

/// Normalise an optional phone number; blank values count as absent.
pub(crate) fn parse_phone(value: Option<String>) -> Result<Option<PhoneNumber>, Error> {
    match value {
        Some(raw) if !raw.trim().is_empty() => PhoneNumber::normalize(&raw)
            .map(Some)
            .map_err(|err| invalid_field_error(PHONE, err.to_string())),
        _ => Ok(None),
    }
}

/// Blank session tokens count as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}
