//! Form input and validation.
//!
//! Handlers extract a [`FormData`] (multipart or urlencoded), run the
//! resource's validator, and either persist the validated input or re-render
//! the form with [`ValidationErrors`] and the submitted values.

pub mod addresses;
pub mod categories;
pub mod contacts;
pub mod items;
pub mod users;

use std::str::FromStr;

use axum::{
    Form,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::error::AppError;
use crate::services::UploadedFile;

pub use addresses::{AddressForm, validate_address};
pub use categories::{CategoryForm, validate_category};
pub use contacts::{ContactForm, validate_contact};
pub use items::{ItemForm, validate_item};
pub use users::{UserForm, validate_store_user, validate_update_user};

/// Result of running a validator: the typed input, or field errors.
pub type Validated<T> = Result<T, ValidationErrors>;

/// Field-level validation messages, in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field.to_string(), vec![message])),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    /// All messages for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map_or(&[], |(_, messages)| messages.as_slice())
    }

    /// First message for `field`, as shown under the input.
    #[must_use]
    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    /// Number of fields with at least one message.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `Ok(value)` when no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when any field failed.
    pub fn into_result<T>(self, value: impl FnOnce() -> Option<T>) -> Validated<T> {
        if !self.is_empty() {
            return Err(self);
        }
        value().ok_or(self)
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// Submitted form fields and files.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<(String, UploadedFile)>,
}

impl FormData {
    /// Build from urlencoded pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            fields: pairs,
            files: Vec::new(),
        }
    }

    /// Read every part of a multipart body. File inputs left empty by the
    /// browser are skipped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is malformed.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.files.push((
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        bytes,
                    },
                ));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.fields.push((name, value));
            }
        }

        Ok(form)
    }

    /// Raw value of the last field named `name`.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed value of `name`, or `None` when absent or blank.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.raw(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Every value submitted under `name`.
    #[must_use]
    pub fn all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Checkbox state: present with `1`, `true` or `on`.
    #[must_use]
    pub fn checked(&self, name: &str) -> bool {
        self.text(name)
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "on"))
    }

    /// Uploaded file named `name`.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, file)| file)
    }

    /// Submitted value for re-rendering a form; empty when absent.
    #[must_use]
    pub fn old(&self, name: &str) -> &str {
        self.raw(name).unwrap_or_default()
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self::from_pairs(pairs))
        }
    }
}

/// Rule helpers shared by the resource validators.
///
/// Each helper records a message on failure and returns the parsed value on
/// success, so a validator reads top to bottom and collects every error in
/// one pass.
pub struct Rules<'f> {
    form: &'f FormData,
    errors: ValidationErrors,
}

impl<'f> Rules<'f> {
    #[must_use]
    pub fn new(form: &'f FormData) -> Self {
        Self {
            form,
            errors: ValidationErrors::new(),
        }
    }

    /// Record a message against `field`.
    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    #[must_use]
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.has(field)
    }

    /// Trimmed value, or `None` when blank.
    #[must_use]
    pub fn optional(&self, field: &str) -> Option<String> {
        self.form.text(field).map(str::to_string)
    }

    /// Trimmed value; records `message` when blank.
    pub fn required(&mut self, field: &str, message: &str) -> Option<String> {
        let value = self.optional(field);
        if value.is_none() {
            self.fail(field, message);
        }
        value
    }

    /// Records `message` when `value` is longer than `max` characters.
    pub fn max_chars(&mut self, field: &str, value: Option<&str>, max: usize, message: &str) {
        if value.is_some_and(|v| v.chars().count() > max) {
            self.fail(field, message);
        }
    }

    /// Parse a present value; records `invalid` when it does not parse.
    pub fn parse<T: FromStr>(&mut self, field: &str, invalid: &str) -> Option<T> {
        let raw = self.form.text(field)?;
        let parsed = raw.parse().ok();
        if parsed.is_none() {
            self.fail(field, invalid);
        }
        parsed
    }

    /// Parse a value that must be present.
    pub fn parse_required<T: FromStr>(
        &mut self,
        field: &str,
        missing: &str,
        invalid: &str,
    ) -> Option<T> {
        if self.form.text(field).is_none() {
            self.fail(field, missing);
            return None;
        }
        self.parse(field, invalid)
    }

    /// Optional image upload: type and size checks.
    pub fn image(
        &mut self,
        field: &str,
        max_kb: usize,
        type_message: &str,
        size_message: &str,
    ) -> Option<UploadedFile> {
        let file = self.form.file(field)?;
        if !file.is_image() {
            self.fail(field, type_message);
            return None;
        }
        if file.size_kb() > max_kb {
            self.fail(field, size_message);
            return None;
        }
        Some(file.clone())
    }

    /// Finish validation.
    ///
    /// # Errors
    ///
    /// Returns the collected errors when any rule failed or `build` could not
    /// assemble the value.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Validated<T> {
        self.errors.into_result(build)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_errors_keep_field_order() {
        let mut errors = ValidationErrors::new();
        errors.add("username", "The username field is required.");
        errors.add("email", "The email address is required.");
        errors.add("username", "second");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first("username"), Some("The username field is required."));
        assert_eq!(errors.get("username").len(), 2);
        assert_eq!(errors.first("password"), None);

        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(
            json,
            r#"{"username":["The username field is required.","second"],"email":["The email address is required."]}"#
        );
    }

    #[test]
    fn test_form_text_is_trimmed_and_blank_is_absent() {
        let data = form(&[("name", "  Beras  "), ("blank", "   "), ("name2", "x")]);
        assert_eq!(data.text("name"), Some("Beras"));
        assert_eq!(data.text("blank"), None);
        assert_eq!(data.old("blank"), "   ");
        assert_eq!(data.old("missing"), "");
    }

    #[test]
    fn test_form_last_value_wins_and_all_collects() {
        let data = form(&[("ids", "1"), ("ids", "2"), ("is_available", "on")]);
        assert_eq!(data.raw("ids"), Some("2"));
        assert_eq!(data.all("ids"), vec!["1", "2"]);
        assert!(data.checked("is_available"));
        assert!(!data.checked("other"));
    }

    #[test]
    fn test_rules_collect_every_failure() {
        let data = form(&[("stock", "lots"), ("name", "abcdef")]);
        let mut rules = Rules::new(&data);
        let name = rules.required("name", "required");
        rules.max_chars("name", name.as_deref(), 3, "too long");
        let stock: Option<i32> = rules.parse_required("stock", "missing", "The stock must be an integer.");
        let unit = rules.required("unit", "The unit field is required.");

        assert!(stock.is_none());
        assert!(unit.is_none());
        let errors = rules.finish(|| Some(())).unwrap_err();
        assert_eq!(errors.first("name"), Some("too long"));
        assert_eq!(errors.first("stock"), Some("The stock must be an integer."));
        assert_eq!(errors.first("unit"), Some("The unit field is required."));
    }

    #[test]
    fn test_finish_without_errors_builds_value() {
        let data = form(&[("price", "12500")]);
        let mut rules = Rules::new(&data);
        let price: Option<u32> = rules.parse_required("price", "missing", "invalid");
        assert_eq!(rules.finish(|| price).unwrap(), 12500);
    }
}
