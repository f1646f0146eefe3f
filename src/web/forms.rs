//! HTML form payloads and their field validation
//!
//! Field-level problems are collected into [`FormErrors`] so the form can be
//! shown again with the submitted values and a message next to each field.

use axum::extract::{Form, FromRequest, Multipart, Request};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::WebError;
use crate::models::{
    CategoryInput, LocationInput, CATEGORY_TITLE_MAX_LEN, LOCATION_NAME_MAX_LEN, POST_TITLE_MAX_LEN,
};
use crate::services::category::validate_slug;

/// Key for messages not tied to one field
pub const NON_FIELD: &str = "__all__";

const REQUIRED: &str = "This field is required.";

/// Accepted `pub_date` layouts, all read as UTC
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Error messages keyed by field name
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// A single non-field message
    pub fn general(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(NON_FIELD, message);
        errors
    }
}

/// Decode an urlencoded body once the handler has decided to read it
pub async fn read_form<T, S>(request: Request, state: &S) -> Result<T, WebError>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    Form::<T>::from_request(request, state)
        .await
        .map(|Form(value)| value)
        .map_err(|e| WebError::BadRequest(e.body_text()))
}

/// Checkbox values arrive only when ticked
pub fn checkbox(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty() && v != "false" && v != "off")
}

/// Parse a `datetime-local` style value as UTC
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Render a moment the way `datetime-local` inputs expect it
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M").to_string()
}

fn parse_choice(raw: &str, field: &str, errors: &mut FormErrors) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(
                field,
                "Select a valid choice. That choice is not one of the available choices.",
            );
            None
        }
    }
}

/// Text fields shared by the author's post form and the staff post form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pub_date: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
}

/// Post fields after validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPostFields {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category_id: i64,
    pub location_id: i64,
}

impl PostFields {
    pub fn validate(&self) -> Result<ValidPostFields, FormErrors> {
        let mut errors = FormErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else if title.chars().count() > POST_TITLE_MAX_LEN {
            errors.add(
                "title",
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    POST_TITLE_MAX_LEN,
                    title.chars().count()
                ),
            );
        }

        if self.text.trim().is_empty() {
            errors.add("text", REQUIRED);
        }

        let pub_date = if self.pub_date.trim().is_empty() {
            errors.add("pub_date", REQUIRED);
            None
        } else {
            let parsed = parse_datetime(&self.pub_date);
            if parsed.is_none() {
                errors.add("pub_date", "Enter a valid date/time.");
            }
            parsed
        };

        let category_id = parse_choice(&self.category, "category", &mut errors);
        let location_id = parse_choice(&self.location, "location", &mut errors);

        match (pub_date, category_id, location_id) {
            (Some(pub_date), Some(category_id), Some(location_id)) if errors.is_empty() => {
                Ok(ValidPostFields {
                    title: title.to_string(),
                    text: self.text.clone(),
                    pub_date,
                    category_id,
                    location_id,
                })
            }
            _ => Err(errors),
        }
    }
}

/// An uploaded file held in memory
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// The author's post form, submitted as multipart
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub fields: PostFields,
    pub image: Option<UploadedFile>,
    /// "Clear" checkbox next to an existing image
    pub clear_image: bool,
}

impl PostForm {
    /// Read every part of a multipart post form
    pub async fn read(mut multipart: Multipart) -> Result<Self, WebError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| WebError::BadRequest(format!("Failed to read form: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "image" {
                let has_file = field.file_name().is_some_and(|n| !n.is_empty());
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| WebError::BadRequest(format!("Failed to read file: {}", e)))?;
                if has_file && !data.is_empty() {
                    form.image = Some(UploadedFile {
                        content_type,
                        data: data.to_vec(),
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| WebError::BadRequest(format!("Failed to read field: {}", e)))?;
            match name.as_str() {
                "title" => form.fields.title = value,
                "text" => form.fields.text = value,
                "pub_date" => form.fields.pub_date = value,
                "category" => form.fields.category = value,
                "location" => form.fields.location = value,
                "image-clear" => form.clear_image = checkbox(&Some(value)),
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Staff post form: the author's fields plus publication
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminPostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pub_date: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    pub is_published: Option<String>,
}

impl AdminPostForm {
    pub fn fields(&self) -> PostFields {
        PostFields {
            title: self.title.clone(),
            text: self.text.clone(),
            pub_date: self.pub_date.clone(),
            category: self.category.clone(),
            location: self.location.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, FormErrors> {
        let text = self.text.trim();
        if text.is_empty() {
            let mut errors = FormErrors::new();
            errors.add("text", REQUIRED);
            return Err(errors);
        }
        Ok(text.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if let Err(message) = crate::services::user::validate_username(self.username.trim()) {
            errors.add("username", message);
        }
        if let Err(message) = crate::services::user::validate_email(self.email.trim()) {
            errors.add("email", message);
        }
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.trim().chars().count() > 150 {
                errors.add(field, "Ensure this value has at most 150 characters.");
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Login form; the password is never echoed back
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        let username = self.username.trim();
        if let Err(message) = crate::services::user::validate_username(username) {
            errors.add("username", message);
        }
        check_new_password(
            ("password1", &self.password1),
            ("password2", &self.password2),
            username,
            &mut errors,
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChangeForm {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
}

impl PasswordChangeForm {
    pub fn validate(&self, username: &str) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.old_password.is_empty() {
            errors.add("old_password", REQUIRED);
        }
        check_new_password(
            ("new_password1", &self.new_password1),
            ("new_password2", &self.new_password2),
            username,
            &mut errors,
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_new_password(
    (first_field, first): (&str, &str),
    (second_field, second): (&str, &str),
    username: &str,
    errors: &mut FormErrors,
) {
    if first.is_empty() {
        errors.add(first_field, REQUIRED);
        return;
    }
    if second.is_empty() {
        errors.add(second_field, REQUIRED);
        return;
    }
    if first != second {
        errors.add(second_field, "The two password fields didn't match.");
        return;
    }
    for problem in crate::services::password::password_problems(first, username) {
        errors.add(second_field, problem);
    }
}

/// Staff category form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub slug: String,
    pub is_published: Option<String>,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<CategoryInput, FormErrors> {
        let mut errors = FormErrors::new();
        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else if title.chars().count() > CATEGORY_TITLE_MAX_LEN {
            errors.add(
                "title",
                format!(
                    "Ensure this value has at most {} characters.",
                    CATEGORY_TITLE_MAX_LEN
                ),
            );
        }
        if self.description.trim().is_empty() {
            errors.add("description", REQUIRED);
        }
        if let Err(message) = validate_slug(self.slug.trim()) {
            errors.add("slug", message);
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(CategoryInput {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            slug: self.slug.trim().to_string(),
            is_published: checkbox(&self.is_published),
        })
    }
}

/// Staff location form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationForm {
    #[serde(default)]
    pub name: String,
    pub is_published: Option<String>,
}

impl LocationForm {
    pub fn validate(&self) -> Result<LocationInput, FormErrors> {
        let name = self.name.trim();
        let mut errors = FormErrors::new();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        } else if name.chars().count() > LOCATION_NAME_MAX_LEN {
            errors.add(
                "name",
                format!(
                    "Ensure this value has at most {} characters.",
                    LOCATION_NAME_MAX_LEN
                ),
            );
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(LocationInput {
            name: name.to_string(),
            is_published: checkbox(&self.is_published),
        })
    }
}
