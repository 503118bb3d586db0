//! Schema validation for untrusted request bodies.
//!
//! Every check is pure and synchronous. Fields are examined in schema order and the first
//! failure wins, so the caller always gets exactly one message. Nothing here touches the
//! network or the database.

pub mod messages;
pub mod rules;

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use rules::{check_integer, check_text, Failure, TextRule};

/// The three operation families that accept a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Login,
    Create,
    Update,
}

impl SchemaKind {
    /// Create requires a three-character first name, Update accepts two.
    fn first_name_rule(self) -> &'static TextRule {
        match self {
            SchemaKind::Update => &rules::FIRST_NAME_UPDATE,
            _ => &rules::FIRST_NAME_CREATE,
        }
    }

    fn text(self, object: &Map<String, Value>, key: &'static str, rule: &TextRule) -> Result<String, ValidationError> {
        check_text(rule, object.get(key)).map_err(|failure| ValidationError::field(self, key, failure))
    }

    fn integer(self, object: &Map<String, Value>, key: &'static str) -> Result<i64, ValidationError> {
        check_integer(object.get(key)).map_err(|failure| ValidationError::field(self, key, failure))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Offending field, if the failure is tied to one.
    pub field: Option<&'static str>,
    pub message: String,
}

impl ValidationError {
    fn field(kind: SchemaKind, key: &'static str, failure: Failure) -> Self {
        Self {
            field: Some(key),
            message: messages::render(kind, label(key), failure),
        }
    }

    fn not_an_object() -> Self {
        Self {
            field: None,
            message: "El cuerpo de la solicitud debe ser un objeto JSON".to_string(),
        }
    }
}

fn label(key: &str) -> &str {
    match key {
        "id" => "ID",
        other => other,
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// A fully validated user record, ready to be bound to a stored procedure.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedRecord {
    Login(LoginCredentials),
    User(UserRecord),
}

/// Validate a candidate against the schema for `kind`.
pub fn validate(kind: SchemaKind, candidate: &Value) -> Result<ValidatedRecord, ValidationError> {
    match kind {
        SchemaKind::Login => validate_login(candidate).map(ValidatedRecord::Login),
        SchemaKind::Create | SchemaKind::Update => validate_user(kind, candidate).map(ValidatedRecord::User),
    }
}

pub fn validate_login(candidate: &Value) -> Result<LoginCredentials, ValidationError> {
    const KNOWN: [&str; 2] = ["email", "password"];
    let kind = SchemaKind::Login;
    let object = candidate.as_object().ok_or_else(ValidationError::not_an_object)?;

    let email = kind.text(object, "email", &rules::EMAIL)?;
    let password = kind.text(object, "password", &rules::PASSWORD)?;

    if let Some(unknown) = object.keys().find(|k| !KNOWN.contains(&k.as_str())) {
        return Err(ValidationError {
            field: None,
            message: messages::render(kind, unknown, Failure::NotAllowed),
        });
    }

    Ok(LoginCredentials { email, password })
}

/// Create and Update share the field set; keys outside it are ignored.
pub fn validate_user(kind: SchemaKind, candidate: &Value) -> Result<UserRecord, ValidationError> {
    let object = candidate.as_object().ok_or_else(ValidationError::not_an_object)?;

    let id = kind.integer(object, "id")?;
    let first_name = kind.text(object, "nombre", kind.first_name_rule())?;
    let last_name = kind.text(object, "apellido", &rules::LAST_NAME)?;
    let email = kind.text(object, "email", &rules::EMAIL)?;
    let password = kind.text(object, "password", &rules::PASSWORD)?;

    Ok(UserRecord {
        id,
        first_name,
        last_name,
        email,
        password,
    })
}

/// Parse the `:id` path segment used by DELETE.
pub fn parse_path_id(raw: &str) -> Result<i64, ValidationError> {
    check_integer(Some(&Value::String(raw.to_string())))
        .map_err(|failure| ValidationError::field(SchemaKind::Update, "id", failure))
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}
