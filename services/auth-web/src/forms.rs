//! Form payloads and registration validation

use gatehouse_auth_core::NewAccount;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

pub const CANT_BE_BLANK: &str = "Can't be blank";
pub const IS_INVALID: &str = "Is invalid";
pub const ALREADY_TAKEN: &str = "Already taken";
pub const MUST_EQUAL_PASSWORD: &str = "Must be equals password";
pub const IS_TOO_LONG: &str = "Is too long";

/// Longest display name the users table accepts
const MAX_NAME_CHARS: usize = 100;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$").expect("email pattern compiles")
});

/// `POST /sessions`
#[derive(Deserialize, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `POST /users`
#[derive(Deserialize, Default, Clone)]
pub struct RegistrationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

/// Field name to message, one message per field
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, &'static str>);

impl FormErrors {
    pub fn insert(&mut self, field: &'static str, message: &'static str) {
        self.0.insert(field, message);
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

impl RegistrationForm {
    /// Trim the identifying fields; passwords are taken verbatim
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }

    /// Rules that need no store access.
    ///
    /// Email uniqueness is checked separately by the caller.
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();

        if self.name.is_empty() {
            errors.insert("name", CANT_BE_BLANK);
        } else if self.name.chars().count() > MAX_NAME_CHARS {
            errors.insert("name", IS_TOO_LONG);
        }

        if self.email.is_empty() {
            errors.insert("email", CANT_BE_BLANK);
        } else if !EMAIL_RE.is_match(&self.email) {
            errors.insert("email", IS_INVALID);
        }

        if self.password.is_empty() {
            errors.insert("password", CANT_BE_BLANK);
        }

        if self.password_confirmation.is_empty() {
            errors.insert("password_confirmation", CANT_BE_BLANK);
        } else if self.password != self.password_confirmation {
            errors.insert("password_confirmation", MUST_EQUAL_PASSWORD);
        }

        errors
    }

    pub fn into_account(self) -> NewAccount {
        NewAccount {
            name: self.name,
            email: self.email,
            password: self.password,
        }
    }
}
