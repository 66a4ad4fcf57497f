//! Cookie transport types
//!
//! Requests carry a [`CookieJar`] parsed from the `Cookie` header; responses
//! collect [`SetCookie`] directives in [`ResponseCookies`]. Neither type knows
//! about HTTP frameworks, so every operation in this crate can be exercised
//! without a network stack.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// `SameSite` cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lax => write!(f, "Lax"),
            Self::None => write!(f, "None"),
        }
    }
}

impl std::str::FromStr for SameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            other => Err(format!("unknown SameSite policy: {other}")),
        }
    }
}

/// Attributes shared by every cookie one component writes.
///
/// Setting and clearing a cookie must use the same path and domain, otherwise
/// the clear silently targets a different cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            secure: false,
            http_only: true,
            same_site: Some(SameSite::Lax),
        }
    }
}

/// A single `Set-Cookie` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub expires: DateTime<Utc>,
    pub max_age: Option<i64>,
    pub options: CookieOptions,
}

impl SetCookie {
    /// Cookie that lives until `expires`
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        expires: DateTime<Utc>,
        options: CookieOptions,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires,
            max_age: None,
            options,
        }
    }

    /// Directive telling the client to delete `name` right away
    pub fn expired(name: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            expires: DateTime::UNIX_EPOCH,
            max_age: Some(-1),
            options,
        }
    }

    /// Whether a client at `now` would drop this cookie instead of storing it
    pub fn is_removal(&self, now: DateTime<Utc>) -> bool {
        self.max_age.is_some_and(|age| age <= 0) || self.expires <= now
    }

    /// Render as a `Set-Cookie` header value
    pub fn to_header_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; Path={}", self.name, self.value, self.options.path)?;
        if let Some(domain) = &self.options.domain {
            write!(f, "; Domain={domain}")?;
        }
        write!(
            f,
            "; Expires={}",
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT")
        )?;
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={max_age}")?;
        }
        if self.options.http_only {
            write!(f, "; HttpOnly")?;
        }
        if self.options.secure {
            write!(f, "; Secure")?;
        }
        if let Some(same_site) = self.options.same_site {
            write!(f, "; SameSite={same_site}")?;
        }
        Ok(())
    }
}

/// Cookie directives accumulated while handling one request.
///
/// Setting a cookie whose name is already present replaces the earlier
/// directive, so each name yields at most one `Set-Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseCookies {
    cookies: Vec<SetCookie>,
}

impl ResponseCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, cookie: SetCookie) {
        match self.cookies.iter_mut().find(|c| c.name == cookie.name) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SetCookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SetCookie> {
        self.cookies.iter()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Rendered `Set-Cookie` header values, in insertion order
    pub fn header_values(&self) -> Vec<String> {
        self.cookies.iter().map(SetCookie::to_header_value).collect()
    }
}

/// Cookies sent by the client on a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` request header (`a=1; b=2`).
    ///
    /// Pairs without `=` are skipped. When a name repeats, the first value wins,
    /// matching how clients order more specific cookies first.
    pub fn parse(header: &str) -> Self {
        let mut jar = Self::new();
        jar.extend_from_header(header);
        jar
    }

    /// Merge another `Cookie` header into this jar
    pub fn extend_from_header(&mut self, header: &str) {
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            self.cookies
                .entry(name.to_string())
                .or_insert_with(|| value.trim().to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.cookies.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Apply a response's directives the way a client would: expired
    /// directives delete, everything else stores.
    pub fn apply(&mut self, response: &ResponseCookies, now: DateTime<Utc>) {
        for cookie in response.iter() {
            if cookie.is_removal(now) {
                self.cookies.remove(&cookie.name);
            } else {
                self.cookies.insert(cookie.name.clone(), cookie.value.clone());
            }
        }
    }

    /// Render as a `Cookie` request header, or `None` when empty
    pub fn to_header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
