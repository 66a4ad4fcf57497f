//! Minimal HTML pages
//!
//! Every interpolated value goes through [`escape`].

use axum::http::StatusCode;
use gatehouse_types::User;
use std::fmt::Write;

use crate::forms::FormErrors;

/// Escape text for an HTML body or a double-quoted attribute
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn index(current_user: Option<&User>) -> String {
    let body = match current_user {
        Some(user) => format!(
            "<h1>Hello, {}</h1>\n<p>Signed in as {}.</p>\n<p><a href=\"/account\">Account</a> | <a href=\"/sessions/destroy\">Sign out</a></p>",
            escape(&user.name),
            escape(&user.email)
        ),
        None => "<h1>Hello, guest</h1>\n<p><a href=\"/sessions/new\">Sign in</a> | <a href=\"/users/new\">Sign up</a></p>"
            .to_string(),
    };
    layout("Home", &body)
}

pub fn account(user: &User) -> String {
    let body = format!(
        "<h1>Account</h1>\n<dl><dt>Name</dt><dd>{}</dd><dt>Email</dt><dd>{}</dd><dt>Member since</dt><dd>{}</dd></dl>\n<form method=\"post\" action=\"/sessions/destroy\"><button type=\"submit\">Sign out</button></form>",
        escape(&user.name),
        escape(&user.email),
        user.created_at.format("%Y-%m-%d")
    );
    layout("Account", &body)
}

pub fn login(error: Option<&str>, email: &str) -> String {
    let mut body = String::from("<h1>Sign in</h1>\n");
    if let Some(error) = error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape(error));
    }
    let _ = write!(
        body,
        "<form method=\"post\" action=\"/sessions\">\n\
         <label>Email <input type=\"email\" name=\"email\" value=\"{}\"></label>\n\
         <label>Password <input type=\"password\" name=\"password\"></label>\n\
         <button type=\"submit\">Sign in</button>\n\
         </form>\n<p><a href=\"/users/new\">Create an account</a></p>",
        escape(email)
    );
    layout("Sign in", &body)
}

pub fn register(name: &str, email: &str, errors: &FormErrors) -> String {
    let field_error = |field: &str| {
        errors
            .get(field)
            .map(|message| format!(" <span class=\"error\">{}</span>", escape(message)))
            .unwrap_or_default()
    };

    let body = format!(
        "<h1>Sign up</h1>\n<form method=\"post\" action=\"/users\">\n\
         <label>Name <input type=\"text\" name=\"name\" value=\"{}\"></label>{}\n\
         <label>Email <input type=\"email\" name=\"email\" value=\"{}\"></label>{}\n\
         <label>Password <input type=\"password\" name=\"password\"></label>{}\n\
         <label>Confirm password <input type=\"password\" name=\"password_confirmation\"></label>{}\n\
         <button type=\"submit\">Sign up</button>\n\
         </form>\n<p><a href=\"/sessions/new\">Already registered?</a></p>",
        escape(name),
        field_error("name"),
        escape(email),
        field_error("email"),
        field_error("password"),
        field_error("password_confirmation"),
    );
    layout("Sign up", &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/\">Home</a></p>",
        status.as_u16(),
        escape(message)
    );
    layout(status.canonical_reason().unwrap_or("Error"), &body)
}
