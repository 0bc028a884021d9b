//! The demo application.
//!
//! Each submodule is one route source, registered under the name of the
//! route file it stands for. Auth is enforced by [`AuthMiddleware`] for the
//! routes whose args ask for it.

mod auth;
mod bearer;
mod file_handling;
mod json_send;
mod not_found;
mod route_args;
mod uri_params;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use oxide_dispatch::{
    AuthMiddleware, Credentials, Dispatcher, LoggingMiddleware, Options, SecurityHeadersMiddleware,
};
use serde_json::Value;

pub use file_handling::{FileHandling, DOWNLOAD_FILE};

/// The only bearer token the demo accepts.
pub const VALID_TOKEN: &str = "my_valid_secret_token";

/// Users accepted by Basic auth.
pub const USERS: &[(&str, &str)] = &[("john.doe", "password"), ("john", "doe:pass:word")];

/// Builds the demo dispatcher. Files are downloaded from and uploaded to
/// `files_dir`.
pub fn demo_dispatcher(options: Options, files_dir: impl Into<PathBuf>) -> Dispatcher {
    Dispatcher::new(options)
        .routes("404s", not_found::register)
        .routes("auth", auth::register)
        .routes("bearer", bearer::register)
        .routes("file_handling", FileHandling::new(files_dir))
        .routes("json_send", json_send::register)
        .routes("route_args", route_args::register)
        .routes("uri_params", uri_params::register)
        .middleware(LoggingMiddleware)
        .middleware(
            AuthMiddleware::new()
                .bearer(|token| token == VALID_TOKEN)
                .basic(known_user),
        )
        .middleware(SecurityHeadersMiddleware::new())
}

fn known_user(credentials: &Credentials) -> bool {
    USERS
        .iter()
        .any(|(user, pass)| *user == credentials.username && *pass == credentials.password)
}

/// Wraps a body in the demo's HTML page.
fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\">\n  \
         <title>Hello world!</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Query parameters in a stable order.
fn sorted_query(query: &HashMap<String, String>) -> BTreeMap<&str, &str> {
    query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

/// Renders an argument the way a template prints it.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        other => other.to_string(),
    }
}
