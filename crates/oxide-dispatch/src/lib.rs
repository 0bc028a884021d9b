//! # oxide-dispatch
//!
//! Route resolution and request dispatch for script-style hosts.
//!
//! This crate provides:
//! - An ordered route table where the last matching registration wins
//! - Positional `:name` path parameters and `:404` fallback routes
//! - Body negotiation for form, multipart and JSON requests
//! - Synchronous middleware run before every handler
//! - A fault funnel that turns every error and panic into a response
//!
//! ## Quick Start
//!
//! ```
//! use oxide_dispatch::{CurrentRoute, Dispatcher, HostRequest, Options, RequestContext, RouteTable};
//!
//! let dispatcher = Dispatcher::new(Options::default()).routes("users", |routes: &mut RouteTable| {
//!     routes.get("/users/:id", |ctx: &mut RequestContext, _route: &CurrentRoute| {
//!         let body = format!("id={}", ctx.param("id"));
//!         ctx.text(body)
//!     });
//! });
//!
//! let response = dispatcher.dispatch(HostRequest::get("/users/42/"));
//! assert_eq!(response.status, 200);
//! assert_eq!(response.body_string().as_deref(), Some("id=42"));
//!
//! let response = dispatcher.dispatch(HostRequest::get("/users"));
//! assert_eq!(response.status, 404);
//! ```
//!
//! ## Route Sources
//!
//! Routes are registered by [`RouteSource`]s, invoked once per dispatch in
//! the sorted order of their names. Every cycle works on a fresh table.
//!
//! ```
//! use oxide_dispatch::{CurrentRoute, Dispatcher, HostRequest, Options, RequestContext, RouteTable};
//! use serde_json::json;
//!
//! fn fallbacks(routes: &mut RouteTable) {
//!     routes.all(":404", |ctx: &mut RequestContext, _: &CurrentRoute| {
//!         ctx.send("missing", 404, "text/plain")
//!     });
//! }
//!
//! fn api(routes: &mut RouteTable) {
//!     routes.get("/status", |ctx: &mut RequestContext, _: &CurrentRoute| {
//!         ctx.send_json(&json!({"ok": true}), 200)
//!     });
//! }
//!
//! let dispatcher = Dispatcher::new(Options::default())
//!     .routes("404s", fallbacks)
//!     .routes("api", api);
//!
//! let response = dispatcher.dispatch(HostRequest::delete("/nope"));
//! assert_eq!(response.status, 404);
//! assert_eq!(response.body_string().as_deref(), Some("missing"));
//! ```
//!
//! ## HTML Routes
//!
//! Handlers of [`RouteTable::render_html`] routes write their page and return
//! [`Reply::Rendered`]; the output is sent as `text/html` once they return.
//!
//! ```
//! use oxide_dispatch::{CurrentRoute, Dispatcher, HostRequest, Options, Reply, RequestContext, RouteTable};
//!
//! let dispatcher = Dispatcher::new(Options::default()).routes("pages", |routes: &mut RouteTable| {
//!     routes
//!         .render_html(":404", |ctx: &mut RequestContext, _: &CurrentRoute| {
//!             ctx.write("<h1>Page not found</h1>");
//!             Ok(Reply::Rendered)
//!         })
//!         .html_status(404);
//! });
//!
//! let response = dispatcher.dispatch(HostRequest::get("/anything"));
//! assert_eq!(response.status, 404);
//! assert_eq!(response.content_type(), Some("text/html"));
//! ```
//!
//! ## Middleware
//!
//! ```
//! use oxide_dispatch::{AuthMiddleware, Dispatcher, LoggingMiddleware, Options};
//!
//! let dispatcher = Dispatcher::new(Options::default())
//!     .middleware(LoggingMiddleware)
//!     .middleware(AuthMiddleware::new().bearer(|token| token == "secret"));
//! # let _ = dispatcher;
//! ```
//!
//! ## Faults
//!
//! Errors returned by middleware or handlers, and panics, end in the
//! [`FaultFunnel`]. The default funnel answers 500 with the error code;
//! details are only shown when [`Options::debug_mode`] is set.

mod context;
mod dispatcher;
mod error;
mod fault;
mod files;
mod matcher;
mod middleware;
mod multipart;
mod options;
mod request;
mod response;
mod table;
mod upload;

pub use context::{mime_essence, normalize_uri, Credentials, RequestContext};
pub use dispatcher::{Dispatcher, Stage};
pub use error::{
    ConfigError, Fault, FileError, MultipartError, Result, UploadError, GENERIC_FAULT_MESSAGE,
};
pub use fault::{default_funnel, public_message, FaultFunnel};
pub use files::{mime_type_for_extension, send_file, SendFile};
pub use matcher::{find, match_pattern, resolve, Match, Resolution};
pub use middleware::{
    AuthMiddleware, FrameOptions, LoggingMiddleware, Middleware, MiddlewareResult,
    SecurityHeadersMiddleware,
};
pub use multipart::{parse as parse_multipart, FormData};
pub use options::Options;
pub use request::{parse_urlencoded, HostRequest, Method, PathParams, RawBody, RouteMethod};
pub use response::{Body, Reply, Response, CONTENT_TYPE};
pub use table::{
    clean_pattern, Args, CurrentRoute, Handler, Route, RouteSource, RouteTable, NOT_FOUND_URI,
};
pub use upload::{sanitize_filename, UploadPolicy, UploadedFile, DEFAULT_MAX_UPLOAD_SIZE};
