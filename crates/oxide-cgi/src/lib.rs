//! # oxide-cgi
//!
//! Runs an [`oxide_dispatch::Dispatcher`] as a CGI program: the request is
//! read from the environment and stdin, the response written to stdout.
//!
//! The [`routes`] module holds the demo application the binary serves.

mod cgi;
pub mod routes;

pub use cgi::{write_response, CgiError, CgiRequest};
