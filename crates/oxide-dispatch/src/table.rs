//! The route table and route registration.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::context::RequestContext;
use crate::error::Result;
use crate::request::{Method, RouteMethod};
use crate::response::Reply;

/// Reserved URI of fallback routes.
pub const NOT_FOUND_URI: &str = ":404";

/// Arbitrary per-route data read by middleware and handlers.
pub type Args = Map<String, Value>;

/// A route handler.
pub type Handler = Arc<dyn Fn(&mut RequestContext, &CurrentRoute) -> Result<Reply> + Send + Sync>;

/// A single route definition.
#[derive(Clone)]
pub struct Route {
    /// Method the route answers to.
    pub method: RouteMethod,
    /// Cleaned URI pattern.
    pub uri: String,
    /// Request handler. Routes without one are never selected.
    pub handler: Option<Handler>,
    /// Whether the handler renders HTML that is sent implicitly.
    pub html: bool,
    /// Status used for the implicit HTML send.
    pub html_status: u16,
    /// Route arguments.
    pub args: Args,
}

impl Route {
    /// Creates a new route. The URI is cleaned with [`clean_pattern`].
    pub fn new(method: impl Into<RouteMethod>, uri: &str, handler: Option<Handler>) -> Self {
        Self {
            method: method.into(),
            uri: clean_pattern(uri),
            handler,
            html: false,
            html_status: 200,
            args: Args::new(),
        }
    }

    /// Sets the route arguments from a JSON object.
    ///
    /// Anything but an object is ignored.
    pub fn args(&mut self, args: Value) -> &mut Self {
        match args {
            Value::Object(map) => self.args = map,
            other => warn!(uri = %self.uri, args = %other, "route args must be a JSON object; ignoring"),
        }
        self
    }

    /// Sets the status of the implicit HTML send.
    pub fn html_status(&mut self, status: u16) -> &mut Self {
        self.html_status = status;
        self
    }

    /// Returns true if this is a fallback route.
    pub fn is_not_found(&self) -> bool {
        self.uri == NOT_FOUND_URI
    }

    /// Returns the read-only view handed to middleware and handlers.
    pub fn descriptor(&self) -> CurrentRoute {
        CurrentRoute {
            method: self.method,
            uri: self.uri.clone(),
            args: self.args.clone(),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("handler", &self.handler.is_some())
            .field("html", &self.html)
            .field("html_status", &self.html_status)
            .field("args", &self.args)
            .finish()
    }
}

/// The route a request resolved to, without its handler.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentRoute {
    /// Method the route was registered for.
    pub method: RouteMethod,
    /// URI pattern of the route, `:404` for fallbacks.
    pub uri: String,
    /// Route arguments.
    pub args: Args,
}

impl CurrentRoute {
    /// Descriptor of the built-in "not found" route.
    pub fn builtin_not_found(method: Method) -> Self {
        Self {
            method: RouteMethod::Only(method),
            uri: NOT_FOUND_URI.to_string(),
            args: Args::new(),
        }
    }

    /// Gets an argument.
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    /// Reads a boolean argument; missing or non-boolean values are false.
    pub fn flag(&self, key: &str) -> bool {
        self.args.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Strips the query string and trailing slashes from a route pattern.
///
/// The root pattern `/` is kept as is.
pub fn clean_pattern(pattern: &str) -> String {
    let path = pattern.split('?').next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Ordered list of routes registered for one dispatch cycle.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    has_custom_not_found: bool,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route. Later registrations shadow earlier ones.
    pub fn register(
        &mut self,
        method: impl Into<RouteMethod>,
        uri: &str,
        handler: Option<Handler>,
        args: Args,
    ) -> &mut Route {
        let mut route = Route::new(method, uri, handler);
        route.args = args;
        self.push(route)
    }

    /// Appends an already built route.
    pub fn push(&mut self, route: Route) -> &mut Route {
        if route.uri.starts_with(NOT_FOUND_URI) {
            self.has_custom_not_found = true;
        }
        let index = self.routes.len();
        self.routes.push(route);
        &mut self.routes[index]
    }

    /// Adds a route for any method.
    pub fn route<F>(&mut self, method: impl Into<RouteMethod>, uri: &str, handler: F) -> &mut Route
    where
        F: Fn(&mut RequestContext, &CurrentRoute) -> Result<Reply> + Send + Sync + 'static,
    {
        self.register(method, uri, Some(Arc::new(handler)), Args::new())
    }

    /// Adds a GET route.
    pub fn get<F>(&mut self, uri: &str, handler: F) -> &mut Route
    where
        F: Fn(&mut RequestContext, &CurrentRoute) -> Result<Reply> + Send + Sync + 'static,
    {
        self.route(Method::Get, uri, handler)
    }

    /// Adds a POST route.
    pub fn post<F>(&mut self, uri: &str, handler: F) -> &mut Route
    where
        F: Fn(&mut RequestContext, &CurrentRoute) -> Result<Reply> + Send + Sync + 'static,
    {
        self.route(Method::Post, uri, handler)
    }

    /// Adds a PUT route.
    pub fn put<F>(&mut self, uri: &str, handler: F) -> &mut Route
    where
        F: Fn(&mut RequestContext, &CurrentRoute) -> Result<Reply> + Send + Sync + 'static,
    {
        self.route(Method::Put, uri, handler)
    }

    /// Adds a PATCH route.
    pub fn patch<F>(&mut self, uri: &str, handler: F) -> &mut Route
    where
        F: Fn(&mut RequestContext, &CurrentRoute) -> Result<Reply> + Send + Sync + 'static,
    {
        self.route(Method::Patch, uri, handler)
    }

    /// Adds a DELETE route.
    pub fn delete<F>(&mut self, uri: &str, handler: F) -> &mut Route
    where
        F: Fn(&mut RequestContext, &CurrentRoute) -> Result<Reply> + Send + Sync + 'static,
    {
        self.route(Method::Delete, uri, handler)
    }

    /// Adds a route answering every method.
    pub fn all<F>(&mut self, uri: &str, handler: F) -> &mut Route
    where
        F: Fn(&mut RequestContext, &CurrentRoute) -> Result<Reply> + Send + Sync + 'static,
    {
        self.route(RouteMethod::All, uri, handler)
    }

    /// Adds a GET route whose rendered output is sent as HTML.
    ///
    /// The handler writes the page with [`RequestContext::write`]; once it
    /// returns, the output is sent with the route's HTML status (200 unless
    /// changed with [`Route::html_status`]) and a `text/html` content type.
    pub fn render_html<F>(&mut self, uri: &str, handler: F) -> &mut Route
    where
        F: Fn(&mut RequestContext, &CurrentRoute) -> Result<Reply> + Send + Sync + 'static,
    {
        let route = self.route(Method::Get, uri, handler);
        route.html = true;
        route
    }

    /// Adds a route without a handler. It is never selected.
    pub fn stub(&mut self, method: impl Into<RouteMethod>, uri: &str) -> &mut Route {
        self.register(method, uri, None, Args::new())
    }

    /// Returns true if a `:404` route was registered.
    pub fn has_custom_not_found(&self) -> bool {
        self.has_custom_not_found
    }

    /// Returns the routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Something that registers routes at the start of every dispatch cycle.
pub trait RouteSource: Send + Sync {
    /// Registers routes into the table.
    fn register(&self, routes: &mut RouteTable);
}

impl<F> RouteSource for F
where
    F: Fn(&mut RouteTable) + Send + Sync,
{
    fn register(&self, routes: &mut RouteTable) {
        self(routes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;
    use serde_json::json;

    fn ok(_ctx: &mut RequestContext, _route: &CurrentRoute) -> Result<Reply> {
        Ok(Response::send("ok", 200, "text/plain")?.into())
    }

    #[test]
    fn test_clean_pattern() {
        assert_eq!(clean_pattern("/users/"), "/users");
        assert_eq!(clean_pattern("/users?page=1"), "/users");
        assert_eq!(clean_pattern("/users//"), "/users");
        assert_eq!(clean_pattern("/"), "/");
        assert_eq!(clean_pattern("/?x=1"), "/");
        assert_eq!(clean_pattern(":404"), ":404");
    }

    #[test]
    fn test_registration_order() {
        let mut table = RouteTable::new();
        table.get("/a", ok);
        table.post("/b/", ok);
        table.stub(Method::Get, "/c");

        let uris: Vec<&str> = table.routes().iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, ["/a", "/b", "/c"]);
        assert!(table.routes()[2].handler.is_none());
        assert!(!table.has_custom_not_found());
    }

    #[test]
    fn test_custom_not_found_flag() {
        let mut table = RouteTable::new();
        table.all(":404", ok);
        assert!(table.has_custom_not_found());
        assert!(table.routes()[0].is_not_found());
    }

    #[test]
    fn test_render_html_and_args() {
        let mut table = RouteTable::new();
        table
            .render_html(":404", ok)
            .html_status(404)
            .args(json!({"auth": true}));

        let route = &table.routes()[0];
        assert!(route.html);
        assert_eq!(route.html_status, 404);
        assert_eq!(route.method, RouteMethod::Only(Method::Get));

        let current = route.descriptor();
        assert!(current.flag("auth"));
        assert!(!current.flag("missing"));
    }

    #[test]
    fn test_non_object_args_ignored() {
        let mut table = RouteTable::new();
        table.get("/", ok).args(json!([1, 2]));
        assert!(table.routes()[0].args.is_empty());
    }

    #[test]
    fn test_closure_route_source() {
        let source = |routes: &mut RouteTable| {
            routes.get("/x", ok);
        };
        let mut table = RouteTable::new();
        RouteSource::register(&source, &mut table);
        RouteSource::register(&source, &mut table);
        assert_eq!(table.len(), 2);
    }
}
