//! Route matching.
//!
//! The table is scanned newest to oldest, so the last registered route that
//! fits a request wins. A route fits when its method accepts the request
//! method and its pattern has as many `/`-separated segments as the request
//! URI, every segment being either equal or a `:name` parameter. Parameter
//! values are URL-decoded once.
//!
//! `:404` routes never match positionally. The first one met during the scan
//! (that has a handler) is kept as the fallback for requests nothing else
//! fits.

use std::borrow::Cow;

use crate::request::{Method, PathParams};
use crate::table::{Route, RouteTable};

/// A route that fits the request, with its captured parameters.
#[derive(Debug)]
pub struct Match<'a> {
    /// The selected route.
    pub route: &'a Route,
    /// Parameters captured from the request URI.
    pub params: PathParams,
}

/// How a request resolved against the table.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// A route fits the request.
    Matched(Match<'a>),
    /// Nothing fits; a registered `:404` route takes the request.
    CustomNotFound(&'a Route),
    /// Nothing fits and no `:404` route applies.
    BuiltinNotFound,
}

impl<'a> Resolution<'a> {
    /// Returns the selected route, if any.
    pub fn route(&self) -> Option<&'a Route> {
        match self {
            Self::Matched(m) => Some(m.route),
            Self::CustomNotFound(route) => Some(route),
            Self::BuiltinNotFound => None,
        }
    }
}

/// Finds the route a request selects, or `None` if nothing fits.
pub fn find<'a>(table: &'a RouteTable, method: Method, uri: &str) -> Option<Match<'a>> {
    scan(table, method, uri).0
}

/// Resolves a request, applying the fallback policy when nothing fits.
pub fn resolve<'a>(table: &'a RouteTable, method: Method, uri: &str) -> Resolution<'a> {
    match scan(table, method, uri) {
        (Some(found), _) => Resolution::Matched(found),
        (None, Some(fallback)) => Resolution::CustomNotFound(fallback),
        (None, None) => Resolution::BuiltinNotFound,
    }
}

fn scan<'a>(
    table: &'a RouteTable,
    method: Method,
    uri: &str,
) -> (Option<Match<'a>>, Option<&'a Route>) {
    let mut fallback = None;

    for route in table.routes().iter().rev() {
        if !route.method.accepts(method) {
            continue;
        }

        if route.is_not_found() {
            if fallback.is_none() && route.handler.is_some() {
                fallback = Some(route);
            }
            continue;
        }

        if route.handler.is_none() {
            continue;
        }

        if let Some(params) = match_pattern(&route.uri, uri) {
            return (Some(Match { route, params }), fallback);
        }
    }

    (None, fallback)
}

/// Matches a cleaned route pattern against a normalized request URI.
///
/// Returns the captured parameters, or `None` if the pattern does not fit.
pub fn match_pattern(pattern: &str, uri: &str) -> Option<PathParams> {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let uri_segments: Vec<&str> = uri.split('/').collect();

    if pattern_segments.len() != uri_segments.len() {
        return None;
    }

    let mut params = PathParams::new();
    for (expected, actual) in pattern_segments.iter().zip(&uri_segments) {
        if expected == actual {
            continue;
        }
        let name = expected.strip_prefix(':')?;
        params.insert(name, decode_segment(actual));
    }

    Some(params)
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .unwrap_or(Cow::Borrowed(segment))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::error::Result;
    use crate::request::RouteMethod;
    use crate::response::{Reply, Response};
    use crate::table::CurrentRoute;

    fn handler(
        body: &'static str,
    ) -> impl Fn(&mut RequestContext, &CurrentRoute) -> Result<Reply> + Send + Sync + 'static {
        move |_ctx: &mut RequestContext, _route: &CurrentRoute| {
            Ok(Response::send(body, 200, "text/plain")?.into())
        }
    }

    fn body_of(route: &Route) -> String {
        route.args["name"].as_str().unwrap().to_string()
    }

    fn named(table: &mut RouteTable, method: impl Into<RouteMethod>, uri: &str, name: &str) {
        table
            .route(method, uri, handler("x"))
            .args(serde_json::json!({ "name": name }));
    }

    #[test]
    fn test_literal_and_param_segments() {
        let params = match_pattern("/a/:x/b", "/a/123/b").unwrap();
        assert_eq!(params.get("x"), Some("123"));
        assert!(match_pattern("/a/:x/b", "/a/b").is_none());
        assert!(match_pattern("/a/:x/b", "/a/123/c").is_none());
        assert!(match_pattern("/users", "/users").unwrap().is_empty());
    }

    #[test]
    fn test_root_pattern() {
        assert!(match_pattern("/", "/").is_some());
        assert!(match_pattern("/", "/a").is_none());
    }

    #[test]
    fn test_param_decoded_once() {
        let params = match_pattern("/files/:name", "/files/a%2Fb").unwrap();
        assert_eq!(params.get("name"), Some("a/b"));

        let params = match_pattern("/files/:name", "/files/a%252Fb").unwrap();
        assert_eq!(params.get("name"), Some("a%2Fb"));

        let params = match_pattern("/files/:name", "/files/a+b").unwrap();
        assert_eq!(params.get("name"), Some("a+b"));
    }

    #[test]
    fn test_param_matching_its_own_name() {
        // A request segment equal to the pattern segment is not captured.
        let params = match_pattern("/a/:x", "/a/:x").unwrap();
        assert!(params.get("x").is_none());
    }

    #[test]
    fn test_last_registered_wins() {
        let mut table = RouteTable::new();
        named(&mut table, Method::Get, "/users/:id", "first");
        named(&mut table, Method::Get, "/users/:uid", "second");
        named(&mut table, Method::Get, "/posts/:id", "other");

        let found = find(&table, Method::Get, "/users/7").unwrap();
        assert_eq!(body_of(found.route), "second");
        assert_eq!(found.params.get("uid"), Some("7"));
        assert!(found.params.get("id").is_none());
    }

    #[test]
    fn test_rejected_candidate_captures_discarded() {
        let mut table = RouteTable::new();
        named(&mut table, Method::Get, "/a/:x", "wanted");
        named(&mut table, Method::Get, "/:y/nope", "rejected");

        let found = find(&table, Method::Get, "/a/1").unwrap();
        assert_eq!(body_of(found.route), "wanted");
        assert_eq!(found.params.len(), 1);
        assert_eq!(found.params.get("x"), Some("1"));
    }

    #[test]
    fn test_stub_routes_skipped() {
        let mut table = RouteTable::new();
        named(&mut table, Method::Get, "/a", "real");
        table.stub(Method::Get, "/a");

        let found = find(&table, Method::Get, "/a").unwrap();
        assert_eq!(body_of(found.route), "real");
    }

    #[test]
    fn test_all_method_routes() {
        let mut table = RouteTable::new();
        named(&mut table, RouteMethod::All, "/any", "all");

        assert!(find(&table, Method::Delete, "/any").is_some());
        assert!(find(&table, Method::Head, "/any").is_some());
    }

    #[test]
    fn test_method_mismatch() {
        let mut table = RouteTable::new();
        named(&mut table, Method::Get, "/a", "get");
        assert!(find(&table, Method::Post, "/a").is_none());
    }

    #[test]
    fn test_not_found_never_positional() {
        let mut table = RouteTable::new();
        named(&mut table, Method::Get, ":404", "fallback");

        assert!(find(&table, Method::Get, ":404").is_none());
        assert!(matches!(
            resolve(&table, Method::Get, ":404"),
            Resolution::CustomNotFound(_)
        ));
    }

    #[test]
    fn test_fallback_buckets() {
        let mut table = RouteTable::new();
        named(&mut table, Method::Get, ":404", "get");

        match resolve(&table, Method::Get, "/missing") {
            Resolution::CustomNotFound(route) => assert_eq!(body_of(route), "get"),
            other => panic!("expected custom 404, got {other:?}"),
        }
        assert!(matches!(
            resolve(&table, Method::Delete, "/missing"),
            Resolution::BuiltinNotFound
        ));

        named(&mut table, RouteMethod::All, ":404", "all");
        match resolve(&table, Method::Delete, "/missing") {
            Resolution::CustomNotFound(route) => assert_eq!(body_of(route), "all"),
            other => panic!("expected custom 404, got {other:?}"),
        }
    }

    #[test]
    fn test_fallback_first_found_in_reverse_order() {
        let mut table = RouteTable::new();
        named(&mut table, RouteMethod::All, ":404", "all");
        named(&mut table, Method::Get, ":404", "get");
        named(&mut table, Method::Post, ":404", "post");

        let route = resolve(&table, Method::Get, "/x").route().unwrap();
        assert_eq!(body_of(route), "get");
        let route = resolve(&table, Method::Post, "/x").route().unwrap();
        assert_eq!(body_of(route), "post");
        let route = resolve(&table, Method::Put, "/x").route().unwrap();
        assert_eq!(body_of(route), "all");
    }

    #[test]
    fn test_fallback_without_handler_ignored() {
        let mut table = RouteTable::new();
        named(&mut table, Method::Get, ":404", "real");
        table.stub(Method::Get, ":404");

        let route = resolve(&table, Method::Get, "/x").route().unwrap();
        assert_eq!(body_of(route), "real");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut table = RouteTable::new();
        named(&mut table, Method::Get, "/users/:id", "user");

        let first = find(&table, Method::Get, "/users/9").unwrap();
        let second = find(&table, Method::Get, "/users/9").unwrap();
        assert!(std::ptr::eq(first.route, second.route));
        assert_eq!(first.params, second.params);
    }
}
