//! The dispatch cycle.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, debug_span, error, trace};

use crate::context::RequestContext;
use crate::error::{Fault, Result};
use crate::fault::{default_funnel, panic_message, public_message, run_funnel, FaultFunnel};
use crate::matcher::{self, Resolution};
use crate::middleware::{Middleware, MiddlewareResult};
use crate::options::Options;
use crate::request::{HostRequest, PathParams};
use crate::response::{Reply, Response};
use crate::table::{CurrentRoute, Route, RouteSource, RouteTable};

/// Stages of a dispatch cycle, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing has happened yet.
    Init,
    /// Route sources are registering routes.
    LoadRoutes,
    /// The table is being scanned.
    Match,
    /// A route fits the request.
    Matched,
    /// A `:404` route takes the request.
    FallbackCustom404,
    /// Nothing takes the request.
    FallbackBuiltin404,
    /// Query, body and files are being decoded.
    BodyParse,
    /// The route descriptor is being built.
    ExposeCurrentRoute,
    /// Middleware is running.
    RunMiddleware,
    /// The handler is running.
    RunHandler,
    /// A response was produced.
    Terminated,
}

impl Stage {
    /// Returns the stage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::LoadRoutes => "load_routes",
            Self::Match => "match",
            Self::Matched => "matched",
            Self::FallbackCustom404 => "fallback_custom_404",
            Self::FallbackBuiltin404 => "fallback_builtin_404",
            Self::BodyParse => "body_parse",
            Self::ExposeCurrentRoute => "expose_current_route",
            Self::RunMiddleware => "run_middleware",
            Self::RunHandler => "run_handler",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns host requests into responses.
///
/// Route sources are invoked once per cycle, in the sorted order of their
/// names, to build a fresh [`RouteTable`]. Nothing is shared between cycles
/// but the dispatcher's own configuration.
pub struct Dispatcher {
    options: Options,
    sources: BTreeMap<String, Box<dyn RouteSource>>,
    middleware: Vec<Arc<dyn Middleware>>,
    funnel: FaultFunnel,
}

impl Dispatcher {
    /// Creates a dispatcher with the default fault funnel.
    pub fn new(options: Options) -> Self {
        Self {
            funnel: default_funnel(&options),
            options,
            sources: BTreeMap::new(),
            middleware: Vec::new(),
        }
    }

    /// Adds a route source. A source with the same name is replaced.
    #[must_use]
    pub fn routes(mut self, name: impl Into<String>, source: impl RouteSource + 'static) -> Self {
        self.sources.insert(name.into(), Box::new(source));
        self
    }

    /// Adds middleware. Middleware runs in the order it is added.
    #[must_use]
    pub fn middleware(mut self, mw: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(mw));
        self
    }

    /// Replaces the fault funnel.
    #[must_use]
    pub fn fault_funnel(
        mut self,
        funnel: impl Fn(i32, &str) -> Response + Send + Sync + 'static,
    ) -> Self {
        self.funnel = Arc::new(funnel);
        self
    }

    /// Returns the options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Builds the route table the way each cycle does.
    pub fn load_routes(&self) -> RouteTable {
        let mut table = RouteTable::new();
        for (name, source) in &self.sources {
            let before = table.len();
            source.register(&mut table);
            trace!(source = %name, routes = table.len() - before, "loaded route source");
        }
        table
    }

    /// Runs one dispatch cycle. Always returns a response.
    pub fn dispatch(&self, mut request: HostRequest) -> Response {
        let span = debug_span!("dispatch", method = %request.method, uri = %request.request_uri);
        let _guard = span.enter();

        let stage = Cell::new(Stage::Init);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(&mut request, &stage)));
        let fault = match outcome {
            Ok(Ok(response)) => {
                stage.set(Stage::Terminated);
                debug!(status = response.status, "terminated");
                return response;
            }
            Ok(Err(fault)) => fault,
            Err(payload) => Fault::Panic(panic_message(payload.as_ref())),
        };

        error!(code = fault.code(), stage = %stage.get(), error = %fault, "dispatch fault");
        stage.set(Stage::Terminated);
        let message = public_message(&fault, self.options.debug_mode);
        run_funnel(&self.funnel, fault.code(), &message)
    }

    fn run(&self, request: &mut HostRequest, stage: &Cell<Stage>) -> Result<Response> {
        stage.set(Stage::LoadRoutes);
        let table = self.load_routes();
        let mut ctx = RequestContext::new(request, &self.options);

        stage.set(Stage::Match);
        let (route, params) = match matcher::resolve(&table, ctx.method, &ctx.uri) {
            Resolution::Matched(found) => {
                stage.set(Stage::Matched);
                (Some(found.route), found.params)
            }
            Resolution::CustomNotFound(route) => {
                stage.set(Stage::FallbackCustom404);
                (Some(route), PathParams::new())
            }
            Resolution::BuiltinNotFound => {
                stage.set(Stage::FallbackBuiltin404);
                (None, PathParams::new())
            }
        };
        debug!(stage = %stage.get(), route = route.map(|r| r.uri.as_str()), "resolved");

        if route.is_some() {
            stage.set(Stage::BodyParse);
            ctx.negotiate_body(request);
            ctx.params = params;
        }

        stage.set(Stage::ExposeCurrentRoute);
        let current = route.map_or_else(|| CurrentRoute::builtin_not_found(ctx.method), Route::descriptor);

        stage.set(Stage::RunMiddleware);
        for mw in &self.middleware {
            if let MiddlewareResult::Response(response) = mw.handle(&mut ctx, &current)? {
                debug!(status = response.status, "middleware ended the cycle");
                return Ok(ctx.apply_headers(response));
            }
        }

        stage.set(Stage::RunHandler);
        let Some((route, handler)) = route.and_then(|r| r.handler.as_ref().map(|h| (r, h))) else {
            return Ok(ctx.apply_headers(Response::not_found()));
        };

        let response = match handler(&mut ctx, &current)? {
            Reply::Sent(response) => response,
            Reply::Rendered if route.html => {
                Response::send(ctx.take_output(), route.html_status, "text/html")?
            }
            Reply::Rendered => Response::send(ctx.take_output(), 200, "text/html")?,
        };
        Ok(ctx.apply_headers(response))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("options", &self.options)
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}
