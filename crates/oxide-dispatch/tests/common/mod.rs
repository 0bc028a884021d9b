#![allow(dead_code)]

use oxide_dispatch::{
    CurrentRoute, Dispatcher, HostRequest, Options, Reply, RequestContext, Response, Result,
    RouteTable,
};

pub fn text(
    body: &'static str,
) -> impl Fn(&mut RequestContext, &CurrentRoute) -> Result<Reply> + Send + Sync + 'static {
    move |ctx: &mut RequestContext, _: &CurrentRoute| ctx.text(body)
}

pub fn dispatcher(source: impl Fn(&mut RouteTable) + Send + Sync + 'static) -> Dispatcher {
    Dispatcher::new(Options::default()).routes("routes", source)
}

pub fn body(response: &Response) -> String {
    response
        .body_string()
        .unwrap_or_else(|| panic!("Expected a buffered UTF-8 body, got {:?}", response.body))
}

pub fn get(dispatcher: &Dispatcher, uri: &str) -> Response {
    dispatcher.dispatch(HostRequest::get(uri))
}

pub fn post_json(dispatcher: &Dispatcher, uri: &str, json: &str) -> Response {
    dispatcher.dispatch(
        HostRequest::post(uri)
            .header("Content-Type", "application/json")
            .body(json.to_string()),
    )
}
