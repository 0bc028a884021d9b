//! A route that checks its bearer token itself.

use oxide_dispatch::RouteTable;

use super::VALID_TOKEN;

pub fn register(routes: &mut RouteTable) {
    routes.get("/bearer", |ctx, _| {
        ctx.parse_auth();
        let body = match ctx.token.as_deref() {
            None => "Missing valid auth token!",
            Some(VALID_TOKEN) => VALID_TOKEN,
            Some(_) => "Invalid auth token!",
        };
        ctx.text(body)
    });
}
