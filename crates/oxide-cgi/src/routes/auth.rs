//! Routes guarded by the auth middleware.

use oxide_dispatch::RouteTable;
use serde_json::json;

pub fn register(routes: &mut RouteTable) {
    routes
        .get("/auth/bearer", |ctx, _| {
            let token = ctx.token.clone().unwrap_or_default();
            ctx.text(token)
        })
        .args(json!({ "auth": true }));

    routes
        .get("/auth/basic", |ctx, _| {
            let Some(credentials) = &ctx.credentials else {
                return ctx.text("Missing valid auth credentials!");
            };
            let body = format!(
                "username: \"{}\", password: \"{}\"",
                credentials.username, credentials.password
            );
            ctx.text(body)
        })
        .args(json!({ "auth": true, "use_basic_auth": true }));
}
