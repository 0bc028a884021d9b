//! Routes that echo their own args.

use oxide_dispatch::{Reply, RouteTable};
use serde_json::json;

use super::{display_value, escape_html, page};

pub fn register(routes: &mut RouteTable) {
    routes
        .get("/route_args/json", |ctx, route| ctx.send_json(&route.args, 200))
        .args(json!({ "arg1": true, "arg2": "123abc" }));

    routes
        .render_html("/route_args/html", |ctx, route| {
            let arg = |key: &str| escape_html(&route.arg(key).map(display_value).unwrap_or_default());
            let body = format!(
                "  <p class=\"arg1\">{}</p>\n  <p class=\"arg2\">{}</p>",
                arg("arg1"),
                arg("arg2")
            );
            ctx.write(&page(&body));
            Ok(Reply::Rendered)
        })
        .args(json!({ "arg1": true, "arg2": "123abc" }));
}
