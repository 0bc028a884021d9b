//! Fallback routes.

use oxide_dispatch::{Reply, RouteTable};

pub fn register(routes: &mut RouteTable) {
    routes.all(":404", |ctx, _| {
        ctx.send("404 - not found (custom ALL)!", 404, "text/plain")
    });

    routes
        .render_html(":404", |ctx, _| {
            ctx.write("<p>Hello <strong>HTML 404</strong> here!</p>");
            Ok(Reply::Rendered)
        })
        .html_status(404);

    routes.post(":404", |ctx, _| {
        ctx.send("404 - not found (custom POST)!", 404, "text/plain")
    });
}
