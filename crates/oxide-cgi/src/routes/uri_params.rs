//! Routes with positional URI parameters.

use oxide_dispatch::{Reply, RequestContext, Result, RouteTable};
use serde_json::{json, Map, Value};

use super::{escape_html, page, sorted_query};

pub fn register(routes: &mut RouteTable) {
    routes.get("/uri_params/json/:param1", |ctx, _| json_echo(ctx, &["param1"]));
    routes.get("/uri_params/json/:param1/:param2", |ctx, _| {
        json_echo(ctx, &["param1", "param2"])
    });
    routes.render_html("/uri_params/html/:param1", |ctx, _| html_echo(ctx, &["param1"]));
    routes.render_html("/uri_params/html/:param1/:param2", |ctx, _| {
        html_echo(ctx, &["param1", "param2"])
    });
}

fn json_echo(ctx: &RequestContext, names: &[&str]) -> Result<Reply> {
    let mut data = Map::new();
    data.insert("status".to_string(), json!(200));
    for name in names {
        data.insert((*name).to_string(), json!(ctx.param(name)));
    }
    data.insert("query".to_string(), json!(sorted_query(&ctx.query)));
    ctx.send_json_body(&Value::Object(data))
}

fn html_echo(ctx: &mut RequestContext, names: &[&str]) -> Result<Reply> {
    let mut body = String::new();
    for name in names {
        body.push_str(&format!(
            "  <p class=\"{name}\">{}</p>\n",
            escape_html(ctx.param(name))
        ));
    }
    let query = serde_json::to_string(&sorted_query(&ctx.query))?;
    body.push_str(&format!("  <pre class=\"query\">{}</pre>", escape_html(&query)));

    ctx.write(&page(&body));
    Ok(Reply::Rendered)
}
