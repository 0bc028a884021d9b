//! Routes that echo the request body as JSON.

use oxide_dispatch::{Reply, RequestContext, Response, Result, RouteTable};
use serde_json::{json, Value};

pub fn register(routes: &mut RouteTable) {
    routes.post("/post_data", |ctx, _| ctx.send_json(&ctx.body, 200));
    routes.post("/send_json", |ctx, _| send_json(ctx));
}

/// Echoes the body, with the status and status placement taken from the
/// `status_code`, `include_status_code` and `run_body_version` query
/// parameters.
fn send_json(ctx: &RequestContext) -> Result<Reply> {
    let Some(run_body_version) = query_flag(ctx, "run_body_version", false) else {
        return reject(ctx, "Invalid run_body_version query!");
    };
    let Some(include_status) = query_flag(ctx, "include_status_code", true) else {
        return reject(ctx, "Invalid include_status_code query!");
    };
    let status = match ctx.get_query("status_code").map(|v| v.trim().parse::<u16>()) {
        None => 200,
        Some(Ok(code)) if (100..=599).contains(&code) => code,
        Some(_) => return reject(ctx, "Invalid status_code query (must be 100-599)!"),
    };

    let response = if run_body_version {
        let mut data = serde_json::Map::new();
        data.insert("status".to_string(), json!(status));
        data.extend(ctx.body.clone());
        Response::send_json_body(&Value::Object(data), include_status)?
    } else {
        Response::send_json(&ctx.body, status, include_status)?
    };
    Ok(response.into())
}

fn query_flag(ctx: &RequestContext, key: &str, default: bool) -> Option<bool> {
    let Some(value) = ctx.get_query(key) else {
        return Some(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "0" | "false" => Some(false),
        "1" | "true" => Some(true),
        _ => None,
    }
}

fn reject(ctx: &RequestContext, message: &str) -> Result<Reply> {
    ctx.send_json(&json!({ "error": message }), 400)
}
