//! The fault funnel: where uncaught faults become responses.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::json;
use tracing::error;

use crate::error::{Fault, GENERIC_FAULT_MESSAGE};
use crate::options::Options;
use crate::response::{Response, CONTENT_TYPE};

/// Turns an error code and message into the response that ends the cycle.
pub type FaultFunnel = Arc<dyn Fn(i32, &str) -> Response + Send + Sync>;

/// The default funnel: status 500, message suffixed with the code.
///
/// Plain text unless `options.json_errors` is set.
pub fn default_funnel(options: &Options) -> FaultFunnel {
    let json_errors = options.json_errors;
    Arc::new(move |code: i32, message: &str| {
        if json_errors {
            let body = json!({ "status": 500, "error": message, "code": code });
            Response::new(500)
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string())
        } else {
            Response::internal_server_error(&format!("{message} (error code: {code})"))
        }
    })
}

/// Runs a funnel, falling back to a bare 500 if it panics.
pub fn run_funnel(funnel: &FaultFunnel, code: i32, message: &str) -> Response {
    panic::catch_unwind(AssertUnwindSafe(|| funnel(code, message))).unwrap_or_else(|payload| {
        error!(code, panic = %panic_message(payload.as_ref()), "fault funnel panicked");
        Response::internal_server_error(GENERIC_FAULT_MESSAGE)
    })
}

/// Returns the message the caller sees for a fault.
pub fn public_message(fault: &Fault, debug_mode: bool) -> String {
    if debug_mode || fault.is_public() {
        fault.to_string()
    } else {
        GENERIC_FAULT_MESSAGE.to_string()
    }
}

/// Extracts the message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_funnel_plain() {
        let funnel = default_funnel(&Options::default());
        let res = funnel(1, "invalid status code");
        assert_eq!(res.status, 500);
        assert_eq!(res.content_type(), Some("text/plain"));
        assert_eq!(
            res.body_string(),
            Some("invalid status code (error code: 1)".to_string())
        );
    }

    #[test]
    fn test_default_funnel_json() {
        let options = Options {
            json_errors: true,
            ..Options::default()
        };
        let res = default_funnel(&options)(5, "boom");
        assert_eq!(res.status, 500);
        assert_eq!(
            res.body_json(),
            Some(json!({"status": 500, "error": "boom", "code": 5}))
        );
    }

    #[test]
    fn test_panicking_funnel_falls_back() {
        let funnel: FaultFunnel =
            Arc::new(|_code: i32, _message: &str| -> Response { panic!("funnel broke") });
        let res = run_funnel(&funnel, 3, "x");
        assert_eq!(res.status, 500);
        assert_eq!(res.body_string(), Some(GENERIC_FAULT_MESSAGE.to_string()));
    }

    #[test]
    fn test_public_message() {
        let hidden = Fault::msg("db password wrong");
        assert_eq!(public_message(&hidden, false), GENERIC_FAULT_MESSAGE);
        assert_eq!(public_message(&hidden, true), "db password wrong");
        assert_eq!(
            public_message(&Fault::InvalidStatusCode(7), false),
            "invalid status code: 7 (must be 100-599)"
        );
    }

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload = panic::catch_unwind(|| panic!("{}", String::from("owned"))).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }
}
