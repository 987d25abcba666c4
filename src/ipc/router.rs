use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;
use tracing::debug;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    debug!(id = %req.id, method = %req.method, "dispatch");
    let families: [fn(&mut AppState, &Request) -> Option<serde_json::Value>; 11] = [
        handlers::core::try_handle,
        handlers::settings::try_handle,
        handlers::students::try_handle,
        handlers::teachers::try_handle,
        handlers::classes::try_handle,
        handlers::reassign::try_handle,
        handlers::courses::try_handle,
        handlers::assessments::try_handle,
        handlers::events::try_handle,
        handlers::attendance::try_handle,
        handlers::backup::try_handle,
    ];
    for try_handle in families {
        if let Some(resp) = try_handle(state, &req) {
            return resp;
        }
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
