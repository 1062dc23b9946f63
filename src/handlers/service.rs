// handlers/service.rs - Service endpoints mounted outside the gates

use axum::response::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "TaskDesk Gate",
            "version": version,
            "description": "Edge and component authorization gate for TaskDesk",
            "endpoints": {
                "auth": "/login, /register, /forgot-password, /reset-password, /verify-otp (anonymous only)",
                "pages": "/dashboard, /users, /project-listing, /tasks, ... (session + permissions)",
                "session": "/api/session, /logout (session)",
                "health": "/health (public)"
            }
        }
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now()
        }
    }))
}
