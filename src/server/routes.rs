use crate::server::api::{self, ApiError};
use crate::server::AppState;

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }

    fn ok_json(body: String) -> Self {
        Self {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body,
        }
    }
}

pub fn route_request(state: &AppState, method: &str, path: &str, body: &str) -> HttpResponse {
    let path = path.split('?').next().unwrap_or(path);
    let result = match (method, path) {
        ("GET", "/api/health") => api::health_payload(state),
        ("GET", "/api/operators") => api::operators_payload(state),
        ("POST", "/api/attributes") => api::attributes_payload(state, body),
        ("POST", "/api/dps/curve") => api::curve_payload(state, body),
        ("POST", "/api/static") => api::static_payload(state, body),
        _ => Err(ApiError::NotFound("Route not found".to_string())),
    };

    match result {
        Ok(payload) => HttpResponse::ok_json(payload),
        Err(err) => {
            let (status_code, status_text) = err.status();
            if status_code >= 500 {
                tracing::warn!("{method} {path} failed: {err}");
            } else {
                tracing::debug!("{method} {path} rejected: {err}");
            }
            error_response(status_code, status_text, &err.public_message(state.environment))
        }
    }
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"error\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}
