use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::cli::config::load_session_config;

/// Thin authenticated wrapper around the HTTP API
pub struct ApiClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http,
        })
    }

    /// Client for the session saved by `siged sesion usar`
    pub fn from_session() -> anyhow::Result<Self> {
        let session = load_session_config()?;
        match (session.url, session.token) {
            (Some(url), Some(token)) => Self::new(url, token),
            _ => Err(anyhow::anyhow!(
                "No session configured; run `siged sesion usar --url <url> --token <jwt>`"
            )),
        }
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send::<()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str) -> anyhow::Result<Value> {
        self.send::<()>(Method::PATCH, path, None).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        self.send::<()>(Method::DELETE, path, None).await
    }

    /// `data` field of a success envelope
    pub async fn get_data(&self, path: &str) -> anyhow::Result<Value> {
        Ok(self.get(path).await?.get("data").cloned().unwrap_or(Value::Null))
    }

    async fn send<B: Serialize>(&self, method: Method, path: &str, body: Option<&B>) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            Ok(body)
        } else {
            Err(api_error(status, &body))
        }
    }
}

fn api_error(status: StatusCode, body: &Value) -> anyhow::Error {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"));

    match body.get("missingVariables").and_then(Value::as_array) {
        Some(missing) if !missing.is_empty() => {
            let names: Vec<&str> = missing.iter().filter_map(Value::as_str).collect();
            anyhow::anyhow!("{} ({}): missing {}", message, status.as_u16(), names.join(", "))
        }
        _ => anyhow::anyhow!("{} ({})", message, status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_text_prefers_server_message() {
        let err = api_error(StatusCode::NOT_FOUND, &json!({"message": "Nota 3 not found"}));
        assert_eq!(err.to_string(), "Nota 3 not found (404)");
    }

    #[test]
    fn error_text_lists_missing_variables() {
        let err = api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({"message": "SMTP configuration incomplete", "missingVariables": ["SMTP_HOST", "SMTP_PASS"]}),
        );
        assert!(err.to_string().ends_with("missing SMTP_HOST, SMTP_PASS"));
    }

    #[test]
    fn error_text_falls_back_to_reason() {
        let err = api_error(StatusCode::BAD_GATEWAY, &Value::Null);
        assert_eq!(err.to_string(), "Bad Gateway (502)");
    }
}
