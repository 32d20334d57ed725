use super::platform::{
    CreatedItem, FeedItem, Platform, PlatformFuture, PostDraft, VerificationChallenge,
};
use crate::config::PlatformConfig;
use crate::error::PlatformError;
use crate::llm::scrub::sanitize_api_error;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Value, json};

/// JSON-over-HTTP platform client.
///
/// Endpoints, relative to the configured base URL:
/// `POST /posts`, `POST /posts/{id}/comments`, `GET /posts`, `POST /verify`.
pub struct HttpPlatform {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpPlatform {
    pub fn new(config: &PlatformConfig, client: Client) -> Self {
        Self {
            name: config.name.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, PlatformError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|error| PlatformError::Request {
                platform: self.name.clone(),
                message: error.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }

        let body = response.text().await.map_err(|error| PlatformError::Decode {
            platform: self.name.clone(),
            message: error.to_string(),
        })?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|error| PlatformError::Decode {
            platform: self.name.clone(),
            message: error.to_string(),
        })
    }

    async fn status_error(&self, response: Response) -> PlatformError {
        let status = response.status().as_u16();
        let header_retry = parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        let parsed: Option<Value> = serde_json::from_str(&body).ok();

        let retry_after_secs = header_retry.or_else(|| parsed.as_ref().and_then(body_retry_after));
        let message = parsed
            .as_ref()
            .and_then(error_message)
            .map_or_else(|| sanitize_api_error(&body), sanitize_api_error);

        PlatformError::Status {
            platform: self.name.clone(),
            status,
            message,
            retry_after_secs,
        }
    }

    /// A 2xx carrying `"success": false` is still a failure.
    fn check_success(&self, body: &Value) -> Result<(), PlatformError> {
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(PlatformError::Rejected {
                platform: self.name.clone(),
                message: error_message(body).unwrap_or("success: false").to_string(),
            });
        }
        Ok(())
    }

    fn created_item(&self, body: &Value, nested_key: &str) -> Result<CreatedItem, PlatformError> {
        self.check_success(body)?;
        let item = body
            .get(nested_key)
            .or_else(|| body.get("data"))
            .unwrap_or(body);

        let id = item
            .get("id")
            .and_then(id_string)
            .ok_or_else(|| PlatformError::Decode {
                platform: self.name.clone(),
                message: format!("response has no {nested_key} id"),
            })?;
        let url = item
            .get("url")
            .or_else(|| body.get("url"))
            .and_then(Value::as_str)
            .map(String::from);

        Ok(CreatedItem {
            id,
            url,
            verification: parse_verification(body).or_else(|| parse_verification(item)),
        })
    }
}

fn error_message(body: &Value) -> Option<&str> {
    body.get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("Retry-After")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| secs.ceil() as u64)
}

fn body_retry_after(body: &Value) -> Option<u64> {
    if let Some(secs) = body.get("retry_after_seconds").and_then(Value::as_u64) {
        return Some(secs);
    }
    body.get("retry_after_minutes")
        .and_then(Value::as_u64)
        .map(|minutes| minutes.saturating_mul(60))
}

fn parse_verification(value: &Value) -> Option<VerificationChallenge> {
    let source = value.get("verification").unwrap_or(value);
    let code = source
        .get("code")
        .or_else(|| source.get("verification_code"))
        .and_then(Value::as_str)?;
    let challenge = source
        .get("challenge")
        .or_else(|| source.get("question"))
        .and_then(Value::as_str)?;
    Some(VerificationChallenge {
        code: code.to_string(),
        challenge: challenge.to_string(),
    })
}

fn parse_author(item: &Value) -> Option<String> {
    match item.get("author") {
        Some(Value::String(name)) => Some(name.clone()),
        Some(Value::Object(author)) => author
            .get("name")
            .or_else(|| author.get("username"))
            .and_then(Value::as_str)
            .map(String::from),
        _ => item
            .get("author_name")
            .and_then(Value::as_str)
            .map(String::from),
    }
}

fn parse_feed(body: &Value) -> Vec<FeedItem> {
    let items = body
        .as_array()
        .or_else(|| body.get("posts").and_then(Value::as_array))
        .or_else(|| body.get("data").and_then(Value::as_array));

    items
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let id = item.get("id").and_then(id_string)?;
            let text = |key: &str| item.get(key).and_then(Value::as_str).map(String::from);
            Some(FeedItem {
                id,
                title: text("title").unwrap_or_default(),
                content: text("content").or_else(|| text("body")).unwrap_or_default(),
                author: parse_author(item),
            })
        })
        .collect()
}

impl Platform for HttpPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_post<'a>(&'a self, draft: &'a PostDraft) -> PlatformFuture<'a, CreatedItem> {
        Box::pin(async move {
            let payload = json!({
                "submolt": draft.category,
                "title": draft.title,
                "content": draft.content,
            });
            let body = self
                .send(self.client.post(self.url("posts")).json(&payload))
                .await?;
            self.created_item(&body, "post")
        })
    }

    fn create_comment<'a>(
        &'a self,
        post_id: &'a str,
        body: &'a str,
    ) -> PlatformFuture<'a, CreatedItem> {
        Box::pin(async move {
            let url = self.url(&format!("posts/{post_id}/comments"));
            let response = self
                .send(self.client.post(url).json(&json!({ "content": body })))
                .await?;
            match self.created_item(&response, "comment") {
                // Comment endpoints may only acknowledge with `{"success": true}`.
                Err(PlatformError::Decode { .. })
                    if response.get("success").and_then(Value::as_bool) == Some(true) =>
                {
                    Ok(CreatedItem {
                        id: format!("{post_id}-{}", uuid::Uuid::new_v4()),
                        url: None,
                        verification: parse_verification(&response),
                    })
                }
                other => other,
            }
        })
    }

    fn list_posts<'a>(&'a self, sort: &'a str, limit: u32) -> PlatformFuture<'a, Vec<FeedItem>> {
        Box::pin(async move {
            let limit = limit.to_string();
            let body = self
                .send(
                    self.client
                        .get(self.url("posts"))
                        .query(&[("sort", sort), ("limit", limit.as_str())]),
                )
                .await?;
            Ok(parse_feed(&body))
        })
    }

    fn submit_verification<'a>(&'a self, code: &'a str, answer: &'a str) -> PlatformFuture<'a, ()> {
        Box::pin(async move {
            let payload = json!({ "verification_code": code, "answer": answer });
            let body = self
                .send(self.client.post(self.url("verify")).json(&payload))
                .await
                .map_err(|error| PlatformError::Verification {
                    platform: self.name.clone(),
                    message: error.to_string(),
                })?;

            if body.get("success").and_then(Value::as_bool) == Some(false) {
                return Err(PlatformError::Verification {
                    platform: self.name.clone(),
                    message: body
                        .get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("answer rejected")
                        .to_string(),
                });
            }
            Ok(())
        })
    }
}
