//! Gmail adapter — read-only inbox access.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use omnichat_core::adapter::{
    int_arg, str_arg, string_list_arg, AdapterDescriptor, AdapterError, OperationSpec, ParamSpec,
    ToolAdapter,
};
use omnichat_core::config::GoogleConfig;

use crate::auth::bearer_token;

const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    thread_id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    label_ids: Vec<String>,
    payload: Option<Payload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Payload {
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    mime_type: String,
    body: Option<PartBody>,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    data: Option<String>,
}

impl GmailMessage {
    /// Header values keyed by lowercase header name.
    fn header(&self, name: &str) -> Option<&str> {
        self.payload.as_ref()?.headers.iter().find_map(|h| {
            if h.name.eq_ignore_ascii_case(name) {
                Some(h.value.as_str())
            } else {
                None
            }
        })
    }

    /// Decoded text of the first `text/plain` part, if any.
    fn plain_text_body(&self) -> String {
        let Some(payload) = &self.payload else {
            return String::new();
        };
        for part in &payload.parts {
            if part.mime_type == "text/plain" {
                if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
                    if let Some(bytes) = base64url_decode(data) {
                        return String::from_utf8_lossy(&bytes).into_owned();
                    }
                }
            }
        }
        String::new()
    }
}

// ─────────────────────────────────────────────
// GmailAdapter
// ─────────────────────────────────────────────

/// Handles Gmail API interactions.
#[derive(Debug)]
pub struct GmailAdapter {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl GmailAdapter {
    pub const NAME: &'static str = "gmail";

    /// Static metadata used for catalog seeding.
    pub fn descriptor() -> AdapterDescriptor {
        AdapterDescriptor {
            name: Self::NAME.into(),
            kind: "GmailAdapter".into(),
            description: "Gmail integration for reading and managing emails".into(),
            operations: vec![
                OperationSpec::new("list_emails", "List recent emails in your inbox")
                    .with_example(json!({"max_results": 10}))
                    .with_params(vec![
                        ParamSpec::optional("max_results", json!(10)),
                        ParamSpec::optional("label_ids", json!(["INBOX"])),
                    ]),
                OperationSpec::new("get_email", "Get the full content of a specific email")
                    .with_example(json!({"email_id": "18c2f0a1b2c3d4e5"}))
                    .with_params(vec![ParamSpec::required("email_id")]),
            ],
        }
    }

    /// Construct from stored credentials.
    pub fn from_config(config: &GoogleConfig) -> Result<Self> {
        let token = bearer_token(config)?;
        let api_base = config
            .gmail_api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Ok(GmailAdapter {
            client: reqwest::Client::new(),
            api_base,
            token,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/users/me/messages", self.api_base.trim_end_matches('/'))
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| AdapterError::Api(format!("gmail request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Api(format!("gmail API returned {status}: {body}")).into());
        }

        Ok(response
            .json()
            .await
            .map_err(|e| AdapterError::Api(format!("invalid gmail response: {e}")))?)
    }

    /// List recent emails as summaries (metadata only).
    async fn list_emails(&self, max_results: i64, label_ids: Vec<String>) -> Result<Value> {
        let mut query: Vec<(&str, String)> = vec![("maxResults", max_results.to_string())];
        for label in &label_ids {
            query.push(("labelIds", label.clone()));
        }

        debug!(max_results, ?label_ids, "listing emails");

        let list: MessageList = self.fetch_json(&self.messages_url(), &query).await?;

        let mut emails = Vec::new();
        for msg_ref in &list.messages {
            let url = format!("{}/{}", self.messages_url(), msg_ref.id);
            let msg: GmailMessage = self
                .fetch_json(
                    &url,
                    &[
                        ("format", "metadata".to_string()),
                        ("metadataHeaders", "From".to_string()),
                        ("metadataHeaders", "Subject".to_string()),
                        ("metadataHeaders", "Date".to_string()),
                    ],
                )
                .await?;

            emails.push(json!({
                "id": msg.id,
                "thread_id": msg.thread_id,
                "snippet": msg.snippet,
                "subject": msg.header("Subject").unwrap_or("(No subject)"),
                "from": msg.header("From").unwrap_or("Unknown"),
                "date": msg.header("Date").unwrap_or(""),
                "labels": msg.label_ids,
            }));
        }

        Ok(Value::Array(emails))
    }

    /// Fetch one email in full, including the decoded plain-text body.
    async fn get_email(&self, email_id: &str) -> Result<Value> {
        let url = format!("{}/{}", self.messages_url(), email_id);
        let msg: GmailMessage = self
            .fetch_json(&url, &[("format", "full".to_string())])
            .await?;

        Ok(json!({
            "id": msg.id,
            "thread_id": msg.thread_id,
            "subject": msg.header("Subject").unwrap_or("(No subject)"),
            "from": msg.header("From").unwrap_or("Unknown"),
            "to": msg.header("To").unwrap_or(""),
            "date": msg.header("Date").unwrap_or(""),
            "labels": msg.label_ids,
            "body": msg.plain_text_body(),
            "snippet": msg.snippet,
        }))
    }
}

#[async_trait]
impl ToolAdapter for GmailAdapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Gmail integration for reading and managing emails"
    }

    fn operations(&self) -> Vec<OperationSpec> {
        Self::descriptor().operations
    }

    async fn invoke(&self, operation: &str, args: Map<String, Value>) -> Result<Value> {
        match operation {
            "list_emails" => {
                let max_results = int_arg(&args, "max_results")?;
                let label_ids = string_list_arg(&args, "label_ids")?;
                self.list_emails(max_results, label_ids).await
            }
            "get_email" => {
                let email_id = str_arg(&args, "email_id")?;
                self.get_email(&email_id).await
            }
            other => Err(AdapterError::InvalidArgument(format!(
                "unknown operation: {other}"
            ))
            .into()),
        }
    }
}

// ─────────────────────────────────────────────
// base64url
// ─────────────────────────────────────────────

/// Decode URL-safe base64 (Gmail body encoding), padding optional.
fn base64url_decode(data: &str) -> Option<Vec<u8>> {
    fn sextet(c: u8) -> Option<u32> {
        match c {
            b'A'..=b'Z' => Some((c - b'A') as u32),
            b'a'..=b'z' => Some((c - b'a' + 26) as u32),
            b'0'..=b'9' => Some((c - b'0' + 52) as u32),
            b'-' => Some(62),
            b'_' => Some(63),
            _ => None,
        }
    }

    let bytes: Vec<u8> = data
        .bytes()
        .filter(|&b| b != b'=' && b != b'\n' && b != b'\r')
        .collect();

    let mut out = Vec::with_capacity(bytes.len() / 4 * 3 + 2);
    for chunk in bytes.chunks(4) {
        let vals: Vec<u32> = chunk.iter().map(|&b| sextet(b)).collect::<Option<_>>()?;
        match vals.len() {
            4 => {
                let triple = vals[0] << 18 | vals[1] << 12 | vals[2] << 6 | vals[3];
                out.push((triple >> 16) as u8);
                out.push((triple >> 8) as u8);
                out.push(triple as u8);
            }
            3 => {
                let triple = vals[0] << 18 | vals[1] << 12 | vals[2] << 6;
                out.push((triple >> 16) as u8);
                out.push((triple >> 8) as u8);
            }
            2 => {
                let triple = vals[0] << 18 | vals[1] << 12;
                out.push((triple >> 16) as u8);
            }
            _ => return None,
        }
    }
    Some(out)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_adapter(api_base: &str) -> GmailAdapter {
        let config = GoogleConfig {
            access_token: "mail-token".into(),
            gmail_api_base: Some(api_base.into()),
            ..Default::default()
        };
        GmailAdapter::from_config(&config).unwrap()
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn base64url_decode_basic() {
        assert_eq!(base64url_decode("SGVsbG8=").unwrap(), b"Hello");
        assert_eq!(base64url_decode("SGVsbG8").unwrap(), b"Hello");
        assert_eq!(base64url_decode("").unwrap(), b"");
        assert!(base64url_decode("!!!").is_none());
    }

    #[test]
    fn base64url_decode_urlsafe_alphabet() {
        // 0xfb 0xff encodes to "-_8" in the URL-safe alphabet.
        assert_eq!(base64url_decode("-_8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn descriptor_lists_both_operations() {
        let desc = GmailAdapter::descriptor();
        let names: Vec<&str> = desc.operations.iter().map(|op| op.name.as_str()).collect();
        assert_eq!(names, vec!["list_emails", "get_email"]);
        // email_id is the only required parameter across the adapter.
        assert!(desc.operations[1].params[0].required);
    }

    #[test]
    fn construction_without_token_fails() {
        let err = GmailAdapter::from_config(&GoogleConfig::default()).unwrap_err();
        let kind = err.downcast_ref::<AdapterError>().unwrap().kind();
        assert_eq!(kind, "credentials");
    }

    #[tokio::test]
    async fn list_emails_maps_metadata() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/messages"))
            .and(header("Authorization", "Bearer mail-token"))
            .and(query_param("maxResults", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "m1", "threadId": "t1"}]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/users/me/messages/m1"))
            .and(query_param("format", "metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "m1",
                "threadId": "t1",
                "snippet": "Hi there",
                "labelIds": ["INBOX"],
                "payload": {
                    "headers": [
                        {"name": "From", "value": "alice@example.com"},
                        {"name": "Subject", "value": "Lunch?"},
                        {"name": "Date", "value": "Thu, 6 Aug 2026 10:00:00 +0000"}
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        let adapter = make_adapter(&mock_server.uri());
        let result = adapter
            .invoke(
                "list_emails",
                args(serde_json::json!({"max_results": 2, "label_ids": ["INBOX"]})),
            )
            .await
            .unwrap();

        let emails = result.as_array().unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0]["subject"], "Lunch?");
        assert_eq!(emails[0]["from"], "alice@example.com");
        assert_eq!(emails[0]["labels"], serde_json::json!(["INBOX"]));
    }

    #[tokio::test]
    async fn list_emails_empty_inbox() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let adapter = make_adapter(&mock_server.uri());
        let result = adapter
            .invoke(
                "list_emails",
                args(serde_json::json!({"max_results": 10, "label_ids": ["INBOX"]})),
            )
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!([]));
    }

    #[tokio::test]
    async fn get_email_decodes_plain_text_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/messages/m42"))
            .and(query_param("format", "full"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "m42",
                "threadId": "t42",
                "snippet": "snippet text",
                "labelIds": ["INBOX", "UNREAD"],
                "payload": {
                    "headers": [
                        {"name": "Subject", "value": "Report"},
                        {"name": "From", "value": "bob@example.com"},
                        {"name": "To", "value": "me@example.com"}
                    ],
                    "parts": [
                        {"mimeType": "text/html", "body": {"data": "PGI-SGk8L2I-"}},
                        {"mimeType": "text/plain", "body": {"data": "SGVsbG8gd29ybGQ="}}
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        let adapter = make_adapter(&mock_server.uri());
        let result = adapter
            .invoke("get_email", args(serde_json::json!({"email_id": "m42"})))
            .await
            .unwrap();

        assert_eq!(result["subject"], "Report");
        assert_eq!(result["to"], "me@example.com");
        assert_eq!(result["body"], "Hello world");
    }

    #[tokio::test]
    async fn get_email_not_found_is_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock_server)
            .await;

        let adapter = make_adapter(&mock_server.uri());
        let err = adapter
            .invoke("get_email", args(serde_json::json!({"email_id": "ghost"})))
            .await
            .unwrap_err();
        let kind = err.downcast_ref::<AdapterError>().unwrap().kind();
        assert_eq!(kind, "api");
    }

    #[tokio::test]
    async fn get_email_requires_string_id() {
        let adapter = make_adapter("http://127.0.0.1:1");
        let err = adapter
            .invoke("get_email", args(serde_json::json!({"email_id": 7})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("email_id"));
    }
}
