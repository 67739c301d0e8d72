//! Remote AI slide generation.
//!
//! The service answers a [`PitchDescription`] with an ordered list of slides.
//! Responses are validated before anything touches the deck: the list must be
//! non-empty and every entry needs string `title` and `content` fields.

use std::time::Duration;

use deckforge_shared::protocol::{GeneratedSlide, PitchDescription};
use deckforge_shared::SlideRecord;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::GenerationError;

pub trait SlideGenerationClient: Send + Sync {
    fn generate<'a>(
        &'a self,
        pitch: &'a PitchDescription,
    ) -> BoxFuture<'a, Result<Vec<SlideRecord>, GenerationError>>;
}

/// Used when no generation endpoint is configured.
pub struct DisabledGeneration;

impl SlideGenerationClient for DisabledGeneration {
    fn generate<'a>(
        &'a self,
        _pitch: &'a PitchDescription,
    ) -> BoxFuture<'a, Result<Vec<SlideRecord>, GenerationError>> {
        Box::pin(async { Err(GenerationError::NotConfigured) })
    }
}

pub struct HttpGenerationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpGenerationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/generate-slides", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SlideGenerationClient for HttpGenerationClient {
    fn generate<'a>(
        &'a self,
        pitch: &'a PitchDescription,
    ) -> BoxFuture<'a, Result<Vec<SlideRecord>, GenerationError>> {
        Box::pin(async move {
            debug!(endpoint = %self.endpoint, title = %pitch.title, "requesting slide generation");

            let resp = self.http.post(&self.endpoint).json(pitch).send().await?;
            if !resp.status().is_success() {
                return Err(GenerationError::Status(resp.status()));
            }

            let body: Value = resp
                .json()
                .await
                .map_err(|e| GenerationError::Malformed(e.to_string()))?;
            let slides = parse_generated_slides(body)?;

            info!(slides = slides.len(), "slides generated");
            Ok(slides)
        })
    }
}

/// Validate a raw generation response.
///
/// Accepts either a bare array or an object with a `slides` array.
pub fn parse_generated_slides(body: Value) -> Result<Vec<SlideRecord>, GenerationError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("slides") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(GenerationError::Malformed("`slides` is not an array".into())),
            None => return Err(GenerationError::Malformed("missing `slides`".into())),
        },
        other => {
            return Err(GenerationError::Malformed(format!(
                "expected an array of slides, got {}",
                json_kind(&other)
            )))
        }
    };

    if items.is_empty() {
        return Err(GenerationError::Empty);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            for field in ["title", "content"] {
                if !item.get(field).is_some_and(Value::is_string) {
                    return Err(GenerationError::Malformed(format!(
                        "slide {i} has no string `{field}`"
                    )));
                }
            }
            serde_json::from_value::<GeneratedSlide>(item)
                .map(GeneratedSlide::into_record)
                .map_err(|e| GenerationError::Malformed(format!("slide {i}: {e}")))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use deckforge_shared::LayoutId;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn accepts_bare_array_and_wrapped_object() {
        let bare = json!([{"title": "<h1>A</h1>", "content": "<p>a</p>"}]);
        assert_eq!(parse_generated_slides(bare).unwrap().len(), 1);

        let wrapped = json!({"slides": [
            {"title": "A", "content": "a", "layout": "title-only"},
            {"title": "B", "content": "b"}
        ]});
        let slides = parse_generated_slides(wrapped).unwrap();
        assert_eq!(slides[0].layout, LayoutId::TITLE_ONLY);
        assert_eq!(slides[1].layout, LayoutId::TITLE_CONTENT);
    }

    #[test]
    fn empty_list_is_an_error() {
        assert!(matches!(parse_generated_slides(json!([])), Err(GenerationError::Empty)));
        assert!(matches!(
            parse_generated_slides(json!({"slides": []})),
            Err(GenerationError::Empty)
        ));
    }

    #[test]
    fn malformed_entries_are_rejected() {
        let cases = [
            json!("just text"),
            json!({"data": []}),
            json!([{"title": "A"}]),
            json!([{"title": 3, "content": "x"}]),
            json!([{"title": "A", "content": "a"}, "oops"]),
        ];
        for case in cases {
            assert!(
                matches!(parse_generated_slides(case.clone()), Err(GenerationError::Malformed(_))),
                "accepted {case}"
            );
        }
    }

    #[tokio::test]
    async fn disabled_client_reports_not_configured() {
        let result = DisabledGeneration.generate(&PitchDescription::default()).await;
        assert!(matches!(result, Err(GenerationError::NotConfigured)));
    }

    /// Serve one canned HTTP response and return the base URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            // Read headers, then as much body as Content-Length announces.
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                if let Some(end) = text.find("\r\n\r\n") {
                    let expected = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + expected {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn http_client_parses_service_response() {
        let base = serve_once("200 OK", r#"{"slides":[{"title":"<h1>Acme</h1>","content":"<p>x</p>"}]}"#).await;
        let client = HttpGenerationClient::new(&base, Duration::from_secs(5)).unwrap();
        assert!(client.endpoint().ends_with("/generate-slides"));
        assert!(!client.endpoint().contains("//generate"));

        let slides = client.generate(&PitchDescription::default()).await.unwrap();
        assert_eq!(slides[0].title, "<h1>Acme</h1>");
    }

    #[tokio::test]
    async fn http_client_surfaces_status_errors() {
        let base = serve_once("503 Service Unavailable", "{}").await;
        let client = HttpGenerationClient::new(&base, Duration::from_secs(5)).unwrap();
        let result = client.generate(&PitchDescription::default()).await;
        assert!(matches!(result, Err(GenerationError::Status(s)) if s.as_u16() == 503));
    }
}
