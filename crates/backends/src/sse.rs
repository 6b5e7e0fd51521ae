//! Server-sent-event payload parsing for generative responses.
//!
//! Some endpoints answer a non-streaming request with an SSE body anyway.
//! This module recovers the full text from such a body, understanding both
//! event vocabularies:
//! - chat-completions chunks (`choices[0].delta.content`, `[DONE]`)
//! - responses-API events (`response.output_text.delta`,
//!   `response.output_text.done`, `response.completed`, `response.failed`)

use playforge_core::BackendError;

/// True when a body looks like an SSE stream rather than a JSON document.
pub fn looks_like_sse(body: &str) -> bool {
    body.lines()
        .map(str::trim_start)
        .any(|line| line.starts_with("data:") || line.starts_with("event:"))
}

/// Assemble the full text from an SSE body.
///
/// Returns `Ok(String)` even when empty; the caller decides whether empty
/// content is an error. A `response.failed` event is a hard error.
pub fn parse_sse_text(body: &str) -> Result<String, BackendError> {
    let mut deltas = String::new();
    let mut done_text: Option<String> = None;
    let mut event_name = String::new();

    for raw_line in body.lines() {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            event_name.clear();
            continue;
        }
        if let Some(name) = line.strip_prefix("event:") {
            event_name = name.trim().to_string();
            continue;
        }
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data == "[DONE]" {
            break;
        }
        let Ok(json) = serde_json::from_str::<serde_json::Value>(data) else {
            continue;
        };

        // Responses-API events carry their type inline as well.
        let kind = json["type"].as_str().unwrap_or(event_name.as_str());
        match kind {
            "response.output_text.delta" | "response.content_part.added" => {
                if let Some(delta) = json["delta"].as_str().or_else(|| json["part"]["text"].as_str())
                {
                    deltas.push_str(delta);
                }
            }
            "response.output_text.done" | "response.content_part.done" => {
                if let Some(text) = json["text"].as_str().or_else(|| json["part"]["text"].as_str())
                {
                    done_text = Some(text.to_string());
                }
            }
            "response.completed" => {
                if let Some(text) = completed_response_text(&json["response"]) {
                    done_text = Some(text);
                }
            }
            "response.failed" => {
                let message = json["response"]["error"]["message"]
                    .as_str()
                    .unwrap_or("generation failed")
                    .to_string();
                return Err(BackendError::Api { status_code: 200, message });
            }
            _ => {
                // Chat-completions chunks have no event name.
                if let Some(delta) = json["choices"][0]["delta"]["content"].as_str() {
                    deltas.push_str(delta);
                }
            }
        }
    }

    // A terminal "done" event carries the authoritative full text.
    let text = match done_text {
        Some(full) if full.chars().count() >= deltas.chars().count() => full,
        _ => deltas,
    };
    Ok(text.trim().to_string())
}

/// Pull the output text out of a completed responses-API payload.
pub fn completed_response_text(response: &serde_json::Value) -> Option<String> {
    if let Some(text) = response["output_text"].as_str() {
        if !text.trim().is_empty() {
            return Some(text.trim().to_string());
        }
    }
    let mut parts = Vec::new();
    for item in response["output"].as_array()? {
        for content in item["content"].as_array().into_iter().flatten() {
            if let Some(text) = content["text"].as_str() {
                parts.push(text);
            }
        }
    }
    let joined = parts.join("").trim().to_string();
    if joined.is_empty() { None } else { Some(joined) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_completions_deltas_accumulate() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
                    data: [DONE]\n";
        assert_eq!(parse_sse_text(body).unwrap(), "Hello");
    }

    #[test]
    fn responses_done_event_wins_over_deltas() {
        let body = "event: response.output_text.delta\n\
                    data: {\"type\":\"response.output_text.delta\",\"delta\":\"par\"}\n\n\
                    event: response.output_text.done\n\
                    data: {\"type\":\"response.output_text.done\",\"text\":\"partial then full\"}\n\n";
        assert_eq!(parse_sse_text(body).unwrap(), "partial then full");
    }

    #[test]
    fn completed_event_extracts_output() {
        let body = concat!(
            "event: response.completed\n",
            "data: {\"type\":\"response.completed\",\"response\":{\"output\":[",
            "{\"content\":[{\"type\":\"output_text\",\"text\":\"final text\"}]}]}}\n\n"
        );
        assert_eq!(parse_sse_text(body).unwrap(), "final text");
    }

    #[test]
    fn failed_event_is_an_error() {
        let body = "event: response.failed\n\
                    data: {\"type\":\"response.failed\",\"response\":{\"error\":{\"message\":\"overloaded\"}}}\n";
        let err = parse_sse_text(body).unwrap_err();
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn garbage_lines_are_skipped() {
        let body = ": keepalive\n\
                    data: not json\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n";
        assert_eq!(parse_sse_text(body).unwrap(), "ok");
    }

    #[test]
    fn sse_detection() {
        assert!(looks_like_sse("data: {}\n"));
        assert!(looks_like_sse("event: response.completed\ndata: {}\n"));
        assert!(!looks_like_sse("{\"choices\":[]}"));
    }
}
