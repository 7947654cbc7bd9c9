use super::*;
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn settings(api_key: &str) -> OpenAiSettings {
    OpenAiSettings {
        api_key: api_key.to_string(),
        base_url: "https://api.openai.com/v1/".to_string(),
        chat_model: "gpt-4o".to_string(),
        image_model: "dall-e-3".to_string(),
        image_size: "1024x1024".to_string(),
    }
}

#[test]
fn serialize_chat_request_matches_expected_shape() {
    let request = ChatRequest::new("gpt-4o", "Summarize this:\n\nhello");
    let value = serde_json::to_value(request).expect("serialize request");

    let expected = serde_json::json!({
        "model": "gpt-4o",
        "messages": [{"role": "user", "content": "Summarize this:\n\nhello"}],
    });

    assert_eq!(value, expected);
}

#[test]
fn serialize_image_request_asks_for_one_square_image() {
    let request = ImageRequest::new("dall-e-3", "A cat, comic book style", "1024x1024");
    let value = serde_json::to_value(request).expect("serialize request");

    let expected = serde_json::json!({
        "model": "dall-e-3",
        "prompt": "A cat, comic book style",
        "n": 1,
        "size": "1024x1024",
    });

    assert_eq!(value, expected);
}

#[test]
fn parses_first_choice_content() {
    let json = r#"
    {
        "id": "chatcmpl-123",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "A short summary."}},
            {"index": 1, "message": {"role": "assistant", "content": "Ignored."}}
        ]
    }
    "#;

    let response: ChatResponse = serde_json::from_str(json).expect("parse chat response");
    assert_eq!(response.into_text().as_deref(), Some("A short summary."));
}

#[test]
fn missing_choices_yield_no_text() {
    let response: ChatResponse = serde_json::from_str("{}").expect("parse empty response");
    assert!(response.into_text().is_none());

    let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
    let response: ChatResponse = serde_json::from_str(json).expect("parse null content");
    assert!(response.into_text().is_none());
}

#[test]
fn image_response_prefers_url() {
    let json = r#"{"created": 1, "data": [{"url": "https://images.example/panel.png", "revised_prompt": "x"}]}"#;
    let response: ImageResponse = serde_json::from_str(json).expect("parse image response");
    assert_eq!(
        response.into_source(),
        Some(ImageSource::Url("https://images.example/panel.png".to_string()))
    );
}

#[test]
fn image_response_falls_back_to_inline_data() {
    let json = r#"{"data": [{"b64_json": "aGVsbG8="}]}"#;
    let response: ImageResponse = serde_json::from_str(json).expect("parse image response");
    assert_eq!(
        response.into_source(),
        Some(ImageSource::Base64("aGVsbG8=".to_string()))
    );
}

#[test]
fn image_response_without_data_has_no_source() {
    let response: ImageResponse = serde_json::from_str(r#"{"data": []}"#).expect("parse");
    assert!(response.into_source().is_none());

    let response: ImageResponse =
        serde_json::from_str(r#"{"data": [{"url": "  "}]}"#).expect("parse");
    assert!(response.into_source().is_none());
}

#[test]
fn empty_api_key_is_rejected() {
    let error = OpenAiClient::new(settings("   ")).expect_err("missing key");
    assert!(matches!(error, OpenAiError::MissingApiKey));
}

#[test]
fn slow_completion_is_not_cut_off() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
    let address = listener.local_addr().expect("listener address");
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });

    let mut settings = settings("sk-test");
    settings.base_url = format!("http://{address}/v1");
    let client = OpenAiClient::new(settings).expect("client builds");

    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let _ = sender.send(client.complete("hi").map_err(|error| error.to_string()));
    });

    let waited = receiver.recv_timeout(Duration::from_secs(35));
    assert!(
        matches!(waited, Err(mpsc::RecvTimeoutError::Timeout)),
        "request finished early: {waited:?}"
    );
}

#[test]
fn endpoint_joins_without_double_slash() {
    assert_eq!(
        endpoint_url("https://api.openai.com/v1/", "chat/completions"),
        "https://api.openai.com/v1/chat/completions"
    );
    assert_eq!(
        endpoint_url("http://localhost:8080/v1", "images/generations"),
        "http://localhost:8080/v1/images/generations"
    );
}
