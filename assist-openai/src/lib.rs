use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const USER_ROLE: &str = "user";
pub const IMAGES_PER_REQUEST: u32 = 1;

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("OpenAI API key is missing")]
    MissingApiKey,
    #[error("completion response contained no message content")]
    EmptyCompletion,
    #[error("image download from {url} returned no bytes")]
    EmptyImage { url: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Connection and model settings, built from the user configuration.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
    pub image_size: String,
}

/// Sends a single prompt to a text model and returns its reply.
pub trait TextCompletion {
    fn complete(&self, prompt: &str) -> Result<String, OpenAiError>;
}

/// Produces images from text prompts.
pub trait ImageGeneration {
    /// Requests one image. `Ok(None)` means the provider answered without an image.
    fn generate_image(&self, prompt: &str) -> Result<Option<ImageSource>, OpenAiError>;

    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, OpenAiError>;
}

/// Where the bytes of a generated image can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Base64(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: USER_ROLE,
                content: prompt,
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatReply,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub content: Option<String>,
}

impl ChatResponse {
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

impl<'a> ImageRequest<'a> {
    fn new(model: &'a str, prompt: &'a str, size: &'a str) -> Self {
        Self {
            model,
            prompt,
            n: IMAGES_PER_REQUEST,
            size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageResponse {
    #[serde(default)]
    pub data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
pub struct ImageDatum {
    pub url: Option<String>,
    pub b64_json: Option<String>,
}

impl ImageResponse {
    pub fn into_source(self) -> Option<ImageSource> {
        let datum = self.data.into_iter().next()?;
        match (datum.url, datum.b64_json) {
            (Some(url), _) if !url.trim().is_empty() => Some(ImageSource::Url(url)),
            (_, Some(encoded)) if !encoded.trim().is_empty() => Some(ImageSource::Base64(encoded)),
            _ => None,
        }
    }
}

/// Blocking client for the OpenAI chat completion and image endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    settings: OpenAiSettings,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`OpenAiError::MissingApiKey`] when the configured key is empty
    /// or whitespace only.
    pub fn new(settings: OpenAiSettings) -> Result<Self, OpenAiError> {
        if settings.api_key.trim().is_empty() {
            return Err(OpenAiError::MissingApiKey);
        }

        // The blocking client otherwise gives up after 30 seconds.
        let http = Client::builder().timeout(None).build()?;

        Ok(Self { http, settings })
    }
}

impl TextCompletion for OpenAiClient {
    fn complete(&self, prompt: &str) -> Result<String, OpenAiError> {
        let url = endpoint_url(&self.settings.base_url, "chat/completions");
        let request_body = ChatRequest::new(&self.settings.chat_model, prompt);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.settings.api_key)
            .json(&request_body)
            .send()?;

        let response = response.error_for_status()?;
        let parsed = response.json::<ChatResponse>()?;
        parsed.into_text().ok_or(OpenAiError::EmptyCompletion)
    }
}

impl ImageGeneration for OpenAiClient {
    fn generate_image(&self, prompt: &str) -> Result<Option<ImageSource>, OpenAiError> {
        let url = endpoint_url(&self.settings.base_url, "images/generations");
        let request_body = ImageRequest::new(
            &self.settings.image_model,
            prompt,
            &self.settings.image_size,
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.settings.api_key)
            .json(&request_body)
            .send()?;

        let response = response.error_for_status()?;
        let parsed = response.json::<ImageResponse>()?;
        Ok(parsed.into_source())
    }

    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, OpenAiError> {
        let response = self.http.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(OpenAiError::EmptyImage {
                url: url.to_string(),
            });
        }
        Ok(bytes.to_vec())
    }
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests;
