//! Voice transcription — speech-to-text through a Whisper endpoint.
//!
//! Defaults to Groq's OpenAI-compatible `/audio/transcriptions` API; any
//! endpoint accepting the same multipart upload works.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use neno_core::config::TranscriptionConfig;

// ─────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────

/// Trait for speech-to-text transcription providers.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Transcribe an audio file to text.
    ///
    /// A missing key or file yields empty text; API failures are errors.
    async fn transcribe(&self, file_path: &Path) -> anyhow::Result<String>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

// ─────────────────────────────────────────────
// Whisper
// ─────────────────────────────────────────────

/// Multipart upload to a Whisper transcription endpoint.
pub struct WhisperTranscriber {
    api_key: String,
    api_url: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl WhisperTranscriber {
    /// Build from config. Falls back to `GROQ_API_KEY` when no key is set.
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        let api_key = if config.api_key.is_empty() {
            std::env::var("GROQ_API_KEY").unwrap_or_default()
        } else {
            config.api_key.clone()
        };

        Self {
            api_key,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    /// Point at another OpenAI-compatible transcription endpoint.
    pub fn with_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Check if the transcriber has an API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait]
impl TranscriptionProvider for WhisperTranscriber {
    async fn transcribe(&self, file_path: &Path) -> anyhow::Result<String> {
        if !self.is_configured() {
            warn!("transcription: no API key configured, skipping");
            return Ok(String::new());
        }

        if !file_path.exists() {
            warn!(path = %file_path.display(), "transcription: file not found");
            return Ok(String::new());
        }

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        debug!(
            path = %file_path.display(),
            model = %self.model,
            "transcribing audio"
        );

        let file_bytes = tokio::fs::read(file_path).await?;

        let file_part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "transcription API error");
            anyhow::bail!("transcription API returned {}: {}", status, body);
        }

        let json: serde_json::Value = response.json().await?;
        let text = json["text"].as_str().unwrap_or_default().trim().to_string();

        debug!(chars = text.len(), "transcription complete");

        Ok(text)
    }

    fn display_name(&self) -> &str {
        "Whisper"
    }
}

// ─────────────────────────────────────────────
// Helper
// ─────────────────────────────────────────────

/// Check if a file path looks like an audio file.
pub fn is_audio_file(path: &str) -> bool {
    const EXTENSIONS: &[&str] = &[
        ".ogg", ".oga", ".opus", ".mp3", ".m4a", ".wav", ".flac", ".aac", ".webm",
    ];
    let lower = path.to_lowercase();
    EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(key: &str) -> TranscriptionConfig {
        TranscriptionConfig {
            api_key: key.to_string(),
            ..Default::default()
        }
    }

    fn audio_file() -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".ogg").tempfile().unwrap();
        std::fs::write(file.path(), b"OggS fake audio").unwrap();
        file
    }

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file("voice.ogg"));
        assert!(is_audio_file("song.MP3"));
        assert!(is_audio_file("/tmp/media/audio.m4a"));
        assert!(is_audio_file("recording.webm"));
        assert!(!is_audio_file("photo.jpg"));
        assert!(!is_audio_file("video.mp4"));
    }

    #[test]
    fn test_from_config() {
        let t = WhisperTranscriber::from_config(&config("gsk_test"));
        assert!(t.is_configured());
        assert_eq!(t.model, "whisper-large-v3");
        assert_eq!(t.timeout, Duration::from_secs(30));
        assert_eq!(t.display_name(), "Whisper");

        let t = t.with_url("https://custom.api/v1/audio/transcriptions");
        assert_eq!(t.api_url, "https://custom.api/v1/audio/transcriptions");
    }

    #[tokio::test]
    async fn test_transcribe_file_not_found() {
        let t = WhisperTranscriber::from_config(&config("test-key"));
        let text = t
            .transcribe(Path::new("/nonexistent/audio.ogg"))
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_transcribe_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(header("Authorization", "Bearer gsk_test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "text": " Olá NENO, tudo bem? " })),
            )
            .mount(&mock_server)
            .await;

        let t = WhisperTranscriber::from_config(&config("gsk_test"))
            .with_url(format!("{}/audio/transcriptions", mock_server.uri()));
        let file = audio_file();

        let text = t.transcribe(file.path()).await.unwrap();
        assert_eq!(text, "Olá NENO, tudo bem?");
    }

    #[tokio::test]
    async fn test_transcribe_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(400).set_body_string("unsupported format"))
            .mount(&mock_server)
            .await;

        let t = WhisperTranscriber::from_config(&config("gsk_test"))
            .with_url(format!("{}/audio/transcriptions", mock_server.uri()));
        let file = audio_file();

        let err = t.transcribe(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("400"));
    }
}
