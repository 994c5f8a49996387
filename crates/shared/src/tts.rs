use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

const API_BASE: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const MODEL_ID: &str = "eleven_multilingual_v2";

/// Read when neither the script nor its retry could be voiced
pub const APOLOGY_SCRIPT: &str = "Oops, something went wrong generating today's briefing. \
    Sorry about that. We'll be back with a full update soon.";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    voice_settings: VoiceSettings,
    model_id: &'a str,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.25,
            similarity_boost: 0.7,
            style: 0.25,
            use_speaker_boost: false,
        }
    }
}

pub struct SpeechSynthesizer {
    client: Client,
    api_key: String,
    voice_id: String,
}

impl SpeechSynthesizer {
    pub fn new(api_key: String, voice_id: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            voice_id,
        })
    }

    /// Build a synthesizer when both key and voice are configured
    pub fn from_config(api_key: Option<&str>, voice_id: Option<&str>) -> Result<Option<Self>> {
        match (api_key, voice_id) {
            (Some(key), Some(voice)) => Ok(Some(Self::new(key.to_string(), voice.to_string())?)),
            _ => {
                warn!("ElevenLabs not configured");
                Ok(None)
            }
        }
    }

    /// Voice the script: one attempt, one retry, then the apology.
    pub async fn synthesize_with_fallback(&self, script: &str) -> Option<Vec<u8>> {
        for label in ["main", "retry"] {
            match self.synthesize(script).await {
                Ok(audio) => return Some(audio),
                Err(e) => warn!(attempt = label, error = %e, "ElevenLabs error"),
            }
        }

        match self.synthesize(APOLOGY_SCRIPT).await {
            Ok(audio) => {
                info!("Using apology audio in place of the briefing");
                Some(audio)
            }
            Err(e) => {
                warn!(attempt = "apology", error = %e, "ElevenLabs error");
                None
            }
        }
    }

    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            text,
            voice_settings: VoiceSettings::default(),
            model_id: MODEL_ID,
        };

        let response = self
            .client
            .post(format!("{}/{}", API_BASE, self.voice_id))
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to ElevenLabs API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("ElevenLabs API error: {} - {}", status, error_text);
        }

        let audio = response
            .bytes()
            .await
            .context("Failed to read audio from ElevenLabs API")?;

        if audio.is_empty() {
            anyhow::bail!("ElevenLabs API returned no audio");
        }

        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = SpeechRequest {
            text: "Hello.",
            voice_settings: VoiceSettings::default(),
            model_id: MODEL_ID,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["text"], "Hello.");
        assert_eq!(json["model_id"], "eleven_multilingual_v2");
        assert_eq!(json["voice_settings"]["stability"], 0.25);
        assert_eq!(json["voice_settings"]["use_speaker_boost"], false);
    }

    #[test]
    fn test_unconfigured_gives_none() {
        assert!(SpeechSynthesizer::from_config(None, Some("voice")).unwrap().is_none());
        assert!(SpeechSynthesizer::from_config(Some("key"), None).unwrap().is_none());
    }

    #[test]
    fn test_configured_gives_client() {
        let synth = SpeechSynthesizer::from_config(Some("key"), Some("voice")).unwrap();
        assert!(synth.is_some());
    }
}
