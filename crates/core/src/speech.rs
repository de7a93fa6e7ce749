//! Speech Synthesis
//!
//! Turns finished turn text into audio, one voice per role. Synthesis runs
//! after text generation and never feeds back into it: an audio failure leaves
//! the text of a turn intact and is reported per role.

use crate::turn::{Interjection, Role, Turn};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, TryStreamExt};
use serde::Serialize;
use std::pin::Pin;
use tracing::{info, warn};

pub const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io";
/// Every segment shares this container and bitrate, which is what makes
/// byte-level concatenation of segments valid.
pub const OUTPUT_FORMAT: &str = "mp3_44100_128";
pub const BUFFERED_MODEL: &str = "eleven_multilingual_v2";
pub const STREAMING_MODEL: &str = "eleven_turbo_v2_5";

/// A stream of encoded audio chunks.
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Converts text into encoded audio in a role's voice.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns the complete audio for `text`.
    async fn synthesize(&self, text: &str, voice: Role) -> Result<Bytes>;

    /// Returns the audio for `text` as it is produced.
    async fn stream(&self, text: &str, voice: Role) -> Result<AudioStream>;
}

/// Voice identifiers used for each role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voices {
    pub curious: String,
    pub explainer: String,
    pub moderator: String,
}

impl Default for Voices {
    fn default() -> Self {
        Self {
            curious: "TxGEqnHWrfWFTfGW9XjX".to_string(),
            explainer: "21m00Tcm4TlvDq8ikWAM".to_string(),
            moderator: "pNInz6obpgDQGcFmaJgB".to_string(),
        }
    }
}

impl Voices {
    pub fn id_for(&self, role: Role) -> &str {
        match role {
            Role::Curious => &self.curious,
            Role::Explainer => &self.explainer,
            Role::Moderator => &self.moderator,
        }
    }
}

#[derive(Serialize, Debug)]
struct TextToSpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// A `SpeechSynthesizer` backed by the ElevenLabs text-to-speech API.
pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    voices: Voices,
}

impl ElevenLabsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: ELEVENLABS_API_BASE.to_string(),
            voices: Voices::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_voices(mut self, voices: Voices) -> Self {
        self.voices = voices;
        self
    }

    fn request(&self, text: &str, voice: Role, streaming: bool) -> reqwest::RequestBuilder {
        let (suffix, model_id) = if streaming {
            ("/stream", STREAMING_MODEL)
        } else {
            ("", BUFFERED_MODEL)
        };
        let url = format!(
            "{}/v1/text-to-speech/{}{}",
            self.base_url,
            self.voices.id_for(voice),
            suffix
        );
        self.http
            .post(url)
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header("xi-api-key", &self.api_key)
            .json(&TextToSpeechRequest { text, model_id })
    }

    async fn send(&self, text: &str, voice: Role, streaming: bool) -> Result<reqwest::Response> {
        self.request(text, voice, streaming)
            .send()
            .await
            .context("Failed to reach speech service")?
            .error_for_status()
            .context("Speech service rejected the request")
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice: Role) -> Result<Bytes> {
        let response = self.send(text, voice, false).await?;
        Ok(response.bytes().await?)
    }

    async fn stream(&self, text: &str, voice: Role) -> Result<AudioStream> {
        let response = self.send(text, voice, true).await?;
        Ok(Box::pin(response.bytes_stream().map_err(anyhow::Error::from)))
    }
}

/// The per-role text handed to synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechScript {
    pub curious: Option<String>,
    pub explainer: String,
    pub moderator: Option<String>,
}

impl SpeechScript {
    pub fn from_turn(turn: &Turn) -> Self {
        Self {
            curious: Some(turn.curious_question.clone()),
            explainer: turn.explainer_answer.clone(),
            moderator: None,
        }
    }

    /// The listener's question is not voiced; only the answer is.
    pub fn from_interjection(interjection: &Interjection) -> Self {
        Self {
            curious: None,
            explainer: interjection.explainer_answer.clone(),
            moderator: None,
        }
    }

    /// Adds a moderator line. Blank lines are ignored.
    pub fn with_moderator(mut self, line: Option<String>) -> Self {
        self.moderator = line.filter(|l| !l.trim().is_empty());
        self
    }

    /// Present, non-blank segments in playback order.
    pub fn segments(&self) -> Vec<(Role, &str)> {
        Role::PLAYBACK_ORDER
            .into_iter()
            .filter_map(|role| {
                let text = match role {
                    Role::Curious => self.curious.as_deref(),
                    Role::Explainer => Some(self.explainer.as_str()),
                    Role::Moderator => self.moderator.as_deref(),
                }?;
                (!text.trim().is_empty()).then_some((role, text))
            })
            .collect()
    }
}

/// The audio produced for one role, or why it could not be.
#[derive(Debug)]
pub struct SynthesizedSegment {
    pub role: Role,
    pub audio: Result<Bytes>,
}

/// Synthesizes each segment of `script` in playback order.
///
/// A failing role does not stop the others.
pub async fn synthesize_segments(
    synthesizer: &dyn SpeechSynthesizer,
    script: &SpeechScript,
) -> Vec<SynthesizedSegment> {
    let mut segments = Vec::new();
    for (role, text) in script.segments() {
        let audio = synthesizer.synthesize(text, role).await;
        match &audio {
            Ok(bytes) => info!(%role, bytes = bytes.len(), "Synthesized segment"),
            Err(e) => warn!(%role, error = ?e, "Speech synthesis failed for segment"),
        }
        segments.push(SynthesizedSegment { role, audio });
    }
    segments
}

/// Concatenates encoded segments byte for byte. No re-encoding happens, so
/// all segments must share one container and bitrate.
pub fn combine_segments<'a>(segments: impl IntoIterator<Item = &'a Bytes>) -> Bytes {
    let mut combined = BytesMut::new();
    for segment in segments {
        combined.extend_from_slice(segment);
    }
    combined.freeze()
}

/// Synthesizes `script` into a single buffer in playback order.
///
/// Fails if any segment fails, rather than producing a recording with a gap.
pub async fn synthesize_combined(
    synthesizer: &dyn SpeechSynthesizer,
    script: &SpeechScript,
) -> Result<Bytes> {
    let segments = synthesize_segments(synthesizer, script).await;
    if segments.is_empty() {
        return Err(anyhow!("Nothing to synthesize"));
    }

    let mut buffers = Vec::with_capacity(segments.len());
    for segment in segments {
        let audio = segment
            .audio
            .with_context(|| format!("Failed to synthesize the {} segment", segment.role))?;
        buffers.push(audio);
    }
    Ok(combine_segments(&buffers))
}
