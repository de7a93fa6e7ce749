use anyhow::Context;
use base64::Engine;
use podcast_core::speech::SynthesizedSegment;

use crate::models::{AudioFailure, AudioSegment};

/// Content type of every clip produced by the speech synthesizer.
pub const MP3_CONTENT_TYPE: &str = "audio/mpeg";

/// Encodes an MP3 clip for embedding in a JSON body.
pub fn encode_audio(mp3: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(mp3)
}

/// Decodes a clip previously produced by [`encode_audio`].
pub fn decode_audio(encoded: &str) -> anyhow::Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("Audio payload is not valid base64")
}

/// Splits synthesized segments into encoded clips and per-role failures,
/// preserving playback order in both lists.
pub fn encode_segments(segments: Vec<SynthesizedSegment>) -> (Vec<AudioSegment>, Vec<AudioFailure>) {
    let mut clips = Vec::new();
    let mut failures = Vec::new();
    for segment in segments {
        let role = segment.role.as_str().to_string();
        match segment.audio {
            Ok(bytes) => clips.push(AudioSegment {
                role,
                audio: encode_audio(&bytes),
            }),
            Err(e) => failures.push(AudioFailure {
                role,
                error: format!("{:#}", e),
            }),
        }
    }
    (clips, failures)
}
