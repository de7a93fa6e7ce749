//! Service Wiring
//!
//! Builds the orchestrator and its collaborators from a [`Config`]. Shared by
//! the HTTP server and the episode CLI so both run the same dependency graph.

use crate::config::Config;
use anyhow::Context;
use async_openai::config::OpenAIConfig;
use podcast_core::{
    Orchestrator, OrchestratorSettings,
    embedding::OpenAIEmbedder,
    index::QdrantIndex,
    llm_client::OpenAICompatibleClient,
    prompts::PromptComposer,
    retriever::SemanticRetriever,
    speech::{ElevenLabsClient, SpeechSynthesizer},
};
use std::{collections::HashMap, fs, path::Path, sync::Arc};
use tracing::{info, warn};

/// Loads every `*.md` file in `prompts_path`, keyed by file stem.
pub fn load_prompts(prompts_path: &Path) -> anyhow::Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    for entry in fs::read_dir(prompts_path)
        .with_context(|| format!("Failed to read prompts directory {}", prompts_path.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}

/// Prompt overrides from `PROMPTS_PATH`, or none when it is unset.
pub fn prompt_overrides(config: &Config) -> anyhow::Result<HashMap<String, String>> {
    match &config.prompts_path {
        Some(path) => {
            let prompts = load_prompts(path)?;
            info!(count = prompts.len(), path = %path.display(), "Loaded prompt overrides");
            Ok(prompts)
        }
        None => Ok(HashMap::new()),
    }
}

/// Wires the semantic retriever and generation client into an orchestrator.
pub fn build_orchestrator(
    config: &Config,
    prompt_overrides: &HashMap<String, String>,
) -> anyhow::Result<Orchestrator> {
    let api_key = config
        .provider_api_key()
        .context("No API key configured for the selected provider")?;
    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(config.provider.api_base());

    let embedder = Arc::new(OpenAIEmbedder::new(
        openai_config.clone(),
        config.embedding_model.clone(),
    ));
    let index = Arc::new(QdrantIndex::new(
        config.index_url.clone(),
        config.index_collection.clone(),
        config.index_api_key.clone(),
    ));
    let retriever =
        SemanticRetriever::new(embedder, index).with_timeout(config.retrieval_timeout);
    let generator = OpenAICompatibleClient::new(openai_config, config.chat_model.clone());

    let settings = OrchestratorSettings {
        top_k: config.retrieval_top_k,
        context_limit: config.context_limit,
        generation_timeout: config.generation_timeout,
    };

    Ok(
        Orchestrator::new(Arc::new(retriever), Arc::new(generator))
            .with_composer(PromptComposer::default().with_overrides(prompt_overrides))
            .with_settings(settings),
    )
}

/// The speech synthesizer, when a credential is configured.
pub fn build_synthesizer(config: &Config) -> Option<Arc<dyn SpeechSynthesizer>> {
    match &config.elevenlabs_api_key {
        Some(key) => Some(Arc::new(ElevenLabsClient::new(key.clone())) as Arc<dyn SpeechSynthesizer>),
        None => {
            warn!("ELEVENLABS_API_KEY is not set; audio endpoints will return text only");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use std::{net::SocketAddr, path::PathBuf, time::Duration};
    use tracing::Level;

    fn test_config() -> Config {
        Config {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            provider: Provider::Gemini,
            openai_api_key: None,
            gemini_api_key: Some("test-gemini-key".to_string()),
            chat_model: "gemini-flash-latest".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            index_url: "http://localhost:6333".to_string(),
            index_collection: "docs".to_string(),
            index_api_key: None,
            elevenlabs_api_key: None,
            retrieval_top_k: 7,
            context_limit: 2,
            retrieval_timeout: Duration::from_secs(4),
            generation_timeout: Duration::from_secs(30),
            log_level: Level::INFO,
            prompts_path: None,
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("podcast-api-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_prompts_reads_markdown_only() {
        let dir = scratch_dir("prompts");
        fs::write(dir.join("curious.md"), "Ask about {context}").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let prompts = load_prompts(&dir).unwrap();

        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts["curious"], "Ask about {context}");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_prompt_overrides() {
        let mut config = test_config();
        assert!(prompt_overrides(&config).unwrap().is_empty());

        config.prompts_path = Some(PathBuf::from("/definitely/not/a/prompts/dir"));
        assert!(prompt_overrides(&config).is_err());
    }

    #[test]
    fn test_build_orchestrator_applies_settings() {
        let orchestrator = build_orchestrator(&test_config(), &HashMap::new()).unwrap();
        let settings = orchestrator.settings();
        assert_eq!(settings.top_k, 7);
        assert_eq!(settings.context_limit, 2);
        assert_eq!(settings.generation_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_build_orchestrator_requires_provider_key() {
        let mut config = test_config();
        config.gemini_api_key = None;
        assert!(build_orchestrator(&config, &HashMap::new()).is_err());
    }

    #[test]
    fn test_build_synthesizer_follows_credential() {
        let mut config = test_config();
        assert!(build_synthesizer(&config).is_none());

        config.elevenlabs_api_key = Some("voice-key".to_string());
        assert!(build_synthesizer(&config).is_some());
    }
}
