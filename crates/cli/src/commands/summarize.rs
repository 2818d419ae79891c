//! Summarize command - one-shot summary of text

use anyhow::{Context, Result, bail};
use feedbrief_adapters::llm::{
    LlmConfig as AdapterLlmConfig, OpenAiCompatSummarizer, StubSummarizer,
};
use feedbrief_domain::clean::clean;
use feedbrief_domain::usecases::SummarizeUseCase;
use feedbrief_domain::{Summarizer, split_summary};
use secrecy::SecretString;
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::SummarizeArgs;
use crate::config::AppConfig;

#[derive(Serialize)]
struct SummaryOutput<'a> {
    keywords: Option<&'a str>,
    summary: &'a str,
    raw: &'a str,
}

pub async fn execute(args: SummarizeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let text = clean(&get_input_text(&args)?);
    if text.is_empty() {
        bail!("No text provided for summarization");
    }

    let summarizer = build_summarizer(&config)?;
    if !summarizer.is_enabled() {
        bail!(
            "Summarization is disabled (provider '{}' or missing API key)",
            config.llm.provider
        );
    }

    tracing::info!(text_length = text.len(), "Summarizing text");

    let usecase = SummarizeUseCase::new(&*summarizer, config.aggregate_config().summary);
    let raw = usecase
        .summarize(&text)
        .await
        .context("Summarization failed")?;
    let (keywords, summary) = split_summary(&raw);

    if args.json {
        let output = SummaryOutput {
            keywords,
            summary,
            raw: &raw,
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        if let Some(keywords) = keywords {
            println!("Keywords: {}", keywords);
            println!();
        }
        println!("{}", summary);
    }

    Ok(())
}

/// Summarizer selected by `llm.provider`; a missing API key disables summaries
pub(crate) fn build_summarizer(config: &AppConfig) -> Result<Arc<dyn Summarizer>> {
    match config.llm.provider.as_str() {
        "openai_compat" => match build_openai_compat(config)? {
            Some(summarizer) => Ok(Arc::new(summarizer)),
            None => {
                tracing::warn!(
                    api_key_env = %config.llm.openai_compat.api_key_env,
                    "No API key available, summarization disabled"
                );
                Ok(Arc::new(StubSummarizer::disabled()))
            }
        },
        "stub" => Ok(Arc::new(StubSummarizer::echo())),
        "none" => Ok(Arc::new(StubSummarizer::disabled())),
        other => bail!("Unknown LLM provider: {}", other),
    }
}

/// The OpenAI-compatible client, or `None` when no API key is set
pub(crate) fn build_openai_compat(config: &AppConfig) -> Result<Option<OpenAiCompatSummarizer>> {
    let section = &config.llm.openai_compat;
    let base_url = section.base_url.trim();
    if base_url.is_empty() {
        bail!("OpenAI-compatible base_url is required");
    }

    let Some(api_key) = load_api_key(&section.api_key_env) else {
        return Ok(None);
    };

    let llm_config = AdapterLlmConfig {
        model: config.llm.model.clone(),
        temperature: config.llm.temperature,
        timeout_secs: config.llm.timeout_secs,
        proxy: non_empty_env(&section.proxy_env),
    };

    let summarizer = OpenAiCompatSummarizer::new(api_key, base_url.to_string(), llm_config)
        .context("Failed to configure OpenAI-compatible provider")?;
    Ok(Some(summarizer))
}

pub(crate) fn load_api_key(env_var: &str) -> Option<SecretString> {
    non_empty_env(env_var).map(|key| SecretString::new(key.into()))
}

fn non_empty_env(env_var: &str) -> Option<String> {
    if env_var.trim().is_empty() {
        return None;
    }
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_input_text(args: &SummarizeArgs) -> Result<String> {
    if let Some(ref text) = args.text {
        return Ok(text.clone());
    }

    if let Some(ref path) = args.file {
        if path.as_os_str() == "-" {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read from stdin")?;
            return Ok(text);
        }

        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()));
    }

    // Default to stdin if no input specified
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read from stdin")?;
    Ok(text)
}
