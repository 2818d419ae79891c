//! Doctor command - validate configuration and show status

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::args::DoctorArgs;
use crate::commands::summarize::{build_openai_compat, load_api_key};
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    channels: CheckResult,
    llm: CheckResult,
    base_dir: CheckResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    ping: Option<CheckResult>,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        channels: CheckResult::error("Not checked"),
        llm: CheckResult::error("Not checked"),
        base_dir: CheckResult::error("Not checked"),
        ping: None,
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.channels = check_channels(config);
        report.llm = check_llm(config);
        report.base_dir = check_base_dir(&config.general.base_dir).await;

        if args.ping {
            report.ping = Some(check_ping(config).await);
        }
    }

    // Determine overall status
    let mut checks = vec![
        &report.config,
        &report.channels,
        &report.llm,
        &report.base_dir,
    ];
    if let Some(ref ping) = report.ping {
        checks.push(ping);
    }

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_channels(config: &AppConfig) -> CheckResult {
    match config.channels() {
        Ok(channels) if channels.is_empty() => CheckResult::warn("No channels configured"),
        Ok(channels) => {
            let sources: usize = channels.iter().map(|c| c.sources.len()).sum();
            CheckResult::ok(format!(
                "{} channels, {} sources",
                channels.len(),
                sources
            ))
            .with_details(serde_json::json!({
                "names": channels.iter().map(|c| &c.name).collect::<Vec<_>>()
            }))
        }
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

fn check_llm(config: &AppConfig) -> CheckResult {
    let provider = &config.llm.provider;
    let model = &config.llm.model;

    match provider.as_str() {
        "none" => return CheckResult::warn("Provider: none (summaries disabled)"),
        "stub" => return CheckResult::ok("Provider: stub (offline)"),
        "openai_compat" => {}
        other => return CheckResult::error(format!("Unknown provider: {}", other)),
    }

    let section = &config.llm.openai_compat;
    if section.base_url.trim().is_empty() {
        return CheckResult::error("OpenAI-compatible base_url is empty");
    }

    // Report key presence without revealing the value
    match load_api_key(&section.api_key_env) {
        Some(_) => CheckResult::ok(format!(
            "Provider: {}, Model: {}, API key: {} (set)",
            provider, model, section.api_key_env
        )),
        None => CheckResult::warn(format!(
            "Provider: {}, Model: {}, API key: {} (not set, summaries disabled)",
            provider, model, section.api_key_env
        )),
    }
}

async fn check_base_dir(dir: &Path) -> CheckResult {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        return CheckResult::error(format!("Cannot create {}: {}", dir.display(), e));
    }

    let probe = dir.join(format!(".feedbrief-doctor-{}", std::process::id()));
    match tokio::fs::write(&probe, b"ok").await {
        Ok(()) => {
            let _ = tokio::fs::remove_file(&probe).await;
            CheckResult::ok(format!("{} is writable", dir.display()))
        }
        Err(e) => CheckResult::error(format!("{} is not writable: {}", dir.display(), e)),
    }
}

async fn check_ping(config: &AppConfig) -> CheckResult {
    if config.llm.provider != "openai_compat" {
        return CheckResult::warn(format!(
            "Ping skipped for provider {}",
            config.llm.provider
        ));
    }

    match build_openai_compat(config) {
        Ok(Some(summarizer)) => match summarizer.ping().await {
            Ok(()) => CheckResult::ok(format!("{} reachable", summarizer.base_url())),
            Err(e) => CheckResult::error(format!("{}: {}", summarizer.base_url(), e)),
        },
        Ok(None) => CheckResult::warn("Ping skipped: API key not set"),
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("feedbrief Doctor Report");
    println!("=======================");
    println!();

    print_check("Config", &report.config);
    print_check("Channels", &report.channels);
    print_check("LLM Provider", &report.llm);
    print_check("Output Dir", &report.base_dir);
    if let Some(ref ping) = report.ping {
        print_check("Ping", ping);
    }

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: feedbrief run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
