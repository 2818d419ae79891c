//! Channels command - list and validate channel definitions

use anyhow::{Context, Result};
use feedbrief_domain::{Channel, FilterField, FilterMode};
use serde::Serialize;
use std::path::PathBuf;

use crate::args::{ChannelsArgs, ChannelsCommands};
use crate::config::AppConfig;

#[derive(Serialize)]
struct ChannelView<'a> {
    name: &'a str,
    sources: &'a [String],
    filter: Option<FilterView<'a>>,
    max_items: usize,
    max_total_items: usize,
}

#[derive(Serialize)]
struct FilterView<'a> {
    field: &'static str,
    mode: &'static str,
    pattern: &'a str,
}

pub async fn execute(args: ChannelsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    match args.command {
        ChannelsCommands::List { json } => list_channels(&config, json),
        ChannelsCommands::Validate => validate_channels(&config),
    }
}

fn list_channels(config: &AppConfig, json: bool) -> Result<()> {
    let channels = config.channels().context("Invalid channel configuration")?;
    let views: Vec<ChannelView<'_>> = channels.iter().map(view).collect();

    if json {
        let json = serde_json::to_string_pretty(&views).context("Failed to serialize channels")?;
        println!("{}", json);
        return Ok(());
    }

    if views.is_empty() {
        println!("No channels configured.");
        return Ok(());
    }

    println!("Channels ({}):", views.len());
    println!();
    for channel in &views {
        println!("  {}", channel.name);
        for source in channel.sources {
            println!("    source: {}", source);
        }
        if let Some(filter) = &channel.filter {
            println!(
                "    filter: {} {} \"{}\"",
                filter.field, filter.mode, filter.pattern
            );
        }
        println!(
            "    summaries per run: {}, retained: {}",
            channel.max_items, channel.max_total_items
        );
    }

    Ok(())
}

fn validate_channels(config: &AppConfig) -> Result<()> {
    let channels = config.channels().context("Validation failed")?;

    println!("✓ {} channels valid", channels.len());
    Ok(())
}

fn view(channel: &Channel) -> ChannelView<'_> {
    ChannelView {
        name: &channel.name,
        sources: &channel.sources,
        filter: channel.filter.as_ref().map(|rule| FilterView {
            field: field_name(rule.field()),
            mode: mode_name(rule.mode()),
            pattern: rule.pattern(),
        }),
        max_items: channel.max_new_items_per_run,
        max_total_items: channel.max_total_items,
    }
}

fn field_name(field: FilterField) -> &'static str {
    match field {
        FilterField::Title => "title",
        FilterField::ArticleBody => "article",
        FilterField::Link => "link",
        FilterField::None => "none",
    }
}

fn mode_name(mode: FilterMode) -> &'static str {
    match mode {
        FilterMode::Include => "include",
        FilterMode::Exclude => "exclude",
        FilterMode::RegexMatch => "regex match",
        FilterMode::RegexNotMatch => "regex not match",
    }
}
