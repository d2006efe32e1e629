use anyhow::Result;
use colored::Colorize;

use cache_refresher_core::SettingsStore;
use cache_refresher_types::{RefresherSettings, SchedulerStatus};

use crate::cli::ConfigCommands;

pub async fn handle_status(port: u16, json: bool) -> Result<()> {
    let url = format!("http://127.0.0.1:{}/api/status", port);
    let response = reqwest::get(&url)
        .await
        .map_err(|e| anyhow::anyhow!("Daemon not reachable at {}: {}", url, e))?;
    let body: serde_json::Value = response.error_for_status()?.json().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let status: SchedulerStatus = serde_json::from_value(body.clone())?;
    let label = body["label"].as_str().unwrap_or_default();

    println!("{}", "Cache Refresher Status:".cyan().bold());
    if status.enabled {
        println!("  {}", label.green());
    } else {
        println!("  {}", label.yellow());
    }
    println!("  {}", status.summary());
    println!("  Interval: {}ms, budget: {}", status.interval_ms, status.max_attempts);
    println!(
        "  Refreshes: {} total, {} ok, {} failed",
        status.attempts_total,
        status.successes.to_string().green(),
        status.failures.to_string().red()
    );
    if let Some(at) = status.last_refresh_at {
        println!("  Last refresh: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(err) = &status.last_error {
        println!("  Last error: {}", err.red());
    }
    Ok(())
}

pub fn handle_config_command(cmd: ConfigCommands) -> Result<()> {
    let store = SettingsStore::open_default()?;
    match cmd {
        ConfigCommands::Show { json } => show_config(&store, json),
        ConfigCommands::Get { key } => get_config_value(&store, &key),
        ConfigCommands::Set { key, value } => set_config_value(&store, &key, &value),
    }
}

fn show_config(store: &SettingsStore, json: bool) -> Result<()> {
    let settings = store.load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        println!("{}", "Cache Refresher Settings:".cyan().bold());
        println!("  Enabled: {}", settings.enabled);
        println!("  Interval: {}ms", settings.interval_ms);
        println!("  Max refreshes: {}", settings.max_attempts);
        println!("  Min tokens: {}", settings.min_tokens_floor);
        println!("  Refresh max_tokens: {}", settings.refresh_max_tokens);
        println!("  Notifications: {}", settings.show_notifications);
        println!("  Debug: {}", settings.debug_mode);
        println!("  File: {}", store.path().display());
    }
    Ok(())
}

fn get_config_value(store: &SettingsStore, key: &str) -> Result<()> {
    let settings = store.load()?;
    println!("{}", read_key(&settings, key)?);
    Ok(())
}

fn set_config_value(store: &SettingsStore, key: &str, value: &str) -> Result<()> {
    let mut settings = store.load()?;
    write_key(&mut settings, key, value)?;
    store.save(&settings)?;

    println!("{} Setting updated: {} = {}", "✓".green(), key, value);
    println!("  Restart the daemon or POST /api/settings to apply.");
    Ok(())
}

fn read_key(settings: &RefresherSettings, key: &str) -> Result<String> {
    let value = match key {
        "enabled" => settings.enabled.to_string(),
        "interval_ms" => settings.interval_ms.to_string(),
        "max_attempts" => settings.max_attempts.to_string(),
        "min_tokens_floor" => settings.min_tokens_floor.to_string(),
        "show_notifications" => settings.show_notifications.to_string(),
        "debug_mode" => settings.debug_mode.to_string(),
        "refresh_max_tokens" => settings.refresh_max_tokens.to_string(),
        _ => anyhow::bail!("Unknown setting: {}", key),
    };
    Ok(value)
}

fn write_key(settings: &mut RefresherSettings, key: &str, value: &str) -> Result<()> {
    let invalid = |kind: &str| anyhow::anyhow!("Invalid {} for {}: {}", kind, key, value);
    match key {
        "enabled" => settings.enabled = value.parse().map_err(|_| invalid("boolean"))?,
        "interval_ms" => settings.interval_ms = value.parse().map_err(|_| invalid("number"))?,
        "max_attempts" => settings.max_attempts = value.parse().map_err(|_| invalid("number"))?,
        "min_tokens_floor" => {
            settings.min_tokens_floor = value.parse().map_err(|_| invalid("number"))?;
        },
        "show_notifications" => {
            settings.show_notifications = value.parse().map_err(|_| invalid("boolean"))?;
        },
        "debug_mode" => settings.debug_mode = value.parse().map_err(|_| invalid("boolean"))?,
        "refresh_max_tokens" => {
            settings.refresh_max_tokens = value.parse().map_err(|_| invalid("number"))?;
        },
        _ => anyhow::bail!("Unknown setting: {}", key),
    }
    Ok(())
}
