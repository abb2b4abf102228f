//! The driver: fetch one plugin, install it, uninstall it

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use plugmgr_api::{ParamValue, ParameterOverrides, Plugin};
use plugmgr_core::{DylibLoader, NpmPackageSource, PluginManager};

use crate::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Package to fetch (e.g. "hello-plugin" or "@scope/name")
    pub package: String,

    /// Acquire the package by link instead of install
    #[arg(long)]
    pub link: bool,

    /// Override a plugin parameter before install (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Leave the plugin installed and enabled
    #[arg(long)]
    pub keep: bool,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let overrides = parse_overrides(&args.set)?;
    let use_link = args.link || config.packages.link;

    let source = NpmPackageSource::new(config.npm_config(), Arc::new(DylibLoader::new()));
    let manager =
        PluginManager::with_config(config.context(), Arc::new(source), config.manager_config());

    let plugin = manager
        .fetch_package(&args.package, use_link)
        .await
        .ok_or_else(|| anyhow!("Failed to fetch plugin '{}'", args.package))?;

    let overrides = (!overrides.is_empty()).then_some(overrides);
    let enabled = manager
        .install(&plugin, overrides)
        .await
        .with_context(|| format!("Failed to install plugin '{}'", plugin.name()))?;
    if !enabled {
        tracing::warn!(plugin = %plugin.name(), "Plugin was not enabled");
    }

    print_summaries(&manager).await;
    print_plugin(&plugin);

    if args.keep {
        println!("Keeping '{}' installed", plugin.name());
        return Ok(());
    }

    manager
        .uninstall(&plugin)
        .await
        .with_context(|| format!("Failed to uninstall plugin '{}'", plugin.name()))?;
    println!("Uninstalled '{}' ({})", plugin.name(), plugin.state());
    Ok(())
}

/// Parse `key=value` pairs. Values are read as TOML scalars when possible,
/// otherwise kept as plain strings.
fn parse_overrides(pairs: &[String]) -> Result<ParameterOverrides> {
    let mut overrides = ParameterOverrides::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("Invalid override '{}': expected KEY=VALUE", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid override '{}': empty key", pair);
        }
        overrides.insert(key.to_string(), parse_value(raw.trim()));
    }
    Ok(overrides)
}

fn parse_value(raw: &str) -> ParamValue {
    toml::from_str::<toml::Table>(&format!("value = {}", raw))
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| ParamValue::String(raw.to_string()))
}

async fn print_summaries(manager: &PluginManager) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Package").fg(Color::Cyan),
        Cell::new("Plugin").fg(Color::Cyan),
        Cell::new("State").fg(Color::Cyan),
        Cell::new("Link").fg(Color::Cyan),
    ]);

    for summary in manager.summaries().await {
        let state = if summary.state.is_enabled() {
            Cell::new(summary.state).fg(Color::Green)
        } else {
            Cell::new(summary.state)
        };
        table.add_row(vec![
            Cell::new(&summary.source_id),
            Cell::new(&summary.name),
            state,
            Cell::new(if summary.installed_using_link { "yes" } else { "no" }),
        ]);
    }

    println!("{table}");
}

fn print_plugin(plugin: &Plugin) {
    let config = plugin.config();
    let definition = plugin.definition();

    println!(
        "{} by {} [{}]",
        definition.name,
        definition.author,
        plugin.state()
    );
    if let Some(description) = &definition.description {
        println!("{}", description);
    }

    if config.parameters().is_empty() {
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Parameter").fg(Color::Cyan),
        Cell::new("Label").fg(Color::Cyan),
        Cell::new("Value").fg(Color::Cyan),
        Cell::new("Choices").fg(Color::Cyan),
    ]);

    for (key, value) in config.parameters() {
        let parameter = definition.parameter(key);
        let label = parameter.map(|p| p.label.as_str()).unwrap_or("");
        let choices = parameter
            .map(|p| {
                p.choices
                    .iter()
                    .map(|c| format!("{} ({})", c.label, c.value))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(key),
            Cell::new(label),
            Cell::new(value.to_string()),
            Cell::new(choices),
        ]);
    }

    println!("{table}");
}
