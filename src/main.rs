use std::cell::Cell;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use specific_keyup::config::{KeyupConfig, CONFIG_ENV};
use specific_keyup::js::{ClientOptions, LocalSession};
use specific_keyup::{KeySpecificKeyup, KeySpecificKeyupImmediate};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from);
    let config = KeyupConfig::load(config_path).unwrap_or_else(|err| {
        eprintln!("Failed to load keyup configuration: {err}");
        std::process::exit(1);
    });

    if let Err(err) = run(config) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

/// Each stdin line is a key name released on every configured element.
fn run(config: KeyupConfig) -> Result<()> {
    let legacy_events = std::env::var("SPECIFIC_KEYUP_LEGACY_EVENTS").is_ok();
    let mut session = LocalSession::new(ClientOptions { legacy_events })?;
    let releases = Rc::new(Cell::new(0usize));

    for binding in &config.bindings {
        let input = session.input(&binding.element, &binding.tag)?;
        input
            .attach_key_specific_keyup_event(binding.keys.iter())
            .with_context(|| format!("failed to attach filter to '{}'", binding.element))?;

        let id = binding.element.clone();
        input.on().key_specific_keyup(move |event| {
            println!(
                "{id}: {} (code {:?}, modifiers {:?})",
                event.key,
                event.code,
                event.modifiers()
            );
        })?;
        let counter = Rc::clone(&releases);
        input
            .on_immediate()
            .key_specific_keyup(move || counter.set(counter.get() + 1))?;

        info!(
            element = %binding.element,
            keys = ?binding.keys.iter().collect::<Vec<_>>(),
            "listening for filtered keyup"
        );
    }
    session.pump();

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        let key = line.trim_end_matches('\r');
        if key.is_empty() {
            continue;
        }
        for binding in &config.bindings {
            session.key_up(&binding.element, key)?;
        }
    }

    info!(matched = releases.get(), "done");
    Ok(())
}
