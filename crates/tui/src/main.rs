mod page;
mod renderer;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use scrolly_core::{ScrollyConfig, SiteContent};
use tracing_subscriber::EnvFilter;

use crate::page::Page;

const COURSE: &str = include_str!("../assets/course.json");

/// The terminal belongs to the preview, so logs only go to a file, and only
/// when `SCROLLY_LOG_FILE` names one. `SCROLLY_LOG` sets the filter.
fn init_logging() -> Result<()> {
    let Some(path) = std::env::var_os("SCROLLY_LOG_FILE") else {
        return Ok(());
    };
    let file = File::create(&path)
        .with_context(|| format!("cannot create log file {}", PathBuf::from(&path).display()))?;
    let filter = EnvFilter::try_from_env("SCROLLY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: scrolly-preview [content.json] [config.json]");
        return Ok(());
    }

    let content = match args.get(1) {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            SiteContent::from_json(&json).map_err(scrolly_core::Error::from)?
        }
        None => SiteContent::from_json(COURSE).map_err(scrolly_core::Error::from)?,
    };
    let config = match args.get(2) {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            ScrollyConfig::from_json(&json).map_err(scrolly_core::Error::from)?
        }
        None => ScrollyConfig::default(),
    };
    tracing::info!(
        sections = content.sections.len(),
        hotspots = content.hotspots.len(),
        "preview starting"
    );

    let mut page = Page::new(content, config);
    renderer::run(&mut page)
}
