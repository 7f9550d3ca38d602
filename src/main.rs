//! htmltext - lay out HTML fragments as rich text.
//!
//! # Usage
//!
//! ```bash
//! htmltext page.html
//! htmltext --width 360 --density 2 page.html
//! echo '<p><b>hi</b></p>' | htmltext --format json
//! ```

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use htmltext::config::{
    ConfigFlags, OutputFormat, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use htmltext::layout::{RenderBlock, TapTarget};
use htmltext::{perf, render_html};

/// Lay out an HTML fragment as width-bounded rich text
#[derive(Parser, Debug)]
#[command(name = "htmltext", version, about, long_about = None)]
struct Cli {
    /// HTML file to render (stdin when absent or `-`)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Layout width in dp
    #[arg(long, value_name = "DP")]
    width: Option<f32>,

    /// Screen density (px per dp)
    #[arg(long)]
    density: Option<f32>,

    /// Base font size in dp
    #[arg(long, value_name = "DP")]
    font_size: Option<f32>,

    /// Clamp image heights to this many px
    #[arg(long, value_name = "PX")]
    max_image_height: Option<u32>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// List tappable regions after the text output
    #[arg(long)]
    taps: bool,

    /// Report parse and layout timings
    #[arg(long)]
    perf: bool,

    /// Write per-line layout events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut markup = String::new();
            std::io::stdin()
                .read_to_string(&mut markup)
                .context("Failed to read stdin")?;
            Ok(markup)
        }
    }
}

fn write_text(out: &mut impl Write, block: &RenderBlock, taps: bool) -> Result<()> {
    writeln!(out, "{}", block.plain_text())?;
    if taps {
        for region in block.tap_regions() {
            let rect = region.rect;
            let target = match &region.target {
                TapTarget::Link { href, .. } => {
                    format!("link {}", href.as_deref().unwrap_or("<none>"))
                }
                TapTarget::Image { index, src } => format!("image #{index} {src}"),
                TapTarget::Video { src } => {
                    format!("video {}", src.as_deref().unwrap_or("<none>"))
                }
            };
            writeln!(
                out,
                "[tap] {:.0},{:.0} {:.0}x{:.0} {target}",
                rect.x, rect.y, rect.width, rect.height
            )?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    // Initialize logging
    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    if effective.perf {
        filter = filter.add_directive("htmltext::perf=info".parse()?);
    }
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("HTMLTEXT_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = %render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            %err,
            "Failed to initialize render debug log"
        );
    }

    if (cli.save || cli.clear) && cli.file.is_none() {
        return Ok(());
    }

    let markup = read_input(cli.file.as_ref())?;
    let options = effective.render_options();
    let block = render_html(&markup, &options);
    for warning in block.warnings() {
        tracing::warn!("{warning}");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match effective.format.unwrap_or_default() {
        OutputFormat::Text => write_text(&mut out, &block, effective.taps)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &block).context("Failed to write JSON")?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    perf::set_debug_log_path(None).context("Failed to flush render debug log")
}
