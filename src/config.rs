use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::layout::RenderOptions;

/// Layout width in dp when none is configured.
pub const DEFAULT_WIDTH_DP: f32 = 300.0;

#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Flags that may come from the command line or an rc file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigFlags {
    /// dp.
    pub width: Option<f32>,
    pub density: Option<f32>,
    /// dp.
    pub font_size: Option<f32>,
    /// px.
    pub max_image_height: Option<u32>,
    pub format: Option<OutputFormat>,
    pub taps: bool,
    pub perf: bool,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Layer `other` over `self`: switches accumulate, values from `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            width: other.width.or(self.width),
            density: other.density.or(self.density),
            font_size: other.font_size.or(self.font_size),
            max_image_height: other.max_image_height.or(self.max_image_height),
            format: other.format.or(self.format),
            taps: self.taps || other.taps,
            perf: self.perf || other.perf,
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    /// Layout options for these flags. The width is given in dp and
    /// converted with the configured density.
    pub fn render_options(&self) -> RenderOptions {
        let defaults = RenderOptions::default();
        let density = self.density.unwrap_or(defaults.density);
        RenderOptions {
            max_width: self.width.unwrap_or(DEFAULT_WIDTH_DP) * density,
            density,
            base_font_size: self.font_size.unwrap_or(defaults.base_font_size),
            max_image_height: self.max_image_height,
            ..defaults
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("htmltext").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("htmltext")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("htmltext").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("htmltext")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".htmltextrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# htmltext defaults (saved with --save)".to_string()];
    if let Some(width) = flags.width {
        lines.push(format!("--width {width}"));
    }
    if let Some(density) = flags.density {
        lines.push(format!("--density {density}"));
    }
    if let Some(size) = flags.font_size {
        lines.push(format!("--font-size {size}"));
    }
    if let Some(height) = flags.max_image_height {
        lines.push(format!("--max-image-height {height}"));
    }
    if let Some(format) = flags.format {
        lines.push(format!("--format {}", format.as_str()));
    }
    if flags.taps {
        lines.push("--taps".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract known flags from command-line style tokens, ignoring everything
/// else. Values may follow as the next token or after `=`.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let takes_value = matches!(
            name,
            "--width"
                | "--density"
                | "--font-size"
                | "--max-image-height"
                | "--format"
                | "--render-debug-log"
        );
        let value = if !takes_value {
            None
        } else if inline_value.is_some() {
            inline_value
        } else {
            let next = tokens.get(i + 1).map(String::as_str);
            if next.is_some() {
                i += 1;
            }
            next
        };

        match (name, value) {
            ("--taps", _) => flags.taps = true,
            ("--perf", _) => flags.perf = true,
            ("--width", Some(v)) => flags.width = parse_positive(v).or(flags.width),
            ("--density", Some(v)) => flags.density = parse_positive(v).or(flags.density),
            ("--font-size", Some(v)) => flags.font_size = parse_positive(v).or(flags.font_size),
            ("--max-image-height", Some(v)) => {
                flags.max_image_height = v.parse().ok().or(flags.max_image_height);
            }
            ("--format", Some(v)) => flags.format = parse_format(v).or(flags.format),
            ("--render-debug-log", Some(v)) => flags.render_debug_log = Some(PathBuf::from(v)),
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_positive(s: &str) -> Option<f32> {
    s.parse::<f32>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

fn parse_format(s: &str) -> Option<OutputFormat> {
    match s {
        "text" => Some(OutputFormat::Text),
        "json" => Some(OutputFormat::Json),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = tokens(&[
            "htmltext",
            "--width",
            "360",
            "--density=2.5",
            "--format",
            "json",
            "--taps",
            "--render-debug-log=render.log",
            "page.html",
        ]);
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.width, Some(360.0));
        assert_eq!(flags.density, Some(2.5));
        assert_eq!(flags.format, Some(OutputFormat::Json));
        assert!(flags.taps);
        assert!(!flags.perf);
        assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
    }

    #[test]
    fn test_parse_flag_tokens_ignores_bad_values() {
        let flags = parse_flag_tokens(&tokens(&["--width", "wide", "--format", "xml"]));
        assert_eq!(flags.width, None);
        assert_eq!(flags.format, None);

        let flags = parse_flag_tokens(&tokens(&["--density", "-1"]));
        assert_eq!(flags.density, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            perf: true,
            width: Some(200.0),
            format: Some(OutputFormat::Json),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            taps: true,
            width: Some(320.0),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.perf);
        assert!(merged.taps);
        assert_eq!(merged.width, Some(320.0));
        assert_eq!(merged.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_render_options_convert_width_with_density() {
        let flags = ConfigFlags {
            width: Some(200.0),
            density: Some(2.0),
            font_size: Some(14.0),
            ..ConfigFlags::default()
        };
        let options = flags.render_options();
        assert!((options.max_width - 400.0).abs() < f32::EPSILON);
        assert!((options.density - 2.0).abs() < f32::EPSILON);
        assert!((options.base_font_size - 14.0).abs() < f32::EPSILON);

        let defaults = ConfigFlags::default().render_options();
        assert!((defaults.max_width - DEFAULT_WIDTH_DP).abs() < f32::EPSILON);
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(".htmltextrc");
        let flags = ConfigFlags {
            width: Some(360.0),
            density: Some(3.0),
            font_size: Some(18.0),
            max_image_height: Some(800),
            format: Some(OutputFormat::Json),
            taps: true,
            perf: true,
            render_debug_log: Some(PathBuf::from("render.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_config_is_default() {
        let dir = tempdir().unwrap();
        let loaded = load_config_flags(&dir.path().join("absent")).unwrap();
        assert_eq!(loaded, ConfigFlags::default());
    }
}
