use std::path::PathBuf;

use htmltext::config::{ConfigFlags, OutputFormat, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".htmltextrc");
    let content = r"
# comment
--taps

--width 360

--render-debug-log=render.log
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.taps);
    assert_eq!(flags.width, Some(360.0));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".htmltextrc");
    let content = "--perf\n--format text\n--render-debug-log file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "htmltext".to_string(),
        "--format".to_string(),
        "json".to_string(),
        "--density".to_string(),
        "3".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.perf, "file flags should remain enabled");
    assert_eq!(effective.density, Some(3.0), "cli flags should be applied");
    assert_eq!(
        effective.format,
        Some(OutputFormat::Json),
        "cli should override format"
    );
    assert_eq!(
        effective.render_debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "htmltext".to_string(),
        "--font-size=18".to_string(),
        "--max-image-height=640".to_string(),
        "--render-debug-log=render.log".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.font_size, Some(18.0));
    assert_eq!(flags.max_image_height, Some(640));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_config_union_merges_booleans() {
    let file = ConfigFlags {
        taps: true,
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags {
        perf: true,
        ..ConfigFlags::default()
    };
    let merged = file.union(&cli);
    assert!(merged.taps);
    assert!(merged.perf);
}

#[test]
fn test_effective_flags_drive_render_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".htmltextrc");
    std::fs::write(&path, "--width 200\n--density 2\n").unwrap();

    let options = load_config_flags(&path).unwrap().render_options();
    let block = htmltext::render_html(r#"<img width="300" height="100" src="a.png">"#, &options);
    let image = match &block.lines()[0].items()[0] {
        htmltext::layout::InlineItem::Image(image) => image,
        other => panic!("expected image, got {other:?}"),
    };
    // 600px declared, scaled into a 400px line
    assert_eq!((image.width, image.height), (400, 133));
}
