mod cli;
mod config;
mod encode;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use cli::Cli;
use encode::ffmpeg::{EncodeSettings, FfmpegEncoder};
use staticscope::render::grid::TEXT_COLOR;
use staticscope::render::instruction::{
    Color, DrawList, Font, MonospaceMetrics, Point, Rect, TextAlign, TextBaseline, TextMetrics, TextRun,
};
use staticscope::render::layout::Layout;
use staticscope::render::surface::SoftwareSurface;
use staticscope::render::text::TextOverlay;
use staticscope::view::scope::BACKGROUND;
use staticscope::view::table::{ChannelTable, ExportTable};
use staticscope::{DrawSnapshot, Frame, ScopeError, ScopeOptions, StaticScope};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect staticscope.toml / global config
    let config_path = cli.config.clone().or_else(config::discover_config);
    let mut cfg = config::Config::default();
    if let Some(ref path) = config_path {
        if let Some(loaded) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            cfg = loaded;
            // Merge: config values apply only when CLI is at its default
            if cli.width == 800 { cli.width = cfg.surface.width; }
            if cli.height == 400 { cli.height = cfg.surface.height; }
            if cli.fps == 30 { cli.fps = cfg.output.fps; }
            if cli.crf == 18 { cli.crf = cfg.output.crf; }
            if cli.codec == "libx264" { cli.codec = cfg.output.codec.clone(); }
            if cli.pix_fmt == "yuv420p" { cli.pix_fmt = cfg.output.pix_fmt.clone(); }
            if cli.font.is_none() {
                cli.font = cfg.text.font.clone();
            }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let input = cli.input.as_ref().context("Snapshot stream is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("staticscope - scope snapshot renderer");
    log::info!("Input: {}", input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!("Resolution: {}x{} @ {}fps", cli.width, cli.height, cli.fps);

    // 1. Read snapshots
    let snapshots = read_snapshots(input)?;
    if snapshots.is_empty() {
        anyhow::bail!("No snapshots in {}", input.display());
    }
    log::info!("Loaded {} snapshots", snapshots.len());

    // 2. Text
    let text = cli.font.as_deref().and_then(|path| {
        let overlay = TextOverlay::from_file(path).and_then(|overlay| match cfg.text.bold_font.as_deref() {
            Some(bold) => overlay.with_bold(bold),
            None => Ok(overlay),
        });
        match overlay {
            Ok(overlay) => Some(overlay),
            Err(err) => {
                log::warn!("{}", err);
                None
            }
        }
    });

    // 3. Scope and surface
    let layout = Layout {
        width: cli.width as f64,
        height: cli.height as f64,
        left: cfg.layout.left,
        bottom: cfg.layout.bottom,
    };
    let mut scope = StaticScope::new(ScopeOptions {
        mode: cli.mode.unwrap_or(cfg.scope.mode),
        spectrogram_enabled: cfg.scope.spectrogram && !cli.no_spectrogram,
        layout,
    });
    log::info!("Mode: {}", scope.mode());
    let mut surface = SoftwareSurface::new(cli.width, cli.height, text)?;
    let fallback = MonospaceMetrics::default();

    // 4. Encoder
    log::info!("Starting FFmpeg encoder...");
    let mut encoder = FfmpegEncoder::new(
        &cli.output,
        &EncodeSettings {
            width: cli.width,
            height: cli.height,
            fps: cli.fps,
            codec: &cli.codec,
            pix_fmt: &cli.pix_fmt,
            crf: cli.crf,
            bitrate: cli.bitrate.as_deref(),
        },
    )?;

    // 5. Render loop
    let pb = ProgressBar::new(snapshots.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} snapshots ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    for (idx, snapshot) in snapshots.into_iter().enumerate() {
        scope.update(snapshot);
        if idx == 0 {
            apply_initial_view(&mut scope, &cli);
        }

        let frame = {
            let metrics: &dyn TextMetrics = match surface.text() {
                Some(text) => text,
                None => &fallback,
            };
            scope.frame(metrics)
        };
        match frame {
            Some(Frame::Canvas { scene, overlay }) => {
                surface.execute(&scene, Some(scope.texture()));
                surface.execute(&overlay, None);
            }
            Some(Frame::Table(tables)) => {
                surface.execute(&table_scene(&tables, scope.layout()), None);
            }
            None => {}
        }

        encoder.write_frame(surface.pixels())?;
        pb.set_position(idx as u64 + 1);
    }

    pb.finish_with_message("Rendering complete");

    // 6. Finish encoding
    log::info!("Finishing encoding...");
    encoder.finish()?;

    // 7. Export the last snapshot
    if let Some(ref path) = cli.export {
        match scope.export_table() {
            Some(table) => {
                write_csv(path, &table)?;
                log::info!("Exported {} rows to {}", table.rows.len(), path.display());
            }
            None => log::warn!("Nothing to export for mode {}", scope.mode()),
        }
    }

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}

fn read_snapshots(path: &Path) -> Result<Vec<DrawSnapshot>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut snapshots = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let snapshot = serde_json::from_str(&line)
            .map_err(|source| ScopeError::Snapshot { line: i + 1, source })?;
        snapshots.push(snapshot);
    }
    Ok(snapshots)
}

fn apply_initial_view(scope: &mut StaticScope, cli: &Cli) {
    if let [x, y] = cli.cursor[..] {
        scope.pointer_move(Point::new(x, y));
    } else if !cli.cursor.is_empty() {
        log::warn!("Ignoring --cursor, expected x,y");
    }
    scope.set_zoom(cli.zoom);
    scope.set_offset(cli.offset);
    scope.set_vertical_zoom(cli.vzoom);
}

/// Data mode drawn as text columns, one per channel.
fn table_scene(tables: &[ChannelTable], layout: &Layout) -> DrawList {
    const ROW: f64 = 15.0;
    let mut list = DrawList::new();
    list.fill_rect(Rect::new(0.0, 0.0, layout.width, layout.height), BACKGROUND);
    if tables.is_empty() {
        return list;
    }
    let column_w = layout.width / tables.len() as f64;
    let visible = (layout.height / ROW).floor() as usize;
    for (ch, table) in tables.iter().enumerate() {
        let x = ch as f64 * column_w;
        if tables.len() > 1 {
            list.fill_rect(
                Rect::new(x, 0.0, column_w, layout.height),
                Color::hsl(ch as f64 * 60.0, 100.0, 10.0),
            );
        }
        for (i, row) in table.rows.iter().take(visible).enumerate() {
            let y = i as f64 * ROW;
            if row.highlight {
                list.fill_rect(Rect::new(x, y, column_w, ROW), Color::rgba(255, 136, 0, 96));
            }
            for (text, tx, align) in [
                (row.index.to_string(), x + 5.0, TextAlign::Left),
                (format!("{:.7}", row.value), x + column_w - 5.0, TextAlign::Right),
            ] {
                list.text(TextRun {
                    text,
                    x: tx,
                    y: y + ROW / 2.0,
                    align,
                    baseline: TextBaseline::Middle,
                    font: Font::AXIS,
                    color: TEXT_COLOR,
                    max_width: None,
                });
            }
        }
    }
    list
}

fn write_csv(path: &Path, table: &ExportTable) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{}", table.header.join(","))?;
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", cells.join(","))?;
    }
    out.flush().context("Failed to write export")?;
    Ok(())
}
