//! Stageview - headless viewer session
//!
//! Loads a model (path or URL), optionally an HDR environment and saved
//! settings, runs a few frames and writes a square PNG capture.

use stageview::assets::AssetSource;
use stageview::render::Viewport;
use stageview::scene::serialization::{load_exported_config_from_file, load_session_config_from_file};
use stageview::ui::format_dimensions;
use stageview::{HostCapabilities, LoadOutcome, SessionConfig, ViewerError, ViewerSession, ViewerTuning};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const USAGE: &str = "usage: stageview [MODEL] [--config session.json] [--settings exported.json] \
[--hdr env.hdr] [--frames N] [--out capture.png] [--full-scene]";

#[derive(Debug, Default)]
struct Args {
    model: Option<String>,
    config: Option<PathBuf>,
    settings: Option<PathBuf>,
    hdr: Option<String>,
    frames: u32,
    out: Option<PathBuf>,
    full_scene: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        frames: 1,
        ..Args::default()
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| iter.next().ok_or_else(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "--config" => args.config = Some(value("--config")?.into()),
            "--settings" => args.settings = Some(value("--settings")?.into()),
            "--hdr" => args.hdr = Some(value("--hdr")?),
            "--out" => args.out = Some(value("--out")?.into()),
            "--frames" => {
                let raw = value("--frames")?;
                args.frames = raw
                    .parse()
                    .map_err(|_| format!("invalid frame count '{}'", raw))?;
            }
            "--full-scene" => args.full_scene = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => return Err(format!("unknown flag {}\n{}", flag, USAGE)),
            _ if args.model.is_none() => args.model = Some(arg),
            _ => return Err(USAGE.to_string()),
        }
    }
    Ok(args)
}

fn run(args: Args) -> Result<(), ViewerError> {
    let config = match &args.config {
        Some(path) => load_session_config_from_file(path)?,
        None => SessionConfig::default(),
    };
    let tuning = if args.full_scene {
        ViewerTuning::full_scene()
    } else {
        ViewerTuning::default()
    };
    let caps = HostCapabilities::preview(Viewport {
        width: 800,
        height: 600,
    });
    let mut session = ViewerSession::new(config, tuning, caps);

    if let Some(hdr) = &args.hdr {
        if let LoadOutcome::Failed(message) = session.load_environment(AssetSource::from_location(hdr)) {
            log::warn!("continuing without environment: {}", message);
        }
    }

    let outcome = match &args.model {
        Some(model) => session.load_model(AssetSource::from_location(model)),
        None => session
            .start()
            .unwrap_or_else(|| session.load_default_cube()),
    };
    if let LoadOutcome::Failed(message) = &outcome {
        log::error!("{}: {}", session.banner().text(), message);
    }

    if let Some(path) = &args.settings {
        let settings = load_exported_config_from_file(path)?;
        session.apply_settings(&settings)?;
    }

    let start = Instant::now();
    for i in 0..args.frames {
        session.frame(start + Duration::from_millis(16 * u64::from(i)))?;
    }

    if let Some(info) = session.model_info() {
        for line in info.lines() {
            println!("{}", line);
        }
    } else if let Some(dims) = session.compute_dimensions() {
        println!("Dimensions: {}", format_dimensions(dims));
    }
    let clips = session.animation().clip_names();
    if !clips.is_empty() {
        println!("Animations: {}", clips.join(", "));
    }
    println!("{}", session.export_settings_json()?);

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(session.capture_file_name()));
    session.capture_to_file(&out)?;
    session.teardown();
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    log::info!("Stageview {}", env!("CARGO_PKG_VERSION"));
    if let Err(err) = run(args) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
