mod console;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use beacon_control::{ControlConfig, ControlLaw};
use beacon_fc::sim::{SimConfig, SimVehicle};
use beacon_fc::{ControlLoop, FlightStateMachine, FlightStatus, LoopConfig};
use beacon_proto::control::{ControlOutput, PendingAction};
use beacon_proto::detection::DetectionResult;
use beacon_proto::frame::RawFrame;
use beacon_proto::telemetry::{StatusEvent, VehicleStatus};
use beacon_vision::pipeline::FramePipeline;
use beacon_vision::{overlay, ColorDetector, ColorImage, DetectorConfig, TargetProfile};

use crate::console::ConsoleCommand;

#[derive(Debug, Parser)]
#[command(name = "beacon", version, about = "beacon - follow a colored target with a camera drone")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the configuration file.
    Doctor,
    /// Fly the simulated vehicle. Operator commands are read from stdin.
    Run {
        /// Write the processed view of the last detected frame here on exit.
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
    /// Run the detector on a still image and print the result as JSON.
    Detect {
        image: PathBuf,
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Config {
    flight: LoopConfig,
    profile: TargetProfile,
    detector: DetectorConfig,
    control: ControlConfig,
    sim: SimConfig,
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    toml::from_str(&s).context("parse config toml")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Run { overlay } => run(cfg, overlay).await?,
        Command::Detect { image, overlay } => detect(&cfg, &image, overlay.as_deref())?,
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    let d = &cfg.detector;
    anyhow::ensure!(d.frame_width > 0 && d.frame_height > 0, "detector frame size must be non-zero");
    anyhow::ensure!(d.kernel_radius > 0, "detector.kernel_radius must be > 0");
    anyhow::ensure!(d.fov_fraction > 0.0 && d.fov_fraction <= 1.0, "detector.fov_fraction outside (0, 1]");
    anyhow::ensure!(d.extent_scale > 0.0, "detector.extent_scale must be > 0");
    anyhow::ensure!(d.frame_skip >= 1, "detector.frame_skip must be >= 1");

    cfg.profile.validate().context("profile")?;

    let c = &cfg.control;
    anyhow::ensure!(
        (c.frame_width, c.frame_height) == (d.frame_width, d.frame_height),
        "control frame {}x{} does not match detector frame {}x{}",
        c.frame_width, c.frame_height, d.frame_width, d.frame_height
    );
    anyhow::ensure!(c.yaw_max >= 0.0 && c.vertical_max >= 0.0, "control limits must be >= 0");
    anyhow::ensure!(c.extent_tolerance >= 0.0 && c.tilt_step >= 0.0, "forward/back band must be >= 0");

    anyhow::ensure!(cfg.flight.tick_ms > 0, "flight.tick_ms must be > 0");
    anyhow::ensure!(cfg.flight.connect_timeout_ms > 0, "flight.connect_timeout_ms must be > 0");

    let s = &cfg.sim;
    anyhow::ensure!(s.fps > 0, "sim.fps must be > 0");
    anyhow::ensure!(s.width >= 4 && s.height >= 4, "sim frame {}x{} too small (min 4x4)", s.width, s.height);
    if (s.width, s.height) != (d.frame_width, d.frame_height) {
        warn!("doctor: sim renders {}x{}, detector expects {}x{}", s.width, s.height, d.frame_width, d.frame_height);
    }

    info!("doctor: OK");
    Ok(())
}

fn detect(cfg: &Config, path: &Path, overlay_out: Option<&Path>) -> Result<()> {
    let img = image::open(path)
        .with_context(|| format!("open image {}", path.display()))?
        .to_rgb8();
    let frame = ColorImage::from_rgb8(&img)?;

    let mut detector = ColorDetector::new(cfg.detector.clone());
    let res = detector.detect(&frame, &cfg.profile)?;
    println!("{}", serde_json::to_string_pretty(&res)?);

    if let Some(out) = overlay_out {
        overlay::render(&frame, detector.density(), &res)
            .save(out)
            .with_context(|| format!("write overlay {}", out.display()))?;
        info!("detect: overlay written to {}", out.display());
    }
    Ok(())
}

async fn run(cfg: Config, overlay_out: Option<PathBuf>) -> Result<()> {
    info!("run: starting");
    cfg.profile.validate().context("profile")?;

    let (profile_tx, profile_rx) = watch::channel(cfg.profile);
    let (det_tx, det_rx) = watch::channel(DetectionResult::none());
    let (snap_tx, snap_rx) = watch::channel::<Option<ColorImage>>(None);
    let status = Arc::new(FlightStatus::new());

    let mut pipeline = FramePipeline::new(cfg.detector.clone(), profile_rx, det_tx).with_snapshots(snap_tx);
    let telemetry = status.clone();
    let vehicle = SimVehicle::new(
        cfg.sim.clone(),
        Box::new(move |frame: &RawFrame<'_>| pipeline.on_frame(frame)),
        Box::new(move |st: VehicleStatus| telemetry.on_status(st)),
    );

    let machine = FlightStateMachine::new(cfg.flight.clone(), ControlLaw::new(&cfg.control), status.clone(), det_rx.clone());
    let outputs = machine.outputs();
    let running = Arc::new(AtomicBool::new(true));
    let ctl = ControlLoop::new(vehicle, machine, running.clone());
    let mut fc = tokio::task::spawn_blocking(move || ctl.run());

    {
        let running = running.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("run: interrupted");
                running.store(false, Ordering::Release);
            }
        });
    }

    let mut lines = console_lines();
    let mut report = tokio::time::interval(Duration::from_secs(1));

    let outcome = loop {
        tokio::select! {
            joined = &mut fc => break joined,
            Some(line) = lines.recv() => on_console(&line, &status, &profile_tx, &running, &det_rx, &outputs)?,
            _ = report.tick() => print_status(&status, &det_rx, &outputs)?,
        }
    };

    let (_vehicle, res) = outcome.context("control thread panicked")?;
    print_status(&status, &det_rx, &outputs)?;

    if let Some(out) = overlay_out {
        write_snapshot(&cfg, &profile_tx.borrow(), &snap_rx.borrow(), &out)?;
    }
    res.context("flight loop")?;
    info!("run: done");
    Ok(())
}

/// Stdin is read on a plain thread so a pending read never holds up shutdown.
fn console_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    let spawned = std::thread::Builder::new().name("console".into()).spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() { break; }
                }
                Err(e) => {
                    warn!("console: stdin closed: {}", e);
                    break;
                }
            }
        }
    });
    if let Err(e) = spawned {
        warn!("console: disabled: {}", e);
    }
    rx
}

fn on_console(
    line: &str,
    status: &FlightStatus,
    profile: &watch::Sender<TargetProfile>,
    running: &AtomicBool,
    det: &watch::Receiver<DetectionResult>,
    outputs: &watch::Receiver<ControlOutput>,
) -> Result<()> {
    let cmd = match console::parse(line) {
        Ok(Some(cmd)) => cmd,
        Ok(None) => return Ok(()),
        Err(e) => {
            warn!("console: {:#}", e);
            return Ok(());
        }
    };
    match cmd {
        ConsoleCommand::TakeOff => status.request(PendingAction::TakeOff),
        ConsoleCommand::Land => status.request(PendingAction::Land),
        ConsoleCommand::Set(field, value) => {
            let current = *profile.borrow();
            match current.with_field(field, &value) {
                Ok(next) => {
                    profile.send_replace(next);
                    info!("console: {} = {}", field, next.get(field));
                }
                Err(e) => warn!("console: {}; keeping {} = {}", e, field, current.get(field)),
            }
        }
        ConsoleCommand::Status => print_status(status, det, outputs)?,
        ConsoleCommand::Quit => {
            info!("console: quit");
            running.store(false, Ordering::Release);
        }
    }
    Ok(())
}

fn print_status(
    status: &FlightStatus,
    det: &watch::Receiver<DetectionResult>,
    outputs: &watch::Receiver<ControlOutput>,
) -> Result<()> {
    let snap = status.snapshot();
    let ev = StatusEvent {
        ts_unix_ms: (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64,
        phase: snap.phase.to_string(),
        connected: snap.connected,
        flying: snap.flying,
        battery_percent: snap.battery_percent,
        battery: snap.battery_level(),
        detection: *det.borrow(),
        output: *outputs.borrow(),
    };
    println!("{}", serde_json::to_string(&ev)?);
    Ok(())
}

fn write_snapshot(cfg: &Config, profile: &TargetProfile, frame: &Option<ColorImage>, out: &Path) -> Result<()> {
    let Some(frame) = frame else {
        warn!("run: no frame was detected, overlay not written");
        return Ok(());
    };
    let mut detector = ColorDetector::new(cfg.detector.clone());
    let res = detector.detect(frame, profile)?;
    overlay::render(frame, detector.density(), &res)
        .save(out)
        .with_context(|| format!("write overlay {}", out.display()))?;
    info!("run: overlay written to {}", out.display());
    Ok(())
}
