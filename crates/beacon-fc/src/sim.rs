use beacon_proto::frame::RawFrame;
use beacon_proto::telemetry::VehicleStatus;
use rand::Rng;
use serde::Deserialize;
use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::vehicle::{FrameSink, LedSignal, StatusSink, Vehicle, VehicleError, VideoChannel};

const CONTROL_PORT: u16 = 5556;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Optional host to resolve on connect (exercises the resolution path).
    pub host: Option<String>,

    pub width: u32,
    pub height: u32,
    pub fps: u32,

    pub target_rgb: [u8; 3],
    pub background_rgb: [u8; 3],
    /// Per-channel uniform noise amplitude.
    pub noise: u8,

    /// Where the target disk starts on screen.
    pub start_x: f64,
    pub start_y: f64,
    pub start_radius: f64,

    pub ready_delay_ms: u64,
    pub takeoff_ms: u64,
    pub land_ms: u64,

    /// Screen-space response to a full-scale (1.0) command, per second.
    pub yaw_px_per_s: f64,
    pub climb_px_per_s: f64,
    pub approach_px_per_s: f64,
    /// Random walk of the target while airborne.
    pub drift_px_per_s: f64,

    pub battery_drain_per_min: f64,
    pub telemetry_every_n_frames: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            host: None,
            width: 320,
            height: 240,
            fps: 30,
            target_rgb: [47, 124, 90],
            background_rgb: [128, 128, 128],
            noise: 4,
            start_x: 220.0,
            start_y: 90.0,
            start_radius: 12.0,
            ready_delay_ms: 200,
            takeoff_ms: 1500,
            land_ms: 1500,
            yaw_px_per_s: 160.0,
            climb_px_per_s: 120.0,
            approach_px_per_s: 40.0,
            drift_px_per_s: 8.0,
            battery_drain_per_min: 4.0,
            telemetry_every_n_frames: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimSnapshot {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub flying: bool,
    pub battery: f64,
    pub led: Option<LedSignal>,
    /// left/right, front/back, vertical, yaw
    pub command: [f32; 4],
}

#[derive(Debug)]
struct World {
    x: f64,
    y: f64,
    radius: f64,
    command: [f32; 4],
    flying: bool,
    // (airborne after transition, when)
    transition: Option<(bool, Instant)>,
    battery: f64,
    ready: bool,
    led: Option<LedSignal>,
}

impl World {
    fn new(cfg: &SimConfig) -> Self {
        Self {
            x: cfg.start_x,
            y: cfg.start_y,
            radius: cfg.start_radius,
            command: [0.0; 4],
            flying: false,
            transition: None,
            battery: 100.0,
            ready: false,
            led: None,
        }
    }

    fn step(&mut self, cfg: &SimConfig, dt: f64, rng: &mut impl Rng) {
        if let Some((to, at)) = self.transition {
            if Instant::now() >= at {
                self.flying = to;
                self.transition = None;
                if !to { self.command = [0.0; 4]; }
            }
        }
        if !self.flying { return; }

        let [_, front_back, vertical, yaw] = self.command.map(|c| c as f64);
        // turning right moves the target left on screen, climbing moves it down,
        // nose-down (negative tilt) closes in
        self.x -= yaw * cfg.yaw_px_per_s * dt;
        self.y += vertical * cfg.climb_px_per_s * dt;
        self.radius -= front_back * cfg.approach_px_per_s * dt;

        self.x += rng.gen_range(-1.0..=1.0) * cfg.drift_px_per_s * dt;
        self.y += rng.gen_range(-1.0..=1.0) * cfg.drift_px_per_s * dt;

        let (w, h) = (cfg.width as f64, cfg.height as f64);
        self.radius = self.radius.clamp(2.0, (w / 2.0).max(2.0));
        self.x = self.x.clamp(-self.radius, w + self.radius);
        self.y = self.y.clamp(-self.radius, h + self.radius);
        self.battery = (self.battery - cfg.battery_drain_per_min * dt / 60.0).max(0.0);
    }

    fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            x: self.x,
            y: self.y,
            radius: self.radius,
            flying: self.flying,
            battery: self.battery,
            led: self.led,
            command: self.command,
        }
    }
}

struct Sinks {
    frame: FrameSink,
    status: StatusSink,
}

/// In-process vehicle: renders a target-colored disk that reacts to the
/// commands it receives, and reports flying/battery telemetry.
pub struct SimVehicle {
    cfg: SimConfig,
    world: Arc<Mutex<World>>,
    alive: Arc<AtomicBool>,
    sinks: Option<Sinks>,
    pump: Option<JoinHandle<Sinks>>,
}

impl SimVehicle {
    pub fn new(cfg: SimConfig, frame: FrameSink, status: StatusSink) -> Self {
        let world = Arc::new(Mutex::new(World::new(&cfg)));
        Self {
            cfg,
            world,
            alive: Arc::new(AtomicBool::new(false)),
            sinks: Some(Sinks { frame, status }),
            pump: None,
        }
    }

    pub fn snapshot(&self) -> Result<SimSnapshot, VehicleError> {
        Ok(self.world()?.snapshot())
    }

    fn world(&self) -> Result<MutexGuard<'_, World>, VehicleError> {
        self.world.lock().map_err(|_| VehicleError::Link("sim state poisoned".into()))
    }

    fn connected(&self, command: &'static str) -> Result<(), VehicleError> {
        if self.pump.is_none() {
            return Err(VehicleError::Link(format!("{}: not connected", command)));
        }
        Ok(())
    }
}

impl Vehicle for SimVehicle {
    fn connect(&mut self) -> Result<(), VehicleError> {
        if let Some(host) = &self.cfg.host {
            let resolved = (host.as_str(), CONTROL_PORT)
                .to_socket_addrs()
                .map_err(|e| VehicleError::Resolve { host: host.clone(), reason: e.to_string() })?;
            if resolved.count() == 0 {
                return Err(VehicleError::Resolve { host: host.clone(), reason: "no addresses".into() });
            }
        }
        if self.pump.is_some() { return Ok(()); }

        let sinks = self
            .sinks
            .take()
            .ok_or_else(|| VehicleError::Link("frame/status sinks lost".into()))?;
        *self.world()? = World::new(&self.cfg);
        self.alive.store(true, Ordering::Release);

        let cfg = self.cfg.clone();
        let world = self.world.clone();
        let alive = self.alive.clone();
        let handle = std::thread::Builder::new()
            .name("sim-vehicle".into())
            .spawn(move || pump(cfg, world, alive, sinks))?;
        self.pump = Some(handle);
        info!("sim: connected ({}x{} @ {} fps)", self.cfg.width, self.cfg.height, self.cfg.fps);
        Ok(())
    }

    fn wait_for_ready(&mut self, timeout: Duration) -> Result<(), VehicleError> {
        self.connected("wait_for_ready")?;
        let deadline = Instant::now() + timeout;
        loop {
            if self.world()?.ready { return Ok(()); }
            if Instant::now() >= deadline {
                return Err(VehicleError::Timeout(timeout));
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn disconnect(&mut self) -> Result<(), VehicleError> {
        self.alive.store(false, Ordering::Release);
        if let Some(handle) = self.pump.take() {
            let sinks = handle
                .join()
                .map_err(|_| VehicleError::Link("sim pump thread panicked".into()))?;
            self.sinks = Some(sinks);
            info!("sim: disconnected");
        }
        Ok(())
    }

    fn clear_emergency(&mut self) -> Result<(), VehicleError> {
        self.connected("clear_emergency")
    }

    fn select_video_channel(&mut self, channel: VideoChannel) -> Result<(), VehicleError> {
        self.connected("select_video_channel")?;
        debug!("sim: video channel {:?}", channel);
        Ok(())
    }

    fn set_combined_yaw_mode(&mut self, enabled: bool) -> Result<(), VehicleError> {
        self.connected("set_combined_yaw_mode")?;
        debug!("sim: combined yaw {}", enabled);
        Ok(())
    }

    fn trim(&mut self) -> Result<(), VehicleError> {
        self.connected("trim")
    }

    fn take_off(&mut self) -> Result<(), VehicleError> {
        self.connected("take_off")?;
        let delay = Duration::from_millis(self.cfg.takeoff_ms);
        let mut w = self.world()?;
        if w.battery <= 0.0 {
            return Err(VehicleError::Command { command: "take_off", reason: "battery empty".into() });
        }
        w.transition = Some((true, Instant::now() + delay));
        Ok(())
    }

    fn land(&mut self) -> Result<(), VehicleError> {
        self.connected("land")?;
        let delay = Duration::from_millis(self.cfg.land_ms);
        let mut w = self.world()?;
        w.command = [0.0; 4];
        w.transition = Some((false, Instant::now() + delay));
        Ok(())
    }

    fn hover(&mut self) -> Result<(), VehicleError> {
        self.connected("hover")?;
        self.world()?.command = [0.0; 4];
        Ok(())
    }

    fn move_axes(&mut self, left_right: f32, front_back: f32, vertical: f32, yaw: f32) -> Result<(), VehicleError> {
        self.connected("move")?;
        let mut w = self.world()?;
        if !w.flying {
            return Err(VehicleError::Command { command: "move", reason: "not airborne".into() });
        }
        w.command = [left_right, front_back, vertical, yaw];
        Ok(())
    }

    fn set_led(&mut self, signal: LedSignal) -> Result<(), VehicleError> {
        self.connected("set_led")?;
        self.world()?.led = Some(signal);
        Ok(())
    }
}

impl Drop for SimVehicle {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

fn pump(cfg: SimConfig, world: Arc<Mutex<World>>, alive: Arc<AtomicBool>, mut sinks: Sinks) -> Sinks {
    let (w, h) = (cfg.width.max(1), cfg.height.max(1));
    let period = Duration::from_secs_f64(1.0 / cfg.fps.max(1) as f64);
    let ready_after = Duration::from_millis(cfg.ready_delay_ms);
    let every = cfg.telemetry_every_n_frames.max(1) as u64;

    let mut rng = rand::thread_rng();
    let mut pixels = vec![0u32; w as usize * h as usize];
    let started = Instant::now();
    let mut last = started;
    let mut frame_no: u64 = 0;

    while alive.load(Ordering::Acquire) {
        let t0 = Instant::now();
        let dt = t0.duration_since(last).as_secs_f64();
        last = t0;

        let snap = {
            let mut g = match world.lock() {
                Ok(g) => g,
                Err(p) => p.into_inner(),
            };
            if !g.ready && started.elapsed() >= ready_after {
                g.ready = true;
            }
            g.step(&cfg, dt, &mut rng);
            (g.ready, g.snapshot())
        };
        let (ready, snap) = snap;

        render(&cfg, &snap, &mut pixels, &mut rng);
        (sinks.frame)(&RawFrame { x: 0, y: 0, width: w, height: h, pixels: &pixels, offset: 0, stride: w as usize });

        if ready && frame_no % every == 0 {
            (sinks.status)(VehicleStatus { battery_percent: snap.battery.round() as u8, flying: snap.flying });
        }
        frame_no += 1;

        if let Some(rest) = period.checked_sub(t0.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    sinks
}

fn render(cfg: &SimConfig, snap: &SimSnapshot, pixels: &mut [u32], rng: &mut impl Rng) {
    let w = cfg.width.max(1) as usize;
    let r2 = snap.radius * snap.radius;
    let n = cfg.noise as i32;
    for (i, px) in pixels.iter_mut().enumerate() {
        let dx = (i % w) as f64 - snap.x;
        let dy = (i / w) as f64 - snap.y;
        let base = if dx * dx + dy * dy <= r2 { cfg.target_rgb } else { cfg.background_rgb };
        let mut word = 0u32;
        for c in base {
            let jitter = if n > 0 { rng.gen_range(-n..=n) } else { 0 };
            word = (word << 8) | (c as i32 + jitter).clamp(0, 255) as u32;
        }
        *px = word;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    fn quick() -> SimConfig {
        SimConfig { fps: 200, ready_delay_ms: 0, takeoff_ms: 0, land_ms: 0, noise: 0, drift_px_per_s: 0.0, ..Default::default() }
    }

    fn wait_until(mut f: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if f() { return true; }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn frames_and_telemetry_flow_after_connect() {
        let frames = Arc::new(AtomicU64::new(0));
        let flying = Arc::new(AtomicBool::new(false));
        let (f2, fl2) = (frames.clone(), flying.clone());
        let mut sim = SimVehicle::new(
            quick(),
            Box::new(move |fr: &RawFrame<'_>| {
                assert_eq!((fr.width, fr.height), (320, 240));
                f2.fetch_add(1, Ordering::Relaxed);
            }),
            Box::new(move |st: VehicleStatus| fl2.store(st.flying, Ordering::Relaxed)),
        );

        sim.connect().unwrap();
        sim.wait_for_ready(Duration::from_secs(2)).unwrap();
        assert!(wait_until(|| frames.load(Ordering::Relaxed) > 3));

        sim.take_off().unwrap();
        assert!(wait_until(|| flying.load(Ordering::Relaxed)));
        sim.disconnect().unwrap();

        let seen = frames.load(Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(frames.load(Ordering::Relaxed), seen, "frames after disconnect");
    }

    #[test]
    fn commands_require_a_connection() {
        let mut sim = SimVehicle::new(quick(), Box::new(|_: &RawFrame<'_>| {}), Box::new(|_| {}));
        assert!(matches!(sim.hover(), Err(VehicleError::Link(_))));
        assert!(matches!(sim.wait_for_ready(Duration::from_millis(1)), Err(VehicleError::Link(_))));
    }

    #[test]
    fn ready_wait_times_out() {
        let cfg = SimConfig { ready_delay_ms: 60_000, ..quick() };
        let mut sim = SimVehicle::new(cfg, Box::new(|_: &RawFrame<'_>| {}), Box::new(|_| {}));
        sim.connect().unwrap();
        let err = sim.wait_for_ready(Duration::from_millis(30)).unwrap_err();
        assert!(matches!(err, VehicleError::Timeout(_)));
    }

    #[test]
    fn move_is_rejected_on_the_ground_and_steers_in_the_air() {
        let mut sim = SimVehicle::new(quick(), Box::new(|_: &RawFrame<'_>| {}), Box::new(|_| {}));
        sim.connect().unwrap();
        sim.wait_for_ready(Duration::from_secs(2)).unwrap();

        let err = sim.move_axes(0.0, 0.0, 0.0, 0.5).unwrap_err();
        assert!(!err.is_fatal());

        sim.take_off().unwrap();
        assert!(wait_until(|| sim.snapshot().map(|s| s.flying).unwrap_or(false)));
        let x0 = sim.snapshot().unwrap().x;
        sim.move_axes(0.0, 0.0, 0.0, 0.5).unwrap();
        // yawing right pushes the target left
        assert!(wait_until(|| sim.snapshot().map(|s| s.x < x0 - 5.0).unwrap_or(false)));
        sim.hover().unwrap();
        assert_eq!(sim.snapshot().unwrap().command, [0.0; 4]);
    }

    #[test]
    fn tiny_frames_keep_the_disk_in_bounds() {
        let cfg = SimConfig { width: 2, height: 2, start_radius: 50.0, ..quick() };
        let mut world = World::new(&cfg);
        world.flying = true;
        world.command = [0.0, -1.0, 0.0, 0.0];
        world.step(&cfg, 1.0, &mut rand::thread_rng());
        assert_eq!(world.radius, 2.0);
        assert!(world.x.is_finite() && world.y.is_finite());
    }

    #[test]
    fn rendered_disk_uses_target_color() {
        let cfg = quick();
        let snap = World::new(&cfg).snapshot();
        let mut pixels = vec![0u32; 320 * 240];
        render(&cfg, &snap, &mut pixels, &mut rand::thread_rng());
        let at = |x: usize, y: usize| pixels[y * 320 + x];
        let [r, g, b] = cfg.target_rgb;
        assert_eq!(at(220, 90), (r as u32) << 16 | (g as u32) << 8 | b as u32);
        assert_eq!(at(0, 0), 0x808080);
    }
}
