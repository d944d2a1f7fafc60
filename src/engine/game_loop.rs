/// Fixed-timestep driver for the rig
///
/// Rendered frames arrive at whatever rate the host manages; the physics tick
/// (pose reset, hit overlay, engine step, collision routing) always runs at a
/// fixed rate so every decay in the rig sees the same dt.
use std::time::{Duration, Instant};

/// Physics tick rate (60 ticks per second)
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;
const FIXED_TIMESTEP_DURATION: Duration = Duration::from_micros(16_667);

/// Maximum number of physics ticks per frame to prevent spiral of death
const MAX_PHYSICS_STEPS: u32 = 5;

/// FPS tracking window (average over last N frames)
const FPS_WINDOW_SIZE: usize = 60;

/// Game loop timing state
#[derive(Debug)]
pub struct GameLoop {
    /// Unsimulated time carried between frames
    accumulator: Duration,
    last_frame_time: Instant,
    /// Simulated time, advanced only by fixed ticks
    sim_time: Duration,
    paused: bool,
    /// Frame timing history for FPS calculation
    frame_times: Vec<Duration>,
    frame_count: u64,
    tick_count: u64,
    /// Ticks dropped by the per-frame cap
    dropped_ticks: u64,
    current_fps: f32,
    frame_delta_time: f32,
}

impl GameLoop {
    pub fn new() -> Self {
        Self {
            accumulator: Duration::ZERO,
            last_frame_time: Instant::now(),
            sim_time: Duration::ZERO,
            paused: false,
            frame_times: Vec::with_capacity(FPS_WINDOW_SIZE),
            frame_count: 0,
            tick_count: 0,
            dropped_ticks: 0,
            current_fps: 0.0,
            frame_delta_time: 0.0,
        }
    }

    /// Begin a frame driven by the wall clock, returns the number of physics
    /// ticks to run
    pub fn begin_frame(&mut self) -> u32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame_time);
        self.last_frame_time = now;
        self.advance(frame_time)
    }

    /// Begin a frame of a known length (headless or replay driving), returns
    /// the number of physics ticks to run
    pub fn advance(&mut self, frame_time: Duration) -> u32 {
        self.frame_count += 1;
        self.frame_times.push(frame_time);
        if self.frame_times.len() > FPS_WINDOW_SIZE {
            self.frame_times.remove(0);
        }
        if self.frame_count % 10 == 0 {
            self.update_fps();
        }
        self.frame_delta_time = frame_time.as_secs_f32();

        if self.paused {
            return 0;
        }

        self.accumulator += frame_time;
        let mut ticks = 0;
        while self.accumulator >= FIXED_TIMESTEP_DURATION && ticks < MAX_PHYSICS_STEPS {
            self.accumulator -= FIXED_TIMESTEP_DURATION;
            ticks += 1;
        }

        // Whatever the cap left behind is discarded rather than replayed
        if self.accumulator >= FIXED_TIMESTEP_DURATION {
            let behind = (self.accumulator.as_micros() / FIXED_TIMESTEP_DURATION.as_micros()) as u64;
            self.dropped_ticks += behind;
            log::debug!("Physics fell behind, dropping {} ticks", behind);
            self.accumulator = Duration::from_micros(
                (self.accumulator.as_micros() % FIXED_TIMESTEP_DURATION.as_micros()) as u64,
            );
        }

        self.tick_count += ticks as u64;
        self.sim_time += FIXED_TIMESTEP_DURATION * ticks;
        ticks
    }

    /// Fixed physics dt in seconds
    pub fn fixed_timestep(&self) -> f32 {
        FIXED_TIMESTEP
    }

    /// Length of the last frame in seconds
    pub fn frame_delta_time(&self) -> f32 {
        self.frame_delta_time
    }

    /// Fraction of a tick carried over, for interpolating rendered poses
    pub fn alpha(&self) -> f32 {
        (self.accumulator.as_secs_f32() / FIXED_TIMESTEP).min(1.0)
    }

    pub fn fps(&self) -> f32 {
        self.current_fps
    }

    /// Total simulated time
    pub fn sim_time(&self) -> Duration {
        self.sim_time
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            log::info!("Simulation paused");
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            // Reset accumulator to prevent a tick burst
            self.accumulator = Duration::ZERO;
            log::info!("Simulation resumed");
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    fn update_fps(&mut self) {
        if self.frame_times.is_empty() {
            self.current_fps = 0.0;
            return;
        }

        let total: Duration = self.frame_times.iter().sum();
        let avg_frame_time = total / self.frame_times.len() as u32;
        self.current_fps = if avg_frame_time.as_secs_f32() > 0.0 {
            1.0 / avg_frame_time.as_secs_f32()
        } else {
            0.0
        };
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}
