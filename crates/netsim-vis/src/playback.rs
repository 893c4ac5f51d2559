//! Playback controls over a loaded timeline.

use serde::{Deserialize, Serialize};

use crate::config::TimeUnit;
use crate::error::Result;
use crate::scene::{Change, Scene};
use crate::timeline::Timeline;

/// Playback speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackSpeed {
    /// Clock ticks advance nothing
    Paused,
    /// 0.25x speed
    QuarterSpeed,
    /// 0.5x speed
    HalfSpeed,
    /// Normal speed (1x)
    Normal,
    /// 2x speed
    Double,
    /// 4x speed
    Quadruple,
    /// 10x speed
    TenX,
    /// Jump to the end on the next tick
    Maximum,
}

impl PlaybackSpeed {
    /// Get the speed multiplier.
    pub fn multiplier(&self) -> f64 {
        match self {
            PlaybackSpeed::Paused => 0.0,
            PlaybackSpeed::QuarterSpeed => 0.25,
            PlaybackSpeed::HalfSpeed => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Quadruple => 4.0,
            PlaybackSpeed::TenX => 10.0,
            PlaybackSpeed::Maximum => f64::INFINITY,
        }
    }

    /// Simulated milliseconds one tick covers, `None` when paused.
    pub fn step(&self, ms_per_frame: f64) -> Option<f64> {
        match self {
            PlaybackSpeed::Paused => None,
            PlaybackSpeed::Maximum => Some(f64::INFINITY),
            speed => Some(ms_per_frame * speed.multiplier()),
        }
    }

    /// Parse a speed name or a bare multiplier (`"2"`, `"0.5"`).
    pub fn from_name(name: &str) -> Option<Self> {
        let speed = match name {
            "paused" | "0" => PlaybackSpeed::Paused,
            "quarter-speed" | "0.25" => PlaybackSpeed::QuarterSpeed,
            "half-speed" | "0.5" => PlaybackSpeed::HalfSpeed,
            "normal" | "1" => PlaybackSpeed::Normal,
            "double" | "2" => PlaybackSpeed::Double,
            "quadruple" | "4" => PlaybackSpeed::Quadruple,
            "ten-x" | "10" => PlaybackSpeed::TenX,
            "maximum" | "max" => PlaybackSpeed::Maximum,
            _ => return None,
        };
        Some(speed)
    }
}

/// Current state of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackState {
    /// Time is fixed; nothing pending
    Stopped,
    /// A batched advance or rewind is being applied
    Seeking,
    /// Clock ticks move time forward
    Playing,
}

/// Playback controller owning the live scene and its timeline.
#[derive(Debug)]
pub struct Playback {
    scene: Scene,
    timeline: Timeline,
    state: PlaybackState,
    speed: PlaybackSpeed,
    ms_per_frame: f64,
}

impl Playback {
    /// Create a controller in the initial [`PlaybackState::Seeking`] state.
    ///
    /// Nothing is applied until the first [`seek`](Self::seek).
    pub fn new(scene: Scene, timeline: Timeline, speed: PlaybackSpeed) -> Self {
        let ms_per_frame = scene.configuration().ms_per_frame;
        Self {
            scene,
            timeline,
            state: PlaybackState::Seeking,
            speed,
            ms_per_frame,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Get the current playback state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Get the current playback speed.
    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn current_time(&self) -> f64 {
        self.timeline.current_time()
    }

    pub fn end_time(&self) -> f64 {
        self.timeline.end_time()
    }

    /// Jump to `time`, clamped to `[0, end_time]`.
    ///
    /// A seek while playing keeps playing from the new time.
    pub fn seek(&mut self, time: f64) -> Result<Vec<Change>> {
        let resume = match self.state {
            PlaybackState::Playing => PlaybackState::Playing,
            PlaybackState::Stopped | PlaybackState::Seeking => PlaybackState::Stopped,
        };
        let time = if time.is_nan() { 0.0 } else { time.clamp(0.0, self.end_time()) };

        self.state = PlaybackState::Seeking;
        let outcome = self.timeline.seek(&mut self.scene, time);
        self.state = resume;
        if let Ok(changes) = &outcome {
            tracing::debug!(time, changes = changes.len(), "seek complete");
        }
        outcome
    }

    /// Start playback. From the end, restarts at zero.
    pub fn play(&mut self) -> Result<Vec<Change>> {
        let changes = if self.current_time() >= self.end_time() {
            self.seek(0.0)?
        } else {
            Vec::new()
        };
        self.state = PlaybackState::Playing;
        Ok(changes)
    }

    /// Hold the current time.
    pub fn pause(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    /// Stop playback and return to the beginning.
    pub fn stop(&mut self) -> Result<Vec<Change>> {
        self.state = PlaybackState::Stopped;
        self.seek(0.0)
    }

    /// Set playback speed.
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    /// One clock tick: while playing, advance by one frame at the
    /// current speed. Stops on reaching the last event.
    pub fn tick(&mut self) -> Result<Vec<Change>> {
        if self.state != PlaybackState::Playing {
            return Ok(Vec::new());
        }
        let Some(step) = self.speed.step(self.ms_per_frame) else {
            return Ok(Vec::new());
        };
        let end = self.end_time();
        let target = (self.current_time() + step).min(end);
        let changes = self.timeline.advance(&mut self.scene, target)?;
        if self.current_time() >= end {
            tracing::debug!(end, "playback reached the end");
            self.state = PlaybackState::Stopped;
        }
        Ok(changes)
    }

    /// Calculate progress as a fraction (0.0 - 1.0).
    pub fn progress(&self) -> f64 {
        let end = self.end_time();
        if end <= 0.0 {
            if self.timeline.applied() == self.timeline.len() { 1.0 } else { 0.0 }
        } else {
            (self.current_time() / end).clamp(0.0, 1.0)
        }
    }
}

/// Playback status for sending to frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub current_time: f64,
    pub end_time: f64,
    /// `current_time` in the configured display unit
    pub display_time: String,
    pub applied_events: usize,
    pub total_events: usize,
    pub state: PlaybackState,
    pub speed: PlaybackSpeed,
    pub progress: f64,
}

impl PlaybackStatus {
    pub fn new(playback: &Playback, unit: TimeUnit) -> Self {
        Self {
            current_time: playback.current_time(),
            end_time: playback.end_time(),
            display_time: unit.format(playback.current_time()),
            applied_events: playback.timeline.applied(),
            total_events: playback.timeline.len(),
            state: playback.state,
            speed: playback.speed,
            progress: playback.progress(),
        }
    }
}

impl From<&Playback> for PlaybackStatus {
    fn from(playback: &Playback) -> Self {
        Self::new(playback, TimeUnit::default())
    }
}
