//! Loaded scenarios and their replacement.
//!
//! A [`Session`] owns everything derived from one file. The
//! [`SessionSlot`] holds the installed session and swaps in a new one only
//! after its parse fully succeeded. Every load takes a ticket with a fresh
//! generation; a result whose ticket has been superseded is dropped, so a
//! slow, older load can never overwrite a newer one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use netsim_parser::{parse_file, ParseOptions, Scenario, Warning};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::TimeUnit;
use crate::error::Result;
use crate::playback::{Playback, PlaybackSpeed, PlaybackStatus};
use crate::scene::{Change, Scene};
use crate::timeline::Timeline;

/// Capacity of the update channel; slow subscribers lag and skip.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Entities, timeline and playback of one loaded scenario.
#[derive(Debug)]
pub struct Session {
    generation: u64,
    source: Option<PathBuf>,
    warnings: Vec<Warning>,
    playback: Playback,
}

impl Session {
    /// Build a session and settle it at time zero.
    pub fn new(generation: u64, source: Option<PathBuf>, mut scenario: Scenario, speed: PlaybackSpeed) -> Result<Self> {
        let warnings = std::mem::take(&mut scenario.warnings);
        let (scene, events) = Scene::from_scenario(scenario);
        let mut playback = Playback::new(scene, Timeline::new(events), speed);
        playback.seek(0.0)?;
        Ok(Self {
            generation,
            source,
            warnings,
            playback,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Records the parser skipped.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut Playback {
        &mut self.playback
    }
}

/// Proof that a load was started, carrying its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum LoadOutcome {
    /// The session is now live
    Installed { generation: u64, warnings: usize },
    /// A newer load was started meanwhile; the result was dropped
    Stale { generation: u64, newest: u64 },
}

/// Message pushed to subscribers whenever the live session changes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Update {
    /// A new session was installed; clients should refetch the scene
    Loaded { generation: u64, status: PlaybackStatus },
    /// Entity state changed by playback
    Changes {
        generation: u64,
        status: PlaybackStatus,
        changes: Vec<Change>,
    },
}

/// Holder of the live session.
pub struct SessionSlot {
    current: RwLock<Option<Session>>,
    issued: AtomicU64,
    updates: broadcast::Sender<Update>,
    speed: PlaybackSpeed,
    time_unit: TimeUnit,
}

impl Default for SessionSlot {
    fn default() -> Self {
        Self::new(PlaybackSpeed::Normal, TimeUnit::default())
    }
}

impl SessionSlot {
    pub fn new(speed: PlaybackSpeed, time_unit: TimeUnit) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            current: RwLock::new(None),
            issued: AtomicU64::new(0),
            updates,
            speed,
            time_unit,
        }
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    /// Start a load. Supersedes every earlier ticket.
    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket {
            generation: self.issued.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// Newest generation handed out.
    pub fn latest_generation(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Install a parsed scenario if `ticket` is still the newest.
    pub async fn install(&self, ticket: LoadTicket, source: Option<PathBuf>, scenario: Scenario) -> Result<LoadOutcome> {
        let newest = self.latest_generation();
        if ticket.generation != newest {
            tracing::warn!(generation = ticket.generation, newest, "dropping superseded load");
            return Ok(LoadOutcome::Stale {
                generation: ticket.generation,
                newest,
            });
        }

        let session = Session::new(ticket.generation, source, scenario, self.speed)?;
        let warnings = session.warnings().len();
        let status = PlaybackStatus::new(session.playback(), self.time_unit);

        let mut current = self.current.write().await;
        // Re-check under the lock: a newer load may have been issued or installed meanwhile.
        let installed = current.as_ref().map_or(0, Session::generation);
        let newest = self.latest_generation();
        if ticket.generation != newest || ticket.generation <= installed {
            tracing::warn!(generation = ticket.generation, newest, installed, "dropping superseded load");
            return Ok(LoadOutcome::Stale {
                generation: ticket.generation,
                newest,
            });
        }
        *current = Some(session);
        drop(current);

        tracing::info!(generation = ticket.generation, warnings, "scenario installed");
        self.publish(Update::Loaded {
            generation: ticket.generation,
            status,
        });
        Ok(LoadOutcome::Installed {
            generation: ticket.generation,
            warnings,
        })
    }

    /// Parse `path` off the async runtime and install the result.
    ///
    /// A failed parse leaves the live session untouched.
    pub async fn load_file(&self, path: impl Into<PathBuf>, options: ParseOptions) -> Result<LoadOutcome> {
        let path = path.into();
        let ticket = self.begin_load();
        tracing::info!(path = %path.display(), generation = ticket.generation, "loading scenario");

        let parse_path = path.clone();
        let parsed = tokio::task::spawn_blocking(move || parse_file(parse_path, options)).await?;
        let scenario = match parsed {
            Ok(scenario) => scenario,
            Err(err) => {
                tracing::warn!(path = %path.display(), "load failed: {}", err);
                return Err(err.into());
            }
        };
        self.install(ticket, Some(path), scenario).await
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.current.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Update> {
        self.updates.subscribe()
    }

    /// Send to subscribers; having none is fine.
    pub fn publish(&self, update: Update) {
        let _ = self.updates.send(update);
    }

    /// Publish playback changes of `session`, if there are any.
    pub fn publish_changes(&self, session: &Session, changes: Vec<Change>) {
        if changes.is_empty() {
            return;
        }
        self.publish(Update::Changes {
            generation: session.generation(),
            status: PlaybackStatus::new(session.playback(), self.time_unit),
            changes,
        });
    }
}
