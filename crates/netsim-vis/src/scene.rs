//! Live entity state of a loaded scenario.

use std::collections::{BTreeMap, HashMap};

use netsim_model::{
    Building, Channel, Color, Configuration, Decoration, DecorationId, DependentId, Event, InverseEvent,
    LogStream, Node, NodeId, Series, SeriesId, StreamId, Vec3,
};
use netsim_parser::Scenario;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::state::EntityState;

/// One observable attribute that changed, for incremental redraws.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Change {
    NodePosition { node: NodeId, position: Vec3 },
    NodeOrientation { node: NodeId, orientation: Vec3 },
    NodeColor {
        node: NodeId,
        channel: Channel,
        color: Option<Color>,
    },
    DecorationPosition { decoration: DecorationId, position: Vec3 },
    DecorationOrientation { decoration: DecorationId, orientation: Vec3 },
    SeriesLength { series: SeriesId, len: usize },
    StreamLength { stream: StreamId, len: usize },
    /// A collaborator registered on `node` should refresh
    DependentNotified { node: NodeId, dependent: DependentId },
}

/// Collaborators to notify when a node moves.
///
/// Entries are relations only: the registry never owns a dependent and
/// is rebuilt empty with every scene. Rendering collaborators embedding the
/// scene register through [`Scene::dependents_mut`]; nothing in this crate
/// registers on its own.
#[derive(Debug, Default, Clone)]
pub struct DependentRegistry {
    by_node: HashMap<NodeId, Vec<DependentId>>,
}

impl DependentRegistry {
    /// Register `dependent` on `node`. Registering twice is a no-op.
    pub fn register(&mut self, node: NodeId, dependent: DependentId) {
        let entry = self.by_node.entry(node).or_default();
        if !entry.contains(&dependent) {
            entry.push(dependent);
        }
    }

    /// Remove `dependent` from `node`. Returns whether it was registered.
    pub fn unregister(&mut self, node: NodeId, dependent: DependentId) -> bool {
        let Some(entry) = self.by_node.get_mut(&node) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|d| *d != dependent);
        let removed = entry.len() != before;
        if entry.is_empty() {
            self.by_node.remove(&node);
        }
        removed
    }

    pub fn dependents(&self, node: NodeId) -> &[DependentId] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.by_node.clear();
    }
}

/// Serializable copy of the whole scene.
#[derive(Debug, Clone, Serialize)]
pub struct SceneSnapshot {
    pub configuration: Configuration,
    pub nodes: Vec<Node>,
    pub buildings: Vec<Building>,
    pub decorations: Vec<Decoration>,
    pub series: Vec<Series>,
    pub streams: Vec<LogStream>,
}

/// Entities of one scenario, mutated only by timeline application.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    configuration: Configuration,
    nodes: BTreeMap<NodeId, Node>,
    buildings: Vec<Building>,
    decorations: BTreeMap<DecorationId, Decoration>,
    series: BTreeMap<SeriesId, Series>,
    streams: BTreeMap<StreamId, LogStream>,
    dependents: DependentRegistry,
}

impl Scene {
    /// Take ownership of parsed entities. Returns the scene and the events.
    pub fn from_scenario(scenario: Scenario) -> (Self, Vec<Event>) {
        let scene = Self {
            configuration: scenario.configuration,
            nodes: scenario.nodes.into_iter().map(|n| (n.id, n)).collect(),
            buildings: scenario.buildings,
            decorations: scenario.decorations.into_iter().map(|d| (d.id, d)).collect(),
            series: scenario.series.into_iter().map(|s| (s.id(), s)).collect(),
            streams: scenario.streams.into_iter().map(|s| (s.id, s)).collect(),
            dependents: DependentRegistry::default(),
        };
        (scene, scenario.events)
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn decoration(&self, id: DecorationId) -> Option<&Decoration> {
        self.decorations.get(&id)
    }

    pub fn series(&self, id: SeriesId) -> Option<&Series> {
        self.series.get(&id)
    }

    pub fn stream(&self, id: StreamId) -> Option<&LogStream> {
        self.streams.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn dependents(&self) -> &DependentRegistry {
        &self.dependents
    }

    pub fn dependents_mut(&mut self) -> &mut DependentRegistry {
        &mut self.dependents
    }

    fn target(&mut self, event: &Event) -> Result<&mut dyn EntityState> {
        let target: Option<&mut dyn EntityState> = match event {
            Event::NodePosition { node, .. } | Event::NodeOrientation { node, .. } | Event::NodeColor { node, .. } => {
                self.nodes.get_mut(node).map(|n| n as _)
            }
            Event::DecorationPosition { decoration, .. } | Event::DecorationOrientation { decoration, .. } => {
                self.decorations.get_mut(decoration).map(|d| d as _)
            }
            Event::SeriesAppend { series, .. } | Event::CategorySeriesAppend { series, .. } => {
                self.series.get_mut(series).map(|s| s as _)
            }
            Event::StreamAppend { stream, .. } => self.streams.get_mut(stream).map(|s| s as _),
        };
        target.ok_or_else(|| Error::unknown(format!("{} target", event.kind())))
    }

    fn inverse_target(&mut self, inverse: &InverseEvent) -> Result<&mut dyn EntityState> {
        let target: Option<&mut dyn EntityState> = match inverse {
            InverseEvent::NodePosition { node, .. }
            | InverseEvent::NodeOrientation { node, .. }
            | InverseEvent::NodeColor { node, .. } => self.nodes.get_mut(node).map(|n| n as _),
            InverseEvent::DecorationPosition { decoration, .. }
            | InverseEvent::DecorationOrientation { decoration, .. } => {
                self.decorations.get_mut(decoration).map(|d| d as _)
            }
            InverseEvent::SeriesAppend { series, .. } | InverseEvent::CategorySeriesAppend { series, .. } => {
                self.series.get_mut(series).map(|s| s as _)
            }
            InverseEvent::StreamAppend { stream, .. } => self.streams.get_mut(stream).map(|s| s as _),
        };
        target.ok_or_else(|| Error::unknown(format!("{} inverse target", inverse.kind())))
    }

    /// Apply `event` and report what changed.
    pub fn apply(&mut self, event: &Event) -> Result<(InverseEvent, Vec<Change>)> {
        let inverse = self.target(event)?.apply_forward(event)?;
        let changes = self.changes_for(&inverse);
        Ok((inverse, changes))
    }

    /// Undo one applied event and report what changed.
    pub fn apply_inverse(&mut self, inverse: &InverseEvent) -> Result<Vec<Change>> {
        self.inverse_target(inverse)?.apply_inverse(inverse)?;
        Ok(self.changes_for(inverse))
    }

    /// Current value of whatever `inverse` covers.
    fn changes_for(&self, inverse: &InverseEvent) -> Vec<Change> {
        match *inverse {
            InverseEvent::NodePosition { node, .. } => {
                let Some(n) = self.nodes.get(&node) else {
                    return Vec::new();
                };
                std::iter::once(Change::NodePosition {
                    node,
                    position: n.position,
                })
                .chain(
                    self.dependents
                        .dependents(node)
                        .iter()
                        .map(|&dependent| Change::DependentNotified { node, dependent }),
                )
                .collect()
            }
            InverseEvent::NodeOrientation { node, .. } => self
                .nodes
                .get(&node)
                .map(|n| Change::NodeOrientation {
                    node,
                    orientation: n.orientation,
                })
                .into_iter()
                .collect(),
            InverseEvent::NodeColor { node, channel, .. } => self
                .nodes
                .get(&node)
                .map(|n| Change::NodeColor {
                    node,
                    channel,
                    color: match channel {
                        Channel::Base => n.base_color,
                        Channel::Highlight => n.highlight_color,
                    },
                })
                .into_iter()
                .collect(),
            InverseEvent::DecorationPosition { decoration, .. } => self
                .decorations
                .get(&decoration)
                .map(|d| Change::DecorationPosition {
                    decoration,
                    position: d.position,
                })
                .into_iter()
                .collect(),
            InverseEvent::DecorationOrientation { decoration, .. } => self
                .decorations
                .get(&decoration)
                .map(|d| Change::DecorationOrientation {
                    decoration,
                    orientation: d.orientation,
                })
                .into_iter()
                .collect(),
            InverseEvent::SeriesAppend { series, .. } | InverseEvent::CategorySeriesAppend { series, .. } => self
                .series
                .get(&series)
                .map(|s| Change::SeriesLength { series, len: s.len() })
                .into_iter()
                .collect(),
            InverseEvent::StreamAppend { stream, .. } => self
                .streams
                .get(&stream)
                .map(|s| Change::StreamLength {
                    stream,
                    len: s.entries.len(),
                })
                .into_iter()
                .collect(),
        }
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            configuration: self.configuration.clone(),
            nodes: self.nodes.values().cloned().collect(),
            buildings: self.buildings.clone(),
            decorations: self.decorations.values().cloned().collect(),
            series: self.series.values().cloned().collect(),
            streams: self.streams.values().cloned().collect(),
        }
    }
}
