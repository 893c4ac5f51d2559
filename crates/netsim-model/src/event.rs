//! Timeline events and their inverses.
//!
//! A forward [`Event`] is read from the scenario file. Applying it to the
//! scene yields an [`InverseEvent`] that carries exactly the state the
//! event overwrote, so applying the inverse puts the scene back.

use crate::color::Color;
use crate::ids::{DecorationId, NodeId, SeriesId, StreamId};
use crate::vec3::Vec3;

/// Which independently overridable color of a node an event addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Channel {
    Base,
    Highlight,
}

impl Channel {
    /// Parse the file spelling of a channel.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "base" => Some(Channel::Base),
            "highlight" => Some(Channel::Highlight),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Base => "base",
            Channel::Highlight => "highlight",
        }
    }
}

/// The `type` discriminator of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NodePosition,
    NodeOrientation,
    NodeColor,
    DecorationPosition,
    DecorationOrientation,
    SeriesAppend,
    CategorySeriesAppend,
    StreamAppend,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 8] = [
        EventKind::NodePosition,
        EventKind::NodeOrientation,
        EventKind::NodeColor,
        EventKind::DecorationPosition,
        EventKind::DecorationOrientation,
        EventKind::SeriesAppend,
        EventKind::CategorySeriesAppend,
        EventKind::StreamAppend,
    ];

    /// Parse a discriminator; unknown spellings yield `None`.
    pub fn from_discriminator(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.discriminator() == s)
    }

    /// The spelling used in scenario files.
    pub fn discriminator(&self) -> &'static str {
        match self {
            EventKind::NodePosition => "node-position",
            EventKind::NodeOrientation => "node-orientation",
            EventKind::NodeColor => "node-color",
            EventKind::DecorationPosition => "decoration-position",
            EventKind::DecorationOrientation => "decoration-orientation",
            EventKind::SeriesAppend => "xy-series-append",
            EventKind::CategorySeriesAppend => "category-series-append",
            EventKind::StreamAppend => "stream-append",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.discriminator())
    }
}

/// A state change recorded at a simulation time (milliseconds).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "kebab-case"))]
pub enum Event {
    /// A node moved
    NodePosition { node: NodeId, time: f64, target: Vec3 },

    /// A node turned
    NodeOrientation { node: NodeId, time: f64, target: Vec3 },

    /// A node color override was set (`Some`) or removed (`None`)
    NodeColor {
        node: NodeId,
        time: f64,
        channel: Channel,
        target: Option<Color>,
    },

    /// A decoration moved
    DecorationPosition {
        decoration: DecorationId,
        time: f64,
        target: Vec3,
    },

    /// A decoration turned
    DecorationOrientation {
        decoration: DecorationId,
        time: f64,
        target: Vec3,
    },

    /// A point was added to an XY series
    SeriesAppend { series: SeriesId, time: f64, x: f64, y: f64 },

    /// A value was added to a category series
    CategorySeriesAppend {
        series: SeriesId,
        time: f64,
        category: u32,
        value: f64,
    },

    /// Text was added to a log stream
    StreamAppend { stream: StreamId, time: f64, data: String },
}

impl Event {
    /// Simulation time this event happens at.
    pub fn time(&self) -> f64 {
        match self {
            Event::NodePosition { time, .. } => *time,
            Event::NodeOrientation { time, .. } => *time,
            Event::NodeColor { time, .. } => *time,
            Event::DecorationPosition { time, .. } => *time,
            Event::DecorationOrientation { time, .. } => *time,
            Event::SeriesAppend { time, .. } => *time,
            Event::CategorySeriesAppend { time, .. } => *time,
            Event::StreamAppend { time, .. } => *time,
        }
    }

    /// The discriminator this event was read from.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::NodePosition { .. } => EventKind::NodePosition,
            Event::NodeOrientation { .. } => EventKind::NodeOrientation,
            Event::NodeColor { .. } => EventKind::NodeColor,
            Event::DecorationPosition { .. } => EventKind::DecorationPosition,
            Event::DecorationOrientation { .. } => EventKind::DecorationOrientation,
            Event::SeriesAppend { .. } => EventKind::SeriesAppend,
            Event::CategorySeriesAppend { .. } => EventKind::CategorySeriesAppend,
            Event::StreamAppend { .. } => EventKind::StreamAppend,
        }
    }

    /// The node this event targets, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Event::NodePosition { node, .. }
            | Event::NodeOrientation { node, .. }
            | Event::NodeColor { node, .. } => Some(*node),
            _ => None,
        }
    }

    /// The decoration this event targets, if any.
    pub fn decoration(&self) -> Option<DecorationId> {
        match self {
            Event::DecorationPosition { decoration, .. }
            | Event::DecorationOrientation { decoration, .. } => Some(*decoration),
            _ => None,
        }
    }

    /// True for events consumed by chart and log collaborators rather
    /// than the 3D scene.
    pub fn is_chart_event(&self) -> bool {
        matches!(
            self,
            Event::SeriesAppend { .. }
                | Event::CategorySeriesAppend { .. }
                | Event::StreamAppend { .. }
        )
    }
}

/// The state an applied [`Event`] overwrote.
///
/// Appends record the container length before the append; undoing
/// truncates back to it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "kebab-case"))]
pub enum InverseEvent {
    NodePosition { node: NodeId, previous: Vec3 },
    NodeOrientation { node: NodeId, previous: Vec3 },
    NodeColor {
        node: NodeId,
        channel: Channel,
        previous: Option<Color>,
    },
    DecorationPosition { decoration: DecorationId, previous: Vec3 },
    DecorationOrientation { decoration: DecorationId, previous: Vec3 },
    SeriesAppend { series: SeriesId, previous_len: usize },
    CategorySeriesAppend { series: SeriesId, previous_len: usize },
    StreamAppend { stream: StreamId, previous_len: usize },
}

impl InverseEvent {
    /// Kind of the forward event this undoes.
    pub fn kind(&self) -> EventKind {
        match self {
            InverseEvent::NodePosition { .. } => EventKind::NodePosition,
            InverseEvent::NodeOrientation { .. } => EventKind::NodeOrientation,
            InverseEvent::NodeColor { .. } => EventKind::NodeColor,
            InverseEvent::DecorationPosition { .. } => EventKind::DecorationPosition,
            InverseEvent::DecorationOrientation { .. } => EventKind::DecorationOrientation,
            InverseEvent::SeriesAppend { .. } => EventKind::SeriesAppend,
            InverseEvent::CategorySeriesAppend { .. } => EventKind::CategorySeriesAppend,
            InverseEvent::StreamAppend { .. } => EventKind::StreamAppend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminators_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_discriminator(kind.discriminator()), Some(kind));
        }
        assert_eq!(EventKind::from_discriminator("node-teleport"), None);
    }

    #[test]
    fn accessors() {
        let event = Event::NodeColor {
            node: NodeId(3),
            time: 12.5,
            channel: Channel::Highlight,
            target: None,
        };
        assert_eq!(event.time(), 12.5);
        assert_eq!(event.kind(), EventKind::NodeColor);
        assert_eq!(event.node(), Some(NodeId(3)));
        assert_eq!(event.decoration(), None);
        assert!(!event.is_chart_event());

        let append = Event::StreamAppend {
            stream: StreamId(0),
            time: 1.0,
            data: "x".into(),
        };
        assert!(append.is_chart_event());
        assert_eq!(append.node(), None);
    }

    #[test]
    fn channel_names() {
        assert_eq!(Channel::from_name("base"), Some(Channel::Base));
        assert_eq!(Channel::from_name("highlight"), Some(Channel::Highlight));
        assert_eq!(Channel::from_name("glow"), None);
        assert_eq!(Channel::Highlight.as_str(), "highlight");
    }
}
