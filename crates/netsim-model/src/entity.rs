//! Static scene entities: nodes, buildings, decorations and the global
//! configuration block.

use crate::color::Color;
use crate::ids::{BuildingId, DecorationId, NodeId};
use crate::vec3::{Bounds, Vec3};

/// Default playback step, in simulation milliseconds per frame.
pub const DEFAULT_MS_PER_FRAME: f64 = 10.0;

/// A simulated network node.
///
/// Colors and height are tri-state by construction: `None` means the
/// scenario never set them and the renderer's model default applies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: NodeId,
    pub name: Option<String>,
    /// Model resource to render this node with
    pub model: Option<String>,
    pub position: Vec3,
    /// Rotation in degrees about x, y, z
    pub orientation: Vec3,
    pub scale: Vec3,
    /// Constant displacement of the rendered model from `position`
    pub offset: Vec3,
    /// Target rendered height; overrides the model's natural height
    pub height: Option<f64>,
    pub base_color: Option<Color>,
    pub highlight_color: Option<Color>,
    pub visible: bool,
}

impl Node {
    /// A visible node at the origin with identity transform and no overrides.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            name: None,
            model: None,
            position: Vec3::ZERO,
            orientation: Vec3::ZERO,
            scale: Vec3::ONE,
            offset: Vec3::ZERO,
            height: None,
            base_color: None,
            highlight_color: None,
            visible: true,
        }
    }

    /// Where the model is actually drawn.
    pub fn rendered_position(&self) -> Vec3 {
        self.position + self.offset
    }
}

/// A box-shaped building subdivided into floors and rooms.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Building {
    pub id: BuildingId,
    pub color: Option<Color>,
    /// Number of floors, always at least one
    pub floors: u32,
    /// Rooms along x and y, each at least one
    pub rooms: (u32, u32),
    pub min: Vec3,
    pub max: Vec3,
    pub visible: bool,
}

impl Building {
    /// Height of a single floor.
    pub fn floor_height(&self) -> f64 {
        (self.max.z - self.min.z) / self.floors as f64
    }

    /// Footprint of a single room along x and y.
    pub fn room_size(&self) -> (f64, f64) {
        (
            (self.max.x - self.min.x) / self.rooms.0 as f64,
            (self.max.y - self.min.y) / self.rooms.1 as f64,
        )
    }
}

/// A purely visual model placed in the scene.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decoration {
    pub id: DecorationId,
    pub model: Option<String>,
    pub position: Vec3,
    pub orientation: Vec3,
    pub scale: Vec3,
}

/// The scenario-wide `configuration` block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Configuration {
    /// Simulation milliseconds covered by one playback frame
    pub ms_per_frame: f64,
    /// Version of the recorder module that wrote the file
    pub module_version: Option<String>,
    /// Recorder sampling interval, informational
    pub time_step: Option<f64>,
    /// Extent of every position seen while parsing, `None` for an empty scene
    pub bounds: Option<Bounds>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            ms_per_frame: DEFAULT_MS_PER_FRAME,
            module_version: None,
            time_step: None,
            bounds: None,
        }
    }
}

impl Configuration {
    /// Grow the scenario bounds to include `p`.
    pub fn include_location(&mut self, p: Vec3) {
        match &mut self.bounds {
            Some(bounds) => bounds.include(p),
            None => self.bounds = Some(Bounds::point(p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_has_no_overrides() {
        let node = Node::new(NodeId(7));
        assert_eq!(node.scale, Vec3::ONE);
        assert!(node.base_color.is_none());
        assert!(node.highlight_color.is_none());
        assert!(node.height.is_none());
        assert!(node.visible);
    }

    #[test]
    fn rendered_position_applies_offset() {
        let mut node = Node::new(NodeId(0));
        node.position = Vec3::new(1.0, 2.0, 3.0);
        node.offset = Vec3::new(0.0, 0.0, 1.5);
        assert_eq!(node.rendered_position(), Vec3::new(1.0, 2.0, 4.5));
    }

    #[test]
    fn building_subdivision() {
        let building = Building {
            id: BuildingId(1),
            color: None,
            floors: 4,
            rooms: (2, 5),
            min: Vec3::ZERO,
            max: Vec3::new(10.0, 20.0, 12.0),
            visible: true,
        };
        assert_eq!(building.floor_height(), 3.0);
        assert_eq!(building.room_size(), (5.0, 4.0));
    }

    #[test]
    fn configuration_bounds_start_empty() {
        let mut config = Configuration::default();
        assert!(config.bounds.is_none());

        config.include_location(Vec3::new(1.0, 1.0, 1.0));
        config.include_location(Vec3::new(-1.0, 0.0, 2.0));

        let bounds = config.bounds.unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, 1.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 2.0));
    }
}
