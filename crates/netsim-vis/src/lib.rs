//! Netsim Scenario Playback
//!
//! Replays a parsed scenario on a reversible timeline and serves it to
//! browser clients.
//!
//! # Architecture
//!
//! - **Scene**: live entities, mutated only through [`EntityState`]
//! - **Timeline**: applies events up to a time and undoes them exactly
//! - **Playback**: seek, play, pause and a per-frame clock tick
//! - **Session**: one loaded file; [`SessionSlot`] swaps sessions atomically
//! - **REST API / WebSocket**: control playback, stream [`Change`]s
//!
//! # Usage
//!
//! ```ignore
//! let server = VisServer::new(VisConfig::from_env()?);
//! server.slot().load_file("run.json", ParseOptions::default()).await?;
//! server.serve().await?;
//! ```

mod config;
mod error;
mod playback;
mod scene;
mod server;
mod session;
mod state;
mod timeline;

pub use config::{TimeUnit, VisConfig};
pub use error::{Error, Result};
pub use playback::{Playback, PlaybackSpeed, PlaybackState, PlaybackStatus};
pub use scene::{Change, DependentRegistry, Scene, SceneSnapshot};
pub use server::VisServer;
pub use session::{LoadOutcome, LoadTicket, Session, SessionSlot, Update};
pub use state::EntityState;
pub use timeline::Timeline;

#[cfg(test)]
mod tests {
    use super::*;
    use netsim_model::{Channel, Color, DependentId, NodeId, Vec3};

    fn session(json: &str) -> Session {
        let scenario = netsim_parser::parse_str(json, Default::default()).unwrap();
        Session::new(1, None, scenario, PlaybackSpeed::Normal).unwrap()
    }

    #[test]
    fn node_move_and_rewind() {
        let mut session = session(
            r#"{
                "nodes": [{"id": 0, "position": [0, 0, 0], "orientation": [0, 0, 0], "scale": [1, 1, 1], "visible": true}],
                "events": [{"type": "node-position", "id": 0, "time": 5.0, "target": [1, 0, 0]}]
            }"#,
        );
        let playback = session.playback_mut();
        let position = |p: &Playback| p.scene().node(NodeId(0)).unwrap().position;

        let changes = playback.seek(5.0).unwrap();
        assert_eq!(position(playback), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(
            changes,
            vec![Change::NodePosition {
                node: NodeId(0),
                position: Vec3::new(1.0, 0.0, 0.0)
            }]
        );

        playback.seek(2.5).unwrap();
        assert_eq!(position(playback), Vec3::ZERO);
    }

    #[test]
    fn rewinding_between_color_changes() {
        let mut session = session(
            r#"{
                "nodes": [{"id": 0, "position": [0, 0, 0]}],
                "events": [
                    {"type": "node-color", "id": 0, "time": 1.0, "channel": "base", "target": [255, 0, 0]},
                    {"type": "node-color", "id": 0, "time": 2.0, "channel": "base", "target": [0, 255, 0]},
                    {"type": "node-color", "id": 0, "time": 3.0, "channel": "base", "target": [0, 0, 255]}
                ]
            }"#,
        );
        let playback = session.playback_mut();
        playback.seek(3.0).unwrap();
        playback.seek(1.5).unwrap();

        let node = playback.scene().node(NodeId(0)).unwrap();
        assert_eq!(node.base_color, Some(Color::new(255, 0, 0)));
        assert_eq!(node.highlight_color, None);
    }

    #[test]
    fn moving_a_node_notifies_its_dependents() {
        let mut session = session(
            r#"{
                "nodes": [{"id": 3, "position": [0, 0, 0]}],
                "events": [{"type": "node-position", "id": 3, "time": 1.0, "target": [0, 2, 0]}]
            }"#,
        );
        let playback = session.playback_mut();
        playback.scene_mut().dependents_mut().register(NodeId(3), DependentId(7));

        let changes = playback.seek(1.0).unwrap();
        assert!(changes.contains(&Change::DependentNotified {
            node: NodeId(3),
            dependent: DependentId(7)
        }));
    }

    #[test]
    fn color_channels_are_independent() {
        let mut session = session(
            r#"{
                "nodes": [{"id": 0, "position": [0, 0, 0]}],
                "events": [
                    {"type": "node-color", "id": 0, "time": 1.0, "channel": "highlight", "target": [1, 2, 3]},
                    {"type": "node-color", "id": 0, "time": 2.0, "channel": "base", "target": [4, 5, 6]}
                ]
            }"#,
        );
        let playback = session.playback_mut();
        playback.seek(2.0).unwrap();
        let changes = playback.seek(1.0).unwrap();

        assert_eq!(
            changes,
            vec![Change::NodeColor {
                node: NodeId(0),
                channel: Channel::Base,
                color: None
            }]
        );
        let node = playback.scene().node(NodeId(0)).unwrap();
        assert_eq!(node.highlight_color, Some(Color::new(1, 2, 3)));
    }
}
