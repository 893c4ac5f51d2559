//! Time-indexed event application with exact undo.
//!
//! Events are kept in time order (ties in file order). Applied events
//! always form a prefix of the list; `cursor` is its length and `undo`
//! holds one inverse per applied event, so `undo.len() == cursor`.

use netsim_model::{Event, InverseEvent};

use crate::error::{Error, Result};
use crate::scene::{Change, Scene};

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: Vec<Event>,
    undo: Vec<InverseEvent>,
    cursor: usize,
    current_time: f64,
}

impl Timeline {
    /// `events` must already be sorted by time.
    pub fn new(events: Vec<Event>) -> Self {
        debug_assert!(events.windows(2).all(|w| w[0].time() <= w[1].time()));
        Self {
            undo: Vec::with_capacity(events.len()),
            events,
            cursor: 0,
            current_time: 0.0,
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Time of the last event, zero when there are none.
    pub fn end_time(&self) -> f64 {
        self.events.last().map_or(0.0, Event::time)
    }

    /// Number of events currently applied.
    pub fn applied(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Apply, in order, every not yet applied event with time `<= time`.
    ///
    /// On error the events before the failing one stay applied and
    /// `current_time` is the time of the last of them.
    pub fn advance(&mut self, scene: &mut Scene, time: f64) -> Result<Vec<Change>> {
        check_time(time)?;
        let mut changes = Vec::new();
        while let Some(event) = self.events.get(self.cursor) {
            if event.time() > time {
                break;
            }
            match scene.apply(event) {
                Ok((inverse, applied)) => {
                    self.undo.push(inverse);
                    self.cursor += 1;
                    changes.extend(applied);
                }
                Err(err) => {
                    if let Some(last) = self.last_applied_time() {
                        self.current_time = self.current_time.max(last);
                    }
                    return Err(err);
                }
            }
        }
        self.current_time = self.current_time.max(time);
        Ok(changes)
    }

    /// Undo, newest first, every applied event with time `> time`.
    ///
    /// On error the failing event stays applied with its inverse kept, and
    /// `current_time` is that event's time.
    pub fn rewind(&mut self, scene: &mut Scene, time: f64) -> Result<Vec<Change>> {
        check_time(time)?;
        let mut changes = Vec::new();
        while let Some(last) = self.last_applied_time().filter(|&t| t > time) {
            let outcome = match self.undo.last() {
                Some(inverse) => scene.apply_inverse(inverse),
                None => Err(Error::MissingInverse(self.cursor - 1)),
            };
            match outcome {
                Ok(undone) => {
                    self.undo.pop();
                    self.cursor -= 1;
                    changes.extend(undone);
                }
                Err(err) => {
                    self.current_time = self.current_time.min(last);
                    return Err(err);
                }
            }
        }
        self.current_time = self.current_time.min(time);
        Ok(changes)
    }

    /// Move to `time` in whichever direction it lies.
    ///
    /// The direction comes from the applied prefix, not from
    /// `current_time`, so a seek after a failed step still lands on
    /// exactly the events with time `<= time`.
    pub fn seek(&mut self, scene: &mut Scene, time: f64) -> Result<Vec<Change>> {
        let mut changes = self.rewind(scene, time)?;
        changes.extend(self.advance(scene, time)?);
        self.current_time = time;
        Ok(changes)
    }

    fn last_applied_time(&self) -> Option<f64> {
        self.cursor.checked_sub(1).map(|i| self.events[i].time())
    }
}

fn check_time(time: f64) -> Result<()> {
    if time.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("timeline time must be finite, got {time}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsim_model::{Channel, Color, Node, NodeId, Vec3};
    use netsim_parser::Scenario;
    use proptest::prelude::*;

    fn load(nodes: usize, events: Vec<Event>) -> (Scene, Timeline) {
        let scenario = Scenario {
            nodes: (0..nodes as u32).map(|i| Node::new(NodeId(i))).collect(),
            ..Scenario::default()
        };
        (Scene::from_scenario(scenario).0, Timeline::new(events))
    }

    fn position(scene: &Scene, id: u32) -> Vec3 {
        scene.node(NodeId(id)).map(|n| n.position).unwrap()
    }

    #[test]
    fn rewind_past_move_restores_origin() {
        let (mut scene, mut timeline) = load(
            1,
            vec![Event::NodePosition {
                node: NodeId(0),
                time: 5.0,
                target: Vec3::new(1.0, 0.0, 0.0),
            }],
        );

        timeline.advance(&mut scene, 4.9).unwrap();
        assert_eq!(position(&scene, 0), Vec3::ZERO);

        timeline.advance(&mut scene, 5.0).unwrap();
        assert_eq!(position(&scene, 0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(timeline.applied(), 1);

        timeline.rewind(&mut scene, 4.0).unwrap();
        assert_eq!(position(&scene, 0), Vec3::ZERO);
        assert_eq!(timeline.applied(), 0);
        assert_eq!(timeline.current_time(), 4.0);
    }

    #[test]
    fn rewind_between_color_changes_keeps_first() {
        let paint = |time: f64, c: u8| Event::NodeColor {
            node: NodeId(0),
            time,
            channel: Channel::Base,
            target: Some(Color::new(c, c, c)),
        };
        let (mut scene, mut timeline) = load(1, vec![paint(1.0, 10), paint(2.0, 20), paint(3.0, 30)]);

        timeline.seek(&mut scene, 3.0).unwrap();
        assert_eq!(scene.node(NodeId(0)).unwrap().base_color, Some(Color::new(30, 30, 30)));

        timeline.seek(&mut scene, 1.5).unwrap();
        assert_eq!(scene.node(NodeId(0)).unwrap().base_color, Some(Color::new(10, 10, 10)));
        assert_eq!(timeline.applied(), 1);
    }

    #[test]
    fn ties_apply_in_file_order_and_undo_in_reverse() {
        let to = |x: f64| Event::NodePosition {
            node: NodeId(0),
            time: 1.0,
            target: Vec3::new(x, 0.0, 0.0),
        };
        let (mut scene, mut timeline) = load(1, vec![to(1.0), to(2.0)]);

        let changes = timeline.advance(&mut scene, 1.0).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(position(&scene, 0).x, 2.0);

        timeline.rewind(&mut scene, 0.0).unwrap();
        assert_eq!(position(&scene, 0), Vec3::ZERO);
    }

    #[test]
    fn events_at_zero_apply_on_first_seek() {
        let (mut scene, mut timeline) = load(
            1,
            vec![Event::NodePosition {
                node: NodeId(0),
                time: 0.0,
                target: Vec3::ONE,
            }],
        );
        timeline.seek(&mut scene, 0.0).unwrap();
        assert_eq!(position(&scene, 0), Vec3::ONE);
    }

    #[test]
    fn failed_apply_keeps_cursor_consistent() {
        let (mut scene, mut timeline) = load(
            1,
            vec![
                Event::NodePosition {
                    node: NodeId(0),
                    time: 1.0,
                    target: Vec3::ONE,
                },
                Event::NodePosition {
                    node: NodeId(9),
                    time: 2.0,
                    target: Vec3::ONE,
                },
            ],
        );
        assert!(timeline.advance(&mut scene, 3.0).is_err());
        assert_eq!(timeline.applied(), 1);
        timeline.rewind(&mut scene, 0.0).unwrap();
        assert_eq!(position(&scene, 0), Vec3::ZERO);
    }

    #[test]
    fn seek_after_failed_advance_undoes_applied_events() {
        let (mut scene, mut timeline) = load(
            1,
            vec![
                Event::NodePosition {
                    node: NodeId(0),
                    time: 1.0,
                    target: Vec3::ONE,
                },
                Event::NodePosition {
                    node: NodeId(9),
                    time: 2.0,
                    target: Vec3::ONE,
                },
            ],
        );
        assert!(timeline.advance(&mut scene, 3.0).is_err());
        assert_eq!(timeline.current_time(), 1.0);

        timeline.seek(&mut scene, 0.5).unwrap();
        assert_eq!(timeline.applied(), 0);
        assert_eq!(timeline.current_time(), 0.5);
        assert_eq!(position(&scene, 0), Vec3::ZERO);
    }

    #[test]
    fn seek_backward_without_events_in_between() {
        let (mut scene, mut timeline) = load(
            1,
            vec![Event::NodePosition {
                node: NodeId(0),
                time: 1.0,
                target: Vec3::ONE,
            }],
        );
        timeline.seek(&mut scene, 8.0).unwrap();
        assert!(timeline.seek(&mut scene, 4.0).unwrap().is_empty());
        assert_eq!(timeline.current_time(), 4.0);
        assert_eq!(timeline.applied(), 1);
    }

    #[test]
    fn non_finite_times_are_rejected() {
        let (mut scene, mut timeline) = load(
            1,
            vec![Event::NodePosition {
                node: NodeId(0),
                time: 100.0,
                target: Vec3::ONE,
            }],
        );
        assert!(matches!(timeline.advance(&mut scene, f64::NAN), Err(Error::InvalidInput(_))));
        assert!(matches!(timeline.rewind(&mut scene, f64::NAN), Err(Error::InvalidInput(_))));
        assert!(matches!(timeline.seek(&mut scene, f64::INFINITY), Err(Error::InvalidInput(_))));
        assert_eq!(timeline.applied(), 0);
        assert_eq!(timeline.current_time(), 0.0);
        assert_eq!(position(&scene, 0), Vec3::ZERO);
    }

    fn events(nodes: u32) -> impl Strategy<Value = Vec<Event>> {
        let event = (0..nodes, 0.0..100.0f64, -50.0..50.0f64, any::<Option<(u8, u8, u8)>>(), any::<bool>())
            .prop_map(|(node, time, x, color, is_move)| {
                if is_move {
                    Event::NodePosition {
                        node: NodeId(node),
                        time,
                        target: Vec3::new(x, -x, 0.5),
                    }
                } else {
                    Event::NodeColor {
                        node: NodeId(node),
                        time,
                        channel: if x > 0.0 { Channel::Base } else { Channel::Highlight },
                        target: color.map(|(r, g, b)| Color::new(r, g, b)),
                    }
                }
            });
        proptest::collection::vec(event, 0..40).prop_map(|mut events| {
            events.sort_by(|a, b| a.time().total_cmp(&b.time()));
            events
        })
    }

    proptest! {
        #[test]
        fn full_forward_then_full_rewind_restores_baseline(events in events(4)) {
            let (mut scene, mut timeline) = load(4, events);
            let baseline = scene.snapshot().nodes;

            timeline.seek(&mut scene, 100.0).unwrap();
            prop_assert_eq!(timeline.applied(), timeline.len());
            timeline.seek(&mut scene, -1.0).unwrap();

            prop_assert_eq!(timeline.applied(), 0);
            prop_assert_eq!(scene.snapshot().nodes, baseline);
        }

        #[test]
        fn seeking_anywhere_matches_a_fresh_replay(events in events(3), a in 0.0..100.0f64, b in 0.0..100.0f64) {
            let (mut scene, mut timeline) = load(3, events.clone());
            timeline.seek(&mut scene, a).unwrap();
            timeline.seek(&mut scene, b).unwrap();

            let (mut fresh, mut replay) = load(3, events);
            replay.seek(&mut fresh, b).unwrap();

            prop_assert_eq!(timeline.applied(), replay.applied());
            prop_assert_eq!(scene.snapshot().nodes, fresh.snapshot().nodes);
        }
    }
}
