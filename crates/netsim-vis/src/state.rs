//! Forward and inverse application on a single entity.

use netsim_model::{Channel, Color, Decoration, Event, InverseEvent, LogStream, Node, Series};

use crate::error::{Error, Result};

/// Mutable state of one entity that events can change and undo.
///
/// `apply_forward` returns the record that `apply_inverse` needs to put
/// every observable field back exactly as it was. Inverses are never
/// inverted again; redo replays the forward event.
pub trait EntityState {
    fn apply_forward(&mut self, event: &Event) -> Result<InverseEvent>;

    fn apply_inverse(&mut self, inverse: &InverseEvent) -> Result<()>;
}

fn color_slot(node: &mut Node, channel: Channel) -> &mut Option<Color> {
    match channel {
        Channel::Base => &mut node.base_color,
        Channel::Highlight => &mut node.highlight_color,
    }
}

impl EntityState for Node {
    fn apply_forward(&mut self, event: &Event) -> Result<InverseEvent> {
        match event {
            Event::NodePosition { node, target, .. } => Ok(InverseEvent::NodePosition {
                node: *node,
                previous: std::mem::replace(&mut self.position, *target),
            }),
            Event::NodeOrientation { node, target, .. } => Ok(InverseEvent::NodeOrientation {
                node: *node,
                previous: std::mem::replace(&mut self.orientation, *target),
            }),
            Event::NodeColor {
                node,
                channel,
                target,
                ..
            } => Ok(InverseEvent::NodeColor {
                node: *node,
                channel: *channel,
                previous: std::mem::replace(color_slot(self, *channel), *target),
            }),
            other => Err(Error::mismatch(other.kind(), self.id)),
        }
    }

    fn apply_inverse(&mut self, inverse: &InverseEvent) -> Result<()> {
        match inverse {
            InverseEvent::NodePosition { previous, .. } => self.position = *previous,
            InverseEvent::NodeOrientation { previous, .. } => self.orientation = *previous,
            InverseEvent::NodeColor {
                channel, previous, ..
            } => *color_slot(self, *channel) = *previous,
            other => return Err(Error::mismatch(other.kind(), self.id)),
        }
        Ok(())
    }
}

impl EntityState for Decoration {
    fn apply_forward(&mut self, event: &Event) -> Result<InverseEvent> {
        match event {
            Event::DecorationPosition { decoration, target, .. } => Ok(InverseEvent::DecorationPosition {
                decoration: *decoration,
                previous: std::mem::replace(&mut self.position, *target),
            }),
            Event::DecorationOrientation { decoration, target, .. } => {
                Ok(InverseEvent::DecorationOrientation {
                    decoration: *decoration,
                    previous: std::mem::replace(&mut self.orientation, *target),
                })
            }
            other => Err(Error::mismatch(other.kind(), self.id)),
        }
    }

    fn apply_inverse(&mut self, inverse: &InverseEvent) -> Result<()> {
        match inverse {
            InverseEvent::DecorationPosition { previous, .. } => self.position = *previous,
            InverseEvent::DecorationOrientation { previous, .. } => self.orientation = *previous,
            other => return Err(Error::mismatch(other.kind(), self.id)),
        }
        Ok(())
    }
}

impl EntityState for Series {
    fn apply_forward(&mut self, event: &Event) -> Result<InverseEvent> {
        match (self, event) {
            (Series::Xy(s), Event::SeriesAppend { series, x, y, .. }) => {
                let previous_len = s.points.len();
                s.points.push((*x, *y));
                Ok(InverseEvent::SeriesAppend {
                    series: *series,
                    previous_len,
                })
            }
            (
                Series::CategoryValue(s),
                Event::CategorySeriesAppend {
                    series,
                    category,
                    value,
                    ..
                },
            ) => {
                let previous_len = s.points.len();
                s.points.push((*category, *value));
                Ok(InverseEvent::CategorySeriesAppend {
                    series: *series,
                    previous_len,
                })
            }
            (this, other) => Err(Error::mismatch(other.kind(), this.id())),
        }
    }

    fn apply_inverse(&mut self, inverse: &InverseEvent) -> Result<()> {
        match (self, inverse) {
            (Series::Xy(s), InverseEvent::SeriesAppend { previous_len, .. }) => {
                s.points.truncate(*previous_len)
            }
            (Series::CategoryValue(s), InverseEvent::CategorySeriesAppend { previous_len, .. }) => {
                s.points.truncate(*previous_len)
            }
            (this, other) => return Err(Error::mismatch(other.kind(), this.id())),
        }
        Ok(())
    }
}

impl EntityState for LogStream {
    fn apply_forward(&mut self, event: &Event) -> Result<InverseEvent> {
        match event {
            Event::StreamAppend { stream, data, .. } => {
                let previous_len = self.entries.len();
                self.entries.push(data.clone());
                Ok(InverseEvent::StreamAppend {
                    stream: *stream,
                    previous_len,
                })
            }
            other => Err(Error::mismatch(other.kind(), self.id)),
        }
    }

    fn apply_inverse(&mut self, inverse: &InverseEvent) -> Result<()> {
        match inverse {
            InverseEvent::StreamAppend { previous_len, .. } => self.entries.truncate(*previous_len),
            other => return Err(Error::mismatch(other.kind(), self.id)),
        }
        Ok(())
    }
}
