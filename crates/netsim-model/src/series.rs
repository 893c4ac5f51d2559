//! Chart series and log streams.
//!
//! These are containers: created once from the `series` / `streams`
//! sections, then grown by append events during playback.

use crate::color::Color;
use crate::ids::{SeriesId, StreamId};

/// How consecutive points of an XY series are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Connection {
    /// Scatter plot
    None,
    /// Straight segments
    #[default]
    Line,
    /// Smoothed curve
    Spline,
}

/// A two-dimensional numeric series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XySeries {
    pub id: SeriesId,
    pub name: String,
    pub connection: Connection,
    pub color: Option<Color>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub points: Vec<(f64, f64)>,
}

/// One named bucket of a category series.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Category {
    pub id: u32,
    pub name: String,
}

/// A series of values plotted against named categories.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoryValueSeries {
    pub id: SeriesId,
    pub name: String,
    pub color: Option<Color>,
    pub categories: Vec<Category>,
    /// (category id, value) in append order
    pub points: Vec<(u32, f64)>,
}

impl CategoryValueSeries {
    /// True if `category` is one of this series' buckets.
    pub fn has_category(&self, category: u32) -> bool {
        self.categories.iter().any(|c| c.id == category)
    }
}

/// A named grouping of other series, displayed on one chart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesCollection {
    pub id: SeriesId,
    pub name: String,
    pub series: Vec<SeriesId>,
}

/// Every kind of entry in the `series` section.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "kebab-case"))]
pub enum Series {
    Xy(XySeries),
    CategoryValue(CategoryValueSeries),
    Collection(SeriesCollection),
}

impl Series {
    /// The id shared by all series kinds.
    pub fn id(&self) -> SeriesId {
        match self {
            Series::Xy(s) => s.id,
            Series::CategoryValue(s) => s.id,
            Series::Collection(s) => s.id,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Series::Xy(s) => &s.name,
            Series::CategoryValue(s) => &s.name,
            Series::Collection(s) => &s.name,
        }
    }

    /// Number of appended points; collections hold none.
    pub fn len(&self) -> usize {
        match self {
            Series::Xy(s) => s.points.len(),
            Series::CategoryValue(s) => s.points.len(),
            Series::Collection(_) => 0,
        }
    }

    /// True if no points have been appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A scenario log: text appended over time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogStream {
    pub id: StreamId,
    pub name: String,
    pub color: Option<Color>,
    /// Appended chunks, in order
    pub entries: Vec<String>,
}

impl LogStream {
    /// All appended text as one string.
    pub fn text(&self) -> String {
        self.entries.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_accessors() {
        let xy = Series::Xy(XySeries {
            id: SeriesId(2),
            name: "throughput".into(),
            connection: Connection::default(),
            color: None,
            x_label: None,
            y_label: None,
            points: vec![(0.0, 1.0), (1.0, 2.0)],
        });
        assert_eq!(xy.id(), SeriesId(2));
        assert_eq!(xy.name(), "throughput");
        assert_eq!(xy.len(), 2);

        let collection = Series::Collection(SeriesCollection {
            id: SeriesId(3),
            name: "all".into(),
            series: vec![SeriesId(2)],
        });
        assert!(collection.is_empty());
    }

    #[test]
    fn category_lookup() {
        let series = CategoryValueSeries {
            id: SeriesId(0),
            name: "state".into(),
            color: None,
            categories: vec![
                Category { id: 0, name: "idle".into() },
                Category { id: 1, name: "tx".into() },
            ],
            points: Vec::new(),
        };
        assert!(series.has_category(1));
        assert!(!series.has_category(5));
    }

    #[test]
    fn stream_text_concatenates() {
        let stream = LogStream {
            id: StreamId(0),
            name: "log".into(),
            color: None,
            entries: vec!["a\n".into(), "b\n".into()],
        };
        assert_eq!(stream.text(), "a\nb\n");
    }
}
