//! Reading a whole scenario file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use netsim_model::{Building, Configuration, Decoration, Event, LogStream, Node, Series};

use crate::builder::DocumentBuilder;
use crate::error::{Result, Warning};
use crate::factory::{EntityFactory, SchemaPolicy};
use crate::tokenizer::tokenize;

/// Everything read from one scenario document.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub configuration: Configuration,
    pub nodes: Vec<Node>,
    pub buildings: Vec<Building>,
    pub decorations: Vec<Decoration>,
    pub series: Vec<Series>,
    pub streams: Vec<LogStream>,
    /// Sorted by time; ties keep file order
    pub events: Vec<Event>,
    /// Records dropped under [`SchemaPolicy::SkipRecord`]
    pub warnings: Vec<Warning>,
}

impl Scenario {
    /// Time of the last event, or zero for a static scene.
    pub fn end_time(&self) -> f64 {
        self.events.last().map_or(0.0, Event::time)
    }
}

/// Options for one parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub schema_policy: SchemaPolicy,
}

/// Parse a scenario from any byte source.
pub fn parse_reader<R: Read>(reader: R, options: ParseOptions) -> Result<Scenario> {
    let mut builder = DocumentBuilder::new(EntityFactory::new(options.schema_policy));
    tokenize(reader, &mut builder)?;
    let records = builder.dispatched();
    let scenario = builder.finish()?.finish()?;

    tracing::info!(
        records,
        nodes = scenario.nodes.len(),
        buildings = scenario.buildings.len(),
        decorations = scenario.decorations.len(),
        series = scenario.series.len(),
        streams = scenario.streams.len(),
        events = scenario.events.len(),
        skipped = scenario.warnings.len(),
        "scenario parsed"
    );
    Ok(scenario)
}

/// Parse a scenario held in memory.
pub fn parse_str(input: &str, options: ParseOptions) -> Result<Scenario> {
    parse_reader(input.as_bytes(), options)
}

/// Open and parse a scenario file.
pub fn parse_file(path: impl AsRef<Path>, options: ParseOptions) -> Result<Scenario> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "opening scenario");
    parse_reader(File::open(path)?, options)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use netsim_model::{Channel, Color, NodeId, Vec3};

    use super::*;
    use crate::error::Error;
    use crate::section::Section;

    const SMALL: &str = r#"{
        "configuration": {"ms-per-frame": 20, "module-version": "1.0.3"},
        "nodes": [
            {"id": 0, "position": [0, 0, 0], "name": "sink", "base-color": [10, 20, 30]},
            {"id": 1, "position": [10, 5, 1], "scale": 2}
        ],
        "decorations": [{"id": 0, "position": [-3, 0, 0]}],
        "series": [
            {"type": "xy-series", "id": 0, "name": "throughput", "x-label": "s", "y-label": "Mb/s"}
        ],
        "streams": [{"id": 0, "name": "log"}],
        "events": [
            {"type": "node-position", "id": 1, "time": 5.0, "target": [20, 5, 1]},
            {"type": "xy-series-append", "series-id": 0, "time": 1.0, "x": 1, "y": 2.5},
            {"type": "stream-append", "stream-id": 0, "time": 3.0, "data": "hello\n"},
            {"type": "node-color", "id": 0, "time": 4.0, "channel": "base", "target": [1, 1, 1]}
        ],
        "future-section": {"ignored": true}
    }"#;

    #[test]
    fn reads_every_section() {
        let scenario = parse_str(SMALL, ParseOptions::default()).unwrap();
        assert_eq!(scenario.configuration.ms_per_frame, 20.0);
        assert_eq!(scenario.configuration.module_version.as_deref(), Some("1.0.3"));
        assert_eq!(scenario.nodes.len(), 2);
        assert_eq!(scenario.nodes[0].name.as_deref(), Some("sink"));
        assert_eq!(scenario.nodes[1].scale, Vec3::splat(2.0));
        assert_eq!(scenario.decorations.len(), 1);
        assert_eq!(scenario.series.len(), 1);
        assert_eq!(scenario.streams.len(), 1);
        assert!(scenario.warnings.is_empty());

        let times: Vec<f64> = scenario.events.iter().map(Event::time).collect();
        assert_eq!(times, vec![1.0, 3.0, 4.0, 5.0]);
        assert_eq!(scenario.end_time(), 5.0);
    }

    #[test]
    fn bounds_cover_entities_and_motion() {
        let scenario = parse_str(SMALL, ParseOptions::default()).unwrap();
        let bounds = scenario.configuration.bounds.unwrap();
        assert_eq!(bounds.min, Vec3::new(-3.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(20.0, 5.0, 1.0));
    }

    #[test]
    fn single_node_document() {
        let input = r#"{"nodes":[{"id":0,"position":[0,0,0],"orientation":[0,0,0],"scale":[1,1,1],"visible":true}]}"#;
        let scenario = parse_str(input, ParseOptions::default()).unwrap();
        assert_eq!(scenario.nodes.len(), 1);
        let node = &scenario.nodes[0];
        assert_eq!(node.id, NodeId(0));
        assert_eq!(node.position, Vec3::ZERO);
        assert_eq!(node.scale, Vec3::ONE);
        assert!(node.visible);
        assert_eq!(node.base_color, None);
    }

    #[test]
    fn object_colors_and_orientation() {
        let input = r#"{"nodes": [{"id": 4, "position": [1.5, 2, 0],
            "orientation": [0, 0, 90], "highlight-color": {"red": 255, "green": 0, "blue": 0}}]}"#;
        let node = parse_str(input, ParseOptions::default()).unwrap().nodes.remove(0);
        assert_eq!(node.id, NodeId(4));
        assert_eq!(node.orientation, Vec3::new(0.0, 0.0, 90.0));
        assert_eq!(node.highlight_color, Some(Color::new(255, 0, 0)));
    }

    #[test]
    fn color_events_keep_their_channel() {
        let scenario = parse_str(SMALL, ParseOptions::default()).unwrap();
        let color = scenario
            .events
            .iter()
            .find(|e| matches!(e, Event::NodeColor { .. }))
            .unwrap();
        assert!(matches!(color, Event::NodeColor { channel: Channel::Base, .. }));
    }

    #[test]
    fn empty_document_is_an_empty_scene() {
        let scenario = parse_str("{}", ParseOptions::default()).unwrap();
        assert!(scenario.nodes.is_empty());
        assert_eq!(scenario.configuration, Configuration::default());
        assert_eq!(scenario.end_time(), 0.0);
    }

    #[test]
    fn truncated_input_is_a_syntax_error() {
        let cut = &SMALL[..SMALL.len() / 2];
        assert!(matches!(
            parse_str(cut, ParseOptions::default()),
            Err(Error::Syntax { .. })
        ));
    }

    #[test]
    fn bad_record_aborts_by_default() {
        let input = r#"{"nodes": [{"id": 0, "position": [0, 0, 0]}, {"id": 1}]}"#;
        let err = parse_str(input, ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Schema { section: Section::Nodes, .. }));
    }

    #[test]
    fn bad_record_is_skipped_on_request() {
        let input = r#"{"nodes": [{"id": 0, "position": [0, 0, 0]}, {"id": 1}, {"id": 2, "position": [1, 1, 1]}]}"#;
        let options = ParseOptions {
            schema_policy: SchemaPolicy::SkipRecord,
        };
        let scenario = parse_str(input, options).unwrap();
        assert_eq!(scenario.nodes.len(), 2);
        assert_eq!(scenario.warnings.len(), 1);
        assert_eq!(scenario.warnings[0].section, Section::Nodes);
    }

    #[test]
    fn section_shape_error_ignores_policy() {
        let input = r#"{"nodes": {"id": 0}}"#;
        let options = ParseOptions {
            schema_policy: SchemaPolicy::SkipRecord,
        };
        assert!(matches!(parse_str(input, options), Err(Error::Schema { .. })));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SMALL.as_bytes()).unwrap();
        let scenario = parse_file(file.path(), ParseOptions::default()).unwrap();
        assert_eq!(scenario.nodes.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_file(dir.path().join("absent.json"), ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
