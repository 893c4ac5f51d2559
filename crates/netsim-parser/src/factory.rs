//! Typed entities from completed section records.
//!
//! [`EntityFactory`] is the [`SectionHandler`] the scenario reader plugs
//! into the document builder. Each record is validated and converted as
//! soon as it closes; the factory keeps only the typed results plus the id
//! tables needed to reject duplicates and dangling references.

use std::collections::{BTreeMap, HashMap, HashSet};

use netsim_model::{
    Building, BuildingId, Category, CategoryValueSeries, Channel, Color, Configuration, Connection,
    Decoration, DecorationId, Event, EventKind, LogStream, Node, NodeId, Series, SeriesCollection,
    SeriesId, StreamId, Vec3, XySeries,
};

use crate::builder::SectionHandler;
use crate::error::{Error, Result, Warning};
use crate::scenario::Scenario;
use crate::section::Section;
use crate::value::DocumentValue;

/// What to do when a single record fails schema or range validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaPolicy {
    /// Fail the whole load on the first bad record.
    #[default]
    Abort,
    /// Drop the bad record, keep a [`Warning`], carry on.
    SkipRecord,
}

impl SchemaPolicy {
    /// Parse a policy name (`abort` or `skip`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "abort" => Some(SchemaPolicy::Abort),
            "skip" | "skip-record" => Some(SchemaPolicy::SkipRecord),
            _ => None,
        }
    }
}

/// Field access for one record, with errors attributed to its section.
struct Record<'a> {
    section: Section,
    fields: &'a BTreeMap<String, DocumentValue>,
}

impl<'a> Record<'a> {
    fn new(section: Section, value: &'a DocumentValue) -> Result<Self> {
        value
            .as_object()
            .map(|fields| Self { section, fields })
            .ok_or_else(|| {
                Error::schema(
                    section,
                    format!("record must be an object, found {}", value.type_name()),
                )
            })
    }

    /// A present, non-null field.
    fn get(&self, key: &str) -> Option<&'a DocumentValue> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    fn require(&self, key: &str) -> Result<&'a DocumentValue> {
        self.get(key)
            .ok_or_else(|| Error::schema(self.section, format!("missing required field '{key}'")))
    }

    fn mistyped(&self, key: &str, expected: &str, found: &DocumentValue) -> Error {
        Error::schema(
            self.section,
            format!("field '{key}' must be {expected}, found {}", found.type_name()),
        )
    }

    fn out_of_range(&self, key: &str, message: impl Into<String>) -> Error {
        Error::range(self.section, key, message)
    }

    fn number(&self, key: &str, value: &DocumentValue) -> Result<f64> {
        let n = value
            .as_f64()
            .ok_or_else(|| self.mistyped(key, "a number", value))?;
        if !n.is_finite() {
            return Err(self.out_of_range(key, "must be finite"));
        }
        Ok(n)
    }

    fn f64(&self, key: &str) -> Result<f64> {
        self.number(key, self.require(key)?)
    }

    fn opt_f64(&self, key: &str) -> Result<Option<f64>> {
        self.get(key).map(|v| self.number(key, v)).transpose()
    }

    fn opt_positive_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.opt_f64(key)? {
            Some(v) if v <= 0.0 => Err(self.out_of_range(key, format!("{v} is not positive"))),
            other => Ok(other),
        }
    }

    fn unsigned(&self, key: &str, value: &DocumentValue) -> Result<u32> {
        let n = value
            .as_integer()
            .ok_or_else(|| self.mistyped(key, "an integer", value))?;
        u32::try_from(n).map_err(|_| self.out_of_range(key, format!("{n} is not in 0..={}", u32::MAX)))
    }

    fn u32(&self, key: &str) -> Result<u32> {
        self.unsigned(key, self.require(key)?)
    }

    fn positive_u32(&self, key: &str, value: &DocumentValue) -> Result<u32> {
        match self.unsigned(key, value)? {
            0 => Err(self.out_of_range(key, "must be at least 1")),
            n => Ok(n),
        }
    }

    fn id(&self) -> Result<u32> {
        self.u32("id")
    }

    fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| self.mistyped(key, "a boolean", v)),
        }
    }

    fn str(&self, key: &str) -> Result<&'a str> {
        let v = self.require(key)?;
        v.as_str().ok_or_else(|| self.mistyped(key, "a string", v))
    }

    fn opt_string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.mistyped(key, "a string", v)),
        }
    }

    fn triple(&self, key: &str, value: &DocumentValue) -> Result<Vec3> {
        match value.as_array() {
            Some([x, y, z]) => Ok(Vec3::new(
                self.number(key, x)?,
                self.number(key, y)?,
                self.number(key, z)?,
            )),
            _ => Err(self.mistyped(key, "a 3-element array", value)),
        }
    }

    fn vec3(&self, key: &str) -> Result<Vec3> {
        self.triple(key, self.require(key)?)
    }

    fn opt_vec3(&self, key: &str) -> Result<Option<Vec3>> {
        self.get(key).map(|v| self.triple(key, v)).transpose()
    }

    /// Scale is a 3-element array or one number applied to every axis.
    fn scale(&self, key: &str) -> Result<Vec3> {
        match self.get(key) {
            None => Ok(Vec3::ONE),
            Some(v @ DocumentValue::Array(_)) => self.triple(key, v),
            Some(v) => self.number(key, v).map(Vec3::splat),
        }
    }

    fn channel(&self, key: &str, value: &DocumentValue) -> Result<u8> {
        let n = value
            .as_integer()
            .ok_or_else(|| self.mistyped(key, "an integer color channel", value))?;
        u8::try_from(n).map_err(|_| self.out_of_range(key, format!("color channel {n} is not in 0..=255")))
    }

    /// `[r, g, b]` or `{"red": r, "green": g, "blue": b}`.
    fn color(&self, key: &str, value: &DocumentValue) -> Result<Color> {
        match value {
            DocumentValue::Array(items) => match items.as_slice() {
                [r, g, b] => Ok(Color::new(
                    self.channel(key, r)?,
                    self.channel(key, g)?,
                    self.channel(key, b)?,
                )),
                _ => Err(self.mistyped(key, "a 3-element color", value)),
            },
            DocumentValue::Object(channels) => {
                let component = |name: &str| {
                    channels
                        .get(name)
                        .ok_or_else(|| Error::schema(self.section, format!("color '{key}' is missing '{name}'")))
                        .and_then(|v| self.channel(key, v))
                };
                Ok(Color::new(component("red")?, component("green")?, component("blue")?))
            }
            other => Err(self.mistyped(key, "a color", other)),
        }
    }

    fn opt_color(&self, key: &str) -> Result<Option<Color>> {
        self.get(key).map(|v| self.color(key, v)).transpose()
    }

    fn time(&self) -> Result<f64> {
        match self.f64("time")? {
            t if t < 0.0 => Err(self.out_of_range("time", format!("{t} is negative"))),
            t => Ok(t),
        }
    }
}

/// Parse one `nodes` record.
pub fn parse_node(value: &DocumentValue) -> Result<Node> {
    let r = Record::new(Section::Nodes, value)?;
    Ok(Node {
        id: NodeId(r.id()?),
        name: r.opt_string("name")?,
        model: r.opt_string("model")?,
        position: r.vec3("position")?,
        orientation: r.opt_vec3("orientation")?.unwrap_or(Vec3::ZERO),
        scale: r.scale("scale")?,
        offset: r.opt_vec3("offset")?.unwrap_or(Vec3::ZERO),
        height: r.opt_positive_f64("height")?,
        base_color: r.opt_color("base-color")?,
        highlight_color: r.opt_color("highlight-color")?,
        visible: r.bool_or("visible", true)?,
    })
}

/// Parse one `buildings` record.
pub fn parse_building(value: &DocumentValue) -> Result<Building> {
    let r = Record::new(Section::Buildings, value)?;
    let floors = r.positive_u32("floors", r.require("floors")?)?;
    let rooms = match r.require("rooms")? {
        DocumentValue::Array(items) if items.len() == 2 => {
            (r.positive_u32("rooms", &items[0])?, r.positive_u32("rooms", &items[1])?)
        }
        other => return Err(r.mistyped("rooms", "a 2-element array", other)),
    };
    let min = r.vec3("min")?;
    let max = r.vec3("max")?;
    if min.x > max.x || min.y > max.y || min.z > max.z {
        return Err(r.out_of_range("max", format!("{max} is below min {min}")));
    }
    Ok(Building {
        id: BuildingId(r.id()?),
        color: r.opt_color("color")?,
        floors,
        rooms,
        min,
        max,
        visible: r.bool_or("visible", true)?,
    })
}

/// Parse one `decorations` record.
pub fn parse_decoration(value: &DocumentValue) -> Result<Decoration> {
    let r = Record::new(Section::Decorations, value)?;
    Ok(Decoration {
        id: DecorationId(r.id()?),
        model: r.opt_string("model")?,
        position: r.vec3("position")?,
        orientation: r.opt_vec3("orientation")?.unwrap_or(Vec3::ZERO),
        scale: r.scale("scale")?,
    })
}

/// Parse one `streams` record.
pub fn parse_stream(value: &DocumentValue) -> Result<LogStream> {
    let r = Record::new(Section::Streams, value)?;
    Ok(LogStream {
        id: StreamId(r.id()?),
        name: r.str("name")?.to_string(),
        color: r.opt_color("color")?,
        entries: Vec::new(),
    })
}

/// Apply the `configuration` object to `config`. Bounds are left alone.
pub fn parse_configuration(value: &DocumentValue, config: &mut Configuration) -> Result<()> {
    let r = Record::new(Section::Configuration, value)?;
    if let Some(ms) = r.opt_positive_f64("ms-per-frame")? {
        config.ms_per_frame = ms;
    }
    config.time_step = r.opt_positive_f64("time-step")?;
    config.module_version = match r.get("module-version") {
        None => None,
        Some(DocumentValue::String(s)) => Some(s.clone()),
        Some(DocumentValue::Object(parts)) => {
            let part = |name: &str| {
                parts
                    .get(name)
                    .and_then(DocumentValue::as_integer)
                    .map_or_else(|| "?".to_string(), |n| n.to_string())
            };
            Some(format!("{}.{}.{}", part("major"), part("minor"), part("patch")))
        }
        Some(other) => return Err(r.mistyped("module-version", "a string or version object", other)),
    };
    Ok(())
}

/// Section handler producing a [`Scenario`].
#[derive(Debug, Default)]
pub struct EntityFactory {
    policy: SchemaPolicy,
    configured: bool,
    scenario: Scenario,
    node_ids: HashSet<NodeId>,
    building_ids: HashSet<BuildingId>,
    decoration_ids: HashSet<DecorationId>,
    series_index: HashMap<SeriesId, usize>,
    stream_ids: HashSet<StreamId>,
}

impl EntityFactory {
    /// Create a factory with the given record failure policy.
    pub fn new(policy: SchemaPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Records read so far, without the end-of-input checks.
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    fn reject(&mut self, section: Section, err: Error) -> Result<()> {
        if self.policy == SchemaPolicy::SkipRecord && err.is_record_scoped() {
            tracing::warn!(section = %section, "skipping record: {}", err);
            self.scenario.warnings.push(Warning {
                section,
                message: err.to_string(),
            });
            return Ok(());
        }
        Err(err)
    }

    fn duplicate(section: Section, id: impl std::fmt::Display) -> Error {
        Error::schema(section, format!("duplicate id {id}"))
    }

    fn build(&mut self, section: Section, record: &DocumentValue) -> Result<()> {
        match section {
            Section::Configuration => {
                if self.configured {
                    return Err(Error::schema(section, "configuration given more than once"));
                }
                parse_configuration(record, &mut self.scenario.configuration)?;
                self.configured = true;
            }
            Section::Nodes => {
                let node = parse_node(record)?;
                if !self.node_ids.insert(node.id) {
                    return Err(Self::duplicate(section, node.id));
                }
                self.scenario.configuration.include_location(node.position);
                self.scenario.nodes.push(node);
            }
            Section::Buildings => {
                let building = parse_building(record)?;
                if !self.building_ids.insert(building.id) {
                    return Err(Self::duplicate(section, building.id));
                }
                self.scenario.configuration.include_location(building.min);
                self.scenario.configuration.include_location(building.max);
                self.scenario.buildings.push(building);
            }
            Section::Decorations => {
                let decoration = parse_decoration(record)?;
                if !self.decoration_ids.insert(decoration.id) {
                    return Err(Self::duplicate(section, decoration.id));
                }
                self.scenario.configuration.include_location(decoration.position);
                self.scenario.decorations.push(decoration);
            }
            Section::Series => {
                let series = self.parse_series(record)?;
                let id = series.id();
                if self.series_index.contains_key(&id) {
                    return Err(Self::duplicate(section, id));
                }
                self.series_index.insert(id, self.scenario.series.len());
                self.scenario.series.push(series);
            }
            Section::Streams => {
                let stream = parse_stream(record)?;
                if !self.stream_ids.insert(stream.id) {
                    return Err(Self::duplicate(section, stream.id));
                }
                self.scenario.streams.push(stream);
            }
            Section::Events => {
                let event = self.parse_event(record)?;
                match &event {
                    Event::NodePosition { target, .. } | Event::DecorationPosition { target, .. } => {
                        self.scenario.configuration.include_location(*target)
                    }
                    _ => {}
                }
                self.scenario.events.push(event);
            }
            Section::None => {}
        }
        Ok(())
    }

    fn registered_series(&self, id: SeriesId) -> Option<&Series> {
        self.series_index.get(&id).map(|&i| &self.scenario.series[i])
    }

    fn parse_series(&self, value: &DocumentValue) -> Result<Series> {
        let r = Record::new(Section::Series, value)?;
        let id = SeriesId(r.id()?);
        let name = r.str("name")?.to_string();

        match r.str("type")? {
            "xy-series" => {
                let connection = match r.get("connection").map(|v| (v, v.as_str())) {
                    None => Connection::default(),
                    Some((_, Some("none"))) => Connection::None,
                    Some((_, Some("line"))) => Connection::Line,
                    Some((_, Some("spline"))) => Connection::Spline,
                    Some((_, Some(other))) => {
                        return Err(Error::schema(Section::Series, format!("unknown connection '{other}'")))
                    }
                    Some((v, None)) => return Err(r.mistyped("connection", "a string", v)),
                };
                Ok(Series::Xy(XySeries {
                    id,
                    name,
                    connection,
                    color: r.opt_color("color")?,
                    x_label: r.opt_string("x-label")?,
                    y_label: r.opt_string("y-label")?,
                    points: Vec::new(),
                }))
            }
            "category-value-series" => {
                let entries = match r.require("categories")? {
                    DocumentValue::Array(items) => items,
                    other => return Err(r.mistyped("categories", "an array", other)),
                };
                let mut categories = Vec::with_capacity(entries.len());
                for entry in entries {
                    let c = Record::new(Section::Series, entry)?;
                    let category = Category {
                        id: c.id()?,
                        name: c.str("name")?.to_string(),
                    };
                    if categories.iter().any(|existing: &Category| existing.id == category.id) {
                        return Err(Error::schema(
                            Section::Series,
                            format!("duplicate category {} in {id}", category.id),
                        ));
                    }
                    categories.push(category);
                }
                Ok(Series::CategoryValue(CategoryValueSeries {
                    id,
                    name,
                    color: r.opt_color("color")?,
                    categories,
                    points: Vec::new(),
                }))
            }
            "series-collection" => {
                let members = match r.require("series")? {
                    DocumentValue::Array(items) => items,
                    other => return Err(r.mistyped("series", "an array", other)),
                };
                let mut series = Vec::with_capacity(members.len());
                for member in members {
                    let child = SeriesId(r.unsigned("series", member)?);
                    match self.registered_series(child) {
                        Some(Series::Xy(_)) | Some(Series::CategoryValue(_)) => series.push(child),
                        Some(Series::Collection(_)) => {
                            return Err(Error::schema(
                                Section::Series,
                                format!("collection {id} cannot contain collection {child}"),
                            ))
                        }
                        None => {
                            return Err(Error::schema(
                                Section::Series,
                                format!("collection {id} references unknown {child}"),
                            ))
                        }
                    }
                }
                Ok(Series::Collection(SeriesCollection { id, name, series }))
            }
            other => Err(Error::schema(Section::Series, format!("unknown series type '{other}'"))),
        }
    }

    fn parse_event(&self, value: &DocumentValue) -> Result<Event> {
        let r = Record::new(Section::Events, value)?;
        let discriminator = r.str("type")?;
        let kind = EventKind::from_discriminator(discriminator).ok_or_else(|| {
            Error::schema(Section::Events, format!("unknown event type '{discriminator}'"))
        })?;
        let time = r.time()?;

        let event = match kind {
            EventKind::NodePosition => Event::NodePosition {
                node: NodeId(r.id()?),
                time,
                target: r.vec3("target")?,
            },
            EventKind::NodeOrientation => Event::NodeOrientation {
                node: NodeId(r.id()?),
                time,
                target: r.vec3("target")?,
            },
            EventKind::NodeColor => {
                let name = r.str("channel")?;
                let channel = Channel::from_name(name).ok_or_else(|| {
                    Error::schema(Section::Events, format!("unknown color channel '{name}'"))
                })?;
                Event::NodeColor {
                    node: NodeId(r.id()?),
                    time,
                    channel,
                    target: r.opt_color("target")?,
                }
            }
            EventKind::DecorationPosition => Event::DecorationPosition {
                decoration: DecorationId(r.id()?),
                time,
                target: r.vec3("target")?,
            },
            EventKind::DecorationOrientation => Event::DecorationOrientation {
                decoration: DecorationId(r.id()?),
                time,
                target: r.vec3("target")?,
            },
            EventKind::SeriesAppend => {
                let series = SeriesId(r.u32("series-id")?);
                match self.registered_series(series) {
                    Some(Series::Xy(_)) => {}
                    _ => return Err(unresolved(kind, series)),
                }
                Event::SeriesAppend {
                    series,
                    time,
                    x: r.f64("x")?,
                    y: r.f64("y")?,
                }
            }
            EventKind::CategorySeriesAppend => {
                let series = SeriesId(r.u32("series-id")?);
                let category = r.u32("category")?;
                match self.registered_series(series) {
                    Some(Series::CategoryValue(s)) if s.has_category(category) => {}
                    Some(Series::CategoryValue(_)) => {
                        return Err(Error::schema(
                            Section::Events,
                            format!("{series} has no category {category}"),
                        ))
                    }
                    _ => return Err(unresolved(kind, series)),
                }
                Event::CategorySeriesAppend {
                    series,
                    time,
                    category,
                    value: r.f64("value")?,
                }
            }
            EventKind::StreamAppend => {
                let stream = StreamId(r.u32("stream-id")?);
                if !self.stream_ids.contains(&stream) {
                    return Err(unresolved(kind, stream));
                }
                Event::StreamAppend {
                    stream,
                    time,
                    data: r.str("data")?.to_string(),
                }
            }
        };
        Ok(event)
    }

    /// End of input: drop or reject events aimed at entities that never
    /// appeared, then order the timeline.
    pub fn finish(mut self) -> Result<Scenario> {
        let events = std::mem::take(&mut self.scenario.events);
        let mut kept = Vec::with_capacity(events.len());
        for event in events {
            let dangling = match (event.node(), event.decoration()) {
                (Some(id), _) if !self.node_ids.contains(&id) => Some(id.to_string()),
                (_, Some(id)) if !self.decoration_ids.contains(&id) => Some(id.to_string()),
                _ => None,
            };
            match dangling {
                None => kept.push(event),
                Some(target) => {
                    let err = Error::schema(
                        Section::Events,
                        format!("{} event at {} references unknown {target}", event.kind(), event.time()),
                    );
                    self.reject(Section::Events, err)?;
                }
            }
        }

        if kept.windows(2).any(|w| w[0].time() > w[1].time()) {
            tracing::warn!("events are not in time order; sorting");
            kept.sort_by(|a, b| a.time().total_cmp(&b.time()));
        }
        self.scenario.events = kept;
        Ok(self.scenario)
    }
}

fn unresolved(kind: EventKind, target: impl std::fmt::Display) -> Error {
    Error::schema(Section::Events, format!("{kind} references unregistered {target}"))
}

impl SectionHandler for EntityFactory {
    fn handle(&mut self, section: Section, record: DocumentValue) -> Result<()> {
        match self.build(section, &record) {
            Ok(()) => Ok(()),
            Err(err) => self.reject(section, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(s: &str) -> DocumentValue {
        fn convert(v: serde_json::Value) -> DocumentValue {
            match v {
                serde_json::Value::Null => DocumentValue::Null,
                serde_json::Value::Bool(b) => DocumentValue::Bool(b),
                serde_json::Value::Number(n) => match (n.as_u64(), n.as_i64()) {
                    (Some(u), _) => DocumentValue::Unsigned(u),
                    (None, Some(i)) => DocumentValue::Integer(i),
                    _ => DocumentValue::Float(n.as_f64().unwrap_or_default()),
                },
                serde_json::Value::String(s) => DocumentValue::String(s),
                serde_json::Value::Array(items) => DocumentValue::Array(items.into_iter().map(convert).collect()),
                serde_json::Value::Object(map) => {
                    DocumentValue::Object(map.into_iter().map(|(k, v)| (k, convert(v))).collect())
                }
            }
        }
        convert(serde_json::from_str(s).unwrap())
    }

    #[test]
    fn node_defaults_are_explicit() {
        let node = parse_node(&json(r#"{"id": 3, "position": [1, 2, 3]}"#)).unwrap();
        assert_eq!(node.id, NodeId(3));
        assert_eq!(node.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(node.orientation, Vec3::ZERO);
        assert_eq!(node.scale, Vec3::ONE);
        assert_eq!(node.base_color, None);
        assert_eq!(node.height, None);
        assert!(node.visible);
    }

    #[test]
    fn node_requires_id_and_position() {
        assert!(matches!(
            parse_node(&json(r#"{"position": [0, 0, 0]}"#)),
            Err(Error::Schema { section: Section::Nodes, .. })
        ));
        assert!(matches!(
            parse_node(&json(r#"{"id": 0, "position": [0, 0]}"#)),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn colors_accept_both_spellings() {
        let node = parse_node(&json(
            r#"{"id": 0, "position": [0,0,0],
                "base-color": [255, 0, 10],
                "highlight-color": {"red": 1, "green": 2, "blue": 3}}"#,
        ))
        .unwrap();
        assert_eq!(node.base_color, Some(Color::new(255, 0, 10)));
        assert_eq!(node.highlight_color, Some(Color::new(1, 2, 3)));

        assert!(matches!(
            parse_node(&json(r#"{"id": 0, "position": [0,0,0], "base-color": [256, 0, 0]}"#)),
            Err(Error::Range { .. })
        ));
    }

    #[test]
    fn scalar_scale_is_broadcast() {
        let deco = parse_decoration(&json(r#"{"id": 1, "position": [0,0,0], "scale": 2.5}"#)).unwrap();
        assert_eq!(deco.scale, Vec3::splat(2.5));
    }

    #[test]
    fn building_counts_must_be_positive() {
        let ok = r#"{"id": 0, "floors": 2, "rooms": [1, 3], "min": [0,0,0], "max": [4,4,6]}"#;
        let building = parse_building(&json(ok)).unwrap();
        assert_eq!(building.rooms, (1, 3));

        let no_floors = r#"{"id": 0, "floors": 0, "rooms": [1, 1], "min": [0,0,0], "max": [1,1,1]}"#;
        assert!(matches!(parse_building(&json(no_floors)), Err(Error::Range { .. })));

        let inverted = r#"{"id": 0, "floors": 1, "rooms": [1, 1], "min": [2,0,0], "max": [1,1,1]}"#;
        assert!(matches!(parse_building(&json(inverted)), Err(Error::Range { .. })));
    }

    #[test]
    fn negative_id_is_out_of_range() {
        assert!(matches!(
            parse_node(&json(r#"{"id": -1, "position": [0,0,0]}"#)),
            Err(Error::Range { .. })
        ));
    }

    #[test]
    fn configuration_fields() {
        let mut config = Configuration::default();
        parse_configuration(
            &json(r#"{"ms-per-frame": 25, "module-version": {"major": 1, "minor": 0, "patch": 4}}"#),
            &mut config,
        )
        .unwrap();
        assert_eq!(config.ms_per_frame, 25.0);
        assert_eq!(config.module_version.as_deref(), Some("1.0.4"));

        assert!(matches!(
            parse_configuration(&json(r#"{"ms-per-frame": 0}"#), &mut config),
            Err(Error::Range { .. })
        ));
    }

    #[test]
    fn unknown_event_type_is_schema_error() {
        let factory = EntityFactory::default();
        let err = factory
            .parse_event(&json(r#"{"type": "node-teleport", "id": 0, "time": 1.0}"#))
            .unwrap_err();
        assert!(matches!(err, Error::Schema { section: Section::Events, .. }));
    }

    #[test]
    fn color_event_unset_target_means_remove() {
        let factory = EntityFactory::default();
        let event = factory
            .parse_event(&json(r#"{"type": "node-color", "id": 0, "time": 1.0, "channel": "highlight"}"#))
            .unwrap();
        assert_eq!(
            event,
            Event::NodeColor {
                node: NodeId(0),
                time: 1.0,
                channel: Channel::Highlight,
                target: None
            }
        );
    }

    #[test]
    fn appends_need_registered_containers() {
        let mut factory = EntityFactory::default();
        let append = json(r#"{"type": "xy-series-append", "series-id": 4, "time": 1.0, "x": 0, "y": 1}"#);
        assert!(matches!(
            factory.handle(Section::Events, append.clone()),
            Err(Error::Schema { .. })
        ));

        factory
            .handle(Section::Series, json(r#"{"type": "xy-series", "id": 4, "name": "rx"}"#))
            .unwrap();
        factory.handle(Section::Events, append).unwrap();
        assert_eq!(factory.scenario().events.len(), 1);
    }

    #[test]
    fn category_append_checks_category() {
        let mut factory = EntityFactory::default();
        factory
            .handle(
                Section::Series,
                json(r#"{"type": "category-value-series", "id": 1, "name": "state",
                         "categories": [{"id": 0, "name": "idle"}, {"id": 1, "name": "busy"}]}"#),
            )
            .unwrap();
        factory
            .handle(
                Section::Events,
                json(r#"{"type": "category-series-append", "series-id": 1, "time": 0, "category": 1, "value": 2}"#),
            )
            .unwrap();
        assert!(factory
            .handle(
                Section::Events,
                json(r#"{"type": "category-series-append", "series-id": 1, "time": 0, "category": 9, "value": 2}"#),
            )
            .is_err());
    }

    #[test]
    fn collections_reference_registered_series() {
        let mut factory = EntityFactory::default();
        let collection = json(r#"{"type": "series-collection", "id": 9, "name": "all", "series": [1]}"#);
        assert!(factory.handle(Section::Series, collection.clone()).is_err());

        factory
            .handle(Section::Series, json(r#"{"type": "xy-series", "id": 1, "name": "a"}"#))
            .unwrap();
        factory.handle(Section::Series, collection).unwrap();
        assert_eq!(factory.scenario().series.len(), 2);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut factory = EntityFactory::default();
        let node = json(r#"{"id": 0, "position": [0,0,0]}"#);
        factory.handle(Section::Nodes, node.clone()).unwrap();
        assert!(matches!(factory.handle(Section::Nodes, node), Err(Error::Schema { .. })));
    }

    #[test]
    fn skip_policy_records_warnings() {
        let mut factory = EntityFactory::new(SchemaPolicy::SkipRecord);
        factory
            .handle(Section::Nodes, json(r#"{"id": 0, "position": [0,0,0]}"#))
            .unwrap();
        factory.handle(Section::Nodes, json(r#"{"id": 1}"#)).unwrap();
        factory
            .handle(
                Section::Events,
                json(r#"{"type": "node-position", "id": 7, "time": 1, "target": [1,1,1]}"#),
            )
            .unwrap();

        let scenario = factory.finish().unwrap();
        assert_eq!(scenario.nodes.len(), 1);
        assert!(scenario.events.is_empty());
        assert_eq!(scenario.warnings.len(), 2);
        assert!(scenario.warnings.iter().all(|w| w.message.contains("schema error")));
    }

    #[test]
    fn dangling_event_target_aborts_by_default() {
        let mut factory = EntityFactory::default();
        factory
            .handle(
                Section::Events,
                json(r#"{"type": "decoration-position", "id": 2, "time": 1, "target": [0,0,0]}"#),
            )
            .unwrap();
        assert!(matches!(factory.finish(), Err(Error::Schema { .. })));
    }

    #[test]
    fn events_are_stably_sorted() {
        let mut factory = EntityFactory::default();
        factory
            .handle(Section::Nodes, json(r#"{"id": 0, "position": [0,0,0]}"#))
            .unwrap();
        for (time, x) in [(5.0, 1), (1.0, 2), (5.0, 3)] {
            let record = format!(r#"{{"type": "node-position", "id": 0, "time": {time}, "target": [{x},0,0]}}"#);
            factory.handle(Section::Events, json(&record)).unwrap();
        }
        let xs: Vec<f64> = factory
            .finish()
            .unwrap()
            .events
            .iter()
            .map(|e| match e {
                Event::NodePosition { target, .. } => target.x,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(xs, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn schema_policy_names() {
        assert_eq!(SchemaPolicy::from_name("skip"), Some(SchemaPolicy::SkipRecord));
        assert_eq!(SchemaPolicy::from_name("abort"), Some(SchemaPolicy::Abort));
        assert_eq!(SchemaPolicy::from_name("ignore"), None);
    }
}
