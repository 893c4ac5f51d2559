//! Top-level document sections.

/// The reserved top-level keys of a scenario document.
///
/// `None` stands for every other key; such keys are skipped so that newer
/// recorders can add sections without breaking older readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    None,
    Buildings,
    Configuration,
    Decorations,
    Events,
    Nodes,
    Series,
    Streams,
}

impl Section {
    /// Classify a top-level key. Total: anything unrecognized is `None`.
    pub fn classify(key: &str) -> Self {
        match key {
            "buildings" => Section::Buildings,
            "configuration" => Section::Configuration,
            "decorations" => Section::Decorations,
            "events" => Section::Events,
            "nodes" => Section::Nodes,
            "series" => Section::Series,
            "streams" => Section::Streams,
            _ => Section::None,
        }
    }

    /// The key this section is read from; `None` has no key.
    pub fn name(&self) -> &'static str {
        match self {
            Section::None => "<none>",
            Section::Buildings => "buildings",
            Section::Configuration => "configuration",
            Section::Decorations => "decorations",
            Section::Events => "events",
            Section::Nodes => "nodes",
            Section::Series => "series",
            Section::Streams => "streams",
        }
    }

    /// True for sections whose value is an array of records, each of which
    /// is dispatched on its own. `configuration` is a single object.
    pub fn is_list(&self) -> bool {
        match self {
            Section::Buildings
            | Section::Decorations
            | Section::Events
            | Section::Nodes
            | Section::Series
            | Section::Streams => true,
            Section::Configuration | Section::None => false,
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
