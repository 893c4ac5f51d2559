//! Typed identifiers for scene entities.
//!
//! Ids are unique within their category only: a node and a decoration may
//! both carry id 3. Chart series of every kind share one id space.

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Identifier of a simulated network node.
    NodeId,
    "node"
);
entity_id!(
    /// Identifier of a building.
    BuildingId,
    "building"
);
entity_id!(
    /// Identifier of a static or moving decoration model.
    DecorationId,
    "decoration"
);
entity_id!(
    /// Identifier shared by XY series, category series and series collections.
    SeriesId,
    "series"
);
entity_id!(
    /// Identifier of a scenario log stream.
    StreamId,
    "stream"
);

/// Opaque handle for a collaborator that wants to hear about node changes
/// (a rendered link, a trail, a label). Issued by whoever registers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DependentId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category() {
        assert_eq!(NodeId(4).to_string(), "node#4");
        assert_eq!(SeriesId(0).to_string(), "series#0");
    }

    #[test]
    fn ids_order_numerically() {
        let mut ids = vec![StreamId(3), StreamId(1), StreamId(2)];
        ids.sort();
        assert_eq!(ids, vec![StreamId(1), StreamId(2), StreamId(3)]);
    }
}
