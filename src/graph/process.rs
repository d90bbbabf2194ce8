use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// The fixed node set of the material-flow network.
///
/// `Environment` is the system boundary: trade partners and the lithosphere.
/// `Primary` covers the ore-based route; the scrap-based secondary route has
/// no node of its own - it appears as the Recycling->Forming edge.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
pub enum Process {
    Environment,
    Primary,
    Forming,
    Fabrication,
    Use,
    Recycling,
    Dissipation,
    Waste,
}

impl Process {
    /// Human-readable name used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Process::Environment => "Environment",
            Process::Primary => "Primary production",
            Process::Forming => "Forming",
            Process::Fabrication => "Fabrication",
            Process::Use => "Use phase",
            Process::Recycling => "Mechanical recycling",
            Process::Dissipation => "Dissipation",
            Process::Waste => "Waste",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_node_set_is_fixed() {
        assert_eq!(Process::iter().count(), 8);
    }

    #[test]
    fn test_labels_are_distinct() {
        let labels: std::collections::BTreeSet<_> = Process::iter().map(|p| p.label()).collect();
        assert_eq!(labels.len(), 8);
    }
}
