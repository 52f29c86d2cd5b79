//! Change detection: which graphs does a notification batch touch?

use indexmap::IndexSet;

use noderig_core::ChangeRecord;

/// Names of the graphs changed in `batch`, deduplicated, in first-seen
/// order. Records for other entity kinds are ignored.
pub fn affected_graphs(batch: &[ChangeRecord]) -> IndexSet<String> {
    batch
        .iter()
        .filter(|record| record.is_graph())
        .map(|record| record.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use noderig_core::EntityKind;

    #[test]
    fn keeps_graphs_only_and_dedupes() {
        let batch = vec![
            ChangeRecord::graph("Scatter"),
            ChangeRecord::new(EntityKind::Object, "Cube"),
            ChangeRecord::graph("Shading"),
            ChangeRecord::graph("Scatter"),
            ChangeRecord::new(EntityKind::Material, "Scatter"),
        ];
        let graphs: Vec<String> = affected_graphs(&batch).into_iter().collect();
        assert_eq!(graphs, vec!["Scatter", "Shading"]);
    }

    #[test]
    fn empty_batch() {
        assert!(affected_graphs(&[]).is_empty());
    }
}
