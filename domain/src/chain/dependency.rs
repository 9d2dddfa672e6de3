//! Topological batching for dependency-based chains.

use std::collections::{HashMap, HashSet};

/// Execution batches plus whether a cycle had to be broken.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    /// Steps grouped into batches; every step in a batch may run concurrently
    /// once all earlier batches finished.
    pub batches: Vec<Vec<String>>,
    /// True when the graph contained a cycle. The plan is still complete:
    /// one arbitrary member of the cycle was scheduled to break it.
    pub cycle_detected: bool,
}

/// Kahn-style topological sort producing batches of ready steps.
///
/// Dependencies naming unknown steps are ignored. When no step is ready but
/// steps remain, the first remaining step (input order) is forced into its
/// own batch and the cycle is reported via [`BatchPlan::cycle_detected`].
pub fn resolve_batches(
    step_ids: &[String],
    dependencies: &HashMap<String, Vec<String>>,
) -> BatchPlan {
    let known: HashSet<&str> = step_ids.iter().map(String::as_str).collect();
    let mut in_degree: HashMap<&str, usize> = step_ids.iter().map(|id| (id.as_str(), 0)).collect();
    for (id, deps) in dependencies {
        if let Some(degree) = in_degree.get_mut(id.as_str()) {
            *degree = deps.iter().filter(|d| known.contains(d.as_str())).count();
        }
    }

    let mut remaining: Vec<&str> = step_ids.iter().map(String::as_str).collect();
    let mut batches = Vec::new();
    let mut cycle_detected = false;

    while !remaining.is_empty() {
        let mut ready: Vec<&str> = remaining
            .iter()
            .copied()
            .filter(|id| in_degree[id] == 0)
            .collect();

        if ready.is_empty() {
            // Cycle: force the first remaining step to make progress.
            tracing::warn!(step = remaining[0], "dependency cycle detected, breaking");
            cycle_detected = true;
            ready.push(remaining[0]);
        }

        remaining.retain(|id| !ready.contains(id));
        for done in &ready {
            for (id, deps) in dependencies {
                if deps.iter().any(|d| d == done)
                    && let Some(degree) = in_degree.get_mut(id.as_str())
                    && *degree > 0
                {
                    *degree -= 1;
                }
            }
        }
        batches.push(ready.into_iter().map(String::from).collect());
    }

    BatchPlan {
        batches,
        cycle_detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_dependencies_single_batch() {
        let plan = resolve_batches(&ids(&["a", "b", "c"]), &HashMap::new());
        assert!(!plan.cycle_detected);
        assert_eq!(plan.batches.len(), 1);
        assert_eq!(plan.batches[0], ids(&["a", "b", "c"]));
    }

    #[test]
    fn test_linear_chain() {
        let deps = HashMap::from([
            ("b".to_string(), vec!["a".to_string()]),
            ("c".to_string(), vec!["b".to_string()]),
        ]);
        let plan = resolve_batches(&ids(&["a", "b", "c"]), &deps);
        assert!(!plan.cycle_detected);
        assert_eq!(plan.batches, vec![ids(&["a"]), ids(&["b"]), ids(&["c"])]);
    }

    #[test]
    fn test_diamond_graph() {
        let deps = HashMap::from([
            ("b".to_string(), vec!["a".to_string()]),
            ("c".to_string(), vec!["a".to_string()]),
            ("d".to_string(), vec!["b".to_string(), "c".to_string()]),
        ]);
        let plan = resolve_batches(&ids(&["a", "b", "c", "d"]), &deps);
        assert!(!plan.cycle_detected);
        assert_eq!(plan.batches.len(), 3);
        assert_eq!(plan.batches[0], ids(&["a"]));
        assert_eq!(plan.batches[1], ids(&["b", "c"]));
        assert_eq!(plan.batches[2], ids(&["d"]));
    }

    #[test]
    fn test_cycle_is_broken_and_flagged() {
        let deps = HashMap::from([
            ("a".to_string(), vec!["b".to_string()]),
            ("b".to_string(), vec!["a".to_string()]),
        ]);
        let plan = resolve_batches(&ids(&["a", "b"]), &deps);
        assert!(plan.cycle_detected);
        // Every step is still scheduled exactly once.
        let all: Vec<String> = plan.batches.into_iter().flatten().collect();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&"a".to_string()));
        assert!(all.contains(&"b".to_string()));
    }

    #[test]
    fn test_unknown_dependency_ignored() {
        let deps = HashMap::from([("a".to_string(), vec!["ghost".to_string()])]);
        let plan = resolve_batches(&ids(&["a"]), &deps);
        assert!(!plan.cycle_detected);
        assert_eq!(plan.batches, vec![ids(&["a"])]);
    }
}
