//! Dotted-decimal outline numbering.
//!
//! Annotates the flattened pre-order sequence with outline numbers
//! (`1`, `1.1`, `1.2`, `2`, `2.1`, ...). One counter increments per node;
//! every counter deeper than the node resets to zero, so numbering restarts
//! correctly under each shallower-or-equal sibling.

use crate::models::FlatNode;

/// Maximum supported nesting depth. Deeper hierarchies are a usage error;
/// the collector's cycle guard keeps depth finite but not small.
pub const MAX_OUTLINE_DEPTH: usize = 10;

/// Assign outline numbers to `nodes` in place.
///
/// The counter array is owned here and passed through nothing — numbering
/// is a pure function of the (depth-ordered) input sequence.
///
/// # Panics
///
/// Panics if any node's depth is `MAX_OUTLINE_DEPTH` or more. Trees that
/// deep indicate a malformed hierarchy, not a supported input.
pub fn assign_numbers(nodes: &mut [FlatNode]) {
    let mut counters = [0u32; MAX_OUTLINE_DEPTH];

    for node in nodes.iter_mut() {
        assert!(
            node.depth < MAX_OUTLINE_DEPTH,
            "outline depth {} exceeds supported maximum {}",
            node.depth,
            MAX_OUTLINE_DEPTH
        );

        counters[node.depth] += 1;
        for counter in counters[node.depth + 1..].iter_mut() {
            *counter = 0;
        }

        node.number = counters[..=node.depth]
            .iter()
            .filter(|c| **c > 0)
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(".");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: &str, depth: usize) -> FlatNode {
        FlatNode {
            key: key.to_string(),
            depth,
            number: String::new(),
            body: String::new(),
            related: Vec::new(),
        }
    }

    fn numbers(nodes: &[FlatNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.number.as_str()).collect()
    }

    #[test]
    fn test_scenario_a_nested_tree() {
        // R, C1, C1a, C2 => 1, 1.1, 1.1.1, 2
        let mut nodes = vec![node("R", 0), node("C1", 1), node("C1a", 2), node("C2", 1)];
        assign_numbers(&mut nodes);
        assert_eq!(numbers(&nodes), vec!["1", "1.1", "1.1.1", "2"]);
    }

    #[test]
    fn test_deeper_counters_reset_on_sibling() {
        // After 1.1.1, a depth-1 sibling must restart depth-2 numbering.
        let mut nodes = vec![
            node("a", 0),
            node("b", 1),
            node("c", 2),
            node("d", 1),
            node("e", 2),
        ];
        assign_numbers(&mut nodes);
        assert_eq!(numbers(&nodes), vec!["1", "1.1", "1.1.1", "1.2", "1.2.1"]);
    }

    #[test]
    fn test_number_depth_matches_traversal_depth() {
        let mut nodes = vec![
            node("a", 0),
            node("b", 1),
            node("c", 2),
            node("d", 2),
            node("e", 1),
            node("f", 0),
        ];
        assign_numbers(&mut nodes);
        for n in &nodes {
            let dots = n.number.matches('.').count();
            assert_eq!(dots, n.depth, "depth mismatch for {}", n.key);
        }
    }

    #[test]
    fn test_siblings_never_share_a_number() {
        let mut nodes = vec![node("a", 0), node("b", 1), node("c", 1), node("d", 1)];
        assign_numbers(&mut nodes);
        assert_eq!(numbers(&nodes), vec!["1", "1.1", "1.2", "1.3"]);
    }

    #[test]
    fn test_strictly_increasing_in_document_order() {
        let mut nodes = vec![
            node("a", 0),
            node("b", 1),
            node("c", 1),
            node("d", 0),
            node("e", 1),
            node("f", 2),
            node("g", 0),
        ];
        assign_numbers(&mut nodes);
        let parsed: Vec<Vec<u32>> = nodes
            .iter()
            .map(|n| n.number.split('.').map(|p| p.parse().unwrap()).collect())
            .collect();
        for pair in parsed.windows(2) {
            assert!(pair[0] < pair[1], "{:?} !< {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_empty_sequence() {
        let mut nodes: Vec<FlatNode> = Vec::new();
        assign_numbers(&mut nodes);
        assert!(nodes.is_empty());
    }

    #[test]
    #[should_panic(expected = "outline depth")]
    fn test_depth_beyond_bound_panics() {
        let mut nodes = vec![node("deep", MAX_OUTLINE_DEPTH)];
        assign_numbers(&mut nodes);
    }
}
