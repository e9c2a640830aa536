use policy_tree::data::{PolicyVariable, VariableKind};
use policy_tree::evaluation::LeafOutcome;
use policy_tree::node::{NodeContent, Subtree, assemble};
use policy_tree::split::SplitValue;

fn leaf(arm: usize, reward: f64, units: usize) -> Subtree {
    let mut counts = vec![0; 2];
    counts[arm] = units;
    Subtree::Leaf(LeafOutcome {
        arm,
        reward,
        counts,
    })
}

fn variable(name: &str) -> PolicyVariable {
    PolicyVariable::new(name, VariableKind::Continuous, vec![1.0, 2.0, 3.0]).unwrap()
}

#[test]
fn assembling_two_leaves_gives_three_linked_nodes() {
    let subtree = assemble(
        leaf(0, 1.0, 3),
        leaf(1, 2.0, 4),
        &variable("age"),
        0,
        SplitValue::Threshold(2.0),
    );
    assert!(!subtree.is_leaf());
    let nodes = subtree.into_nodes();

    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].parent, None);
    assert_eq!(nodes[0].children, Some((1, 2)));
    assert_eq!(nodes[1].parent, Some(0));
    assert_eq!(nodes[2].parent, Some(0));
    match &nodes[0].content {
        NodeContent::Split {
            variable,
            children_terminal,
            value,
            ..
        } => {
            assert_eq!(variable, "age");
            assert!(*children_terminal, "parent of two leaves must be tagged");
            assert_eq!(value, &SplitValue::Threshold(2.0));
        }
        other => panic!("expected a split node, got {:?}", other),
    }
    assert!(nodes[1].is_terminal() && nodes[2].is_terminal());
}

#[test]
fn assembling_shifts_ids_of_both_fragments() {
    let left = assemble(
        leaf(0, 1.0, 2),
        leaf(1, 1.0, 2),
        &variable("a"),
        0,
        SplitValue::Threshold(1.0),
    );
    let right = assemble(
        leaf(1, 3.0, 2),
        leaf(0, 0.0, 2),
        &variable("b"),
        1,
        SplitValue::Categories(vec![2, 5]),
    );
    let nodes = assemble(left, right, &variable("c"), 2, SplitValue::Threshold(0.5)).into_nodes();

    assert_eq!(nodes.len(), 7);
    for (index, node) in nodes.iter().enumerate() {
        assert_eq!(node.id, index, "node ids must match arena positions");
    }
    // Root, left fragment at 1..=3, right fragment at 4..=6.
    assert_eq!(nodes[0].children, Some((1, 4)));
    assert_eq!(nodes[1].children, Some((2, 3)));
    assert_eq!(nodes[4].children, Some((5, 6)));
    assert_eq!(nodes[1].parent, Some(0));
    assert_eq!(nodes[4].parent, Some(0));
    assert_eq!(nodes[2].parent, Some(1));
    assert_eq!(nodes[3].parent, Some(1));
    assert_eq!(nodes[5].parent, Some(4));
    assert_eq!(nodes[6].parent, Some(4));

    match &nodes[0].content {
        NodeContent::Split {
            children_terminal,
            variable_index,
            ..
        } => {
            assert!(!*children_terminal);
            assert_eq!(*variable_index, 2);
        }
        other => panic!("expected a split node, got {:?}", other),
    }
}

#[test]
fn assembling_mixed_fragment_and_leaf() {
    let left = assemble(
        leaf(0, 1.0, 2),
        leaf(1, 1.0, 2),
        &variable("a"),
        0,
        SplitValue::Threshold(1.0),
    );
    let nodes = assemble(left, leaf(1, 4.0, 5), &variable("b"), 1, SplitValue::Threshold(3.0))
        .into_nodes();

    assert_eq!(nodes.len(), 5);
    assert_eq!(nodes[0].children, Some((1, 4)));
    assert_eq!(nodes[4].parent, Some(0));
    assert!(nodes[4].is_terminal());
}

#[test]
fn split_values_route_units() {
    let threshold = SplitValue::Threshold(2.5);
    assert!(threshold.goes_left(2.5));
    assert!(threshold.goes_left(-1.0));
    assert!(!threshold.goes_left(2.6));

    let categories = SplitValue::Categories(vec![1, 4]);
    assert!(categories.goes_left(4.0));
    assert!(!categories.goes_left(2.0));
    assert_eq!(categories.to_string(), "in [1, 4]");
    assert_eq!(threshold.to_string(), "<= 2.5");
}
