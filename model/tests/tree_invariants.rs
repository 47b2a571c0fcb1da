mod common;

use std::collections::HashSet;

use common::Lcg;
use rstest::rstest;
use talkbook_model::{Error, NodeId, Presentation, Project, Tree};

/// Checks the structural invariants of every node in `tree`.
fn assert_well_formed(tree: &Tree) {
    let root = tree.root();
    assert_eq!(tree.parent(root).unwrap(), None);

    let ids: Vec<NodeId> = tree.node_ids().collect();
    let unique: HashSet<NodeId> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len(), "duplicate node ids");
    assert_eq!(ids.len(), tree.node_count());

    for &id in &ids {
        let children = tree.children(id).unwrap();
        let distinct: HashSet<&NodeId> = children.iter().collect();
        assert_eq!(distinct.len(), children.len(), "{id} lists a child twice");
        for (index, &child) in children.iter().enumerate() {
            assert_eq!(tree.parent(child).unwrap(), Some(id));
            assert_eq!(tree.index_of(id, child).unwrap(), index);
        }

        if let Some(parent) = tree.parent(id).unwrap() {
            assert!(tree.children(parent).unwrap().contains(&id));
        }

        // Walking up terminates without revisiting a node.
        let mut seen = HashSet::new();
        let mut current = Some(id);
        while let Some(node) = current {
            assert!(seen.insert(node), "cycle through {node}");
            current = tree.parent(node).unwrap();
        }
    }

    // Exactly one parentless node is reachable from the root: the root itself.
    for id in tree.subtree(root).unwrap() {
        assert!(id == root || tree.parent(id).unwrap().is_some());
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(31)]
#[case(777)]
fn random_edits_keep_tree_well_formed(#[case] seed: u64) {
    common::init_logging();
    let mut presentation = Presentation::in_memory();
    let mut rng = Lcg::new(seed);
    let mut all: Vec<NodeId> = vec![presentation.root()];

    for _ in 0..300 {
        let a = all[rng.below(all.len())];
        let b = all[rng.below(all.len())];
        let result = match rng.below(5) {
            0 => {
                let node = presentation.create_node();
                all.push(node);
                let index = rng.below(presentation.tree().child_count(a).unwrap() + 1);
                presentation.insert(a, node, index)
            }
            1 => presentation.append_child(a, b),
            2 => presentation.insert_before(a, b),
            3 => presentation.detach(a).map(|_| ()),
            _ => presentation.remove_child(a, b).map(|_| ()),
        };

        // Rejected edits are fine; they must leave the tree intact.
        if let Err(err) = result {
            assert!(
                matches!(
                    err,
                    Error::NodeHasParent(_)
                        | Error::WouldCreateCycle { .. }
                        | Error::NotAChild { .. }
                        | Error::NodeLacksParent(_)
                        | Error::InvalidArgument(_)
                        | Error::OutOfBounds { .. }
                ),
                "unexpected error {err}"
            );
        }
        assert_well_formed(presentation.tree());
    }
}

#[test]
fn nodes_of_two_presentations_never_mix() {
    let mut project = Project::new();
    let mut first = project.create_in_memory();
    let mut second = project.create_in_memory();
    let foreign = second.create_node();
    let local = first.create_node();

    assert_ne!(first.id(), second.id());
    assert_ne!(local, foreign);
    assert!(first.append_child(first.root(), foreign).is_err());
    assert!(first.tree().children(first.root()).unwrap().is_empty());
    assert_well_formed(first.tree());
    assert_well_formed(second.tree());
}
