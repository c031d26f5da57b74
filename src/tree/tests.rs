//! Tests for tree topology and SVM-tree prediction.

use super::*;

fn separable_tree() -> SvmTree {
    SvmTree::new(
        TreeTopology::new(1).expect("depth 1"),
        vec![
            NodeHyperplane::new(vec![0.4, 0.0], -1.0),
            NodeHyperplane::new(vec![0.0, 0.0], -1.0),
            NodeHyperplane::new(vec![0.0, 0.0], 1.0),
        ],
    )
    .expect("three nodes")
}

// ========================================================================
// Topology
// ========================================================================

#[test]
fn test_node_and_layer_counts() {
    for depth in 1..=6 {
        let topo = TreeTopology::new(depth).expect("valid depth");
        assert_eq!(topo.n_nodes(), (1 << (depth + 1)) - 1);
        assert_eq!(topo.n_layers(), depth + 1);
    }
}

#[test]
fn test_depth_validation() {
    assert!(TreeTopology::new(0).is_err());
    assert!(TreeTopology::new(MAX_DEPTH).is_ok());
    assert!(TreeTopology::new(MAX_DEPTH + 1).is_err());
    assert!(TreeTopology::from_signed(-1).is_err());
    assert_eq!(TreeTopology::from_signed(3).expect("valid").depth(), 3);
}

#[test]
fn test_children_and_parent() {
    let topo = TreeTopology::new(2).expect("depth 2");
    assert_eq!(topo.children(0), Some((1, 2)));
    assert_eq!(topo.children(2), Some((5, 6)));
    assert_eq!(topo.children(3), None);
    assert_eq!(topo.parent(0), None);
    for t in 1..topo.n_nodes() {
        let parent = topo.parent(t).expect("non-root");
        let (left, right) = topo.children(parent).expect("parent has children");
        assert!(t == left || t == right);
        let side = topo.side(t).expect("non-root");
        assert_eq!(topo.child(parent, side), Some(t));
    }
}

#[test]
fn test_sides() {
    let topo = TreeTopology::new(2).expect("depth 2");
    assert_eq!(topo.side(0), None);
    assert_eq!(topo.side(1), Some(Side::Left));
    assert_eq!(topo.side(2), Some(Side::Right));
    assert_eq!(topo.side(6), Some(Side::Right));
}

#[test]
fn test_layers_partition_nodes() {
    let topo = TreeTopology::new(3).expect("depth 3");
    let mut seen = vec![false; topo.n_nodes()];
    for (l, layer) in topo.layers().enumerate() {
        assert_eq!(layer.len(), 1 << l);
        for t in layer {
            assert!(!seen[t], "node {t} in two layers");
            seen[t] = true;
            assert_eq!(topo.node_depth(t), l);
        }
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn test_leaves_are_last_layer() {
    let topo = TreeTopology::new(2).expect("depth 2");
    let leaves: Vec<NodeId> = topo.nodes().filter(|&t| topo.is_leaf(t)).collect();
    assert_eq!(leaves, topo.layer(2).collect::<Vec<_>>());
}

// ========================================================================
// Prediction
// ========================================================================

#[test]
fn test_route_follows_sign() {
    let tree = separable_tree();
    assert_eq!(tree.route(&[0.0, 0.0]), vec![0, 1]);
    assert_eq!(tree.route(&[5.0, 1.0]), vec![0, 2]);
    // w·x + b == 0 goes right
    assert_eq!(tree.route(&[2.5, 0.0]), vec![0, 2]);
}

#[test]
fn test_predict_and_score() {
    let tree = separable_tree();
    let x = Matrix::from_rows(&[[0.0, 0.0], [0.0, 1.0], [5.0, 0.0], [5.0, 1.0]]).expect("rows");
    let y = [-1.0, -1.0, 1.0, 1.0];
    assert_eq!(tree.predict(&x).expect("2 features"), y.to_vec());
    assert!((tree.score(&x, &y).expect("shapes match") - 1.0).abs() < 1e-12);
    assert!((tree.score(&x, &[1.0, -1.0, 1.0, 1.0]).expect("shapes") - 0.75).abs() < 1e-12);
}

#[test]
fn test_predict_rejects_wrong_width() {
    let tree = separable_tree();
    let x = Matrix::from_rows(&[[0.0, 0.0, 0.0]]).expect("rows");
    assert!(tree.predict(&x).is_err());
    let x = Matrix::from_rows(&[[0.0, 0.0]]).expect("rows");
    assert!(tree.score(&x, &[1.0, 1.0]).is_err());
}

#[test]
fn test_new_checks_shape() {
    let topo = TreeTopology::new(1).expect("depth 1");
    assert!(SvmTree::new(topo, vec![NodeHyperplane::new(vec![1.0], 0.0)]).is_err());
    let ragged = vec![
        NodeHyperplane::new(vec![1.0], 0.0),
        NodeHyperplane::new(vec![1.0, 2.0], 0.0),
        NodeHyperplane::new(vec![1.0], 0.0),
    ];
    assert!(SvmTree::new(topo, ragged).is_err());
}

#[test]
fn test_active_nodes() {
    let tree = separable_tree();
    assert_eq!(tree.active_nodes(1e-9), vec![0]);
    assert!((tree.node(0).squared_norm() - 0.16).abs() < 1e-12);
}

#[test]
fn test_save_load_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tree.json");
    let tree = separable_tree();
    tree.save(&path).expect("save");
    assert_eq!(SvmTree::load(&path).expect("load"), tree);
}
