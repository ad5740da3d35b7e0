//! Neighbor resolution against uniform reference trees and the adaptive
//! cluster scenario

use fmm_tree::*;
use test_helpers::*;
use test_case::test_case;

/// Every leaf of a uniform tree, every Moore direction: the answer must be
/// the same-depth leaf one width over, or `None` past the boundary.
fn sweep_uniform<const D: usize>(levels: u32) {
    let points = uniform_points::<D>(levels);
    let output = build(&points, 1).expect("build succeeds");
    let tree = &output.tree;
    let resolver = NeighborResolver::new(tree);
    let directions = moore_neighborhood::<D>();
    assert_eq!(directions.len(), 3usize.pow(D as u32) - 1);

    for (leaf, node) in tree.leaves() {
        assert_eq!(node.depth, levels);
        for direction in &directions {
            let target = probe(&node.center, node.half_width(), direction);
            let resolved = resolver.neighbor(leaf, *direction).expect("valid query");

            if in_domain(&target) {
                let expected = tree.locate(&target);
                assert_eq!(
                    resolved,
                    Some(expected),
                    "leaf {} direction {:?} should reach {}",
                    leaf,
                    direction,
                    expected
                );
                assert_eq!(tree.node(expected).center, target);
            } else {
                assert_eq!(resolved, None, "leaf {} direction {:?} leaves the domain", leaf, direction);
            }
        }
    }
}

#[test_case(1 ; "one level")]
#[test_case(3 ; "three levels")]
#[test_case(6 ; "six levels")]
fn test_uniform_sweep_1d(levels: u32) {
    sweep_uniform::<1>(levels);
}

#[test_case(1 ; "one level")]
#[test_case(2 ; "two levels")]
#[test_case(4 ; "four levels")]
fn test_uniform_sweep_2d(levels: u32) {
    sweep_uniform::<2>(levels);
}

#[test_case(1 ; "one level")]
#[test_case(2 ; "two levels")]
#[test_case(3 ; "three levels")]
fn test_uniform_sweep_3d(levels: u32) {
    sweep_uniform::<3>(levels);
}

#[test]
fn test_uniform_sweep_4d() {
    sweep_uniform::<4>(2);
}

#[test]
fn test_internal_nodes_in_uniform_tree() {
    // Internal nodes at depth 2 of a depth-4 tree resolve at their own depth
    let points = uniform_points::<2>(4);
    let output = build(&points, 1).expect("build succeeds");
    let tree = &output.tree;
    let resolver = NeighborResolver::new(tree);

    for (id, node) in tree.iter().filter(|(_, n)| n.depth == 2) {
        for (direction, resolved) in resolver.moore_neighbors(id).expect("valid node") {
            let target = probe(&node.center, node.half_width(), &direction);
            match resolved {
                Some(found) => {
                    assert_eq!(tree.node(found).depth, 2);
                    assert_eq!(tree.node(found).center, target);
                }
                None => assert!(!in_domain(&target)),
            }
        }
    }
}

#[test]
fn test_opposite_direction_round_trip() {
    let points = uniform_points::<3>(2);
    let output = build(&points, 1).expect("build succeeds");
    let tree = &output.tree;
    let resolver = NeighborResolver::new(tree);

    for (leaf, _) in tree.leaves() {
        for direction in moore_neighborhood::<3>() {
            if let Some(other) = resolver.neighbor(leaf, direction).expect("valid query") {
                let back = direction.map(|d| -d);
                assert_eq!(resolver.neighbor(other, back).expect("valid query"), Some(leaf));
            }
        }
    }
}

#[test]
fn test_sibling_symmetry() {
    let points = [[-0.5, -0.5], [0.5, -0.5], [-0.5, 0.5], [0.5, 0.5]];
    let output = build(&points, 1).expect("build succeeds");
    let resolver = NeighborResolver::new(&output.tree);

    let [low_left, low_right, high_left, high_right] = [0, 1, 2, 3].map(|i| output.assignment[i]);
    assert_eq!(resolver.neighbor(low_left, [1, 0]).unwrap(), Some(low_right));
    assert_eq!(resolver.neighbor(low_right, [-1, 0]).unwrap(), Some(low_left));
    assert_eq!(resolver.neighbor(low_left, [0, 1]).unwrap(), Some(high_left));
    assert_eq!(resolver.neighbor(high_left, [0, -1]).unwrap(), Some(low_left));
    assert_eq!(resolver.neighbor(low_left, [1, 1]).unwrap(), Some(high_right));
    assert_eq!(resolver.neighbor(high_right, [-1, -1]).unwrap(), Some(low_left));
}

#[test]
fn test_self_query_every_node() {
    let points = clustered_points::<2>(200, 30, [-0.3, 0.4], 41);
    let output = build(&points, 3).expect("build succeeds");
    let tree = &output.tree;
    let resolver = NeighborResolver::new(tree);

    let nodes: Vec<NodeId> = tree.iter().map(|(id, _)| id).collect();
    let resolved = resolver.neighbors(&nodes, [0i8, 0]).expect("valid batch");
    for (node, found) in nodes.iter().zip(resolved) {
        assert_eq!(found, Some(*node));
    }
}

#[test]
fn test_root_has_no_neighbor_in_any_direction() {
    let points = random_points::<3>(100, 43);
    let output = build(&points, 2).expect("build succeeds");
    let resolver = NeighborResolver::new(&output.tree);

    for (direction, resolved) in resolver.moore_neighbors(output.tree.root()).expect("valid node") {
        assert_eq!(resolved, None, "root resolved {:?}", direction);
    }
}

#[test]
fn test_cluster_corner_reaches_coarse_leaf() {
    init_tracing();
    // Four points in the lower-left quadrant, one far away, cutoff 2
    let points = [
        [-0.8, -0.8],
        [-0.7, -0.6],
        [-0.3, -0.3],
        [-0.2, -0.1],
        [0.7, 0.7],
    ];
    let output = build(&points, 2).expect("build succeeds");
    let tree = &output.tree;

    let far = output.assignment[4];
    assert!(tree.is_terminal(far));
    assert!(tree.node(far).depth <= 1);

    let corner = output.assignment[2];
    assert!(tree.node(corner).depth >= 2);
    let buckets = PointBuckets::from_assignment(&output.assignment, tree.len()).expect("assignment fits tree");
    for (_, held) in buckets.occupied() {
        assert!(held.len() <= 2);
    }

    // Diagonal step out of the cluster lands on the coarse far leaf
    let resolver = NeighborResolver::new(tree);
    let found = resolver.neighbor(corner, [1, 1]).expect("valid query");
    assert_eq!(found, Some(far));
    assert!(tree.node(far).depth < tree.node(corner).depth);
}

#[test]
fn test_batch_matches_single_queries() {
    let points = random_points::<2>(600, 47);
    let output = build(&points, 2).expect("build succeeds");
    let tree = &output.tree;
    let resolver = NeighborResolver::new(tree);

    let directions = moore_neighborhood::<2>();
    let nodes: Vec<NodeId> = tree.leaves().map(|(id, _)| id).collect();
    let per_node: Vec<[i8; 2]> = (0..nodes.len()).map(|i| directions[i % directions.len()]).collect();

    let batch = resolver.neighbors(&nodes, per_node.as_slice()).expect("valid batch");
    for ((node, direction), found) in nodes.iter().zip(&per_node).zip(batch) {
        assert_eq!(resolver.neighbor(*node, *direction).unwrap(), found);
    }
}

#[test]
fn test_batch_rejects_before_resolving() {
    let points = random_points::<2>(50, 53);
    let output = build(&points, 2).expect("build succeeds");

    let nodes = [output.tree.root(), NodeId::new(output.tree.len())];
    let err = neighbors(&output.tree, &nodes, [1i8, 0]).unwrap_err();
    assert!(matches!(err, NeighborError::UnknownNode { .. }));

    let directions: &[[i8; 2]] = &[[1, 0], [0, -3]];
    let nodes = [output.tree.root(), output.tree.root()];
    let err = neighbors(&output.tree, &nodes, directions).unwrap_err();
    assert_eq!(err, NeighborError::InvalidDirection { axis: 1, value: -3 });
    assert_eq!(
        err.to_string(),
        "direction component -3 on axis 1 is outside {-1, 0, 1}"
    );
}
