use narwhal::{Error, Metric, SpanningTree, spanning_tree};
use narwhal_graph::{GraphAccess, WeightedGraph};

fn graph_with(n: usize, edges: &[(usize, usize, f64)]) -> WeightedGraph {
    let mut g = WeightedGraph::new();
    for i in 0..n {
        g.add_vertex(format!("v{i}"));
    }
    for &(a, b, w) in edges {
        g.set_weight(a, b, w);
    }
    g
}

fn kruskal_weight(n: usize, edges: &[(usize, usize, f64)]) -> f64 {
    fn find(parent: &mut [usize], v: usize) -> usize {
        let mut root = v;
        while parent[root] != root {
            root = parent[root];
        }
        parent[v] = root;
        root
    }
    let mut sorted = edges.to_vec();
    sorted.sort_by(|a, b| a.2.total_cmp(&b.2));
    let mut parent: Vec<usize> = (0..n).collect();
    let mut total = 0.0;
    for (a, b, w) in sorted {
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra != rb {
            parent[ra] = rb;
            total += w;
        }
    }
    total
}

const EDGES: &[(usize, usize, f64)] = &[
    (0, 1, 4.0),
    (0, 7, 8.0),
    (1, 2, 8.0),
    (1, 7, 11.0),
    (2, 3, 7.0),
    (2, 8, 2.0),
    (2, 5, 4.0),
    (3, 4, 9.0),
    (3, 5, 14.0),
    (4, 5, 10.0),
    (5, 6, 2.0),
    (6, 7, 1.0),
    (6, 8, 6.0),
    (7, 8, 7.0),
];

#[test]
fn spanning_tree_has_one_entry_per_non_root_vertex() {
    let g = graph_with(9, EDGES);
    let tree = spanning_tree(&g, 0).unwrap();

    assert_eq!(tree.root(), 0);
    assert_eq!(tree.entries().count(), 8);
    assert_eq!(tree.len(), 9);
    assert!(tree.parent(0).is_none());
    for v in 0..9 {
        assert!(tree.contains(v));
    }
}

#[test]
fn spanning_tree_parent_links_reach_the_root() {
    let g = graph_with(9, EDGES);
    let tree = spanning_tree(&g, 3).unwrap();

    for v in g.vertices() {
        let path = tree.path_to_root(v);
        assert_eq!(path.first(), Some(&v));
        assert_eq!(path.last(), Some(&3));
        assert!(path.len() <= tree.len());
    }
}

#[test]
fn spanning_tree_weight_is_minimal() {
    let g = graph_with(9, EDGES);
    let expected = kruskal_weight(9, EDGES);
    for start in 0..9 {
        let tree = spanning_tree(&g, start).unwrap();
        assert!((tree.total_weight() - expected).abs() < 1e-12);
        let summed: f64 = tree.entries().map(|(_, e)| e.weight).sum();
        assert!((summed - expected).abs() < 1e-12);
    }
}

#[test]
fn spanning_tree_order_places_parents_first() {
    let g = graph_with(9, EDGES);
    let tree = spanning_tree(&g, 0).unwrap();
    let order = tree.order();

    assert_eq!(order[0], 0);
    for (i, &v) in order.iter().enumerate().skip(1) {
        let parent = tree.parent(v).unwrap();
        let parent_rank = order.iter().position(|&u| u == parent).unwrap();
        assert!(parent_rank < i);
    }
}

#[test]
fn spanning_tree_breaks_weight_ties_by_lowest_id() {
    let g = graph_with(4, &[(0, 3, 1.0), (0, 2, 1.0), (0, 1, 1.0)]);
    let tree = spanning_tree(&g, 0).unwrap();
    assert_eq!(tree.order(), vec![0, 1, 2, 3]);
    assert_eq!(tree.successor(0), Some(1));
    assert_eq!(tree.children(0), vec![1, 2, 3]);
}

#[test]
fn spanning_tree_successor_is_first_child() {
    let g = graph_with(5, &[(0, 1, 1.0), (1, 2, 1.0), (1, 3, 2.0), (3, 4, 1.0)]);
    let tree = spanning_tree(&g, 0).unwrap();

    assert_eq!(tree.successor(0), Some(1));
    assert_eq!(tree.successor(1), Some(2));
    assert_eq!(tree.successor(2), None);
    assert_eq!(tree.children(1), vec![2, 3]);
    assert_eq!(tree.path_to_root(4), vec![4, 3, 1, 0]);
}

#[test]
fn spanning_tree_fails_on_disconnected_graph() {
    let g = graph_with(5, &[(0, 1, 1.0), (1, 2, 1.0), (3, 4, 1.0)]);
    let err = spanning_tree(&g, 0).unwrap_err();
    assert_eq!(
        err,
        Error::DisconnectedGraph {
            start: 0,
            unreachable: 3
        }
    );
}

#[test]
fn spanning_tree_with_finish_stops_early() {
    let g = graph_with(5, &[(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0), (3, 4, 4.0)]);
    let tree = SpanningTree::build(&Metric::stored(&g), 0, Some(2)).unwrap();

    assert_eq!(tree.order(), vec![0, 1, 2]);
    assert!(!tree.contains(3));
    assert!((tree.total_weight() - 3.0).abs() < 1e-12);
}

#[test]
fn spanning_tree_with_finish_ignores_unreached_components() {
    let g = graph_with(4, &[(0, 1, 1.0), (2, 3, 1.0)]);
    let tree = SpanningTree::build(&Metric::stored(&g), 0, Some(1)).unwrap();
    assert_eq!(tree.order(), vec![0, 1]);
}

#[test]
fn spanning_tree_rejects_unknown_start() {
    let g = graph_with(2, &[(0, 1, 1.0)]);
    assert_eq!(
        spanning_tree(&g, 9).unwrap_err(),
        Error::UnknownVertex { vertex: 9 }
    );
}

#[test]
fn spanning_tree_uses_attribute_columns_when_selected() {
    let mut g = WeightedGraph::new();
    g.add_vertex_with_attributes("a", vec![0.0, 0.0, 100.0]);
    g.add_vertex_with_attributes("b", vec![10.0, 0.0, 0.0]);
    g.add_vertex_with_attributes("c", vec![1.0, 0.0, 0.0]);

    let columns = [0usize, 1];
    let tree = SpanningTree::build(&Metric::new(&g, &columns), 0, None).unwrap();
    assert_eq!(tree.order(), vec![0, 2, 1]);
    assert_eq!(tree.parent(1), Some(2));
    assert!((tree.total_weight() - 10.0).abs() < 1e-12);
}

#[test]
fn path_weight_sums_tree_edges_up_to_an_ancestor() {
    let g = graph_with(4, &[(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0)]);
    let tree = spanning_tree(&g, 0).unwrap();
    assert_eq!(tree.path_weight(3, 0), Some(6.0));
    assert_eq!(tree.path_weight(3, 1), Some(5.0));
    assert_eq!(tree.path_weight(2, 2), Some(0.0));
    assert_eq!(tree.path_weight(0, 3), None);
}

#[test]
fn removed_edges_are_not_used_by_the_tree() {
    let mut g = graph_with(3, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 5.0)]);
    g.remove_weight(1, 2);
    let tree = spanning_tree(&g, 0).unwrap();
    assert_eq!(tree.path_to_root(2), vec![2, 0]);

    g.remove_weight(0, 2);
    assert!(matches!(
        spanning_tree(&g, 0),
        Err(Error::DisconnectedGraph {
            start: 0,
            unreachable: 2
        })
    ));
}
