use std::sync::atomic::{AtomicUsize, Ordering};

use narwhal::{CancellationToken, Error, Phase, ProjectionOptions, ProjectionTask};
use narwhal_graph::{GraphAccess, WeightedGraph};

fn triangle_fan() -> WeightedGraph {
    let points: [[f64; 2]; 5] = [[0.0, 0.0], [2.0, 0.0], [1.0, 1.5], [3.0, 2.0], [-1.0, 2.5]];
    let mut g = WeightedGraph::new();
    for i in 0..points.len() {
        g.add_vertex(format!("v{i}"));
    }
    for a in 0..points.len() {
        for b in (a + 1)..points.len() {
            let dx = points[a][0] - points[b][0];
            let dy = points[a][1] - points[b][1];
            g.set_weight(a, b, (dx * dx + dy * dy).sqrt());
        }
    }
    g
}

#[test]
fn task_reports_every_phase_in_order() {
    let mut g = triangle_fan();
    let mut phases = Vec::new();
    let projection = ProjectionTask::new(&mut g, ProjectionOptions::triangular(0))
        .on_progress(|p| phases.push(p))
        .run()
        .unwrap();

    assert_eq!(projection.iterations(), 10);
    assert_eq!(phases.len(), 12);
    assert_eq!(phases[0], Phase::TreeBuilt);
    assert_eq!(phases[1], Phase::Placed);
    assert_eq!(phases[2], Phase::Refined { iteration: 1 });
    assert_eq!(phases[11], Phase::Refined { iteration: 10 });
}

#[test]
fn task_fires_completion_callback_once() {
    let mut g = triangle_fan();
    let completions = AtomicUsize::new(0);
    let errors = AtomicUsize::new(0);
    ProjectionTask::new(&mut g, ProjectionOptions::triangular(0))
        .on_completion(|p| {
            assert_eq!(p.coordinates.len(), 5);
            completions.fetch_add(1, Ordering::SeqCst);
        })
        .on_error(|_| {
            errors.fetch_add(1, Ordering::SeqCst);
        })
        .run()
        .unwrap();

    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert_eq!(errors.load(Ordering::SeqCst), 0);
}

#[test]
fn task_fires_error_callback_on_failure() {
    let mut g = triangle_fan();
    g.add_vertex("island");
    let mut seen = Vec::new();
    let err = ProjectionTask::new(&mut g, ProjectionOptions::triangular(0))
        .on_completion(|_| panic!("projection should not complete"))
        .on_error(|e| seen.push(e.clone()))
        .run()
        .unwrap_err();

    assert_eq!(
        err,
        Error::DisconnectedGraph {
            start: 0,
            unreachable: 5
        }
    );
    assert_eq!(seen, vec![err]);
}

#[test]
fn cancelled_before_start_leaves_graph_untouched() {
    let mut g = triangle_fan();
    let token = CancellationToken::new();
    token.cancel();

    let err = ProjectionTask::new(&mut g, ProjectionOptions::triangular(0))
        .with_cancellation(token)
        .run()
        .unwrap_err();
    assert_eq!(err, Error::Cancelled);
    for v in g.vertices() {
        assert!(g.coordinates(v).is_none());
        assert!(!g.is_visited(v));
    }
}

#[test]
fn cancelled_after_tree_leaves_graph_untouched() {
    let mut g = triangle_fan();
    let task = ProjectionTask::new(&mut g, ProjectionOptions::triangular(0));
    let token = task.cancellation_token();
    let err = task
        .on_progress(move |p| {
            if p == Phase::TreeBuilt {
                token.cancel();
            }
        })
        .run()
        .unwrap_err();

    assert_eq!(err, Error::Cancelled);
    for v in g.vertices() {
        assert!(g.coordinates(v).is_none());
    }
}

#[test]
fn cancelled_during_refinement_keeps_last_committed_pass() {
    let mut g = triangle_fan();
    let token = CancellationToken::new();
    let trigger = token.clone();
    let mut passes = 0;
    let err = ProjectionTask::new(&mut g, ProjectionOptions::triangular(0))
        .with_cancellation(token)
        .on_progress(|p| {
            if let Phase::Refined { iteration } = p {
                passes = iteration;
                if iteration == 2 {
                    trigger.cancel();
                }
            }
        })
        .run()
        .unwrap_err();

    assert_eq!(err, Error::Cancelled);
    assert_eq!(passes, 2);
    assert_eq!(g.coordinates(0), Some(&[0.0, 0.0][..]));
    // v2 is closest to v0, so it completes the starting pair.
    assert_eq!(g.coordinates(2), Some(&[(1.0f64 + 2.25).sqrt(), 0.0][..]));
    for v in g.vertices() {
        assert!(g.coordinates(v).is_some());
        assert!(g.is_visited(v));
    }
}

#[test]
fn async_task_runs_on_any_executor() {
    let mut g = triangle_fan();
    let task = ProjectionTask::new(&mut g, ProjectionOptions::polyhedral(0, 2));
    let projection = futures::executor::block_on(task.run_async()).unwrap();
    assert_eq!(projection.dimensions, 2);
    assert_eq!(projection.coordinates.len(), 5);
}
