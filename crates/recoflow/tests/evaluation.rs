mod common;

use common::{purchase, view};
use recoflow_core::{evaluate, sessionize};

#[test]
fn test_metrics_stay_in_unit_range() {
    let events = vec![
        view("u1", 0, "a"),
        purchase("u1", 10, "a"),
        purchase("u1", 20, "b"),
        view("u2", 0, "c"),
        purchase("u2", 5, "c"),
        view("u3", 0, "d"),
    ];
    let sessions = sessionize(events, 1800).unwrap();

    let recommender = |user: &str, _: &str, k: usize| -> Vec<String> {
        let items: &[&str] = match user {
            "u1" => &["a", "a", "z"],
            _ => &["x", "y"],
        };
        items.iter().take(k).map(|s| s.to_string()).collect()
    };

    for k in [1, 2, 5] {
        let report = evaluate(&sessions, &recommender, k);
        assert_eq!(report.evaluated_session_count, 2);
        assert!((0.0..=1.0).contains(&report.precision_at_k));
        assert!((0.0..=1.0).contains(&report.recall_at_k));
    }

    // u1 hits "a" once despite the duplicate; u2 misses
    let report = evaluate(&sessions, &recommender, 2);
    assert!((report.precision_at_k - 0.25).abs() < 1e-12);
    assert!((report.recall_at_k - 0.25).abs() < 1e-12);
}
