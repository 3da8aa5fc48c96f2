mod common;

use common::{at, purchase, view};
use recoflow_core::{build_interactions, extract_features, sessionize, Config, InteractionBuilder};

#[test]
fn test_two_sessions_and_weighted_interaction() {
    let events = vec![view("1", 0, "10"), purchase("1", 5, "10"), view("1", 4_000, "20")];
    let sessions = sessionize(events, 1800).unwrap();
    assert_eq!(sessions.len(), 2);

    let first = &sessions[0];
    assert_eq!(first.user_id, "1");
    assert_eq!(first.start, at(0));
    assert_eq!(first.viewed_items, vec!["10".to_string()]);
    assert!(first.purchased_items.contains("10"));
    assert_eq!(first.purchased_items.len(), 1);
    assert_eq!(first.duration_seconds, 5);

    let second = &sessions[1];
    assert_eq!(second.viewed_items, vec!["20".to_string()]);
    assert!(second.purchased_items.is_empty());
    assert_eq!(second.duration_seconds, 0);

    let config = Config::default();
    let interactions = build_interactions(&sessions[..1], &config.event_weights);
    assert!((interactions.weight("1", "10") - 6.0).abs() < 1e-12);
    assert_eq!(interactions.records.len(), 2);
    assert!(interactions.records.iter().all(|r| r.is_positive));
}

#[test]
fn test_features_follow_sessions() {
    let sessions = sessionize(common::sample_events(), 1800).unwrap();
    let rows = extract_features(&sessions).unwrap();
    assert_eq!(rows.len(), sessions.len());

    for (row, session) in rows.iter().zip(&sessions) {
        assert_eq!(row.session_id, session.session_id);
        assert_eq!(row.num_events, session.events.len());
        assert_eq!(row.duration_seconds, session.duration_seconds);
        assert_eq!(row.event_counts.values().sum::<usize>(), row.num_events);
    }
}

#[test]
fn test_matrix_shape_matches_vocabulary() {
    let sessions = sessionize(common::sample_events(), 1800).unwrap();
    let set = InteractionBuilder::new(Config::default().event_weights).build(&sessions);
    assert_eq!(
        set.matrix.shape(),
        (set.vocabulary.num_items(), set.vocabulary.num_users())
    );
    assert_eq!(set.vocabulary.num_users(), 3);
    assert_eq!(set.vocabulary.num_items(), 4);
    for record in &set.records {
        assert!(set.weight(&record.user_id, &record.item_id) > 0.0);
    }
}
