//! Unhide sweep behaviour against the in-memory host.

mod common;

use common::builders::{feature_model, mixed_model, with_top_part};
use kompas_unhide::host::memory::{MemoryEntity, MemoryModel, MemorySession};
use kompas_unhide::{
    EntityCategory, NotificationCollection, NotificationType, SweepConfiguration, UnhideSweep,
};
use proptest::prelude::*;

fn sweep(session: &mut MemorySession, path: &str) -> (usize, NotificationCollection) {
    let mut notes = NotificationCollection::new();
    let report = with_top_part(session, path, |part| {
        UnhideSweep::default().run(part, &mut notes)
    });
    (report.changed, notes)
}

#[test]
fn test_all_hidden_entities_are_cleared() {
    let mut session = MemorySession::new().with_model("body.m3d", mixed_model());
    assert_eq!(session.probe().hidden_count("body.m3d"), 4);

    let (changed, _) = sweep(&mut session, "body.m3d");
    assert_eq!(changed, 4);
    assert_eq!(session.probe().hidden_count("body.m3d"), 0);
}

#[test]
fn test_second_sweep_changes_nothing() {
    let mut session = MemorySession::new().with_model("body.m3d", mixed_model());
    let (first, _) = sweep(&mut session, "body.m3d");
    let (second, _) = sweep(&mut session, "body.m3d");
    assert_eq!(first, 4);
    assert_eq!(second, 0);
}

#[test]
fn test_entity_without_feature_uses_hidden_flag() {
    let mut session = MemorySession::new().with_model(
        "plate.m3d",
        MemoryModel::new().with_entities(
            EntityCategory::Face,
            vec![MemoryEntity::without_history().with_hidden_flag(true)],
        ),
    );
    let (changed, notes) = sweep(&mut session, "plate.m3d");

    assert_eq!(changed, 1);
    assert!(!notes.has_type(NotificationType::Error));
    let model = session.probe().model("plate.m3d").unwrap();
    let entity = model.entities().next().unwrap();
    assert_eq!(entity.hidden, Some(false));
    assert_eq!(entity.updates, 1);
}

#[test]
fn test_failing_category_does_not_abort_sweep() {
    // Sketch (5) fails; categories before and after it still get swept.
    let model = MemoryModel::new()
        .with_entities(EntityCategory::PlaneXoy, vec![MemoryEntity::feature(true)])
        .with_failing_category(EntityCategory::Sketch)
        .with_entities(EntityCategory::AxisOz, vec![MemoryEntity::feature(true)]);
    let mut session = MemorySession::new().with_model("axis.m3d", model);

    let (changed, notes) = sweep(&mut session, "axis.m3d");
    assert_eq!(changed, 2);
    assert_eq!(notes.count(NotificationType::Error), 1);
    assert_eq!(
        notes.of_type(NotificationType::Error)[0].category,
        Some(EntityCategory::Sketch)
    );
}

#[test]
fn test_unknown_ids_are_not_supported_not_errors() {
    let model = MemoryModel::new()
        .with_entities(EntityCategory::Other(250), vec![MemoryEntity::feature(true)]);
    let mut session = MemorySession::new().with_model("new.m3d", model);

    let config = SweepConfiguration::default().with_extra_ids([240, 250, 260]);
    let mut notes = NotificationCollection::new();
    let report = with_top_part(&mut session, "new.m3d", |part| {
        UnhideSweep::new(config).run(part, &mut notes)
    });

    assert_eq!(report.changed, 1);
    assert_eq!(report.categories_visited, 1);
    assert_eq!(report.categories_unsupported, EntityCategory::KNOWN.len() + 2);
    assert!(!notes.has_type(NotificationType::Error));
}

proptest! {
    #[test]
    fn prop_change_count_matches_hidden(hidden in 0usize..40, shown in 0usize..40) {
        let mut session = MemorySession::new().with_model("p.m3d", feature_model(hidden, shown));

        let (first, _) = sweep(&mut session, "p.m3d");
        prop_assert_eq!(first, hidden);
        prop_assert_eq!(session.probe().hidden_count("p.m3d"), 0);

        let (second, _) = sweep(&mut session, "p.m3d");
        prop_assert_eq!(second, 0);
    }
}
