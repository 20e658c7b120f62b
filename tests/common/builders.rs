//! In-memory model builders shared by the integration tests.

#![allow(dead_code)]

use kompas_unhide::host::memory::{MemoryEntity, MemoryModel, MemorySession};
use kompas_unhide::host::{CadSession, Part};
use kompas_unhide::EntityCategory;
use std::path::Path;

/// A model with `hidden` hidden and `shown` visible features, spread over
/// a few operation categories.
pub fn feature_model(hidden: usize, shown: usize) -> MemoryModel {
    let categories = [
        EntityCategory::BaseExtrusion,
        EntityCategory::CutExtrusion,
        EntityCategory::Fillet,
        EntityCategory::Sketch,
    ];
    let entities = std::iter::repeat(true)
        .take(hidden)
        .chain(std::iter::repeat(false).take(shown))
        .enumerate();

    let mut model = MemoryModel::new();
    for (i, is_hidden) in entities {
        let category = categories[i % categories.len()];
        model = model.with_entities(category, vec![MemoryEntity::feature(is_hidden)]);
    }
    model
}

/// A model mixing every way an entity can be hidden: feature records,
/// history-less entities with a hidden flag, and a visibility flag.
/// Four entities are hidden.
pub fn mixed_model() -> MemoryModel {
    MemoryModel::new()
        .with_entities(
            EntityCategory::BossExtrusion,
            vec![MemoryEntity::feature(true), MemoryEntity::feature(false)],
        )
        .with_entities(
            EntityCategory::Face,
            vec![
                MemoryEntity::without_history().with_hidden_flag(true),
                MemoryEntity::without_history().with_hidden_flag(false),
            ],
        )
        .with_entities(
            EntityCategory::Edge,
            vec![
                MemoryEntity::without_history().with_visible_flag(false),
                MemoryEntity::without_history()
                    .with_failing_feature()
                    .with_hidden_flag(true),
            ],
        )
}

/// Open `path` on `session` and hand its top part to `f`.
pub fn with_top_part<R>(
    session: &mut MemorySession,
    path: &str,
    f: impl FnOnce(&mut dyn Part) -> R,
) -> R {
    let mut doc = session
        .open_document(Path::new(path), false)
        .expect("open document");
    let mut part = doc
        .top_part()
        .expect("top part call")
        .expect("top part present");
    f(part.as_mut())
}
