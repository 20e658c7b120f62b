//! Unhide sweep over every entity of a part.
//!
//! For each configured [`EntityCategory`] the sweep asks the part for the
//! matching collection and walks it with the first/next cursor. Each entity
//! is unhidden through its feature record when it has one, and through its
//! own [`HiddenFlag`]/[`VisibleFlag`] capabilities otherwise. Flags are only
//! written when they mark the entity hidden, so a second sweep over the same
//! part changes nothing.
//!
//! Nothing in here aborts: unknown categories, missing capabilities and
//! failing host calls end up in the [`NotificationCollection`].

use crate::error::{HostError, HostResult};
use crate::host::{
    CollectionLookup, Entity, EntityCategory, EntityCollection, HiddenFlag, Part, VisibleFlag,
};
use crate::notification::{Notification, NotificationCollection, NotificationType};

/// Which categories a sweep visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfiguration {
    /// Categories in visiting order.
    ///
    /// Default: every category in [`EntityCategory::KNOWN`].
    pub categories: Vec<EntityCategory>,
}

impl Default for SweepConfiguration {
    fn default() -> Self {
        Self {
            categories: EntityCategory::KNOWN.to_vec(),
        }
    }
}

impl SweepConfiguration {
    /// Also probe the given raw ids, e.g. categories of a newer host.
    pub fn with_extra_ids(mut self, ids: impl IntoIterator<Item = u16>) -> Self {
        for category in ids.into_iter().map(EntityCategory::from_id) {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }
        self
    }
}

/// Counters of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entities toggled from hidden to visible.
    pub changed: usize,
    /// Categories whose collection was retrieved.
    pub categories_visited: usize,
    /// Categories the host does not know.
    pub categories_unsupported: usize,
    /// Entities reached through a collection cursor.
    pub entities_visited: usize,
}

/// Clears the hidden state of every entity in a part.
#[derive(Debug, Clone, Default)]
pub struct UnhideSweep {
    config: SweepConfiguration,
}

impl UnhideSweep {
    /// Create a sweep over the configured categories.
    pub fn new(config: SweepConfiguration) -> Self {
        Self { config }
    }

    /// Categories this sweep visits.
    pub fn config(&self) -> &SweepConfiguration {
        &self.config
    }

    /// Sweep `part`, returning how many entities were unhidden.
    pub fn run(&self, part: &mut dyn Part, notes: &mut NotificationCollection) -> SweepReport {
        let mut report = SweepReport::default();
        for &category in &self.config.categories {
            match part.entity_collection(category) {
                Ok(CollectionLookup::Found(mut collection)) => {
                    report.categories_visited += 1;
                    sweep_collection(collection.as_mut(), category, &mut report, notes);
                }
                Ok(CollectionLookup::Unsupported) => {
                    report.categories_unsupported += 1;
                    notes.push(
                        Notification::new(NotificationType::NotSupported, "no such collection")
                            .in_category(category),
                    );
                }
                Err(err) => {
                    if err.is_unsupported() {
                        report.categories_unsupported += 1;
                    }
                    note_failure(notes, category, "collection lookup", &err);
                }
            }
        }
        tracing::debug!(
            changed = report.changed,
            entities = report.entities_visited,
            categories = report.categories_visited,
            "sweep finished"
        );
        report
    }
}

fn sweep_collection(
    collection: &mut dyn EntityCollection,
    category: EntityCategory,
    report: &mut SweepReport,
    notes: &mut NotificationCollection,
) {
    let mut current = match collection.first() {
        Ok(entity) => entity,
        Err(err) => {
            note_failure(notes, category, "First", &err);
            return;
        }
    };

    while let Some(mut entity) = current {
        report.entities_visited += 1;
        if unhide_entity(entity.as_mut(), category, notes) {
            report.changed += 1;
        }
        drop(entity);

        current = match collection.next() {
            Ok(entity) => entity,
            Err(err) => {
                notes.push(
                    Notification::new(
                        NotificationType::Warning,
                        format!("cursor stopped early: {err}"),
                    )
                    .in_category(category),
                );
                break;
            }
        };
    }
}

/// Unhide one entity, returning whether anything was toggled.
fn unhide_entity(
    entity: &mut dyn Entity,
    category: EntityCategory,
    notes: &mut NotificationCollection,
) -> bool {
    match unhide_feature(entity, category, notes) {
        Ok(Some(changed)) => return changed,
        Ok(None) => {}
        Err(err) => note_failure(notes, category, "feature", &err),
    }
    unhide_flags(entity, category, notes)
}

/// `Ok(None)` when the entity has no feature record. Once the hidden flag
/// is written the toggle counts, even if the following `Update` fails.
fn unhide_feature(
    entity: &mut dyn Entity,
    category: EntityCategory,
    notes: &mut NotificationCollection,
) -> HostResult<Option<bool>> {
    let Some(mut feature) = entity.feature()? else {
        return Ok(None);
    };
    if !feature.is_hidden()? {
        return Ok(Some(false));
    }
    feature.set_hidden(false)?;
    if let Err(err) = feature.update() {
        note_failure(notes, category, "Update", &err);
    }
    Ok(Some(true))
}

fn unhide_flags(
    entity: &mut dyn Entity,
    category: EntityCategory,
    notes: &mut NotificationCollection,
) -> bool {
    let mut exposed = false;
    let mut changed = false;

    if let Some(flag) = entity.as_hidden_flag() {
        exposed = true;
        match clear_hidden(flag) {
            Ok(toggled) => changed |= toggled,
            Err(err) => note_failure(notes, category, "hidden", &err),
        }
    }

    if let Some(flag) = entity.as_visible_flag() {
        exposed = true;
        match show(flag) {
            Ok(toggled) => changed |= toggled,
            Err(err) => note_failure(notes, category, "Visible", &err),
        }
    }

    if !exposed {
        notes.push(
            Notification::new(
                NotificationType::NotSupported,
                "entity has no feature and no visibility flags",
            )
            .in_category(category),
        );
        return false;
    }

    if changed {
        if let Err(err) = entity.update() {
            note_failure(notes, category, "Update", &err);
        }
    }
    changed
}

fn clear_hidden(flag: &mut dyn HiddenFlag) -> HostResult<bool> {
    if !flag.is_hidden()? {
        return Ok(false);
    }
    flag.set_hidden(false)?;
    Ok(true)
}

fn show(flag: &mut dyn VisibleFlag) -> HostResult<bool> {
    if flag.is_visible()? {
        return Ok(false);
    }
    flag.set_visible(true)?;
    Ok(true)
}

fn note_failure(
    notes: &mut NotificationCollection,
    category: EntityCategory,
    what: &str,
    err: &HostError,
) {
    let notification_type = if err.is_unsupported() {
        NotificationType::NotSupported
    } else {
        NotificationType::Error
    };
    notes.push(Notification::new(notification_type, format!("{what}: {err}")).in_category(category));
}
