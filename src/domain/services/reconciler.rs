//! Reconciler - merges the upstream mirror with the authoritative store
//!
//! The store always wins. For a list view the mirror is laid down first
//! and every authoritative record overwrites it; mirror entries with no
//! authoritative counterpart pass through unchanged.
//!
//! The mirror is keyed by the name the upstream reports (which normally
//! already carries `@provider`), and authoritative records by
//! `name@provider`. Mirror entries without a name are dropped.
//!
//! Point lookups do not go through here: they query the store first and
//! the mirror only on a miss, see `ResourceService::get`.

use crate::domain::entities::{MergedView, MirrorRecord, ResourceRecord, ResourceView};

/// Merge mirror records and authoritative records into one view.
pub fn merge_list(
    mirror: impl IntoIterator<Item = MirrorRecord>,
    authoritative: &[ResourceRecord],
) -> MergedView {
    let mut view = MergedView::new();

    for record in mirror.into_iter().filter(|r| !r.name.is_empty()) {
        view.insert(record.name.clone(), ResourceView::from_mirror(record));
    }

    for record in authoritative {
        view.insert(record.qualified_name(), ResourceView::from_record(record));
    }

    view
}
