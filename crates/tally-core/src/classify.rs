//! Pure action classification over snapshot pairs.
//!
//! One shared module serves both the write path (tagging records whose
//! caller supplied no tags) and the read path (re-deriving tags for
//! historical rows stored before explicit tagging existed). Classification
//! is a pure function of its two inputs — no I/O, no clock — so both sites
//! always agree.

use crate::enums::ActionTag;
use crate::snapshots::EntitySnapshot;

/// Field-level diff for one snapshot variant.
///
/// Implementations push dedicated tags for every field they watch and leave
/// the generic fallback to [`classify`].
pub(crate) trait FieldDiff {
    fn diff_into(&self, after: &Self, tags: &mut Vec<ActionTag>);
}

/// Derive the semantic action tags for a `(before, after)` snapshot pair.
///
/// - only `after` present → the entity-specific creation tag;
/// - only `before` present → the entity-specific deletion tag;
/// - both present and deep-equal → the creation tag. This leniency exists
///   for historical rows whose `before` was auto-populated from the
///   just-created state; it conflates a no-op update with creation and is
///   kept deliberately for compatibility with those rows;
/// - both present and unequal → the variant's field diff, falling back to
///   the generic `update` tag when no dedicated tag fires (including when
///   the two snapshots are of different variants);
/// - neither present → empty.
///
/// Output order is deterministic and duplicate-free: calling twice on the
/// same inputs yields the same Vec.
#[must_use]
pub fn classify(
    before: Option<&EntitySnapshot>,
    after: Option<&EntitySnapshot>,
) -> Vec<ActionTag> {
    match (before, after) {
        (None, None) => Vec::new(),
        (None, Some(a)) => vec![ActionTag::create_for(a.entity_type())],
        (Some(b), None) => vec![ActionTag::delete_for(b.entity_type())],
        (Some(b), Some(a)) => {
            if b == a {
                return vec![ActionTag::create_for(a.entity_type())];
            }
            let mut tags = Vec::new();
            match (b, a) {
                (EntitySnapshot::User(b), EntitySnapshot::User(a)) => b.diff_into(a, &mut tags),
                (EntitySnapshot::Department(b), EntitySnapshot::Department(a)) => {
                    b.diff_into(a, &mut tags);
                }
                (EntitySnapshot::Product(b), EntitySnapshot::Product(a)) => {
                    b.diff_into(a, &mut tags);
                }
                (EntitySnapshot::Order(b), EntitySnapshot::Order(a)) => b.diff_into(a, &mut tags),
                (EntitySnapshot::Booking(b), EntitySnapshot::Booking(a)) => {
                    b.diff_into(a, &mut tags);
                }
                (EntitySnapshot::BookingDepartment(b), EntitySnapshot::BookingDepartment(a)) => {
                    b.diff_into(a, &mut tags);
                }
                (EntitySnapshot::ServiceKit(b), EntitySnapshot::ServiceKit(a)) => {
                    b.diff_into(a, &mut tags);
                }
                // Variant mismatch carries no field-level meaning.
                _ => {}
            }
            if tags.is_empty() {
                tags.push(ActionTag::Update);
            }
            tags
        }
    }
}
