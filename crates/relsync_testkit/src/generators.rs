//! Property-based test generators using proptest.
//!
//! Tag numbers are drawn from a small range so that member sets and keep
//! sets overlap often.

use proptest::prelude::*;
use relsync_core::Identifier;
use relsync_model::{EntityId, Record, Value};
use std::collections::BTreeSet;

/// Largest tag number produced by [`tag_number_strategy`].
pub const MAX_TAG: u128 = 24;

/// Strategy for a single tag number.
pub fn tag_number_strategy() -> impl Strategy<Value = u128> {
    1..=MAX_TAG
}

/// Strategy for the distinct tag numbers currently in a relation.
pub fn member_set_strategy() -> impl Strategy<Value = Vec<u128>> {
    prop::collection::btree_set(tag_number_strategy(), 0..12)
        .prop_map(|set| set.into_iter().collect())
}

/// Strategy for the tag numbers a caller wants to keep. May repeat and may
/// name tags that are not members.
pub fn keep_set_strategy() -> impl Strategy<Value = Vec<u128>> {
    prop::collection::vec(tag_number_strategy(), 0..8)
}

/// Strategy for entity ids.
pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    prop::array::uniform16(any::<u8>()).prop_map(EntityId::from_bytes)
}

/// Strategy for records with an `id` and a `sku` component.
pub fn sku_record_strategy() -> impl Strategy<Value = Record> {
    (entity_id_strategy(), 0i64..6, 0i64..4).prop_map(|(id, n, sku)| {
        Record::new(id).with("id", n).with("sku", sku)
    })
}

/// Strategy for two-component identifiers over `id` and `sku`.
pub fn composite_identifier_strategy() -> impl Strategy<Value = Identifier> {
    (0i64..6, 0i64..4).prop_map(|(n, sku)| Identifier::of("id", n).with("sku", sku))
}

/// The tag numbers of `members` that reconciliation against `keep` must remove.
pub fn expected_removals(members: &[u128], keep: &[u128]) -> Vec<u128> {
    let keep: BTreeSet<u128> = keep.iter().copied().collect();
    members.iter().copied().filter(|n| !keep.contains(n)).collect()
}

/// Whether `record` equals `identifier` on every component.
pub fn record_matches(record: &Record, identifier: &Identifier) -> bool {
    identifier
        .components()
        .iter()
        .all(|(name, value): &(String, Value)| record.get(name) == Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_removals_is_the_complement() {
        assert_eq!(expected_removals(&[1, 2, 3], &[2, 4]), vec![1, 3]);
        assert_eq!(expected_removals(&[1, 2, 3], &[]), vec![1, 2, 3]);
    }

    proptest! {
        #[test]
        fn member_sets_are_distinct(members in member_set_strategy()) {
            let unique: BTreeSet<_> = members.iter().collect();
            prop_assert_eq!(unique.len(), members.len());
        }
    }
}
