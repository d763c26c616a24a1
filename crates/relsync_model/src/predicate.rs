//! Member-selection predicates.
//!
//! A [`Predicate`] is a small expression tree that storage backends evaluate
//! against relation members. Building one never touches storage, and
//! [`Predicate::matches`] gives the reference semantics every backend has to
//! reproduce when it pushes the filter down.

use crate::record::Record;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single inequality test against one member field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    /// Member field being compared.
    pub component: String,
    /// Value the field must differ from.
    pub value: Value,
}

impl Clause {
    /// Creates a new inequality clause.
    pub fn new(component: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            component: component.into(),
            value: value.into(),
        }
    }

    /// Returns true if the member's field differs from the clause value.
    ///
    /// A member that has no such field is considered different.
    pub fn holds_for(&self, member: &Record) -> bool {
        member.get(&self.component) != Some(&self.value)
    }
}

/// A boolean expression over relation members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches when every inner predicate matches. An empty list matches everything.
    And(Vec<Predicate>),
    /// Matches when at least one inner predicate matches. An empty list matches nothing.
    Or(Vec<Predicate>),
    /// Matches when the member field differs from the value.
    NotEqual(Clause),
}

impl Predicate {
    /// Predicate matching every member.
    pub fn everything() -> Self {
        Predicate::And(Vec::new())
    }

    /// Builds the predicate selecting members that equal none of `keys`.
    ///
    /// Each key is a component map. A member is selected only if, for every
    /// key, at least one component differs: an AND over keys of ORs of
    /// inequality clauses. With no keys every member is selected.
    pub fn excluding<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a BTreeMap<String, Value>>,
    {
        Predicate::And(
            keys.into_iter()
                .map(|key| {
                    Predicate::Or(
                        key.iter()
                            .map(|(component, value)| {
                                Predicate::NotEqual(Clause::new(component.clone(), value.clone()))
                            })
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    /// Conjunction of two predicates, flattening nested `And`s.
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        let mut parts = match self {
            Predicate::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Predicate::And(more) => parts.extend(more),
            single => parts.push(single),
        }
        Predicate::And(parts)
    }

    /// Evaluates the predicate against a member.
    pub fn matches(&self, member: &Record) -> bool {
        match self {
            Predicate::And(parts) => parts.iter().all(|p| p.matches(member)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(member)),
            Predicate::NotEqual(clause) => clause.holds_for(member),
        }
    }

    /// Number of inequality clauses in the tree.
    pub fn clause_count(&self) -> usize {
        match self {
            Predicate::And(parts) | Predicate::Or(parts) => {
                parts.iter().map(Predicate::clause_count).sum()
            }
            Predicate::NotEqual(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::EntityId;
    use proptest::prelude::*;

    fn tag(n: i64) -> Record {
        Record::new(EntityId::from_u128(n as u128)).with("id", n)
    }

    fn key(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn empty_and_matches_everything() {
        assert!(Predicate::everything().matches(&tag(1)));
        assert!(Predicate::excluding(&[]).matches(&tag(1)));
    }

    #[test]
    fn empty_or_matches_nothing() {
        assert!(!Predicate::Or(Vec::new()).matches(&tag(1)));
    }

    #[test]
    fn excluding_keeps_listed_members() {
        let keys = vec![key(&[("id", Value::Integer(2))]), key(&[("id", Value::Integer(4))])];
        let predicate = Predicate::excluding(&keys);

        assert!(predicate.matches(&tag(1)));
        assert!(!predicate.matches(&tag(2)));
        assert!(predicate.matches(&tag(3)));
        assert_eq!(predicate.clause_count(), 2);
    }

    #[test]
    fn composite_key_requires_all_components() {
        let member = Record::new(EntityId::from_u128(1))
            .with("order", 10i64)
            .with("line", 2i64);

        let exact = vec![key(&[("order", Value::Integer(10)), ("line", Value::Integer(2))])];
        assert!(!Predicate::excluding(&exact).matches(&member));

        let partial = vec![key(&[("order", Value::Integer(10)), ("line", Value::Integer(3))])];
        assert!(Predicate::excluding(&partial).matches(&member));
    }

    #[test]
    fn unknown_component_keeps_nothing() {
        let keys = vec![key(&[("nonexistent", Value::Integer(1))])];
        assert!(Predicate::excluding(&keys).matches(&tag(1)));
    }

    #[test]
    fn and_flattens() {
        let a = Predicate::NotEqual(Clause::new("id", 1i64));
        let b = Predicate::NotEqual(Clause::new("id", 2i64));
        let combined = Predicate::everything().and(a.clone()).and(b.clone());
        assert_eq!(combined, Predicate::And(vec![a, b]));
        assert!(!combined.matches(&tag(2)));
        assert!(combined.matches(&tag(3)));
    }

    proptest! {
        #[test]
        fn excluding_is_complement_of_membership(
            members in prop::collection::vec(0i64..20, 0..12),
            kept in prop::collection::vec(0i64..20, 0..6),
        ) {
            let keys: Vec<_> = kept.iter().map(|k| key(&[("id", Value::Integer(*k))])).collect();
            let predicate = Predicate::excluding(&keys);
            for m in members {
                prop_assert_eq!(predicate.matches(&tag(m)), !kept.contains(&m));
            }
        }
    }
}
