// memgate: memento record and the fused, sorted list of mementos

use std::collections::HashSet;
use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Navigational relation labels a memento can carry, drawn from
/// {first, last, prev, next, closest}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavRel {
    First,
    Last,
    Prev,
    Next,
    Closest,
}

impl NavRel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavRel::First => "first",
            NavRel::Last => "last",
            NavRel::Prev => "prev",
            NavRel::Next => "next",
            NavRel::Closest => "closest",
        }
    }
}

/// A single archived snapshot of the requested URI-R.
#[derive(Debug, Clone)]
pub struct Memento {
    pub href: String,
    /// 14-digit lex-sortable key, e.g. "20100101000000".
    pub datetime_key: String,
    pub datetime: DateTime<Utc>,
    /// The archive's original RFC1123 datetime string, preserved verbatim
    /// for re-serialization.
    pub original_datetime: String,
    pub nav_rels: HashSet<NavRel>,
}

impl Memento {
    pub fn new(href: String, datetime: DateTime<Utc>, original_datetime: String) -> Self {
        Self {
            href,
            datetime_key: datetime.format("%Y%m%d%H%M%S").to_string(),
            datetime,
            original_datetime,
            nav_rels: HashSet::new(),
        }
    }

    pub fn has_nav_rels(&self) -> bool {
        !self.nav_rels.is_empty()
    }
}

/// An ordered sequence of mementos, ascending by 14-digit datetime key.
/// Equal keys may appear side by side; the list never deduplicates.
///
/// Backed by a `VecDeque` rather than a raw arena-of-nodes: spec.md §9
/// explicitly allows an equivalent representation, and insertion/merge below
/// reproduce the same reverse-cursor algorithms without unsafe pointer
/// splicing (see DESIGN.md).
#[derive(Debug, Clone, Default)]
pub struct MementoList {
    items: VecDeque<Memento>,
}

impl MementoList {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Memento> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Memento> {
        self.items.iter_mut()
    }

    pub fn front(&self) -> Option<&Memento> {
        self.items.front()
    }

    pub fn back(&self) -> Option<&Memento> {
        self.items.back()
    }

    pub fn front_mut(&mut self) -> Option<&mut Memento> {
        self.items.front_mut()
    }

    pub fn back_mut(&mut self) -> Option<&mut Memento> {
        self.items.back_mut()
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Memento> {
        self.items.get(idx)?;
        self.items.get_mut(idx)
    }

    /// Insert `m` keeping the list ascending by `datetime_key` (§4.3).
    /// Archives typically return mementos in reverse-chronological order,
    /// so scanning backward from the tail usually finds the insertion point
    /// in O(1) and push-front is the rare case.
    pub fn insert_sorted(&mut self, m: Memento) {
        let mut idx = self.items.len();
        while idx > 0 && self.items[idx - 1].datetime_key > m.datetime_key {
            idx -= 1;
        }
        self.items.insert(idx, m);
    }

    /// Fold `other` into `self`, preserving ascending order and keeping
    /// every element from both lists (no dedup). Always walks the shorter
    /// side, bounding work at O(len(self) + len(other)) (§4.5).
    pub fn merge(&mut self, other: MementoList) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }
        if other.len() > self.len() {
            let mut longer = other;
            std::mem::swap(self, &mut longer);
            self.merge_into(longer);
        } else {
            self.merge_into(other);
        }
    }

    /// Merge `shorter` (len <= self.len()) into self. Mirrors a reverse
    /// two-cursor splice: walk both tails in lockstep, always taking the
    /// element with the strictly-greater key, falling back to `self`'s
    /// side on ties so that ties resolve in original relative order.
    fn merge_into(&mut self, shorter: MementoList) {
        let base: Vec<Memento> = std::mem::take(&mut self.items).into();
        let new: Vec<Memento> = shorter.items.into();

        let mut base_iter = base.into_iter().rev().peekable();
        let mut new_iter = new.into_iter().rev().peekable();
        let mut rev_result: Vec<Memento> = Vec::with_capacity(base_iter.len() + new_iter.len());

        loop {
            match (base_iter.peek(), new_iter.peek()) {
                (Some(m), Some(e)) => {
                    if e.datetime_key > m.datetime_key {
                        rev_result.push(new_iter.next().unwrap());
                    } else {
                        rev_result.push(base_iter.next().unwrap());
                    }
                }
                (Some(_), None) => rev_result.push(base_iter.next().unwrap()),
                (None, Some(_)) => rev_result.push(new_iter.next().unwrap()),
                (None, None) => break,
            }
        }
        rev_result.reverse();
        self.items = rev_result.into();
    }

    /// True iff keys are non-decreasing end to end (§8 invariant 1).
    pub fn is_sorted(&self) -> bool {
        self.items
            .iter()
            .zip(self.items.iter().skip(1))
            .all(|(a, b)| a.datetime_key <= b.datetime_key)
    }
}


/// §8 invariants 1 and 3 (sort order, element conservation) over arbitrary
/// per-archive lists, not just the hand-picked cases above.
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn memento_at(epoch_secs: i64) -> Memento {
        let dt = DateTime::from_timestamp(epoch_secs, 0).unwrap();
        Memento::new(format!("http://x/{epoch_secs}"), dt, "n/a".to_string())
    }

    fn list_from(seconds: &[i64]) -> MementoList {
        let mut list = MementoList::new();
        for s in seconds {
            list.insert_sorted(memento_at(*s));
        }
        list
    }

    proptest! {
        #[test]
        fn insert_sorted_always_sorted(seconds in proptest::collection::vec(0i64..2_000_000_000, 0..30)) {
            let list = list_from(&seconds);
            prop_assert!(list.is_sorted());
            prop_assert_eq!(list.len(), seconds.len());
        }

        #[test]
        fn merge_conserves_length_and_sort(
            a in proptest::collection::vec(0i64..2_000_000_000, 0..20),
            b in proptest::collection::vec(0i64..2_000_000_000, 0..20),
        ) {
            let mut list_a = list_from(&a);
            let list_b = list_from(&b);
            let total = list_a.len() + list_b.len();
            list_a.merge(list_b);
            prop_assert_eq!(list_a.len(), total);
            prop_assert!(list_a.is_sorted());
        }
    }
}
