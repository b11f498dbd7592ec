//! Bookkeeping of which source ranges a pass rewrote.
//!
//! Every replacement first marks the whole match site as changed, then
//! marks the pieces it reproduced verbatim from the match as unchanged.
//! Pending marks are folded into the accumulated result once the
//! replacement commits, so a later unchanged mark never hides an earlier
//! change.
use crate::syntax::{Pos, Region};
use smallvec::SmallVec;
use std::iter::FromIterator;

/// A normalized set of disjoint, non-adjacent, non-empty regions.
#[derive(Clone, Default, PartialEq)]
pub struct IntervalSet {
    spans: SmallVec<[(u32, u32); 4]>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn insert(&mut self, region: Region) {
        if !region.is_valid() || region.is_empty() {
            return;
        }
        let (mut start, mut end) = (region.start.raw(), region.end.raw());
        let mut merged: SmallVec<[(u32, u32); 4]> = SmallVec::new();
        let mut placed = false;
        for &(s, e) in &self.spans {
            if e < start {
                merged.push((s, e));
            } else if end < s {
                if !placed {
                    merged.push((start, end));
                    placed = true;
                }
                merged.push((s, e));
            } else {
                start = start.min(s);
                end = end.max(e);
            }
        }
        if !placed {
            merged.push((start, end));
        }
        self.spans = merged;
    }

    pub fn remove(&mut self, region: Region) {
        if !region.is_valid() || region.is_empty() {
            return;
        }
        let (start, end) = (region.start.raw(), region.end.raw());
        let mut kept: SmallVec<[(u32, u32); 4]> = SmallVec::new();
        for &(s, e) in &self.spans {
            if e <= start || end <= s {
                kept.push((s, e));
                continue;
            }
            if s < start {
                kept.push((s, start));
            }
            if end < e {
                kept.push((end, e));
            }
        }
        self.spans = kept;
    }

    pub fn union(&mut self, other: &IntervalSet) {
        for region in other.iter() {
            self.insert(region);
        }
    }

    pub fn subtract(&mut self, other: &IntervalSet) {
        for region in other.iter() {
            self.remove(region);
        }
    }

    /// Whether `region` overlaps any member. An empty region overlaps a
    /// member that strictly contains its position.
    pub fn intersects(&self, region: Region) -> bool {
        if !region.is_valid() {
            return false;
        }
        let (start, end) = (region.start.raw(), region.end.raw());
        self.spans.iter().any(|&(s, e)| {
            if start == end {
                s < start && start < e
            } else {
                s < end && start < e
            }
        })
    }

    pub fn contains(&self, pos: Pos) -> bool {
        let p = pos.raw();
        pos.is_valid() && self.spans.iter().any(|&(s, e)| s <= p && p < e)
    }

    /// End of the last member that ends at or before `pos`.
    pub fn last_end_before(&self, pos: Pos) -> Option<Pos> {
        if !pos.is_valid() {
            return None;
        }
        let p = pos.raw();
        self.spans
            .iter()
            .rev()
            .find(|&&(_, e)| e <= p)
            .map(|&(_, e)| pos_of_raw(e))
    }

    pub fn iter(&self) -> impl Iterator<Item = Region> + '_ {
        self.spans
            .iter()
            .map(|&(s, e)| Region::new(pos_of_raw(s), pos_of_raw(e)))
    }
}

fn pos_of_raw(raw: u32) -> Pos {
    // raw values of valid positions are offsets plus one
    Pos::new(raw as usize - 1)
}

impl std::fmt::Debug for IntervalSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl FromIterator<Region> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        let mut set = IntervalSet::new();
        for region in iter {
            set.insert(region);
        }
        set
    }
}

/// Changed and unchanged marks of one pass.
#[derive(Clone, Default, Debug)]
pub struct Changelog {
    changed: IntervalSet,
    unchanged: IntervalSet,
    accumulated: IntervalSet,
    kept: IntervalSet,
}

impl Changelog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed(&mut self, region: Region) {
        self.changed.insert(region);
    }

    pub fn unchanged(&mut self, region: Region) {
        self.unchanged.insert(region);
    }

    /// Fold the pending marks of one replacement into the result.
    pub fn commit(&mut self) {
        let mut changed = std::mem::take(&mut self.changed);
        changed.subtract(&self.unchanged);
        let unchanged = std::mem::take(&mut self.unchanged);
        self.kept.union(&unchanged);
        self.accumulated.union(&changed);
    }

    /// Drop the pending marks of a replacement that failed.
    pub fn discard(&mut self) {
        self.changed = IntervalSet::new();
        self.unchanged = IntervalSet::new();
    }

    /// Changed ranges of all committed replacements.
    pub fn result(&self) -> &IntervalSet {
        &self.accumulated
    }

    pub fn into_result(self) -> IntervalSet {
        self.accumulated
    }

    /// Ranges committed replacements reproduced verbatim.
    pub fn kept(&self) -> &IntervalSet {
        &self.kept
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn r(s: usize, e: usize) -> Region {
        Region::new(Pos::new(s), Pos::new(e))
    }

    #[test]
    fn test_insert_merges() {
        let mut set = IntervalSet::new();
        set.insert(r(10, 20));
        set.insert(r(0, 5));
        set.insert(r(30, 40));
        assert_eq!(set.len(), 3);
        set.insert(r(5, 10));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![r(0, 20), r(30, 40)]);
        set.insert(r(15, 35));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![r(0, 40)]);
        set.insert(r(3, 3));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_splits() {
        let mut set: IntervalSet = vec![r(0, 20)].into_iter().collect();
        set.remove(r(5, 10));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![r(0, 5), r(10, 20)]);
        set.remove(r(0, 30));
        assert!(set.is_empty());
    }

    #[test]
    fn test_intersects() {
        let set: IntervalSet = vec![r(10, 20)].into_iter().collect();
        assert!(set.intersects(r(15, 25)));
        assert!(!set.intersects(r(20, 25)));
        assert!(!set.intersects(r(0, 10)));
        assert!(set.intersects(r(12, 12)));
        assert!(!set.intersects(r(10, 10)));
        assert!(set.contains(Pos::new(10)));
        assert!(!set.contains(Pos::new(20)));
    }

    #[test]
    fn test_commit_keeps_earlier_changes() {
        let mut log = Changelog::new();
        log.changed(r(0, 10));
        log.unchanged(r(2, 8));
        log.commit();
        assert_eq!(log.result().iter().collect::<Vec<_>>(), vec![r(0, 2), r(8, 10)]);
        // a later verbatim copy of the same text must not hide the change
        log.changed(r(20, 30));
        log.unchanged(r(0, 30));
        log.commit();
        assert_eq!(
            log.result().iter().collect::<Vec<_>>(),
            vec![r(0, 2), r(8, 10)]
        );
    }

    #[test]
    fn test_kept_ranges() {
        let mut log = Changelog::new();
        log.changed(r(0, 10));
        log.unchanged(r(2, 8));
        log.commit();
        log.changed(r(20, 30));
        log.unchanged(r(22, 24));
        log.discard();
        assert_eq!(log.kept().iter().collect::<Vec<_>>(), vec![r(2, 8)]);
    }

    #[test]
    fn test_last_end_before() {
        let set: IntervalSet = vec![r(0, 5), r(10, 20)].into_iter().collect();
        assert_eq!(set.last_end_before(Pos::new(25)), Some(Pos::new(20)));
        assert_eq!(set.last_end_before(Pos::new(20)), Some(Pos::new(20)));
        assert_eq!(set.last_end_before(Pos::new(15)), Some(Pos::new(5)));
        assert_eq!(set.last_end_before(Pos::new(3)), None);
        assert_eq!(set.last_end_before(Pos::NONE), None);
    }

    #[test]
    fn test_discard() {
        let mut log = Changelog::new();
        log.changed(r(0, 10));
        log.discard();
        log.commit();
        assert!(log.result().is_empty());
    }
}
