use crate::model::{Id, ModelKind};

/// The many-to-many relations between library-owned records. Each relation has a left and a
/// right side; for the ordered relations the left side is the container the ordinal positions a
/// story within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    AuthorSeries,
    AuthorStory,
    AuthorVolume,
    SeriesStory,
    VolumeStory,
}

/// Which side of a relation a record sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Relation {
    pub const ALL: [Self; 5] = [
        Self::AuthorSeries,
        Self::AuthorStory,
        Self::AuthorVolume,
        Self::SeriesStory,
        Self::VolumeStory,
    ];

    #[must_use]
    #[inline]
    pub const fn sides(self) -> (ModelKind, ModelKind) {
        match self {
            Self::AuthorSeries => (ModelKind::Author, ModelKind::Series),
            Self::AuthorStory => (ModelKind::Author, ModelKind::Story),
            Self::AuthorVolume => (ModelKind::Author, ModelKind::Volume),
            Self::SeriesStory => (ModelKind::Series, ModelKind::Story),
            Self::VolumeStory => (ModelKind::Volume, ModelKind::Story),
        }
    }

    /// Whether edges of this relation carry an ordinal
    #[must_use]
    #[inline]
    pub const fn is_ordered(self) -> bool {
        matches!(self, Self::SeriesStory | Self::VolumeStory)
    }

    /// The relation joining `from` to `to`, and the side `from` sits on
    #[must_use]
    #[inline]
    pub fn between(from: ModelKind, to: ModelKind) -> Option<(Self, Side)> {
        Self::ALL.into_iter().find_map(|relation| {
            let (left, right) = relation.sides();
            if (left, right) == (from, to) {
                Some((relation, Side::Left))
            } else if (right, left) == (from, to) {
                Some((relation, Side::Right))
            } else {
                None
            }
        })
    }
}

impl Side {
    /// Orders `(this, other)` into `(left, right)`
    #[must_use]
    #[inline]
    pub const fn orient(self, this: Id, other: Id) -> (Id, Id) {
        match self {
            Self::Left => (this, other),
            Self::Right => (other, this),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub left: Id,
    pub right: Id,
    pub ordinal: Option<i64>,
}

/// Edges of one relation in insertion order. A (left, right) pair occurs at most once.
#[derive(Debug, Clone, Default)]
pub struct MembershipSet {
    edges: Vec<Edge>,
}

impl MembershipSet {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[inline]
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    #[must_use]
    #[inline]
    pub fn get(&self, left: Id, right: Id) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|edge| edge.left == left && edge.right == right)
    }

    #[must_use]
    #[inline]
    pub fn contains(&self, left: Id, right: Id) -> bool {
        self.get(left, right).is_some()
    }

    /// Adds the edge unless the pair is already present, in which case the stored edge (and its
    /// ordinal) stays as it is. Returns whether an edge was added.
    #[inline]
    pub fn include(&mut self, left: Id, right: Id, ordinal: Option<i64>) -> bool {
        if self.contains(left, right) {
            return false;
        }
        self.edges.push(Edge {
            left,
            right,
            ordinal,
        });
        true
    }

    /// Removes the edge if present. Returns whether an edge was removed.
    #[inline]
    pub fn exclude(&mut self, left: Id, right: Id) -> bool {
        let before = self.edges.len();
        self.edges
            .retain(|edge| !(edge.left == left && edge.right == right));
        self.edges.len() != before
    }

    /// Partners of `id` on the opposite side, with the edge ordinal, in insertion order
    #[must_use]
    #[inline]
    pub fn partners(&self, side: Side, id: Id) -> Vec<(Id, Option<i64>)> {
        self.edges
            .iter()
            .filter_map(|edge| match side {
                Side::Left if edge.left == id => Some((edge.right, edge.ordinal)),
                Side::Right if edge.right == id => Some((edge.left, edge.ordinal)),
                Side::Left | Side::Right => None,
            })
            .collect()
    }

    /// Drops every edge touching `id` on `side`; returns how many were dropped
    #[inline]
    pub fn purge(&mut self, side: Side, id: Id) -> usize {
        let before = self.edges.len();
        self.edges.retain(|edge| match side {
            Side::Left => edge.left != id,
            Side::Right => edge.right != id,
        });
        before - self.edges.len()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.edges.clear();
    }
}

/// Sorts by ascending ordinal. Entries without one go after every entry that has one; the sort
/// is stable, so ties keep their insertion order.
#[inline]
pub fn sort_by_ordinal<T>(entries: &mut [(T, Option<i64>)]) {
    entries.sort_by_key(|&(_, ordinal)| (ordinal.is_none(), ordinal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn relations_resolve_in_both_directions() {
        assert_eq!(
            Relation::between(ModelKind::Series, ModelKind::Story),
            Some((Relation::SeriesStory, Side::Left))
        );
        assert_eq!(
            Relation::between(ModelKind::Story, ModelKind::Series),
            Some((Relation::SeriesStory, Side::Right))
        );
        assert_eq!(
            Relation::between(ModelKind::Volume, ModelKind::Author),
            Some((Relation::AuthorVolume, Side::Right))
        );
        assert_eq!(Relation::between(ModelKind::Series, ModelKind::Volume), None);
        assert_eq!(Relation::between(ModelKind::Author, ModelKind::Author), None);
        assert_eq!(Relation::between(ModelKind::Library, ModelKind::Author), None);
    }

    #[test]
    fn include_twice_keeps_one_edge() {
        let mut set = MembershipSet::new();
        assert!(set.include(1, 2, Some(4)));
        assert!(!set.include(1, 2, Some(9)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(1, 2).map(|edge| edge.ordinal), Some(Some(4)));
    }

    #[test]
    fn exclude_without_include_is_a_no_op() {
        let mut set = MembershipSet::new();
        set.include(1, 2, None);
        assert!(!set.exclude(2, 1));
        assert!(!set.exclude(5, 6));
        assert_eq!(set.len(), 1);
        assert!(set.exclude(1, 2));
        assert!(set.is_empty());
    }

    #[test]
    fn partners_follow_insertion_order() {
        let mut set = MembershipSet::new();
        set.include(1, 30, None);
        set.include(2, 10, None);
        set.include(1, 20, Some(1));
        assert_eq!(set.partners(Side::Left, 1), vec![(30, None), (20, Some(1))]);
        assert_eq!(set.partners(Side::Right, 10), vec![(2, None)]);
        assert_eq!(set.purge(Side::Left, 1), 2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn ordinals_sort_before_missing_ones() {
        let mut entries = vec![("c", Some(3)), ("a", Some(1)), ("x", None), ("b", Some(2)), ("y", None)];
        sort_by_ordinal(&mut entries);
        let order: Vec<&str> = entries.iter().map(|&(name, _)| name).collect();
        assert_eq!(order, vec!["a", "b", "c", "x", "y"]);
    }
}
