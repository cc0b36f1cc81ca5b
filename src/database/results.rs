//! Query results over a snapshot of one collection

use std::cmp::Ordering;

/// Owned, queryable sequence of records returned by [`super::Database::objects`]
#[derive(Debug, Clone, PartialEq)]
pub struct Results<T> {
    items: Vec<T>,
}

impl<T> Results<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Keep the records matching `predicate`
    pub fn filtered<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool,
    {
        self.items.retain(|item| predicate(item));
        self
    }

    /// Stable sort by `compare`, reversed when `is_ascending` is false
    pub fn sorted_by<C>(mut self, compare: C, is_ascending: bool) -> Self
    where
        C: Fn(&T, &T) -> Ordering,
    {
        self.items.sort_by(|a, b| {
            let ordering = compare(a, b);
            if is_ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        self
    }

    pub fn find<P>(&self, predicate: P) -> Option<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.items.iter().find(|item| predicate(item))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> IntoIterator for Results<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_then_sort() {
        let results = Results::new(vec![3, 8, 1, 6])
            .filtered(|n| *n > 2)
            .sorted_by(|a, b| a.cmp(b), false);
        assert_eq!(results.into_vec(), vec![8, 6, 3]);
    }

    #[test]
    fn test_find() {
        let results = Results::new(vec!["apple", "banana"]);
        assert_eq!(results.find(|s| s.starts_with('b')), Some(&"banana"));
        assert_eq!(results.find(|s| s.is_empty()), None);
    }
}
