//! ID-keyed merge-join for repeated collections
//!
//! Both sides are ordered by key, walked with two cursors, and matching
//! keys are merged. Elements present on only one side pass through
//! unchanged; there is no deletion by omission. The output is sorted by
//! key again before it is returned, so callers always see canonical order.

use std::cmp::Ordering;

use types::ids::Keyed;

use crate::merge::Merge;

/// Merge two keyed collections.
///
/// When one side is empty the other is returned as is.
pub fn merge_keyed<T: Merge + Keyed>(left: &[T], right: &[T]) -> Vec<T> {
    if left.is_empty() {
        return right.to_vec();
    }
    if right.is_empty() {
        return left.to_vec();
    }

    let left = sorted_by_key(left);
    let right = sorted_by_key(right);

    let mut output = Vec::with_capacity(left.len().max(right.len()));
    let (mut l, mut r) = (0, 0);
    loop {
        match (left.get(l), right.get(r)) {
            (None, None) => break,
            (Some(item), None) => {
                output.push((*item).clone());
                l += 1;
            }
            (None, Some(item)) => {
                output.push((*item).clone());
                r += 1;
            }
            (Some(a), Some(b)) => match a.key().cmp(b.key()) {
                Ordering::Equal => {
                    output.push(a.merge_with(b));
                    l += 1;
                    r += 1;
                }
                Ordering::Less => {
                    output.push((*a).clone());
                    l += 1;
                }
                Ordering::Greater => {
                    output.push((*b).clone());
                    r += 1;
                }
            },
        }
    }

    // Stable, so duplicate keys keep their relative order
    output.sort_by(|a, b| a.key().cmp(b.key()));
    output
}

/// Borrowed view of `items` in canonical order.
fn sorted_by_key<T: Keyed>(items: &[T]) -> Vec<&T> {
    let mut view: Vec<&T> = items.iter().collect();
    view.sort_by(|a, b| a.key().cmp(b.key()));
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::event::{Market, Selection};
    use types::optional::set;

    fn market(id: &str, name: &str) -> Market {
        Market {
            name: set(name),
            ..Market::new(id)
        }
    }

    fn ids(markets: &[Market]) -> Vec<&str> {
        markets.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_both_empty() {
        let merged: Vec<Market> = merge_keyed(&[], &[]);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_one_side_empty_returns_other_unchanged() {
        // Not re-sorted on the trivial path
        let right = vec![market("b", "B"), market("a", "A")];
        assert_eq!(merge_keyed(&[], &right), right);
        assert_eq!(merge_keyed(&right, &[]), right);
    }

    #[test]
    fn test_union_without_deletion() {
        let merged = merge_keyed(&[market("m2", "Two")], &[market("m1", "One")]);
        assert_eq!(ids(&merged), vec!["m1", "m2"]);
        assert_eq!(merged[0].name, set("One"));
        assert_eq!(merged[1].name, set("Two"));
    }

    #[test]
    fn test_matching_keys_merge() {
        let merged = merge_keyed(&[market("m1", "A")], &[market("m1", "B")]);
        assert_eq!(merged, vec![market("m1", "B")]);
    }

    #[test]
    fn test_interleaved_join() {
        let left = vec![market("d", "L-d"), market("a", "L-a"), market("c", "L-c")];
        let right = vec![market("c", "R-c"), market("b", "R-b"), market("e", "R-e")];

        let merged = merge_keyed(&left, &right);
        assert_eq!(ids(&merged), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(merged[2].name, set("R-c"));
        assert_eq!(merged[3].name, set("L-d"));
    }

    #[test]
    fn test_lexical_not_numeric_order() {
        let merged = merge_keyed(&[market("m10", "x")], &[market("m9", "y")]);
        assert_eq!(ids(&merged), vec!["m10", "m9"]);
    }

    #[test]
    fn test_nested_selections_joined() {
        let mut left = Market::new("m1");
        left.selections = vec![
            Selection {
                price: set(2.0f64),
                ..Selection::new("s2")
            },
            Selection::new("s1"),
        ];
        let mut right = Market::new("m1");
        right.selections = vec![Selection {
            price: set(2.4f64),
            ..Selection::new("s2")
        }];

        let merged = merge_keyed(&[left], &[right]);
        let selections = &merged[0].selections;
        assert_eq!(selections.len(), 2);
        assert_eq!(selections[0].id.as_str(), "s1");
        assert_eq!(selections[1].price, set(2.4f64));
    }

    #[test]
    fn test_merging_canonical_output_is_stable() {
        let merged = merge_keyed(&[market("b", "B")], &[market("a", "A")]);
        assert_eq!(merge_keyed(&merged, &merged), merged);
        assert_eq!(merge_keyed(&merged, &[]), merged);
    }
}
