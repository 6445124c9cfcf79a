//! Ordering kernel: pure functions over ordered sibling lists.
//!
//! Nothing here touches the cache or the mirror. Every function takes a
//! slice and returns a new `Vec`, so callers can keep the input as a
//! rollback snapshot.

use std::cmp::Ordering;

/// Something that has a rank among its siblings
pub trait Positioned {
    /// Zero-based rank; `None` when the remote did not send one
    fn position(&self) -> Option<usize>;

    fn set_position(&mut self, position: usize);

    /// Identity used to break ties between equal positions
    fn order_id(&self) -> &str;
}

/// Bound `n` to `[min, max]`.
///
/// Callers must not pass an empty range (`min > max`).
pub fn clamp<T: Ord>(n: T, min: T, max: T) -> T {
    debug_assert!(min <= max, "clamp called with an empty range");
    if n < min {
        min
    } else if n > max {
        max
    } else {
        n
    }
}

/// Move the element at `from` so it lands at `to`.
///
/// `to` is clamped to the length after removal, so any index past the end
/// appends. An out-of-range `from` returns the list unchanged.
pub fn move_item<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut next = items.to_vec();
    if from >= next.len() || from == to {
        return next;
    }
    let item = next.remove(from);
    let to = to.min(next.len());
    next.insert(to, item);
    next
}

/// Overwrite every element's position with its index
pub fn renumber_positions<T: Positioned + Clone>(items: &[T]) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut item = item.clone();
            item.set_position(index);
            item
        })
        .collect()
}

/// Display order: position ascending (missing counts as 0), then id
pub fn display_cmp<T: Positioned>(a: &T, b: &T) -> Ordering {
    a.position()
        .unwrap_or(0)
        .cmp(&b.position().unwrap_or(0))
        .then_with(|| a.order_id().cmp(b.order_id()))
}

/// Stable sort by [`display_cmp`]
pub fn sort_for_display<T: Positioned + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by(display_cmp);
    sorted
}

/// True when positions are exactly `0..len` in list order
pub fn is_contiguous<T: Positioned>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| item.position() == Some(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: String,
        position: Option<usize>,
    }

    fn item(id: &str, position: Option<usize>) -> Item {
        Item {
            id: id.to_string(),
            position,
        }
    }

    impl Positioned for Item {
        fn position(&self) -> Option<usize> {
            self.position
        }

        fn set_position(&mut self, position: usize) {
            self.position = Some(position);
        }

        fn order_id(&self) -> &str {
            &self.id
        }
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5, 0, 10), 5);
        assert_eq!(clamp(-5, 0, 10), 0);
        assert_eq!(clamp(15, 0, 10), 10);
        assert_eq!(clamp(5, 5, 5), 5);
    }

    #[test]
    fn test_move_item() {
        let arr = ["a", "b", "c", "d"];
        assert_eq!(move_item(&arr, 1, 3), vec!["a", "c", "d", "b"]);
        assert_eq!(move_item(&arr, 2, 0), vec!["c", "a", "b", "d"]);
        assert_eq!(move_item(&arr, 0, 3), vec!["b", "c", "d", "a"]);
        assert_eq!(move_item(&arr, 1, 1), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_move_item_past_end_appends() {
        let arr = ["a", "b", "c"];
        assert_eq!(move_item(&arr, 0, 99), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_move_item_unknown_source_is_identity() {
        let arr = ["a", "b"];
        assert_eq!(move_item(&arr, 5, 0), vec!["a", "b"]);
    }

    #[test]
    fn test_renumber() {
        let items = vec![item("1", Some(5)), item("2", Some(2)), item("3", None)];
        let renumbered = renumber_positions(&items);
        assert_eq!(
            renumbered,
            vec![item("1", Some(0)), item("2", Some(1)), item("3", Some(2))]
        );
        // input untouched
        assert_eq!(items[0].position, Some(5));
    }

    #[test]
    fn test_display_order_tie_breaks_on_id() {
        let items = vec![
            item("b", Some(1)),
            item("c", None),
            item("a", Some(1)),
            item("d", Some(0)),
        ];
        let sorted = sort_for_display(&items);
        let ids: Vec<_> = sorted.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn test_columns_scenario() {
        let cols = renumber_positions(&[item("A", None), item("B", None), item("C", None)]);
        let moved = renumber_positions(&move_item(&cols, 0, 2));
        assert_eq!(
            moved,
            vec![item("B", Some(0)), item("C", Some(1)), item("A", Some(2))]
        );
        assert!(is_contiguous(&moved));
    }

    proptest! {
        #[test]
        fn prop_move_and_back_preserves_elements(
            len in 1usize..20,
            from_seed in any::<usize>(),
            to_seed in any::<usize>(),
        ) {
            let items: Vec<usize> = (0..len).collect();
            let from = from_seed % len;
            let to = to_seed % len;
            let moved = move_item(&items, from, to);
            let back = move_item(&moved, to, from);
            let mut sorted = back.clone();
            sorted.sort();
            prop_assert_eq!(sorted, items.clone());
            prop_assert_eq!(back, items);
        }

        #[test]
        fn prop_renumber_matches_index(
            positions in proptest::collection::vec(proptest::option::of(0usize..50), 0..30)
        ) {
            let items: Vec<Item> = positions
                .iter()
                .enumerate()
                .map(|(i, p)| item(&i.to_string(), *p))
                .collect();
            let renumbered = renumber_positions(&items);
            prop_assert_eq!(renumbered.len(), items.len());
            prop_assert!(is_contiguous(&renumbered));
        }
    }
}
