//! Sequence helpers

/// Remove the element at `index` in place and hand the same vector back.
///
/// An out-of-range index leaves the vector untouched instead of panicking.
///
/// ```
/// let mut items = vec![1, 2, 3];
/// assert_eq!(helpers::remove_item_by_index(1, &mut items), &vec![1, 3]);
/// assert_eq!(helpers::remove_item_by_index(5, &mut items), &vec![1, 3]);
/// ```
pub fn remove_item_by_index<T>(index: usize, items: &mut Vec<T>) -> &mut Vec<T> {
    if index < items.len() {
        items.remove(index);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_each_position() {
        assert_eq!(remove_item_by_index(0, &mut vec![1, 2, 3]), &vec![2, 3]);
        assert_eq!(remove_item_by_index(1, &mut vec![1, 2, 3]), &vec![1, 3]);
        assert_eq!(remove_item_by_index(2, &mut vec![1, 2, 3]), &vec![1, 2]);
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut items = vec![1, 2, 3];
        assert_eq!(remove_item_by_index(3, &mut items), &vec![1, 2, 3]);

        let mut empty: Vec<u8> = Vec::new();
        assert!(remove_item_by_index(0, &mut empty).is_empty());
    }

    #[test]
    fn test_mutates_callers_vector() {
        let mut items = vec!["a", "b"];
        remove_item_by_index(0, &mut items).push("c");
        assert_eq!(items, vec!["b", "c"]);
    }
}
