use crate::domain::section::Section;
use crate::error::{Result, TaskflowError};
use std::cmp::Ordering;

/// Compare sections by their `order` key
///
/// Uses a total ordering on the float key so NaN cannot break the sort.
pub fn compare_order(a: &Section, b: &Section) -> Ordering {
    a.order.total_cmp(&b.order)
}

/// Returns the sections in display order.
///
/// The sort is stable, so sections sharing an `order` value keep their
/// relative position from the input slice.
///
/// # Examples
/// ```
/// use taskflow_core::domain::ordering::display_order;
/// use taskflow_core::domain::section::Section;
///
/// let sections = vec![
///     Section::new("b".into(), "B", 1.0),
///     Section::new("a".into(), "A", 0.0),
/// ];
///
/// let ordered = display_order(&sections);
/// assert_eq!(ordered[0].id.as_str(), "a");
/// ```
pub fn display_order(sections: &[Section]) -> Vec<&Section> {
    let mut ordered: Vec<&Section> = sections.iter().collect();
    ordered.sort_by(|a, b| compare_order(a, b));
    ordered
}

/// Sort key for a section appended after `sections`
pub fn next_order(sections: &[Section]) -> f64 {
    sections
        .iter()
        .map(|s| s.order)
        .max_by(|a, b| a.total_cmp(b))
        .map(|max| max + 1.0)
        .unwrap_or(0.0)
}

/// Removes the element at `from` and reinserts it at `to`.
///
/// `from` must be a valid index. `to` is clamped to the list length after
/// removal, so a drop past the end appends.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<()> {
    if from >= items.len() {
        return Err(TaskflowError::IndexOutOfRange {
            index: from,
            len: items.len(),
        });
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str, order: f64) -> Section {
        Section::new(id.into(), id.to_uppercase(), order)
    }

    #[test]
    fn test_display_order_sorts_by_key() {
        let sections = vec![section("c", 7.0), section("a", 0.0), section("b", 2.5)];
        let ids: Vec<&str> = display_order(&sections)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_display_order_ties_keep_position() {
        let sections = vec![section("x", 1.0), section("y", 0.0), section("z", 1.0)];
        let ids: Vec<&str> = display_order(&sections)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["y", "x", "z"]);
    }

    #[test]
    fn test_next_order() {
        assert_eq!(next_order(&[]), 0.0);
        assert_eq!(next_order(&[section("a", 0.0), section("b", 4.0)]), 5.0);
        assert_eq!(next_order(&[section("a", 9.0), section("b", 1.0)]), 10.0);
    }

    #[test]
    fn test_move_item_forward_and_back() {
        let mut items = vec!['a', 'b', 'c', 'd'];
        move_item(&mut items, 0, 2).unwrap();
        assert_eq!(items, vec!['b', 'c', 'a', 'd']);

        move_item(&mut items, 3, 0).unwrap();
        assert_eq!(items, vec!['d', 'b', 'c', 'a']);
    }

    #[test]
    fn test_move_item_clamps_destination() {
        let mut items = vec![1, 2, 3];
        move_item(&mut items, 0, 99).unwrap();
        assert_eq!(items, vec![2, 3, 1]);
    }

    #[test]
    fn test_move_item_rejects_bad_source() {
        let mut items = vec![1, 2, 3];
        let err = move_item(&mut items, 3, 0).unwrap_err();
        assert!(matches!(
            err,
            TaskflowError::IndexOutOfRange { index: 3, len: 3 }
        ));
        assert_eq!(items, vec![1, 2, 3]);
    }
}
