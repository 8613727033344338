//! Greedy 1-D gap clustering over sorted, distinct coordinates.
//!
//! Walking left to right, a value joins the open group while its distance to the
//! previous value is at most the gap threshold. A larger jump closes the group,
//! which is kept only if it gathered at least `min_group_size` values.

/// Spacing between two consecutive coordinates that exceeds a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub start: u32,
    pub end: u32,
}

impl Gap {
    pub fn size(&self) -> u32 {
        self.end - self.start
    }
}

/// Splits `sorted` (ascending, distinct) into groups separated by gaps larger
/// than `gap_threshold`. Groups smaller than `min_group_size` are dropped.
pub fn group_by_gaps(sorted: &[u32], gap_threshold: u32, min_group_size: usize) -> Vec<Vec<u32>> {
    debug_assert!(sorted.windows(2).all(|w| w[0] < w[1]), "input must be sorted and distinct");

    let mut groups = Vec::new();
    let mut current: Vec<u32> = Vec::new();

    for &value in sorted {
        match current.last() {
            Some(&previous) if value - previous > gap_threshold => {
                let finished = std::mem::replace(&mut current, vec![value]);
                if finished.len() >= min_group_size {
                    groups.push(finished);
                }
            }
            _ => current.push(value),
        }
    }

    if !current.is_empty() && current.len() >= min_group_size {
        groups.push(current);
    }

    groups
}

/// Every consecutive pair in `sorted` whose spacing exceeds `threshold`.
pub fn significant_gaps(sorted: &[u32], threshold: u32) -> Vec<Gap> {
    sorted
        .windows(2)
        .filter(|pair| pair[1] - pair[0] > threshold)
        .map(|pair| Gap {
            start: pair[0],
            end: pair[1],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_groups() {
        assert!(group_by_gaps(&[], 5, 2).is_empty());
    }

    #[test]
    fn gap_equal_to_threshold_stays_together() {
        assert_eq!(group_by_gaps(&[0, 5, 10], 5, 2), vec![vec![0, 5, 10]]);
    }

    #[test]
    fn gap_above_threshold_splits() {
        assert_eq!(
            group_by_gaps(&[1, 2, 3, 20, 21], 5, 2),
            vec![vec![1, 2, 3], vec![20, 21]]
        );
    }

    #[test]
    fn small_groups_are_dropped_anywhere() {
        // Lone values at the start, middle and end.
        let values = [0, 10, 11, 30, 50, 51, 52, 90];
        assert_eq!(
            group_by_gaps(&values, 5, 2),
            vec![vec![10, 11], vec![50, 51, 52]]
        );
    }

    #[test]
    fn min_group_size_is_respected() {
        assert_eq!(group_by_gaps(&[1, 2, 10, 11, 12], 3, 3), vec![vec![10, 11, 12]]);
        assert_eq!(group_by_gaps(&[7], 3, 1), vec![vec![7]]);
    }

    #[test]
    fn reports_significant_gaps() {
        let gaps = significant_gaps(&[1, 2, 9, 10, 30], 5);
        assert_eq!(gaps, vec![Gap { start: 2, end: 9 }, Gap { start: 10, end: 30 }]);
        assert_eq!(gaps[1].size(), 20);
    }
}
