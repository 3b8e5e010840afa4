//! # Fork-Root Heuristic
//!
//! A block scan is only worth running when recent history shows a chain
//! split: more than one stored block at some height within the last `delta`
//! heights.

use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Heights examined for a block at `height`: the `delta` heights ending at
/// `height`, clamped at genesis.
pub fn fork_window(height: u64, delta: u64) -> RangeInclusive<u64> {
    let low = (height + 1).saturating_sub(delta);
    low..=height
}

/// Whether any height in the window holds more than one block.
///
/// `heights` yields the height of every stored block. A `delta` of zero
/// never fires.
pub fn has_recent_fork<I>(heights: I, height: u64, delta: u64) -> bool
where
    I: IntoIterator<Item = u64>,
{
    if delta == 0 {
        return false;
    }
    let window = fork_window(height, delta);
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for h in heights.into_iter().filter(|h| window.contains(h)) {
        let count = counts.entry(h).or_insert(0);
        *count += 1;
        if *count > 1 {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        assert_eq!(fork_window(11, 144), 0..=11);
        assert_eq!(fork_window(200, 144), 57..=200);
        assert_eq!(fork_window(10, 1), 10..=10);
    }

    #[test]
    fn test_linear_chain_has_no_fork() {
        assert!(!has_recent_fork(0..=20, 20, 144));
    }

    #[test]
    fn test_sibling_in_window_fires() {
        let heights = vec![8, 9, 10, 10, 11];
        assert!(has_recent_fork(heights.clone(), 11, 144));
        assert!(has_recent_fork(heights, 11, 2));
    }

    #[test]
    fn test_sibling_outside_window_is_ignored() {
        let heights = vec![8, 9, 10, 10, 11, 12, 13];
        assert!(!has_recent_fork(heights, 13, 3));
    }

    #[test]
    fn test_zero_delta_never_fires() {
        assert!(!has_recent_fork(vec![5, 5], 5, 0));
    }
}
