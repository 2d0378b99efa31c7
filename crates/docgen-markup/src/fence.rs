//! Fenced code block tracking for the line-level marker pass.
//!
//! Block markers (`\page`, `\thead`) are only recognised outside fenced code,
//! so the line scanner feeds every line through a [`FenceTracker`] first.

/// Fence state carried across lines.
///
/// A fence opens with three or more backticks or tildes and closes with a
/// line of the same character that is at least as long.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Feed one line. Returns `true` when the line opens or closes a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();

        match self.open {
            Some((ch, min_len)) => {
                if closes_fence(trimmed, ch, min_len) {
                    self.open = None;
                    return true;
                }
                false
            }
            None => {
                self.open = opening_fence(trimmed);
                self.open.is_some()
            }
        }
    }
}

fn fence_run(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let count = trimmed.chars().take_while(|&c| c == first).count();
    (count >= 3).then_some((first, count))
}

fn opening_fence(trimmed: &str) -> Option<(char, usize)> {
    let (ch, count) = fence_run(trimmed)?;
    // Backtick fences may not carry backticks in the info string.
    if ch == '`' && trimmed[count..].contains('`') {
        return None;
    }
    Some((ch, count))
}

fn closes_fence(trimmed: &str, expected: char, min_len: usize) -> bool {
    match fence_run(trimmed) {
        Some((ch, count)) if ch == expected && count >= min_len => {
            trimmed[count..].chars().all(char::is_whitespace)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtick_fence() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```rust\n"));
        assert!(tracker.in_fence());
        assert!(!tracker.update("\\page\n"));
        assert!(tracker.in_fence());
        assert!(tracker.update("```\n"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_tilde_fence_needs_same_char() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("~~~"));
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
        assert!(tracker.update("~~~~"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_shorter_fence_does_not_close() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("````"));
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_closing_fence_with_text_does_not_close() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```"));
        assert!(!tracker.update("``` not a fence"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_inline_code_is_not_a_fence() {
        let mut tracker = FenceTracker::new();

        assert!(!tracker.update("``inline``"));
        assert!(!tracker.update("```a` b"));
        assert!(!tracker.in_fence());
    }
}
