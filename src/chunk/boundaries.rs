//! Break point detection for chunking

use unicode_segmentation::UnicodeSegmentation;

/// Priority levels for break points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BreakPriority {
    /// Sentence boundary
    Sentence = 1,
    /// Paragraph boundary (highest)
    Paragraph = 2,
}

/// A potential break point in text
#[derive(Debug, Clone, Copy)]
pub struct BreakPoint {
    /// Byte position where the next segment would start
    pub position: usize,
    /// Priority of this break point
    pub priority: BreakPriority,
}

/// Find paragraph and sentence break points, sorted by position.
///
/// Paragraph breaks are blank lines; sentence breaks come from UAX#29
/// sentence segmentation. When both fall on the same position the
/// paragraph wins.
pub fn find_break_points(text: &str) -> Vec<BreakPoint> {
    let mut points = Vec::new();

    for (i, _) in text.match_indices("\n\n") {
        points.push(BreakPoint {
            position: i + 2,
            priority: BreakPriority::Paragraph,
        });
    }

    for (pos, _) in text.split_sentence_bound_indices() {
        if pos > 0 {
            points.push(BreakPoint {
                position: pos,
                priority: BreakPriority::Sentence,
            });
        }
    }

    points.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| b.priority.cmp(&a.priority))
    });
    points.dedup_by_key(|p| p.position);

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_priority_ordering() {
        assert!(BreakPriority::Paragraph > BreakPriority::Sentence);
    }

    #[test]
    fn test_finds_paragraph_breaks() {
        let text = "First block.\n\nSecond block.";
        let points = find_break_points(text);

        let para: Vec<_> = points
            .iter()
            .filter(|p| p.priority == BreakPriority::Paragraph)
            .collect();
        assert_eq!(para.len(), 1);
        assert_eq!(para[0].position, 14);
    }

    #[test]
    fn test_finds_sentence_breaks() {
        let text = "Exams start in June. Resits follow in September.";
        let points = find_break_points(text);

        assert!(points
            .iter()
            .any(|p| p.priority == BreakPriority::Sentence && p.position == 21));
    }

    #[test]
    fn test_paragraph_wins_on_same_position() {
        let text = "One sentence.\n\nAnother.";
        let points = find_break_points(text);

        let at_15: Vec<_> = points.iter().filter(|p| p.position == 15).collect();
        assert_eq!(at_15.len(), 1);
        assert_eq!(at_15[0].priority, BreakPriority::Paragraph);
    }
}
