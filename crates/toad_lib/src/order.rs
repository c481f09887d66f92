//! Partitioning matches and merging positional ones into place.
use crate::parser::marker::{Match, PositionalMatch, ScannedLine};

/// Matches split by whether they asked for a position, each group kept in
/// line order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collected {
    pub plain: Vec<Match>,
    pub positional: Vec<PositionalMatch>,
}

impl Collected {
    pub fn from_scanned(scanned: impl IntoIterator<Item = ScannedLine>) -> Self {
        let mut collected = Collected::default();
        for line in scanned.into_iter() {
            match line {
                ScannedLine::Plain(m) => collected.plain.push(m),
                ScannedLine::Positional(p) => collected.positional.push(p),
            }
        }
        collected
    }

    pub fn len(&self) -> usize {
        self.plain.len() + self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plain.is_empty() && self.positional.is_empty()
    }

    /// Merge into one sequence.
    ///
    /// Positional matches are sorted by target index (stable, so equal
    /// indices keep line order) and then inserted one after the other at
    /// `target_index - 1` into the plain matches. Each insertion sees the
    /// sequence as left by the previous one, so for equal indices the later
    /// match ends up first. Indices past the end append.
    ///
    /// ```rust
    /// use toad_lib::{Collected, MarkerMatcher};
    ///
    /// let contents = "TODO: fix bug\nTODO(2): add test\nTODO(1): refactor\n";
    /// let scanned = MarkerMatcher::new("todo").unwrap().scan(contents).unwrap();
    /// let ordered = Collected::from_scanned(scanned).into_ordered();
    /// let lines = ordered.iter().map(|m| m.line_number).collect::<Vec<_>>();
    /// assert_eq!(lines, vec![3, 2, 1]);
    /// ```
    pub fn into_ordered(self) -> Vec<Match> {
        let Collected {
            mut plain,
            mut positional,
        } = self;
        if positional.is_empty() {
            return plain;
        }

        positional.sort_by_key(|p| p.target_index);
        for PositionalMatch {
            matched,
            target_index,
        } in positional.into_iter()
        {
            if target_index == 0 {
                log::trace!(
                    "  line {} has position 0, appending",
                    matched.line_number
                );
                plain.push(matched);
                continue;
            }
            let at = (target_index - 1).min(plain.len());
            plain.insert(at, matched);
        }
        plain
    }
}
