use crate::config::{MATCH_DISTANCE, MATCH_THRESHOLD};

/// Scores how well a pattern occurs in a text. Lower is better; `None` means
/// the text is not a match at all.
pub trait RankedMatcher: Send + Sync {
    fn score(&self, pattern: &str, text: &str) -> Option<f64>;

    /// Indices of matching candidates, best first, ties in candidate order.
    fn rank<'a>(
        &self,
        pattern: &str,
        candidates: impl Iterator<Item = (usize, &'a str)>,
        limit: usize,
    ) -> Vec<usize>
    where
        Self: Sized,
    {
        let mut hits: Vec<(f64, usize)> = candidates
            .filter_map(|(idx, text)| self.score(pattern, text).map(|s| (s, idx)))
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().take(limit).map(|(_, idx)| idx).collect()
    }
}

/// Approximate substring matcher.
///
/// The score is the Levenshtein distance of the best alignment of the whole
/// pattern against any substring of the text, divided by the pattern length,
/// plus a penalty for how far into the text that substring starts.
pub struct ApproximateMatcher {
    pub threshold: f64,
    pub distance: f64,
}

impl Default for ApproximateMatcher {
    fn default() -> Self {
        Self {
            threshold: MATCH_THRESHOLD,
            distance: MATCH_DISTANCE,
        }
    }
}

impl ApproximateMatcher {
    /// Edits a pattern of `len` chars may need and still pass the threshold.
    pub fn max_typos(&self, len: usize) -> usize {
        (self.threshold * len as f64).floor() as usize
    }
}

impl RankedMatcher for ApproximateMatcher {
    fn score(&self, pattern: &str, text: &str) -> Option<f64> {
        let m = pattern.chars().count();
        if m == 0 {
            return None;
        }

        // byte offset of every char boundary, including the end
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let n = bounds.len() - 1;

        // a window whose length differs by more than the typo budget can't pass
        let typos = self.max_typos(m);
        let shortest = m.saturating_sub(typos).max(1);
        let longest = m + typos;

        let mut best = f64::INFINITY;
        for start in 0..n {
            let penalty = start as f64 / self.distance;
            if penalty > self.threshold || penalty >= best {
                break;
            }
            for len in shortest..=longest.min(n - start) {
                let window = &text[bounds[start]..bounds[start + len]];
                let score = strsim::levenshtein(pattern, window) as f64 / m as f64 + penalty;
                if score < best {
                    best = score;
                }
            }
        }

        (best <= self.threshold).then_some(best)
    }
}
