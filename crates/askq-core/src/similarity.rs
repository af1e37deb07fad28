//! Normalised text similarity for near-duplicate detection.
//!
//! Implements the Ratcliff/Obershelp matching-blocks ratio over characters:
//! twice the combined length of all recursively matched longest common
//! blocks, divided by the total length of both inputs. Equivalent to
//! Python's `difflib.SequenceMatcher.ratio()` without the autojunk
//! heuristic.

/// Similarity in `[0.0, 1.0]`; `1.0` means the inputs are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
  let a: Vec<char> = a.chars().collect();
  let b: Vec<char> = b.chars().collect();
  if a.is_empty() && b.is_empty() {
    return 1.0;
  }
  let matched = matching_total(&a, &b);
  2.0 * matched as f64 / (a.len() + b.len()) as f64
}

/// Total length of all matching blocks: the longest common block plus,
/// recursively, the matches to its left and to its right.
fn matching_total(a: &[char], b: &[char]) -> usize {
  let (ai, bi, len) = longest_block(a, b);
  if len == 0 {
    return 0;
  }
  len
    + matching_total(&a[..ai], &b[..bi])
    + matching_total(&a[ai + len..], &b[bi + len..])
}

/// Earliest longest common contiguous block, `O(|a| · |b|)` time with one
/// rolling row.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
  let mut best = (0, 0, 0);
  let mut row = vec![0usize; b.len() + 1];
  for (i, ca) in a.iter().enumerate() {
    // `diag` is the previous row's value at column j, i.e. the length of
    // the common block ending at (i-1, j-1).
    let mut diag = 0;
    for (j, cb) in b.iter().enumerate() {
      let current = if ca == cb { diag + 1 } else { 0 };
      diag = row[j + 1];
      row[j + 1] = current;
      if current > best.2 {
        best = (i + 1 - current, j + 1 - current, current);
      }
    }
  }
  best
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identical_strings_score_one() {
    assert_eq!(ratio("Какая твоя любимая игра?", "Какая твоя любимая игра?"), 1.0);
    assert_eq!(ratio("", ""), 1.0);
  }

  #[test]
  fn disjoint_strings_score_zero() {
    assert_eq!(ratio("abc", "xyz"), 0.0);
    assert_eq!(ratio("abc", ""), 0.0);
  }

  #[test]
  fn partial_overlap() {
    // Blocks "ab" + "cd": 4 matched characters of 9 total.
    let r = ratio("abcd", "abxcd");
    assert!((r - 2.0 * 4.0 / 9.0).abs() < 1e-9);
  }

  #[test]
  fn paraphrased_questions_exceed_default_threshold() {
    let r = ratio("какая игра лучшая?", "какая игра самая лучшая?");
    assert!(r > 0.7, "expected near-duplicate, got {r}");
  }

  #[test]
  fn unrelated_questions_stay_below_threshold() {
    let r = ratio(
      "какая твоя любимая игра?",
      "когда выйдет новое видео про майнкрафт?",
    );
    assert!(r < 0.7, "expected unrelated, got {r}");
  }

  #[test]
  fn symmetric() {
    let a = "почему ты начал стримить?";
    let b = "почему ты начал играть?";
    assert!((ratio(a, b) - ratio(b, a)).abs() < 1e-12);
  }
}
