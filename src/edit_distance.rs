//! Edit distance, used to suggest the axis name the user probably meant. Follows the approach of
//! `rustc_span::edit_distance`.

use std::cmp;

/// Levenshtein distance between `a` and `b`, or `None` if it exceeds `limit`.
pub fn edit_distance(a: &str, b: &str, limit: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > limit {
        return None;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = cmp::min(substitution, cmp::min(prev[j + 1], curr[j]) + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= limit).then_some(distance)
}

/// Find the candidate closest to `lookup`. A case-insensitive exact match always wins; otherwise
/// the closest candidate within `dist` edits (by default a third of the length of `lookup`).
pub fn find_best_match_for_name<'c>(
    candidates: &[&'c str],
    lookup: &str,
    dist: Option<usize>,
) -> Option<&'c str> {
    if let Some(c) = candidates.iter().find(|c| c.eq_ignore_ascii_case(lookup)) {
        return Some(*c);
    }

    let mut dist = dist.unwrap_or_else(|| cmp::max(lookup.chars().count(), 3) / 3);
    let mut best = None;
    for c in candidates {
        match edit_distance(lookup, c, dist) {
            Some(0) => return Some(*c),
            Some(d) => {
                best = Some(*c);
                if d == 0 {
                    break;
                }
                dist = d - 1;
            }
            None => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        assert_eq!(edit_distance("child", "child", 0), Some(0));
        assert_eq!(edit_distance("chlid", "child", 2), Some(2));
        assert_eq!(edit_distance("parnet", "parent", 1), None);
        assert_eq!(edit_distance("", "self", 4), Some(4));
    }

    #[test]
    fn best_match() {
        let names = ["ancestor", "child", "descendant", "parent", "self"];
        assert_eq!(find_best_match_for_name(&names, "CHILD", None), Some("child"));
        assert_eq!(find_best_match_for_name(&names, "decsendant", Some(3)), Some("descendant"));
        assert_eq!(find_best_match_for_name(&names, "ancestr", Some(3)), Some("ancestor"));
        assert_eq!(find_best_match_for_name(&names, "sibling", Some(3)), None);
    }
}
