//! Header deduplication.
//!
//! Spreadsheets happily carry two columns called `Comment`. Everything
//! downstream keys on header names, so they are made unique first: the first
//! occurrence is kept verbatim and the k-th repeat of `H` becomes `H_k`.

use std::collections::{HashMap, HashSet};

/// Make every header name unique without reordering.
///
/// A generated `H_k` that is already taken (because the sheet literally has a
/// column called `H_1`, say) is bumped to the next free suffix.
pub fn make_unique_headers<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    let mut repeats: HashMap<&str, usize> = HashMap::new();
    let mut emitted: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut result = Vec::with_capacity(headers.len());

    for h in headers {
        let h = h.as_ref();
        let name = match repeats.get_mut(h) {
            None => {
                repeats.insert(h, 0);
                if emitted.contains(h) {
                    next_free(h, 0, &emitted).0
                } else {
                    h.to_string()
                }
            }
            Some(last) => {
                let (name, used) = next_free(h, *last, &emitted);
                *last = used;
                name
            }
        };
        emitted.insert(name.clone());
        result.push(name);
    }

    result
}

/// First `base_k` with `k > after` that has not been emitted yet.
fn next_free(base: &str, after: usize, emitted: &HashSet<String>) -> (String, usize) {
    let mut k = after + 1;
    loop {
        let candidate = format!("{base}_{k}");
        if !emitted.contains(&candidate) {
            return (candidate, k);
        }
        k += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_unique_headers_verbatim() {
        let out = make_unique_headers(&["ID", "Comment", "Credibility"]);
        assert_eq!(out, vec!["ID", "Comment", "Credibility"]);
    }

    #[test]
    fn suffixes_repeats_in_order() {
        let out = make_unique_headers(&["A", "B", "A", "A", "B"]);
        assert_eq!(out, vec!["A", "B", "A_1", "A_2", "B_1"]);
    }

    #[test]
    fn blank_headers_are_deduplicated_too() {
        let out = make_unique_headers(&["", "", "x", ""]);
        assert_eq!(out, vec!["", "_1", "x", "_2"]);
    }

    #[test]
    fn generated_name_never_collides_with_literal() {
        let out = make_unique_headers(&["A", "A_1", "A"]);
        assert_eq!(out, vec!["A", "A_1", "A_2"]);

        let out = make_unique_headers(&["A", "A", "A_1"]);
        assert_eq!(out, vec!["A", "A_1", "A_1_1"]);
    }

    #[test]
    fn empty_input() {
        let out = make_unique_headers::<&str>(&[]);
        assert!(out.is_empty());
    }
}
