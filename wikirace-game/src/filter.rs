use crate::page::Candidate;
use std::collections::HashSet;

/// Drop every candidate pointing at an already visited page, keeping order.
pub fn filter_unvisited(candidates: Vec<Candidate>, visited: &HashSet<String>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| !visited.contains(&c.url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(urls: &[&str]) -> Vec<Candidate> {
        urls.iter().map(|u| Candidate::new(format!("link {}", u), *u)).collect()
    }

    #[test]
    fn test_removes_visited_keeps_order() {
        let visited: HashSet<String> = ["b", "d"].iter().map(|s| s.to_string()).collect();
        let kept = filter_unvisited(candidates(&["a", "b", "c", "d", "e"]), &visited);

        let urls: Vec<&str> = kept.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "c", "e"]);
    }

    #[test]
    fn test_everything_visited() {
        let visited: HashSet<String> = ["a"].iter().map(|s| s.to_string()).collect();
        assert!(filter_unvisited(candidates(&["a", "a"]), &visited).is_empty());
    }

    #[test]
    fn test_empty_visited_is_identity() {
        let input = candidates(&["x", "y"]);
        assert_eq!(filter_unvisited(input.clone(), &HashSet::new()), input);
    }
}
