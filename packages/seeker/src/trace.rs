//! Chain reconstruction over recorded edges.

use std::collections::{HashMap, HashSet, VecDeque};

/// Find the shortest chain of nodes from `source` to `dest`.
///
/// Edges are visited in the order given, so among chains of equal length the
/// one built from earlier edges wins. `source == dest` yields `[source]`.
pub fn find_chain<'a, I>(edges: I, source: &str, dest: &str) -> Option<Vec<String>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if source == dest {
        return Some(vec![source.to_string()]);
    }

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for (from, to) in edges {
        adjacency.entry(from).or_default().push(to);
    }

    let mut previous: HashMap<&str, &str> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::from([source]);
    let mut queue: VecDeque<&str> = VecDeque::from([source]);

    while let Some(node) = queue.pop_front() {
        let Some(neighbors) = adjacency.get(node) else {
            continue;
        };

        for &next in neighbors {
            if !visited.insert(next) {
                continue;
            }
            previous.insert(next, node);

            if next == dest {
                let mut chain = vec![dest.to_string()];
                let mut current = dest;
                while let Some(&prev) = previous.get(current) {
                    chain.push(prev.to_string());
                    current = prev;
                }
                chain.reverse();
                return Some(chain);
            }

            queue.push_back(next);
        }
    }

    None
}
