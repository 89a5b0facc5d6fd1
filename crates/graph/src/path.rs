use std::collections::{HashMap, VecDeque};

use crate::LocationGraph;

impl LocationGraph {
    /// Fewest-hop route from `from` to `to`, both ends included.
    ///
    /// Breadth-first over [`LocationGraph::neighbours`], so ties between
    /// equally short routes are broken by authored edge order.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(vec![from.to_string()]);
        }

        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        parent.insert(from, from);

        while let Some(current) = queue.pop_front() {
            for next in self.neighbours(current) {
                if parent.contains_key(next) {
                    continue;
                }
                parent.insert(next, current);
                if next == to {
                    return Some(unwind(&parent, from, to));
                }
                queue.push_back(next);
            }
        }
        None
    }
}

fn unwind(parent: &HashMap<&str, &str>, from: &str, to: &str) -> Vec<String> {
    let mut path = vec![to.to_string()];
    let mut cursor = to;
    while cursor != from {
        let Some(&prev) = parent.get(cursor) else {
            break;
        };
        cursor = prev;
        path.push(cursor.to_string());
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use crate::graph::tests::{sample_graph, tiny_graph};
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_route_across_floors() {
        let graph = sample_graph();
        assert_eq!(
            graph.shortest_path("n-f1-mid-5", "n-f2-mid-1"),
            Some(
                ["n-f1-mid-5", "n-f1-mid-6", "n-f1-stairs", "n-f2-stairs", "n-f2-mid-1"]
                    .map(String::from)
                    .to_vec()
            )
        );
    }

    #[test]
    fn trivial_and_unknown_routes() {
        let graph = sample_graph();
        assert_eq!(
            graph.shortest_path("n-f1-mid-7", "n-f1-mid-7"),
            Some(vec!["n-f1-mid-7".to_string()])
        );
        assert_eq!(graph.shortest_path("n-f1-mid-7", "nowhere"), None);
    }

    #[test]
    fn respects_one_way_edges() {
        let graph = tiny_graph(
            r#"{ "areas": [{ "id": "x", "name": "X", "photos": [
                { "id": "a", "imageUrl": "a.jpg", "directions": { "forward": { "connection": "b" } } },
                { "id": "b", "imageUrl": "b.jpg" }
            ] }] }"#,
        );
        assert_eq!(
            graph.shortest_path("a", "b"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(graph.shortest_path("b", "a"), None);
    }
}
