use std::collections::HashMap;

use serde::Deserialize;

/// Node classification as reported by the backend. Unknown strings decode to
/// [`NodeCategory::Unknown`] instead of failing the whole snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum NodeCategory {
    User,
    Exchange,
    Bridge,
    #[default]
    Unknown,
}

impl From<String> for NodeCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Self::User,
            "cex" => Self::Exchange,
            "bridge" => Self::Bridge,
            _ => Self::Unknown,
        }
    }
}

impl NodeCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Exchange => "exchange",
            Self::Bridge => "bridge",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TokenAmount {
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub usdt_amount: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", default)]
    pub category: NodeCategory,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub usdt_balance: f64,
    #[serde(default)]
    pub tokens: Vec<TokenAmount>,
}

/// One transfer between two addresses. `sender`/`receiver` reference node ids
/// but are not owning: a link may arrive before (or without) its endpoints and
/// is kept in the store either way.
#[derive(Clone, Debug, Deserialize)]
pub struct Link {
    pub id: String,
    pub sender: String,
    pub receiver: String,
    #[serde(default)]
    pub usdt_amount: f64,
    #[serde(default)]
    pub tokens_amount: Vec<TokenAmount>,
}

/// The node/link set returned by one fetch, merged into the cumulative store.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Cumulative in-memory graph. Merging replaces entries by id in place and
/// appends new ones; nothing is ever removed short of a full reset.
#[derive(Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    links: Vec<Link>,
    node_index: HashMap<String, usize>,
    link_index: HashMap<String, usize>,
    revision: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, snapshot: GraphSnapshot) {
        for node in snapshot.nodes {
            match self.node_index.get(&node.id) {
                Some(&index) => self.nodes[index] = node,
                None => {
                    self.node_index.insert(node.id.clone(), self.nodes.len());
                    self.nodes.push(node);
                }
            }
        }

        for link in snapshot.links {
            match self.link_index.get(&link.id) {
                Some(&index) => self.links[index] = link,
                None => {
                    self.link_index.insert(link.id.clone(), self.links.len());
                    self.links.push(link);
                }
            }
        }

        self.revision = self.revision.wrapping_add(1);
    }

    pub fn reset(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.node_index.clear();
        self.link_index.clear();
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&index| &self.nodes[index])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Bumped on every merge and reset; lets the render layer detect change
    /// without holding a borrow on the store.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn incident_links<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Link> {
        self.links
            .iter()
            .filter(move |link| link.sender == id || link.receiver == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, balance: f64) -> Node {
        Node {
            id: id.to_owned(),
            category: NodeCategory::User,
            name: format!("wallet {id}"),
            usdt_balance: balance,
            tokens: Vec::new(),
        }
    }

    fn link(id: &str, sender: &str, receiver: &str, amount: f64) -> Link {
        Link {
            id: id.to_owned(),
            sender: sender.to_owned(),
            receiver: receiver.to_owned(),
            usdt_amount: amount,
            tokens_amount: Vec::new(),
        }
    }

    fn sample_snapshot() -> GraphSnapshot {
        GraphSnapshot {
            nodes: vec![node("0xA", 100.0), node("0xB", 50.0)],
            links: vec![link("l1", "0xA", "0xB", 100.0)],
        }
    }

    #[test]
    fn merge_twice_is_idempotent() {
        let mut store = GraphStore::new();
        store.merge(sample_snapshot());
        store.merge(sample_snapshot());

        assert_eq!(store.node_count(), 2);
        assert_eq!(store.link_count(), 1);
        assert_eq!(store.node("0xA").map(|n| n.usdt_balance), Some(100.0));
    }

    #[test]
    fn merge_replaces_existing_ids_in_place() {
        let mut store = GraphStore::new();
        store.merge(sample_snapshot());

        store.merge(GraphSnapshot {
            nodes: vec![node("0xA", 999.0)],
            links: vec![link("l1", "0xA", "0xB", 7.0)],
        });

        assert_eq!(store.node_count(), 2);
        assert_eq!(store.link_count(), 1);
        // Replacement keeps the original slot, so ordering is stable.
        assert_eq!(store.nodes()[0].id, "0xA");
        assert_eq!(store.nodes()[0].usdt_balance, 999.0);
        assert_eq!(store.links()[0].usdt_amount, 7.0);
    }

    #[test]
    fn merge_appends_new_entries_after_existing() {
        let mut store = GraphStore::new();
        store.merge(sample_snapshot());
        store.merge(GraphSnapshot {
            nodes: vec![node("0xC", 1.0)],
            links: vec![link("l2", "0xB", "0xC", 3.0)],
        });

        assert_eq!(
            store.nodes().iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            vec!["0xA", "0xB", "0xC"]
        );
        assert_eq!(store.link_count(), 2);
    }

    #[test]
    fn reset_always_empties_the_store() {
        let mut store = GraphStore::new();
        store.merge(sample_snapshot());
        store.merge(GraphSnapshot {
            nodes: vec![node("0xC", 1.0)],
            links: Vec::new(),
        });

        store.reset();

        assert_eq!(store.node_count(), 0);
        assert_eq!(store.link_count(), 0);
        assert!(store.node("0xA").is_none());
    }

    #[test]
    fn revision_changes_on_merge_and_reset() {
        let mut store = GraphStore::new();
        let initial = store.revision();
        store.merge(sample_snapshot());
        let merged = store.revision();
        store.reset();

        assert_ne!(initial, merged);
        assert_ne!(merged, store.revision());
    }

    #[test]
    fn dangling_links_are_kept_in_the_store() {
        let mut store = GraphStore::new();
        store.merge(GraphSnapshot {
            nodes: Vec::new(),
            links: vec![link("l9", "0xMISSING", "0xALSO", 5.0)],
        });

        assert_eq!(store.link_count(), 1);
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn unknown_category_decodes_without_error() {
        let json = r#"{
            "nodes": [
                {"id": "0xA", "type": "cex", "name": "big exchange", "usdt_balance": 1.0, "tokens": []},
                {"id": "0xB", "type": "mixer", "name": "", "usdt_balance": 0.0, "tokens": []}
            ],
            "links": []
        }"#;

        let snapshot: GraphSnapshot = serde_json::from_str(json).expect("snapshot decodes");
        assert_eq!(snapshot.nodes[0].category, NodeCategory::Exchange);
        assert_eq!(snapshot.nodes[1].category, NodeCategory::Unknown);
    }

    #[test]
    fn token_holdings_decode() {
        let json = r#"{
            "nodes": [{
                "id": "0xA",
                "type": "user",
                "name": "w",
                "usdt_balance": 12.5,
                "tokens": [{"name": "USDT", "amount": 12.5, "usdt_amount": 12.5}]
            }],
            "links": [{
                "id": "l1",
                "sender": "0xA",
                "receiver": "0xB",
                "usdt_amount": 3.0,
                "tokens_amount": [{"name": "DAI", "amount": 3.0, "usdt_amount": 3.0}]
            }]
        }"#;

        let snapshot: GraphSnapshot = serde_json::from_str(json).expect("snapshot decodes");
        assert_eq!(snapshot.nodes[0].tokens[0].name, "USDT");
        assert_eq!(snapshot.links[0].tokens_amount[0].usdt_amount, 3.0);
    }
}
