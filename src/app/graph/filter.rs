use std::collections::HashSet;

use crate::graph::{Link, Node};

/// Indices into the store's node/link slices that survive display filtering.
pub(in crate::app) struct VisibleSet {
    pub(in crate::app) nodes: Vec<usize>,
    pub(in crate::app) links: Vec<usize>,
}

/// A link stays visible while neither endpoint is collapsed into a group, or
/// when it connects two main addresses (hub-to-hub edges survive grouping).
pub(in crate::app) fn link_shown(
    sender: &str,
    receiver: &str,
    main: &HashSet<&str>,
    grouped: &HashSet<&str>,
) -> bool {
    let ungrouped = !grouped.contains(sender) && !grouped.contains(receiver);
    let main_to_main = main.contains(sender) && main.contains(receiver);
    ungrouped || main_to_main
}

/// Partition the store into the render set for one pass. Links whose
/// endpoints do not both resolve to stored nodes are dropped here, not from
/// the store. A node is kept if it is itself grouped or touches at least one
/// shown link; everything else is display-filtered away.
pub(in crate::app) fn visible_set(
    nodes: &[Node],
    links: &[Link],
    main: &HashSet<&str>,
    grouped: &HashSet<&str>,
) -> VisibleSet {
    let known_ids = nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();

    let mut shown_links = Vec::new();
    let mut link_endpoints: HashSet<&str> = HashSet::new();
    for (index, link) in links.iter().enumerate() {
        if !known_ids.contains(link.sender.as_str()) || !known_ids.contains(link.receiver.as_str())
        {
            continue;
        }

        if link_shown(&link.sender, &link.receiver, main, grouped) {
            shown_links.push(index);
            link_endpoints.insert(link.sender.as_str());
            link_endpoints.insert(link.receiver.as_str());
        }
    }

    let shown_nodes = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            grouped.contains(node.id.as_str()) || link_endpoints.contains(node.id.as_str())
        })
        .map(|(index, _)| index)
        .collect();

    VisibleSet {
        nodes: shown_nodes,
        links: shown_links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeCategory;

    fn node(id: &str) -> Node {
        Node {
            id: id.to_owned(),
            category: NodeCategory::User,
            name: String::new(),
            usdt_balance: 0.0,
            tokens: Vec::new(),
        }
    }

    fn link(id: &str, sender: &str, receiver: &str) -> Link {
        Link {
            id: id.to_owned(),
            sender: sender.to_owned(),
            receiver: receiver.to_owned(),
            usdt_amount: 1.0,
            tokens_amount: Vec::new(),
        }
    }

    const IDS: [&str; 5] = ["0xA", "0xB", "0xC", "0xD", "0xE"];

    fn fixture() -> (Vec<Node>, Vec<Link>) {
        let nodes = IDS.iter().map(|id| node(id)).collect();
        let links = vec![
            link("l1", "0xA", "0xB"),
            link("l2", "0xB", "0xC"),
            link("l3", "0xC", "0xA"),
            link("l4", "0xA", "0xD"),
            link("l5", "0xD", "0xE"),
            link("l6", "0xE", "0xA"),
        ];
        (nodes, links)
    }

    fn subset(mask: u32) -> HashSet<&'static str> {
        IDS.iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, id)| *id)
            .collect()
    }

    #[test]
    fn link_visibility_formula_holds_for_all_subsets() {
        let (nodes, links) = fixture();

        for main_mask in 0u32..32 {
            let main = subset(main_mask);
            for grouped_mask in 0u32..32 {
                // Grouping is only reachable for main addresses.
                if grouped_mask & !main_mask != 0 {
                    continue;
                }
                let grouped = subset(grouped_mask);

                let visible = visible_set(&nodes, &links, &main, &grouped);
                let shown = visible.links.iter().copied().collect::<HashSet<_>>();

                for (index, link) in links.iter().enumerate() {
                    let sender = link.sender.as_str();
                    let receiver = link.receiver.as_str();
                    let expected = (!grouped.contains(sender) && !grouped.contains(receiver))
                        || (main.contains(sender) && main.contains(receiver));
                    assert_eq!(
                        shown.contains(&index),
                        expected,
                        "link {index} main={main_mask:05b} grouped={grouped_mask:05b}"
                    );
                }
            }
        }
    }

    #[test]
    fn node_without_shown_links_is_dropped_unless_grouped() {
        let nodes = vec![node("0xA"), node("0xB")];
        let links = vec![link("l1", "0xA", "0xB")];
        let main = HashSet::from(["0xA"]);
        let grouped = HashSet::from(["0xA"]);

        // l1 touches grouped 0xA and 0xB is not main, so the link hides;
        // 0xB then has zero shown links and drops out, 0xA stays as the hub.
        let visible = visible_set(&nodes, &links, &main, &grouped);
        assert!(visible.links.is_empty());
        let shown_ids = visible
            .nodes
            .iter()
            .map(|&index| nodes[index].id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(shown_ids, vec!["0xA"]);
    }

    #[test]
    fn orphan_node_is_excluded_from_render_set() {
        let mut nodes = vec![node("0xA"), node("0xB")];
        nodes.push(node("0xLONER"));
        let links = vec![link("l1", "0xA", "0xB")];

        let visible = visible_set(&nodes, &links, &HashSet::new(), &HashSet::new());
        let shown_ids = visible
            .nodes
            .iter()
            .map(|&index| nodes[index].id.as_str())
            .collect::<Vec<_>>();

        assert_eq!(shown_ids, vec!["0xA", "0xB"]);
    }

    #[test]
    fn dangling_links_are_filtered_at_render_time() {
        let nodes = vec![node("0xA")];
        let links = vec![link("l1", "0xA", "0xMISSING")];

        let visible = visible_set(&nodes, &links, &HashSet::new(), &HashSet::new());
        assert!(visible.links.is_empty());
        assert!(visible.nodes.is_empty());
    }

    #[test]
    fn main_to_main_link_survives_grouping_both_ends() {
        let (nodes, links) = fixture();
        let main = HashSet::from(["0xA", "0xB"]);
        let grouped = HashSet::from(["0xA", "0xB"]);

        let visible = visible_set(&nodes, &links, &main, &grouped);
        // Only l1 (0xA -> 0xB) connects two mains; every other link touches a
        // grouped endpoint and hides.
        assert_eq!(visible.links, vec![0]);
    }
}
