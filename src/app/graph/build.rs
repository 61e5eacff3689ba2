use std::collections::{HashMap, HashSet};

use eframe::egui::{Vec2, vec2};

use crate::util::short_address;

use super::super::render_utils::{MAIN_NODE_RADIUS, NODE_RADIUS};
use super::super::{
    DragState, PhysicsScratch, RenderGraph, RenderLink, RenderNode, ViewModel, ViewScratch,
};
use super::filter::visible_set;

/// Horizontal distance used by the first-appearance placement rules.
pub(in crate::app) const PLACEMENT_OFFSET: f32 = 120.0;

/// One incident transfer as seen from a particular node.
#[derive(Clone, Copy)]
pub(in crate::app) struct IncidentTransfer {
    /// True when the node is the receiving end.
    pub(in crate::app) inbound: bool,
    pub(in crate::app) usdt_amount: f64,
}

fn signed_value(transfer: IncidentTransfer) -> f64 {
    if transfer.inbound {
        transfer.usdt_amount
    } else {
        -transfer.usdt_amount
    }
}

/// Placement for a node appearing for the first time (no entry in the
/// position map). The world origin is the canvas center.
pub(in crate::app) fn initial_position(is_main: bool, incident: &[IncidentTransfer]) -> Vec2 {
    if is_main {
        return Vec2::ZERO;
    }

    match incident {
        [only] => {
            let sign = if only.inbound { 1.0 } else { -1.0 };
            vec2(sign * PLACEMENT_OFFSET, 0.0)
        }
        [first, second] => {
            let net = signed_value(*first) + signed_value(*second);
            if net > 0.0 {
                vec2(PLACEMENT_OFFSET, 0.0)
            } else if net < 0.0 {
                vec2(-PLACEMENT_OFFSET, 0.0)
            } else {
                Vec2::ZERO
            }
        }
        _ => Vec2::ZERO,
    }
}

impl ViewModel {
    /// Rebuild the rendered node/link set from the store and the current
    /// main/grouped sets. The previous render graph is discarded first so
    /// simulation runs never overlap, and the layout energy is reset.
    pub(in crate::app) fn rebuild_render_graph(&mut self) {
        self.render_graph_revision = self.render_graph_revision.wrapping_add(1);
        self.rendered_revision = self.store.revision();
        self.search_match_cache = None;
        // A rebuild discards the node indices a drag refers to, so the drag
        // ends here; its energy floor must end with it or the simulation
        // never settles.
        self.drag = DragState::Idle;
        self.alpha_target = 0.0;

        let main = self
            .main_addresses
            .iter()
            .map(String::as_str)
            .collect::<HashSet<_>>();
        let grouped = self
            .grouped
            .iter()
            .map(String::as_str)
            .collect::<HashSet<_>>();

        let visible = visible_set(self.store.nodes(), self.store.links(), &main, &grouped);
        if visible.nodes.is_empty() {
            self.graph_cache = None;
            self.visible_node_count = 0;
            self.visible_link_count = 0;
            self.graph_dirty = false;
            return;
        }

        let store_nodes = self.store.nodes();
        let store_links = self.store.links();

        let mut nodes = Vec::with_capacity(visible.nodes.len());
        let mut index_by_id = HashMap::with_capacity(visible.nodes.len());
        for &store_index in &visible.nodes {
            let node = &store_nodes[store_index];
            let is_main = main.contains(node.id.as_str());

            let world_pos = match self.positions.get(&node.id) {
                Some(position) => *position,
                None => {
                    let incident = self
                        .store
                        .incident_links(&node.id)
                        .map(|link| IncidentTransfer {
                            inbound: link.receiver == node.id,
                            usdt_amount: link.usdt_amount,
                        })
                        .collect::<Vec<_>>();
                    initial_position(is_main, &incident)
                }
            };

            let label = if node.name.is_empty() {
                short_address(&node.id)
            } else {
                node.name.clone()
            };

            index_by_id.insert(node.id.clone(), nodes.len());
            nodes.push(RenderNode {
                id: node.id.clone(),
                label,
                category: node.category,
                usdt_balance: node.usdt_balance,
                world_pos,
                velocity: Vec2::ZERO,
                pinned: None,
                is_main,
                is_grouped: grouped.contains(node.id.as_str()),
                base_radius: if is_main { MAIN_NODE_RADIUS } else { NODE_RADIUS },
            });
        }

        let mut links = Vec::with_capacity(visible.links.len());
        for &link_index in &visible.links {
            let link = &store_links[link_index];
            if let (Some(&source), Some(&target)) = (
                index_by_id.get(link.sender.as_str()),
                index_by_id.get(link.receiver.as_str()),
            ) {
                links.push(RenderLink {
                    source,
                    target,
                    usdt_amount: link.usdt_amount,
                });
            }
        }

        // Keep scratch allocations alive across rebuilds.
        let (physics_scratch, mut view_scratch) = match self.graph_cache.take() {
            Some(previous) => (previous.physics_scratch, previous.view_scratch),
            None => (
                PhysicsScratch {
                    forces: Vec::new(),
                    positions: Vec::new(),
                },
                ViewScratch {
                    screen_positions: Vec::new(),
                    screen_radii: Vec::new(),
                    visible_indices: Vec::new(),
                },
            ),
        };
        // Carried-over screen coordinates index the previous node array; a
        // hit test running before the next projection would pin the wrong
        // node.
        view_scratch.screen_positions.clear();
        view_scratch.screen_radii.clear();
        view_scratch.visible_indices.clear();

        self.visible_node_count = nodes.len();
        self.visible_link_count = links.len();
        self.graph_cache = Some(RenderGraph {
            nodes,
            links,
            index_by_id,
            physics_scratch,
            view_scratch,
        });
        self.graph_dirty = false;

        tracing::debug!(
            nodes = self.visible_node_count,
            links = self.visible_link_count,
            "render graph rebuilt"
        );
        self.restart_layout();
    }

    /// Diff simulated positions against the position map and write back when
    /// anything moved. Persistence only; never marks the graph dirty. Entries
    /// for nodes that are currently display-filtered away are retained so
    /// they do not jump when they come back.
    pub(in crate::app) fn sync_positions(&mut self) {
        let Some(cache) = &self.graph_cache else {
            return;
        };

        let changed = cache.nodes.iter().any(|node| {
            self.positions
                .get(&node.id)
                .is_none_or(|position| *position != node.world_pos)
        });
        if !changed {
            return;
        }

        for node in &cache.nodes {
            self.positions.insert(node.id.clone(), node.world_pos);
        }
    }
}
