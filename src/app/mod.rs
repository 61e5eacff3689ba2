use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{Context, Pos2, Vec2};

use crate::api::{ApiClient, FetchError};
use crate::graph::{GraphSnapshot, GraphStore, NodeCategory};
use crate::util::short_address;

mod graph;
mod physics;
mod render_utils;
mod ui;

/// Full simulation energy, assigned whenever the rendered graph is rebuilt.
const ALPHA_RESTART: f32 = 1.0;
/// Below this the simulation is considered settled and stops stepping.
const ALPHA_MIN: f32 = 0.005;
/// Per-frame relaxation of alpha toward its target.
const ALPHA_DECAY: f32 = 0.035;
/// Energy floor held while a node drag is active, keeps the layout responsive.
const DRAG_ALPHA_TARGET: f32 = 0.3;

pub struct ExplorerApp {
    model: ViewModel,
}

struct PendingFetch {
    address: String,
    rx: Receiver<Result<GraphSnapshot, FetchError>>,
}

/// Pointer interaction state for the graph canvas. Zoom and background pan
/// are stateless per frame; only node drags span frames.
enum DragState {
    Idle,
    Node { index: usize },
}

struct ViewModel {
    client: ApiClient,
    store: GraphStore,
    /// Store revision last baked into the render graph.
    rendered_revision: u64,
    /// Addresses the user explicitly focused, in focus order.
    main_addresses: Vec<String>,
    /// Main addresses currently collapsed into grouped display.
    grouped: HashSet<String>,
    /// Last-known world coordinate per node id, kept across rebuilds so
    /// re-simulation does not jump settled nodes.
    positions: HashMap<String, Vec2>,
    pending_fetches: Vec<PendingFetch>,
    last_error: Option<String>,
    address_input: String,
    search: String,
    selected: Option<String>,
    pan: Vec2,
    zoom: f32,
    drag: DragState,
    alpha: f32,
    alpha_target: f32,
    live_physics: bool,
    physics_intensity: f32,
    physics_repulsion: f32,
    physics_spring: f32,
    physics_velocity_damping: f32,
    physics_x_pull: f32,
    physics_y_pull: f32,
    graph_dirty: bool,
    render_graph_revision: u64,
    graph_cache: Option<RenderGraph>,
    search_match_cache: Option<SearchMatchCache>,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
    visible_node_count: usize,
    visible_link_count: usize,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

struct RenderGraph {
    nodes: Vec<RenderNode>,
    links: Vec<RenderLink>,
    index_by_id: HashMap<String, usize>,
    physics_scratch: PhysicsScratch,
    view_scratch: ViewScratch,
}

struct RenderNode {
    id: String,
    label: String,
    category: NodeCategory,
    usdt_balance: f64,
    world_pos: Vec2,
    velocity: Vec2,
    /// World position the node is pinned to while dragged.
    pinned: Option<Vec2>,
    is_main: bool,
    is_grouped: bool,
    base_radius: f32,
}

struct RenderLink {
    source: usize,
    target: usize,
    usdt_amount: f64,
}

struct PhysicsScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
}

struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
}

#[derive(Clone, Copy)]
struct LayoutConfig {
    intensity: f32,
    repulsion_scale: f32,
    spring_scale: f32,
    velocity_damping: f32,
    x_pull: f32,
    y_pull: f32,
    delta_seconds: f32,
}

impl ExplorerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, client: ApiClient) -> Self {
        Self {
            model: ViewModel::new(client),
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.model.poll_fetches();
        if !self.model.pending_fetches.is_empty() {
            ctx.request_repaint();
        }
        self.model.show(ctx);
    }
}

impl ViewModel {
    fn spawn_fetch(
        client: ApiClient,
        address: String,
    ) -> Receiver<Result<GraphSnapshot, FetchError>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let _ = tx.send(client.fetch_subgraph(&address));
        });

        rx
    }

    fn fetch_in_flight(&self, address: &str) -> bool {
        self.pending_fetches
            .iter()
            .any(|pending| pending.address == address)
    }

    /// Issue a background fetch for `address`. Overlapping fetches for
    /// different addresses are allowed and merge in completion order; a
    /// duplicate of an in-flight address is skipped.
    pub(in crate::app) fn request_fetch(&mut self, address: String) {
        if self.fetch_in_flight(&address) {
            return;
        }

        tracing::info!(%address, "requesting transfer subgraph");
        let rx = Self::spawn_fetch(self.client.clone(), address.clone());
        self.pending_fetches.push(PendingFetch { address, rx });
    }

    fn poll_fetches(&mut self) {
        let mut finished = Vec::new();
        for (index, pending) in self.pending_fetches.iter().enumerate() {
            match pending.rx.try_recv() {
                Ok(result) => finished.push((index, Some(result))),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => finished.push((index, None)),
            }
        }

        for (index, result) in finished.into_iter().rev() {
            let pending = self.pending_fetches.remove(index);
            match result {
                Some(Ok(snapshot)) => {
                    tracing::info!(
                        address = %pending.address,
                        nodes = snapshot.nodes.len(),
                        links = snapshot.links.len(),
                        "fetch completed"
                    );
                    self.store.merge(snapshot);
                    self.last_error = None;
                }
                Some(Err(error)) => {
                    tracing::warn!(address = %pending.address, %error, "fetch failed");
                    self.last_error =
                        Some(format!("{}: {error}", short_address(&pending.address)));
                }
                None => {
                    tracing::warn!(address = %pending.address, "fetch worker disconnected");
                    self.last_error = Some(format!(
                        "{}: fetch worker disconnected",
                        short_address(&pending.address)
                    ));
                }
            }
        }
    }

    /// Record `address` as a main address. Idempotent; keeps focus order.
    pub(in crate::app) fn note_main(&mut self, address: &str) {
        if self.main_addresses.iter().any(|id| id == address) {
            return;
        }

        self.main_addresses.push(address.to_owned());
        self.graph_dirty = true;
    }

    /// Double-click / search entry point: pin the address as main and fetch
    /// its subgraph.
    pub(in crate::app) fn focus_address(&mut self, address: &str) {
        self.note_main(address);
        self.request_fetch(address.to_owned());
    }

    /// Toggle collapsed display for a main address; no-op for other nodes.
    pub(in crate::app) fn toggle_group(&mut self, address: &str) {
        if !self.main_addresses.iter().any(|id| id == address) {
            return;
        }

        if !self.grouped.remove(address) {
            self.grouped.insert(address.to_owned());
        }
        self.graph_dirty = true;
    }

    pub(in crate::app) fn is_main(&self, address: &str) -> bool {
        self.main_addresses.iter().any(|id| id == address)
    }

    /// Drop all session state derived from fetched data. Pan and zoom are
    /// deliberately kept.
    pub(in crate::app) fn clear_graph(&mut self) {
        tracing::info!("clearing graph store");
        self.store.reset();
        self.main_addresses.clear();
        self.grouped.clear();
        self.positions.clear();
        self.selected = None;
        self.graph_cache = None;
        self.search_match_cache = None;
        self.drag = DragState::Idle;
        self.alpha_target = 0.0;
        self.graph_dirty = true;
    }

    pub(in crate::app) fn restart_layout(&mut self) {
        self.alpha = ALPHA_RESTART;
    }

    fn layout_config(&self, delta_seconds: f32) -> LayoutConfig {
        LayoutConfig {
            intensity: self.physics_intensity,
            repulsion_scale: self.physics_repulsion,
            spring_scale: self.physics_spring,
            velocity_damping: self.physics_velocity_damping,
            x_pull: self.physics_x_pull,
            y_pull: self.physics_y_pull,
            delta_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ViewModel {
        let client = ApiClient::new("http://127.0.0.1:9").expect("client builds");
        ViewModel::new(client)
    }

    fn scenario_snapshot() -> GraphSnapshot {
        serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "0xABCDEF0123456789", "type": "user", "name": "a", "usdt_balance": 1.0, "tokens": []},
                    {"id": "0xB00000000000000B", "type": "cex", "name": "b", "usdt_balance": 2.0, "tokens": []}
                ],
                "links": [
                    {"id": "l1", "sender": "0xABCDEF0123456789", "receiver": "0xB00000000000000B", "usdt_amount": 100.0, "tokens_amount": []}
                ]
            }"#,
        )
        .expect("snapshot decodes")
    }

    #[test]
    fn fetch_merge_and_double_click_scenario() {
        let mut model = model();
        model.store.merge(scenario_snapshot());

        assert_eq!(model.store.node_count(), 2);
        assert_eq!(model.store.link_count(), 1);

        // Double-click on the first node: main set gains it and a fetch for
        // the same address goes out.
        model.focus_address("0xABCDEF0123456789");
        assert_eq!(model.main_addresses, vec!["0xABCDEF0123456789"]);
        assert_eq!(model.pending_fetches.len(), 1);
        assert_eq!(model.pending_fetches[0].address, "0xABCDEF0123456789");
    }

    #[test]
    fn note_main_is_idempotent_and_ordered() {
        let mut model = model();
        model.note_main("0xA");
        model.note_main("0xB");
        model.note_main("0xA");

        assert_eq!(model.main_addresses, vec!["0xA", "0xB"]);
    }

    #[test]
    fn toggle_group_only_affects_main_addresses() {
        let mut model = model();
        model.note_main("0xA");

        model.toggle_group("0xB");
        assert!(model.grouped.is_empty());

        model.toggle_group("0xA");
        assert!(model.grouped.contains("0xA"));

        model.toggle_group("0xA");
        assert!(model.grouped.is_empty());
    }

    #[test]
    fn duplicate_in_flight_fetch_is_skipped() {
        let mut model = model();
        model.request_fetch("0xA".to_owned());
        model.request_fetch("0xA".to_owned());
        model.request_fetch("0xB".to_owned());

        assert_eq!(model.pending_fetches.len(), 2);
    }

    #[test]
    fn clear_empties_all_session_state() {
        let mut model = model();
        model.store.merge(scenario_snapshot());
        model.note_main("0xABCDEF0123456789");
        model.toggle_group("0xABCDEF0123456789");
        model.positions.insert("0xABCDEF0123456789".to_owned(), Vec2::new(4.0, 2.0));
        model.drag = DragState::Node { index: 0 };
        model.alpha_target = DRAG_ALPHA_TARGET;

        model.clear_graph();

        assert_eq!(model.store.node_count(), 0);
        assert_eq!(model.store.link_count(), 0);
        assert!(model.main_addresses.is_empty());
        assert!(model.grouped.is_empty());
        assert!(model.positions.is_empty());
        assert!(model.graph_cache.is_none());
        assert!(matches!(model.drag, DragState::Idle));
        assert_eq!(model.alpha_target, 0.0);
    }
}
