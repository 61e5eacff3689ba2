mod quadtree;

use eframe::egui::Vec2;

use quadtree::QuadNode;

use super::{LayoutConfig, RenderGraph};

const BARNES_HUT_THETA: f32 = 0.72;
const REPULSION_SOFTENING: f32 = 540.0;
/// Spring rest length before node radii are added.
const LINK_REST_LENGTH: f32 = 110.0;

/// Advance the force simulation by one frame. Forces scale with `alpha`, the
/// d3-style energy that starts at 1.0 on restart and decays toward its
/// target, so a settling graph slows down smoothly instead of stopping dead.
/// Returns whether anything still moved.
pub(in crate::app) fn step_layout(
    cache: &mut RenderGraph,
    config: &LayoutConfig,
    alpha: f32,
) -> bool {
    let node_count = cache.nodes.len();
    let alpha = alpha.clamp(0.0, 1.0);
    if node_count < 2 || alpha <= 0.0 {
        return false;
    }

    let scratch = &mut cache.physics_scratch;
    scratch.forces.resize(node_count, Vec2::ZERO);
    scratch.forces.fill(Vec2::ZERO);
    scratch.positions.clear();
    scratch
        .positions
        .reserve(node_count.saturating_sub(scratch.positions.capacity()));
    for node in &cache.nodes {
        scratch.positions.push(node.world_pos);
    }

    let forces = &mut scratch.forces;
    let positions = &scratch.positions;

    let intensity = config.intensity.clamp(0.2, 2.5);
    let repulsion_strength = 60_000.0 * intensity * config.repulsion_scale.clamp(0.25, 2.6);
    let spring_strength = 0.02 * intensity * config.spring_scale.clamp(0.2, 2.2);
    let spring_damping = 0.22;
    let center_pull = 0.0012 * intensity;
    let x_pull = config.x_pull.clamp(0.0, 0.2) * intensity;
    let y_pull = config.y_pull.clamp(0.0, 0.2) * intensity;
    let damping = config.velocity_damping.clamp(0.78, 0.97);
    let time_step_scale = (config.delta_seconds * 60.0).clamp(0.25, 3.0);
    let damping_factor = damping.powf(time_step_scale);

    if let Some(tree) = QuadNode::build(positions) {
        for (index, force) in forces.iter_mut().enumerate() {
            tree.accumulate_repulsion(
                index,
                positions,
                repulsion_strength,
                REPULSION_SOFTENING,
                BARNES_HUT_THETA,
                force,
            );
        }
    }

    for link in &cache.links {
        let (from, to) = (link.source, link.target);
        if from >= node_count || to >= node_count || from == to {
            continue;
        }

        let delta = cache.nodes[from].world_pos - cache.nodes[to].world_pos;
        let distance_sq = delta.length_sq();
        if distance_sq <= 0.0001 * 0.0001 {
            continue;
        }
        let distance = distance_sq.sqrt();
        let direction = delta / distance;

        let preferred =
            LINK_REST_LENGTH + cache.nodes[from].base_radius + cache.nodes[to].base_radius;
        let spring = (distance - preferred) * spring_strength;
        let relative_velocity = cache.nodes[from].velocity - cache.nodes[to].velocity;
        let damping_force = relative_velocity.dot(direction) * spring_damping;
        let correction = direction * (spring + damping_force);

        forces[from] -= correction;
        forces[to] += correction;
    }

    // Centering toward the canvas midpoint plus independent per-axis pulls.
    for (index, force) in forces.iter_mut().enumerate().take(node_count) {
        let position = cache.nodes[index].world_pos;
        *force -= position * center_pull;
        force.x -= position.x * x_pull;
        force.y -= position.y * y_pull;
    }

    let max_force = 160.0 + (intensity * 90.0);
    let max_force_sq = max_force * max_force;
    let max_speed = 12.0 + (intensity * 14.0);
    let max_speed_sq = max_speed * max_speed;
    let min_sleep_speed_sq = 0.02 * 0.02;
    let min_sleep_force_sq = 0.08 * 0.08;

    let mut any_motion = false;
    for (index, force_value) in forces.iter().enumerate().take(node_count) {
        let node = &mut cache.nodes[index];

        // Dragged nodes are held at the pointer; the simulation flows around
        // them.
        if let Some(pin) = node.pinned {
            node.world_pos = pin;
            node.velocity = Vec2::ZERO;
            continue;
        }

        let mut force = *force_value;
        let force_sq = force.length_sq();
        if force_sq > max_force_sq {
            force *= max_force / force_sq.sqrt();
        }

        let mut velocity =
            (node.velocity + (force * (0.055 * time_step_scale * alpha))) * damping_factor;
        let mut speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= max_speed / speed_sq.sqrt();
            speed_sq = max_speed_sq;
        }

        if speed_sq < min_sleep_speed_sq && force_sq < min_sleep_force_sq {
            velocity = Vec2::ZERO;
            speed_sq = 0.0;
        }

        node.velocity = velocity;
        node.world_pos += velocity * time_step_scale;
        if speed_sq > 0.000_001 {
            any_motion = true;
        }
    }

    any_motion
}
