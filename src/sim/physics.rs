use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::trace;

use super::SimState;
use crate::config::PhysicsConfig;
use crate::graph::{Edge, EdgeOutcome};

fn rest_length(edge: &Edge, config: &PhysicsConfig) -> f32 {
    config.rest_length
        + match edge.outcome {
            EdgeOutcome::Blocked => config.blocked_rest_bonus,
            EdgeOutcome::Escalated => config.escalated_rest_bonus,
            EdgeOutcome::Ok | EdgeOutcome::Error => 0.0,
        }
}

fn separation_direction(delta: Vec2, distance_sq: f32, i: usize, j: usize) -> Vec2 {
    if distance_sq > 1e-8 {
        delta / distance_sq.sqrt()
    } else {
        let angle = ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    }
}

/// Advances the simulation by `dt` nominal frames. Fixed nodes and the dragged
/// node are never moved. Returns whether any node is still in motion.
pub fn step(state: &mut SimState, edges: &[Edge], config: &PhysicsConfig, dt: f32) -> bool {
    let node_count = state.nodes.len();
    if node_count == 0 || dt <= 0.0 {
        return false;
    }

    let bounds = state.bounds;
    let dragged = state.dragged.clone();
    let mut ids = Vec::with_capacity(node_count);
    let mut centers = Vec::with_capacity(node_count);
    let mut movable = Vec::with_capacity(node_count);
    for (id, node) in &state.nodes {
        ids.push(id.clone());
        centers.push(node.center());
        movable.push(!node.fixed && dragged.as_deref() != Some(id.as_str()));
    }
    let index_by_id = ids
        .iter()
        .enumerate()
        .map(|(index, id)| (id.as_str(), index))
        .collect::<HashMap<_, _>>();

    let mut forces = vec![Vec2::ZERO; node_count];
    let repulsion_strength = config.repulsion_k * config.repulsion_k;

    for i in 0..node_count {
        for j in (i + 1)..node_count {
            if !movable[i] && !movable[j] {
                continue;
            }

            let delta = centers[i] - centers[j];
            let distance_sq = delta.length_sq();
            let direction = separation_direction(delta, distance_sq, i, j);
            let push = direction * (repulsion_strength / distance_sq.max(config.min_dist_sq));

            if movable[i] {
                forces[i] += push;
            }
            if movable[j] {
                forces[j] -= push;
            }
        }
    }

    let center = bounds.center();
    for (index, force) in forces.iter_mut().enumerate() {
        if movable[index] {
            *force -= (centers[index] - center) * config.center_strength;
        }
    }

    for edge in edges {
        let (Some(&from), Some(&to)) = (
            index_by_id.get(edge.from.as_str()),
            index_by_id.get(edge.to.as_str()),
        ) else {
            trace!(edge = %edge.id, "skipping edge with a missing endpoint");
            continue;
        };
        if from == to || (!movable[from] && !movable[to]) {
            continue;
        }

        let delta = centers[to] - centers[from];
        let distance = delta.length();
        if distance <= 1e-4 {
            continue;
        }
        let direction = delta / distance;
        let pull = direction * (config.spring_k * (distance - rest_length(edge, config)));

        if movable[from] {
            forces[from] += pull;
        }
        if movable[to] {
            forces[to] -= pull;
        }
    }

    let max_speed_sq = config.max_speed * config.max_speed;
    let min_sleep_speed_sq = 0.01 * 0.01;
    let min_sleep_force_sq = 0.02 * 0.02;
    let mut any_motion = false;
    for (index, id) in ids.iter().enumerate() {
        let Some(node) = state.nodes.get_mut(id) else {
            continue;
        };
        if !movable[index] {
            node.vel = Vec2::ZERO;
            continue;
        }

        let force = forces[index];
        let mut velocity = (node.vel + force / node.mass * dt) * config.damping;
        let mut speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= config.max_speed / speed_sq.sqrt();
            speed_sq = max_speed_sq;
        }
        if speed_sq < min_sleep_speed_sq && force.length_sq() < min_sleep_force_sq {
            velocity = Vec2::ZERO;
            speed_sq = 0.0;
        }

        let unclamped = node.pos + velocity * dt;
        let clamped = bounds.clamp(unclamped, node.size);
        if clamped.x != unclamped.x {
            velocity.x = 0.0;
        }
        if clamped.y != unclamped.y {
            velocity.y = 0.0;
        }

        node.pos = clamped;
        node.vel = velocity;
        if speed_sq > 1e-6 {
            any_motion = true;
        }
    }

    any_motion
}
