use crate::entity::{Cell, Particle};
use glam::Vec2;

/// Score multiplier for particles of the cell's own dominant channel.
pub const SAME_CHANNEL_DISCOUNT: f32 = 0.5;
const MIN_DISTANCE: f32 = 1e-6;

/// One neighbor as the agent sees it.
#[derive(Debug, Clone, Copy)]
pub enum Nearby<'a> {
    Particle(&'a Particle),
    Cell(&'a Cell),
}

/// Desired velocity for a non-player cell. Reads only; the caller decides
/// when to apply the result.
///
/// The nearest acceptable particle (own channel counts at half distance) is
/// the target, with ties going to whichever came first in `nearby`. Every
/// other cell within `social_cutoff_factor` sizes pulls or pushes with an
/// inverse-square weight taken from the behavior map. With no target the
/// cell keeps its current heading.
pub fn decide<'a>(
    cell: &Cell,
    nearby: impl IntoIterator<Item = Nearby<'a>>,
    social_cutoff_factor: f32,
) -> Vec2 {
    let cutoff = social_cutoff_factor * cell.phenotype().size;
    let mut target: Option<(f32, Vec2)> = None;
    let mut social = Vec2::ZERO;

    for entity in nearby {
        match entity {
            Nearby::Particle(particle) => {
                let Some(score) = particle_score(cell, particle) else {
                    continue;
                };
                match target {
                    Some((best, _)) if score >= best => {}
                    _ => target = Some((score, particle.position)),
                }
            }
            Nearby::Cell(other) => {
                if other.id == cell.id {
                    continue;
                }
                social += social_force(cell, other, cutoff);
            }
        }
    }

    let heading = match target {
        Some((_, position)) => position - cell.position,
        None => cell.velocity,
    };
    let direction = heading + social;
    if direction.length_squared() <= MIN_DISTANCE * MIN_DISTANCE {
        return Vec2::ZERO;
    }
    direction.normalize() * cell.phenotype().speed
}

/// `None` when the cell may not eat the particle's channel.
pub fn particle_score(cell: &Cell, particle: &Particle) -> Option<f32> {
    let distance = cell.position.distance(particle.position);
    let channel = particle.dominant_channel();
    if channel == cell.dominant_channel() {
        Some(distance * SAME_CHANNEL_DISCOUNT)
    } else if cell.phenotype().p_consumption.at(channel) {
        Some(distance)
    } else {
        None
    }
}

pub fn social_force(cell: &Cell, other: &Cell, cutoff: f32) -> Vec2 {
    let offset = other.position - cell.position;
    let distance = offset.length();
    if distance <= MIN_DISTANCE || distance > cutoff {
        return Vec2::ZERO;
    }
    let weight = cell.phenotype().behavior.at(other.dominant_channel());
    offset / distance * weight / (distance * distance)
}
