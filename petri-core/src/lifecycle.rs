use crate::entity::{can_consume_cell, can_consume_particle, CellPhase};
use crate::genome::split_chromosome;
use crate::grid::EntityRef;
use crate::physics::PhysicsWorld;
use crate::Simulation;
use glam::Vec2;
use petri_types::{CellId, CellState, Channel, Color, ParticleId, ParticleState, SplitEvent};
use rand::Rng;
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Exhaled particles ring a dying cell at this multiple of its radius.
const EXHALE_DISTANCE_FACTOR: f32 = 4.0 / 3.0;
const UNIT_PARTICLE_MASS: f32 = 1.0;

/// Everything the lifecycle phases of one tick resolved.
#[derive(Debug, Default)]
pub(crate) struct LifecycleOutcome {
    pub(crate) consumed_particles: Vec<ParticleId>,
    pub(crate) cells_consumed: u64,
    pub(crate) splits: Vec<SplitEvent>,
    pub(crate) explosions: Vec<CellId>,
    pub(crate) dead_cells: Vec<CellId>,
    pub(crate) spawned_cells: Vec<CellState>,
    pub(crate) spawned_particles: Vec<ParticleState>,
    pub(crate) player_died: bool,
}

impl<P: PhysicsWorld> Simulation<P> {
    /// Consumption, split, death and sweep, in that order. Every scan reads
    /// the grid built at the end of the previous tick; removals are only
    /// recorded until the sweep applies them.
    pub(crate) fn resolve_lifecycle(&mut self) -> LifecycleOutcome {
        let mut outcome = LifecycleOutcome::default();
        self.consume_particles(&mut outcome);
        self.consume_cells(&mut outcome);
        self.split_ready_cells(&mut outcome);
        self.resolve_deaths(&mut outcome);
        self.sweep(&mut outcome);
        outcome
    }

    fn consume_particles(&mut self, outcome: &mut LifecycleOutcome) {
        let mut nearby = Vec::new();
        for cell in self.cells.values_mut() {
            self.grid.query_radius_into(
                cell.position,
                cell.phenotype().detection_radius,
                &mut nearby,
            );
            for entity in &nearby {
                // Particles sort ahead of cells.
                let EntityRef::Particle(particle_id) = *entity else {
                    break;
                };
                if self.consumed.contains(&particle_id) {
                    continue;
                }
                let Some(particle) = self.particles.get(&particle_id) else {
                    continue;
                };
                let radius = cell.radius();
                if particle.position.distance_squared(cell.position) >= radius * radius {
                    continue;
                }
                if !can_consume_particle(cell, particle) {
                    continue;
                }
                cell.absorb(particle.mass, particle.color);
                self.consumed.insert(particle_id);
                outcome.consumed_particles.push(particle_id);
            }
        }
    }

    fn consume_cells(&mut self, outcome: &mut LifecycleOutcome) {
        let mut nearby = Vec::new();
        let mut victims = Vec::new();
        let attackers: Vec<CellId> = self.cells.keys().copied().collect();
        for attacker_id in attackers {
            if self.dead.contains(&attacker_id) {
                continue;
            }
            let Some(attacker) = self.cells.get(&attacker_id) else {
                continue;
            };
            self.grid.query_radius_into(
                attacker.position,
                attacker.phenotype().detection_radius,
                &mut nearby,
            );

            victims.clear();
            for entity in &nearby {
                let EntityRef::Cell(defender_id) = *entity else {
                    continue;
                };
                if defender_id == attacker_id || self.dead.contains(&defender_id) {
                    continue;
                }
                let Some(defender) = self.cells.get(&defender_id) else {
                    continue;
                };
                let contact = attacker.radius() + defender.radius();
                if attacker.position.distance_squared(defender.position) >= contact * contact {
                    continue;
                }
                if can_consume_cell(attacker, defender) {
                    victims.push(defender_id);
                }
            }

            for &victim in &victims {
                if let Some(cell) = self.cells.get_mut(&victim) {
                    cell.mark_dead();
                }
                self.dead.insert(victim);
                outcome.cells_consumed += 1;
            }
        }
    }

    fn split_ready_cells(&mut self, outcome: &mut LifecycleOutcome) {
        let ready: Vec<CellId> = self
            .cells
            .values()
            .filter(|cell| !self.dead.contains(&cell.id) && cell.phase() == CellPhase::Splitting)
            .map(|cell| cell.id)
            .collect();
        for parent_id in ready {
            self.split_cell(parent_id, outcome);
        }
    }

    /// Replaces the parent by up to two mutated children. Whatever mass the
    /// children do not take is released as unit particles inside the
    /// parent's bucket; a deficit is simply absorbed.
    fn split_cell(&mut self, parent_id: CellId, outcome: &mut LifecycleOutcome) {
        let Some(parent) = self.cells.remove(&parent_id) else {
            return;
        };
        self.physics.remove_body(parent.body);

        let (first, second) = split_chromosome(parent.chromosome(), &mut self.rng);
        let first_position = parent.position - Vec2::new(first.phenotype().size, 0.0);
        let second_position = parent.position + Vec2::new(second.phenotype().size, 0.0);
        let mut spawned_mass = first.phenotype().start_mass;

        let mut children = Vec::with_capacity(2);
        children.push(self.spawn_cell(first, first_position, parent.is_player, parent.age));

        let live = self.cells.len().saturating_sub(self.dead.len());
        if live < self.config.population_cap as usize {
            spawned_mass += second.phenotype().start_mass;
            children.push(self.spawn_cell(second, second_position, false, parent.age));
        } else {
            debug!(
                parent = parent_id.0,
                cap = self.config.population_cap,
                "population cap reached, dropping second child"
            );
        }

        let surplus = parent.mass - spawned_mass;
        let surplus_particles = if surplus >= UNIT_PARTICLE_MASS {
            surplus.floor() as u32
        } else {
            0
        };
        let color = Color::pure(parent.dominant_channel());
        for _ in 0..surplus_particles {
            let position = self.random_position_in_bucket(parent.position);
            let id = self.spawn_particle(position, color, UNIT_PARTICLE_MASS);
            outcome.spawned_particles.push(self.particles[&id].state());
        }

        for child in &children {
            outcome.spawned_cells.push(self.cells[child].state());
        }
        outcome.splits.push(SplitEvent {
            parent: parent_id,
            children,
            surplus_particles,
        });
    }

    fn resolve_deaths(&mut self, outcome: &mut LifecycleOutcome) {
        let dying: Vec<CellId> = self
            .cells
            .values()
            .filter(|cell| cell.phase() == CellPhase::Dead)
            .map(|cell| cell.id)
            .collect();
        for &id in &dying {
            if let Some(cell) = self.cells.get_mut(&id) {
                cell.mark_dead();
            }
            self.dead.insert(id);
        }

        // Single pass: cells caught in a blast are not in `dying`, so they
        // never detonate in the tick they die.
        let mut nearby = Vec::new();
        for &id in &dying {
            let Some(position) = self
                .cells
                .get(&id)
                .filter(|cell| cell.phenotype().exploding)
                .map(|cell| cell.position)
            else {
                continue;
            };
            self.grid.query_radius_into(
                position,
                self.config.explosion_bucket_radius,
                &mut nearby,
            );
            for entity in &nearby {
                let EntityRef::Cell(victim) = *entity else {
                    continue;
                };
                if self.dead.contains(&victim) {
                    continue;
                }
                if let Some(cell) = self.cells.get_mut(&victim) {
                    cell.mark_dead();
                    self.dead.insert(victim);
                }
            }
            outcome.explosions.push(id);
        }

        let marked: Vec<CellId> = self.dead.iter().copied().collect();
        for id in marked {
            self.exhale_cell(id, outcome);
        }
    }

    /// Turns a dying cell's mass into a ring of unit particles. Each channel
    /// is drawn weighted by the cell's current pigment, and each pick shifts
    /// that pigment toward the channels it kept.
    fn exhale_cell(&mut self, id: CellId, outcome: &mut LifecycleOutcome) {
        let Some(cell) = self.cells.get(&id) else {
            return;
        };
        let count = cell.mass.max(0.0).floor() as u32;
        let center = cell.position;
        let distance = cell.radius() * EXHALE_DISTANCE_FACTOR;

        for i in 0..count {
            let angle = i as f32 * TAU / count as f32;
            let Some(cell) = self.cells.get_mut(&id) else {
                return;
            };
            let channel = weighted_channel(cell.color, &mut self.rng);
            cell.exhale(channel);
            let position = center + Vec2::from_angle(angle) * distance;
            let particle = self.spawn_particle(position, Color::pure(channel), UNIT_PARTICLE_MASS);
            outcome.spawned_particles.push(self.particles[&particle].state());
        }
    }

    fn sweep(&mut self, outcome: &mut LifecycleOutcome) {
        for id in std::mem::take(&mut self.consumed) {
            if let Some(particle) = self.particles.remove(&id) {
                self.physics.remove_body(particle.body);
            }
        }

        for id in std::mem::take(&mut self.dead) {
            let Some(cell) = self.cells.remove(&id) else {
                continue;
            };
            self.physics.remove_body(cell.body);
            outcome.dead_cells.push(id);
            if self.player == Some(id) {
                self.player = None;
                outcome.player_died = true;
                info!(
                    player = id.0,
                    age = cell.age,
                    mass = cell.mass,
                    "player cell died"
                );
            }
        }
    }
}

/// Draws a channel with probability proportional to its intensity in
/// `color`. A black (or non-finite) color falls back to a uniform pick.
pub(crate) fn weighted_channel<R: Rng + ?Sized>(color: Color, rng: &mut R) -> Channel {
    let weight = |channel| color.channel(channel).max(0.0);
    let total: f32 = Channel::ALL.into_iter().map(weight).sum();
    if !total.is_finite() || total <= 0.0 {
        return Channel::ALL[rng.random_range(0..Channel::ALL.len())];
    }
    let mut roll = rng.random::<f32>() * total;
    for channel in Channel::ALL {
        let w = weight(channel);
        if roll < w {
            return channel;
        }
        roll -= w;
    }
    // Rounding can leave the roll just past the last bucket.
    Channel::ALL
        .into_iter()
        .rev()
        .find(|&channel| weight(channel) > 0.0)
        .unwrap_or(Channel::Blue)
}
