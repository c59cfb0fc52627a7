use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use petri_types::{
    CellId, CellState, Color, DrawItem, DrawKind, MetricsSnapshot, ParticleId, ParticleState,
    TickDelta, WorldConfig, WorldSnapshot,
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub mod ai;
pub mod entity;
pub mod genome;
pub mod grid;
mod lifecycle;
pub mod physics;
mod spawn;
mod turn;

#[cfg(test)]
mod tests;

use entity::{Cell, Particle};
use genome::{validate_genome, Chromosome, ChromosomeError, GenomeError};
use grid::SpatialGrid;
use physics::{KinematicPhysics, PhysicsWorld};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid world config: {0}")]
    InvalidConfig(String),
    #[error("invalid seed genome: {0}")]
    Genome(#[from] GenomeError),
    #[error(transparent)]
    Chromosome(#[from] ChromosomeError),
}

/// The whole simulated world. Owns every entity; the physics backend only
/// holds bodies addressed by handle.
#[derive(Debug, Clone)]
pub struct Simulation<P = KinematicPhysics> {
    config: WorldConfig,
    tick: u64,
    seed: u64,
    rng: ChaCha8Rng,
    seed_chromosome: Chromosome,
    next_cell_id: u64,
    next_particle_id: u64,
    cells: BTreeMap<CellId, Cell>,
    particles: BTreeMap<ParticleId, Particle>,
    grid: SpatialGrid,
    physics: P,
    player: Option<CellId>,
    // Removal intents gathered during a tick and applied by the sweep.
    consumed: BTreeSet<ParticleId>,
    dead: BTreeSet<CellId>,
    metrics: MetricsSnapshot,
}

impl Simulation<KinematicPhysics> {
    pub fn new(config: WorldConfig, seed: u64) -> Result<Self, SimError> {
        let physics = KinematicPhysics::new(config.world_width, config.world_height);
        Self::with_physics(config, seed, physics)
    }
}

impl<P: PhysicsWorld> Simulation<P> {
    pub fn with_physics(config: WorldConfig, seed: u64, physics: P) -> Result<Self, SimError> {
        validate_world_config(&config)?;
        let seed_chromosome = Chromosome::single(config.seed_genome.clone())?;

        let grid = SpatialGrid::for_world(&config);
        let mut sim = Self {
            config,
            tick: 0,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed_chromosome,
            next_cell_id: 0,
            next_particle_id: 0,
            cells: BTreeMap::new(),
            particles: BTreeMap::new(),
            grid,
            physics,
            player: None,
            consumed: BTreeSet::new(),
            dead: BTreeSet::new(),
            metrics: MetricsSnapshot::default(),
        };

        sim.seed_world();
        sim.refresh_population_metrics();
        Ok(sim)
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn metrics(&self) -> &MetricsSnapshot {
        &self.metrics
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.values()
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(&id)
    }

    pub fn player_id(&self) -> Option<CellId> {
        self.player
    }

    /// The player's cell while it is alive.
    pub fn player(&self) -> Option<&Cell> {
        self.player.and_then(|id| self.cells.get(&id))
    }

    /// Points the player along `direction` at its phenotype speed. A zero
    /// direction stops it; does nothing once the player is dead.
    pub fn steer_player(&mut self, direction: Vec2) {
        let Some(cell) = self.player.and_then(|id| self.cells.get_mut(&id)) else {
            return;
        };
        let velocity = direction.normalize_or_zero() * cell.phenotype().speed;
        cell.velocity = velocity;
        self.physics.set_velocity(cell.body, velocity);
    }

    /// Places a new cell in the world. `chromosome` is valid by construction,
    /// so the cell is too.
    pub fn add_cell(&mut self, chromosome: Chromosome, position: Vec2, is_player: bool) -> CellId {
        self.spawn_cell(chromosome, position, is_player, 0.0)
    }

    /// Places a free particle. Particles always carry at least one unit of
    /// mass; anything lighter (or NaN) is rejected.
    pub fn add_particle(
        &mut self,
        position: Vec2,
        color: Color,
        mass: f32,
    ) -> Result<ParticleId, SimError> {
        check_particle_mass("particle mass", mass)?;
        Ok(self.spawn_particle(position, color, mass))
    }

    pub fn reset(&mut self, seed: Option<u64>) {
        self.seed = seed.unwrap_or(self.seed);
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.tick = 0;
        for cell in self.cells.values() {
            self.physics.remove_body(cell.body);
        }
        for particle in self.particles.values() {
            self.physics.remove_body(particle.body);
        }
        self.next_cell_id = 0;
        self.next_particle_id = 0;
        self.cells.clear();
        self.particles.clear();
        self.grid.clear();
        self.player = None;
        self.consumed.clear();
        self.dead.clear();
        self.metrics = MetricsSnapshot::default();
        self.seed_world();
        self.refresh_population_metrics();
    }

    pub fn step_n(&mut self, count: u32) -> Vec<TickDelta> {
        let mut deltas = Vec::with_capacity(count as usize);
        for _ in 0..count {
            deltas.push(self.tick());
        }
        deltas
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            rng_seed: self.seed,
            config: self.config.clone(),
            cells: self.cells.values().map(Cell::state).collect::<Vec<CellState>>(),
            particles: self
                .particles
                .values()
                .map(Particle::state)
                .collect::<Vec<ParticleState>>(),
            metrics: self.metrics.clone(),
        }
    }

    /// One draw tuple per live entity, particles first so cells paint over
    /// them. Colors are unmasked; apply `petri_types::perceive` per viewer.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let particles = self.particles.values().map(|particle| DrawItem {
            kind: DrawKind::Particle,
            position: particle.position,
            radius: particle.radius,
            color: particle.color,
        });
        let cells = self.cells.values().map(|cell| DrawItem {
            kind: DrawKind::Cell,
            position: cell.position,
            radius: cell.radius(),
            color: cell.color,
        });
        particles.chain(cells).collect()
    }

    pub(crate) fn refresh_population_metrics(&mut self) {
        self.metrics.ticks = self.tick;
        self.metrics.cells = self.cells.len() as u32;
        self.metrics.particles = self.particles.len() as u32;
    }

    fn debug_assert_consistent_state(&self) {
        if cfg!(debug_assertions) {
            debug_assert!(self.consumed.is_empty(), "consumed set must be swept");
            debug_assert!(self.dead.is_empty(), "dead set must be swept");
            debug_assert_eq!(
                self.grid.len(),
                self.cells.len() + self.particles.len(),
                "every live entity must occupy exactly one bucket",
            );
            for cell in self.cells.values() {
                debug_assert!(!cell.dead, "dead cell {:?} survived the sweep", cell.id);
                debug_assert!(
                    self.physics.read_position(cell.body).is_some(),
                    "cell {:?} lost its physics body",
                    cell.id,
                );
            }
            if let Some(player) = self.player {
                debug_assert!(self.cells.contains_key(&player), "player id must be live");
            }
        }
    }
}

pub fn validate_world_config(config: &WorldConfig) -> Result<(), SimError> {
    for (field, value) in [
        ("world_width", config.world_width),
        ("world_height", config.world_height),
        ("bucket_size", config.bucket_size),
        ("dt", config.dt),
        ("particle_radius", config.particle_radius),
        ("player_max_age", config.player_max_age),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "{field} must be positive and finite"
            )));
        }
    }
    if config.population_cap == 0 {
        return Err(SimError::InvalidConfig(
            "population_cap must be greater than zero".to_owned(),
        ));
    }
    check_particle_mass("particle_mass", config.particle_mass)?;
    if !config.social_cutoff_factor.is_finite() || config.social_cutoff_factor < 0.0 {
        return Err(SimError::InvalidConfig(
            "social_cutoff_factor must be finite and non-negative".to_owned(),
        ));
    }
    validate_genome(&config.seed_genome)?;
    Ok(())
}

fn check_particle_mass(field: &str, mass: f32) -> Result<(), SimError> {
    if !(mass >= 1.0) || !mass.is_finite() {
        return Err(SimError::InvalidConfig(format!(
            "{field} must be finite and at least 1, got {mass}"
        )));
    }
    Ok(())
}
