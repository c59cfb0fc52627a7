use crate::ai::{decide, Nearby};
use crate::grid::EntityRef;
use crate::physics::PhysicsWorld;
use crate::Simulation;
use glam::Vec2;
use petri_types::{CellId, TickDelta};
use rayon::prelude::*;
use tracing::debug;

impl<P: PhysicsWorld> Simulation<P> {
    /// Advances the world by one `dt`: sync from physics, age, lifecycle,
    /// grid rebuild, agent decisions, then the physics step.
    pub fn tick(&mut self) -> TickDelta {
        self.sync_from_physics();
        self.age_cells();

        let outcome = self.resolve_lifecycle();
        self.rebuild_grid();

        let decisions = self.decide_velocities();
        self.apply_velocities(&decisions);
        self.physics.step(self.config.dt);
        // Keep mirrored positions current for snapshots taken between ticks.
        self.sync_from_physics();

        self.tick = self.tick.saturating_add(1);
        self.metrics.particles_consumed_last_tick = outcome.consumed_particles.len() as u64;
        self.metrics.cells_consumed_last_tick = outcome.cells_consumed;
        self.metrics.splits_last_tick = outcome.splits.len() as u64;
        self.metrics.deaths_last_tick = outcome.dead_cells.len() as u64;
        self.metrics.explosions_last_tick = outcome.explosions.len() as u64;
        self.metrics.total_particles_consumed += outcome.consumed_particles.len() as u64;
        self.metrics.total_splits += outcome.splits.len() as u64;
        self.metrics.total_deaths += outcome.dead_cells.len() as u64;
        self.refresh_population_metrics();

        self.debug_assert_consistent_state();

        debug!(
            tick = self.tick,
            cells = self.metrics.cells,
            particles = self.metrics.particles,
            consumed = outcome.consumed_particles.len(),
            splits = outcome.splits.len(),
            deaths = outcome.dead_cells.len(),
            "tick resolved"
        );

        TickDelta {
            tick: self.tick,
            consumed_particles: outcome.consumed_particles,
            dead_cells: outcome.dead_cells,
            splits: outcome.splits,
            explosions: outcome.explosions,
            spawned_cells: outcome.spawned_cells,
            spawned_particles: outcome.spawned_particles,
            player_died: outcome.player_died,
            metrics: self.metrics.clone(),
        }
    }

    fn sync_from_physics(&mut self) {
        for cell in self.cells.values_mut() {
            if let Some(position) = self.physics.read_position(cell.body) {
                cell.position = position;
            }
            if let Some(velocity) = self.physics.velocity(cell.body) {
                cell.velocity = velocity;
            }
        }
        for particle in self.particles.values_mut() {
            if let Some(position) = self.physics.read_position(particle.body) {
                particle.position = position;
            }
        }
    }

    fn age_cells(&mut self) {
        let dt = self.config.dt;
        for cell in self.cells.values_mut() {
            cell.age += dt;
        }
    }

    pub(crate) fn rebuild_grid(&mut self) {
        self.grid.rebuild(
            self.particles
                .values()
                .map(|particle| (particle.id, particle.position)),
            self.cells.values().map(|cell| (cell.id, cell.position)),
        );
    }

    /// Runs every non-player cell's decision in parallel against the freshly
    /// rebuilt grid. Nothing is written until all decisions are in.
    fn decide_velocities(&self) -> Vec<(CellId, Vec2)> {
        let cells = &self.cells;
        let particles = &self.particles;
        let grid = &self.grid;
        let cutoff = self.config.social_cutoff_factor;

        let agents: Vec<CellId> = cells
            .values()
            .filter(|cell| !cell.is_player)
            .map(|cell| cell.id)
            .collect();

        agents
            .par_iter()
            .map_init(Vec::new, |scratch, id| {
                let cell = &cells[id];
                grid.query_radius_into(cell.position, cell.phenotype().detection_radius, scratch);
                let nearby = scratch.iter().filter_map(|entity| match *entity {
                    EntityRef::Particle(particle_id) => {
                        particles.get(&particle_id).map(Nearby::Particle)
                    }
                    EntityRef::Cell(cell_id) => cells.get(&cell_id).map(Nearby::Cell),
                });
                (*id, decide(cell, nearby, cutoff))
            })
            .collect()
    }

    fn apply_velocities(&mut self, decisions: &[(CellId, Vec2)]) {
        for &(id, velocity) in decisions {
            if let Some(cell) = self.cells.get_mut(&id) {
                cell.velocity = velocity;
                self.physics.set_velocity(cell.body, velocity);
            }
        }
    }
}
