use crate::entity::{Cell, Particle};
use crate::genome::Chromosome;
use crate::grid::EntityRef;
use crate::physics::PhysicsWorld;
use crate::Simulation;
use glam::Vec2;
use petri_types::{CellId, Channel, Color, ParticleId};
use rand::Rng;
use tracing::info;

// Seeded particle colors split red/green/blue 33/34/33 on a 1..=100 roll.
const RED_PARTICLE_ROLL_MAX: u32 = 33;
const GREEN_PARTICLE_ROLL_MAX: u32 = 67;

impl<P: PhysicsWorld> Simulation<P> {
    pub(crate) fn seed_world(&mut self) {
        if self.config.spawn_player {
            let center = self.config.center();
            self.spawn_cell(self.seed_chromosome.clone(), center, true, 0.0);
        }

        for _ in 0..self.config.initial_cells {
            let channel = Channel::ALL[self.rng.random_range(0..Channel::ALL.len())];
            let chromosome = self
                .seed_chromosome
                .with_phenotype_color(Color::pure(channel));
            let position = self.random_position();
            self.spawn_cell(chromosome, position, false, 0.0);
        }

        let particle_mass = self.config.particle_mass;
        for _ in 0..self.config.initial_particles {
            let position = self.random_position();
            let color = Color::pure(seed_particle_channel(&mut self.rng));
            self.spawn_particle(position, color, particle_mass);
        }

        info!(
            seed = self.seed,
            cells = self.cells.len(),
            particles = self.particles.len(),
            "seeded world"
        );
    }

    /// Creates the physics body, registers the cell and drops it into the
    /// grid right away so later phases of the same tick can see it.
    pub(crate) fn spawn_cell(
        &mut self,
        chromosome: Chromosome,
        position: Vec2,
        is_player: bool,
        age: f32,
    ) -> CellId {
        let id = self.alloc_cell_id();
        let phenotype = chromosome.phenotype();
        let max_age = if is_player {
            self.config.player_max_age
        } else {
            phenotype.max_age
        };
        let body = self
            .physics
            .spawn_body(phenotype.start_mass, phenotype.size, position);

        let mut cell = Cell::new(id, body, chromosome, position, is_player, max_age);
        cell.age = age;
        self.grid.insert(EntityRef::Cell(id), position);
        self.cells.insert(id, cell);
        if is_player {
            self.player = Some(id);
        }
        id
    }

    pub(crate) fn spawn_particle(&mut self, position: Vec2, color: Color, mass: f32) -> ParticleId {
        let id = self.alloc_particle_id();
        let radius = self.config.particle_radius;
        let body = self.physics.spawn_body(mass, radius, position);
        self.grid.insert(EntityRef::Particle(id), position);
        self.particles.insert(
            id,
            Particle {
                id,
                body,
                position,
                mass,
                radius,
                color,
            },
        );
        id
    }

    fn random_position(&mut self) -> Vec2 {
        Vec2::new(
            self.rng.random::<f32>() * self.config.world_width,
            self.rng.random::<f32>() * self.config.world_height,
        )
    }

    /// Uniform point inside the bucket containing `position`, trimmed to the
    /// world rectangle.
    pub(crate) fn random_position_in_bucket(&mut self, position: Vec2) -> Vec2 {
        let (ix, iy) = self.grid.bucket_of(position);
        let size = self.grid.bucket_size();
        let min = Vec2::new(ix as f32 * size, iy as f32 * size);
        let max = Vec2::new(
            (min.x + size).min(self.config.world_width),
            (min.y + size).min(self.config.world_height),
        );
        let extent = (max - min).max(Vec2::ZERO);
        min + Vec2::new(
            self.rng.random::<f32>() * extent.x,
            self.rng.random::<f32>() * extent.y,
        )
    }

    fn alloc_cell_id(&mut self) -> CellId {
        let id = CellId(self.next_cell_id);
        self.next_cell_id += 1;
        id
    }

    fn alloc_particle_id(&mut self) -> ParticleId {
        let id = ParticleId(self.next_particle_id);
        self.next_particle_id += 1;
        id
    }
}

fn seed_particle_channel<R: Rng + ?Sized>(rng: &mut R) -> Channel {
    match rng.random_range(1..=100u32) {
        roll if roll <= RED_PARTICLE_ROLL_MAX => Channel::Red,
        roll if roll <= GREEN_PARTICLE_ROLL_MAX => Channel::Green,
        _ => Channel::Blue,
    }
}
