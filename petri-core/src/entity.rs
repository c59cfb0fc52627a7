use crate::genome::Chromosome;
use crate::physics::BodyHandle;
use glam::Vec2;
use petri_types::{
    CellId, CellState, Channel, Color, Genome, Membrane, ParticleId, ParticleState,
};

/// Attacker mass must exceed the defender's by this factor to eat it.
pub const CELL_CONSUMPTION_RATIO: f32 = 4.0 / 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub(crate) id: ParticleId,
    pub(crate) body: BodyHandle,
    pub(crate) position: Vec2,
    pub(crate) mass: f32,
    pub(crate) radius: f32,
    pub(crate) color: Color,
}

impl Particle {
    pub fn id(&self) -> ParticleId {
        self.id
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn dominant_channel(&self) -> Channel {
        self.color.dominant_channel()
    }

    pub fn state(&self) -> ParticleState {
        ParticleState {
            id: self.id,
            position: self.position,
            mass: self.mass,
            radius: self.radius,
            color: self.color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellPhase {
    Growing,
    Splitting,
    Dead,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub(crate) id: CellId,
    pub(crate) body: BodyHandle,
    chromosome: Chromosome,
    pub(crate) age: f32,
    pub(crate) max_age: f32,
    pub(crate) mass: f32,
    pub(crate) color: Color,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) is_player: bool,
    pub(crate) dead: bool,
}

impl Cell {
    /// A newborn cell at its phenotype's start mass and color. `max_age`
    /// is the lifespan this particular cell gets.
    pub(crate) fn new(
        id: CellId,
        body: BodyHandle,
        chromosome: Chromosome,
        position: Vec2,
        is_player: bool,
        max_age: f32,
    ) -> Self {
        let phenotype = chromosome.phenotype();
        let mass = phenotype.start_mass;
        let color = phenotype.color;
        Self {
            id,
            body,
            chromosome,
            age: 0.0,
            max_age,
            mass,
            color,
            position,
            velocity: Vec2::ZERO,
            is_player,
            dead: false,
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    pub fn phenotype(&self) -> &Genome {
        self.chromosome.phenotype()
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn max_age(&self) -> f32 {
        self.max_age
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_player(&self) -> bool {
        self.is_player
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn dominant_channel(&self) -> Channel {
        self.phenotype().dominant_channel()
    }

    /// Grows by one unit for every two units of mass gained since birth.
    pub fn radius(&self) -> f32 {
        let size = self.phenotype().size;
        let grown = (self.mass - self.phenotype().start_mass) / 2.0;
        (size + grown).max(size / 2.0)
    }

    pub fn phase(&self) -> CellPhase {
        if self.dead || self.age >= self.max_age {
            CellPhase::Dead
        } else if self.mass >= self.phenotype().max_mass {
            CellPhase::Splitting
        } else {
            CellPhase::Growing
        }
    }

    pub(crate) fn mark_dead(&mut self) {
        self.age = self.age.max(self.max_age);
        self.dead = true;
    }

    /// Takes in `mass` of material with the given color.
    pub(crate) fn absorb(&mut self, mass: f32, color: Color) {
        self.color = blend_color(self.color, self.mass, color, mass);
        self.mass += mass;
    }

    /// Shifts the residual pigment while the dying cell releases a particle
    /// of `channel`: the cell keeps the other two channels.
    pub(crate) fn exhale(&mut self, channel: Channel) {
        self.color = blend_color(self.color, self.mass, Color::complement(channel), 1.0);
    }

    pub fn state(&self) -> CellState {
        CellState {
            id: self.id,
            position: self.position,
            velocity: self.velocity,
            mass: self.mass,
            radius: self.radius(),
            age: self.age,
            max_age: self.max_age,
            color: self.color,
            is_player: self.is_player,
            active_gene: self.chromosome.active_gene(),
            chromosome_len: self.chromosome.len(),
            phenotype: self.phenotype().clone(),
        }
    }
}

/// Mass-weighted average of two colors, rescaled so the brightest channel
/// is 255. Degenerate inputs leave `current` unchanged.
pub fn blend_color(current: Color, current_mass: f32, added: Color, added_mass: f32) -> Color {
    let total = current_mass + added_mass;
    if total.is_nan() || total <= 0.0 {
        return current;
    }
    let mix = |a: f32, b: f32| (a * current_mass + b * added_mass) / total;
    let blended = Color::new(
        mix(current.r, added.r),
        mix(current.g, added.g),
        mix(current.b, added.b),
    );
    let brightest = blended.brightest();
    if brightest.is_nan() || brightest <= 0.0 {
        return current;
    }
    let scale = Color::MAX / brightest;
    Color::new(
        (blended.r * scale).max(0.0),
        (blended.g * scale).max(0.0),
        (blended.b * scale).max(0.0),
    )
}

/// Mass ratio, membrane and color permission. Contact is checked by the
/// caller.
pub fn can_consume_cell(attacker: &Cell, defender: &Cell) -> bool {
    attacker.mass > defender.mass * CELL_CONSUMPTION_RATIO
        && defender.phenotype().membrane == Membrane::Unarmored
        && attacker
            .phenotype()
            .c_consumption
            .at(defender.dominant_channel())
}

pub fn can_consume_particle(cell: &Cell, particle: &Particle) -> bool {
    cell.phenotype()
        .p_consumption
        .at(particle.dominant_channel())
}
