use super::*;

pub(super) const WHITE: Color = Color::new(255.0, 255.0, 255.0);

pub(super) fn test_genome() -> Genome {
    Genome {
        size: 10.0,
        start_mass: 20.0,
        max_mass: 40.0,
        membrane: Membrane::Unarmored,
        strength: 1.0,
        speed: 60.0,
        detection_radius: 1,
        max_age: 20.0,
        charge: 0.0,
        mutation_rate: 0.0,
        exploding: false,
        perception: ChannelMap::splat(true),
        behavior: ChannelMap::splat(0.0),
        p_consumption: ChannelMap::splat(true),
        c_consumption: ChannelMap::splat(true),
        color: WHITE,
    }
}

pub(super) fn colored_genome(color: Color) -> Genome {
    Genome {
        color,
        ..test_genome()
    }
}

/// 4x3 buckets of 100 units, nothing seeded.
pub(super) fn test_config() -> WorldConfig {
    WorldConfig {
        world_width: 400.0,
        world_height: 300.0,
        bucket_size: 100.0,
        dt: 1.0 / 60.0,
        initial_particles: 0,
        particle_mass: 1.0,
        particle_radius: 1.0,
        initial_cells: 0,
        spawn_player: false,
        player_max_age: 100.0,
        population_cap: 100,
        explosion_bucket_radius: 1,
        social_cutoff_factor: 10.0,
        seed_genome: test_genome(),
    }
}

pub(super) fn empty_world() -> Simulation {
    Simulation::new(test_config(), 7).expect("test config should be valid")
}

pub(super) fn place_cell(sim: &mut Simulation, genome: Genome, position: Vec2) -> CellId {
    let chromosome = Chromosome::single(genome).expect("test genome should be valid");
    sim.add_cell(chromosome, position, false)
}

pub(super) fn place_particle(sim: &mut Simulation, position: Vec2, channel: Channel) -> ParticleId {
    sim.add_particle(position, Color::pure(channel), 1.0)
        .expect("unit particle should be accepted")
}

pub(super) fn set_mass(sim: &mut Simulation, id: CellId, mass: f32) {
    sim.cells.get_mut(&id).expect("cell should be live").mass = mass;
}

pub(super) fn set_age(sim: &mut Simulation, id: CellId, age: f32) {
    sim.cells.get_mut(&id).expect("cell should be live").age = age;
}

/// A cell outside any simulation, for exercising pure rules directly.
pub(super) fn detached_cell(id: u64, genome: Genome, position: Vec2, mass: f32) -> Cell {
    let max_age = genome.max_age;
    let chromosome = Chromosome::single(genome).expect("test genome should be valid");
    let mut cell = Cell::new(
        CellId(id),
        BodyHandle(id),
        chromosome,
        position,
        false,
        max_age,
    );
    cell.mass = mass;
    cell
}

pub(super) fn detached_particle(id: u64, position: Vec2, channel: Channel) -> Particle {
    Particle {
        id: ParticleId(id),
        body: BodyHandle(id),
        position,
        mass: 1.0,
        radius: 1.0,
        color: Color::pure(channel),
    }
}

pub(super) fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

pub(super) fn assert_vec_close(actual: Vec2, expected: Vec2) {
    assert!(
        actual.abs_diff_eq(expected, 1e-3),
        "expected {expected:?}, got {actual:?}"
    );
}

pub(super) fn snapshot_json(sim: &Simulation) -> String {
    serde_json::to_string(&sim.snapshot()).expect("serialize snapshot")
}
