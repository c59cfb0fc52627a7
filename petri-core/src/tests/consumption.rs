use super::support::*;
use super::*;

#[test]
fn cell_consumption_requires_four_thirds_mass_ratio() {
    let attacker = detached_cell(0, test_genome(), Vec2::ZERO, 10.0);
    let light = detached_cell(1, test_genome(), Vec2::ZERO, 7.0);
    let heavy = detached_cell(2, test_genome(), Vec2::ZERO, 8.0);

    assert!(can_consume_cell(&attacker, &light), "10 > 7 * 4/3");
    assert!(!can_consume_cell(&attacker, &heavy), "10 < 8 * 4/3");
}

#[test]
fn armored_defender_is_never_consumed() {
    let attacker = detached_cell(0, test_genome(), Vec2::ZERO, 10.0);
    let armored = detached_cell(
        1,
        Genome {
            membrane: Membrane::Armored,
            ..test_genome()
        },
        Vec2::ZERO,
        5.0,
    );
    assert!(!can_consume_cell(&attacker, &armored));
}

#[test]
fn cell_consumption_respects_channel_permission() {
    let mut picky = test_genome();
    picky.c_consumption.green = false;
    let attacker = detached_cell(0, picky, Vec2::ZERO, 30.0);
    let green = detached_cell(
        1,
        colored_genome(Color::pure(Channel::Green)),
        Vec2::ZERO,
        5.0,
    );
    let blue = detached_cell(
        2,
        colored_genome(Color::pure(Channel::Blue)),
        Vec2::ZERO,
        5.0,
    );
    assert!(!can_consume_cell(&attacker, &green));
    assert!(can_consume_cell(&attacker, &blue));
}

#[test]
fn particle_inside_radius_is_absorbed_with_color_blend() {
    let mut sim = empty_world();
    let cell = place_cell(&mut sim, test_genome(), Vec2::new(150.0, 150.0));
    let particle = place_particle(&mut sim, Vec2::new(153.0, 150.0), Channel::Green);

    let delta = sim.tick();

    assert_eq!(delta.consumed_particles, vec![particle]);
    assert!(sim.particle(particle).is_none());
    let cell = sim.cell(cell).expect("cell should survive");
    assert_close(cell.mass(), 21.0);
    assert_close(cell.color().r, 255.0 * 20.0 / 21.0);
    assert_close(cell.color().g, 255.0);
    assert_close(cell.color().b, 255.0 * 20.0 / 21.0);
    assert_eq!(sim.metrics().particles_consumed_last_tick, 1);
}

#[test]
fn particle_outside_radius_is_left_alone() {
    let mut sim = empty_world();
    let cell = place_cell(&mut sim, test_genome(), Vec2::new(150.0, 150.0));
    let particle = place_particle(&mut sim, Vec2::new(160.0, 150.0), Channel::Red);

    let delta = sim.tick();

    assert!(delta.consumed_particles.is_empty());
    assert!(sim.particle(particle).is_some());
    assert_close(sim.cell(cell).expect("live cell").mass(), 20.0);
}

#[test]
fn forbidden_particle_channel_is_not_eaten() {
    let mut sim = empty_world();
    let mut genome = test_genome();
    genome.p_consumption.green = false;
    let cell = place_cell(&mut sim, genome, Vec2::new(150.0, 150.0));
    let green = place_particle(&mut sim, Vec2::new(152.0, 150.0), Channel::Green);
    let blue = place_particle(&mut sim, Vec2::new(148.0, 150.0), Channel::Blue);

    let delta = sim.tick();

    assert_eq!(delta.consumed_particles, vec![blue]);
    assert!(sim.particle(green).is_some());
    assert!(!can_consume_particle(
        sim.cell(cell).expect("live cell"),
        sim.particle(green).expect("live particle"),
    ));
}

#[test]
fn overlapping_cells_consume_each_particle_once_lowest_id_first() {
    let mut sim = empty_world();
    let first = place_cell(&mut sim, test_genome(), Vec2::new(150.0, 150.0));
    let second = place_cell(&mut sim, test_genome(), Vec2::new(152.0, 150.0));
    let particle = place_particle(&mut sim, Vec2::new(151.0, 150.0), Channel::Red);

    let delta = sim.tick();

    assert_eq!(delta.consumed_particles, vec![particle]);
    assert_close(sim.cell(first).expect("live cell").mass(), 21.0);
    assert_close(sim.cell(second).expect("live cell").mass(), 20.0);
}

#[test]
fn heavier_cell_consumes_touching_neighbor() {
    let mut sim = empty_world();
    let attacker = place_cell(&mut sim, test_genome(), Vec2::new(150.0, 150.0));
    let defender = place_cell(&mut sim, test_genome(), Vec2::new(155.0, 150.0));
    set_mass(&mut sim, attacker, 30.0);

    let delta = sim.tick();

    assert_eq!(delta.dead_cells, vec![defender]);
    assert_eq!(delta.metrics.cells_consumed_last_tick, 1);
    assert!(sim.cell(defender).is_none());
    assert!(sim.cell(attacker).is_some());
    // The victim's mass comes back as unit particles.
    assert_eq!(delta.spawned_particles.len(), 20);
    assert_eq!(sim.particles().count(), 20);
}

#[test]
fn cells_out_of_contact_do_not_fight() {
    let mut sim = empty_world();
    let attacker = place_cell(&mut sim, test_genome(), Vec2::new(150.0, 150.0));
    let defender = place_cell(&mut sim, test_genome(), Vec2::new(180.0, 150.0));
    set_mass(&mut sim, attacker, 30.0);

    let delta = sim.tick();

    assert!(delta.dead_cells.is_empty());
    assert!(sim.cell(defender).is_some());
}

#[test]
fn sub_unit_and_nan_particles_are_rejected() {
    let mut sim = empty_world();
    let cell = place_cell(&mut sim, test_genome(), Vec2::new(150.0, 150.0));
    for mass in [f32::NAN, -5.0, 0.5, f32::INFINITY] {
        let result = sim.add_particle(Vec2::new(152.0, 150.0), Color::pure(Channel::Red), mass);
        assert!(
            matches!(result, Err(SimError::InvalidConfig(_))),
            "mass {mass} should be rejected"
        );
    }
    assert_eq!(sim.particles().count(), 0);
    assert_eq!(sim.grid().len(), 1);

    let delta = sim.tick();

    assert!(delta.consumed_particles.is_empty());
    let cell = sim.cell(cell).expect("live cell");
    assert_close(cell.mass(), 20.0);
    assert_eq!(cell.phase(), CellPhase::Growing);
}
