use super::support::*;
use super::*;

fn agent() -> Cell {
    detached_cell(0, test_genome(), Vec2::ZERO, 20.0)
}

#[test]
fn equal_scores_go_to_the_first_particle_offered() {
    let cell = agent();
    // Own channel at distance 10 scores 5; a permitted foreign channel at
    // distance 5 also scores 5.
    let matching = detached_particle(1, Vec2::new(10.0, 0.0), Channel::Red);
    let foreign = detached_particle(2, Vec2::new(0.0, 5.0), Channel::Green);
    assert_eq!(particle_score(&cell, &matching), Some(5.0));
    assert_eq!(particle_score(&cell, &foreign), Some(5.0));

    let toward_matching = decide(
        &cell,
        [Nearby::Particle(&matching), Nearby::Particle(&foreign)],
        10.0,
    );
    assert_vec_close(toward_matching, Vec2::new(60.0, 0.0));

    let toward_foreign = decide(
        &cell,
        [Nearby::Particle(&foreign), Nearby::Particle(&matching)],
        10.0,
    );
    assert_vec_close(toward_foreign, Vec2::new(0.0, 60.0));
}

#[test]
fn own_channel_discount_beats_closer_foreign_particle() {
    let cell = agent();
    let matching = detached_particle(1, Vec2::new(8.0, 0.0), Channel::Red);
    let foreign = detached_particle(2, Vec2::new(0.0, -5.0), Channel::Blue);

    let velocity = decide(
        &cell,
        [Nearby::Particle(&foreign), Nearby::Particle(&matching)],
        10.0,
    );
    assert_vec_close(velocity, Vec2::new(60.0, 0.0));
}

#[test]
fn forbidden_particles_are_skipped() {
    let mut genome = test_genome();
    genome.p_consumption.green = false;
    let cell = detached_cell(0, genome, Vec2::ZERO, 20.0);
    let forbidden = detached_particle(1, Vec2::new(3.0, 0.0), Channel::Green);
    let allowed = detached_particle(2, Vec2::new(0.0, 20.0), Channel::Blue);

    assert_eq!(particle_score(&cell, &forbidden), None);
    let velocity = decide(
        &cell,
        [Nearby::Particle(&forbidden), Nearby::Particle(&allowed)],
        10.0,
    );
    assert_vec_close(velocity, Vec2::new(0.0, 60.0));
}

#[test]
fn positive_behavior_weight_attracts_and_negative_repels() {
    let green = detached_cell(
        1,
        colored_genome(Color::pure(Channel::Green)),
        Vec2::new(20.0, 0.0),
        20.0,
    );

    let mut friendly = test_genome();
    friendly.behavior.green = 1.0;
    let cell = detached_cell(0, friendly, Vec2::ZERO, 20.0);
    assert_vec_close(social_force(&cell, &green, 100.0), Vec2::new(1.0 / 400.0, 0.0));
    assert_vec_close(decide(&cell, [Nearby::Cell(&green)], 10.0), Vec2::new(60.0, 0.0));

    let mut wary = test_genome();
    wary.behavior.green = -1.0;
    let cell = detached_cell(0, wary, Vec2::ZERO, 20.0);
    assert_vec_close(decide(&cell, [Nearby::Cell(&green)], 10.0), Vec2::new(-60.0, 0.0));
}

#[test]
fn cells_beyond_the_social_cutoff_exert_no_force() {
    let mut genome = test_genome();
    genome.behavior = ChannelMap::splat(1.0);
    let cell = detached_cell(0, genome, Vec2::ZERO, 20.0);
    // Cutoff is 10 x size 10 = 100.
    let distant = detached_cell(1, test_genome(), Vec2::new(101.0, 0.0), 20.0);

    assert_eq!(social_force(&cell, &distant, 100.0), Vec2::ZERO);
    assert_eq!(decide(&cell, [Nearby::Cell(&distant)], 10.0), Vec2::ZERO);
}

#[test]
fn coincident_and_self_entries_are_ignored() {
    let mut genome = test_genome();
    genome.behavior = ChannelMap::splat(1.0);
    let cell = detached_cell(0, genome, Vec2::new(5.0, 5.0), 20.0);
    let twin = detached_cell(1, test_genome(), Vec2::new(5.0, 5.0), 20.0);

    let velocity = decide(&cell, [Nearby::Cell(&cell), Nearby::Cell(&twin)], 10.0);
    assert_eq!(velocity, Vec2::ZERO);
}

#[test]
fn keeps_heading_when_nothing_is_nearby() {
    let mut cell = agent();
    cell.velocity = Vec2::new(3.0, 4.0);
    assert_vec_close(decide(&cell, std::iter::empty::<Nearby>(), 10.0), Vec2::new(36.0, 48.0));
}

#[test]
fn agents_steer_inside_a_running_world() {
    let mut sim = empty_world();
    let cell = place_cell(&mut sim, test_genome(), Vec2::new(150.0, 150.0));
    place_particle(&mut sim, Vec2::new(150.0, 180.0), Channel::Red);

    sim.tick();

    let cell = sim.cell(cell).expect("live cell");
    assert_vec_close(cell.velocity(), Vec2::new(0.0, 60.0));
    assert_vec_close(cell.position(), Vec2::new(150.0, 150.0 + 60.0 * sim.config().dt));
}
