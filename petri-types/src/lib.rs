use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u64);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub u64);

/// One of the three color channels. Declaration order is the tie-break
/// priority used by [`Color::dominant_channel`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];
}

/// A value per color channel, used for behavior weights, perception and
/// consumption permissions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ChannelMap<T> {
    pub red: T,
    pub green: T,
    pub blue: T,
}

impl<T> ChannelMap<T> {
    pub const fn new(red: T, green: T, blue: T) -> Self {
        Self { red, green, blue }
    }

    pub fn from_fn(mut f: impl FnMut(Channel) -> T) -> Self {
        Self {
            red: f(Channel::Red),
            green: f(Channel::Green),
            blue: f(Channel::Blue),
        }
    }

    pub fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut T {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        }
    }
}

impl<T: Copy> ChannelMap<T> {
    pub fn splat(value: T) -> Self {
        Self::new(value, value, value)
    }

    pub fn at(&self, channel: Channel) -> T {
        *self.get(channel)
    }
}

impl ChannelMap<bool> {
    pub fn count_true(&self) -> usize {
        Channel::ALL.iter().filter(|&&c| self.at(c)).count()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const MAX: f32 = 255.0;

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Fully saturated single-channel color, the shape every freshly seeded
    /// particle has.
    pub fn pure(channel: Channel) -> Self {
        let mut color = Self::default();
        *color.channel_mut(channel) = Self::MAX;
        color
    }

    /// Saturated on the two channels other than `channel`.
    pub fn complement(channel: Channel) -> Self {
        let mut color = Self::new(Self::MAX, Self::MAX, Self::MAX);
        *color.channel_mut(channel) = 0.0;
        color
    }

    pub fn channel(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Red => self.r,
            Channel::Green => self.g,
            Channel::Blue => self.b,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut f32 {
        match channel {
            Channel::Red => &mut self.r,
            Channel::Green => &mut self.g,
            Channel::Blue => &mut self.b,
        }
    }

    /// Channel holding the largest component. Ties resolve red, then green,
    /// then blue.
    pub fn dominant_channel(&self) -> Channel {
        let mut best = Channel::Red;
        for channel in [Channel::Green, Channel::Blue] {
            if self.channel(channel) > self.channel(best) {
                best = channel;
            }
        }
        best
    }

    pub fn brightest(&self) -> f32 {
        self.r.max(self.g).max(self.b)
    }
}

/// Masks the channels a viewer cannot see. Presentation only; the simulation
/// never consults perception.
pub fn perceive(perception: &ChannelMap<bool>, color: Color) -> Color {
    Color::new(
        if perception.red { color.r } else { 0.0 },
        if perception.green { color.g } else { 0.0 },
        if perception.blue { color.b } else { 0.0 },
    )
}

/// Membrane class. Armored cells cannot be eaten by other cells.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Membrane {
    #[default]
    Unarmored,
    Armored,
}

impl Membrane {
    pub fn thickness(self) -> u8 {
        match self {
            Membrane::Unarmored => 1,
            Membrane::Armored => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genome {
    pub size: f32,
    pub start_mass: f32,
    pub max_mass: f32,
    #[serde(default)]
    pub membrane: Membrane,
    pub strength: f32,
    pub speed: f32,
    /// Neighborhood query radius, in grid buckets.
    pub detection_radius: u32,
    /// Lifespan in simulated seconds.
    pub max_age: f32,
    #[serde(default)]
    pub charge: f32,
    pub mutation_rate: f32,
    #[serde(default)]
    pub exploding: bool,
    #[serde(default = "all_channels")]
    pub perception: ChannelMap<bool>,
    #[serde(default)]
    pub behavior: ChannelMap<f32>,
    #[serde(default = "all_channels")]
    pub p_consumption: ChannelMap<bool>,
    #[serde(default = "all_channels")]
    pub c_consumption: ChannelMap<bool>,
    pub color: Color,
}

impl Genome {
    pub fn dominant_channel(&self) -> Channel {
        self.color.dominant_channel()
    }
}

fn all_channels() -> ChannelMap<bool> {
    ChannelMap::splat(true)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldConfig {
    pub world_width: f32,
    pub world_height: f32,
    /// Edge length of one spatial grid bucket in world units.
    pub bucket_size: f32,
    /// Seconds of simulated time per tick.
    pub dt: f32,
    pub initial_particles: u32,
    pub particle_mass: f32,
    pub particle_radius: f32,
    pub initial_cells: u32,
    #[serde(default = "default_spawn_player")]
    pub spawn_player: bool,
    pub player_max_age: f32,
    pub population_cap: u32,
    #[serde(default = "default_explosion_bucket_radius")]
    pub explosion_bucket_radius: u32,
    /// Other cells farther than this multiple of a cell's size exert no
    /// social force on it.
    #[serde(default = "default_social_cutoff_factor")]
    pub social_cutoff_factor: f32,
    pub seed_genome: Genome,
}

impl Default for WorldConfig {
    fn default() -> Self {
        toml::from_str(include_str!("../../config/default.toml"))
            .expect("default world config TOML must deserialize")
    }
}

impl WorldConfig {
    pub fn buckets_x(&self) -> u32 {
        (self.world_width / self.bucket_size).ceil().max(1.0) as u32
    }

    pub fn buckets_y(&self) -> u32 {
        (self.world_height / self.bucket_size).ceil().max(1.0) as u32
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.world_width / 2.0, self.world_height / 2.0)
    }
}

fn default_spawn_player() -> bool {
    true
}

fn default_explosion_bucket_radius() -> u32 {
    1
}

fn default_social_cutoff_factor() -> f32 {
    10.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellState {
    pub id: CellId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    pub radius: f32,
    pub age: f32,
    pub max_age: f32,
    pub color: Color,
    pub is_player: bool,
    pub active_gene: usize,
    pub chromosome_len: usize,
    pub phenotype: Genome,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticleState {
    pub id: ParticleId,
    pub position: Vec2,
    pub mass: f32,
    pub radius: f32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub cells: u32,
    pub particles: u32,
    pub particles_consumed_last_tick: u64,
    pub cells_consumed_last_tick: u64,
    pub splits_last_tick: u64,
    pub deaths_last_tick: u64,
    pub explosions_last_tick: u64,
    pub total_particles_consumed: u64,
    pub total_splits: u64,
    pub total_deaths: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub rng_seed: u64,
    pub config: WorldConfig,
    pub cells: Vec<CellState>,
    pub particles: Vec<ParticleState>,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitEvent {
    pub parent: CellId,
    pub children: Vec<CellId>,
    pub surplus_particles: u32,
}

/// Everything that changed during one tick, in the order it was resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TickDelta {
    pub tick: u64,
    pub consumed_particles: Vec<ParticleId>,
    pub dead_cells: Vec<CellId>,
    pub splits: Vec<SplitEvent>,
    pub explosions: Vec<CellId>,
    pub spawned_cells: Vec<CellState>,
    pub spawned_particles: Vec<ParticleState>,
    pub player_died: bool,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrawKind {
    Cell,
    Particle,
}

/// Per-frame draw tuple handed to a renderer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DrawItem {
    pub kind: DrawKind,
    pub position: Vec2,
    pub radius: f32,
    pub color: Color,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn config_roundtrip() {
        let cfg = WorldConfig::default();
        let json = serde_json::to_string(&cfg).expect("serialize config");
        let parsed: WorldConfig = serde_json::from_str(&json).expect("deserialize config");
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn default_seed_genome_keeps_mass_ordering() {
        let cfg = WorldConfig::default();
        assert!(cfg.seed_genome.max_mass > cfg.seed_genome.start_mass);
        assert!((0.0..=1.0).contains(&cfg.seed_genome.mutation_rate));
    }

    #[test]
    fn omitted_genome_flags_default_to_permissive() {
        let cfg = WorldConfig::default();
        let mut value = serde_json::to_value(&cfg.seed_genome).expect("serialize genome");
        let object = value.as_object_mut().expect("genome must be an object");
        object.remove("p_consumption");
        object.remove("membrane");
        object.remove("exploding");

        let parsed: Genome = serde_json::from_value(value).expect("deserialize trimmed genome");
        assert_eq!(parsed.p_consumption, ChannelMap::splat(true));
        assert_eq!(parsed.membrane, Membrane::Unarmored);
        assert!(!parsed.exploding);
    }

    #[test]
    fn dominant_channel_breaks_ties_red_then_green() {
        assert_eq!(
            Color::new(255.0, 255.0, 0.0).dominant_channel(),
            Channel::Red
        );
        assert_eq!(
            Color::new(0.0, 255.0, 255.0).dominant_channel(),
            Channel::Green
        );
        assert_eq!(Color::new(0.0, 0.0, 0.0).dominant_channel(), Channel::Red);
        assert_eq!(Color::new(3.0, 2.0, 9.0).dominant_channel(), Channel::Blue);
    }

    #[test]
    fn pure_and_complement_colors_are_disjoint() {
        for channel in Channel::ALL {
            let pure = Color::pure(channel);
            let complement = Color::complement(channel);
            assert_eq!(pure.dominant_channel(), channel);
            assert_eq!(complement.channel(channel), 0.0);
            for other in Channel::ALL.into_iter().filter(|c| *c != channel) {
                assert_eq!(pure.channel(other), 0.0);
                assert_eq!(complement.channel(other), Color::MAX);
            }
        }
    }

    #[test]
    fn perceive_masks_hidden_channels() {
        let perception = ChannelMap::new(true, false, true);
        let seen = perceive(&perception, Color::new(10.0, 20.0, 30.0));
        assert_eq!(seen, Color::new(10.0, 0.0, 30.0));
    }

    #[test]
    fn bucket_counts_round_up() {
        let mut cfg = WorldConfig::default();
        cfg.world_width = 250.0;
        cfg.world_height = 100.0;
        cfg.bucket_size = 100.0;
        assert_eq!(cfg.buckets_x(), 3);
        assert_eq!(cfg.buckets_y(), 1);
    }

    proptest! {
        #[test]
        fn dominant_channel_holds_the_maximum(
            r in 0.0f32..=255.0,
            g in 0.0f32..=255.0,
            b in 0.0f32..=255.0,
        ) {
            let color = Color::new(r, g, b);
            let dominant = color.dominant_channel();
            prop_assert_eq!(color.channel(dominant), color.brightest());
            for channel in Channel::ALL {
                if channel < dominant {
                    prop_assert!(color.channel(channel) < color.channel(dominant));
                }
            }
        }
    }
}
