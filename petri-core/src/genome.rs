use petri_types::{Channel, ChannelMap, Color, Genome, Membrane};
use rand::Rng;
use thiserror::Error;

pub const MIN_SPEED: f32 = 1.0;
pub const MIN_SIZE: f32 = 5.0;
pub const MIN_START_MASS: f32 = 1.0;
pub const MIN_MAX_AGE: f32 = 5.0;
/// Seconds of lifespan granted per unit of `max_mass`.
pub const AGE_PER_MASS: f32 = 0.5;

const BEHAVIOR_LIMIT: f32 = 1.0;
const BEHAVIOR_STEP: f32 = 0.25;
const SPEED_STEP: f32 = 4.0;
const SIZE_STEP: f32 = 2.0;
const START_MASS_STEP: f32 = 2.0;
const BULK_FACTOR_MAX: f32 = 0.2;
const MUTATION_RATE_STEP: f32 = 0.01;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenomeError {
    #[error("max_mass ({max_mass}) must be greater than start_mass ({start_mass})")]
    MassOrdering { start_mass: f32, max_mass: f32 },
    #[error("start_mass must be at least {MIN_START_MASS}, got {0}")]
    StartMassTooSmall(f32),
    #[error("mutation_rate must be within [0, 1], got {0}")]
    MutationRate(f32),
    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChromosomeError {
    #[error("chromosome must contain at least one gene")]
    Empty,
    #[error("active gene {active_gene} out of range for chromosome of length {len}")]
    ActiveGeneOutOfRange { active_gene: usize, len: usize },
    #[error("gene {index} is invalid: {source}")]
    InvalidGene {
        index: usize,
        #[source]
        source: GenomeError,
    },
}

pub fn validate_genome(genome: &Genome) -> Result<(), GenomeError> {
    for (field, value) in [
        ("size", genome.size),
        ("speed", genome.speed),
        ("max_age", genome.max_age),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(GenomeError::NonPositive { field, value });
        }
    }
    if genome.start_mass.is_nan() || genome.start_mass < MIN_START_MASS {
        return Err(GenomeError::StartMassTooSmall(genome.start_mass));
    }
    if genome.max_mass.is_nan() || genome.max_mass <= genome.start_mass {
        return Err(GenomeError::MassOrdering {
            start_mass: genome.start_mass,
            max_mass: genome.max_mass,
        });
    }
    if !(0.0..=1.0).contains(&genome.mutation_rate) {
        return Err(GenomeError::MutationRate(genome.mutation_rate));
    }
    Ok(())
}

/// Ordered gene list with exactly one expressed gene. Can only be built in a
/// valid state.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    genes: Vec<Genome>,
    active_gene: usize,
}

impl Chromosome {
    pub fn new(genes: Vec<Genome>, active_gene: usize) -> Result<Self, ChromosomeError> {
        if genes.is_empty() {
            return Err(ChromosomeError::Empty);
        }
        if active_gene >= genes.len() {
            return Err(ChromosomeError::ActiveGeneOutOfRange {
                active_gene,
                len: genes.len(),
            });
        }
        for (index, gene) in genes.iter().enumerate() {
            validate_genome(gene).map_err(|source| ChromosomeError::InvalidGene { index, source })?;
        }
        Ok(Self { genes, active_gene })
    }

    pub fn single(genome: Genome) -> Result<Self, ChromosomeError> {
        Self::new(vec![genome], 0)
    }

    pub fn genes(&self) -> &[Genome] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn active_gene(&self) -> usize {
        self.active_gene
    }

    pub fn phenotype(&self) -> &Genome {
        &self.genes[self.active_gene]
    }

    /// Same chromosome with the expressed gene recolored. Color carries no
    /// validity constraint, so this cannot fail.
    pub fn with_phenotype_color(&self, color: Color) -> Self {
        let mut recolored = self.clone();
        recolored.genes[recolored.active_gene].color = color;
        recolored
    }
}

/// Returns a mutated copy of `genome`; the input is never modified.
pub fn mutate<R: Rng + ?Sized>(genome: &Genome, rng: &mut R) -> Genome {
    let mut child = genome.clone();
    let rate = child.mutation_rate;

    match child.dominant_channel() {
        Channel::Red => mutate_defensive(&mut child, rate, rng),
        Channel::Green => mutate_offensive(&mut child, rate, rng),
        Channel::Blue => mutate_special(&mut child, rate, rng),
    }

    if rng.random::<f32>() < rate {
        let delta = if rng.random::<bool>() {
            MUTATION_RATE_STEP
        } else {
            -MUTATION_RATE_STEP
        };
        child.mutation_rate = (child.mutation_rate + delta).clamp(0.0, 1.0);
    }

    normalize(&mut child);
    child
}

fn mutate_defensive<R: Rng + ?Sized>(genome: &mut Genome, rate: f32, rng: &mut R) {
    let own = genome.dominant_channel();
    if rng.random::<f32>() < rate {
        for channel in Channel::ALL {
            let step = rng.random_range(0.0..BEHAVIOR_STEP);
            let weight = genome.behavior.get_mut(channel);
            if channel == own {
                *weight += step;
            } else {
                *weight -= step;
            }
        }
    }
    // armor costs speed
    if rng.random::<f32>() < rate {
        genome.membrane = Membrane::Armored;
        genome.speed -= rng.random_range(0.0..SPEED_STEP);
    }
    // mass for mobility
    if rng.random::<f32>() < rate {
        genome.start_mass -= rng.random_range(0.0..START_MASS_STEP);
        genome.speed += rng.random_range(0.0..SPEED_STEP);
    }
    if rng.random::<f32>() < rate {
        reveal_hidden_channel(&mut genome.perception, rng);
    }
}

fn mutate_offensive<R: Rng + ?Sized>(genome: &mut Genome, rate: f32, rng: &mut R) {
    let own = genome.dominant_channel();
    if rng.random::<f32>() < rate {
        for channel in Channel::ALL {
            *genome.behavior.get_mut(channel) += rng.random_range(0.0..BEHAVIOR_STEP);
        }
    }
    if rng.random::<f32>() < rate {
        let factor = 1.0 + rng.random_range(0.0..BULK_FACTOR_MAX);
        genome.start_mass *= factor;
        genome.max_mass *= factor;
        genome.size += rng.random_range(0.0..SIZE_STEP);
        genome.speed -= rng.random_range(0.0..SPEED_STEP);
    }
    genome.membrane = Membrane::Unarmored;
    if rng.random::<f32>() < rate {
        restrict_visible_channel(&mut genome.perception, own, rng);
    }
}

fn mutate_special<R: Rng + ?Sized>(genome: &mut Genome, rate: f32, rng: &mut R) {
    let own = genome.dominant_channel();
    if rng.random::<f32>() < rate {
        genome.behavior =
            ChannelMap::from_fn(|_| rng.random_range(-BEHAVIOR_LIMIT..=BEHAVIOR_LIMIT));
    }
    if rng.random::<f32>() < rate {
        genome.exploding = true;
    }
    genome.membrane = Membrane::Unarmored;
    if rng.random::<f32>() < rate {
        if genome.perception.count_true() == Channel::ALL.len() {
            restrict_visible_channel(&mut genome.perception, own, rng);
        } else {
            reveal_hidden_channel(&mut genome.perception, rng);
        }
    }
}

/// Gaining sight of a channel never touches the other channels.
fn reveal_hidden_channel<R: Rng + ?Sized>(perception: &mut ChannelMap<bool>, rng: &mut R) {
    let hidden: Vec<Channel> = Channel::ALL
        .into_iter()
        .filter(|&channel| !perception.at(channel))
        .collect();
    if hidden.is_empty() {
        return;
    }
    *perception.get_mut(hidden[rng.random_range(0..hidden.len())]) = true;
}

/// Hides one visible channel other than `keep`; at least one channel always
/// stays visible.
fn restrict_visible_channel<R: Rng + ?Sized>(
    perception: &mut ChannelMap<bool>,
    keep: Channel,
    rng: &mut R,
) {
    if perception.count_true() <= 1 {
        return;
    }
    let candidates: Vec<Channel> = Channel::ALL
        .into_iter()
        .filter(|&channel| channel != keep && perception.at(channel))
        .collect();
    if candidates.is_empty() {
        return;
    }
    *perception.get_mut(candidates[rng.random_range(0..candidates.len())]) = false;
}

fn normalize(genome: &mut Genome) {
    genome.speed = genome.speed.max(MIN_SPEED);
    genome.size = genome.size.max(MIN_SIZE);
    genome.start_mass = genome.start_mass.max(MIN_START_MASS);
    genome.max_mass = genome.max_mass.max(genome.start_mass + 1.0);
    let behavior = genome.behavior;
    genome.behavior =
        ChannelMap::from_fn(|channel| behavior.at(channel).clamp(-BEHAVIOR_LIMIT, BEHAVIOR_LIMIT));
    genome.max_age = derived_max_age(genome.max_mass);
}

pub fn derived_max_age(max_mass: f32) -> f32 {
    (max_mass * AGE_PER_MASS).max(MIN_MAX_AGE)
}

/// Every gene is mutated twice, once per child. Each child then expresses a
/// random gene of its own.
pub fn split_chromosome<R: Rng + ?Sized>(
    parent: &Chromosome,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let mut first = Vec::with_capacity(parent.len());
    let mut second = Vec::with_capacity(parent.len());
    for gene in parent.genes() {
        first.push(mutate(gene, rng));
        second.push(mutate(gene, rng));
    }
    let first_active = rng.random_range(0..first.len());
    let second_active = rng.random_range(0..second.len());
    (
        Chromosome {
            genes: first,
            active_gene: first_active,
        },
        Chromosome {
            genes: second,
            active_gene: second_active,
        },
    )
}
