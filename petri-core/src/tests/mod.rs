pub(super) use super::*;
pub(super) use crate::ai::{decide, particle_score, social_force, Nearby};
pub(super) use crate::entity::{can_consume_cell, can_consume_particle, CellPhase};
pub(super) use crate::genome::{
    derived_max_age, mutate, split_chromosome, MIN_SIZE, MIN_SPEED, MIN_START_MASS,
};
pub(super) use crate::grid::EntityRef;
pub(super) use crate::physics::BodyHandle;
pub(super) use petri_types::{Channel, ChannelMap, Genome, Membrane, SplitEvent};
pub(super) use rand::SeedableRng;

mod agent_ai;
mod consumption;
mod support;
