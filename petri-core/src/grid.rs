use glam::Vec2;
use petri_types::{CellId, ParticleId, WorldConfig};

/// Tagged reference stored in grid buckets. Ordering is particles first,
/// then cells, each by ascending id; query results come back in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    Particle(ParticleId),
    Cell(CellId),
}

/// Uniform bucket grid over the world rectangle. Positions outside the
/// world clamp to the nearest edge bucket.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    bucket_size: f32,
    cols: u32,
    rows: u32,
    buckets: Vec<Vec<EntityRef>>,
}

impl SpatialGrid {
    pub fn new(bucket_size: f32, cols: u32, rows: u32) -> Self {
        debug_assert!(bucket_size > 0.0);
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            bucket_size,
            cols,
            rows,
            buckets: vec![Vec::new(); cols as usize * rows as usize],
        }
    }

    pub fn for_world(config: &WorldConfig) -> Self {
        Self::new(config.bucket_size, config.buckets_x(), config.buckets_y())
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn bucket_size(&self) -> f32 {
        self.bucket_size
    }

    pub fn bucket_of(&self, position: Vec2) -> (u32, u32) {
        (
            clamp_axis(position.x, self.bucket_size, self.cols),
            clamp_axis(position.y, self.bucket_size, self.rows),
        )
    }

    pub fn bucket(&self, ix: u32, iy: u32) -> &[EntityRef] {
        if ix >= self.cols || iy >= self.rows {
            return &[];
        }
        &self.buckets[self.index(ix, iy)]
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    pub fn insert(&mut self, entity: EntityRef, position: Vec2) {
        let (ix, iy) = self.bucket_of(position);
        let idx = self.index(ix, iy);
        self.buckets[idx].push(entity);
    }

    /// Empties every bucket in place and re-inserts the given entities.
    pub fn rebuild(
        &mut self,
        particles: impl IntoIterator<Item = (ParticleId, Vec2)>,
        cells: impl IntoIterator<Item = (CellId, Vec2)>,
    ) {
        self.clear();
        for (id, position) in particles {
            self.insert(EntityRef::Particle(id), position);
        }
        for (id, position) in cells {
            self.insert(EntityRef::Cell(id), position);
        }
    }

    /// Everything in the (2r+1)x(2r+1) block of buckets around `position`.
    /// This is a superset of the entities within `bucket_radius` buckets;
    /// callers still need an exact distance test.
    pub fn query_radius(&self, position: Vec2, bucket_radius: u32) -> Vec<EntityRef> {
        let mut out = Vec::new();
        self.query_radius_into(position, bucket_radius, &mut out);
        out
    }

    pub fn query_radius_into(&self, position: Vec2, bucket_radius: u32, out: &mut Vec<EntityRef>) {
        out.clear();
        let (cx, cy) = self.bucket_of(position);
        let x_min = cx.saturating_sub(bucket_radius);
        let y_min = cy.saturating_sub(bucket_radius);
        let x_max = cx.saturating_add(bucket_radius).min(self.cols - 1);
        let y_max = cy.saturating_add(bucket_radius).min(self.rows - 1);
        for iy in y_min..=y_max {
            for ix in x_min..=x_max {
                out.extend_from_slice(&self.buckets[self.index(ix, iy)]);
            }
        }
        out.sort_unstable();
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    fn index(&self, ix: u32, iy: u32) -> usize {
        iy as usize * self.cols as usize + ix as usize
    }
}

fn clamp_axis(coord: f32, bucket_size: f32, count: u32) -> u32 {
    let raw = (coord / bucket_size).floor();
    if raw.is_nan() || raw <= 0.0 {
        return 0;
    }
    (raw as u64).min(u64::from(count - 1)) as u32
}
