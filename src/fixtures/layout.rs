use glam::Vec3;
use log::{debug, info, warn};

use crate::error::LayoutError;
use crate::fixtures::allocator::AddressAllocator;
use crate::models::{BlockAddress, Fixture, FixtureId, FixturePlacement, FixtureRecord};
use crate::settings::ShowSettings;

/// Default local geometry for a fixture's points: a square-ish grid in the ground plane,
/// row-major, centered on the fixture position.
pub fn compute_point_offsets(count: u32, spacing: f32) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![Vec3::ZERO];
    }

    let cols = (count as f32).sqrt().ceil() as u32;
    let rows = count.div_ceil(cols);

    // Center offsets (0,0 is middle of fixture)
    let start_x = -((cols - 1) as f32) * spacing / 2.0;
    let start_z = -((rows - 1) as f32) * spacing / 2.0;

    (0..count)
        .map(|i| {
            let col = i % cols;
            let row = i / cols;
            Vec3::new(
                start_x + col as f32 * spacing,
                0.0,
                start_z + row as f32 * spacing,
            )
        })
        .collect()
}

/// The live fixture set and the addressing state that goes with it.
///
/// Fixture ids and global point indices come from counters that only ever increase for
/// the lifetime of the layout. `clear` (or an import, which starts a new layout) is the
/// only thing that resets them.
#[derive(Debug, Clone)]
pub struct FixtureLayout {
    allocator: AddressAllocator,
    fixtures: Vec<Fixture>,
    next_id: FixtureId,
    next_global_index: u32,
    points_per_fixture: u32,
    point_spacing: f32,
    min_fixture_spacing: f32,
}

impl FixtureLayout {
    pub fn new(settings: &ShowSettings) -> Self {
        Self {
            allocator: AddressAllocator::new(
                settings.universe_start,
                settings.channels_per_point,
                settings.channels_per_universe,
            ),
            fixtures: Vec::new(),
            next_id: 0,
            next_global_index: 0,
            points_per_fixture: settings.points_per_fixture,
            point_spacing: settings.point_spacing,
            min_fixture_spacing: settings.min_fixture_spacing,
        }
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn fixture(&self, id: FixtureId) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn allocator(&self) -> &AddressAllocator {
        &self.allocator
    }

    /// Entry point for the placement collaborator once it has decided where a fixture goes.
    ///
    /// An explicit address (from an import) is used as-is and the allocator cursor is moved
    /// past it; otherwise the allocator hands out the next block.
    pub fn on_fixture_created(
        &mut self,
        placement: FixturePlacement,
        from_import: bool,
        explicit_address: Option<BlockAddress>,
    ) -> FixtureId {
        let point_offsets = placement.point_offsets.unwrap_or_else(|| {
            compute_point_offsets(self.points_per_fixture, self.point_spacing)
        });
        let point_count = point_offsets.len() as u32;

        let addresses = match explicit_address {
            Some(addr) => self
                .allocator
                .reserve(addr.universe, addr.channel, point_count),
            None => self.allocator.allocate(point_count),
        };
        let (universe, channel) = addresses.first().copied().unwrap_or(self.allocator.cursor());

        let id = self.next_id;
        self.next_id += 1;
        let point_range_min = self.next_global_index;
        self.next_global_index += point_count;

        debug!(
            "[layout] fixture {} at U{} ch{} (points {}..{})",
            id,
            universe,
            channel,
            point_range_min,
            point_range_min + point_count
        );

        self.fixtures.push(Fixture {
            id,
            position: placement.position,
            universe,
            channel,
            point_range_min,
            point_range_max: (point_range_min + point_count).saturating_sub(1),
            point_offsets,
            tags: placement.tags,
            from_import,
        });
        id
    }

    /// Runtime fixture creation. Rejects fixtures placed too close to an existing one.
    pub fn add_fixture(&mut self, placement: FixturePlacement) -> Result<FixtureId, LayoutError> {
        if let Some(existing) = self
            .fixtures
            .iter()
            .find(|f| f.position.distance(placement.position) < self.min_fixture_spacing)
        {
            return Err(LayoutError::TooClose {
                x: placement.position.x,
                z: placement.position.z,
                min_spacing: self.min_fixture_spacing,
                existing: existing.id,
            });
        }
        Ok(self.on_fixture_created(placement, false, None))
    }

    /// Drop a fixture and its points. Its addresses and indices are not handed out again.
    pub fn remove_fixture(&mut self, id: FixtureId) -> Result<Fixture, LayoutError> {
        let pos = self
            .fixtures
            .iter()
            .position(|f| f.id == id)
            .ok_or(LayoutError::UnknownFixture(id))?;
        let removed = self.fixtures.remove(pos);
        debug!("[layout] removed fixture {}", id);
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.fixtures.clear();
        self.allocator.reset();
        self.next_id = 0;
        self.next_global_index = 0;
    }

    /// Replace the layout with imported records.
    ///
    /// Records carrying an address are reserved first so the cursor sits past the highest
    /// imported block; records without one are then allocated in file order. Ids and
    /// global indices follow file order.
    pub fn import_records(&mut self, records: &[FixtureRecord]) {
        self.clear();
        warn_on_overlaps(records, self.allocator.block_size(1));

        for record in records {
            if let Some(addr) = record.address {
                self.allocator
                    .reserve(addr.universe, addr.channel, record.point_count);
            }
        }

        for record in records {
            let placement = FixturePlacement {
                position: record.position(),
                point_offsets: Some(self.record_offsets(record)),
                tags: record.tags.clone(),
            };
            self.on_fixture_created(placement, true, record.address);
        }

        info!(
            "[layout] imported {} fixtures, cursor now at {:?}",
            self.fixtures.len(),
            self.allocator.cursor()
        );
    }

    fn record_offsets(&self, record: &FixtureRecord) -> Vec<Vec3> {
        match &record.point_offsets {
            Some(offsets) if offsets.len() == record.point_count as usize => {
                offsets.iter().map(|o| Vec3::from_array(*o)).collect()
            }
            Some(offsets) => {
                warn!(
                    "[layout] record at ({}, {}) lists {} offsets for {} points, using defaults",
                    record.x,
                    record.z,
                    offsets.len(),
                    record.point_count
                );
                compute_point_offsets(record.point_count, self.point_spacing)
            }
            None => compute_point_offsets(record.point_count, self.point_spacing),
        }
    }

    /// Records with explicit addresses, ready to persist.
    pub fn export_records(&self) -> Vec<FixtureRecord> {
        self.fixtures
            .iter()
            .map(|f| FixtureRecord {
                x: f.position.x,
                y: f.position.y,
                z: f.position.z,
                address: Some(BlockAddress {
                    universe: f.universe,
                    channel: f.channel,
                }),
                point_count: f.point_count(),
                point_offsets: Some(f.point_offsets.iter().map(|o| o.to_array()).collect()),
                tags: f.tags.clone(),
            })
            .collect()
    }
}

/// Imported addresses are trusted, but two blocks sharing channels is almost always a
/// broken file.
fn warn_on_overlaps(records: &[FixtureRecord], channels_per_point: u32) {
    let mut blocks: Vec<(u32, u32, u32)> = records
        .iter()
        .filter_map(|r| {
            r.address.map(|a| {
                (
                    a.universe,
                    a.channel,
                    a.channel + r.point_count * channels_per_point,
                )
            })
        })
        .collect();
    blocks.sort_unstable();

    for pair in blocks.windows(2) {
        let (u0, start0, end0) = pair[0];
        let (u1, start1, _) = pair[1];
        if u0 == u1 && start1 < end0 {
            warn!(
                "[layout] imported blocks overlap in universe {}: ch{} and ch{}",
                u0, start0, start1
            );
        }
    }
}
