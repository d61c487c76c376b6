//! Point registry
//!
//! An immutable snapshot of every live point, built wholesale from the fixture list and
//! published by swapping an `Arc`. Frames hold one `Arc<PointRegistry>` for their whole
//! duration, so they never see a half-built point set.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use glam::Vec3;
use log::debug;

use crate::models::{Fixture, FixtureId, SpatialPoint};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Default)]
pub struct PointRegistry {
    /// Unique per built registry in this process. 0 only for the empty default.
    id: u64,
    generation: u64,
    origin: Vec3,
    points: Vec<SpatialPoint>,
    fixture_slots: HashMap<FixtureId, Range<usize>>,
    tags: HashMap<String, Vec<FixtureId>>,
}

impl PointRegistry {
    /// Build from the current fixtures. Points are ordered by global index; derived
    /// spatial fields are computed here once and never per frame.
    pub fn build(
        fixtures: &[Fixture],
        origin: Vec3,
        channels_per_point: u32,
        generation: u64,
    ) -> Self {
        let mut ordered: Vec<&Fixture> = fixtures.iter().collect();
        ordered.sort_by_key(|f| f.point_range_min);

        let total = ordered.iter().map(|f| f.point_offsets.len()).sum();
        let mut points = Vec::with_capacity(total);
        let mut fixture_slots = HashMap::with_capacity(ordered.len());
        let mut tags: HashMap<String, Vec<FixtureId>> = HashMap::new();

        for fixture in ordered {
            let start = points.len();
            for (local, offset) in fixture.point_offsets.iter().enumerate() {
                let local = local as u32;
                points.push(SpatialPoint::new(
                    fixture.point_range_min + local,
                    (fixture.universe, fixture.channel + local * channels_per_point),
                    fixture.id,
                    local,
                    fixture.position + *offset,
                    origin,
                ));
            }
            fixture_slots.insert(fixture.id, start..points.len());
            for tag in &fixture.tags {
                tags.entry(tag.clone()).or_default().push(fixture.id);
            }
        }

        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            generation,
            origin,
            points,
            fixture_slots,
            tags,
        }
    }

    /// Identity of this exact point set. Unlike `generation`, never repeats across
    /// handles, so caches keyed on it cannot outlive the layout they were built for.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// All points in global index order. Each call starts again from the first point.
    pub fn points(&self) -> &[SpatialPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Slot of a global index in `points()` (and in the color buffer).
    pub fn slot_of(&self, global_index: u32) -> Option<usize> {
        self.points
            .binary_search_by_key(&global_index, |p| p.global_index)
            .ok()
    }

    pub fn get(&self, global_index: u32) -> Option<&SpatialPoint> {
        self.slot_of(global_index).map(|slot| &self.points[slot])
    }

    /// Slots of the points whose global index lies in `min..=max`.
    pub fn slots_in_range(&self, min: u32, max: u32) -> Range<usize> {
        let start = self.points.partition_point(|p| p.global_index < min);
        let end = self.points.partition_point(|p| p.global_index <= max);
        start..end.max(start)
    }

    pub fn points_in_range(&self, min: u32, max: u32) -> &[SpatialPoint] {
        &self.points[self.slots_in_range(min, max)]
    }

    pub fn has_fixture(&self, fixture_id: FixtureId) -> bool {
        self.fixture_slots.contains_key(&fixture_id)
    }

    pub fn fixture_slots(&self, fixture_id: FixtureId) -> Option<Range<usize>> {
        self.fixture_slots.get(&fixture_id).cloned()
    }

    pub fn fixture_points(&self, fixture_id: FixtureId) -> &[SpatialPoint] {
        match self.fixture_slots.get(&fixture_id) {
            Some(range) => &self.points[range.clone()],
            None => &[],
        }
    }

    pub fn fixture_ids_with_tag(&self, tag: &str) -> &[FixtureId] {
        self.tags.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fixture_count(&self) -> usize {
        self.fixture_slots.len()
    }

    /// Largest ground-plane distance from `origin` over every point.
    pub fn max_ground_dist_from(&self, origin: Vec3) -> f32 {
        self.points
            .iter()
            .map(|p| p.ground_dist_to(origin))
            .fold(0.0, f32::max)
    }
}

#[derive(Debug, Clone)]
struct RebuildRequest {
    fixtures: Vec<Fixture>,
    origin: Vec3,
}

type PendingSlot = Arc<Mutex<Option<RebuildRequest>>>;

fn lock_pending(pending: &PendingSlot) -> MutexGuard<'_, Option<RebuildRequest>> {
    // A panic while holding the lock leaves at worst a stale request behind.
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable sender for rebuild requests, for collaborators outside the frame loop.
#[derive(Clone)]
pub struct RebuildRequester {
    pending: PendingSlot,
}

impl RebuildRequester {
    /// Queue a rebuild. A request still waiting is replaced: the last request wins.
    pub fn request(&self, fixtures: Vec<Fixture>, origin: Vec3) {
        let mut slot = lock_pending(&self.pending);
        if slot.is_some() {
            debug!("[registry] pending rebuild superseded");
        }
        *slot = Some(RebuildRequest { fixtures, origin });
    }
}

/// Owner of the published registry.
///
/// Rebuilds are queued with `request_rebuild` at any time and applied by
/// `publish_pending`, which the show calls between frames only.
pub struct RegistryHandle {
    current: Arc<PointRegistry>,
    pending: PendingSlot,
    channels_per_point: u32,
}

impl RegistryHandle {
    pub fn new(channels_per_point: u32) -> Self {
        Self {
            current: Arc::new(PointRegistry::default()),
            pending: Arc::new(Mutex::new(None)),
            channels_per_point,
        }
    }

    pub fn current(&self) -> Arc<PointRegistry> {
        Arc::clone(&self.current)
    }

    pub fn generation(&self) -> u64 {
        self.current.generation
    }

    pub fn requester(&self) -> RebuildRequester {
        RebuildRequester {
            pending: Arc::clone(&self.pending),
        }
    }

    pub fn request_rebuild(&self, fixtures: Vec<Fixture>, origin: Vec3) {
        self.requester().request(fixtures, origin);
    }

    pub fn has_pending(&self) -> bool {
        lock_pending(&self.pending).is_some()
    }

    /// Build and swap in the latest queued request. Returns whether a new registry was
    /// published.
    pub fn publish_pending(&mut self) -> bool {
        let Some(request) = lock_pending(&self.pending).take() else {
            return false;
        };

        let generation = self.current.generation + 1;
        let registry = PointRegistry::build(
            &request.fixtures,
            request.origin,
            self.channels_per_point,
            generation,
        );
        debug!(
            "[registry] published generation {} ({} fixtures, {} points)",
            generation,
            registry.fixture_count(),
            registry.len()
        );
        self.current = Arc::new(registry);
        true
    }
}
