use log::debug;

/// First-fit, no-backfill channel allocator.
///
/// Every fixture gets one contiguous block of `point_count * channels_per_point` channels.
/// A block never straddles two universes: if it would reach the end of the current
/// universe, the cursor moves to channel 0 of the next one and the tail is left unused.
/// Addresses are never handed back, so removing a fixture leaves a hole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressAllocator {
    universe_start: u32,
    channels_per_point: u32,
    channels_per_universe: u32,
    universe: u32,
    channel: u32,
}

impl AddressAllocator {
    pub fn new(universe_start: u32, channels_per_point: u32, channels_per_universe: u32) -> Self {
        Self {
            universe_start,
            channels_per_point,
            channels_per_universe,
            universe: universe_start,
            channel: 0,
        }
    }

    /// Next free `(universe, channel)`.
    pub fn cursor(&self) -> (u32, u32) {
        (self.universe, self.channel)
    }

    pub fn reset(&mut self) {
        self.universe = self.universe_start;
        self.channel = 0;
    }

    pub fn block_size(&self, point_count: u32) -> u32 {
        point_count * self.channels_per_point
    }

    /// Addresses for each point of a new fixture, in local point order.
    pub fn allocate(&mut self, point_count: u32) -> Vec<(u32, u32)> {
        let block = self.block_size(point_count);
        // A block larger than a whole universe cannot fit anywhere; skipping an empty
        // universe would not help it.
        if self.channel > 0 && self.channel + block >= self.channels_per_universe {
            self.universe += 1;
            self.channel = 0;
            debug!("[layout] rolled over to universe {}", self.universe);
        }

        let base = self.channel;
        self.channel += block;
        self.point_addresses(self.universe, base, point_count)
    }

    /// Record an imported block so later allocations land after it.
    ///
    /// Imported addresses are authoritative and may ignore first-fit. The cursor only
    /// moves forward, to the end of the highest block seen.
    pub fn reserve(&mut self, universe: u32, channel: u32, point_count: u32) -> Vec<(u32, u32)> {
        let end = channel + self.block_size(point_count);
        if (universe, end) > (self.universe, self.channel) {
            self.universe = universe;
            self.channel = end;
        }
        self.point_addresses(universe, channel, point_count)
    }

    fn point_addresses(&self, universe: u32, base: u32, point_count: u32) -> Vec<(u32, u32)> {
        (0..point_count)
            .map(|i| (universe, base + i * self.channels_per_point))
            .collect()
    }
}
