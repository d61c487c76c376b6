pub mod allocator;
pub mod layout;
pub mod parser;
pub mod registry;

pub use allocator::AddressAllocator;
pub use layout::{compute_point_offsets, FixtureLayout};
pub use parser::{list_layouts, load_layout, parse_layout, save_layout, LayoutEntry};
pub use registry::{PointRegistry, RebuildRequester, RegistryHandle};
