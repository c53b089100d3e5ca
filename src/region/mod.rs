//! Region registry, probing and selection

pub mod prober;
pub mod registry;
pub mod selector;
pub mod transport;

pub use prober::{best_region, ProbeReport, ProbeResult, RegionProber, SweepReport};
pub use registry::RegionRegistry;
pub use selector::{RegionListItem, RegionSelection, SelectionSource, SelectorView};
pub use transport::{HttpRegionTransport, RegionTransport};
