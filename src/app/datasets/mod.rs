mod all_resolutions;
mod unique_resolutions;

pub use all_resolutions::{AllResolutions, RawResolution, ResolutionPage};
pub use unique_resolutions::{FrequencyPage, UniqueResolutions};
