pub mod config;
pub mod error;
pub mod paths;
pub mod types;

pub use config::{BrowserConfig, Config, InspectorConfig, Palette};
pub use error::{Error, Result};
pub use paths::Paths;
pub use types::{
    css_property_name,
    DeviceProfile, MutationOutcome, MutationRequest, Point, Rect, Screenshot, SelectionRecord,
    SelectionSlot, Size,
};
