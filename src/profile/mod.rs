//! Browser profiles and their family groups

mod registry;

pub use registry::{builtin_profiles, BrowserProfile, ProfileInfo, ProfileRegistry};
