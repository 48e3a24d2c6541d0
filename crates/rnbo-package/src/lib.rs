pub mod builder;
pub mod info;
pub mod installer;

pub use builder::{build, BuildRequest, PatcherInclude};
pub use info::{target_id, PackageInfo, SCHEMA_VERSION};
pub use installer::{install, InstallDestinations, InstallReport};
