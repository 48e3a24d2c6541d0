//! Dynamic loading of compiled patcher shared libraries via their C ABI
//! factory entry point (`dlopen`-based, since a patcher's DSP graph is
//! produced by an external compiler, never linked at build time).

pub mod error;
pub mod factory;
pub mod ffi;
pub mod instance;

pub use error::PatcherLoadError;
pub use factory::PatcherFactory;
pub use instance::PatcherInstance;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn load_missing_library_reports_load_error() {
        let result = PatcherFactory::load(Path::new("/nonexistent/patcher.so"));
        assert!(matches!(result, Err(PatcherLoadError::Load(_))));
    }
}
