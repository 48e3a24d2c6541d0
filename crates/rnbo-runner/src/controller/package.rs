//! `package_create` and `package_install`.

use std::path::PathBuf;

use rnbo_db::{PatcherQuery, PresetQuery};
use rnbo_package::{BuildRequest, InstallDestinations, PatcherInclude};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CommandError;

use super::Controller;

#[derive(Deserialize)]
struct PackageCreateParams {
    name: String,
    #[serde(default)]
    patchers: Vec<String>,
    #[serde(default)]
    sets: Vec<String>,
    #[serde(default)]
    system_pretty_name: Option<String>,
    #[serde(default)]
    force: bool,
}

#[derive(Deserialize)]
struct PackageInstallParams {
    path: String,
}

impl Controller {
    /// Builds a `.rnbopack` archive from the named patchers' latest stored
    /// rows and any named sets, reusing an existing archive unless `force`.
    pub fn package_create(&self, params: Value) -> Result<Value, CommandError> {
        let params: PackageCreateParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed package_create params: {e}")))?;

        // Presets live in the database, not on disk, so each one is spooled
        // out to a scratch file the builder can copy from. The directory is
        // kept alive until after `rnbo_package::build` returns.
        let preset_scratch = tempfile::tempdir().map_err(|e| CommandError::Other(format!("preset scratch dir: {e}")))?;

        let mut patchers = Vec::new();
        for name in &params.patchers {
            let row = PatcherQuery::get_latest_by_name(&self.db, name)?
                .ok_or_else(|| CommandError::Other(format!("patcher not found: {name}")))?;

            let mut preset_paths = Vec::new();
            for summary in PresetQuery::list(&self.db, row.id)? {
                let Some(content) = PresetQuery::get_by_name(&self.db, row.id, &summary.name)? else {
                    continue;
                };
                let path = preset_scratch.path().join(format!("{}-{}.json", row.name, summary.name));
                std::fs::write(&path, content).map_err(|e| CommandError::Other(format!("spooling preset {}: {e}", summary.name)))?;
                preset_paths.push(path);
            }

            patchers.push(PatcherInclude {
                name: row.name,
                library_path: PathBuf::from(row.library_path),
                source_path: None,
                config_path: None,
                preset_paths,
            });
        }

        let set_json_paths: Vec<PathBuf> = params
            .sets
            .iter()
            .map(|name| self.save_dir.join(format!("{name}.json")))
            .collect();

        let request = BuildRequest {
            name: params.name,
            runner_version: self.runner_version.clone(),
            rnbo_version: self.rnbo_version.clone(),
            target_id: self.target_id.clone(),
            system_pretty_name: params.system_pretty_name,
            patchers,
            set_json_paths,
            datafile_paths: Vec::new(),
            include_binaries: true,
            include_sources: true,
            include_presets: true,
        };

        let archive = rnbo_package::build(&self.package_dir, &request, params.force)?;
        Ok(json!({ "path": archive.to_string_lossy() }))
    }

    pub fn package_install(&self, params: Value) -> Result<Value, CommandError> {
        let params: PackageInstallParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed package_install params: {e}")))?;

        let destinations = InstallDestinations {
            patcher_lib_dir: self.patcher_lib_dir.clone(),
            source_dir: self.source_dir.clone(),
            datafile_dir: self.datafile_dir.clone(),
        };
        let report = rnbo_package::install(std::path::Path::new(&params.path), &self.rnbo_version, &destinations, &self.db)?;
        Ok(json!({
            "patchers_imported": report.patchers_imported,
            "sets_imported": report.sets_imported,
        }))
    }
}
