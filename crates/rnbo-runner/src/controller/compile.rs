//! `compile` and `compile_cancel`, plus the outcome poll the dispatcher's
//! tick drives.

use std::path::{Path, PathBuf};

use rnbo_db::PatcherQuery;
use rnbo_proto::command::{CommandResponse, INTERNAL_ID};
use rnbo_proto::error::CompileLoadError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CommandError;

use super::{Controller, PendingCompile};

#[derive(Deserialize)]
struct CompileParams {
    name: String,
    source_path: String,
    #[serde(default)]
    config_json: String,
    #[serde(default)]
    patcher_file_path: String,
    #[serde(default)]
    index: Option<i64>,
    #[serde(default = "default_load")]
    load: bool,
}

fn default_load() -> bool {
    true
}

impl Controller {
    /// Submits a source file to the external compiler. Any job already in
    /// flight is cancelled first -- at most one compile runs at a time.
    pub fn compile(&self, params: Value) -> Result<Value, CommandError> {
        let params: CompileParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed compile params: {e}")))?;

        let exe = self
            .config
            .get_str(rnbo_config::keys::SO_BUILD_EXE)
            .ok_or_else(|| CommandError::Compile(CompileLoadError::LoadFailed("no build executable configured".to_string())))?;
        let rnbo_src_dir = self
            .config
            .get_str(rnbo_config::keys::RNBO_CPP_DIR)
            .map(PathBuf::from)
            .unwrap_or_default();
        let cmake_path = self.config.get_str(rnbo_config::keys::CMAKE_PATH).map(PathBuf::from);

        let expected_library_path = self.patcher_lib_dir.join(format!("{}.so", params.name));

        self.compile.submit(
            Path::new(&exe),
            PathBuf::from(&params.source_path),
            params.name.clone(),
            &rnbo_src_dir,
            &self.compile_cache_dir,
            cmake_path.as_deref(),
            expected_library_path,
            params.load,
        )?;

        self.pending_compiles.lock().unwrap().insert(
            params.name.clone(),
            PendingCompile {
                patcher_name: params.name.clone(),
                patcher_file_path: params.patcher_file_path,
                config_json: if params.config_json.is_empty() { "{}".to_string() } else { params.config_json },
                requested_index: params.index,
            },
        );

        Ok(json!({ "name": params.name }))
    }

    pub fn compile_cancel(&self, _params: Value) -> Result<Value, CommandError> {
        self.compile.cancel();
        Ok(json!({}))
    }

    /// Polls the compile supervisor; on completion, stores a new patcher row
    /// (success) and, if the request asked to load, loads an instance from
    /// it. Returns an internal-id response describing the outcome, which the
    /// dispatcher echoes to stdout.
    pub(super) fn poll_compile(&self) -> Option<CommandResponse> {
        let outcome = self.compile.poll_once()?;
        let pending = self.pending_compiles.lock().unwrap().remove(&outcome.library_name);

        if !outcome.success {
            log::warn!("compile of {} failed", outcome.library_name);
            return Some(CommandResponse::error(
                INTERNAL_ID,
                CompileLoadError::CompilerFailed(1).code(),
                format!("compile of {} failed", outcome.library_name),
            ));
        }

        let config_json = pending.as_ref().map(|p| p.config_json.clone()).unwrap_or_else(|| "{}".to_string());
        let patcher_file_path = pending.as_ref().map(|p| p.patcher_file_path.clone()).unwrap_or_default();

        let store_result = PatcherQuery::store(
            &self.db,
            &outcome.library_name,
            &outcome.library_path.to_string_lossy(),
            &self.rnbo_version,
            &config_json,
            &patcher_file_path,
        );
        if let Err(e) = store_result {
            log::warn!("storing compiled patcher {} failed: {e}", outcome.library_name);
            return Some(CommandResponse::error(INTERNAL_ID, CompileLoadError::LoadFailed(e.to_string()).code(), e.to_string()));
        }

        if outcome.load_when_done {
            let index = pending.and_then(|p| p.requested_index);
            let load_params = json!({ "name": outcome.library_name, "index": index });
            if let Err(e) = self.instance_load(load_params) {
                log::warn!("loading newly compiled patcher {} failed: {e}", outcome.library_name);
                return Some(CommandResponse::error(INTERNAL_ID, e.code(), e.to_string()));
            }
        }

        Some(CommandResponse::result(INTERNAL_ID, json!({ "name": outcome.library_name, "success": true })))
    }
}
