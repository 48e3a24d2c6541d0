//! Unpacks and imports a `.rnbopack` archive.

use std::fs;
use std::path::{Path, PathBuf};

use rnbo_db::{Db, PatcherQuery, PresetQuery, SetQuery};
use rnbo_proto::error::PackageCommandError;

use crate::info::{PackageInfo, SCHEMA_VERSION};

pub struct InstallDestinations {
    pub patcher_lib_dir: PathBuf,
    pub source_dir: PathBuf,
    pub datafile_dir: PathBuf,
}

pub struct InstallReport {
    pub patchers_imported: Vec<String>,
    pub sets_imported: Vec<String>,
}

/// Unpacks `archive_path` to a scratch directory, verifies the manifest,
/// copies files into the runtime caches (never overwriting an existing
/// datafile), imports each patcher and set into `db`, then removes the
/// scratch directory.
pub fn install(
    archive_path: &Path,
    expected_rnbo_version: &str,
    destinations: &InstallDestinations,
    db: &Db,
) -> Result<InstallReport, PackageCommandError> {
    let work_dir = tempfile::tempdir()?;
    let root = work_dir.path();

    let file = fs::File::open(archive_path)
        .map_err(|e| PackageCommandError::NotFound(format!("{}: {e}", archive_path.display())))?;
    let mut archive = tar::Archive::new(file);
    archive.unpack(root)?;

    let info_path = root.join("info.json");
    let info_text = fs::read_to_string(&info_path)
        .map_err(|_| PackageCommandError::Malformed("missing info.json".to_string()))?;
    let info: PackageInfo = serde_json::from_str(&info_text)?;

    if info.schema_version != SCHEMA_VERSION {
        return Err(PackageCommandError::Malformed(format!(
            "unsupported schema version {}",
            info.schema_version
        )));
    }
    if info.rnbo_version != expected_rnbo_version {
        return Err(PackageCommandError::Malformed(format!(
            "package built for rnbo {}, runner is {}",
            info.rnbo_version, expected_rnbo_version
        )));
    }

    fs::create_dir_all(&destinations.datafile_dir)?;
    for datafile in &info.datafiles {
        let src = root.join("datafiles").join(datafile);
        let dest = destinations.datafile_dir.join(datafile);
        if src.exists() && !dest.exists() {
            fs::copy(&src, &dest)?;
        }
    }

    fs::create_dir_all(&destinations.source_dir)?;
    let src_dir = root.join("src");
    if src_dir.is_dir() {
        for entry in fs::read_dir(&src_dir)? {
            let entry = entry?;
            let dest = destinations.source_dir.join(entry.file_name());
            fs::copy(entry.path(), dest)?;
        }
    }

    fs::create_dir_all(&destinations.patcher_lib_dir)?;
    let mut patchers_imported = Vec::new();
    for target in &info.targets {
        let patcher_dir = root.join("targets").join(target).join("patchers");
        if !patcher_dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&patcher_dir)? {
            let entry = entry?;
            let dest = destinations.patcher_lib_dir.join(entry.file_name());
            fs::copy(entry.path(), &dest)?;

            let name = entry
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("patcher")
                .to_string();
            let patcher_id = PatcherQuery::store(
                db,
                &name,
                &dest.to_string_lossy(),
                &info.rnbo_version,
                "{}",
                "",
            )
            .map_err(|e| PackageCommandError::Io(e.to_string()))?;

            let preset_dir = root.join("presets").join(&name);
            if preset_dir.is_dir() {
                for preset_entry in fs::read_dir(&preset_dir)? {
                    let preset_entry = preset_entry?;
                    let preset_name = preset_entry
                        .path()
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("preset")
                        .to_string();
                    let content = fs::read_to_string(preset_entry.path())?;
                    PresetQuery::save(db, patcher_id, &preset_name, &content)
                        .map_err(|e| PackageCommandError::Io(e.to_string()))?;
                }
            }

            patchers_imported.push(name);
        }
    }

    let mut sets_imported = Vec::new();
    let sets_dir = root.join("sets");
    if sets_dir.is_dir() {
        for entry in fs::read_dir(&sets_dir)? {
            let entry = entry?;
            let text = fs::read_to_string(entry.path())?;
            let snapshot: rnbo_db::SetSnapshot = serde_json::from_str(&text)
                .map_err(|e| PackageCommandError::Malformed(e.to_string()))?;
            let name = entry
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("set")
                .to_string();
            SetQuery::save(db, &name, &snapshot)
                .map_err(|e| PackageCommandError::Io(e.to_string()))?;
            sets_imported.push(name);
        }
    }

    Ok(InstallReport { patchers_imported, sets_imported })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build, BuildRequest};

    #[test]
    fn install_rejects_mismatched_rnbo_version() {
        let package_dir = tempfile::tempdir().unwrap();
        let request = BuildRequest {
            name: "myset".to_string(),
            runner_version: "1.0.0".to_string(),
            rnbo_version: "1.3.0".to_string(),
            target_id: "x86_64-linux-gcc-12".to_string(),
            system_pretty_name: None,
            patchers: vec![],
            set_json_paths: vec![],
            datafile_paths: vec![],
            include_binaries: true,
            include_sources: true,
            include_presets: true,
        };
        let archive = build(package_dir.path(), &request, false).unwrap();

        let dest_root = tempfile::tempdir().unwrap();
        let destinations = InstallDestinations {
            patcher_lib_dir: dest_root.path().join("lib"),
            source_dir: dest_root.path().join("src"),
            datafile_dir: dest_root.path().join("data"),
        };
        let db = Db::in_memory().unwrap();

        let result = install(&archive, "9.9.9", &destinations, &db);
        assert!(matches!(result, Err(PackageCommandError::Malformed(_))));
    }

    #[test]
    fn install_succeeds_with_matching_version() {
        let package_dir = tempfile::tempdir().unwrap();
        let request = BuildRequest {
            name: "myset".to_string(),
            runner_version: "1.0.0".to_string(),
            rnbo_version: "1.3.0".to_string(),
            target_id: "x86_64-linux-gcc-12".to_string(),
            system_pretty_name: None,
            patchers: vec![],
            set_json_paths: vec![],
            datafile_paths: vec![],
            include_binaries: true,
            include_sources: true,
            include_presets: true,
        };
        let archive = build(package_dir.path(), &request, false).unwrap();

        let dest_root = tempfile::tempdir().unwrap();
        let destinations = InstallDestinations {
            patcher_lib_dir: dest_root.path().join("lib"),
            source_dir: dest_root.path().join("src"),
            datafile_dir: dest_root.path().join("data"),
        };
        let db = Db::in_memory().unwrap();

        let report = install(&archive, "1.3.0", &destinations, &db).unwrap();
        assert!(report.patchers_imported.is_empty());
    }
}
