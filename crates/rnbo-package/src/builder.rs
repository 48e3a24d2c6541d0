//! Assembles the package's directory tree and tars it into a `.rnbopack`.

use std::fs;
use std::path::{Path, PathBuf};

use rnbo_proto::error::PackageCommandError;

use crate::info::{PackageInfo, SCHEMA_VERSION};

pub struct PatcherInclude {
    pub name: String,
    pub library_path: PathBuf,
    pub source_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub preset_paths: Vec<PathBuf>,
}

pub struct BuildRequest {
    pub name: String,
    pub runner_version: String,
    pub rnbo_version: String,
    pub target_id: String,
    pub system_pretty_name: Option<String>,
    pub patchers: Vec<PatcherInclude>,
    pub set_json_paths: Vec<PathBuf>,
    pub datafile_paths: Vec<PathBuf>,
    pub include_binaries: bool,
    pub include_sources: bool,
    pub include_presets: bool,
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

/// Builds (or reuses, if `force` is false and the archive already exists)
/// `<package_dir>/<rnbo_version>/<sanitized-name>-rnbo-<version>.rnbopack`.
pub fn build(
    package_dir: &Path,
    request: &BuildRequest,
    force: bool,
) -> Result<PathBuf, PackageCommandError> {
    let version_dir = package_dir.join(&request.rnbo_version);
    fs::create_dir_all(&version_dir)?;

    let archive_path = version_dir.join(format!(
        "{}-rnbo-{}.rnbopack",
        sanitize_name(&request.name),
        request.rnbo_version
    ));
    if archive_path.exists() && !force {
        log::info!("reusing existing package at {}", archive_path.display());
        return Ok(archive_path);
    }

    let staging = tempfile::tempdir()?;
    let root = staging.path();

    let mut info = PackageInfo {
        schema_version: SCHEMA_VERSION,
        name: request.name.clone(),
        runner_version: request.runner_version.clone(),
        rnbo_version: request.rnbo_version.clone(),
        target_id: request.target_id.clone(),
        system_pretty_name: request.system_pretty_name.clone(),
        sets: Vec::new(),
        patchers: Vec::new(),
        datafiles: Vec::new(),
        targets: vec![request.target_id.clone()],
    };

    let patchers_dir = root.join("targets").join(&request.target_id).join("patchers");
    let src_dir = root.join("src");
    let presets_dir = root.join("presets");
    let sets_dir = root.join("sets");
    let datafiles_dir = root.join("datafiles");

    for patcher in &request.patchers {
        info.patchers.push(patcher.name.clone());

        if request.include_binaries {
            fs::create_dir_all(&patchers_dir)?;
            let dest = patchers_dir.join(patcher.library_path.file_name().unwrap_or_default());
            fs::copy(&patcher.library_path, dest)?;
        }

        if request.include_sources {
            if let Some(source) = &patcher.source_path {
                fs::create_dir_all(&src_dir)?;
                let dest = src_dir.join(source.file_name().unwrap_or_default());
                fs::copy(source, dest)?;
            }
            if let Some(config) = &patcher.config_path {
                fs::create_dir_all(&src_dir)?;
                let dest = src_dir.join(config.file_name().unwrap_or_default());
                fs::copy(config, dest)?;
            }
        }

        if request.include_presets {
            let patcher_presets = presets_dir.join(&patcher.name);
            for preset in &patcher.preset_paths {
                fs::create_dir_all(&patcher_presets)?;
                let dest = patcher_presets.join(preset.file_name().unwrap_or_default());
                fs::copy(preset, dest)?;
            }
        }
    }

    for set_path in &request.set_json_paths {
        fs::create_dir_all(&sets_dir)?;
        let dest = sets_dir.join(set_path.file_name().unwrap_or_default());
        fs::copy(set_path, &dest)?;
        info.sets.push(
            set_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string(),
        );
    }

    for datafile in &request.datafile_paths {
        fs::create_dir_all(&datafiles_dir)?;
        let dest = datafiles_dir.join(datafile.file_name().unwrap_or_default());
        fs::copy(datafile, &dest)?;
        info.datafiles.push(
            datafile
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string(),
        );
    }

    let info_path = root.join("info.json");
    fs::write(&info_path, serde_json::to_vec_pretty(&info)?)?;

    let tar_file = fs::File::create(&archive_path)?;
    let mut tar_builder = tar::Builder::new(tar_file);
    tar_builder.append_dir_all(".", root)?;
    tar_builder.finish()?;

    log::info!("built package at {}", archive_path.display());
    Ok(archive_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> BuildRequest {
        BuildRequest {
            name: name.to_string(),
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
        }
    }

    #[test]
    fn builds_an_archive_containing_info_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = build(dir.path(), &request("myset"), false).unwrap();
        assert!(path.exists());

        let file = fs::File::open(&path).unwrap();
        let mut archive = tar::Archive::new(file);
        let has_info = archive
            .entries()
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.path().map(|p| p.ends_with("info.json")).unwrap_or(false));
        assert!(has_info);
    }

    #[test]
    fn repackaging_is_skipped_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let first = build(dir.path(), &request("myset"), false).unwrap();
        let modified_at = fs::metadata(&first).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = build(dir.path(), &request("myset"), false).unwrap();
        assert_eq!(fs::metadata(&second).unwrap().modified().unwrap(), modified_at);

        let third = build(dir.path(), &request("myset"), true).unwrap();
        assert!(fs::metadata(&third).unwrap().modified().unwrap() >= modified_at);
    }
}
