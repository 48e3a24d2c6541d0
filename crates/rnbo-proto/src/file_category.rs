//! File categories addressable through the file-read/write/delete commands,
//! plus the synthetic read-only categories backed by the persistence store.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    DataFile,
    SourceFile,
    PatcherFile,
    PatcherLib,
    Set,
    Package,
    // Synthetic, read-only: listing-only categories with no on-disk directory.
    Patchers,
    Presets,
    Sets,
    Patcher,
    PatcherConfig,
    Versions,
}

impl FileCategory {
    pub fn is_writable(self) -> bool {
        matches!(
            self,
            FileCategory::DataFile
                | FileCategory::SourceFile
                | FileCategory::PatcherFile
                | FileCategory::PatcherLib
                | FileCategory::Set
                | FileCategory::Package
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileCategory::DataFile => "datafile",
            FileCategory::SourceFile => "sourcefile",
            FileCategory::PatcherFile => "patcherfile",
            FileCategory::PatcherLib => "patcherlib",
            FileCategory::Set => "set",
            FileCategory::Package => "package",
            FileCategory::Patchers => "patchers",
            FileCategory::Presets => "presets",
            FileCategory::Sets => "sets",
            FileCategory::Patcher => "patcher",
            FileCategory::PatcherConfig => "patcherconfig",
            FileCategory::Versions => "versions",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "datafile" => Ok(FileCategory::DataFile),
            "sourcefile" => Ok(FileCategory::SourceFile),
            "patcherfile" => Ok(FileCategory::PatcherFile),
            "patcherlib" => Ok(FileCategory::PatcherLib),
            "set" => Ok(FileCategory::Set),
            "package" => Ok(FileCategory::Package),
            "patchers" => Ok(FileCategory::Patchers),
            "presets" => Ok(FileCategory::Presets),
            "sets" => Ok(FileCategory::Sets),
            "patcher" => Ok(FileCategory::Patcher),
            "patcherconfig" => Ok(FileCategory::PatcherConfig),
            "versions" => Ok(FileCategory::Versions),
            other => Err(format!("unknown file category: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for cat in [
            FileCategory::DataFile,
            FileCategory::SourceFile,
            FileCategory::PatcherFile,
            FileCategory::PatcherLib,
            FileCategory::Set,
            FileCategory::Package,
            FileCategory::Patchers,
            FileCategory::Presets,
            FileCategory::Sets,
            FileCategory::Patcher,
            FileCategory::PatcherConfig,
            FileCategory::Versions,
        ] {
            let parsed: FileCategory = cat.as_str().parse().unwrap();
            assert_eq!(parsed.as_str(), cat.as_str());
        }
    }

    #[test]
    fn synthetic_categories_are_not_writable() {
        assert!(!FileCategory::Patchers.is_writable());
        assert!(!FileCategory::Versions.is_writable());
        assert!(FileCategory::DataFile.is_writable());
    }

    #[test]
    fn unknown_category_errors() {
        assert!("bogus".parse::<FileCategory>().is_err());
    }
}
