//! `info.json`: the manifest at the root of every `.rnbopack` archive.

use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub schema_version: u32,
    pub name: String,
    pub runner_version: String,
    pub rnbo_version: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_pretty_name: Option<String>,
    #[serde(default)]
    pub sets: Vec<String>,
    #[serde(default)]
    pub patchers: Vec<String>,
    #[serde(default)]
    pub datafiles: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
}

/// Sanitized `processor-system-compiler-version`, e.g. `aarch64-linux-gcc-12.2`.
pub fn target_id(processor: &str, system: &str, compiler: &str, compiler_version: &str) -> String {
    let sanitize = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' })
            .collect()
    };
    format!(
        "{}-{}-{}-{}",
        sanitize(processor),
        sanitize(system),
        sanitize(compiler),
        sanitize(compiler_version)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_id_sanitizes_each_component() {
        assert_eq!(
            target_id("aarch64", "linux gnu", "gcc", "12.2.0"),
            "aarch64-linux-gnu-gcc-12.2.0"
        );
    }

    #[test]
    fn info_round_trips_through_json() {
        let info = PackageInfo {
            schema_version: SCHEMA_VERSION,
            name: "myset".to_string(),
            runner_version: "1.0.0".to_string(),
            rnbo_version: "1.3.0".to_string(),
            target_id: "x86_64-linux-gcc-12".to_string(),
            system_pretty_name: Some("Studio PC".to_string()),
            sets: vec!["main".to_string()],
            patchers: vec!["synth".to_string()],
            datafiles: vec![],
            targets: vec!["x86_64-linux-gcc-12".to_string()],
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: PackageInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "myset");
    }
}
