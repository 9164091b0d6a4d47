use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::grub;
use crate::errors::AlbiusError;
use crate::utils::fs::{file_exists, in_root};
use crate::utils::shell::Runner;

/// Key/value pairs of `/etc/default/grub`, one `KEY=value` per line.
/// Values are kept verbatim: no quoting, no escaping.
pub type GrubConfig = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum FirmwareType {
    #[serde(rename = "bios")]
    Bios,

    #[serde(rename = "efi")]
    Efi,
}

impl FirmwareType {
    /// Value for `grub-install --target`
    pub fn target(&self) -> &'static str {
        match self {
            Self::Bios => grub::TARGET_BIOS,
            Self::Efi => grub::TARGET_EFI,
        }
    }
}

/// Reads `<root>/etc/default/grub`.
/// A missing file is an empty config, not an error.
pub fn get_config(root: &str) -> Result<GrubConfig, AlbiusError> {
    let path = in_root(root, grub::CONFIG_FILE);
    if !file_exists(&path) {
        tracing::debug!(path = %path.display(), "no grub config yet");
        return Ok(GrubConfig::new());
    }

    let content = fs::read_to_string(&path).map_err(|err| {
        AlbiusError::FileError(err, format!("failed to read grub config {}", path.display()))
    })?;

    Ok(parse_config(&content))
}

/// Overwrites `<root>/etc/default/grub` with `config`
pub fn write_config(root: &str, config: &GrubConfig) -> Result<(), AlbiusError> {
    let path = in_root(root, grub::CONFIG_FILE);

    write_file(&path, render_config(config), 0o644)?;
    tracing::info!(path = %path.display(), keys = config.len(), "wrote grub config");

    Ok(())
}

// Last value wins. Blank lines, comments and lines without `=` are skipped.
fn parse_config(content: &str) -> GrubConfig {
    let mut config = GrubConfig::new();

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            config.insert(key.to_string(), value.to_string());
        }
    }

    config
}

fn render_config(config: &GrubConfig) -> String {
    config
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect()
}

/// Copies host script `script_path` to the same path under `root`.
/// The copy is made executable, as grub requires.
pub fn add_script(root: &str, script_path: &str) -> Result<PathBuf, AlbiusError> {
    if !file_exists(script_path) {
        return Err(AlbiusError::NoSuchFile(
            std::io::Error::from(std::io::ErrorKind::NotFound),
            format!("grub script {script_path} does not exist"),
        ));
    }

    let contents = fs::read(script_path).map_err(|err| {
        AlbiusError::FileError(err, format!("failed to read grub script {script_path}"))
    })?;

    let dst = in_root(root, script_path);
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            AlbiusError::FileError(err, format!("failed to create {}", parent.display()))
        })?;
    }

    write_file(&dst, contents, 0o755)?;
    tracing::info!(script = %dst.display(), "added grub script");

    Ok(dst)
}

/// Removes `<root>/etc/grub.d/<name>`
pub fn remove_script(root: &str, name: &str) -> Result<PathBuf, AlbiusError> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(AlbiusError::BadArgs(format!("bad grub script name {name:?}")));
    }

    let path = in_root(root, grub::SCRIPTS_DIR).join(name);
    if !file_exists(&path) {
        return Err(AlbiusError::NoSuchFile(
            std::io::Error::from(std::io::ErrorKind::NotFound),
            format!("grub script {} does not exist", path.display()),
        ));
    }

    fs::remove_file(&path).map_err(|err| {
        AlbiusError::FileError(err, format!("failed to remove grub script {}", path.display()))
    })?;
    tracing::info!(script = %path.display(), "removed grub script");

    Ok(path)
}

/// Executes inside `root`:
/// ```shell
/// grub-install --boot-directory ${{ boot_dir }} --target=${{ target }} ${{ disk }}
/// ```
pub fn install<R: Runner>(
    runner: &R,
    root: &str,
    boot_dir: &str,
    disk: &str,
    firmware: FirmwareType,
) -> Result<(), AlbiusError> {
    let target = format!("--target={}", firmware.target());

    runner
        .run(
            "grub-install",
            &["--boot-directory", boot_dir, &target, disk],
            Some(root),
        )
        .map_err(|err| tool_error("grub-install", err))?;

    tracing::info!(disk, target = firmware.target(), "installed grub");
    Ok(())
}

/// Executes inside `root`:
/// ```shell
/// grub-mkconfig -o ${{ output }}
/// ```
pub fn mkconfig<R: Runner>(runner: &R, root: &str, output: &str) -> Result<(), AlbiusError> {
    runner
        .run("grub-mkconfig", &["-o", output], Some(root))
        .map_err(|err| tool_error("grub-mkconfig", err))?;

    tracing::info!(output, "generated grub menu");
    Ok(())
}

fn tool_error(tool: &str, err: AlbiusError) -> AlbiusError {
    let diagnostic = match err.diagnostic() {
        Some(diagnostic) => diagnostic.to_string(),
        None => err.to_string(),
    };

    AlbiusError::ExternalTool {
        tool: tool.to_string(),
        diagnostic,
    }
}

fn write_file<C: AsRef<[u8]>>(path: &Path, contents: C, mode: u32) -> Result<(), AlbiusError> {
    fs::write(path, contents).map_err(|err| {
        AlbiusError::FileError(err, format!("failed to write {}", path.display()))
    })?;

    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|err| {
        AlbiusError::FileError(err, format!("failed to chmod {}", path.display()))
    })
}
