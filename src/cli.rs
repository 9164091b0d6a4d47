use clap::{ArgAction, Args, Parser, Subcommand};

use crate::constants::{defaults, ENV_ALBIUS_ROOT};
use crate::entity::parse_size_gib;
use crate::errors::AlbiusError;
use crate::linux::grub::FirmwareType;

#[derive(Debug, Parser)]
#[clap(
    author = "github.com/soyart",
    version,
    about = "Rust-based Albius LVM and GRUB helper"
)]
pub struct Cli {
    #[command(subcommand)]
    pub commands: Commands,

    /// Target system root. Commands run inside it via the chroot program,
    /// and GRUB files are read and written under it
    #[arg(global = true, short = 'r', long = "root", env = ENV_ALBIUS_ROOT)]
    pub root: Option<String>,

    /// Dry-run, albius-rs will not run any commands,
    /// and will just print commands to be run
    #[arg(global = true, short = 'n', long = "dry-run", default_value_t = false)]
    pub dry_run: bool,

    /// Field separator passed to pvs and vgs
    #[arg(
        global = true,
        long = "separator",
        default_value_t = String::from(defaults::SEPARATOR)
    )]
    pub separator: String,

    /// Program used to run commands inside the target root
    #[arg(
        global = true,
        long = "chroot-program",
        value_parser = validate_program,
        default_value_t = String::from(defaults::CHROOT_PROGRAM)
    )]
    pub chroot_program: String,

    /// Log verbosity, repeat for more. RUST_LOG takes precedence
    #[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage LVM physical volumes
    #[command(subcommand)]
    Pv(CommandsPv),

    /// Manage LVM volume groups
    #[command(subcommand)]
    Vg(CommandsVg),

    /// Configure GRUB on the target root
    #[command(subcommand)]
    Grub(CommandsGrub),
}

#[derive(Debug, Subcommand)]
pub enum CommandsPv {
    /// Initialize a block device as a physical volume
    Create {
        #[arg(value_parser = validate_device)]
        device: String,
    },

    /// List physical volumes
    List,

    /// Resize a physical volume
    Resize(ArgsPvResize),

    /// Remove the LVM label from a physical volume
    Remove {
        #[arg(value_parser = validate_device)]
        device: String,
    },
}

#[derive(Debug, Args)]
pub struct ArgsPvResize {
    #[arg(value_parser = validate_device)]
    pub device: String,

    /// New size, in GiB (e.g. 10.5) or with a unit (e.g. 512M).
    /// Omit to grow to the whole device
    #[arg(short = 's', long = "size", value_parser = parse_size_gib)]
    pub size: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum CommandsVg {
    /// Create a volume group from physical volumes
    Create {
        name: String,

        #[arg(required = true, num_args = 1..)]
        pvs: Vec<String>,
    },

    /// List volume groups
    List,
}

#[derive(Debug, Subcommand)]
pub enum CommandsGrub {
    /// Print /etc/default/grub as JSON
    Get,

    /// Set KEY=value entries in /etc/default/grub
    Set(ArgsGrubSet),

    /// Copy a script into the target root, e.g. /etc/grub.d/41_custom
    AddScript {
        #[arg(value_parser = validate_filename)]
        script: String,
    },

    /// Remove a script from /etc/grub.d
    RemoveScript {
        #[arg(value_parser = validate_filename)]
        name: String,
    },

    /// Run grub-install on a disk
    Install(ArgsGrubInstall),

    /// Run grub-mkconfig
    Mkconfig {
        #[arg(
            short = 'o',
            long = "output",
            value_parser = validate_filename,
            default_value_t = String::from(defaults::GRUB_CFG)
        )]
        output: String,
    },
}

#[derive(Debug, Args)]
pub struct ArgsGrubSet {
    #[arg(required = true, value_parser = parse_key_value)]
    pub entries: Vec<(String, String)>,

    /// Discard existing entries instead of merging into them
    #[arg(long = "replace")]
    pub replace: bool,
}

#[derive(Debug, Args)]
pub struct ArgsGrubInstall {
    #[arg(value_parser = validate_device)]
    pub disk: String,

    #[arg(short = 't', long = "firmware", value_enum)]
    pub firmware: FirmwareType,

    #[arg(
        long = "boot-directory",
        value_parser = validate_filename,
        default_value_t = String::from(defaults::BOOT_DIRECTORY)
    )]
    pub boot_directory: String,
}

fn validate_filename(name: &str) -> Result<String, AlbiusError> {
    if name.is_empty() {
        return Err(AlbiusError::BadArgs(String::from("empty filename")));
    }

    Ok(name.to_string())
}

fn validate_device(device: &str) -> Result<String, AlbiusError> {
    if device.is_empty() {
        return Err(AlbiusError::BadArgs(String::from("empty device path")));
    }

    Ok(device.to_string())
}

fn validate_program(program: &str) -> Result<String, AlbiusError> {
    if program.trim().is_empty() {
        return Err(AlbiusError::BadArgs(String::from("empty program name")));
    }

    Ok(program.to_string())
}

fn parse_key_value(s: &str) -> Result<(String, String), AlbiusError> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() && !key.contains(char::is_whitespace) => {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(AlbiusError::BadArgs(format!(
            "expecting KEY=value, got {s:?}"
        ))),
    }
}
