mod grub;
mod lvm;

use std::time::Instant;

use colored::Colorize;

use crate::cli;
use crate::entity::report::Report;
use crate::errors::AlbiusError;
use crate::linux;
use crate::utils::shell::{DryRunner, Runner, ShellRunner};

pub fn run(cli_args: cli::Cli) -> Result<(), AlbiusError> {
    let start = Instant::now();

    let cli::Cli {
        commands,
        root,
        dry_run,
        separator,
        chroot_program,
        ..
    } = cli_args;

    if !dry_run && !linux::user::is_root() {
        eprintln!("{}", "WARN: running as non-root user".yellow());
    }

    let runner: Box<dyn Runner> = if dry_run {
        Box::new(DryRunner)
    } else {
        Box::new(ShellRunner::new(&chroot_program))
    };

    let ctx = Context {
        root: root.as_deref(),
        dry_run,
        chroot_program: &chroot_program,
    };

    let outcome = match commands {
        cli::Commands::Pv(cmd) => lvm::run_pv(&ctx, runner, &separator, cmd)?,
        cli::Commands::Vg(cmd) => lvm::run_vg(&ctx, runner, &separator, cmd)?,
        cli::Commands::Grub(cmd) => grub::run(&ctx, runner, cmd)?,
    };

    let report = Report {
        root,
        dry_run,
        outcome,
        duration: start.elapsed(),
    };

    println!("{report}");
    Ok(())
}

/// Global options shared by all subcommands
struct Context<'a> {
    root: Option<&'a str>,
    dry_run: bool,
    chroot_program: &'a str,
}

impl Context<'_> {
    /// Fails early if any of `commands` cannot be run.
    /// Nothing is run during a dry-run, so nothing is checked either.
    fn check_commands(&self, commands: &[&str]) -> Result<(), AlbiusError> {
        if self.dry_run {
            return Ok(());
        }

        crate::sanity::check(self.root, self.chroot_program, commands)
    }

    /// Root for file operations, which default to the live host
    fn fs_root(&self) -> &str {
        self.root.unwrap_or("/")
    }
}
