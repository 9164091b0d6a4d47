use super::Context;
use crate::cli::CommandsGrub;
use crate::entity::report::Outcome;
use crate::errors::AlbiusError;
use crate::linux::grub::{self, GrubConfig};
use crate::utils::shell::Runner;

pub(super) fn run<R: Runner>(
    ctx: &Context,
    runner: R,
    cmd: CommandsGrub,
) -> Result<Outcome, AlbiusError> {
    let root = ctx.fs_root();

    match cmd {
        CommandsGrub::Get => Ok(Outcome::GrubConfig(grub::get_config(root)?)),

        CommandsGrub::Set(args) => {
            let mut config = if args.replace {
                GrubConfig::new()
            } else {
                grub::get_config(root)?
            };
            config.extend(args.entries);

            if ctx.dry_run {
                tracing::info!(?config, "dry-run: skip writing grub config");
            } else {
                grub::write_config(root, &config)?;
            }

            Ok(Outcome::GrubConfigWritten {
                keys: config.into_keys().collect(),
            })
        }

        CommandsGrub::AddScript { script } => {
            if ctx.dry_run {
                tracing::info!(script, "dry-run: skip adding grub script");
                return Ok(Outcome::GrubScriptAdded(script));
            }

            let dst = grub::add_script(root, &script)?;
            Ok(Outcome::GrubScriptAdded(dst.display().to_string()))
        }

        CommandsGrub::RemoveScript { name } => {
            if ctx.dry_run {
                tracing::info!(name, "dry-run: skip removing grub script");
                return Ok(Outcome::GrubScriptRemoved(name));
            }

            let removed = grub::remove_script(root, &name)?;
            Ok(Outcome::GrubScriptRemoved(removed.display().to_string()))
        }

        CommandsGrub::Install(args) => {
            ctx.check_commands(&["grub-install"])?;
            grub::install(
                &runner,
                root,
                &args.boot_directory,
                &args.disk,
                args.firmware,
            )?;

            Ok(Outcome::GrubInstalled {
                disk: args.disk,
                target: args.firmware.target().to_string(),
            })
        }

        CommandsGrub::Mkconfig { output } => {
            ctx.check_commands(&["grub-mkconfig"])?;
            grub::mkconfig(&runner, root, &output)?;

            Ok(Outcome::GrubMkconfig(output))
        }
    }
}
