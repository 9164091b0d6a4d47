use super::Context;
use crate::cli::{CommandsPv, CommandsVg};
use crate::constants::REQUIRED_COMMANDS;
use crate::entity::lvm::{PvRef, ResizeTarget};
use crate::entity::report::Outcome;
use crate::errors::AlbiusError;
use crate::linux::lvm::Lvm;
use crate::utils::shell::Runner;

pub(super) fn run_pv<R: Runner>(
    ctx: &Context,
    runner: R,
    separator: &str,
    cmd: CommandsPv,
) -> Result<Outcome, AlbiusError> {
    let lvm = handle(ctx, runner, separator)?;

    let outcome = match cmd {
        CommandsPv::Create { device } => {
            lvm.create_pv(&device)?;
            Outcome::CreatedPv(device)
        }
        CommandsPv::List => Outcome::Pvs(lvm.list_pvs()?),
        CommandsPv::Resize(args) => {
            let target = ResizeTarget::from(args.size);
            lvm.resize_pv(args.device.as_str(), target)?;

            Outcome::ResizedPv {
                pv: args.device,
                target,
            }
        }
        CommandsPv::Remove { device } => {
            lvm.remove_pv(device.as_str())?;
            Outcome::RemovedPv(device)
        }
    };

    lvm.dispose();
    Ok(outcome)
}

pub(super) fn run_vg<R: Runner>(
    ctx: &Context,
    runner: R,
    separator: &str,
    cmd: CommandsVg,
) -> Result<Outcome, AlbiusError> {
    let lvm = handle(ctx, runner, separator)?;

    let outcome = match cmd {
        CommandsVg::Create { name, pvs } => {
            lvm.create_vg(&name, pvs.iter().map(PvRef::from))?;
            Outcome::CreatedVg { vg: name, pvs }
        }
        CommandsVg::List => Outcome::Vgs(lvm.list_vgs()?),
    };

    lvm.dispose();
    Ok(outcome)
}

fn handle<R: Runner>(ctx: &Context, runner: R, separator: &str) -> Result<Lvm<R>, AlbiusError> {
    ctx.check_commands(&REQUIRED_COMMANDS)?;

    Lvm::with_root(runner, ctx.root).separator(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::shell::test_utils::MockRunner;

    fn ctx() -> Context<'static> {
        // Dry-run context skips PATH lookups, the mock stands in for the tools
        Context {
            root: Some("/mnt"),
            dry_run: true,
            chroot_program: "arch-chroot",
        }
    }

    #[test]
    fn test_run_pv() {
        let mock = MockRunner::new()
            .respond(Err("Failed to find physical volume \"/dev/sdb1\"."))
            .respond(Ok(""))
            .respond(Ok("  /dev/sdb1,,lvm2,---,10.00g,10.00g\n"));

        let outcome = run_pv(
            &ctx(),
            &mock,
            ",",
            CommandsPv::Create {
                device: "/dev/sdb1".to_string(),
            },
        )
        .unwrap();
        assert!(matches!(outcome, Outcome::CreatedPv(pv) if pv == "/dev/sdb1"));

        match run_pv(&ctx(), &mock, ",", CommandsPv::List).unwrap() {
            Outcome::Pvs(pvs) => {
                assert_eq!(1, pvs.len());
                assert_eq!("/dev/sdb1", pvs[0].path);
            }
            outcome => panic!("unexpected outcome {outcome:?}"),
        }

        let calls = mock.calls();
        assert_eq!(3, calls.len());
        assert_eq!("pvcreate", calls[1].cmd);
        assert_eq!(Some("/mnt".to_string()), calls[0].root);
    }

    #[test]
    fn test_run_vg() {
        let mock = MockRunner::new();

        let outcome = run_vg(
            &ctx(),
            &mock,
            ",",
            CommandsVg::Create {
                name: "data".to_string(),
                pvs: vec!["/dev/sdb1".to_string(), "/dev/sdc1".to_string()],
            },
        )
        .unwrap();

        match outcome {
            Outcome::CreatedVg { vg, pvs } => {
                assert_eq!("data", vg);
                assert_eq!(vec!["/dev/sdb1", "/dev/sdc1"], pvs);
            }
            outcome => panic!("unexpected outcome {outcome:?}"),
        }

        assert_eq!(
            vec!["data", "/dev/sdb1", "/dev/sdc1"],
            mock.calls()[0].args
        );

        assert!(matches!(
            run_vg(&ctx(), &mock, "", CommandsVg::List),
            Err(AlbiusError::BadArgs(_))
        ));
    }
}
