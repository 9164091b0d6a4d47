use std::env;
use std::fs;
use std::process::Command;

use crate::constants::defaults;
use crate::errors::{AlbiusError, CmdError};

/// Runs external programs on behalf of the volume manager
/// and the bootloader configurator.
///
/// `root` selects where the command runs: `None`, `""` and `"/"`
/// mean the live host, anything else is a target root to chroot into.
pub trait Runner {
    /// Runs `cmd` with `args` and returns its captured stdout.
    /// Non-zero exits must fail with the tool's raw stderr attached.
    fn run(&self, cmd: &str, args: &[&str], root: Option<&str>) -> Result<String, AlbiusError>;
}

impl<R: Runner + ?Sized> Runner for &R {
    fn run(&self, cmd: &str, args: &[&str], root: Option<&str>) -> Result<String, AlbiusError> {
        (**self).run(cmd, args, root)
    }
}

impl<R: Runner + ?Sized> Runner for Box<R> {
    fn run(&self, cmd: &str, args: &[&str], root: Option<&str>) -> Result<String, AlbiusError> {
        (**self).run(cmd, args, root)
    }
}

/// Runs commands for real, either on the host or via a chroot program
#[derive(Debug, Clone)]
pub struct ShellRunner {
    chroot_program: String,
}

impl ShellRunner {
    pub fn new(chroot_program: &str) -> Self {
        Self {
            chroot_program: chroot_program.to_string(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(defaults::CHROOT_PROGRAM)
    }
}

impl Runner for ShellRunner {
    fn run(&self, cmd: &str, args: &[&str], root: Option<&str>) -> Result<String, AlbiusError> {
        match chroot_target(root) {
            None => exec(cmd, args),
            Some(location) => {
                let mut chroot_args = vec![location, cmd];
                chroot_args.extend_from_slice(args);

                exec(&self.chroot_program, &chroot_args)
            }
        }
    }
}

/// Only prints commands, never runs them.
/// Every command "succeeds" with empty output.
#[derive(Debug, Clone, Default)]
pub struct DryRunner;

impl Runner for DryRunner {
    fn run(&self, cmd: &str, args: &[&str], root: Option<&str>) -> Result<String, AlbiusError> {
        match chroot_target(root) {
            None => tracing::info!(cmd = %cmdline(cmd, args), "dry-run"),
            Some(location) => {
                tracing::info!(root = location, cmd = %cmdline(cmd, args), "dry-run (chroot)")
            }
        }

        Ok(String::new())
    }
}

#[inline]
fn chroot_target(root: Option<&str>) -> Option<&str> {
    match root {
        None | Some("") | Some("/") => None,
        Some(location) => Some(location),
    }
}

/// Shell-quoted representation of a command, for logs and reports
pub fn cmdline(cmd: &str, args: &[&str]) -> String {
    let parts = std::iter::once(cmd).chain(args.iter().copied());

    // try_join only fails on nul bytes, which cannot be passed to exec anyway
    shlex::try_join(parts.clone()).unwrap_or_else(|_| parts.collect::<Vec<_>>().join(" "))
}

/// Executes `cmd` with `args` and returns stdout.
/// The C locale is forced so that reports and diagnostics are stable.
pub fn exec(cmd: &str, args: &[&str]) -> Result<String, AlbiusError> {
    let cmd_str = cmdline(cmd, args);
    tracing::debug!(cmd = %cmd_str, "exec");

    let output = Command::new(cmd)
        .args(args)
        .env("LC_ALL", "C")
        .output()
        .map_err(|err| AlbiusError::CmdFailed {
            error: CmdError::ErrSpawn { error: err },
            context: format!("command {cmd} failed to spawn"),
        })?;

    match output.status.code() {
        Some(0) => String::from_utf8(output.stdout).map_err(|_| AlbiusError::CmdFailed {
            error: CmdError::ErrOutput,
            context: format!("command {cmd} wrote non utf-8 output"),
        }),

        // Spawned but failed
        Some(code) => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(cmd = %cmd_str, code, stderr = %stderr, "command failed");

            Err(AlbiusError::CmdFailed {
                error: CmdError::ErrExit { code, stderr },
                context: format!("command {cmd} exited with non-zero status {code}"),
            })
        }

        None => Err(AlbiusError::CmdFailed {
            error: CmdError::ErrSignal,
            context: format!("command {cmd} terminated by signal"),
        }),
    }
}

pub fn in_path(program: &str) -> bool {
    if let Ok(path) = env::var("PATH") {
        for p in path.split(':') {
            let p_str = format!("{}/{}", p, program);
            if fs::metadata(p_str).is_ok() {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
#[allow(unused)]
pub mod test_utils {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use humanize_rs::bytes::Bytes;

    use super::{exec, Runner};
    use crate::errors::{AlbiusError, CmdError};

    #[derive(Debug, Clone, PartialEq)]
    pub struct Call {
        pub cmd: String,
        pub args: Vec<String>,
        pub root: Option<String>,
    }

    /// Records every call and replays canned results in order.
    /// `Err(stderr)` becomes a non-zero exit carrying stderr.
    /// Once the queue is drained, calls succeed with empty output.
    #[derive(Default)]
    pub struct MockRunner {
        pub calls: RefCell<Vec<Call>>,
        responses: RefCell<VecDeque<Result<String, String>>>,
    }

    impl MockRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, response: Result<&str, &str>) -> Self {
            self.responses
                .borrow_mut()
                .push_back(response.map(String::from).map_err(String::from));

            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }
    }

    impl Runner for MockRunner {
        fn run(&self, cmd: &str, args: &[&str], root: Option<&str>) -> Result<String, AlbiusError> {
            self.calls.borrow_mut().push(Call {
                cmd: cmd.to_string(),
                args: args.iter().map(|s| s.to_string()).collect(),
                root: root.map(String::from),
            });

            match self.responses.borrow_mut().pop_front() {
                None => Ok(String::new()),
                Some(Ok(stdout)) => Ok(stdout),
                Some(Err(stderr)) => Err(AlbiusError::CmdFailed {
                    error: CmdError::ErrExit { code: 5, stderr },
                    context: format!("command {cmd} exited with non-zero status 5"),
                }),
            }
        }
    }

    pub fn dd(infile: &str, outfile: &str, bs: &str, count: usize) -> Result<(), AlbiusError> {
        // Check if bs is valid block size string
        bs.parse::<Bytes>()
            .map_err(|err| AlbiusError::AlbiusBug(format!("bad bs {bs} for dd: {err}")))?;

        exec(
            "dd",
            &[
                &format!("if={infile}"),
                &format!("of={outfile}"),
                &format!("bs={bs}"),
                &format!("count={count}"),
            ],
        )
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::MockRunner;
    use super::*;

    #[test]
    fn test_chroot_target() {
        assert_eq!(None, chroot_target(None));
        assert_eq!(None, chroot_target(Some("")));
        assert_eq!(None, chroot_target(Some("/")));
        assert_eq!(Some("/mnt/target"), chroot_target(Some("/mnt/target")));
    }

    #[test]
    fn test_cmdline_quotes_args() {
        assert_eq!("pvs --noheadings", cmdline("pvs", &["--noheadings"]));
        assert_eq!(
            "grub-mkconfig -o '/boot/my grub.cfg'",
            cmdline("grub-mkconfig", &["-o", "/boot/my grub.cfg"])
        );
    }

    #[test]
    fn test_exec_captures_stdout() {
        if !in_path("echo") {
            println!("WARN: skipping exec test - no echo in path");
            return;
        }

        let out = exec("echo", &["hello, world!"]).expect("failed to execute echo");
        assert_eq!("hello, world!\n", out);
    }

    #[test]
    fn test_exec_non_zero_exit() {
        if !in_path("sh") {
            println!("WARN: skipping exec test - no sh in path");
            return;
        }

        let err = exec("sh", &["-c", "echo oops >&2; exit 3"]).unwrap_err();
        match err {
            AlbiusError::CmdFailed {
                error: CmdError::ErrExit { code, stderr },
                ..
            } => {
                assert_eq!(3, code);
                assert_eq!("oops", stderr);
            }
            err => panic!("unexpected error {err:?}"),
        }
    }

    #[test]
    fn test_exec_no_such_program() {
        let err = exec("albius-no-such-program", &[]).unwrap_err();
        assert!(matches!(
            err,
            AlbiusError::CmdFailed {
                error: CmdError::ErrSpawn { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_dry_runner_returns_empty() {
        let out = DryRunner
            .run("pvcreate", &["/dev/sda1"], Some("/mnt"))
            .expect("dry runner never fails");

        assert!(out.is_empty());
    }

    #[test]
    fn test_runner_by_ref() {
        fn run_twice<R: Runner>(runner: R) -> String {
            runner.run("pvs", &[], None).unwrap() + &runner.run("vgs", &[], None).unwrap()
        }

        let mock = MockRunner::new().respond(Ok("pv")).respond(Ok("vg"));

        assert_eq!("pvvg", run_twice(&mock));
        assert_eq!(2, mock.calls().len());
    }
}
