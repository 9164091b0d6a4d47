use crate::errors::AlbiusError;
use crate::utils::shell::in_path;

/// Checks that the programs albius-rs shells out to are available.
///
/// With a target root, only the chroot program is looked up on the host,
/// since everything else runs inside the target.
pub fn check(root: Option<&str>, chroot_program: &str, commands: &[&str]) -> Result<(), AlbiusError> {
    let on_host: &[&str] = match root {
        None | Some("") | Some("/") => commands,
        Some(_) => std::slice::from_ref(&chroot_program),
    };

    for cmd in on_host {
        if !in_path(cmd) {
            return Err(AlbiusError::CmdFailed {
                error: crate::errors::CmdError::ErrSpawn {
                    error: std::io::Error::from(std::io::ErrorKind::NotFound),
                },
                context: format!("missing required command {cmd}"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check() {
        assert!(check(None, "arch-chroot", &["sh"]).is_ok());
        assert!(check(Some("/"), "arch-chroot", &["sh"]).is_ok());

        let err = check(None, "arch-chroot", &["sh", "albius-no-such-program"]);
        assert!(matches!(err, Err(AlbiusError::CmdFailed { context, .. }) if context.contains("albius-no-such-program")));

        // Target commands are not looked up on the host
        assert!(check(Some("/mnt"), "sh", &["albius-no-such-program"]).is_ok());
        assert!(check(Some("/mnt"), "albius-no-such-chroot", &["sh"]).is_err());
    }
}
