use crate::constants::lvm as tools;
use crate::errors::{AlbiusError, CmdError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Op {
    CreatePv,
    ListPvs,
    ResizePv,
    RemovePv,
    CreateVg,
    ListVgs,
}

impl Op {
    pub(super) fn tool(&self) -> &'static str {
        match self {
            Self::CreatePv => tools::PVCREATE,
            Self::ListPvs => tools::PVS,
            Self::ResizePv => tools::PVRESIZE,
            Self::RemovePv => tools::PVREMOVE,
            Self::CreateVg => tools::VGCREATE,
            Self::ListVgs => tools::VGS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    DeviceNotFound,
    AlreadyInitialized,
    AmbiguousReference,
    InsufficientSpace,
    VolumeInUse,
    DuplicateName,
}

type Rule = (&'static [&'static str], Kind);

const DEVICE_NOT_FOUND: &[&str] = &[
    "no device found",
    "not found",
    "failed to find",
    "no such file",
    "no pv found",
    "no pv label found",
];

const AMBIGUOUS: &[&str] = &["duplicate pv", "multiple devices"];

// First match wins
const RULES_CREATE_PV: &[Rule] = &[
    (
        &[
            "already exists",
            "is already a physical volume",
            "already in volume group",
            "without -ff",
        ],
        Kind::AlreadyInitialized,
    ),
    (AMBIGUOUS, Kind::AmbiguousReference),
    (DEVICE_NOT_FOUND, Kind::DeviceNotFound),
];

const RULES_RESIZE_PV: &[Rule] = &[
    (
        &["cannot resize to", "are allocated", "insufficient"],
        Kind::InsufficientSpace,
    ),
    (AMBIGUOUS, Kind::AmbiguousReference),
    (DEVICE_NOT_FOUND, Kind::DeviceNotFound),
];

const RULES_REMOVE_PV: &[Rule] = &[
    (
        &["is used by vg", "please use vgreduce"],
        Kind::VolumeInUse,
    ),
    (AMBIGUOUS, Kind::AmbiguousReference),
    (DEVICE_NOT_FOUND, Kind::DeviceNotFound),
];

const RULES_CREATE_VG: &[Rule] = &[
    (
        &["volume group called", "already exists"],
        Kind::DuplicateName,
    ),
    (&["is already in volume group"], Kind::VolumeInUse),
    (AMBIGUOUS, Kind::AmbiguousReference),
    (DEVICE_NOT_FOUND, Kind::DeviceNotFound),
    (&["insufficient"], Kind::InsufficientSpace),
];

fn rules(op: Op) -> &'static [Rule] {
    match op {
        Op::CreatePv => RULES_CREATE_PV,
        Op::ResizePv => RULES_RESIZE_PV,
        Op::RemovePv => RULES_REMOVE_PV,
        Op::CreateVg => RULES_CREATE_VG,
        // Listing failures are never about a particular volume
        Op::ListPvs | Op::ListVgs => &[],
    }
}

/// Maps a failed LVM command to a volume error kind.
///
/// `target` is the PV path, or the VG name for vgcreate.
/// `members` are the PV paths passed to vgcreate, empty otherwise.
/// Errors other than command failures are returned unchanged.
pub(super) fn classify(op: Op, target: &str, members: &[&str], err: AlbiusError) -> AlbiusError {
    let diagnostic = match err {
        AlbiusError::CmdFailed {
            error: CmdError::ErrExit { stderr, .. },
            ..
        } => stderr,
        AlbiusError::CmdFailed { error, context } => format!("{context}: {error}"),
        err => return err,
    };

    let lowered = diagnostic.to_lowercase();
    let kind = rules(op)
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|p| lowered.contains(p)))
        .map(|(_, kind)| *kind);

    let device = || culprit(target, members, &diagnostic);

    match kind {
        None => AlbiusError::ExternalTool {
            tool: op.tool().to_string(),
            diagnostic,
        },
        Some(Kind::DeviceNotFound) => AlbiusError::DeviceNotFound(device()),
        Some(Kind::AlreadyInitialized) => AlbiusError::AlreadyInitialized(target.to_string()),
        Some(Kind::AmbiguousReference) => {
            AlbiusError::AmbiguousReference(format!("{}: {diagnostic}", device()))
        }
        Some(Kind::InsufficientSpace) => AlbiusError::InsufficientSpace {
            device: device(),
            diagnostic,
        },
        Some(Kind::VolumeInUse) => AlbiusError::VolumeInUse {
            device: device(),
            diagnostic,
        },
        Some(Kind::DuplicateName) => AlbiusError::DuplicateName(target.to_string()),
    }
}

// Which device the diagnostic complains about: the first member PV it
// mentions, all members if it mentions none, or the target itself
fn culprit(target: &str, members: &[&str], diagnostic: &str) -> String {
    if members.is_empty() {
        return target.to_string();
    }

    members
        .iter()
        .find(|pv| diagnostic.contains(*pv))
        .map(|pv| pv.to_string())
        .unwrap_or_else(|| members.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exit(stderr: &str) -> AlbiusError {
        AlbiusError::CmdFailed {
            error: CmdError::ErrExit {
                code: 5,
                stderr: stderr.to_string(),
            },
            context: "test".to_string(),
        }
    }

    #[test]
    fn test_classify_create_pv() {
        let already = [
            "Can't initialize physical volume \"/dev/sdb1\" of volume group \"data\" without -ff",
            "Physical volume '/dev/sdb1' is already in volume group 'data'",
            "Physical volume \"/dev/sdb1\" already exists",
        ];
        for stderr in already {
            match classify(Op::CreatePv, "/dev/sdb1", &[], exit(stderr)) {
                AlbiusError::AlreadyInitialized(dev) => assert_eq!("/dev/sdb1", dev),
                err => panic!("unexpected error for {stderr}: {err:?}"),
            }
        }

        let missing = [
            "No device found for /dev/sdz1.",
            "Device /dev/sdz1 not found.",
            "Cannot use /dev/sdz1: device not found",
        ];
        for stderr in missing {
            match classify(Op::CreatePv, "/dev/sdz1", &[], exit(stderr)) {
                AlbiusError::DeviceNotFound(dev) => assert_eq!("/dev/sdz1", dev),
                err => panic!("unexpected error for {stderr}: {err:?}"),
            }
        }
    }

    #[test]
    fn test_classify_resize_pv() {
        let err = classify(
            Op::ResizePv,
            "/dev/sdb1",
            &[],
            exit("/dev/sdb1: cannot resize to 1279 extents as 2560 are allocated."),
        );
        assert!(matches!(err, AlbiusError::InsufficientSpace { device, .. } if device == "/dev/sdb1"));

        let err = classify(
            Op::ResizePv,
            "/dev/sdb1",
            &[],
            exit("Failed to find physical volume \"/dev/sdb1\"."),
        );
        assert!(matches!(err, AlbiusError::DeviceNotFound(_)));

        let err = classify(
            Op::ResizePv,
            "/dev/sdb1",
            &[],
            exit("WARNING: Not using device /dev/sdc1 for PV abc. Found duplicate PV abc"),
        );
        assert!(matches!(err, AlbiusError::AmbiguousReference(_)));
    }

    #[test]
    fn test_classify_remove_pv() {
        let err = classify(
            Op::RemovePv,
            "/dev/sdb1",
            &[],
            exit("PV /dev/sdb1 is used by VG data so please use vgreduce first."),
        );
        assert!(matches!(err, AlbiusError::VolumeInUse { .. }));

        for stderr in [
            "No PV found on device /dev/sdb1.",
            "No PV label found on /dev/sdb1.",
        ] {
            let err = classify(Op::RemovePv, "/dev/sdb1", &[], exit(stderr));
            assert!(matches!(err, AlbiusError::DeviceNotFound(_)), "{stderr}");
        }
    }

    #[test]
    fn test_classify_create_vg() {
        let members = ["/dev/loop0p1", "/dev/loop0p2"];

        let err = classify(
            Op::CreateVg,
            "data",
            &members,
            exit("A volume group called data already exists."),
        );
        assert!(matches!(err, AlbiusError::DuplicateName(name) if name == "data"));

        let err = classify(
            Op::CreateVg,
            "data",
            &members,
            exit("No device found for /dev/loop0p2."),
        );
        assert!(matches!(err, AlbiusError::DeviceNotFound(dev) if dev == "/dev/loop0p2"));

        let err = classify(
            Op::CreateVg,
            "data",
            &members,
            exit("Physical volume '/dev/loop0p1' is already in volume group 'other'"),
        );
        assert!(
            matches!(err, AlbiusError::VolumeInUse { device, .. } if device == "/dev/loop0p1")
        );
    }

    #[test]
    fn test_classify_fallback() {
        let stderr = "Can't open /dev/sdb1 exclusively. Mounted filesystem? Device or resource busy";
        match classify(Op::CreatePv, "/dev/sdb1", &[], exit(stderr)) {
            AlbiusError::ExternalTool { tool, diagnostic } => {
                assert_eq!("pvcreate", tool);
                assert_eq!(stderr, diagnostic);
            }
            err => panic!("unexpected error {err:?}"),
        }

        // Listings are never classified
        let err = classify(Op::ListPvs, "", &[], exit("No device found"));
        assert!(matches!(err, AlbiusError::ExternalTool { .. }));

        let err = classify(
            Op::ListVgs,
            "",
            &[],
            AlbiusError::CmdFailed {
                error: CmdError::ErrSignal,
                context: "command vgs terminated by signal".to_string(),
            },
        );
        assert!(matches!(err, AlbiusError::ExternalTool { tool, .. } if tool == "vgs"));
    }

    #[test]
    fn test_classify_passes_other_errors() {
        let err = classify(
            Op::CreatePv,
            "/dev/sdb1",
            &[],
            AlbiusError::BadArgs("foo".to_string()),
        );
        assert!(matches!(err, AlbiusError::BadArgs(_)));
    }
}
