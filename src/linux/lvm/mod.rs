mod classify;
pub mod parse;

use tracing::Span;

use self::classify::{classify, Op};
use crate::constants::{defaults, lvm as tools};
use crate::entity::lvm::{PhysicalVolume, PvRef, ResizeTarget, VolumeGroup};
use crate::errors::{AlbiusError, CmdError};
use crate::utils::shell::Runner;

/// Handle for LVM PV and VG operations during one installation session.
///
/// The handle keeps no volume state: LVM metadata on disk is the only
/// source of truth, so every listing re-runs the report command and every
/// returned record is a snapshot. Dropping or disposing the handle never
/// touches the system.
pub struct Lvm<R: Runner> {
    runner: R,
    root: Option<String>,
    separator: String,
    span: Span,
}

impl<R: Runner> Lvm<R> {
    /// Manager running LVM tools on the live host
    pub fn new(runner: R) -> Self {
        Self::with_root(runner, None)
    }

    /// Manager running LVM tools inside `root` (chroot),
    /// or on the host if `root` is None
    pub fn with_root(runner: R, root: Option<&str>) -> Self {
        let span = tracing::info_span!("lvm", root = root.unwrap_or("/"));

        Self {
            runner,
            root: root.map(String::from),
            separator: defaults::SEPARATOR.to_string(),
            span,
        }
    }

    /// Field separator passed to `pvs`/`vgs` and used to parse their reports.
    /// It must not contain anything that can appear inside a report field.
    pub fn separator(mut self, separator: &str) -> Result<Self, AlbiusError> {
        if separator.is_empty() || separator.chars().any(in_report_field) {
            return Err(AlbiusError::BadArgs(format!(
                "bad report separator {separator:?}"
            )));
        }

        self.separator = separator.to_string();
        Ok(self)
    }

    /// Executes:
    /// ```shell
    /// pvs --noheadings --units g --separator ${{ sep }} -o ${{ PVS_FIELDS }} ${{ device }}
    /// pvcreate ${{ device }}
    /// ```
    ///
    /// pvcreate is skipped if `device` is already a PV, so calling this
    /// twice fails with AlreadyInitialized and leaves the PV as it was.
    pub fn create_pv(&self, device: &str) -> Result<(), AlbiusError> {
        let _enter = self.span.enter();

        if !is_device_path(device) {
            return Err(AlbiusError::DeviceNotFound(device.to_string()));
        }

        if self.is_pv(device)? {
            tracing::warn!(pv = device, "device is already a physical volume");
            return Err(AlbiusError::AlreadyInitialized(device.to_string()));
        }

        self.exec(tools::PVCREATE, &[device])
            .map_err(|err| classify(Op::CreatePv, device, &[], err))?;

        tracing::info!(pv = device, "created physical volume");
        Ok(())
    }

    /// Executes:
    /// ```shell
    /// pvs --noheadings --units g --separator ${{ sep }} -o ${{ PVS_FIELDS }}
    /// ```
    pub fn list_pvs(&self) -> Result<Vec<PhysicalVolume>, AlbiusError> {
        let _enter = self.span.enter();

        let output = self
            .report(tools::PVS, tools::PVS_FIELDS, &[])
            .map_err(|err| classify(Op::ListPvs, "", &[], err))?;

        let pvs = parse::parse_pvs(&output, &self.separator)?;
        tracing::debug!(count = pvs.len(), "listed physical volumes");

        Ok(pvs)
    }

    /// Executes:
    /// ```shell
    /// pvresize ${{ pv }}
    ///
    /// # or, if target is ResizeTarget::Exact(size):
    ///
    /// pvresize --yes --setphysicalvolumesize ${{ size }}g ${{ pv }}
    /// ```
    pub fn resize_pv<'a, P, T>(&self, pv: P, target: T) -> Result<(), AlbiusError>
    where
        P: Into<PvRef<'a>>,
        T: Into<ResizeTarget>,
    {
        let _enter = self.span.enter();

        let pv = resolve_pv(pv.into())?;
        let target = target.into();

        let size_arg;
        let args: Vec<&str> = match target {
            ResizeTarget::Maximum => vec![pv],
            ResizeTarget::Exact(gib) => {
                // pvresize rounds to 2 decimals, anything below is 0
                if !gib.is_finite() || gib < 0.01 {
                    return Err(AlbiusError::BadArgs(format!(
                        "bad pv size {gib} GiB for {pv}"
                    )));
                }

                size_arg = format!("{gib:.2}{}", tools::UNITS);
                vec!["--yes", "--setphysicalvolumesize", &size_arg, pv]
            }
        };

        self.exec(tools::PVRESIZE, &args)
            .map_err(|err| classify(Op::ResizePv, pv, &[], err))?;

        tracing::info!(pv, ?target, "resized physical volume");
        Ok(())
    }

    /// Executes:
    /// ```shell
    /// pvremove ${{ pv }}
    /// ```
    pub fn remove_pv<'a, P>(&self, pv: P) -> Result<(), AlbiusError>
    where
        P: Into<PvRef<'a>>,
    {
        let _enter = self.span.enter();

        let pv = resolve_pv(pv.into())?;
        self.exec(tools::PVREMOVE, &[pv])
            .map_err(|err| classify(Op::RemovePv, pv, &[], err))?;

        tracing::info!(pv, "removed physical volume");
        Ok(())
    }

    /// Executes:
    /// ```shell
    /// vgcreate ${{ name }} ${{ pvs }}
    /// ```
    pub fn create_vg<'a, I>(&self, name: &str, pvs: I) -> Result<(), AlbiusError>
    where
        I: IntoIterator<Item = PvRef<'a>>,
    {
        let _enter = self.span.enter();

        let pvs = pvs
            .into_iter()
            .map(|pv| {
                resolve_pv(pv).map_err(|err| {
                    tracing::warn!(vg = name, error = %err, "unresolvable pv reference");
                    AlbiusError::DeviceNotFound(pv.raw().to_string())
                })
            })
            .collect::<Result<Vec<&str>, AlbiusError>>()?;

        if pvs.is_empty() {
            return Err(AlbiusError::EmptyMembership(name.to_string()));
        }

        validate_vg_name(name)?;

        let mut args = vec![name];
        args.extend(pvs.iter().copied());

        self.exec(tools::VGCREATE, &args)
            .map_err(|err| classify(Op::CreateVg, name, &pvs, err))?;

        tracing::info!(vg = name, ?pvs, "created volume group");
        Ok(())
    }

    /// Executes:
    /// ```shell
    /// vgs --noheadings --units g --separator ${{ sep }} -o ${{ VGS_FIELDS }}
    /// ```
    pub fn list_vgs(&self) -> Result<Vec<VolumeGroup>, AlbiusError> {
        let _enter = self.span.enter();

        let output = self
            .report(tools::VGS, tools::VGS_FIELDS, &[])
            .map_err(|err| classify(Op::ListVgs, "", &[], err))?;

        let vgs = parse::parse_vgs(&output, &self.separator)?;
        tracing::debug!(count = vgs.len(), "listed volume groups");

        Ok(vgs)
    }

    /// Releases the handle. Volumes created through it are left untouched.
    pub fn dispose(self) {
        let _enter = self.span.enter();
        tracing::debug!("disposing lvm handle");
    }

    fn report(&self, cmd: &str, fields: &str, targets: &[&str]) -> Result<String, AlbiusError> {
        let mut args = vec![
            "--noheadings",
            "--units",
            tools::UNITS,
            "--separator",
            self.separator.as_str(),
            "-o",
            fields,
        ];
        args.extend_from_slice(targets);

        self.exec(cmd, &args)
    }

    // pvcreate re-initializes an orphan PV without complaint, so look first.
    // pvs exits non-zero for a device without a PV label. Any other problem
    // with the device is left for pvcreate to report.
    fn is_pv(&self, device: &str) -> Result<bool, AlbiusError> {
        match self.report(tools::PVS, tools::PVS_FIELDS, &[device]) {
            Ok(output) => Ok(!parse::parse_pvs(&output, &self.separator)?.is_empty()),
            Err(AlbiusError::CmdFailed {
                error: CmdError::ErrExit { .. },
                ..
            }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    #[inline]
    fn exec(&self, cmd: &str, args: &[&str]) -> Result<String, AlbiusError> {
        self.runner.run(cmd, args, self.root.as_deref())
    }
}

// A PV reference must name a device path, or the tool would read it as an option
fn resolve_pv(pv: PvRef<'_>) -> Result<&str, AlbiusError> {
    let path = pv.resolve()?;
    if !is_device_path(path) {
        return Err(AlbiusError::AmbiguousReference(format!(
            "{path:?} is not a device path"
        )));
    }

    Ok(path)
}

// Characters of device paths, sizes, attrs and names in pvs/vgs reports
fn in_report_field(c: char) -> bool {
    c.is_alphanumeric()
        || c.is_whitespace()
        || c.is_control()
        || matches!(c, '-' | '/' | '.' | '_' | '+' | '<' | '>' | '[' | ']')
}

// Device paths are passed to LVM tools as-is, so they must not
// be mistaken for options or carry anything but a path
fn is_device_path(device: &str) -> bool {
    device.starts_with('/')
        && !device
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
}

/// LVM VG names may only contain `a-z A-Z 0-9 + _ . -`,
/// must not start with `-` and must not be `.` or `..`
fn validate_vg_name(name: &str) -> Result<(), AlbiusError> {
    let bad = |msg: &str| Err(AlbiusError::InvalidName(format!("{name:?}: {msg}")));

    if name.is_empty() {
        return bad("empty name");
    }

    if name.len() > tools::VG_NAME_MAX {
        return bad("name too long");
    }

    if name.starts_with('-') {
        return bad("name cannot start with '-'");
    }

    if name == "." || name == ".." {
        return bad("reserved name");
    }

    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-')))
    {
        return bad(&format!("bad character {c:?}"));
    }

    Ok(())
}
