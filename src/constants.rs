pub mod defaults {
    pub const CHROOT_PROGRAM: &str = "arch-chroot";
    pub const SEPARATOR: &str = ",";
    pub const BOOT_DIRECTORY: &str = "/boot";
    pub const GRUB_CFG: &str = "/boot/grub/grub.cfg";
}

pub const ENV_ALBIUS_ROOT: &str = "ALBIUS_ROOT";

pub mod grub {
    /// Relative to the target root
    pub const CONFIG_FILE: &str = "etc/default/grub";
    pub const SCRIPTS_DIR: &str = "etc/grub.d";

    pub const TARGET_BIOS: &str = "i386-pc";
    pub const TARGET_EFI: &str = "x86_64-efi";
}

pub mod lvm {
    pub const PVCREATE: &str = "pvcreate";
    pub const PVS: &str = "pvs";
    pub const PVRESIZE: &str = "pvresize";
    pub const PVREMOVE: &str = "pvremove";
    pub const VGCREATE: &str = "vgcreate";
    pub const VGS: &str = "vgs";

    // Report sizes in GiB, which is what PhysicalVolume and VolumeGroup hold
    pub const UNITS: &str = "g";

    pub const PVS_FIELDS: &str = "pv_name,vg_name,pv_fmt,pv_attr,pv_size,pv_free";
    pub const VGS_FIELDS: &str = "vg_name,pv_name,lv_count,vg_attr,vg_size,vg_free";

    // LVM limits VG names to 127 characters
    pub const VG_NAME_MAX: usize = 127;
}

// Use programs instead of bindings to avoid API dependencies
pub const REQUIRED_COMMANDS: [&str; 6] = [
    lvm::PVCREATE,
    lvm::PVS,
    lvm::PVRESIZE,
    lvm::PVREMOVE,
    lvm::VGCREATE,
    lvm::VGS,
];
