pub mod grub;
pub mod lvm;
pub mod user;
