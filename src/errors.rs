use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmdError {
    #[error("failed to spawn: {error}")]
    ErrSpawn { error: std::io::Error },

    #[error("exited with status {code}: {stderr}")]
    ErrExit { code: i32, stderr: String },

    #[error("terminated by signal")]
    ErrSignal,

    #[error("output is not utf-8")]
    ErrOutput,
}

#[derive(Debug, Error)]
pub enum AlbiusError {
    #[error("no such file: {1}")]
    NoSuchFile(std::io::Error, String),

    #[error("file error: {1}")]
    FileError(std::io::Error, String),

    #[error("shell command failed: {context}: {error}")]
    CmdFailed { error: CmdError, context: String },

    #[error("bad cli arguments: {0}")]
    BadArgs(String),

    #[error("no such device: {0}")]
    DeviceNotFound(String),

    #[error("device {0} is already a physical volume")]
    AlreadyInitialized(String),

    #[error("reference does not name exactly one volume: {0}")]
    AmbiguousReference(String),

    #[error("insufficient space on {device}: {diagnostic}")]
    InsufficientSpace { device: String, diagnostic: String },

    #[error("volume {device} is in use: {diagnostic}")]
    VolumeInUse { device: String, diagnostic: String },

    #[error("volume group {0} already exists")]
    DuplicateName(String),

    #[error("volume group {0} needs at least one physical volume")]
    EmptyMembership(String),

    #[error("invalid volume group name: {0}")]
    InvalidName(String),

    #[error("failed to parse {report} report: {msg}")]
    ParseError { report: &'static str, msg: String },

    #[error("{tool} failed: {diagnostic}")]
    ExternalTool { tool: String, diagnostic: String },

    #[error("albius-rs bug: {0}")]
    AlbiusBug(String),
}

impl AlbiusError {
    /// Raw diagnostic text of a failed command, if this error carries one
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::CmdFailed {
                error: CmdError::ErrExit { stderr, .. },
                ..
            } => Some(stderr),
            Self::InsufficientSpace { diagnostic, .. }
            | Self::VolumeInUse { diagnostic, .. }
            | Self::ExternalTool { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}
