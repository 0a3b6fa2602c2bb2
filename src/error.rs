use parse_display::Display;

/// The receiving side of a command channel has been dropped.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("command channel is closed")]
#[non_exhaustive]
pub struct ChannelClosed {}

impl std::error::Error for ChannelClosed {}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ConfigError {
    #[display("{var}: unknown manager `{value}` (expected atom, proxy or selector)")]
    UnknownManager { var: &'static str, value: String },
    #[display("{var}: `{value}` is not a positive number of milliseconds")]
    InvalidTick { var: &'static str, value: String },
}

impl std::error::Error for ConfigError {}
