use strum::{Display as StrumDisplay, EnumIter, EnumString};

/// Commands a running instance accepts on its control socket, one per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, StrumDisplay)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum RemoteCommand {
    Passive,
    Learn,
    Colors,
    Stop,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Remote(RemoteCommand),
    ConfigReload,
}
