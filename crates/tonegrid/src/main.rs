use clap::{Parser, Subcommand};
use relm4::prelude::*;
use sectors::Session;
use std::io::Write;
use std::os::unix::net::UnixStream;
use tonegrid::audio::SinePlayer;
use tonegrid::config;
use tonegrid::events::RemoteCommand;
use tonegrid::gui::CANVAS_SIZE;
use tonegrid::gui::app::AppModel;
use tonegrid::sys::runtime;
use tonegrid::sys::server::SOCKET_PATH;

#[derive(Parser, Debug)]
#[command(name = "tonegrid", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Remote control for an instance that is already running.
#[derive(Subcommand, Debug, Clone, Copy)]
enum Commands {
    /// Toggle passive playback
    Passive,
    /// Toggle learning mode
    Learn,
    /// Show or hide sector colours
    Colors,
    /// Stop passive playback and learning
    Stop,
}

impl From<Commands> for RemoteCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Passive => RemoteCommand::Passive,
            Commands::Learn => RemoteCommand::Learn,
            Commands::Colors => RemoteCommand::Colors,
            Commands::Stop => RemoteCommand::Stop,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        return send_command(command.into());
    }

    let settings = config::load_or_default();
    let session = Session::new(
        settings.grid(),
        settings.show_colors,
        Box::new(SinePlayer::spawn()),
    )
    .with_canvas(CANVAS_SIZE as f64, CANVAS_SIZE as f64);

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx);

    // GTK would otherwise try to parse our own arguments
    let app = RelmApp::new("org.tonegrid.ToneGrid").with_args(Vec::new());

    app.run::<AppModel>((session, settings, rx));
    Ok(())
}

fn send_command(command: RemoteCommand) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to tonegrid at {}: {}. Is it running?",
            SOCKET_PATH,
            e
        )
    })?;

    writeln!(stream, "{}", command)?;
    Ok(())
}
