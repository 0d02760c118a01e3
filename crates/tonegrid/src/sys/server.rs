use crate::events::{AppEvent, RemoteCommand};
use async_channel::Sender;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixListener;

pub const SOCKET_PATH: &str = "/tmp/tonegrid.sock";

pub fn parse_command(line: &str) -> Option<RemoteCommand> {
    RemoteCommand::from_str(line.trim()).ok()
}

pub async fn run_server(tx: Sender<AppEvent>) {
    // Cleanup old socket if it exists
    if std::fs::metadata(SOCKET_PATH).is_ok() {
        let _ = std::fs::remove_file(SOCKET_PATH);
    }

    let listener = match UnixListener::bind(SOCKET_PATH) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind unix socket: {}", e);
            return;
        }
    };

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let reader = BufReader::new(&mut stream);
                    let mut lines = reader.lines();

                    while let Ok(Some(line)) = lines.next_line().await {
                        match parse_command(&line) {
                            Some(command) => {
                                let _ = tx.send(AppEvent::Remote(command)).await;
                            }
                            None => log::warn!("Unknown command on control socket: {:?}", line),
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("Failed to accept connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("passive\n"), Some(RemoteCommand::Passive));
        assert_eq!(parse_command("  LEARN "), Some(RemoteCommand::Learn));
        assert_eq!(parse_command("Colors"), Some(RemoteCommand::Colors));
        assert_eq!(parse_command("show"), None);
        assert_eq!(RemoteCommand::Stop.to_string(), "stop");
    }
}
