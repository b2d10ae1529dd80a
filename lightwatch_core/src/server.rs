//! Line-oriented UDP command service over the collected samples.
//!
//! One datagram per request, one blocking receive loop on its own thread.
//! The session remembers the last successful command from any sender and
//! replays it for a blank request. Shutdown is cooperative: the loop polls
//! the shared [`ShutdownFlag`] between receives, using a socket read
//! timeout instead of relying on close-to-unblock semantics.

use crate::buffer::SampleBuffer;
use crate::dips::{DipConfig, count_dips};
use crate::error::{CoreError, Result};
use crate::shutdown::ShutdownFlag;
use eyre::WrapErr;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 12345;

/// Largest payload packed into one outgoing datagram.
const MAX_DATAGRAM: usize = 1500;
/// Receive timeout; bounds how long shutdown can go unnoticed.
const RECV_POLL: Duration = Duration::from_millis(200);
/// Values per line of `history` output.
const HISTORY_PER_LINE: usize = 10;

const HELP_TEXT: &str = "Accepted command examples:\n\
count -- get the total number of samples taken.\n\
length -- get the number of samples taken in the previously completed\n\
second.\n\
dips -- get the number of dips in the previously completed second.\n\
history -- get all the samples in the previously completed second.\n\
stop -- cause the server program to end.\n\
<enter> -- repeat last command.\n";

/// Fixed request vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Help,
    Count,
    Length,
    Dips,
    History,
    Stop,
}

impl Command {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "help" | "?" => Some(Self::Help),
            "count" => Some(Self::Count),
            "length" => Some(Self::Length),
            "dips" => Some(Self::Dips),
            "history" => Some(Self::History),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Per-process session memory: the last successful command (shared across
/// all clients) and the most recent sender.
#[derive(Debug, Default)]
struct Session {
    last: Option<Command>,
    client: Option<SocketAddr>,
}

pub struct CommandServer {
    local_addr: SocketAddr,
    shutdown: ShutdownFlag,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl CommandServer {
    /// Bind and start serving. Bind or spawn failure leaves nothing
    /// running. Pass port 0 to bind an ephemeral port (see
    /// [`CommandServer::local_addr`]).
    pub fn start(port: u16, buffer: SampleBuffer, shutdown: ShutdownFlag) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))
            .map_err(|e| eyre::Report::new(CoreError::Io(e.to_string())))
            .wrap_err_with(|| format!("binding udp port {port}"))?;
        socket
            .set_read_timeout(Some(RECV_POLL))
            .wrap_err("setting receive timeout")?;
        let local_addr = socket.local_addr().wrap_err("reading bound address")?;

        let shutdown_clone = shutdown.clone();
        let join_handle = std::thread::Builder::new()
            .name("lightwatch-server".into())
            .spawn(move || serve(socket, buffer, shutdown_clone))
            .wrap_err("spawning command server thread")?;

        tracing::info!(%local_addr, "command server listening");
        Ok(Self {
            local_addr,
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    /// The bound address; useful when started with port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Request shutdown on the shared flag and wait for the receive loop
    /// to observe it and exit (bounded by the receive timeout).
    pub fn stop(&mut self) {
        self.shutdown.request();
        if let Some(handle) = self.join_handle.take() {
            if let Err(e) = handle.join() {
                tracing::warn!(?e, "command server thread panicked during shutdown");
            }
        }
    }
}

impl Drop for CommandServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn serve(socket: UdpSocket, buffer: SampleBuffer, shutdown: ShutdownFlag) {
    let mut session = Session::default();
    let mut buf = [0u8; 1024];

    loop {
        if shutdown.is_requested() {
            break;
        }
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted) => {
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "receive failed");
                continue;
            }
        };

        let text = String::from_utf8_lossy(&buf[..len]);
        let line = text.trim_end_matches(['\r', '\n']);
        if session.client != Some(peer) {
            tracing::debug!(%peer, "serving new client");
            session.client = Some(peer);
        }

        let command = if line.trim().is_empty() {
            match session.last {
                Some(cmd) => cmd,
                None => {
                    send(&socket, peer, "(no last command)\n");
                    continue;
                }
            }
        } else {
            match Command::parse(line) {
                Some(cmd) => cmd,
                None => {
                    send(&socket, peer, &format!("Unknown: \"{line}\". Try 'help'.\n"));
                    continue;
                }
            }
        };

        match command {
            Command::Help => send(&socket, peer, HELP_TEXT),
            Command::Count => send(
                &socket,
                peer,
                &format!("# samples taken total: {}\n", buffer.total_count()),
            ),
            Command::Length => send(
                &socket,
                peer,
                &format!("# samples taken last second: {}\n", buffer.history_len()),
            ),
            Command::Dips => {
                // Always evaluated with the default thresholds at request
                // time, independent of whatever the periodic reporting
                // path is configured with.
                let history = buffer.history();
                let dips = count_dips(&history, buffer.average(), &DipConfig::default());
                send(&socket, peer, &format!("# Dips: {dips}\n"));
            }
            Command::History => {
                for datagram in history_datagrams(&buffer.history()) {
                    send(&socket, peer, &datagram);
                }
            }
            Command::Stop => {
                send(&socket, peer, "Program terminating.\n");
                shutdown.request();
                session.last = Some(Command::Stop);
                break;
            }
        }
        session.last = Some(command);
    }
    tracing::debug!("command server loop ended");
}

fn send(socket: &UdpSocket, peer: SocketAddr, payload: &str) {
    if let Err(e) = socket.send_to(payload.as_bytes(), peer) {
        tracing::debug!(error = %e, %peer, "send failed");
    }
}

/// Format a window as `%.3f` values, comma-space separated, ten per line,
/// each line newline-terminated, packed into payloads of at most
/// [`MAX_DATAGRAM`] bytes. An empty window yields no datagrams.
pub fn history_datagrams(samples: &[f64]) -> Vec<String> {
    let mut datagrams = Vec::new();
    let mut current = String::new();
    let mut on_line = 0usize;

    for (i, volts) in samples.iter().enumerate() {
        let token = if on_line == 0 {
            format!("{volts:.3}")
        } else {
            format!(", {volts:.3}")
        };
        if current.len() + token.len() > MAX_DATAGRAM {
            datagrams.push(std::mem::take(&mut current));
        }
        current.push_str(&token);
        on_line += 1;

        let line_done = on_line == HISTORY_PER_LINE || i + 1 == samples.len();
        if line_done {
            if current.len() + 1 > MAX_DATAGRAM {
                datagrams.push(std::mem::take(&mut current));
            }
            current.push('\n');
            on_line = 0;
        }
    }
    if !current.is_empty() {
        datagrams.push(current);
    }
    datagrams
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_yields_nothing() {
        assert!(history_datagrams(&[]).is_empty());
    }

    #[test]
    fn short_history_is_one_line() {
        let samples: Vec<f64> = (0..10).map(|i| 1.0 + 0.1 * i as f64).collect();
        let out = history_datagrams(&samples);
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0],
            "1.000, 1.100, 1.200, 1.300, 1.400, 1.500, 1.600, 1.700, 1.800, 1.900\n"
        );
    }

    #[test]
    fn lines_break_every_ten_values() {
        let samples = vec![0.5; 25];
        let out = history_datagrams(&samples);
        let text: String = out.concat();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].split(", ").count(), 10);
        assert_eq!(lines[1].split(", ").count(), 10);
        assert_eq!(lines[2].split(", ").count(), 5);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn datagrams_respect_size_cap() {
        let samples = vec![1.234; 2000];
        let out = history_datagrams(&samples);
        assert!(out.len() > 1);
        for datagram in &out {
            assert!(datagram.len() <= MAX_DATAGRAM);
        }
        // Nothing lost in the chunking.
        let text: String = out.concat();
        assert_eq!(text.matches("1.234").count(), 2000);
    }
}
