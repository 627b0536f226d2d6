//! Raw OS network queries.
//!
//! Every query here is single-attempt and fail-soft: a failed or timed-out
//! command yields `None` and the caller substitutes its own "unknown"
//! rendering. Nothing in this module returns an error.
//!
//! Commands are the Windows `netsh`/`ipconfig` family; output parsing lives
//! in [`super::aggregator`] so it stays testable without a Wi-Fi adapter.

use std::net::UdpSocket;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Address the UDP probe routes toward. No packet is ever sent; connecting
/// a datagram socket only selects the local interface.
const PROBE_TARGET: &str = "8.8.8.8:80";

/// Returned when even the UDP probe cannot determine a local address.
const PROBE_FALLBACK_IP: &str = "127.0.0.1";

/// Interval between `try_wait` polls while a command is running.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Seam between the aggregator and the OS. Implementations return the raw
/// command transcript; `None` means the query failed or produced nothing.
pub trait Probe: Send + Sync {
    /// Raw `netsh wlan show interfaces` output.
    fn wifi_interfaces(&self) -> Option<String>;

    /// Raw `ipconfig` output.
    fn ip_config(&self) -> Option<String>;

    /// Raw `netsh wlan show profiles` output.
    fn wifi_profiles(&self) -> Option<String>;

    /// Raw `netsh wlan show profile name=<name> key=clear` output.
    fn wifi_profile_detail(&self, name: &str) -> Option<String>;

    /// Local address chosen by the OS for outbound traffic, via an
    /// unconnected UDP socket. Always returns something; falls back to
    /// the loopback address when the host has no route at all.
    fn probed_ip(&self) -> String;
}

/// Production probe — shells out to the OS tools with a per-command deadline.
pub struct OsProbe {
    timeout: Duration,
}

impl OsProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run a command, killing it if it outlives the deadline.
    ///
    /// Returns `None` on spawn failure, timeout, non-zero exit, or
    /// non-UTF-8 output. Failures are logged and swallowed: a missing
    /// `netsh` binary on a non-Windows host is an expected outcome.
    fn run(&self, program: &str, args: &[&str]) -> Option<String> {
        debug!(%program, ?args, "running probe command");
        let mut child = match Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .spawn()
        {
            Ok(c) => c,
            Err(e) => {
                warn!(%program, "probe command failed to spawn: {e}");
                return None;
            }
        };

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        warn!(%program, "probe command timed out, killing");
                        let _ = child.kill();
                        let _ = child.wait();
                        return None;
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    warn!(%program, "probe command wait failed: {e}");
                    let _ = child.kill();
                    return None;
                }
            }
        }

        // Child has exited; this collects the piped output without blocking.
        let output = child.wait_with_output().ok()?;
        if !output.status.success() {
            debug!(%program, status = ?output.status, "probe command exited non-zero");
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(%program, len = text.len(), "probe command output");
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

impl Probe for OsProbe {
    fn wifi_interfaces(&self) -> Option<String> {
        self.run("netsh", &["wlan", "show", "interfaces"])
    }

    fn ip_config(&self) -> Option<String> {
        self.run("ipconfig", &[])
    }

    fn wifi_profiles(&self) -> Option<String> {
        self.run("netsh", &["wlan", "show", "profiles"])
    }

    fn wifi_profile_detail(&self, name: &str) -> Option<String> {
        let name_arg = format!("name={name}");
        self.run("netsh", &["wlan", "show", "profile", &name_arg, "key=clear"])
    }

    fn probed_ip(&self) -> String {
        probe_local_ip()
    }
}

/// Determine the local IP the OS would use for outbound traffic.
///
/// Connecting a UDP socket sends no packets; it only asks the routing
/// table which local address would be used. Independent of the `ipconfig`
/// path on purpose — the two must not share a failure mode.
pub fn probe_local_ip() -> String {
    let result = UdpSocket::bind("0.0.0.0:0")
        .and_then(|s| s.connect(PROBE_TARGET).map(|()| s))
        .and_then(|s| s.local_addr());
    match result {
        Ok(addr) => addr.ip().to_string(),
        Err(e) => {
            warn!("udp probe failed, using loopback fallback: {e}");
            PROBE_FALLBACK_IP.to_string()
        }
    }
}
