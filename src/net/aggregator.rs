//! Network information aggregation.
//!
//! Combines the raw probe transcripts into one [`NetReport`]. Every field
//! except `probed_ip` is independently optional: a parse failure in one
//! source never hides data found in another, and no failure here ever
//! surfaces as an error.

use std::net::Ipv4Addr;

use tracing::debug;

use super::probe::Probe;

/// One network snapshot, computed fresh per request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetReport {
    /// Name of the connected Wi-Fi network, if any.
    pub ssid: Option<String>,
    /// IPv4 of the first connected adapter found in the interface listing.
    pub adapter_ip: Option<String>,
    /// Default gateway associated with that adapter.
    pub gateway: Option<String>,
    /// Locally bound address from the UDP route probe. Always present.
    pub probed_ip: String,
}

/// Read-only facade over a [`Probe`]. One instance is shared by all
/// conversations; it holds no mutable state.
pub struct Aggregator<P> {
    probe: P,
}

impl<P: Probe> Aggregator<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Build a full network report. Each source is queried once; whatever
    /// cannot be determined stays `None`.
    pub fn build_report(&self) -> NetReport {
        let ssid = self.probe.wifi_interfaces().as_deref().and_then(parse_ssid);
        let (adapter_ip, gateway) = self
            .probe
            .ip_config()
            .as_deref()
            .map(parse_adapter_ip_and_gateway)
            .unwrap_or((None, None));
        let probed_ip = self.probe.probed_ip();
        debug!(?ssid, ?adapter_ip, ?gateway, %probed_ip, "network report built");
        NetReport { ssid, adapter_ip, gateway, probed_ip }
    }

    /// Saved Wi-Fi profile names in OS-reported order. Empty on failure.
    pub fn list_wifi_profiles(&self) -> Vec<String> {
        self.probe
            .wifi_profiles()
            .as_deref()
            .map(parse_profile_names)
            .unwrap_or_default()
    }

    /// Stored password for one profile. `None` covers both "no password
    /// configured" and "access denied" — the OS tools do not distinguish
    /// them and neither does this call.
    pub fn wifi_password(&self, profile: &str) -> Option<String> {
        self.probe
            .wifi_profile_detail(profile)
            .as_deref()
            .and_then(parse_key_content)
    }

    /// Every saved profile paired with its password, if retrievable.
    /// With no saved profiles the per-profile query is never issued.
    pub fn all_profile_passwords(&self) -> Vec<(String, Option<String>)> {
        self.list_wifi_profiles()
            .into_iter()
            .map(|p| {
                let pwd = self.wifi_password(&p);
                (p, pwd)
            })
            .collect()
    }
}

// ── parsers ───────────────────────────────────────────────────────────────────

/// Extract the SSID from `netsh wlan show interfaces` output.
///
/// Takes the first line of the form `SSID : <name>` (the `BSSID` line does
/// not match — the prefix must be exactly `SSID`). `<none>` placeholders
/// count as not connected.
pub fn parse_ssid(out: &str) -> Option<String> {
    for line in out.lines() {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix("SSID") else { continue };
        // Only whitespace may sit between "SSID" and the colon; this
        // rejects "BSSID"-adjacent fields like "SSID name hash".
        let rest = rest.trim_start();
        let Some(value) = rest.strip_prefix(':') else { continue };
        let ssid = value.trim();
        if ssid.is_empty() || ssid.eq_ignore_ascii_case("<none>") || ssid.eq_ignore_ascii_case("none") {
            return None;
        }
        return Some(ssid.to_string());
    }
    None
}

/// Extract `(adapter_ip, gateway)` from `ipconfig` output.
///
/// Scans adapter blocks (blank-line separated) in order, skipping
/// disconnected ones. A block exposing both a usable IPv4 and a gateway
/// wins outright; otherwise the first partial findings are kept, so the
/// two results are independent of each other.
pub fn parse_adapter_ip_and_gateway(out: &str) -> (Option<String>, Option<String>) {
    let mut first_ip: Option<String> = None;
    let mut first_gw: Option<String> = None;

    // ipconfig emits CRLF; normalise so blank-line block splitting works.
    let out = out.replace('\r', "");
    for block in out.split("\n\n") {
        if block.contains("Media State") && block.to_lowercase().contains("disconnected") {
            continue;
        }
        let ip = field_value(block, "IPv4 Address").filter(|ip| !is_link_local(ip));
        let gw = field_value(block, "Default Gateway");

        if let (Some(ip), Some(gw)) = (&ip, &gw) {
            return (Some(ip.clone()), Some(gw.clone()));
        }
        if first_ip.is_none() {
            first_ip = ip;
        }
        if first_gw.is_none() {
            first_gw = gw;
        }
    }
    (first_ip, first_gw)
}

/// Profile names from `netsh wlan show profiles` (`All User Profile : X`).
pub fn parse_profile_names(out: &str) -> Vec<String> {
    out.lines()
        .filter(|l| l.contains("All User Profile"))
        .filter_map(|l| l.split_once(':'))
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Stored key from `netsh wlan show profile ... key=clear` output.
pub fn parse_key_content(out: &str) -> Option<String> {
    out.lines()
        .filter(|l| l.contains("Key Content"))
        .filter_map(|l| l.split_once(':'))
        .map(|(_, v)| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Find `<label> ... : <ipv4>` inside one adapter block and return the
/// address. `ipconfig` pads labels with dots and may suffix addresses
/// with `(Preferred)`; only the leading dotted-quad is taken.
fn field_value(block: &str, label: &str) -> Option<String> {
    block
        .lines()
        .filter(|l| l.contains(label))
        .filter_map(|l| l.split_once(':'))
        .filter_map(|(_, v)| leading_ipv4(v.trim()))
        .next()
}

/// Parse the leading `[0-9.]` run of `value` as an IPv4 address.
fn leading_ipv4(value: &str) -> Option<String> {
    let run: String = value
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    run.parse::<Ipv4Addr>().ok().map(|ip| ip.to_string())
}

fn is_link_local(ip: &str) -> bool {
    ip.parse::<Ipv4Addr>().map(|ip| ip.is_link_local()).unwrap_or(false)
}
