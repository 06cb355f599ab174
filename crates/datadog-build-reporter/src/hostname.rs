// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Hostname detection and validation.
//!
//! The hostname attached to build telemetry is resolved from, in order:
//! 1. the statically configured hostname,
//! 2. the `HOSTNAME` variable of the build environment,
//! 3. `/bin/hostname -f`, only on Unix-like systems,
//! 4. the local network identity of the machine.
//!
//! The first candidate accepted by [`is_valid_hostname`] wins. When none is accepted the
//! telemetry is sent without a host.

use regex::Regex;
use std::io;
use std::process::Command;
use std::sync::OnceLock;
use tracing::{debug, error, info, warn};

const MAX_HOSTNAME_LEN: usize = 255;

const LOCAL_HOSTS: [&str; 4] = [
    "localhost",
    "localhost.localdomain",
    "localhost6.localdomain6",
    "ip6-localhost",
];

/// Lower-cased first word of the OS name for every family where `hostname -f` is available.
const UNIX_OS: [&str; 4] = ["mac", "linux", "freebsd", "sunos"];

// RFC 1123: dot separated labels of 1 to 63 alphanumerics, hyphens allowed inside a label.
const VALID_HOSTNAME_RFC_1123_PATTERN: &str =
    r"^(([a-z0-9]|[a-z0-9][a-z0-9\-]{0,61}[a-z0-9])\.)*([a-z0-9]|[a-z0-9][a-z0-9\-]{0,61}[a-z0-9])$";

const VALID_PORT_PATTERN: &str = r"^[0-9]{1,5}$";

#[allow(clippy::expect_used)]
fn hostname_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VALID_HOSTNAME_RFC_1123_PATTERN).expect("invalid hostname regex"))
}

#[allow(clippy::expect_used)]
fn port_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VALID_PORT_PATTERN).expect("invalid port regex"))
}

/// Returns true if `hostname` can be used to identify a host in Datadog.
///
/// Local aliases such as `localhost` are rejected (case-insensitively), as are names longer
/// than 255 characters and anything outside the RFC 1123 label grammar.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() {
        return false;
    }

    let host = hostname.to_ascii_lowercase();
    if LOCAL_HOSTS.contains(&host.as_str()) {
        debug!("Hostname: {hostname} is local");
        return false;
    }

    if hostname.len() > MAX_HOSTNAME_LEN {
        debug!("Hostname: {hostname} is too long (max length is {MAX_HOSTNAME_LEN} characters)");
        return false;
    }

    hostname_regex().is_match(&host)
}

/// Returns true if `port` is a 1 to 5 digit decimal number within `1..=65535`.
pub fn is_valid_port(port: &str) -> bool {
    if !port_regex().is_match(port) {
        return false;
    }
    matches!(port.parse::<u32>(), Ok(p) if (1..=65535).contains(&p))
}

/// Returns true if the OS name describes a Unix-like family, judged on its lower-cased first
/// word (`"Mac OS X"` -> `mac`, `"Linux"` -> `linux`).
pub fn is_unix_like(os_name: &str) -> bool {
    let family = os_name
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    UNIX_OS.contains(&family.as_str())
}

/// Operating system capabilities used as hostname fallbacks.
///
/// Abstracted so resolution can be exercised without spawning processes.
pub trait SystemHostname: Send + Sync {
    /// Human readable OS name, e.g. `Linux` or `Mac OS X`.
    fn os_name(&self) -> String;

    /// Fully qualified hostname as reported by `/bin/hostname -f`.
    fn fqdn(&self) -> io::Result<String>;

    /// Hostname of the local network identity.
    fn local_hostname(&self) -> io::Result<String>;
}

/// [`SystemHostname`] backed by the running machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct System;

impl SystemHostname for System {
    fn os_name(&self) -> String {
        match std::env::consts::OS {
            "macos" => "Mac OS X",
            "linux" => "Linux",
            "freebsd" => "FreeBSD",
            "solaris" | "illumos" => "SunOS",
            "windows" => "Windows",
            other => other,
        }
        .to_string()
    }

    fn fqdn(&self) -> io::Result<String> {
        let output = Command::new("/bin/hostname").arg("-f").output()?;
        if !output.status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!(
                    "/bin/hostname -f exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).lines().collect())
    }

    #[cfg(unix)]
    fn local_hostname(&self) -> io::Result<String> {
        let hostname = nix::unistd::gethostname()?;
        hostname.into_string().map_err(|raw| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("hostname is not valid UTF-8: {raw:?}"),
            )
        })
    }

    #[cfg(not(unix))]
    fn local_hostname(&self) -> io::Result<String> {
        std::env::var("COMPUTERNAME").map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))
    }
}

/// Resolves the hostname to report, trying every source in order of trust.
pub fn resolve_hostname(
    configured: Option<&str>,
    env_hostname: Option<&str>,
    system: &dyn SystemHostname,
) -> Option<String> {
    if let Some(hostname) = configured.filter(|h| is_valid_hostname(h)) {
        info!("Using configured hostname. Hostname: {hostname}");
        return Some(hostname.to_string());
    }

    if let Some(hostname) = env_hostname.filter(|h| is_valid_hostname(h)) {
        info!("Using hostname found in $HOSTNAME host environment variable. Hostname: {hostname}");
        return Some(hostname.to_string());
    }

    let os_name = system.os_name();
    if is_unix_like(&os_name) {
        match system.fqdn() {
            Ok(hostname) if is_valid_hostname(&hostname) => {
                info!("Using unix hostname found via `/bin/hostname -f`. Hostname: {hostname}");
                return Some(hostname);
            }
            Ok(hostname) => debug!("Ignoring hostname '{hostname}' from `/bin/hostname -f`"),
            Err(e) => error!("Failed to run `/bin/hostname -f`: {e}"),
        }
    } else {
        debug!("Skipping `/bin/hostname -f` on {os_name}");
    }

    match system.local_hostname() {
        Ok(hostname) if is_valid_hostname(&hostname) => {
            info!("Using hostname of the local network identity. Hostname: {hostname}");
            return Some(hostname);
        }
        Ok(hostname) => debug!("Ignoring local hostname '{hostname}'"),
        Err(e) => error!("Unknown hostname error received for localhost. Error: {e}"),
    }

    warn!("Unable to reliably determine host name. You can define one with DD_HOSTNAME.");
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Scripted [`SystemHostname`] for resolution tests.
    pub(crate) struct FakeSystem {
        pub os_name: &'static str,
        pub fqdn: Option<&'static str>,
        pub local: Option<&'static str>,
    }

    impl SystemHostname for FakeSystem {
        fn os_name(&self) -> String {
            self.os_name.to_string()
        }

        fn fqdn(&self) -> io::Result<String> {
            self.fqdn
                .map(str::to_string)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no hostname binary"))
        }

        fn local_hostname(&self) -> io::Result<String> {
            self.local
                .map(str::to_string)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "lookup failed"))
        }
    }

    const LINUX: FakeSystem = FakeSystem {
        os_name: "Linux",
        fqdn: Some("build-01.ci.example.com"),
        local: Some("build-01"),
    };

    #[test]
    fn test_valid_hostnames() {
        assert!(is_valid_hostname("build-01"));
        assert!(is_valid_hostname("build-01.ci.example.com"));
        assert!(is_valid_hostname("A1"));
        assert!(is_valid_hostname("x"));
        assert!(is_valid_hostname("Agent-7.Example.COM"));
        assert!(is_valid_hostname(&"a".repeat(63)));
    }

    #[test]
    fn test_invalid_hostnames() {
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("-leading"));
        assert!(!is_valid_hostname("trailing-"));
        assert!(!is_valid_hostname("double..dot"));
        assert!(!is_valid_hostname(".leading.dot"));
        assert!(!is_valid_hostname("trailing.dot."));
        assert!(!is_valid_hostname("under_score"));
        assert!(!is_valid_hostname("white space"));
        assert!(!is_valid_hostname("héllo"));
        assert!(!is_valid_hostname(&"a".repeat(64)));
    }

    #[test]
    fn test_local_aliases_are_rejected() {
        for alias in LOCAL_HOSTS {
            assert!(!is_valid_hostname(alias), "{alias} should be rejected");
        }
        assert!(!is_valid_hostname("LocalHost"));
        assert!(!is_valid_hostname("IP6-LOCALHOST"));
    }

    #[test]
    fn test_max_length() {
        let label = "a".repeat(63);
        let host = [label.as_str(); 4].join(".");
        assert_eq!(host.len(), 255);
        assert!(is_valid_hostname(&host));
        let too_long = format!("{host}a");
        assert!(!is_valid_hostname(&too_long));
    }

    #[test]
    fn test_valid_ports() {
        assert!(is_valid_port("1"));
        assert!(is_valid_port("8080"));
        assert!(is_valid_port("65535"));
        assert!(is_valid_port("00080"));
    }

    #[test]
    fn test_invalid_ports() {
        assert!(!is_valid_port(""));
        assert!(!is_valid_port("0"));
        assert!(!is_valid_port("00000"));
        assert!(!is_valid_port("65536"));
        assert!(!is_valid_port("99999"));
        assert!(!is_valid_port("123456"));
        assert!(!is_valid_port("-1"));
        assert!(!is_valid_port(" 80"));
        assert!(!is_valid_port("80a"));
        assert!(!is_valid_port("٨٠"));
    }

    #[test]
    fn test_is_unix_like() {
        assert!(is_unix_like("Linux"));
        assert!(is_unix_like("Mac OS X"));
        assert!(is_unix_like("FreeBSD"));
        assert!(is_unix_like("SunOS"));
        assert!(!is_unix_like("Windows 10"));
        assert!(!is_unix_like(""));
    }

    #[test]
    fn test_configured_hostname_wins() {
        let hostname = resolve_hostname(Some("configured.example.com"), Some("env-host"), &LINUX);
        assert_eq!(hostname.as_deref(), Some("configured.example.com"));
    }

    #[test]
    fn test_env_hostname_used_when_configured_is_invalid() {
        let hostname = resolve_hostname(Some("localhost"), Some("env-host"), &LINUX);
        assert_eq!(hostname.as_deref(), Some("env-host"));
    }

    #[test]
    fn test_fqdn_used_on_unix() {
        let hostname = resolve_hostname(None, None, &LINUX);
        assert_eq!(hostname.as_deref(), Some("build-01.ci.example.com"));
    }

    #[test]
    fn test_fqdn_skipped_on_windows() {
        let system = FakeSystem {
            os_name: "Windows Server 2019",
            ..LINUX
        };
        let hostname = resolve_hostname(None, None, &system);
        assert_eq!(hostname.as_deref(), Some("build-01"));
    }

    #[test]
    fn test_fqdn_failure_falls_through() {
        let system = FakeSystem {
            fqdn: None,
            ..LINUX
        };
        let hostname = resolve_hostname(None, Some("not valid!"), &system);
        assert_eq!(hostname.as_deref(), Some("build-01"));
    }

    #[test]
    fn test_no_valid_source() {
        let system = FakeSystem {
            os_name: "Linux",
            fqdn: Some("localhost"),
            local: None,
        };
        assert_eq!(resolve_hostname(None, None, &system), None);
    }

    proptest! {
        #[test]
        fn prop_overlong_hostnames_are_rejected(len in 256usize..1024) {
            prop_assert!(!is_valid_hostname(&"a".repeat(len)));
        }

        #[test]
        fn prop_local_aliases_rejected_in_any_case(
            alias in proptest::sample::select(LOCAL_HOSTS.to_vec()),
            mask in proptest::collection::vec(any::<bool>(), 32),
        ) {
            let mixed: String = alias
                .chars()
                .zip(mask.iter().cycle())
                .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
                .collect();
            prop_assert!(!is_valid_hostname(&mixed));
        }

        #[test]
        fn prop_ports_in_range_are_valid(port in 1u32..=65535) {
            prop_assert!(is_valid_port(&port.to_string()));
        }

        #[test]
        fn prop_ports_out_of_range_are_invalid(port in 65536u32..=99999) {
            prop_assert!(!is_valid_port(&port.to_string()));
        }

        #[test]
        fn prop_non_numeric_ports_are_invalid(port in "[0-9]{0,3}[^0-9][0-9]{0,3}") {
            prop_assert!(!is_valid_port(&port));
        }

        #[test]
        fn prop_configured_hostname_always_wins(label in "[a-z][a-z0-9]{0,20}") {
            let configured = format!("{label}.configured.example");
            let hostname = resolve_hostname(Some(&configured), Some("env-host"), &LINUX);
            prop_assert_eq!(hostname, Some(configured));
        }
    }
}
