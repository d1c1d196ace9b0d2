//! Finding the instances to monitor
//!
//! Explicitly configured instances win. Otherwise running server processes
//! are inspected and the listen address is taken from their process title,
//! which the server rewrites to `redis-server <host>:<port>`.

use anyhow::{Result, bail};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::{debug, info};

use crate::constants::discovery::SERVER_PROCESS;
use crate::types::{InstanceAddr, Port};

/// Parse the listen address out of a server process title
///
/// ```
/// use queue_scouter::discovery::parse_listen_addr;
///
/// let addr = parse_listen_addr("redis-server *:6380").unwrap();
/// assert_eq!(addr.to_string(), "127.0.0.1:6380");
/// assert!(parse_listen_addr("redis-server").is_none());
/// ```
#[must_use]
pub fn parse_listen_addr(title: &str) -> Option<InstanceAddr> {
    title.split_whitespace().skip(1).find_map(|token| {
        let (host, port) = token.rsplit_once(':')?;
        let port: Port = port.parse().ok()?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        match host {
            "" | "*" | "0.0.0.0" | "::" => Some(InstanceAddr::local(port)),
            _ => format!("{}:{}", token_host(host), port).parse().ok(),
        }
    })
}

fn token_host(host: &str) -> String {
    if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

/// Remove repeated instances, keeping first occurrences in order
#[must_use]
pub fn dedupe(instances: impl IntoIterator<Item = InstanceAddr>) -> Vec<InstanceAddr> {
    let mut unique: Vec<InstanceAddr> = Vec::new();
    for instance in instances {
        if !unique.contains(&instance) {
            unique.push(instance);
        }
    }
    unique
}

/// Listen addresses of server processes running on this host
#[must_use]
pub fn scan_processes() -> Vec<InstanceAddr> {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
    );

    let mut found: Vec<(u32, InstanceAddr)> = system
        .processes()
        .iter()
        .filter_map(|(pid, process)| {
            let title = process
                .cmd()
                .iter()
                .map(|part| part.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");
            let is_server = process.name().to_string_lossy() == SERVER_PROCESS
                || title.split_whitespace().next().is_some_and(|exe| exe.ends_with(SERVER_PROCESS));
            if !is_server {
                return None;
            }
            let addr = parse_listen_addr(&title)?;
            debug!("Found {} process {} listening on {}", SERVER_PROCESS, pid, addr);
            Some((pid.as_u32(), addr))
        })
        .collect();

    // Stable order across runs
    found.sort_by_key(|(pid, _)| *pid);
    dedupe(found.into_iter().map(|(_, addr)| addr))
}

/// Decide which instances to supervise
///
/// # Errors
/// Fails when no instance is configured and none is running.
pub fn resolve_instances(configured: &[InstanceAddr]) -> Result<Vec<InstanceAddr>> {
    let instances = if configured.is_empty() {
        let found = scan_processes();
        info!("Discovered {} running {} instance(s)", found.len(), SERVER_PROCESS);
        found
    } else {
        dedupe(configured.iter().cloned())
    };

    if instances.is_empty() {
        bail!(
            "No instances to monitor: none configured and no {} process found",
            SERVER_PROCESS
        );
    }
    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listen_addr_variants() {
        assert_eq!(
            parse_listen_addr("redis-server 127.0.0.1:6379").unwrap().to_string(),
            "127.0.0.1:6379"
        );
        assert_eq!(
            parse_listen_addr("/usr/bin/redis-server 0.0.0.0:6381").unwrap().to_string(),
            "127.0.0.1:6381"
        );
        assert_eq!(
            parse_listen_addr("redis-server 10.1.2.3:7000 [cluster]").unwrap().to_string(),
            "10.1.2.3:7000"
        );
        assert_eq!(
            parse_listen_addr("redis-server [::1]:6379").unwrap().to_string(),
            "[::1]:6379"
        );
    }

    #[test]
    fn test_parse_listen_addr_rejects_garbage() {
        assert!(parse_listen_addr("redis-server").is_none());
        assert!(parse_listen_addr("redis-server /etc/redis.conf").is_none());
        assert!(parse_listen_addr("redis-server host:notaport").is_none());
        assert!(parse_listen_addr("redis-server *:0").is_none());
    }

    #[test]
    fn test_dedupe_keeps_order() {
        let a: InstanceAddr = "6380".parse().unwrap();
        let b: InstanceAddr = "6379".parse().unwrap();
        let unique = dedupe([a.clone(), b.clone(), a.clone()]);
        assert_eq!(unique, vec![a, b]);
    }

    #[test]
    fn test_resolve_prefers_configured() {
        let configured: Vec<InstanceAddr> =
            vec!["6379".parse().unwrap(), ":6379".parse().unwrap()];
        let resolved = resolve_instances(&configured).unwrap();
        assert_eq!(resolved.len(), 1);
    }
}
