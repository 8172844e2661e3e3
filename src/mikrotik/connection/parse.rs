// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS response parsing helpers

use std::collections::HashMap;
use std::str::FromStr;

use super::Sentence;
use crate::model::{
    DhcpLease, FirewallRule, InterfaceStats, LogEntry, NetworkInterface, QosRule, SystemInfo,
    SystemResources, TrafficFlow, VpnTunnel,
};

fn text(s: &Sentence, key: &str) -> String {
    s.get(key).cloned().unwrap_or_default()
}

fn num<T: FromStr + Default>(s: &Sentence, key: &str) -> T {
    s.get(key).and_then(|v| v.parse().ok()).unwrap_or_default()
}

fn flag(s: &Sentence, key: &str) -> bool {
    s.get(key).is_some_and(|v| v == "true" || v == "yes")
}

pub(crate) fn parse_system_resources(sentences: &[Sentence]) -> SystemResources {
    let empty = HashMap::new();
    let first = sentences
        .iter()
        .find(|s| s.contains_key("cpu-load") || s.contains_key("uptime"))
        .unwrap_or(&empty);
    SystemResources {
        uptime: first
            .get("uptime")
            .cloned()
            .unwrap_or_else(|| "0s".to_string()),
        cpu_load: num(first, "cpu-load"),
        free_memory: num(first, "free-memory"),
        total_memory: num(first, "total-memory"),
        free_hdd_space: num(first, "free-hdd-space"),
        total_hdd_space: num(first, "total-hdd-space"),
        cpu_count: num(first, "cpu-count"),
        cpu_frequency: num(first, "cpu-frequency"),
    }
}

/// Combines `/system/resource`, `/system/identity` and `/system/routerboard` replies
pub(crate) fn parse_system_info(
    resource: &[Sentence],
    identity: &[Sentence],
    routerboard: &[Sentence],
) -> SystemInfo {
    let empty = HashMap::new();
    let res = resource.first().unwrap_or(&empty);
    let ident = identity.first().unwrap_or(&empty);
    let board = routerboard.first().unwrap_or(&empty);
    SystemInfo {
        identity: text(ident, "name"),
        version: res
            .get("version")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string()),
        board_name: res
            .get("board-name")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string()),
        architecture: text(res, "architecture-name"),
        serial_number: text(board, "serial-number"),
        firmware: text(board, "current-firmware"),
    }
}

pub(crate) fn parse_interface_stats(sentences: &[Sentence]) -> Vec<InterfaceStats> {
    let mut out = Vec::new();
    for s in sentences {
        if let Some(name) = s.get("name") {
            out.push(InterfaceStats {
                name: name.clone(),
                rx_bytes: num(s, "rx-byte"),
                tx_bytes: num(s, "tx-byte"),
                rx_packets: num(s, "rx-packet"),
                tx_packets: num(s, "tx-packet"),
                rx_errors: num(s, "rx-error"),
                tx_errors: num(s, "tx-error"),
                running: flag(s, "running"),
            });
        }
    }
    out
}

pub(crate) fn parse_interfaces(sentences: &[Sentence]) -> Vec<NetworkInterface> {
    sentences
        .iter()
        .filter(|s| s.contains_key("name"))
        .map(|s| NetworkInterface {
            id: text(s, ".id"),
            name: text(s, "name"),
            interface_type: text(s, "type"),
            mac_address: text(s, "mac-address"),
            // "auto" on some interface types
            mtu: num::<u32>(s, "actual-mtu").max(num(s, "mtu")),
            running: flag(s, "running"),
            disabled: flag(s, "disabled"),
            comment: text(s, "comment"),
            rx_bytes: num(s, "rx-byte"),
            tx_bytes: num(s, "tx-byte"),
            rx_packets: num(s, "rx-packet"),
            tx_packets: num(s, "tx-packet"),
            rx_errors: num(s, "rx-error"),
            tx_errors: num(s, "tx-error"),
            ..NetworkInterface::default()
        })
        .collect()
}

/// Keeps the newest `max_count` entries, oldest first
pub(crate) fn parse_log_entries(sentences: &[Sentence], max_count: usize) -> Vec<LogEntry> {
    let skip = sentences.len().saturating_sub(max_count);
    sentences
        .iter()
        .skip(skip)
        .map(|s| LogEntry {
            id: text(s, ".id"),
            time: text(s, "time"),
            topics: text(s, "topics"),
            message: text(s, "message"),
        })
        .collect()
}

pub(crate) fn parse_firewall_rules(sentences: &[Sentence]) -> Vec<FirewallRule> {
    sentences
        .iter()
        .filter(|s| s.contains_key("chain"))
        .map(|s| FirewallRule {
            id: text(s, ".id"),
            chain: text(s, "chain"),
            action: text(s, "action"),
            protocol: text(s, "protocol"),
            src_address: text(s, "src-address"),
            dst_address: text(s, "dst-address"),
            dst_port: text(s, "dst-port"),
            disabled: flag(s, "disabled"),
            comment: text(s, "comment"),
            bytes: num(s, "bytes"),
            packets: num(s, "packets"),
        })
        .collect()
}

pub(crate) fn parse_dhcp_leases(sentences: &[Sentence]) -> Vec<DhcpLease> {
    sentences
        .iter()
        .filter(|s| s.contains_key("address"))
        .map(|s| DhcpLease {
            id: text(s, ".id"),
            address: text(s, "address"),
            mac_address: text(s, "mac-address"),
            host_name: text(s, "host-name"),
            server: text(s, "server"),
            status: text(s, "status"),
            expires_after: text(s, "expires-after"),
            dynamic: flag(s, "dynamic"),
        })
        .collect()
}

pub(crate) fn parse_vpn_tunnels(sentences: &[Sentence]) -> Vec<VpnTunnel> {
    sentences
        .iter()
        .filter(|s| s.contains_key("name"))
        .map(|s| VpnTunnel {
            id: text(s, ".id"),
            name: text(s, "name"),
            service: text(s, "service"),
            caller_id: text(s, "caller-id"),
            address: text(s, "address"),
            uptime: text(s, "uptime"),
        })
        .collect()
}

pub(crate) fn parse_qos_rules(sentences: &[Sentence]) -> Vec<QosRule> {
    sentences
        .iter()
        .filter(|s| s.contains_key("name"))
        .map(|s| QosRule {
            id: text(s, ".id"),
            name: text(s, "name"),
            target: text(s, "target"),
            max_limit: text(s, "max-limit"),
            rate: text(s, "rate"),
            disabled: flag(s, "disabled"),
        })
        .collect()
}

/// Aggregate connection tracking entries by source, destination and protocol
///
/// Ports are stripped so that all connections between two hosts collapse into
/// one flow. Output is sorted by byte volume, largest first.
pub(crate) fn parse_traffic_flows(sentences: &[Sentence]) -> Vec<TrafficFlow> {
    let mut aggregated: HashMap<(String, String, String), TrafficFlow> = HashMap::new();

    for s in sentences {
        let Some(src) = s.get("src-address") else {
            continue;
        };
        let src_address = extract_ip(src);
        let dst_address = s.get("dst-address").map(|d| extract_ip(d)).unwrap_or_default();
        let protocol = s
            .get("protocol")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());

        let flow = aggregated
            .entry((src_address.clone(), dst_address.clone(), protocol.clone()))
            .or_insert_with(|| TrafficFlow {
                src_address,
                dst_address,
                protocol,
                ..TrafficFlow::default()
            });
        flow.connection_count += 1;
        flow.orig_bytes += num::<u64>(s, "orig-bytes");
        flow.repl_bytes += num::<u64>(s, "repl-bytes");
    }

    let mut flows: Vec<TrafficFlow> = aggregated.into_values().collect();
    flows.sort_by(|a, b| {
        (b.orig_bytes + b.repl_bytes)
            .cmp(&(a.orig_bytes + a.repl_bytes))
            .then_with(|| a.src_address.cmp(&b.src_address))
            .then_with(|| a.dst_address.cmp(&b.dst_address))
    });
    flows
}

/// Extract the IP address from a RouterOS connection tracking address.
///
/// Handles IPv4 with port (`192.168.1.1:12345`), IPv6 with brackets
/// (`[::1]:12345`), and bare IPs without ports.
#[must_use]
fn extract_ip(addr: &str) -> String {
    if let Ok(socket) = addr.parse::<std::net::SocketAddr>() {
        return socket.ip().to_string();
    }

    if let Some(stripped) = addr.strip_prefix('[') {
        if let Some((ip, _rest)) = stripped.split_once(']') {
            return ip.to_string();
        }
    }

    if addr.parse::<std::net::IpAddr>().is_ok() {
        return addr.to_string();
    }

    if let Some((ip, _port)) = addr.rsplit_once(':') {
        if ip.parse::<std::net::IpAddr>().is_ok() || ip.contains('.') {
            return ip.to_string();
        }
    }

    addr.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(pairs: &[(&str, &str)]) -> Sentence {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_system_resources_complete() {
        let data = sentence(&[
            ("uptime", "1w2d3h4m5s"),
            ("cpu-load", "25"),
            ("free-memory", "524288000"),
            ("total-memory", "1073741824"),
            ("free-hdd-space", "100"),
            ("total-hdd-space", "400"),
            ("cpu-count", "4"),
            ("cpu-frequency", "880"),
        ]);

        let result = parse_system_resources(&[data]);

        assert_eq!(result.uptime, "1w2d3h4m5s");
        assert_eq!(result.cpu_load, 25);
        assert_eq!(result.free_memory, 524_288_000);
        assert_eq!(result.total_memory, 1_073_741_824);
        assert_eq!(result.disk_usage_percent(), 75.0);
        assert_eq!(result.cpu_count, 4);
        assert_eq!(result.cpu_frequency, 880);
    }

    #[test]
    fn test_parse_system_resources_empty() {
        let result = parse_system_resources(&[]);
        assert_eq!(result.uptime, "0s");
        assert_eq!(result.cpu_load, 0);
    }

    #[test]
    fn test_parse_system_info() {
        let res = sentence(&[
            ("version", "7.14.2 (stable)"),
            ("board-name", "RB5009UG+S+"),
            ("architecture-name", "arm64"),
        ]);
        let ident = sentence(&[("name", "core-router")]);
        let board = sentence(&[("serial-number", "HE108XYZ"), ("current-firmware", "7.14.2")]);

        let info = parse_system_info(&[res], &[ident], &[board]);

        assert_eq!(info.identity, "core-router");
        assert_eq!(info.version, "7.14.2 (stable)");
        assert_eq!(info.board_name, "RB5009UG+S+");
        assert_eq!(info.architecture, "arm64");
        assert_eq!(info.serial_number, "HE108XYZ");
        assert_eq!(info.firmware, "7.14.2");
    }

    #[test]
    fn test_parse_system_info_without_routerboard() {
        // CHR and x86 have no routerboard section
        let info = parse_system_info(&[], &[sentence(&[("name", "chr")])], &[]);
        assert_eq!(info.identity, "chr");
        assert_eq!(info.version, "unknown");
        assert!(info.serial_number.is_empty());
    }

    #[test]
    fn test_parse_interface_stats() {
        let iface1 = sentence(&[
            ("name", "ether1"),
            ("rx-byte", "1000"),
            ("tx-byte", "2000"),
            ("rx-packet", "10"),
            ("tx-packet", "20"),
            ("running", "true"),
        ]);
        let iface2 = sentence(&[("name", "ether2"), ("running", "false")]);
        let no_name = sentence(&[("rx-byte", "1000")]);

        let result = parse_interface_stats(&[iface1, iface2, no_name]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "ether1");
        assert_eq!(result[0].rx_bytes, 1000);
        assert_eq!(result[0].tx_packets, 20);
        assert!(result[0].running);
        assert_eq!(result[1].rx_bytes, 0);
        assert!(!result[1].running);
    }

    #[test]
    fn test_parse_interfaces_metadata() {
        let data = sentence(&[
            (".id", "*1"),
            ("name", "ether1"),
            ("type", "ether"),
            ("mac-address", "48:8F:5A:00:00:01"),
            ("mtu", "1500"),
            ("running", "true"),
            ("disabled", "false"),
            ("comment", "uplink"),
        ]);
        let bridge = sentence(&[("name", "bridge"), ("mtu", "auto"), ("actual-mtu", "1500")]);

        let result = parse_interfaces(&[data, bridge]);

        assert_eq!(result[0].id, "*1");
        assert_eq!(result[0].interface_type, "ether");
        assert_eq!(result[0].mtu, 1500);
        assert_eq!(result[0].comment, "uplink");
        assert!(!result[0].disabled);
        assert_eq!(result[1].mtu, 1500);
        assert!(result[1].last_update.is_none());
    }

    #[test]
    fn test_parse_log_entries_keeps_newest() {
        let entries: Vec<Sentence> = (0..5)
            .map(|i| {
                let id = format!("*{i}");
                let message = format!("event {i}");
                sentence(&[
                    (".id", id.as_str()),
                    ("time", "12:00:00"),
                    ("topics", "system,info"),
                    ("message", message.as_str()),
                ])
            })
            .collect();

        let result = parse_log_entries(&entries, 3);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].message, "event 2");
        assert_eq!(result[2].message, "event 4");

        assert_eq!(parse_log_entries(&entries, 100).len(), 5);
        assert!(parse_log_entries(&entries, 0).is_empty());
    }

    #[test]
    fn test_parse_firewall_rules() {
        let rule = sentence(&[
            (".id", "*A"),
            ("chain", "input"),
            ("action", "drop"),
            ("protocol", "tcp"),
            ("dst-port", "22"),
            ("disabled", "true"),
            ("bytes", "4096"),
            ("packets", "12"),
        ]);

        let result = parse_firewall_rules(&[rule]);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chain, "input");
        assert_eq!(result[0].action, "drop");
        assert_eq!(result[0].dst_port, "22");
        assert!(result[0].disabled);
        assert_eq!(result[0].bytes, 4096);
    }

    #[test]
    fn test_parse_dhcp_leases() {
        let lease = sentence(&[
            (".id", "*5"),
            ("address", "192.168.88.254"),
            ("mac-address", "AA:BB:CC:DD:EE:FF"),
            ("host-name", "laptop"),
            ("server", "defconf"),
            ("status", "bound"),
            ("expires-after", "9m12s"),
            ("dynamic", "true"),
        ]);

        let result = parse_dhcp_leases(&[lease]);

        assert_eq!(result[0].address, "192.168.88.254");
        assert_eq!(result[0].host_name, "laptop");
        assert_eq!(result[0].status, "bound");
        assert!(result[0].dynamic);
    }

    #[test]
    fn test_parse_vpn_and_qos() {
        let tunnel = sentence(&[
            ("name", "alice"),
            ("service", "l2tp"),
            ("caller-id", "203.0.113.5"),
            ("address", "10.8.0.2"),
            ("uptime", "1h2m"),
        ]);
        let queue = sentence(&[
            ("name", "guest"),
            ("target", "192.168.90.0/24"),
            ("max-limit", "10M/10M"),
            ("rate", "0/0"),
            ("disabled", "false"),
        ]);

        let tunnels = parse_vpn_tunnels(&[tunnel]);
        assert_eq!(tunnels[0].service, "l2tp");
        assert_eq!(tunnels[0].caller_id, "203.0.113.5");

        let rules = parse_qos_rules(&[queue]);
        assert_eq!(rules[0].max_limit, "10M/10M");
        assert!(!rules[0].disabled);
    }

    #[test]
    fn test_parse_traffic_flows_aggregates() {
        let c1 = sentence(&[
            ("src-address", "192.168.1.100:12345"),
            ("dst-address", "8.8.8.8:53"),
            ("protocol", "udp"),
            ("orig-bytes", "100"),
            ("repl-bytes", "200"),
        ]);
        let c2 = sentence(&[
            ("src-address", "192.168.1.100:12346"),
            ("dst-address", "8.8.8.8:53"),
            ("protocol", "udp"),
            ("orig-bytes", "50"),
            ("repl-bytes", "50"),
        ]);
        let c3 = sentence(&[
            ("src-address", "192.168.1.101:40000"),
            ("dst-address", "1.1.1.1:443"),
            ("protocol", "tcp"),
            ("orig-bytes", "5000"),
        ]);
        let no_src = sentence(&[("protocol", "tcp")]);

        let flows = parse_traffic_flows(&[c1, c2, c3, no_src]);

        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].src_address, "192.168.1.101");
        assert_eq!(flows[0].dst_address, "1.1.1.1");
        assert_eq!(flows[0].connection_count, 1);
        assert_eq!(flows[1].src_address, "192.168.1.100");
        assert_eq!(flows[1].connection_count, 2);
        assert_eq!(flows[1].orig_bytes, 150);
        assert_eq!(flows[1].repl_bytes, 250);
    }

    #[test]
    fn test_extract_ip_variants() {
        assert_eq!(extract_ip("192.168.1.100:12345"), "192.168.1.100");
        assert_eq!(extract_ip("[::1]:12345"), "::1");
        assert_eq!(extract_ip("10.0.0.1"), "10.0.0.1");
        assert_eq!(extract_ip("fe80::1"), "fe80::1");
    }
}
