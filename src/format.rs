// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Human-readable formatting of rates, sizes and uptimes

/// Format a rate given in bytes per second as a bit rate ("1.0 Mbps")
///
/// Steps are decimal (1000-based), as is usual for line rates.
#[must_use]
pub fn format_speed(bytes_per_sec: f64) -> String {
    let bits = bytes_per_sec.max(0.0) * 8.0;
    if bits >= 1_000_000_000.0 {
        format!("{:.1} Gbps", bits / 1_000_000_000.0)
    } else if bits >= 1_000_000.0 {
        format!("{:.1} Mbps", bits / 1_000_000.0)
    } else if bits >= 1_000.0 {
        format!("{:.1} Kbps", bits / 1_000.0)
    } else {
        format!("{bits:.1} bps")
    }
}

/// Format a byte count with binary (1024-based) units ("1.50 KB")
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Format seconds as a compact duration ("3d 4h 5m", "4h 5m", "5m 6s")
#[must_use]
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

/// Parse MikroTik uptime string to seconds
///
/// Accepts formats like: 1d2h3m4s, 2w1d, 05:23:10, 1h5m, 30s
#[must_use]
pub fn parse_uptime_to_seconds(s: &str) -> u64 {
    if s.contains(':') {
        // HH:MM:SS or MM:SS, optionally after a "1d" style prefix
        let (prefix, clock) = match s.rfind(|c: char| c.is_ascii_alphabetic()) {
            Some(pos) => s.split_at(pos + 1),
            None => ("", s),
        };
        let parts: Vec<u64> = clock
            .split(':')
            .map(|p| p.parse::<u64>().unwrap_or(0))
            .collect();
        let clock_secs = match parts.as_slice() {
            [h, m, sec] => h
                .saturating_mul(3600)
                .saturating_add(m.saturating_mul(60))
                .saturating_add(*sec),
            [m, sec] => m.saturating_mul(60).saturating_add(*sec),
            _ => 0,
        };
        return parse_unit_string(prefix).saturating_add(clock_secs);
    }
    parse_unit_string(s)
}

fn parse_unit_string(s: &str) -> u64 {
    let mut total = 0u64;
    let mut num = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            num.push(ch);
            continue;
        }
        if num.is_empty() {
            continue;
        }
        let value = num.parse::<u64>().unwrap_or(0);
        let unit_seconds = match ch {
            'w' => 7 * 24 * 3600,
            'd' => 24 * 3600,
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => 0,
        };
        total = total.saturating_add(value.saturating_mul(unit_seconds));
        num.clear();
    }
    if !num.is_empty() {
        // trailing number without unit -> seconds
        total = total.saturating_add(num.parse::<u64>().unwrap_or(0));
    }
    total
}
