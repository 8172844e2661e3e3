// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Label types for Prometheus metrics

use prometheus_client::encoding::EncodeLabelSet;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct InterfaceLabels {
    pub router: String,
    pub interface: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RouterLabels {
    pub router: String,
}

impl RouterLabels {
    pub fn new(router: &str) -> Self {
        Self {
            router: router.to_string(),
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SystemInfoLabels {
    pub router: String,
    pub version: String,
    pub board: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_router_labels_new() {
        assert_eq!(RouterLabels::new("core").router, "core");
    }

    #[test]
    fn test_interface_labels_identity() {
        let mut set = HashSet::new();
        set.insert(InterfaceLabels {
            router: "core".to_string(),
            interface: "ether1".to_string(),
        });
        assert!(set.contains(&InterfaceLabels {
            router: "core".to_string(),
            interface: "ether1".to_string(),
        }));
        assert!(!set.contains(&InterfaceLabels {
            router: "edge".to_string(),
            interface: "ether1".to_string(),
        }));
    }
}
