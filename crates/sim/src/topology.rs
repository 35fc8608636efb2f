//! The state tree a fresh simulated device starts with.

use serde_json::{json, Map, Value};

pub const INTERFACES: &str = "/interfaces";

const INTERFACE_PREFIX: &str = "interface[name=";

#[must_use]
pub fn interface_key(name: &str) -> String {
    format!("{INTERFACE_PREFIX}{name}]")
}

/// `Ethernet0` out of `interface[name=Ethernet0]`.
#[must_use]
pub fn interface_name(key: &str) -> Option<&str> {
    key.strip_prefix(INTERFACE_PREFIX)?.strip_suffix(']')
}

/// Interfaces alternate between 1500 and 9000 MTU so both toggle directions
/// get exercised.
#[must_use]
pub fn default_tree(hostname: &str, interfaces: usize) -> Value {
    let interfaces: Map<String, Value> = (0..interfaces)
        .map(|index| {
            let name = format!("Ethernet{index}");
            let mtu = if index % 2 == 0 { 1500 } else { 9000 };
            let entry = json!({
                "name": name,
                "config": { "name": name, "mtu": mtu, "enabled": true },
                "state": {
                    "name": name,
                    "mtu": mtu,
                    "oper-status": "UP",
                    "counters": { "in-octets": 0, "out-octets": 0 },
                },
            });
            (interface_key(&name), entry)
        })
        .collect();

    json!({
        "interfaces": interfaces,
        "system": {
            "config": {
                "hostname": hostname,
                "domain-name": "lab.example.net",
            },
            "state": {
                "hostname": hostname,
                "domain-name": "lab.example.net",
                "boot-time": "1704067200000000000",
                "current-datetime": "2024-01-01T00:00:00Z",
                "uptime": 0,
            },
            "memory": {
                "state": { "physical": 8_589_934_592_u64, "reserved": 1_073_741_824_u64 },
            },
        },
        "components": {
            "component[name=chassis]": {
                "name": "chassis",
                "state": { "type": "CHASSIS", "part-no": "SIM-1000", "serial-no": "SIM0001" },
            },
            "component[name=cpu0]": {
                "name": "cpu0",
                "state": { "type": "CPU", "description": "simulated cpu" },
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use gnmi_primitives::tree;

    use super::*;

    #[test]
    fn interface_keys_round_trip() {
        assert_eq!(interface_name(&interface_key("Ethernet3")), Some("Ethernet3"), "name recovered");
        assert_eq!(interface_name("component[name=cpu0]"), None, "not an interface");
    }

    #[test]
    fn default_tree_has_leaves_for_every_catalog_path() {
        let tree = default_tree("sw1", 2);
        let leaves: Vec<String> = tree::leaves("/", &tree).into_iter().map(|(path, _)| path).collect();

        for expected in [
            "/interfaces/interface[name=Ethernet0]/state/mtu",
            "/interfaces/interface[name=Ethernet1]/state/mtu",
            "/system/state/hostname",
            "/system/config/hostname",
            "/components/component[name=chassis]/state/type",
        ] {
            assert!(leaves.iter().any(|leaf| leaf == expected), "{expected} present");
        }
    }
}
