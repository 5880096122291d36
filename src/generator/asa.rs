//! Cisco ASA generator.
//!
//! Structurally simpler than Fortinet/Palo Alto (spec.md §4.5.3): no rule
//! splitting, no VIP synthesis, no wildcard rewrite. Emits `object
//! network`/`object service`/`object-group`/`access-list`/NAT/interface/
//! route stanzas in the same deterministic order every generator follows.

use super::sanitize::asa_name;
use super::{GeneratedOutput, Generator, GeneratorOptions};
use crate::error::Result;
use crate::ir::{AddressKind, DYNAMIC_IP_AND_PORT, FirewallConfig, Protocol, RuleAction};
use crate::parser::Vendor;
use std::fmt::Write as _;

pub struct AsaGenerator;

impl Generator for AsaGenerator {
    fn vendor(&self) -> Vendor {
        Vendor::Asa
    }

    fn generate(&self, config: &FirewallConfig, _options: &GeneratorOptions) -> Result<GeneratedOutput> {
        let mut out = String::new();
        emit_interfaces(&mut out, config);
        emit_addresses(&mut out, config);
        emit_address_groups(&mut out, config);
        emit_services(&mut out, config);
        emit_service_groups(&mut out, config);
        emit_nat(&mut out, config);
        emit_acl(&mut out, config);
        emit_routes(&mut out, config);
        emit_dynamic_routing(&mut out, config);

        Ok(GeneratedOutput {
            text: out.into_bytes(),
            warnings: Vec::new(),
        })
    }
}

fn emit_interfaces(out: &mut String, config: &FirewallConfig) {
    for iface in config.interfaces.values() {
        let _ = writeln!(out, "interface {}", asa_name(&iface.name));
        if let Some(zone) = &iface.zone {
            let _ = writeln!(out, " nameif {}", asa_name(zone));
        }
        if let (Some(ip), Some(prefix)) = (&iface.ipv4_address, iface.prefix_len) {
            let _ = writeln!(out, " ip address {} {}", ip, crate::parser::common::prefix_len_to_mask(prefix));
        }
        if let Some(vlan) = iface.vlan_id {
            let _ = writeln!(out, " vlan {vlan}");
        }
    }
}

fn emit_addresses(out: &mut String, config: &FirewallConfig) {
    for addr in config.addresses.values() {
        let _ = writeln!(out, "object network {}", asa_name(&addr.name));
        match addr.kind {
            AddressKind::Host => {
                let _ = writeln!(out, " host {}", addr.value1);
            }
            AddressKind::Network => {
                let prefix: u8 = addr.value2.as_deref().and_then(|p| p.parse().ok()).unwrap_or(32);
                let _ = writeln!(out, " subnet {} {}", addr.value1, crate::parser::common::prefix_len_to_mask(prefix));
            }
            AddressKind::Range => {
                let end = addr.value2.clone().unwrap_or_else(|| addr.value1.clone());
                let _ = writeln!(out, " range {} {end}", addr.value1);
            }
            AddressKind::Fqdn => {
                let _ = writeln!(out, " fqdn {}", addr.value1);
            }
        }
    }
}

fn emit_address_groups(out: &mut String, config: &FirewallConfig) {
    for group in config.address_groups.values() {
        let _ = writeln!(out, "object-group network {}", asa_name(&group.name));
        for member in &group.members {
            let _ = writeln!(out, " network-object object {member}");
        }
    }
}

fn emit_services(out: &mut String, config: &FirewallConfig) {
    for service in config.services.values() {
        let proto = match service.protocol {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::Ip | Protocol::Other => "ip",
        };
        let _ = writeln!(out, "object service {}", asa_name(&service.name));
        let port = crate::ir::normalize_port_spec(&service.port_spec);
        if port.is_empty() {
            let _ = writeln!(out, " service {proto}");
        } else {
            let _ = writeln!(out, " service {proto} destination eq {port}");
        }
    }
}

fn emit_service_groups(out: &mut String, config: &FirewallConfig) {
    for group in config.service_groups.values() {
        let _ = writeln!(out, "object-group service {} tcp-udp", asa_name(&group.name));
        for member in &group.members {
            let _ = writeln!(out, " service-object object {member}");
        }
    }
}

fn emit_nat(out: &mut String, config: &FirewallConfig) {
    for nat in config.nat_rules_in_order() {
        let src = nat.original_sources.iter().next().cloned().unwrap_or_else(|| "any".to_string());
        let _ = writeln!(out, "object network {}", asa_name(&src));
        match &nat.translated_source {
            Some(t) if t == DYNAMIC_IP_AND_PORT => {
                let iface = nat.destination_interfaces.iter().next().map_or("outside", |s| s.as_str());
                let _ = writeln!(out, " nat ({},{}) dynamic interface", nat.source_interfaces.iter().next().map_or("inside", |s| s.as_str()), iface);
            }
            Some(t) => {
                let _ = writeln!(
                    out,
                    " nat ({},{}) static {t}",
                    nat.source_interfaces.iter().next().map_or("inside", |s| s.as_str()),
                    nat.destination_interfaces.iter().next().map_or("outside", |s| s.as_str())
                );
            }
            None => {}
        }
    }
}

fn emit_acl(out: &mut String, config: &FirewallConfig) {
    for rule in config.rules_in_order() {
        let action = if rule.action == RuleAction::Allow { "permit" } else { "deny" };
        let services: Vec<&str> = rule.services.iter().map(std::string::String::as_str).collect();
        let service = services.first().copied().unwrap_or("ip");
        let sources: Vec<&str> = rule.sources.iter().map(std::string::String::as_str).collect();
        let destinations: Vec<&str> = rule.destinations.iter().map(std::string::String::as_str).collect();
        let _ = writeln!(
            out,
            "access-list {} extended {action} object {} object {} object {}",
            asa_name(&rule.name),
            service,
            sources.first().copied().unwrap_or("any"),
            destinations.first().copied().unwrap_or("any")
        );
    }
}

fn emit_routes(out: &mut String, config: &FirewallConfig) {
    for route in &config.static_routes {
        if route.kind != crate::ir::RouteKind::Static {
            continue;
        }
        let mut parts = route.destination.splitn(2, '/');
        let dst = parts.next().unwrap_or_default();
        let prefix: u8 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(32);
        let iface = route.interface.clone().unwrap_or_else(|| "outside".to_string());
        let _ = writeln!(
            out,
            "route {iface} {dst} {} {} {}",
            crate::parser::common::prefix_len_to_mask(prefix),
            route.next_hop,
            route.admin_distance
        );
    }
}

fn emit_dynamic_routing(out: &mut String, config: &FirewallConfig) {
    if let Some(raw) = &config.dynamic_routing_config {
        out.push_str(raw);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Address, Rule};
    use std::collections::BTreeSet;

    #[test]
    fn emits_object_network_for_each_address() {
        let mut config = FirewallConfig::new();
        config.addresses.insert(
            "web1".to_string(),
            Address {
                name: "web1".to_string(),
                kind: AddressKind::Host,
                value1: "10.0.0.5".to_string(),
                value2: None,
            },
        );
        let generator = AsaGenerator;
        let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert!(text.contains("object network web1"));
        assert!(text.contains("host 10.0.0.5"));
    }

    #[test]
    fn acl_line_emitted_per_rule() {
        let mut config = FirewallConfig::new();
        config.rules.push(Rule {
            sequence_id: 1,
            name: "acl_in".to_string(),
            action: RuleAction::Allow,
            enabled: true,
            log: true,
            hit_count: None,
            time_range: None,
            source_interfaces: BTreeSet::new(),
            destination_interfaces: BTreeSet::new(),
            sources: ["any".to_string()].into_iter().collect(),
            destinations: ["any".to_string()].into_iter().collect(),
            services: BTreeSet::new(),
            applications: BTreeSet::new(),
            remark: None,
        });
        let generator = AsaGenerator;
        let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert!(text.contains("access-list acl_in extended permit"));
    }
}
