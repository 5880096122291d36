//! Check Point generator.
//!
//! Emits a Gaia-style `show configuration`-like text rendering of the IR
//! (spec.md §4.5.3: structurally analogous to ASA, no rule splitting or VIP
//! synthesis). Objects, services, groups, NAT, and the rule base are each
//! emitted as a flat block of `add` directives, the same shape the Check
//! Point parser's objects-database reader consumes on the way in.

use super::sanitize::checkpoint_name;
use super::{GeneratedOutput, Generator, GeneratorOptions};
use crate::error::Result;
use crate::ir::{AddressKind, DYNAMIC_IP_AND_PORT, FirewallConfig, Protocol, RuleAction};
use crate::parser::Vendor;
use std::fmt::Write as _;

pub struct CheckPointGenerator;

impl Generator for CheckPointGenerator {
    fn vendor(&self) -> Vendor {
        Vendor::CheckPoint
    }

    fn generate(&self, config: &FirewallConfig, _options: &GeneratorOptions) -> Result<GeneratedOutput> {
        let mut out = String::new();
        emit_interfaces(&mut out, config);
        emit_addresses(&mut out, config);
        emit_address_groups(&mut out, config);
        emit_services(&mut out, config);
        emit_service_groups(&mut out, config);
        emit_nat(&mut out, config);
        emit_rulebase(&mut out, config);
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
        let _ = writeln!(out, "add interface \"{}\"", checkpoint_name(&iface.name));
        if let (Some(ip), Some(prefix)) = (&iface.ipv4_address, iface.prefix_len) {
            let _ = writeln!(
                out,
                "set interface \"{}\" ipv4-address {} mask-length {}",
                checkpoint_name(&iface.name),
                ip,
                prefix
            );
        }
    }
}

fn emit_addresses(out: &mut String, config: &FirewallConfig) {
    for addr in config.addresses.values() {
        let name = checkpoint_name(&addr.name);
        match addr.kind {
            AddressKind::Host => {
                let _ = writeln!(out, "add host plain \"{name}\" ip-address \"{}\"", addr.value1);
            }
            AddressKind::Network => {
                let prefix: u8 = addr.value2.as_deref().and_then(|p| p.parse().ok()).unwrap_or(32);
                let mask = crate::parser::common::prefix_len_to_mask(prefix);
                let _ = writeln!(out, "add network \"{name}\" subnet \"{}\" mask \"{mask}\"", addr.value1);
            }
            AddressKind::Range => {
                let end = addr.value2.clone().unwrap_or_else(|| addr.value1.clone());
                let _ = writeln!(out, "add address-range \"{name}\" ip-first \"{}\" ip-last \"{end}\"", addr.value1);
            }
            AddressKind::Fqdn => {
                let _ = writeln!(out, "add domain \"{name}\" fqdn \"{}\"", addr.value1);
            }
        }
    }
}

fn emit_address_groups(out: &mut String, config: &FirewallConfig) {
    for group in config.address_groups.values() {
        let name = checkpoint_name(&group.name);
        let _ = writeln!(out, "add group \"{name}\"");
        for member in &group.members {
            let _ = writeln!(out, "set group \"{name}\" members.add \"{member}\"");
        }
    }
}

fn emit_services(out: &mut String, config: &FirewallConfig) {
    for service in config.services.values() {
        let name = checkpoint_name(&service.name);
        let port = crate::ir::normalize_port_spec(&service.port_spec);
        match service.protocol {
            Protocol::Tcp => {
                let _ = writeln!(out, "add service-tcp \"{name}\" port \"{port}\"");
            }
            Protocol::Udp => {
                let _ = writeln!(out, "add service-udp \"{name}\" port \"{port}\"");
            }
            Protocol::Icmp => {
                let _ = writeln!(out, "add service-icmp \"{name}\"");
            }
            Protocol::Ip | Protocol::Other => {
                let _ = writeln!(out, "add service-other \"{name}\" ip-protocol \"{port}\"");
            }
        }
    }
}

fn emit_service_groups(out: &mut String, config: &FirewallConfig) {
    for group in config.service_groups.values() {
        let name = checkpoint_name(&group.name);
        let _ = writeln!(out, "add service-group \"{name}\"");
        for member in &group.members {
            let _ = writeln!(out, "set service-group \"{name}\" members.add \"{member}\"");
        }
    }
}

fn emit_nat(out: &mut String, config: &FirewallConfig) {
    for (i, nat) in config.nat_rules_in_order().into_iter().enumerate() {
        let src = nat.original_sources.iter().next().cloned().unwrap_or_else(|| "Any".to_string());
        let dst = nat.original_destinations.iter().next().cloned().unwrap_or_else(|| "Any".to_string());
        let method = match &nat.translated_source {
            Some(t) if t == DYNAMIC_IP_AND_PORT => "Hide".to_string(),
            Some(t) => t.clone(),
            None => "Static".to_string(),
        };
        let _ = writeln!(out, "# NAT rule {} : {src} -> {dst} method={method}", i + 1);
    }
}

fn emit_rulebase(out: &mut String, config: &FirewallConfig) {
    for rule in config.rules_in_order() {
        let action = if rule.action == RuleAction::Allow { "Accept" } else { "Drop" };
        let sources: Vec<&str> = rule.sources.iter().map(std::string::String::as_str).collect();
        let destinations: Vec<&str> = rule.destinations.iter().map(std::string::String::as_str).collect();
        let services: Vec<&str> = rule.services.iter().map(std::string::String::as_str).collect();
        let _ = writeln!(
            out,
            "{};{};{};{};{}",
            checkpoint_name(&rule.name),
            sources.join(","),
            destinations.join(","),
            services.join(","),
            action
        );
    }
}

fn emit_routes(out: &mut String, config: &FirewallConfig) {
    for route in &config.static_routes {
        if route.kind != crate::ir::RouteKind::Static {
            continue;
        }
        let _ = writeln!(
            out,
            "add static-route \"{}\" nexthop gateway address \"{}\" priority {}",
            route.destination, route.next_hop, route.admin_distance
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
    fn emits_host_plain_for_host_address() {
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
        let generator = CheckPointGenerator;
        let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert!(text.contains("add host plain \"web1\" ip-address \"10.0.0.5\""));
    }

    #[test]
    fn rulebase_row_emitted_per_rule() {
        let mut config = FirewallConfig::new();
        config.rules.push(Rule {
            sequence_id: 1,
            name: "Rule 1".to_string(),
            action: RuleAction::Allow,
            enabled: true,
            log: true,
            hit_count: None,
            time_range: None,
            source_interfaces: BTreeSet::new(),
            destination_interfaces: BTreeSet::new(),
            sources: ["Any".to_string()].into_iter().collect(),
            destinations: ["Any".to_string()].into_iter().collect(),
            services: BTreeSet::new(),
            applications: BTreeSet::new(),
            remark: None,
        });
        let generator = CheckPointGenerator;
        let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert!(text.contains("Accept"));
    }
}
