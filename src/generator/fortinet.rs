//! Fortinet FortiGate generator.
//!
//! Produces FortiOS CLI text. Distinguishing design points: NAT-mode
//! selection (policy vs central), default-service canonicalization, VIP
//! synthesis for DNAT, and address-object format rewrites (spec.md §4.5.1).

use super::sanitize::fortinet_name;
use super::{GeneratedOutput, Generator, GeneratorOptions, NatMode};
use crate::error::Result;
use crate::ir::{
    Address, AddressKind, FirewallConfig, NatRule, Protocol, Rule, Service, Warning,
    normalize_port_spec,
};
use crate::parser::Vendor;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;

pub struct FortinetGenerator;

impl Generator for FortinetGenerator {
    fn vendor(&self) -> Vendor {
        Vendor::Fortinet
    }

    fn generate(&self, config: &FirewallConfig, options: &GeneratorOptions) -> Result<super::GeneratedOutput> {
        let mut warnings = Vec::new();
        let mut working = config.clone();

        let rewrite_map = canonicalize_services(&mut working);
        apply_service_rewrite(&mut working, &rewrite_map);

        let vips = synthesize_vips(&mut working, &mut warnings);

        let mut out = String::new();
        emit_interfaces(&mut out, &working);
        emit_zones(&mut out, &working);
        emit_addresses(&mut out, &working);
        emit_address_groups(&mut out, &working);
        emit_services(&mut out, &working, &rewrite_map);
        emit_service_groups(&mut out, &working);
        emit_vips(&mut out, &vips);
        emit_central_snat(&mut out, &working, options);
        emit_policies(&mut out, &working, options, &vips);
        emit_routes(&mut out, &working);
        emit_dynamic_routing(&mut out, &working);

        Ok(GeneratedOutput {
            text: out.into_bytes(),
            warnings,
        })
    }
}

struct SynthesizedVip {
    name: String,
    nat_rule_seq: u32,
    extip_address: String,
    mappedip_address: String,
    extintf: Option<String>,
    portforward: Option<(String, String)>,
}

/// Built-in FortiOS default services: (name, protocol, normalized port).
/// Matched against custom services; an exact match removes the custom
/// service and rewrites every reference to the default name.
fn default_services() -> &'static [(&'static str, Protocol, &'static str)] {
    &[
        ("ALL", Protocol::Ip, ""),
        ("ALL_TCP", Protocol::Tcp, "1-65535"),
        ("ALL_UDP", Protocol::Udp, "1-65535"),
        ("ALL_ICMP", Protocol::Icmp, ""),
        ("PING", Protocol::Icmp, "8"),
        ("IKE", Protocol::Udp, "500"),
        ("HTTP", Protocol::Tcp, "80"),
        ("HTTPS", Protocol::Tcp, "443"),
        ("SSH", Protocol::Tcp, "22"),
        ("TELNET", Protocol::Tcp, "23"),
        ("DNS", Protocol::Udp, "53"),
        ("FTP", Protocol::Tcp, "21"),
        ("SMTP", Protocol::Tcp, "25"),
        ("NTP", Protocol::Udp, "123"),
        ("SNMP", Protocol::Udp, "161"),
        ("LDAP", Protocol::Tcp, "389"),
        ("LDAPS", Protocol::Tcp, "636"),
        ("BGP", Protocol::Tcp, "179"),
        ("SYSLOG", Protocol::Udp, "514"),
        ("NFS", Protocol::Tcp, "2049"),
        ("GRE", Protocol::Ip, ""),
        ("DHCP", Protocol::Udp, "67"),
        ("PPTP", Protocol::Tcp, "1723"),
        ("RDP", Protocol::Tcp, "3389"),
        ("NETBIOS-SSN", Protocol::Tcp, "139"),
        ("ONC-RPC", Protocol::Tcp, "111"),
    ]
}

/// Remove every custom service matching a FortiOS default and return the
/// old→new rewrite map (spec.md §4.5.1 "Service canonicalization").
/// Idempotent: a second call over an already-canonicalized config rewrites
/// nothing further, since the default names themselves never match
/// another default (spec.md §8).
fn canonicalize_services(config: &mut FirewallConfig) -> HashMap<String, String> {
    let mut rewrite_map = HashMap::new();
    let defaults = default_services();
    let matching_names: Vec<String> = config
        .services
        .values()
        .filter_map(|service| {
            let normalized = normalize_port_spec(&service.port_spec);
            defaults
                .iter()
                .find(|(name, proto, port)| {
                    *proto == service.protocol && *port == normalized && *name != service.name
                })
                .map(|(default_name, ..)| (service.name.clone(), (*default_name).to_string()))
        })
        .map(|(old, new)| {
            rewrite_map.insert(old.clone(), new);
            old
        })
        .collect();

    for name in matching_names {
        config.services.remove(&name);
    }
    rewrite_map
}

fn apply_service_rewrite(config: &mut FirewallConfig, rewrite_map: &HashMap<String, String>) {
    if rewrite_map.is_empty() {
        return;
    }
    let rewrite = |set: &BTreeSet<String>| -> BTreeSet<String> {
        set.iter()
            .map(|name| rewrite_map.get(name).cloned().unwrap_or_else(|| name.clone()))
            .collect()
    };
    for rule in &mut config.rules {
        rule.services = rewrite(&rule.services);
    }
    for nat in &mut config.nat_rules {
        nat.original_services = rewrite(&nat.original_services);
    }
    for group in config.service_groups.values_mut() {
        group.members = rewrite(&group.members);
    }
}

/// VIP naming precedence: existing NAT rule name > `DNAT_<extip>` >
/// `VIP_<seq-id>`. Collisions with an address name get a `_VIP` suffix.
fn synthesize_vips(config: &mut FirewallConfig, warnings: &mut Vec<Warning>) -> Vec<SynthesizedVip> {
    let mut vips = Vec::new();
    for nat in config.nat_rules.clone() {
        if !nat.is_dnat() {
            continue;
        }
        let Some(translated_destination) = nat.translated_destination.clone() else {
            continue;
        };
        let extip = resolve_address_value(config, nat.original_destinations.iter().next())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let mappedip =
            resolve_address_value(config, Some(&translated_destination)).unwrap_or_else(|| translated_destination.clone());

        let mut candidate = if !nat.name.is_empty() {
            nat.name.clone()
        } else {
            format!("DNAT_{extip}")
        };
        if candidate.is_empty() {
            candidate = format!("VIP_{}", nat.sequence_id);
        }
        if config.addresses.contains_key(&candidate) {
            candidate.push_str("_VIP");
        }
        let vip_name = fortinet_name(&candidate);

        let ext_address_name = config.mint_unique_name(&format!("{vip_name}_extip"));
        config.addresses.insert(
            ext_address_name.clone(),
            Address {
                name: ext_address_name.clone(),
                kind: AddressKind::Host,
                value1: extip,
                value2: None,
            },
        );

        let portforward = nat
            .original_services
            .iter()
            .next()
            .and_then(|svc_name| config.services.get(svc_name))
            .filter(|svc| matches!(svc.protocol, Protocol::Tcp | Protocol::Udp))
            .map(|svc| {
                let port = normalize_port_spec(&svc.port_spec);
                (port.clone(), port)
            });

        if portforward.is_none() && !nat.original_services.is_empty() {
            warnings.push(Warning::info(
                "vip-no-portforward",
                format!("NAT rule '{}' has no resolvable TCP/UDP service for port forwarding", nat.name),
            ));
        }

        vips.push(SynthesizedVip {
            name: vip_name,
            nat_rule_seq: nat.sequence_id,
            extip_address: ext_address_name,
            mappedip_address: mappedip,
            extintf: nat.destination_interfaces.iter().next().cloned(),
            portforward,
        });
    }
    vips
}

fn resolve_address_value(config: &FirewallConfig, name: Option<&String>) -> Option<String> {
    let name = name?;
    config.find_address(name).map(|a| a.value1.clone())
}

fn emit_interfaces(out: &mut String, config: &FirewallConfig) {
    let _ = writeln!(out, "config system interface");
    for iface in config.interfaces.values() {
        let _ = writeln!(out, "    edit \"{}\"", fortinet_name(&iface.name));
        if let (Some(ip), Some(prefix)) = (&iface.ipv4_address, iface.prefix_len) {
            let _ = writeln!(out, "        set ip {} {}", ip, crate::parser::common::prefix_len_to_mask(prefix));
        }
        if let Some(desc) = &iface.description {
            let _ = writeln!(out, "        set alias \"{desc}\"");
        }
        if let Some(vlan) = iface.vlan_id {
            let _ = writeln!(out, "        set vlanid {vlan}");
        }
        let _ = writeln!(out, "    next");
    }
    let _ = writeln!(out, "end");
}

fn emit_zones(out: &mut String, config: &FirewallConfig) {
    let mut zones: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for iface in config.interfaces.values() {
        if let Some(zone) = &iface.zone {
            zones.entry(zone.clone()).or_default().push(iface.name.clone());
        }
    }
    if zones.is_empty() {
        return;
    }
    let _ = writeln!(out, "config system zone");
    for (zone, members) in zones {
        let _ = writeln!(out, "    edit \"{}\"", fortinet_name(&zone));
        let quoted: Vec<String> = members.iter().map(|m| format!("\"{m}\"")).collect();
        let _ = writeln!(out, "        set interface {}", quoted.join(" "));
        let _ = writeln!(out, "    next");
    }
    let _ = writeln!(out, "end");
}

fn emit_addresses(out: &mut String, config: &FirewallConfig) {
    let _ = writeln!(out, "config firewall address");
    for addr in config.addresses.values() {
        let _ = writeln!(out, "    edit \"{}\"", fortinet_name(&addr.name));
        match addr.kind {
            AddressKind::Host => {
                let _ = writeln!(out, "        set subnet {} 255.255.255.255", addr.value1);
            }
            AddressKind::Network => {
                let prefix: u8 = addr.value2.as_deref().and_then(|p| p.parse().ok()).unwrap_or(32);
                let mask = crate::parser::common::prefix_len_to_mask(prefix);
                let _ = writeln!(out, "        set subnet {} {}", addr.value1, mask);
            }
            AddressKind::Range => {
                if addr.is_degenerate_range() {
                    // A start==end range collapses to a host-style subnet.
                    let _ = writeln!(out, "        set subnet {} 255.255.255.255", addr.value1);
                } else {
                    let _ = writeln!(out, "        set type iprange");
                    let _ = writeln!(out, "        set start-ip {}", addr.value1);
                    let _ = writeln!(out, "        set end-ip {}", addr.value2.clone().unwrap_or_default());
                }
            }
            AddressKind::Fqdn => {
                let _ = writeln!(out, "        set type fqdn");
                let _ = writeln!(out, "        set fqdn \"{}\"", addr.value1);
            }
        }
        let _ = writeln!(out, "    next");
    }
    let _ = writeln!(out, "end");
}

fn emit_address_groups(out: &mut String, config: &FirewallConfig) {
    if config.address_groups.is_empty() {
        return;
    }
    let _ = writeln!(out, "config firewall addrgrp");
    for group in config.address_groups.values() {
        let _ = writeln!(out, "    edit \"{}\"", fortinet_name(&group.name));
        let members: Vec<String> = group.members.iter().map(|m| format!("\"{m}\"")).collect();
        let _ = writeln!(out, "        set member {}", members.join(" "));
        let _ = writeln!(out, "    next");
    }
    let _ = writeln!(out, "end");
}

fn emit_services(out: &mut String, config: &FirewallConfig, rewrite_map: &HashMap<String, String>) {
    let remaining: Vec<&Service> = config
        .services
        .values()
        .filter(|s| !rewrite_map.contains_key(&s.name))
        .collect();
    if remaining.is_empty() {
        return;
    }
    let _ = writeln!(out, "config firewall service custom");
    for service in remaining {
        let _ = writeln!(out, "    edit \"{}\"", fortinet_name(&service.name));
        let port = normalize_port_spec(&service.port_spec);
        match service.protocol {
            Protocol::Tcp => {
                let _ = writeln!(out, "        set tcp-portrange {port}");
            }
            Protocol::Udp => {
                let _ = writeln!(out, "        set udp-portrange {port}");
            }
            _ => {
                let _ = writeln!(out, "        set protocol-number {port}");
            }
        }
        let _ = writeln!(out, "    next");
    }
    let _ = writeln!(out, "end");
}

fn emit_service_groups(out: &mut String, config: &FirewallConfig) {
    if config.service_groups.is_empty() {
        return;
    }
    let _ = writeln!(out, "config firewall service group");
    for group in config.service_groups.values() {
        let _ = writeln!(out, "    edit \"{}\"", fortinet_name(&group.name));
        let members: Vec<String> = group.members.iter().map(|m| format!("\"{m}\"")).collect();
        let _ = writeln!(out, "        set member {}", members.join(" "));
        let _ = writeln!(out, "    next");
    }
    let _ = writeln!(out, "end");
}

fn emit_vips(out: &mut String, vips: &[SynthesizedVip]) {
    if vips.is_empty() {
        return;
    }
    let _ = writeln!(out, "config firewall vip");
    for vip in vips {
        let _ = writeln!(out, "    edit \"{}\"", vip.name);
        let _ = writeln!(out, "        set extip {}", vip.extip_address);
        let _ = writeln!(out, "        set mappedip \"{}\"", vip.mappedip_address);
        if let Some(extintf) = &vip.extintf {
            let _ = writeln!(out, "        set extintf \"{extintf}\"");
        }
        if let Some((extport, mappedport)) = &vip.portforward {
            let _ = writeln!(out, "        set portforward enable");
            let _ = writeln!(out, "        set extport {extport}");
            let _ = writeln!(out, "        set mappedport {mappedport}");
        }
        let _ = writeln!(out, "    next");
    }
    let _ = writeln!(out, "end");
}

fn emit_central_snat(out: &mut String, config: &FirewallConfig, options: &GeneratorOptions) {
    if options.nat_mode != NatMode::Central {
        return;
    }
    let snat_rules: Vec<&NatRule> = config.nat_rules_in_order().into_iter().filter(|n| !n.is_dnat()).collect();
    if snat_rules.is_empty() {
        return;
    }
    let _ = writeln!(out, "config firewall central-snat-map");
    for (i, nat) in snat_rules.into_iter().enumerate() {
        let _ = writeln!(out, "    edit {}", i + 1);
        let srcintf: Vec<String> = nat.source_interfaces.iter().map(|s| format!("\"{s}\"")).collect();
        let dstintf: Vec<String> = nat.destination_interfaces.iter().map(|s| format!("\"{s}\"")).collect();
        let orig_src: Vec<String> = nat.original_sources.iter().map(|s| format!("\"{s}\"")).collect();
        let _ = writeln!(out, "        set srcintf {}", srcintf.join(" "));
        let _ = writeln!(out, "        set dstintf {}", dstintf.join(" "));
        let _ = writeln!(out, "        set orig-source-address {}", orig_src.join(" "));
        if let Some(translated) = &nat.translated_source {
            let _ = writeln!(out, "        set nat-ippool \"{translated}\"");
        }
        let _ = writeln!(out, "    next");
    }
    let _ = writeln!(out, "end");
}

fn emit_policies(
    out: &mut String,
    config: &FirewallConfig,
    options: &GeneratorOptions,
    vips: &[SynthesizedVip],
) {
    let vip_external_addresses: BTreeSet<&str> = vips.iter().map(|v| v.extip_address.as_str()).collect();
    let snat_by_rule_key: HashMap<(BTreeSet<String>, BTreeSet<String>, BTreeSet<String>), &NatRule> = config
        .nat_rules
        .iter()
        .filter(|n| !n.is_dnat())
        .map(|n| {
            (
                (
                    n.source_interfaces.clone(),
                    n.destination_interfaces.clone(),
                    n.original_sources.clone(),
                ),
                n,
            )
        })
        .collect();

    let _ = writeln!(out, "config firewall policy");
    for rule in config.rules_in_order() {
        write_policy_entry(out, rule, options, &vip_external_addresses, &snat_by_rule_key);
    }
    let _ = writeln!(out, "end");
}

fn write_policy_entry(
    out: &mut String,
    rule: &Rule,
    options: &GeneratorOptions,
    vip_external_addresses: &BTreeSet<&str>,
    snat_by_rule_key: &HashMap<(BTreeSet<String>, BTreeSet<String>, BTreeSet<String>), &NatRule>,
) {
    let _ = writeln!(out, "    edit \"{}\"", fortinet_name(&rule.name));
    let srcintf: Vec<String> = rule.source_interfaces.iter().map(|s| format!("\"{s}\"")).collect();
    let dstintf: Vec<String> = rule.destination_interfaces.iter().map(|s| format!("\"{s}\"")).collect();
    let srcaddr: Vec<String> = rule.sources.iter().map(|s| format!("\"{s}\"")).collect();
    let dstaddr: Vec<String> = rule.destinations.iter().map(|s| format!("\"{s}\"")).collect();
    let service: Vec<String> = rule.services.iter().map(|s| format!("\"{s}\"")).collect();

    let _ = writeln!(out, "        set srcintf {}", srcintf.join(" "));
    let _ = writeln!(out, "        set dstintf {}", dstintf.join(" "));
    let _ = writeln!(out, "        set srcaddr {}", srcaddr.join(" "));
    let _ = writeln!(out, "        set dstaddr {}", dstaddr.join(" "));
    let _ = writeln!(out, "        set service {}", service.join(" "));
    let _ = writeln!(
        out,
        "        set action {}",
        if rule.action == crate::ir::RuleAction::Allow { "accept" } else { "deny" }
    );
    let _ = writeln!(out, "        set status {}", if rule.enabled { "enable" } else { "disable" });
    if let Some(remark) = &rule.remark {
        let _ = writeln!(out, "        set comments \"{remark}\"");
    }

    let destination_is_vip = rule.destinations.iter().any(|d| vip_external_addresses.contains(d.as_str()));
    if destination_is_vip {
        let _ = writeln!(out, "        set nat disable");
    } else {
        let key = (rule.source_interfaces.clone(), rule.destination_interfaces.clone(), rule.sources.clone());
        if let Some(nat) = snat_by_rule_key.get(&key) {
            let _ = writeln!(out, "        set nat enable");
            if let Some(translated) = &nat.translated_source {
                if translated != crate::ir::DYNAMIC_IP_AND_PORT {
                    let _ = writeln!(out, "        set poolname \"{translated}\"");
                }
            }
        }
    }

    if !options.security_profiles.is_empty() {
        let _ = writeln!(out, "        set utm-status enable");
        for (key, value) in &options.security_profiles {
            let _ = writeln!(out, "        set {key} \"{value}\"");
        }
    }

    let _ = writeln!(out, "    next");
}

fn emit_routes(out: &mut String, config: &FirewallConfig) {
    let static_routes: Vec<_> = config
        .static_routes
        .iter()
        .filter(|r| r.kind == crate::ir::RouteKind::Static)
        .collect();
    if static_routes.is_empty() {
        return;
    }
    let _ = writeln!(out, "config router static");
    for (i, route) in static_routes.into_iter().enumerate() {
        let _ = writeln!(out, "    edit {}", i + 1);
        let mut parts = route.destination.splitn(2, '/');
        let dst = parts.next().unwrap_or_default();
        let prefix: u8 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(32);
        let _ = writeln!(
            out,
            "        set dst {} {}",
            dst,
            crate::parser::common::prefix_len_to_mask(prefix)
        );
        let _ = writeln!(out, "        set gateway {}", route.next_hop);
        if let Some(device) = &route.interface {
            let _ = writeln!(out, "        set device \"{device}\"");
        }
        let _ = writeln!(out, "        set distance {}", route.admin_distance);
        let _ = writeln!(out, "    next");
    }
    let _ = writeln!(out, "end");
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
    use crate::ir::{DYNAMIC_IP_AND_PORT, RuleAction};
    use std::collections::BTreeSet;

    fn sample_inside_pat_config() -> FirewallConfig {
        let mut config = FirewallConfig::new();
        config.addresses.insert(
            "INSIDE_NET".to_string(),
            Address {
                name: "INSIDE_NET".to_string(),
                kind: AddressKind::Network,
                value1: "10.0.0.0".to_string(),
                value2: Some("24".to_string()),
            },
        );
        config.nat_rules.push(NatRule {
            sequence_id: 1,
            name: "n1".to_string(),
            enabled: true,
            original_sources: ["INSIDE_NET".to_string()].into_iter().collect(),
            original_destinations: BTreeSet::new(),
            original_services: BTreeSet::new(),
            source_interfaces: ["inside".to_string()].into_iter().collect(),
            destination_interfaces: ["outside".to_string()].into_iter().collect(),
            translated_source: Some(DYNAMIC_IP_AND_PORT.to_string()),
            translated_destination: None,
            translated_service: None,
        });
        config.rules.push(Rule {
            sequence_id: 1,
            name: "r1".to_string(),
            action: RuleAction::Allow,
            enabled: true,
            log: true,
            hit_count: None,
            time_range: None,
            source_interfaces: ["inside".to_string()].into_iter().collect(),
            destination_interfaces: ["outside".to_string()].into_iter().collect(),
            sources: ["INSIDE_NET".to_string()].into_iter().collect(),
            destinations: BTreeSet::new(),
            services: BTreeSet::new(),
            applications: BTreeSet::new(),
            remark: None,
        });
        config
    }

    #[test]
    fn inline_pat_scenario_emits_nat_enable_without_poolname() {
        let config = sample_inside_pat_config();
        let generator = FortinetGenerator;
        let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert!(text.contains("config firewall policy"));
        assert!(text.contains("set nat enable"));
        assert!(!text.contains("set poolname"));
    }

    #[test]
    fn service_canonicalization_removes_matching_default() {
        let mut config = FirewallConfig::new();
        config.services.insert(
            "custom-http".to_string(),
            Service {
                name: "custom-http".to_string(),
                protocol: Protocol::Tcp,
                port_spec: "eq 80".to_string(),
            },
        );
        let generator = FortinetGenerator;
        let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert!(!text.contains("custom-http"));
    }

    #[test]
    fn degenerate_range_emits_host_style_subnet() {
        let mut config = FirewallConfig::new();
        config.addresses.insert(
            "r1".to_string(),
            Address {
                name: "r1".to_string(),
                kind: AddressKind::Range,
                value1: "10.0.0.5".to_string(),
                value2: Some("10.0.0.5".to_string()),
            },
        );
        let generator = FortinetGenerator;
        let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert!(text.contains("set subnet 10.0.0.5 255.255.255.255"));
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let mut config = FirewallConfig::new();
        config.services.insert(
            "custom-http".to_string(),
            Service {
                name: "custom-http".to_string(),
                protocol: Protocol::Tcp,
                port_spec: "eq 80".to_string(),
            },
        );
        let mut once = config.clone();
        let map1 = canonicalize_services(&mut once);
        let mut twice = once.clone();
        let map2 = canonicalize_services(&mut twice);
        assert_eq!(once, twice);
        assert!(!map1.is_empty());
        assert!(map2.is_empty());
    }
}
