//! Fortinet FortiGate parser.
//!
//! Input is `config X` / `edit N` / `set KEY VAL` / `next` / `end` blocks;
//! nesting is legal. The parser tracks a context stack and an in-progress
//! entry's field map, finalizing each entry into IR on `next` (spec.md
//! §4.2.3). Unknown `config` blocks are captured whole via depth-balanced
//! skipping and attached to a warning's `detail_lines`.

use super::{Parser, ParserInputs, Vendor};
use crate::error::{MigrateError, Result};
use crate::ir::{
    Address, AddressGroup, AddressKind, DYNAMIC_IP_AND_PORT, DYNAMIC_ROUTE_NEXT_HOP_SENTINEL,
    FirewallConfig, Interface, NatRule, Protocol, RouteKind, Rule, RuleAction, Service,
    ServiceGroup, StaticRoute, Warning,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

pub struct FortinetParser;

impl Parser for FortinetParser {
    fn vendor(&self) -> Vendor {
        Vendor::Fortinet
    }

    fn parse(&self, inputs: &ParserInputs) -> Result<(FirewallConfig, Vec<Warning>)> {
        let bytes = inputs.primary.as_ref().ok_or_else(|| {
            MigrateError::InvalidInput("Fortinet parser requires a config blob".into())
        })?;
        if bytes.is_empty() {
            return Err(MigrateError::InvalidInput("Fortinet config blob is empty".into()));
        }
        let text = String::from_utf8_lossy(bytes);
        info!(bytes = bytes.len(), "parsing Fortinet configuration");
        Ok(parse_fortinet_text(&text))
    }
}

const KNOWN_CONTEXTS: &[&str] = &[
    "firewall address",
    "firewall addrgrp",
    "firewall service custom",
    "firewall service group",
    "firewall policy",
    "firewall vip",
    "firewall central-snat-map",
    "system interface",
    "system zone",
    "router static",
];

#[derive(Default)]
struct Entry {
    id: String,
    fields: HashMap<String, Vec<String>>,
}

impl Entry {
    fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    fn get_all(&self, key: &str) -> Vec<String> {
        self.fields.get(key).cloned().unwrap_or_default()
    }
}

/// Split a `set` value list, honoring double-quoted tokens that may
/// contain spaces.
fn split_set_values(rest: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut chars = rest.chars().peekable();
    let mut current = String::new();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    values.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        values.push(current);
    }
    values
}

fn parse_fortinet_text(text: &str) -> (FirewallConfig, Vec<Warning>) {
    let mut config = FirewallConfig::new();
    let mut warnings = Vec::new();
    let mut zone_members: BTreeMap<String, String> = BTreeMap::new();
    let mut rewrite_map: HashMap<String, Vec<String>> = HashMap::new();
    let mut dynamic_routing_lines: Vec<String> = Vec::new();

    let mut context_stack: Vec<String> = Vec::new();
    let mut entry: Option<Entry> = None;
    let mut skip_depth: Option<usize> = None;
    let mut skip_lines: Vec<String> = Vec::new();
    // Depth-balanced raw capture for `config router ospf|bgp` blocks,
    // which may nest `config neighbor` / `edit` / `end` arbitrarily.
    let mut router_capture: Option<(RouteKind, usize)> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((kind, depth)) = router_capture.clone() {
            dynamic_routing_lines.push(raw_line.to_string());
            if line.starts_with("config ") {
                router_capture = Some((kind, depth + 1));
                continue;
            }
            if line == "end" {
                if depth == 0 {
                    router_capture = None;
                } else {
                    router_capture = Some((kind, depth - 1));
                }
                continue;
            }
            materialize_dynamic_route(line, kind, &mut config);
            continue;
        }

        if let Some(depth) = skip_depth {
            if let Some(rest) = line.strip_prefix("config ") {
                skip_lines.push(raw_line.to_string());
                skip_depth = Some(depth + 1);
                let _ = rest;
                continue;
            }
            if line == "end" {
                if depth == 0 {
                    skip_depth = None;
                    warnings.push(
                        Warning::info("dropped-config-block", "unrecognized config block dropped")
                            .with_details(std::mem::take(&mut skip_lines)),
                    );
                } else {
                    skip_lines.push(raw_line.to_string());
                    skip_depth = Some(depth - 1);
                }
                continue;
            }
            skip_lines.push(raw_line.to_string());
            continue;
        }

        if let Some(rest) = line.strip_prefix("config ") {
            let path = rest.trim();
            if path.starts_with("router ospf") {
                router_capture = Some((RouteKind::Ospf, 0));
                dynamic_routing_lines.push(raw_line.to_string());
            } else if path.starts_with("router bgp") {
                router_capture = Some((RouteKind::Bgp, 0));
                dynamic_routing_lines.push(raw_line.to_string());
            } else if KNOWN_CONTEXTS.contains(&path) {
                context_stack.push(path.to_string());
            } else {
                debug!(path, "unknown config block, capturing raw");
                skip_lines = vec![raw_line.to_string()];
                skip_depth = Some(0);
            }
            continue;
        }

        if line == "end" {
            context_stack.pop();
            continue;
        }

        if let Some(rest) = line.strip_prefix("edit ") {
            entry = Some(Entry {
                id: rest.trim().trim_matches('"').to_string(),
                fields: HashMap::new(),
            });
            continue;
        }

        if line == "next" {
            if let (Some(ctx), Some(e)) = (context_stack.last(), entry.take()) {
                finalize_entry(
                    ctx,
                    e,
                    &mut config,
                    &mut warnings,
                    &mut zone_members,
                    &mut rewrite_map,
                );
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("set ") {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let key = parts.next().unwrap_or_default().to_string();
            let value_str = parts.next().unwrap_or_default();
            let values = split_set_values(value_str);
            if let Some(e) = entry.as_mut() {
                e.fields.insert(key, values);
            }
            continue;
        }

        debug!(line, "unrecognized Fortinet top-level line");
    }

    apply_zone_members(&mut config, &zone_members);
    apply_rewrite_map(&mut config, &rewrite_map);

    if !dynamic_routing_lines.is_empty() {
        config.dynamic_routing_config = Some(dynamic_routing_lines.join("\n"));
    }

    (config, warnings)
}

fn materialize_dynamic_route(line: &str, kind: RouteKind, config: &mut FirewallConfig) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.first().copied() != Some("set") || tokens.get(1).copied() != Some("network") {
        return;
    }
    let destination = tokens.get(2).copied().unwrap_or("0.0.0.0/0").to_string();
    config.static_routes.push(StaticRoute {
        destination,
        next_hop: DYNAMIC_ROUTE_NEXT_HOP_SENTINEL.to_string(),
        interface: None,
        admin_distance: if kind == RouteKind::Ospf { 110 } else { 20 },
        kind,
    });
}

fn finalize_entry(
    context: &str,
    entry: Entry,
    config: &mut FirewallConfig,
    warnings: &mut Vec<Warning>,
    zone_members: &mut BTreeMap<String, String>,
    rewrite_map: &mut HashMap<String, Vec<String>>,
) {
    match context {
        "firewall address" => finalize_address(entry, config),
        "firewall addrgrp" => finalize_addrgrp(entry, config),
        "firewall service custom" => finalize_service_custom(entry, config, rewrite_map),
        "firewall service group" => finalize_service_group(entry, config),
        "firewall policy" => finalize_policy(entry, config),
        "firewall vip" => finalize_vip(entry, config),
        "firewall central-snat-map" => finalize_central_snat(entry, config),
        "system interface" => finalize_interface(entry, config),
        "system zone" => finalize_zone(entry, zone_members),
        "router static" => finalize_static_route(entry, config),
        other => {
            warnings.push(Warning::info(
                "unhandled-entry",
                format!("entry in unrecognized context '{other}' dropped"),
            ));
        }
    }
}

fn finalize_address(entry: Entry, config: &mut FirewallConfig) {
    let name = entry.id.clone();
    let addr = match entry.get("type") {
        Some("fqdn") => Address {
            name: name.clone(),
            kind: AddressKind::Fqdn,
            value1: entry.get("fqdn").unwrap_or_default().to_string(),
            value2: None,
        },
        Some("iprange") => Address {
            name: name.clone(),
            kind: AddressKind::Range,
            value1: entry.get("start-ip").unwrap_or_default().to_string(),
            value2: Some(entry.get("end-ip").unwrap_or_default().to_string()),
        },
        _ => {
            let subnet = entry.get_all("subnet");
            let ip = subnet.first().cloned().unwrap_or_default();
            let mask = subnet.get(1).cloned();
            let prefix = mask
                .as_deref()
                .and_then(super::common::mask_to_prefix_len)
                .unwrap_or(32);
            Address {
                name: name.clone(),
                kind: AddressKind::Network,
                value1: ip,
                value2: Some(prefix.to_string()),
            }
        }
    };
    config.addresses.insert(name, addr);
}

fn finalize_addrgrp(entry: Entry, config: &mut FirewallConfig) {
    config.address_groups.insert(
        entry.id.clone(),
        AddressGroup {
            name: entry.id,
            members: entry.get_all("member").into_iter().collect(),
        },
    );
}

fn finalize_service_custom(
    entry: Entry,
    config: &mut FirewallConfig,
    rewrite_map: &mut HashMap<String, Vec<String>>,
) {
    let name = entry.id.clone();
    let tcp_range = entry.get("tcp-portrange").map(str::to_string);
    let udp_range = entry.get("udp-portrange").map(str::to_string);

    match (tcp_range, udp_range) {
        (Some(tcp), Some(udp)) => {
            let tcp_name = format!("TCP-{name}");
            let udp_name = format!("UDP-{name}");
            config.services.insert(
                tcp_name.clone(),
                Service {
                    name: tcp_name.clone(),
                    protocol: Protocol::Tcp,
                    port_spec: tcp,
                },
            );
            config.services.insert(
                udp_name.clone(),
                Service {
                    name: udp_name.clone(),
                    protocol: Protocol::Udp,
                    port_spec: udp,
                },
            );
            let group_name = format!("TCP-UDP_{name}");
            config.service_groups.insert(
                group_name.clone(),
                ServiceGroup {
                    name: group_name.clone(),
                    members: [tcp_name, udp_name].into_iter().collect(),
                },
            );
            rewrite_map.insert(name, vec![group_name]);
        }
        (Some(tcp), None) => {
            config.services.insert(
                name.clone(),
                Service {
                    name: name.clone(),
                    protocol: Protocol::Tcp,
                    port_spec: tcp,
                },
            );
        }
        (None, Some(udp)) => {
            config.services.insert(
                name.clone(),
                Service {
                    name: name.clone(),
                    protocol: Protocol::Udp,
                    port_spec: udp,
                },
            );
        }
        (None, None) => {
            config.services.insert(
                name.clone(),
                Service {
                    name: name.clone(),
                    protocol: Protocol::Other,
                    port_spec: entry.get("protocol-number").unwrap_or_default().to_string(),
                },
            );
        }
    }
}

fn finalize_service_group(entry: Entry, config: &mut FirewallConfig) {
    config.service_groups.insert(
        entry.id.clone(),
        ServiceGroup {
            name: entry.id,
            members: entry.get_all("member").into_iter().collect(),
        },
    );
}

fn finalize_policy(entry: Entry, config: &mut FirewallConfig) {
    let seq = config.next_rule_sequence_id();
    let enabled = entry.get("status") != Some("disable");
    let action = if entry.get("action") == Some("deny") {
        RuleAction::Deny
    } else {
        RuleAction::Allow
    };

    let rule = Rule {
        sequence_id: seq,
        name: entry.id.clone(),
        action,
        enabled,
        log: entry.get("logtraffic").is_some(),
        hit_count: None,
        time_range: None,
        source_interfaces: entry.get_all("srcintf").into_iter().collect(),
        destination_interfaces: entry.get_all("dstintf").into_iter().collect(),
        sources: entry.get_all("srcaddr").into_iter().collect(),
        destinations: entry.get_all("dstaddr").into_iter().collect(),
        services: entry.get_all("service").into_iter().collect(),
        applications: BTreeSet::new(),
        remark: entry.get("comments").map(str::to_string),
    };

    let nat_enabled = entry.get("nat") == Some("enable");
    if nat_enabled {
        let nat_seq = config.next_nat_sequence_id();
        let translated_source = entry
            .get("poolname")
            .map(str::to_string)
            .unwrap_or_else(|| DYNAMIC_IP_AND_PORT.to_string());
        config.nat_rules.push(NatRule {
            sequence_id: nat_seq,
            name: format!("{}_nat", entry.id),
            enabled,
            original_sources: rule.sources.clone(),
            original_destinations: rule.destinations.clone(),
            original_services: rule.services.clone(),
            source_interfaces: rule.source_interfaces.clone(),
            destination_interfaces: rule.destination_interfaces.clone(),
            translated_source: Some(translated_source),
            translated_destination: None,
            translated_service: None,
        });
    }

    config.rules.push(rule);
}

/// Reuse an existing address object whose `value1` already matches, rather
/// than minting a fresh one, so two VIPs sharing a mapped/ext IP share one
/// address object (`examples/original_source/parsers/fortinet_parser.py`'s
/// `_parse_vip_entry`).
fn find_or_synthesize_address(config: &mut FirewallConfig, value: &str, candidate_name: &str) -> String {
    if let Some(existing) = config.addresses.values().find(|a| a.value1 == value) {
        return existing.name.clone();
    }
    let name = config.mint_unique_name(candidate_name);
    config.addresses.insert(
        name.clone(),
        Address {
            name: name.clone(),
            kind: AddressKind::Host,
            value1: value.to_string(),
            value2: None,
        },
    );
    name
}

fn finalize_vip(entry: Entry, config: &mut FirewallConfig) {
    let name = entry.id.clone();
    let extip = entry.get("extip").unwrap_or_default();
    let mappedip = entry.get("mappedip").unwrap_or_default();

    let ext_name = find_or_synthesize_address(config, extip, &format!("{name}_extip"));
    let mapped_name = find_or_synthesize_address(config, mappedip, &format!("{name}_mappedip"));

    let seq = config.next_nat_sequence_id();
    config.nat_rules.push(NatRule {
        sequence_id: seq,
        name,
        enabled: true,
        original_sources: BTreeSet::new(),
        original_destinations: [ext_name].into_iter().collect(),
        original_services: BTreeSet::new(),
        source_interfaces: BTreeSet::new(),
        destination_interfaces: entry.get("extintf").into_iter().map(str::to_string).collect(),
        translated_source: None,
        translated_destination: Some(mapped_name),
        translated_service: None,
    });
}

fn finalize_central_snat(entry: Entry, config: &mut FirewallConfig) {
    let seq = config.next_nat_sequence_id();
    let translated_source = if entry.get("nat") == Some("enable") {
        Some(DYNAMIC_IP_AND_PORT.to_string())
    } else {
        entry.get("nat-ippool").map(str::to_string)
    };
    config.nat_rules.push(NatRule {
        sequence_id: seq,
        name: format!("central_snat_{}", entry.id),
        enabled: entry.get("status") != Some("disable"),
        original_sources: entry.get_all("orig-source-address").into_iter().collect(),
        original_destinations: entry.get_all("dst-address").into_iter().collect(),
        original_services: BTreeSet::new(),
        source_interfaces: entry.get_all("srcintf").into_iter().collect(),
        destination_interfaces: entry.get_all("dstintf").into_iter().collect(),
        translated_source,
        translated_destination: None,
        translated_service: None,
    });
}

fn finalize_interface(entry: Entry, config: &mut FirewallConfig) {
    let name = entry.id.clone();
    let ip_tokens = entry.get_all("ip");
    let prefix = ip_tokens
        .get(1)
        .and_then(|m| super::common::mask_to_prefix_len(m));
    config.interfaces.insert(
        name.clone(),
        Interface {
            name,
            zone: None,
            ipv4_address: ip_tokens.first().cloned(),
            prefix_len: prefix,
            description: entry.get("alias").map(str::to_string),
            vlan_id: entry.get("vlanid").and_then(|v| v.parse().ok()),
            aggregate_members: None,
        },
    );
}

fn finalize_zone(entry: Entry, zone_members: &mut BTreeMap<String, String>) {
    for member in entry.get_all("interface") {
        zone_members.insert(member, entry.id.clone());
    }
}

fn apply_zone_members(config: &mut FirewallConfig, zone_members: &BTreeMap<String, String>) {
    for (member, zone) in zone_members {
        if let Some(iface) = config.interfaces.get_mut(member) {
            iface.zone = Some(zone.clone());
        }
    }
}

fn finalize_static_route(entry: Entry, config: &mut FirewallConfig) {
    let destination = entry
        .get_all("dst")
        .first()
        .cloned()
        .unwrap_or_else(|| "0.0.0.0".to_string());
    let mask = entry.get_all("dst").get(1).cloned();
    let prefix = mask.as_deref().and_then(super::common::mask_to_prefix_len).unwrap_or(32);
    config.static_routes.push(StaticRoute {
        destination: format!("{destination}/{prefix}"),
        next_hop: entry.get("gateway").unwrap_or_default().to_string(),
        interface: entry.get("device").map(str::to_string),
        admin_distance: entry.get("distance").and_then(|d| d.parse().ok()).unwrap_or(10),
        kind: RouteKind::Static,
    });
}

/// Apply the service-split rewrite map to every rule/nat-rule/service-group
/// reference as a second pass, uniformly (spec.md §9 "Rewrite maps as a
/// second pass").
fn apply_rewrite_map(config: &mut FirewallConfig, rewrite_map: &HashMap<String, Vec<String>>) {
    if rewrite_map.is_empty() {
        return;
    }
    let rewrite = |set: &BTreeSet<String>| -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for member in set {
            if let Some(replacements) = rewrite_map.get(member) {
                out.extend(replacements.iter().cloned());
            } else {
                out.insert(member.clone());
            }
        }
        out
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_tcp_udp_service_splits_and_rewrites() {
        let input = "\
config firewall service custom
    edit \"DNS-ALT\"
        set tcp-portrange 5353
        set udp-portrange 5353
    next
end
config firewall policy
    edit 1
        set srcintf \"inside\"
        set dstintf \"outside\"
        set srcaddr \"all\"
        set dstaddr \"all\"
        set service \"DNS-ALT\"
        set action accept
    next
end
";
        let (config, _warnings) = parse_fortinet_text(input);
        assert!(config.services.contains_key("TCP-DNS-ALT"));
        assert!(config.services.contains_key("UDP-DNS-ALT"));
        let group = &config.service_groups["TCP-UDP_DNS-ALT"];
        assert!(group.members.contains("TCP-DNS-ALT"));
        assert!(group.members.contains("UDP-DNS-ALT"));

        let rule = &config.rules[0];
        assert!(rule.services.contains("TCP-UDP_DNS-ALT"));
        assert!(!rule.services.contains("DNS-ALT"));
    }

    #[test]
    fn two_vips_sharing_a_mapped_ip_reuse_one_address_object() {
        let input = "\
config firewall vip
    edit \"VIP1\"
        set extip 203.0.113.5
        set mappedip 10.0.0.5
    next
    edit \"VIP2\"
        set extip 203.0.113.6
        set mappedip 10.0.0.5
    next
end
";
        let (config, _warnings) = parse_fortinet_text(input);
        let mapped_objects: Vec<&str> = config
            .addresses
            .values()
            .filter(|a| a.value1 == "10.0.0.5")
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(mapped_objects.len(), 1, "{mapped_objects:?}");

        let mapped_name = mapped_objects[0];
        assert_eq!(
            config.nat_rules[0].translated_destination.as_deref(),
            Some(mapped_name)
        );
        assert_eq!(
            config.nat_rules[1].translated_destination.as_deref(),
            Some(mapped_name)
        );
    }

    #[test]
    fn policy_with_nat_enable_produces_nat_rule() {
        let input = "\
config firewall policy
    edit 1
        set srcintf \"inside\"
        set dstintf \"outside\"
        set srcaddr \"INSIDE_NET\"
        set dstaddr \"all\"
        set service \"ALL\"
        set action accept
        set nat enable
    next
end
";
        let (config, _warnings) = parse_fortinet_text(input);
        assert_eq!(config.nat_rules.len(), 1);
        assert_eq!(
            config.nat_rules[0].translated_source.as_deref(),
            Some(DYNAMIC_IP_AND_PORT)
        );
    }

    #[test]
    fn unknown_config_block_is_captured_as_warning_detail() {
        let input = "\
config some unknown block
    edit 1
        set foo bar
    next
end
";
        let (_config, warnings) = parse_fortinet_text(input);
        assert_eq!(warnings.len(), 1);
        assert!(!warnings[0].detail_lines.is_empty());
    }

    #[test]
    fn zone_interface_membership_applies_to_interface_object() {
        let input = "\
config system interface
    edit \"port1\"
        set ip 10.0.0.1 255.255.255.0
    next
end
config system zone
    edit \"inside\"
        set interface \"port1\"
    next
end
";
        let (config, _warnings) = parse_fortinet_text(input);
        assert_eq!(config.interfaces["port1"].zone.as_deref(), Some("inside"));
    }
}
