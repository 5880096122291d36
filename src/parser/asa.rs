//! Cisco ASA parser.
//!
//! Input is a single ASCII text. Terminal-emulator escape sequences and
//! non-printable noise are stripped first, then the parser walks lines
//! statefully, recognizing `object`/`object-group` blocks, `access-list`
//! rules, manual NAT, interfaces, and routing (spec.md §4.2.1).

use super::common::{consume_address, mask_to_prefix_len, strip_terminal_noise};
use super::{Parser, ParserInputs, Vendor};
use crate::error::{MigrateError, Result};
use crate::ir::{
    Address, AddressGroup, AddressKind, DYNAMIC_ROUTE_NEXT_HOP_SENTINEL, FirewallConfig,
    Interface, NatRule, Protocol, RouteKind, Rule, RuleAction, Service, ServiceGroup, StaticRoute,
    Warning,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Cisco ASA parser.
pub struct AsaParser;

impl Parser for AsaParser {
    fn vendor(&self) -> Vendor {
        Vendor::Asa
    }

    fn parse(&self, inputs: &ParserInputs) -> Result<(FirewallConfig, Vec<Warning>)> {
        let bytes = inputs
            .primary
            .as_ref()
            .ok_or_else(|| MigrateError::InvalidInput("ASA parser requires a config blob".into()))?;
        if bytes.is_empty() {
            return Err(MigrateError::InvalidInput("ASA config blob is empty".into()));
        }
        let text = String::from_utf8_lossy(bytes);
        let cleaned = strip_terminal_noise(&text);
        info!(bytes = bytes.len(), "parsing ASA configuration");
        Ok(parse_asa_text(&cleaned))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Block {
    None,
    ObjectNetwork(String),
    ObjectService(String),
    ObjectGroupNetwork(String),
    ObjectGroupService(String),
    Interface(String),
    Router(String),
}

struct AsaParseState {
    config: FirewallConfig,
    warnings: Vec<Warning>,
    pending_remark: Option<String>,
}

static RE_OBJECT_NETWORK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^object network (\S+)$").unwrap());
static RE_OBJECT_SERVICE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^object service (\S+)$").unwrap());
static RE_OBJECT_GROUP_NETWORK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^object-group network (\S+)$").unwrap());
static RE_OBJECT_GROUP_SERVICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^object-group service (\S+)(?:\s+(tcp|udp|tcp-udp))?$").unwrap());
static RE_INTERFACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^interface (\S+)$").unwrap());
static RE_ROUTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^router (ospf|bgp) (\d+)$").unwrap());
static RE_ACL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^access-list (\S+) extended (permit|deny) (.+)$").unwrap()
});
static RE_ACL_REMARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^access-list (\S+) remark (.*)$").unwrap());
static RE_NAT_INLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^nat \((\S+),(\S+)\) (dynamic|static) (.+)$").unwrap()
});
static RE_MANUAL_NAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^nat \((\S+),(\S+)\) source (dynamic|static) (\S+) (\S+)(?: destination static (\S+) (\S+))?(\s+unidirectional)?$").unwrap()
});
static RE_ROUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^route (\S+) (\S+) (\S+) (\S+)(?: (\d+))?$").unwrap());
static RE_HITCNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(hitcnt=(\d+)\)").unwrap());

fn parse_asa_text(text: &str) -> (FirewallConfig, Vec<Warning>) {
    let mut state = AsaParseState {
        config: FirewallConfig::new(),
        warnings: Vec::new(),
        pending_remark: None,
    };
    let mut block = Block::None;
    let mut dynamic_routing_lines: Vec<String> = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim_end();
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let is_indented = line.starts_with(' ') || line.starts_with('\t');

        if !is_indented {
            // A new top-level statement ends whatever block we were in.
            block = Block::None;
        }

        match &block {
            Block::ObjectNetwork(name) => {
                if is_indented {
                    handle_object_network_body(&mut state, name, trimmed);
                    continue;
                }
            }
            Block::ObjectService(name) => {
                if is_indented {
                    handle_object_service_body(&mut state, name, trimmed);
                    continue;
                }
            }
            Block::ObjectGroupNetwork(name) => {
                if is_indented {
                    handle_object_group_network_body(&mut state, name, trimmed);
                    continue;
                }
            }
            Block::ObjectGroupService(name) => {
                if is_indented {
                    handle_object_group_service_body(&mut state, name, trimmed);
                    continue;
                }
            }
            Block::Interface(name) => {
                if is_indented {
                    handle_interface_body(&mut state, name, trimmed);
                    continue;
                }
            }
            Block::Router(protocol) => {
                if is_indented {
                    handle_router_body(&mut state, protocol, trimmed, &mut dynamic_routing_lines);
                    continue;
                }
            }
            Block::None => {}
        }

        // Top-level statement dispatch.
        if let Some(caps) = RE_OBJECT_NETWORK.captures(trimmed) {
            block = Block::ObjectNetwork(caps[1].to_string());
        } else if let Some(caps) = RE_OBJECT_SERVICE.captures(trimmed) {
            block = Block::ObjectService(caps[1].to_string());
        } else if let Some(caps) = RE_OBJECT_GROUP_NETWORK.captures(trimmed) {
            let name = caps[1].to_string();
            state.config.address_groups.insert(
                name.clone(),
                AddressGroup {
                    name: name.clone(),
                    members: BTreeSet::new(),
                },
            );
            block = Block::ObjectGroupNetwork(name);
        } else if let Some(caps) = RE_OBJECT_GROUP_SERVICE.captures(trimmed) {
            let name = caps[1].to_string();
            state.config.service_groups.insert(
                name.clone(),
                ServiceGroup {
                    name: name.clone(),
                    members: BTreeSet::new(),
                },
            );
            block = Block::ObjectGroupService(name);
        } else if let Some(caps) = RE_INTERFACE.captures(trimmed) {
            let name = caps[1].to_string();
            state
                .config
                .interfaces
                .insert(name.clone(), Interface::named(&name));
            block = Block::Interface(name);
        } else if let Some(caps) = RE_ROUTER.captures(trimmed) {
            let protocol = caps[1].to_string();
            dynamic_routing_lines.push(trimmed.to_string());
            block = Block::Router(protocol);
        } else if let Some(caps) = RE_ACL_REMARK.captures(trimmed) {
            state.pending_remark = Some(caps[2].to_string());
        } else if let Some(caps) = RE_ACL.captures(trimmed) {
            handle_acl_line(&mut state, &caps[1], &caps[2], &caps[3]);
        } else if let Some(caps) = RE_MANUAL_NAT.captures(trimmed) {
            handle_manual_nat(&mut state, &caps);
        } else if let Some(caps) = RE_ROUTE.captures(trimmed) {
            handle_route(&mut state, &caps);
        } else if trimmed == "!" || trimmed.starts_with("ASA Version") || trimmed.starts_with("hostname ") {
            // Ignored boilerplate.
        } else {
            debug!(line = trimmed, "unrecognized ASA top-level line");
            state.warnings.push(
                Warning::info("unrecognized-line", "unrecognized top-level configuration line")
                    .with_line(trimmed),
            );
        }
    }

    if !dynamic_routing_lines.is_empty() {
        state.config.dynamic_routing_config = Some(dynamic_routing_lines.join("\n"));
    }

    (state.config, state.warnings)
}

fn handle_object_network_body(state: &mut AsaParseState, name: &str, line: &str) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.first().copied() {
        Some("host") => {
            if let Some(ip) = tokens.get(1) {
                state.config.addresses.insert(
                    name.to_string(),
                    Address {
                        name: name.to_string(),
                        kind: AddressKind::Host,
                        value1: (*ip).to_string(),
                        value2: None,
                    },
                );
            }
        }
        Some("subnet") => {
            if let (Some(ip), Some(mask)) = (tokens.get(1), tokens.get(2)) {
                let prefix = mask_to_prefix_len(mask).unwrap_or(32);
                state.config.addresses.insert(
                    name.to_string(),
                    Address {
                        name: name.to_string(),
                        kind: AddressKind::Network,
                        value1: (*ip).to_string(),
                        value2: Some(prefix.to_string()),
                    },
                );
            }
        }
        Some("range") => {
            if let (Some(start), Some(end)) = (tokens.get(1), tokens.get(2)) {
                state.config.addresses.insert(
                    name.to_string(),
                    Address {
                        name: name.to_string(),
                        kind: AddressKind::Range,
                        value1: (*start).to_string(),
                        value2: Some((*end).to_string()),
                    },
                );
            }
        }
        Some("fqdn") => {
            // `fqdn [v4|v6] DOMAIN` — the optional family token is skipped.
            let domain = tokens
                .iter()
                .skip(1)
                .find(|t| **t != "v4" && **t != "v6")
                .copied();
            if let Some(domain) = domain {
                state.config.addresses.insert(
                    name.to_string(),
                    Address {
                        name: name.to_string(),
                        kind: AddressKind::Fqdn,
                        value1: domain.to_string(),
                        value2: None,
                    },
                );
            }
        }
        Some("nat") => {
            handle_object_nat(state, name, line);
        }
        Some("description") => {
            // Descriptions on address objects are not modeled in the IR;
            // intentionally dropped (no generator target consumes it).
        }
        _ => {
            state.warnings.push(
                Warning::info(
                    "unrecognized-object-body",
                    format!("unrecognized body line in object network {name}"),
                )
                .with_line(line),
            );
        }
    }
}

fn handle_object_nat(state: &mut AsaParseState, object_name: &str, line: &str) {
    if let Some(caps) = RE_NAT_INLINE.captures(line) {
        let src_if = caps[1].to_string();
        let dst_if = caps[2].to_string();
        let kind = &caps[3];
        let rest = caps[4].trim();

        let seq = state.config.next_nat_sequence_id();
        let mut nat = NatRule {
            sequence_id: seq,
            name: format!("{object_name}_nat_{seq}"),
            enabled: true,
            original_sources: [object_name.to_string()].into_iter().collect(),
            original_destinations: BTreeSet::new(),
            original_services: BTreeSet::new(),
            source_interfaces: [src_if].into_iter().collect(),
            destination_interfaces: [dst_if].into_iter().collect(),
            translated_source: None,
            translated_destination: None,
            translated_service: None,
        };

        if kind == "dynamic" && rest == "interface" {
            nat.translated_source = Some(crate::ir::DYNAMIC_IP_AND_PORT.to_string());
        } else {
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            if let Some(translated) = tokens.first() {
                nat.translated_source = Some((*translated).to_string());
            }
        }

        state.config.nat_rules.push(nat);
    } else {
        state.warnings.push(
            Warning::info(
                "unrecognized-nat",
                format!("unrecognized inline nat statement on object {object_name}"),
            )
            .with_line(line),
        );
    }
}

fn handle_object_service_body(state: &mut AsaParseState, name: &str, line: &str) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.first().copied() != Some("service") {
        return;
    }
    let protocol = match tokens.get(1).copied() {
        Some("tcp") => Protocol::Tcp,
        Some("udp") => Protocol::Udp,
        _ => Protocol::Other,
    };
    let port_spec = if tokens.get(2).copied() == Some("destination") {
        tokens[3..].join(" ")
    } else {
        String::new()
    };
    state.config.services.insert(
        name.to_string(),
        Service {
            name: name.to_string(),
            protocol,
            port_spec,
        },
    );
}

fn handle_object_group_network_body(state: &mut AsaParseState, group: &str, line: &str) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let member = match tokens.first().copied() {
        Some("network-object") => {
            if tokens.get(1).copied() == Some("object") {
                tokens.get(2).map(|s| (*s).to_string())
            } else {
                let rest: Vec<&str> = tokens[1..].to_vec();
                consume_address(&rest, &mut state.config).map(|c| c.name)
            }
        }
        Some("group-object") => tokens.get(1).map(|s| (*s).to_string()),
        _ => None,
    };
    if let Some(member) = member {
        if let Some(group) = state.config.address_groups.get_mut(group) {
            group.members.insert(member);
        }
    } else {
        state.warnings.push(
            Warning::info(
                "unrecognized-object-group-body",
                format!("unrecognized member line in object-group network {group}"),
            )
            .with_line(line),
        );
    }
}

fn handle_object_group_service_body(state: &mut AsaParseState, group: &str, line: &str) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let member = match tokens.first().copied() {
        Some("service-object") => {
            if tokens.get(1).copied() == Some("object") {
                tokens.get(2).map(|s| (*s).to_string())
            } else {
                let protocol = match tokens.get(1).copied() {
                    Some("tcp") => Protocol::Tcp,
                    Some("udp") => Protocol::Udp,
                    _ => Protocol::Other,
                };
                let port_spec = if tokens.get(2).copied() == Some("destination") {
                    tokens[3..].join(" ")
                } else {
                    String::new()
                };
                let synth = state
                    .config
                    .mint_unique_name(&format!("{}_{}", protocol, port_spec.replace(' ', "_")));
                state.config.services.insert(
                    synth.clone(),
                    Service {
                        name: synth.clone(),
                        protocol,
                        port_spec,
                    },
                );
                Some(synth)
            }
        }
        Some("port-object") => {
            let port_spec = tokens[1..].join(" ");
            let synth = state
                .config
                .mint_unique_name(&format!("port_{}", port_spec.replace(' ', "_")));
            state.config.services.insert(
                synth.clone(),
                Service {
                    name: synth.clone(),
                    protocol: Protocol::Other,
                    port_spec,
                },
            );
            Some(synth)
        }
        Some("group-object") => tokens.get(1).map(|s| (*s).to_string()),
        _ => None,
    };
    if let Some(member) = member {
        if let Some(group) = state.config.service_groups.get_mut(group) {
            group.members.insert(member);
        }
    } else {
        state.warnings.push(
            Warning::info(
                "unrecognized-object-group-body",
                format!("unrecognized member line in object-group service {group}"),
            )
            .with_line(line),
        );
    }
}

fn handle_interface_body(state: &mut AsaParseState, name: &str, line: &str) {
    let Some(iface) = state.config.interfaces.get_mut(name) else {
        return;
    };
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.first().copied() {
        Some("nameif") => {
            // nameif renames the logical interface used everywhere else
            // (ACLs reference `inside`/`outside`, not the physical name).
            // We keep the physical name as the IR identity and store the
            // nameif string in `zone`, matching common downstream usage
            // where nameif doubles as the zone-equivalent concept on ASA.
            if let Some(logical) = tokens.get(1) {
                iface.zone = Some((*logical).to_string());
            }
        }
        Some("ip") if tokens.get(1).copied() == Some("address") => {
            if let (Some(ip), Some(mask)) = (tokens.get(2), tokens.get(3)) {
                iface.ipv4_address = Some((*ip).to_string());
                iface.prefix_len = mask_to_prefix_len(mask);
            }
        }
        Some("description") => {
            iface.description = Some(tokens[1..].join(" "));
        }
        Some("vlan") => {
            if let Some(id) = tokens.get(1).and_then(|v| v.parse().ok()) {
                iface.vlan_id = Some(id);
            }
        }
        _ => {}
    }
}

fn handle_router_body(
    state: &mut AsaParseState,
    protocol: &str,
    line: &str,
    raw_lines: &mut Vec<String>,
) {
    raw_lines.push(format!(" {line}"));
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.first().copied() == Some("network") {
        let destination = tokens.get(1).copied().unwrap_or("0.0.0.0/0").to_string();
        let kind = if protocol == "ospf" {
            RouteKind::Ospf
        } else {
            RouteKind::Bgp
        };
        state.config.static_routes.push(StaticRoute {
            destination,
            next_hop: DYNAMIC_ROUTE_NEXT_HOP_SENTINEL.to_string(),
            interface: None,
            admin_distance: if protocol == "ospf" { 110 } else { 20 },
            kind,
        });
    }
}

fn handle_acl_line(state: &mut AsaParseState, acl_name: &str, action: &str, rest: &str) {
    let mut tokens: Vec<&str> = rest.split_whitespace().collect();

    let log = take_flag(&mut tokens, "log");
    let inactive = take_flag(&mut tokens, "inactive");
    let time_range = take_keyed(&mut tokens, "time-range");
    let hitcnt = RE_HITCNT.captures(rest).and_then(|c| c[1].parse::<u64>().ok());
    // Strip the hitcnt token itself if present (it's parenthesized, so a
    // plain token match wouldn't catch it via take_flag).
    tokens.retain(|t| !t.starts_with("(hitcnt="));

    let protocol_token = tokens.first().copied().unwrap_or("ip");
    tokens.remove(0);

    let Some(source) = consume_address(&tokens, &mut state.config) else {
        state.warnings.push(
            Warning::warn("malformed-acl", format!("could not parse source in ACL {acl_name}"))
                .with_line(rest),
        );
        return;
    };
    tokens.drain(0..source.tokens_consumed);

    let Some(destination) = consume_address(&tokens, &mut state.config) else {
        state.warnings.push(
            Warning::warn(
                "malformed-acl",
                format!("could not parse destination in ACL {acl_name}"),
            )
            .with_line(rest),
        );
        return;
    };
    tokens.drain(0..destination.tokens_consumed);

    let service_name = resolve_inline_or_grouped_service(state, protocol_token, &tokens);

    let seq = state.config.next_rule_sequence_id();
    let rule = Rule {
        sequence_id: seq,
        name: format!("{acl_name}_{seq}"),
        action: if action == "permit" {
            RuleAction::Allow
        } else {
            RuleAction::Deny
        },
        enabled: !inactive,
        log,
        hit_count: hitcnt,
        time_range,
        source_interfaces: BTreeSet::new(),
        destination_interfaces: BTreeSet::new(),
        sources: [source.name].into_iter().collect(),
        destinations: [destination.name].into_iter().collect(),
        services: service_name.into_iter().collect(),
        applications: BTreeSet::new(),
        remark: state.pending_remark.take(),
    };
    state.config.rules.push(rule);
}

fn resolve_inline_or_grouped_service(
    state: &mut AsaParseState,
    protocol_token: &str,
    tokens: &[&str],
) -> Option<String> {
    match protocol_token {
        "ip" => None,
        "object-group" => tokens.first().map(|s| (*s).to_string()),
        "tcp" | "udp" => {
            let protocol = if protocol_token == "tcp" {
                Protocol::Tcp
            } else {
                Protocol::Udp
            };
            let port_spec = tokens.join(" ");
            let name = state
                .config
                .mint_unique_name(&format!("{}_{}", protocol_token.to_uppercase(), port_spec.replace(' ', "_")));
            state.config.services.insert(
                name.clone(),
                Service {
                    name: name.clone(),
                    protocol,
                    port_spec,
                },
            );
            Some(name)
        }
        "icmp" => {
            let name = state.config.mint_unique_name("ICMP");
            state.config.services.insert(
                name.clone(),
                Service {
                    name: name.clone(),
                    protocol: Protocol::Icmp,
                    port_spec: tokens.join(" "),
                },
            );
            Some(name)
        }
        other => Some(other.to_string()),
    }
}

fn take_flag(tokens: &mut Vec<&str>, flag: &str) -> bool {
    if let Some(pos) = tokens.iter().position(|t| *t == flag) {
        tokens.remove(pos);
        true
    } else {
        false
    }
}

fn take_keyed(tokens: &mut Vec<&str>, key: &str) -> Option<String> {
    let pos = tokens.iter().position(|t| *t == key)?;
    tokens.remove(pos);
    if pos < tokens.len() {
        Some(tokens.remove(pos))
    } else {
        None
    }
}

fn handle_manual_nat(state: &mut AsaParseState, caps: &regex::Captures<'_>) {
    let src_if = caps[1].to_string();
    let dst_if = caps[2].to_string();
    let kind = &caps[3];
    let original_source = caps[4].to_string();
    let translated_source = caps[5].to_string();
    let original_destination = caps.get(6).map(|m| m.as_str().to_string());
    let translated_destination = caps.get(7).map(|m| m.as_str().to_string());
    let unidirectional = caps.get(8).is_some();

    // `source static ... destination static ...` is twice-NAT: both
    // directions are stated explicitly in the one command, so no reverse
    // rule is synthesized. Plain manual static NAT (source-static only)
    // gets an automatic reverse rule when not `unidirectional` (spec.md
    // §4.2.1, §8 boundary behavior).
    let is_twice_nat = kind == "static" && original_destination.is_some();

    let seq = state.config.next_nat_sequence_id();
    let forward = NatRule {
        sequence_id: seq,
        name: if is_twice_nat {
            format!("twice_nat_{seq}")
        } else {
            format!("manual_nat_{seq}")
        },
        enabled: true,
        original_sources: [original_source.clone()].into_iter().collect(),
        original_destinations: original_destination.into_iter().collect(),
        original_services: BTreeSet::new(),
        source_interfaces: [src_if.clone()].into_iter().collect(),
        destination_interfaces: [dst_if.clone()].into_iter().collect(),
        translated_source: if kind == "dynamic" && translated_source == "interface" {
            Some(crate::ir::DYNAMIC_IP_AND_PORT.to_string())
        } else {
            Some(translated_source.clone())
        },
        translated_destination,
        translated_service: None,
    };
    state.config.nat_rules.push(forward);

    if kind == "static" && !is_twice_nat && !unidirectional {
        let reverse_seq = state.config.next_nat_sequence_id();
        let reverse = NatRule {
            sequence_id: reverse_seq,
            name: format!("manual_nat_{reverse_seq}_reverse"),
            enabled: true,
            original_sources: BTreeSet::new(),
            original_destinations: [translated_source].into_iter().collect(),
            original_services: BTreeSet::new(),
            source_interfaces: [dst_if].into_iter().collect(),
            destination_interfaces: [src_if].into_iter().collect(),
            translated_source: None,
            translated_destination: Some(original_source),
            translated_service: None,
        };
        state.config.nat_rules.push(reverse);
    }
}

fn handle_route(state: &mut AsaParseState, caps: &regex::Captures<'_>) {
    let interface = caps[1].to_string();
    let dest_ip = &caps[2];
    let mask = &caps[3];
    let next_hop = caps[4].to_string();
    let distance = caps
        .get(5)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1);
    let prefix = mask_to_prefix_len(mask).unwrap_or(32);
    state.config.static_routes.push(StaticRoute {
        destination: format!("{dest_ip}/{prefix}"),
        next_hop,
        interface: Some(interface),
        admin_distance: distance,
        kind: RouteKind::Static,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::DYNAMIC_IP_AND_PORT;

    #[test]
    fn inline_pat_scenario() {
        let input = "\
object network INSIDE_NET
 subnet 10.0.0.0 255.255.255.0
 nat (inside,outside) dynamic interface
";
        let (config, warnings) = parse_asa_text(input);
        assert!(warnings.is_empty(), "{warnings:?}");
        let addr = &config.addresses["INSIDE_NET"];
        assert_eq!(addr.value1, "10.0.0.0");
        assert_eq!(addr.value2.as_deref(), Some("24"));

        assert_eq!(config.nat_rules.len(), 1);
        let nat = &config.nat_rules[0];
        assert_eq!(nat.original_sources, ["INSIDE_NET".to_string()].into_iter().collect());
        assert_eq!(nat.translated_source.as_deref(), Some(DYNAMIC_IP_AND_PORT));
        assert_eq!(nat.source_interfaces, ["inside".to_string()].into_iter().collect());
        assert_eq!(nat.destination_interfaces, ["outside".to_string()].into_iter().collect());
    }

    #[test]
    fn shadowed_acl_scenario() {
        let input = "\
access-list ACL extended permit ip any any
access-list ACL extended permit tcp host 1.2.3.4 host 5.6.7.8 eq 80
";
        let (config, _warnings) = parse_asa_text(input);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].sources, ["any".to_string()].into_iter().collect());
        assert!(config.rules[1].sources.iter().next().unwrap().starts_with("host_1.2.3.4"));
    }

    #[test]
    fn manual_static_nat_without_unidirectional_is_bidirectional() {
        let input = "\
nat (inside,outside) source static WEB_SERVER WEB_SERVER_EXT
";
        let (config, _warnings) = parse_asa_text(input);
        assert_eq!(config.nat_rules.len(), 2);
        assert_eq!(config.nat_rules[1].translated_destination.as_deref(), Some("WEB_SERVER"));
        assert!(config.nat_rules[1].original_destinations.contains("WEB_SERVER_EXT"));
    }

    #[test]
    fn twice_nat_shaped_input_produces_single_rule_without_reverse() {
        let input = "\
nat (inside,outside) source static WEB_SERVER WEB_SERVER_EXT destination static ANY ANY
";
        let (config, _warnings) = parse_asa_text(input);
        assert_eq!(config.nat_rules.len(), 1);
        assert!(config.nat_rules[0].original_destinations.contains("ANY"));
    }

    #[test]
    fn interface_block_captures_nameif_and_address() {
        let input = "\
interface GigabitEthernet0/0
 nameif inside
 ip address 10.0.0.1 255.255.255.0
 description LAN uplink
";
        let (config, _warnings) = parse_asa_text(input);
        let iface = &config.interfaces["GigabitEthernet0/0"];
        assert_eq!(iface.zone.as_deref(), Some("inside"));
        assert_eq!(iface.ipv4_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(iface.prefix_len, Some(24));
        assert_eq!(iface.description.as_deref(), Some("LAN uplink"));
    }

    #[test]
    fn ospf_network_materializes_dynamic_route() {
        let input = "\
router ospf 1
 network 192.168.1.0 0.0.0.255 area 0
";
        let (config, _warnings) = parse_asa_text(input);
        assert_eq!(config.static_routes.len(), 1);
        assert_eq!(config.static_routes[0].next_hop, DYNAMIC_ROUTE_NEXT_HOP_SENTINEL);
        assert!(config.dynamic_routing_config.is_some());
    }
}
