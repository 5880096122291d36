//! Palo Alto Networks (PAN-OS SET format) parser.
//!
//! Input is a flat list of `set ...` commands. An optional Panorama prefix
//! (`device-group "DG"` or `template "T" vsys "V"`) is stripped from each
//! line so the same regexes work for standalone and Panorama exports.
//! Rule/NAT-rule commands contribute one key at a time; keys for the same
//! rule name are merged into a working record and finalized after the full
//! pass (spec.md §4.2.4).

use super::{Parser, ParserInputs, Vendor};
use crate::error::{MigrateError, Result};
use crate::ir::{
    Address, AddressGroup, AddressKind, DYNAMIC_IP_AND_PORT, FirewallConfig, Interface, NatRule,
    Protocol, RESERVED_ANY, Rule, RuleAction, Service, ServiceGroup, StaticRoute, Warning, RouteKind,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::info;

pub struct PaloAltoParser;

impl Parser for PaloAltoParser {
    fn vendor(&self) -> Vendor {
        Vendor::PaloAlto
    }

    fn parse(&self, inputs: &ParserInputs) -> Result<(FirewallConfig, Vec<Warning>)> {
        let bytes = inputs.primary.as_ref().ok_or_else(|| {
            MigrateError::InvalidInput("Palo Alto parser requires a SET-format blob".into())
        })?;
        if bytes.is_empty() {
            return Err(MigrateError::InvalidInput("Palo Alto config blob is empty".into()));
        }
        let text = String::from_utf8_lossy(bytes);
        info!(bytes = bytes.len(), "parsing Palo Alto configuration");
        Ok(parse_panos_text(&text))
    }
}

static RE_PANORAMA_DEVICE_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^device-group "?([^"\s]+)"?\s+(.*)$"#).unwrap());
static RE_PANORAMA_TEMPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^template "?([^"\s]+)"?\s+vsys "?([^"\s]+)"?\s+(.*)$"#).unwrap());

static RE_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^address (\S+) (ip-netmask|ip-range|fqdn) (.+)$").unwrap());
static RE_SERVICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^service (\S+) protocol (tcp|udp) port (\S+)$").unwrap());
static RE_ADDRESS_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^address-group (\S+) static \[ (.*) \]$").unwrap());
static RE_SERVICE_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^service-group (\S+) members \[ (.*) \]$").unwrap());
static RE_ZONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^zone (\S+) network (layer2|layer3|virtual-wire) \[ (.*) \]$").unwrap());
static RE_INTERFACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^network interface (\S+) layer3 ip (\S+)$").unwrap());
static RE_STATIC_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^network virtual-router (\S+) static-route (\S+) destination (\S+) nexthop ip (\S+)$")
        .unwrap()
});
static RE_SECURITY_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rulebase security rules (\S+) (from|to|source|destination|service|application|action|disabled|description|log-end) (.+)$").unwrap()
});
static RE_NAT_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rulebase nat rules (\S+) (from|to|source|destination|service|source-translation|destination-translation|bi-directional|disabled|description) (.+)$").unwrap()
});
static RE_BRACKET_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[ (.*) \]$").unwrap());

#[derive(Default)]
struct RecordTable {
    order: Vec<String>,
    fields: HashMap<String, HashMap<String, String>>,
}

impl RecordTable {
    fn set(&mut self, name: &str, key: &str, value: &str) {
        if !self.fields.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.fields
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }
}

fn parse_panos_text(text: &str) -> (FirewallConfig, Vec<Warning>) {
    let mut config = FirewallConfig::new();
    let mut warnings = Vec::new();
    let mut security_rules = RecordTable::default();
    let mut nat_rules = RecordTable::default();
    let mut zone_members: BTreeMap<String, String> = BTreeMap::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        let Some(rest) = line.strip_prefix("set ") else {
            continue;
        };
        let command = strip_panorama_prefix(rest);

        if let Some(caps) = RE_ADDRESS.captures(command) {
            handle_address(&caps, &mut config);
        } else if let Some(caps) = RE_SERVICE.captures(command) {
            handle_service(&caps, &mut config);
        } else if let Some(caps) = RE_ADDRESS_GROUP.captures(command) {
            handle_address_group(&caps, &mut config);
        } else if let Some(caps) = RE_SERVICE_GROUP.captures(command) {
            handle_service_group(&caps, &mut config);
        } else if let Some(caps) = RE_ZONE.captures(command) {
            handle_zone(&caps, &mut zone_members);
        } else if let Some(caps) = RE_INTERFACE.captures(command) {
            handle_interface(&caps, &mut config);
        } else if let Some(caps) = RE_STATIC_ROUTE.captures(command) {
            handle_static_route(&caps, &mut config);
        } else if let Some(caps) = RE_SECURITY_RULE.captures(command) {
            security_rules.set(&caps[1], &caps[2], &caps[3]);
        } else if let Some(caps) = RE_NAT_RULE.captures(command) {
            nat_rules.set(&caps[1], &caps[2], &caps[3]);
        } else {
            warnings.push(
                Warning::info("unrecognized-command", "unrecognized PAN-OS SET command")
                    .with_line(line),
            );
        }
    }

    apply_zone_members(&mut config, &zone_members);
    finalize_security_rules(&security_rules, &mut config);
    finalize_nat_rules(&nat_rules, &mut config);

    (config, warnings)
}

/// Strip a leading `device-group "DG"` or `template "T" vsys "V"` prefix so
/// the remainder matches the standalone command grammar.
fn strip_panorama_prefix(command: &str) -> &str {
    if let Some(caps) = RE_PANORAMA_TEMPLATE.captures(command) {
        let start = caps.get(3).unwrap().start();
        return &command[start..];
    }
    if let Some(caps) = RE_PANORAMA_DEVICE_GROUP.captures(command) {
        let start = caps.get(2).unwrap().start();
        return &command[start..];
    }
    command
}

fn split_bracket_list(text: &str) -> BTreeSet<String> {
    let inner = RE_BRACKET_LIST
        .captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| text.to_string());
    inner
        .split_whitespace()
        .map(|t| t.trim_matches('"').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn handle_address(caps: &regex::Captures<'_>, config: &mut FirewallConfig) {
    let name = caps[1].to_string();
    let kind_token = &caps[2];
    let value = caps[3].trim().trim_matches('"');
    let address = match kind_token {
        "ip-netmask" => {
            let mut parts = value.splitn(2, '/');
            let ip = parts.next().unwrap_or_default().to_string();
            let prefix = parts.next().unwrap_or("32");
            Address {
                name: name.clone(),
                kind: AddressKind::Network,
                value1: ip,
                value2: Some(prefix.to_string()),
            }
        }
        "ip-range" => {
            let mut parts = value.splitn(2, '-');
            let start = parts.next().unwrap_or_default().to_string();
            let end = parts.next().unwrap_or_default().to_string();
            Address {
                name: name.clone(),
                kind: AddressKind::Range,
                value1: start,
                value2: Some(end),
            }
        }
        _ => Address {
            name: name.clone(),
            kind: AddressKind::Fqdn,
            value1: value.to_string(),
            value2: None,
        },
    };
    config.addresses.insert(name, address);
}

fn handle_service(caps: &regex::Captures<'_>, config: &mut FirewallConfig) {
    let name = caps[1].to_string();
    let protocol = if &caps[2] == "tcp" { Protocol::Tcp } else { Protocol::Udp };
    config.services.insert(
        name.clone(),
        Service {
            name,
            protocol,
            port_spec: caps[3].to_string(),
        },
    );
}

fn handle_address_group(caps: &regex::Captures<'_>, config: &mut FirewallConfig) {
    let name = caps[1].to_string();
    config.address_groups.insert(
        name.clone(),
        AddressGroup {
            name,
            members: split_bracket_list(&format!("[ {} ]", &caps[2])),
        },
    );
}

fn handle_service_group(caps: &regex::Captures<'_>, config: &mut FirewallConfig) {
    let name = caps[1].to_string();
    config.service_groups.insert(
        name.clone(),
        ServiceGroup {
            name,
            members: split_bracket_list(&format!("[ {} ]", &caps[2])),
        },
    );
}

fn handle_zone(caps: &regex::Captures<'_>, zone_members: &mut BTreeMap<String, String>) {
    let zone = caps[1].to_string();
    for member in split_bracket_list(&format!("[ {} ]", &caps[3])) {
        zone_members.insert(member, zone.clone());
    }
}

fn apply_zone_members(config: &mut FirewallConfig, zone_members: &BTreeMap<String, String>) {
    for (member, zone) in zone_members {
        config
            .interfaces
            .entry(member.clone())
            .or_insert_with(|| Interface::named(member))
            .zone = Some(zone.clone());
    }
}

fn handle_interface(caps: &regex::Captures<'_>, config: &mut FirewallConfig) {
    let name = caps[1].to_string();
    let mut parts = caps[2].splitn(2, '/');
    let ip = parts.next().unwrap_or_default().to_string();
    let prefix = parts.next().and_then(|p| p.parse().ok());
    config
        .interfaces
        .entry(name.clone())
        .or_insert_with(|| Interface::named(&name))
        .ipv4_address = Some(ip);
    if let Some(iface) = config.interfaces.get_mut(&name) {
        iface.prefix_len = prefix;
    }
}

fn handle_static_route(caps: &regex::Captures<'_>, config: &mut FirewallConfig) {
    config.static_routes.push(StaticRoute {
        destination: caps[3].to_string(),
        next_hop: caps[4].to_string(),
        interface: None,
        admin_distance: 10,
        kind: RouteKind::Static,
    });
}

fn finalize_security_rules(table: &RecordTable, config: &mut FirewallConfig) {
    for name in &table.order {
        let fields = &table.fields[name];
        let seq = config.next_rule_sequence_id();
        let get = |k: &str| fields.get(k).map(String::as_str).unwrap_or_default();
        let list = |k: &str| split_bracket_list(get(k));

        config.rules.push(Rule {
            sequence_id: seq,
            name: name.clone(),
            action: if get("action") == "deny" {
                RuleAction::Deny
            } else {
                RuleAction::Allow
            },
            enabled: get("disabled") != "yes",
            log: fields.get("log-end").map(|v| v == "yes").unwrap_or(false),
            hit_count: None,
            time_range: None,
            source_interfaces: list("from"),
            destination_interfaces: list("to"),
            sources: list("source"),
            destinations: list("destination"),
            services: list("service"),
            applications: list("application"),
            remark: fields.get("description").cloned(),
        });
    }
}

fn finalize_nat_rules(table: &RecordTable, config: &mut FirewallConfig) {
    for name in &table.order {
        let fields = &table.fields[name];
        let get = |k: &str| fields.get(k).map(String::as_str).unwrap_or_default();
        let list = |k: &str| split_bracket_list(get(k));
        let bidirectional = get("bi-directional") == "yes";

        let source_translation = parse_translation(get("source-translation"));
        let destination_translation = parse_translation(get("destination-translation"));

        let seq = config.next_nat_sequence_id();
        config.nat_rules.push(NatRule {
            sequence_id: seq,
            name: name.clone(),
            enabled: get("disabled") != "yes",
            original_sources: list("source"),
            original_destinations: list("destination"),
            original_services: list("service"),
            source_interfaces: list("from"),
            destination_interfaces: list("to"),
            translated_source: source_translation.clone(),
            translated_destination: destination_translation.clone(),
            translated_service: None,
        });

        if bidirectional {
            let original_source = list("source");
            if let (Some(translated_src), false) = (&source_translation, original_source.is_empty()) {
                let internal_object_name = original_source.iter().next().cloned().unwrap_or_default();
                let reverse_seq = config.next_nat_sequence_id();
                config.nat_rules.push(NatRule {
                    sequence_id: reverse_seq,
                    name: format!("DNAT_of_{name}"),
                    enabled: get("disabled") != "yes",
                    original_sources: [RESERVED_ANY.to_string()].into_iter().collect(),
                    original_destinations: [translated_src.clone()].into_iter().collect(),
                    original_services: list("service"),
                    source_interfaces: list("to"),
                    destination_interfaces: list("from"),
                    translated_source: None,
                    translated_destination: Some(internal_object_name),
                    translated_service: None,
                });
            }
        }
    }
}

/// A `source-translation`/`destination-translation` value is either
/// `dynamic-ip-and-port interface` (PAT) or `static-ip ADDR`.
fn parse_translation(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if value.starts_with("dynamic-ip-and-port") {
        return Some(DYNAMIC_IP_AND_PORT.to_string());
    }
    if let Some(rest) = value.strip_prefix("static-ip ") {
        return Some(rest.trim().to_string());
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_and_security_rule_parse() {
        let input = "\
set address WebSrv ip-netmask 10.0.0.5/32
set rulebase security rules Allow-Web from trust
set rulebase security rules Allow-Web to untrust
set rulebase security rules Allow-Web source WebSrv
set rulebase security rules Allow-Web destination any
set rulebase security rules Allow-Web service any
set rulebase security rules Allow-Web action allow
";
        let (config, warnings) = parse_panos_text(input);
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.addresses["WebSrv"].value2.as_deref(), Some("32"));
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].sources, ["WebSrv".to_string()].into_iter().collect());
    }

    #[test]
    fn panorama_device_group_prefix_is_stripped() {
        let input = "set device-group \"DG1\" address WebSrv ip-netmask 10.0.0.5/32\n";
        let (config, _warnings) = parse_panos_text(input);
        assert!(config.addresses.contains_key("WebSrv"));
    }

    #[test]
    fn wildcard_fqdn_address_is_captured_as_fqdn_kind() {
        let input = "set address WildSite fqdn *.example.com\n";
        let (config, _warnings) = parse_panos_text(input);
        assert!(config.addresses["WildSite"].is_wildcard_fqdn());
    }

    #[test]
    fn bidirectional_source_translation_synthesizes_reverse_nat() {
        let input = "\
set rulebase nat rules Out-NAT source Srv1
set rulebase nat rules Out-NAT destination any
set rulebase nat rules Out-NAT service any
set rulebase nat rules Out-NAT source-translation static-ip 203.0.113.5
set rulebase nat rules Out-NAT bi-directional yes
";
        let (config, _warnings) = parse_panos_text(input);
        assert_eq!(config.nat_rules.len(), 2);
        assert_eq!(config.nat_rules[1].name, "DNAT_of_Out-NAT");
        assert!(config.nat_rules[1].original_destinations.contains("203.0.113.5"));
        assert_eq!(config.nat_rules[1].translated_destination.as_deref(), Some("Srv1"));
    }
}
