//! Check Point (Gaia + SmartConsole) parser.
//!
//! Three independent sources merge into one `FirewallConfig`: a bracketed
//! Lisp-like objects database, a policy CSV, and an optional NAT CSV. A
//! ZIP of SmartConsole `add-*.csv` exports, when present, overrides objects
//! from the bracketed source (spec.md §4.2.2).

use super::{Parser, ParserInputs, Vendor};
use crate::error::{MigrateError, Result};
use crate::ir::{
    Address, AddressGroup, AddressKind, FirewallConfig, Interface, NatRule, Protocol, RouteKind,
    Rule, RuleAction, Service, ServiceGroup, StaticRoute, Warning,
};
use encoding_rs::WINDOWS_1252;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use tracing::{debug, info};

/// Gaia administrative distance default for statically configured routes.
const GAIA_DEFAULT_ADMIN_DISTANCE: u8 = 1;

pub struct CheckPointParser;

impl Parser for CheckPointParser {
    fn vendor(&self) -> Vendor {
        Vendor::CheckPoint
    }

    fn parse(&self, inputs: &ParserInputs) -> Result<(FirewallConfig, Vec<Warning>)> {
        let objects_bytes = inputs.primary.as_ref().ok_or_else(|| {
            MigrateError::InvalidInput("Check Point parser requires the objects database".into())
        })?;

        let mut config = FirewallConfig::new();
        let mut warnings = Vec::new();

        let objects_text = decode_lenient(objects_bytes);
        parse_objects_database(&objects_text, &mut config, &mut warnings);
        info!(
            addresses = config.addresses.len(),
            services = config.services.len(),
            "parsed Check Point objects database"
        );

        if let Some(policy_bytes) = &inputs.policy_csv {
            let text = decode_lenient(policy_bytes);
            parse_policy_csv(&text, &mut config, &mut warnings);
        }
        if let Some(nat_bytes) = &inputs.nat_csv {
            let text = decode_lenient(nat_bytes);
            parse_nat_csv(&text, &mut config, &mut warnings);
        }
        if let Some(show_config_bytes) = &inputs.show_configuration {
            let text = decode_lenient(show_config_bytes);
            parse_show_configuration(&text, &mut config);
        }
        if let Some(zip_bytes) = &inputs.zip {
            apply_zip_overrides(zip_bytes, &mut config, &mut warnings)?;
        }

        Ok((config, warnings))
    }
}

/// Decode as UTF-8, falling back to CP1252 on invalid sequences (spec.md
/// §6: "decoded UTF-8 then CP1252 fallback").
fn decode_lenient(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (cow, _, _) = WINDOWS_1252.decode(bytes);
            cow.into_owned()
        }
    }
}

// ---------------------------------------------------------------------
// Objects database: a minimal parenthesis-balanced s-expression reader.
// ---------------------------------------------------------------------

#[derive(Debug)]
enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            '"' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                let mut quoted = String::new();
                for next in chars.by_ref() {
                    if next == '"' {
                        break;
                    }
                    quoted.push(next);
                }
                tokens.push(quoted);
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_sexp(tokens: &[String], pos: &mut usize) -> Option<Sexp> {
    let tok = tokens.get(*pos)?;
    if tok == "(" {
        *pos += 1;
        let mut items = Vec::new();
        loop {
            match tokens.get(*pos) {
                Some(t) if t == ")" => {
                    *pos += 1;
                    break;
                }
                Some(_) => {
                    if let Some(item) = parse_sexp(tokens, pos) {
                        items.push(item);
                    } else {
                        break;
                    }
                }
                None => break,
            }
        }
        Some(Sexp::List(items))
    } else {
        *pos += 1;
        Some(Sexp::Atom(tok.clone()))
    }
}

fn parse_top_level(text: &str) -> Vec<Sexp> {
    let tokens = tokenize(text);
    let mut pos = 0;
    let mut forms = Vec::new();
    while pos < tokens.len() {
        match parse_sexp(&tokens, &mut pos) {
            Some(form) => forms.push(form),
            None => break,
        }
    }
    forms
}

/// Find a named key's single list value anywhere in a block: `:KEY (...)`.
fn sexp_get<'a>(block: &'a [Sexp], key: &str) -> Option<&'a Sexp> {
    let target = format!(":{key}");
    let mut i = 0;
    while i < block.len() {
        if let Sexp::Atom(a) = &block[i] {
            if *a == target {
                return block.get(i + 1);
            }
        }
        i += 1;
    }
    None
}

/// Read a `:KEY (value)` as a scalar string.
fn sexp_value(block: &[Sexp], key: &str) -> Option<String> {
    match sexp_get(block, key)? {
        Sexp::List(items) => match items.first()? {
            Sexp::Atom(a) => Some(a.clone()),
            Sexp::List(_) => None,
        },
        Sexp::Atom(a) => Some(a.clone()),
    }
}

fn block_items(sexp: &Sexp) -> &[Sexp] {
    match sexp {
        Sexp::List(items) => items,
        Sexp::Atom(_) => &[],
    }
}

/// Descend into a named top-level table (`:network_objects (...)` /
/// `:services (...)`) and return its child blocks, each shaped
/// `:OBJECT_NAME ( :ClassName (...) :field (...) ... )`.
fn find_table<'a>(forms: &'a [Sexp], table: &str) -> Vec<(&'a str, &'a [Sexp])> {
    let mut out = Vec::new();
    for form in forms {
        if let Sexp::List(items) = form {
            if let Some(Sexp::Atom(a)) = items.first() {
                if *a == format!(":{table}") {
                    if let Some(Sexp::List(children)) = items.get(1) {
                        for child in children {
                            if let Sexp::List(fields) = child {
                                if let Some(Sexp::Atom(name_atom)) = fields.first() {
                                    let name = name_atom.trim_start_matches(':');
                                    if let Some(Sexp::List(body)) = fields.get(1) {
                                        out.push((name, body.as_slice()));
                                    }
                                }
                            }
                        }
                    }
                }
            }
            // Objects databases nest tables inside an outer form; recurse.
            out.extend(find_table(block_items(form), table));
        }
    }
    out
}

fn parse_objects_database(text: &str, config: &mut FirewallConfig, warnings: &mut Vec<Warning>) {
    let forms = parse_top_level(text);

    for (name, body) in find_table(&forms, "network_objects") {
        let Some(class) = sexp_value(body, "ClassName") else {
            continue;
        };
        match class.as_str() {
            "host_plain" | "host_ckp" => {
                let Some(ip) = sexp_value(body, "ipaddr") else {
                    continue;
                };
                config.addresses.insert(
                    name.to_string(),
                    Address {
                        name: name.to_string(),
                        kind: AddressKind::Host,
                        value1: ip,
                        value2: None,
                    },
                );
            }
            c if c.starts_with("gateway_") => {
                if let Some(ip) = sexp_value(body, "ipaddr") {
                    config.addresses.insert(
                        name.to_string(),
                        Address {
                            name: name.to_string(),
                            kind: AddressKind::Host,
                            value1: ip,
                            value2: None,
                        },
                    );
                }
            }
            "network" => {
                let ip = sexp_value(body, "ipaddr").unwrap_or_default();
                let mask = sexp_value(body, "netmask").unwrap_or_default();
                let prefix = super::common::mask_to_prefix_len(&mask).unwrap_or(32);
                config.addresses.insert(
                    name.to_string(),
                    Address {
                        name: name.to_string(),
                        kind: AddressKind::Network,
                        value1: ip,
                        value2: Some(prefix.to_string()),
                    },
                );
            }
            "address_range" => {
                let start = sexp_value(body, "ipaddr_first").unwrap_or_default();
                let end = sexp_value(body, "ipaddr_last").unwrap_or_default();
                config.addresses.insert(
                    name.to_string(),
                    Address {
                        name: name.to_string(),
                        kind: AddressKind::Range,
                        value1: start,
                        value2: Some(end),
                    },
                );
            }
            "domain" => {
                let domain = sexp_value(body, "domain_name").unwrap_or_else(|| name.to_string());
                config.addresses.insert(
                    name.to_string(),
                    Address {
                        name: name.to_string(),
                        kind: AddressKind::Fqdn,
                        value1: domain,
                        value2: None,
                    },
                );
            }
            "network_object_group" => {
                let members = sexp_get(body, "members")
                    .map(extract_reference_members)
                    .unwrap_or_default();
                config.address_groups.insert(
                    name.to_string(),
                    AddressGroup {
                        name: name.to_string(),
                        members,
                    },
                );
            }
            other => {
                debug!(object = name, class = other, "unhandled network_objects class");
                warnings.push(Warning::info(
                    "unhandled-object-class",
                    format!("object '{name}' has unhandled class '{other}'"),
                ));
            }
        }
    }

    for (name, body) in find_table(&forms, "services") {
        let Some(class) = sexp_value(body, "ClassName") else {
            continue;
        };
        let protocol = match class.as_str() {
            "tcp_service" => Protocol::Tcp,
            "udp_service" => Protocol::Udp,
            "icmp_service" => Protocol::Icmp,
            "service_group" => {
                let members = sexp_get(body, "members")
                    .map(extract_reference_members)
                    .unwrap_or_default();
                config.service_groups.insert(
                    name.to_string(),
                    ServiceGroup {
                        name: name.to_string(),
                        members,
                    },
                );
                continue;
            }
            "other_service" => Protocol::Other,
            other => {
                warnings.push(Warning::info(
                    "unhandled-service-class",
                    format!("service '{name}' has unhandled class '{other}'"),
                ));
                continue;
            }
        };
        let port_spec = sexp_value(body, "port").unwrap_or_default();
        config.services.insert(
            name.to_string(),
            Service {
                name: name.to_string(),
                protocol,
                port_spec,
            },
        );
    }
}

/// Extract `ReferenceObject ... Name (X)` member tokens from a group's
/// `:members (...)` list.
fn extract_reference_members(members: &Sexp) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    if let Sexp::List(entries) = members {
        for entry in entries {
            if let Sexp::List(fields) = entry {
                if let Some(name) = sexp_value(fields, "Name") {
                    out.insert(name);
                }
            }
        }
    }
    out
}

// ---------------------------------------------------------------------
// Policy / NAT CSV.
// ---------------------------------------------------------------------

/// Split one CSV row naively on commas. Full RFC 4180 quoting is
/// deliberately not implemented here (CSV framing is an out-of-scope
/// concern; these exports do not quote their semicolon-delimited fields).
fn split_csv_row(line: &str) -> Vec<String> {
    line.split(',').map(|f| f.trim().to_string()).collect()
}

fn semicolon_list_or_any(field: &str) -> BTreeSet<String> {
    if field.trim().is_empty() {
        return ["Any".to_string()].into_iter().collect();
    }
    field
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn header_index(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn parse_policy_csv(text: &str, config: &mut FirewallConfig, warnings: &mut Vec<Warning>) {
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else {
        return;
    };
    let header = split_csv_row(header_line);

    let idx_name = header_index(&header, "Name");
    let idx_source = header_index(&header, "Source");
    let idx_destination = header_index(&header, "Destination");
    let idx_service = header_index(&header, "Service");
    let idx_action = header_index(&header, "Action");
    let idx_enabled = header_index(&header, "Enabled");

    for (row_num, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = split_csv_row(line);
        let get = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("");

        let seq = config.next_rule_sequence_id();
        let name = get(idx_name);
        let name = if name.is_empty() {
            format!("rule_{}", row_num + 1)
        } else {
            name.to_string()
        };
        let action = if get(idx_action).eq_ignore_ascii_case("drop")
            || get(idx_action).eq_ignore_ascii_case("deny")
        {
            RuleAction::Deny
        } else {
            RuleAction::Allow
        };
        let enabled = !get(idx_enabled).eq_ignore_ascii_case("false");

        config.rules.push(Rule {
            sequence_id: seq,
            name,
            action,
            enabled,
            log: false,
            hit_count: None,
            time_range: None,
            source_interfaces: BTreeSet::new(),
            destination_interfaces: BTreeSet::new(),
            sources: semicolon_list_or_any(get(idx_source)),
            destinations: semicolon_list_or_any(get(idx_destination)),
            services: semicolon_list_or_any(get(idx_service)),
            applications: BTreeSet::new(),
            remark: None,
        });
    }

    if config.rules.is_empty() {
        warnings.push(Warning::info(
            "empty-policy-csv",
            "policy CSV contained a header but no rule rows",
        ));
    }
}

fn parse_nat_csv(text: &str, config: &mut FirewallConfig, _warnings: &mut Vec<Warning>) {
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else {
        return;
    };
    let header = split_csv_row(header_line);

    let idx_source = header_index(&header, "Original Source");
    let idx_destination = header_index(&header, "Original Destination");
    let idx_service = header_index(&header, "Original Service");
    let idx_translated_source = header_index(&header, "Translated Source");
    let idx_translated_destination = header_index(&header, "Translated Destination");
    let idx_method = header_index(&header, "Translation Method");

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = split_csv_row(line);
        let get = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("");

        let seq = config.next_nat_sequence_id();
        let translated_source = if get(idx_method).eq_ignore_ascii_case("hide") {
            Some(crate::ir::DYNAMIC_IP_AND_PORT.to_string())
        } else {
            let v = get(idx_translated_source);
            (!v.is_empty()).then(|| v.to_string())
        };
        let translated_destination = {
            let v = get(idx_translated_destination);
            (!v.is_empty()).then(|| v.to_string())
        };

        config.nat_rules.push(NatRule {
            sequence_id: seq,
            name: format!("nat_{seq}"),
            enabled: true,
            original_sources: semicolon_list_or_any(get(idx_source)),
            original_destinations: semicolon_list_or_any(get(idx_destination)),
            original_services: semicolon_list_or_any(get(idx_service)),
            source_interfaces: BTreeSet::new(),
            destination_interfaces: BTreeSet::new(),
            translated_source,
            translated_destination,
            translated_service: None,
        });
    }
}

// ---------------------------------------------------------------------
// Gaia `show configuration` text: interfaces and static routes.
// ---------------------------------------------------------------------

static RE_CP_INTERFACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^set interface (\S+) ipv4-address (\S+) mask-length (\d+)$").unwrap());
static RE_CP_INTERFACE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^set interface (\S+) comments "([^"]+)"$"#).unwrap());
static RE_CP_DEFAULT_ROUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^set static-route default nexthop gateway address (\S+)").unwrap());
static RE_CP_STATIC_ROUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^set static-route (\S+) nexthop gateway address (\S+)").unwrap());

/// Parse a Gaia `show configuration` dump for interfaces and static routes
/// (spec.md §4.2.2), mirroring `_parse_show_configuration` in the original
/// Check Point parser.
fn parse_show_configuration(text: &str, config: &mut FirewallConfig) {
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = RE_CP_INTERFACE.captures(line) {
            let if_name = &caps[1];
            let ip_address = caps[2].to_string();
            let mask_length: u8 = caps[3].parse().unwrap_or(32);
            let iface = config
                .interfaces
                .entry(if_name.to_string())
                .or_insert_with(|| Interface::named(if_name));
            iface.ipv4_address = Some(ip_address);
            iface.prefix_len = Some(mask_length);
            // In Gaia, the interface name often doubles as its zone.
            iface.zone = Some(if_name.to_string());
            continue;
        }

        if let Some(caps) = RE_CP_INTERFACE_COMMENT.captures(line) {
            let if_name = &caps[1];
            let comment = caps[2].to_string();
            if let Some(iface) = config.interfaces.get_mut(if_name) {
                iface.description = Some(comment);
            }
            continue;
        }

        if let Some(caps) = RE_CP_DEFAULT_ROUTE.captures(line) {
            let next_hop = caps[1].to_string();
            config.static_routes.push(StaticRoute {
                destination: "0.0.0.0/0".to_string(),
                next_hop,
                interface: None,
                admin_distance: GAIA_DEFAULT_ADMIN_DISTANCE,
                kind: RouteKind::Static,
            });
            continue;
        }

        if let Some(caps) = RE_CP_STATIC_ROUTE.captures(line) {
            let destination = caps[1].to_string();
            let next_hop = caps[2].to_string();
            config.static_routes.push(StaticRoute {
                destination,
                next_hop,
                interface: None,
                admin_distance: GAIA_DEFAULT_ADMIN_DISTANCE,
                kind: RouteKind::Static,
            });
            continue;
        }
    }
}

// ---------------------------------------------------------------------
// SmartConsole ZIP overrides.
// ---------------------------------------------------------------------

fn apply_zip_overrides(
    zip_bytes: &[u8],
    config: &mut FirewallConfig,
    warnings: &mut Vec<Warning>,
) -> Result<()> {
    let cursor = Cursor::new(zip_bytes);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| MigrateError::Parse(format!("invalid Check Point ZIP export: {e}")))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| MigrateError::Parse(format!("corrupt ZIP member: {e}")))?;
        let entry_name = entry.name().to_string();
        if entry_name.contains("__MACOSX") || entry_name.rsplit('/').next().unwrap_or("").starts_with('.') {
            continue;
        }
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| MigrateError::Parse(format!("could not read ZIP member {entry_name}: {e}")))?;
        let text = decode_lenient(&bytes);

        if entry_name.contains("add-host") || entry_name.contains("add-network") {
            apply_object_csv_override(&text, config, AddressKind::Host, AddressKind::Network);
        } else if entry_name.contains("add-address-range") {
            apply_range_csv_override(&text, config);
        } else if entry_name.contains("add-group") {
            apply_group_csv_override(&text, config);
        } else if entry_name.contains("add-service-tcp") {
            apply_service_csv_override(&text, config, Protocol::Tcp);
        } else if entry_name.contains("add-service-udp") {
            apply_service_csv_override(&text, config, Protocol::Udp);
        } else if entry_name.contains("add-service-group") {
            apply_service_group_csv_override(&text, config);
        } else {
            debug!(member = entry_name, "unmatched ZIP member, skipped");
            warnings.push(Warning::info(
                "unmatched-zip-member",
                format!("ZIP member '{entry_name}' matched no known add-* export pattern"),
            ));
        }
    }
    Ok(())
}

fn apply_object_csv_override(
    text: &str,
    config: &mut FirewallConfig,
    host_kind: AddressKind,
    network_kind: AddressKind,
) {
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else { return };
    let header = split_csv_row(header_line);
    let idx_name = header_index(&header, "name");
    let idx_ip = header_index(&header, "ip-address");
    let idx_mask = header_index(&header, "subnet-mask");

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = split_csv_row(line);
        let get = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("");
        let name = get(idx_name);
        if name.is_empty() {
            continue;
        }
        let ip = get(idx_ip).to_string();
        let mask = get(idx_mask);
        let (kind, value2) = if mask.is_empty() {
            (host_kind, None)
        } else {
            let prefix = super::common::mask_to_prefix_len(mask).unwrap_or(32);
            (network_kind, Some(prefix.to_string()))
        };
        config.addresses.insert(
            name.to_string(),
            Address {
                name: name.to_string(),
                kind,
                value1: ip,
                value2,
            },
        );
    }
}

fn apply_range_csv_override(text: &str, config: &mut FirewallConfig) {
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else { return };
    let header = split_csv_row(header_line);
    let idx_name = header_index(&header, "name");
    let idx_first = header_index(&header, "ip-address-first");
    let idx_last = header_index(&header, "ip-address-last");

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = split_csv_row(line);
        let get = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("");
        let name = get(idx_name);
        if name.is_empty() {
            continue;
        }
        config.addresses.insert(
            name.to_string(),
            Address {
                name: name.to_string(),
                kind: AddressKind::Range,
                value1: get(idx_first).to_string(),
                value2: Some(get(idx_last).to_string()),
            },
        );
    }
}

fn apply_group_csv_override(text: &str, config: &mut FirewallConfig) {
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else { return };
    let header = split_csv_row(header_line);
    let idx_name = header_index(&header, "name");
    let member_indices: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| h.to_ascii_lowercase().starts_with("members."))
        .map(|(i, _)| i)
        .collect();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = split_csv_row(line);
        let Some(name) = idx_name.and_then(|i| row.get(i)) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let members: BTreeSet<String> = member_indices
            .iter()
            .filter_map(|i| row.get(*i))
            .filter(|m| !m.is_empty())
            .map(String::clone)
            .collect();
        config.address_groups.insert(
            name.clone(),
            AddressGroup {
                name: name.clone(),
                members,
            },
        );
    }
}

fn apply_service_csv_override(text: &str, config: &mut FirewallConfig, protocol: Protocol) {
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else { return };
    let header = split_csv_row(header_line);
    let idx_name = header_index(&header, "name");
    let idx_port = header_index(&header, "port");

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = split_csv_row(line);
        let get = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("");
        let name = get(idx_name);
        if name.is_empty() {
            continue;
        }
        config.services.insert(
            name.to_string(),
            Service {
                name: name.to_string(),
                protocol,
                port_spec: get(idx_port).to_string(),
            },
        );
    }
}

fn apply_service_group_csv_override(text: &str, config: &mut FirewallConfig) {
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else { return };
    let header = split_csv_row(header_line);
    let idx_name = header_index(&header, "name");
    let member_indices: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| h.to_ascii_lowercase().starts_with("members."))
        .map(|(i, _)| i)
        .collect();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = split_csv_row(line);
        let Some(name) = idx_name.and_then(|i| row.get(i)) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let members: BTreeSet<String> = member_indices
            .iter()
            .filter_map(|i| row.get(*i))
            .filter(|m| !m.is_empty())
            .map(String::clone)
            .collect();
        config.service_groups.insert(
            name.clone(),
            ServiceGroup {
                name: name.clone(),
                members,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_database_parses_host_and_network_and_group() {
        let text = r#"
(
:network_objects (
  :WebSrv (
    :ClassName (host_plain)
    :ipaddr (10.0.0.5)
  )
  :LanNet (
    :ClassName (network)
    :ipaddr (10.0.0.0)
    :netmask (255.255.255.0)
  )
  :WebGroup (
    :ClassName (network_object_group)
    :members (
      : (
        :Name (WebSrv)
      )
    )
  )
)
)
"#;
        let mut config = FirewallConfig::new();
        let mut warnings = Vec::new();
        parse_objects_database(text, &mut config, &mut warnings);

        assert_eq!(config.addresses["WebSrv"].value1, "10.0.0.5");
        assert_eq!(config.addresses["LanNet"].value2.as_deref(), Some("24"));
        assert!(config.address_groups["WebGroup"].members.contains("WebSrv"));
    }

    #[test]
    fn policy_csv_defaults_empty_columns_to_any() {
        let csv = "Name,Source,Destination,Service,Action,Enabled\nAllow-Web,,,HTTP,Accept,true\n";
        let mut config = FirewallConfig::new();
        let mut warnings = Vec::new();
        parse_policy_csv(csv, &mut config, &mut warnings);

        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].sources, ["Any".to_string()].into_iter().collect());
        assert_eq!(config.rules[0].action, RuleAction::Allow);
    }

    #[test]
    fn show_configuration_parses_interfaces_and_routes() {
        let text = "\
set interface eth0 ipv4-address 10.0.0.1 mask-length 24
set interface eth0 comments \"inside LAN\"
set static-route default nexthop gateway address 10.0.0.254
set static-route 172.16.0.0/24 nexthop gateway address 10.0.0.253
";
        let mut config = FirewallConfig::new();
        parse_show_configuration(text, &mut config);

        let iface = &config.interfaces["eth0"];
        assert_eq!(iface.ipv4_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(iface.prefix_len, Some(24));
        assert_eq!(iface.zone.as_deref(), Some("eth0"));
        assert_eq!(iface.description.as_deref(), Some("inside LAN"));

        assert_eq!(config.static_routes.len(), 2);
        assert!(
            config
                .static_routes
                .iter()
                .any(|r| r.destination == "0.0.0.0/0" && r.next_hop == "10.0.0.254")
        );
        assert!(
            config
                .static_routes
                .iter()
                .any(|r| r.destination == "172.16.0.0/24" && r.next_hop == "10.0.0.253")
        );
    }

    #[test]
    fn nat_csv_hide_method_maps_to_dynamic_ip_and_port() {
        let csv = "Original Source,Original Destination,Original Service,Translated Source,Translated Destination,Translation Method\nLanNet,,,,,Hide\n";
        let mut config = FirewallConfig::new();
        let mut warnings = Vec::new();
        parse_nat_csv(csv, &mut config, &mut warnings);

        assert_eq!(
            config.nat_rules[0].translated_source.as_deref(),
            Some(crate::ir::DYNAMIC_IP_AND_PORT)
        );
    }
}
