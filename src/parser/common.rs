//! Shared parsing utilities used by more than one vendor parser.

use crate::ir::{Address, AddressKind, FirewallConfig};

/// Convert a dotted-decimal subnet mask to a CIDR prefix length by
/// popcount, as ASA's `consume_address` does (spec.md §4.2.1).
#[must_use]
pub fn mask_to_prefix_len(mask: &str) -> Option<u8> {
    let octets: Vec<u32> = mask.split('.').filter_map(|o| o.parse().ok()).collect();
    if octets.len() != 4 {
        return None;
    }
    let bits = octets.iter().fold(0u32, |acc, &o| (acc << 8) | o);
    Some(bits.count_ones() as u8)
}

/// The inverse: CIDR prefix length to dotted-decimal mask, used by
/// generators that must re-emit a mask-style address.
#[must_use]
pub fn prefix_len_to_mask(len: u8) -> String {
    let bits: u32 = if len == 0 { 0 } else { !0u32 << (32 - u32::from(len)) };
    format!(
        "{}.{}.{}.{}",
        (bits >> 24) & 0xFF,
        (bits >> 16) & 0xFF,
        (bits >> 8) & 0xFF,
        bits & 0xFF
    )
}

/// Result of resolving one address-like token sequence: a name (existing or
/// freshly synthesized) and the number of tokens consumed.
pub struct ConsumedAddress {
    pub name: String,
    pub tokens_consumed: usize,
}

/// Single source of truth for address-token grammar shared by the ASA
/// parser's ACL and NAT handling (spec.md §4.2.1: "A token-scanner
/// sub-routine `consume_address(tokens)`"). Recognizes:
///
/// - `any` / `any4` / `any6`
/// - `host IP`
/// - `object-group NAME` / `object NAME`
/// - `IP MASK`
///
/// Synthesizes and inserts a host/network `Address` into `config` when the
/// tokens describe a literal value rather than a named reference, minting a
/// collision-free name via `FirewallConfig::mint_unique_name`.
pub fn consume_address(tokens: &[&str], config: &mut FirewallConfig) -> Option<ConsumedAddress> {
    let first = *tokens.first()?;
    match first {
        "any" | "any4" | "any6" => Some(ConsumedAddress {
            name: "any".to_string(),
            tokens_consumed: 1,
        }),
        "host" => {
            let ip = *tokens.get(1)?;
            let name = config.mint_unique_name(&format!("host_{ip}"));
            config.addresses.insert(
                name.clone(),
                Address {
                    name: name.clone(),
                    kind: AddressKind::Host,
                    value1: ip.to_string(),
                    value2: None,
                },
            );
            Some(ConsumedAddress {
                name,
                tokens_consumed: 2,
            })
        }
        "object-group" | "object" => {
            let name = (*tokens.get(1)?).to_string();
            Some(ConsumedAddress {
                name,
                tokens_consumed: 2,
            })
        }
        ip if is_dotted_quad(ip) => {
            let mask = tokens.get(1).copied().unwrap_or("255.255.255.255");
            if is_dotted_quad(mask) {
                let prefix = mask_to_prefix_len(mask).unwrap_or(32);
                let name = config.mint_unique_name(&format!("net_{ip}_{prefix}"));
                config.addresses.insert(
                    name.clone(),
                    Address {
                        name: name.clone(),
                        kind: AddressKind::Network,
                        value1: ip.to_string(),
                        value2: Some(prefix.to_string()),
                    },
                );
                Some(ConsumedAddress {
                    name,
                    tokens_consumed: 2,
                })
            } else {
                let name = config.mint_unique_name(&format!("host_{ip}"));
                config.addresses.insert(
                    name.clone(),
                    Address {
                        name: name.clone(),
                        kind: AddressKind::Host,
                        value1: ip.to_string(),
                        value2: None,
                    },
                );
                Some(ConsumedAddress {
                    name,
                    tokens_consumed: 1,
                })
            }
        }
        _ => None,
    }
}

fn is_dotted_quad(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    parts.len() == 4 && parts.iter().all(|p| p.parse::<u8>().is_ok())
}

/// Strip terminal-emulator escape sequences and other non-printable noise
/// left behind by a pasted-from-terminal export, per spec.md §4.2.1.
#[must_use]
pub fn strip_terminal_noise(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            // Consume a CSI escape sequence: ESC '[' ... final-byte.
            if chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }
        if c == '\u{8}' {
            // Backspace: drop it and the previously-emitted character.
            out.pop();
            continue;
        }
        if c == '\r' {
            continue;
        }
        if c.is_control() && c != '\n' && c != '\t' {
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_popcount_round_trips_common_lengths() {
        assert_eq!(mask_to_prefix_len("255.255.255.0"), Some(24));
        assert_eq!(mask_to_prefix_len("255.255.255.255"), Some(32));
        assert_eq!(mask_to_prefix_len("0.0.0.0"), Some(0));
        assert_eq!(prefix_len_to_mask(24), "255.255.255.0");
    }

    #[test]
    fn consume_address_host_synthesizes_object() {
        let mut cfg = FirewallConfig::new();
        let tokens = ["host", "1.2.3.4"];
        let consumed = consume_address(&tokens, &mut cfg).unwrap();
        assert_eq!(consumed.name, "host_1.2.3.4");
        assert_eq!(consumed.tokens_consumed, 2);
        assert!(cfg.addresses.contains_key("host_1.2.3.4"));
    }

    #[test]
    fn consume_address_network_popcounts_mask() {
        let mut cfg = FirewallConfig::new();
        let tokens = ["10.0.0.0", "255.255.255.0"];
        let consumed = consume_address(&tokens, &mut cfg).unwrap();
        assert_eq!(consumed.name, "net_10.0.0.0_24");
        let addr = &cfg.addresses[&consumed.name];
        assert_eq!(addr.value2.as_deref(), Some("24"));
    }

    #[test]
    fn consume_address_any_does_not_synthesize() {
        let mut cfg = FirewallConfig::new();
        let consumed = consume_address(&["any"], &mut cfg).unwrap();
        assert_eq!(consumed.name, "any");
        assert!(cfg.addresses.is_empty());
    }

    #[test]
    fn strip_terminal_noise_removes_csi_sequences() {
        let input = "\u{1b}[1mhostname\u{1b}[0m router1";
        assert_eq!(strip_terminal_noise(input), "hostname router1");
    }
}
