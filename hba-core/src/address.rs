//! Address field model: keyword, host and CIDR matching

use crate::error::AddressError;
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Default IPv4 prefix length at or below which a range counts as wide
pub const DEFAULT_WIDE_V4_PREFIX: u8 = 16;

/// Default IPv6 prefix length at or below which a range counts as wide
pub const DEFAULT_WIDE_V6_PREFIX: u8 = 48;

/// Dynamic address keywords that cannot be resolved without the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialKind {
    #[default]
    None,
    /// `samehost`: any of the server's own addresses
    SameHost,
    /// `samenet`: any subnet the server is directly connected to
    SameNet,
}

/// Normalized address/network field of one rule
///
/// Networks are stored truncated to their base address. A set may hold
/// IPv4 and IPv6 networks side by side; they are never merged and a
/// network of one family never interacts with a network of the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSet {
    any: bool,
    special: SpecialKind,
    networks: Vec<IpNet>,
    original: String,
}

impl AddressSet {
    /// Address set that matches every client address
    pub fn any(original: impl Into<String>) -> Self {
        Self {
            any: true,
            special: SpecialKind::None,
            networks: Vec::new(),
            original: original.into(),
        }
    }

    /// Placeholder used for `local` rules, which have no address field
    pub fn local() -> Self {
        Self::any("local")
    }

    /// Build a set from concrete networks
    pub fn from_networks(
        networks: impl IntoIterator<Item = IpNet>,
        original: impl Into<String>,
    ) -> Self {
        Self {
            any: false,
            special: SpecialKind::None,
            networks: networks.into_iter().map(|n| n.trunc()).collect(),
            original: original.into(),
        }
    }

    /// Parse a single address token: `all`, `samehost`, `samenet`, an IP or a CIDR block
    pub fn parse(token: &str) -> Result<Self, AddressError> {
        let original = token.to_string();
        let normalized = token.trim().to_ascii_lowercase();

        match normalized.as_str() {
            "all" => return Ok(Self::any(original)),
            "samehost" => {
                return Ok(Self {
                    any: false,
                    special: SpecialKind::SameHost,
                    networks: vec![
                        IpNet::V4(Ipv4Net::from(Ipv4Addr::LOCALHOST)),
                        IpNet::V6(Ipv6Net::from(Ipv6Addr::LOCALHOST)),
                    ],
                    original,
                });
            }
            "samenet" => {
                // The server's subnets are unknown statically, so treat it as unrestricted.
                return Ok(Self {
                    any: true,
                    special: SpecialKind::SameNet,
                    networks: Vec::new(),
                    original,
                });
            }
            _ => {}
        }

        let invalid = || AddressError::InvalidAddress {
            token: original.clone(),
        };

        let net = if normalized.contains('/') {
            normalized.parse::<IpNet>().map_err(|_| invalid())?
        } else {
            let ip = normalized.parse::<IpAddr>().map_err(|_| invalid())?;
            IpNet::from(ip)
        };

        Ok(Self::from_networks([net], original))
    }

    /// Parse the two-field `address netmask` form
    pub fn with_netmask(address: &str, mask: &str) -> Result<Self, AddressError> {
        let bad_mask = || AddressError::InvalidNetmask {
            address: address.to_string(),
            mask: mask.to_string(),
        };

        let ip = address
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| AddressError::InvalidAddress {
                token: address.to_string(),
            })?;
        let netmask = mask.trim().parse::<IpAddr>().map_err(|_| bad_mask())?;

        let net = match (ip, netmask) {
            (IpAddr::V4(ip), IpAddr::V4(m)) => {
                let prefix =
                    contiguous_prefix(u128::from(u32::from(m)) << 96).ok_or_else(bad_mask)?;
                IpNet::V4(Ipv4Net::new(ip, prefix).map_err(|_| bad_mask())?)
            }
            (IpAddr::V6(ip), IpAddr::V6(m)) => {
                let prefix = contiguous_prefix(u128::from(m)).ok_or_else(bad_mask)?;
                IpNet::V6(Ipv6Net::new(ip, prefix).map_err(|_| bad_mask())?)
            }
            _ => return Err(bad_mask()),
        };

        Ok(Self::from_networks([net], format!("{} {}", address, mask)))
    }

    pub fn is_any(&self) -> bool {
        self.any
    }

    pub fn special(&self) -> SpecialKind {
        self.special
    }

    pub fn networks(&self) -> &[IpNet] {
        &self.networks
    }

    /// Address text as written in the config file
    pub fn original(&self) -> &str {
        &self.original
    }

    /// True when every network lies inside 127.0.0.0/8 or ::1/128
    pub fn is_loopback_only(&self) -> bool {
        if self.any || self.networks.is_empty() {
            return false;
        }

        self.networks.iter().all(|net| match net {
            IpNet::V4(v4) => v4.prefix_len() >= 8 && v4.network().octets()[0] == 127,
            IpNet::V6(v6) => v6.prefix_len() == 128 && v6.network() == Ipv6Addr::LOCALHOST,
        })
    }

    /// True when the set is unrestricted or any network's prefix is at or
    /// below the threshold for its family
    pub fn is_wide(&self, v4_prefix: u8, v6_prefix: u8) -> bool {
        if self.any {
            return true;
        }

        self.networks.iter().any(|net| match net {
            IpNet::V4(v4) => v4.prefix_len() <= v4_prefix,
            IpNet::V6(v6) => v6.prefix_len() <= v6_prefix,
        })
    }

    /// True when every address matched by `other` is also matched by `self`
    pub fn covers(&self, other: &AddressSet) -> bool {
        if self.any {
            return true;
        }
        if other.any || other.networks.is_empty() {
            return false;
        }

        other
            .networks
            .iter()
            .all(|theirs| self.networks.iter().any(|ours| net_contains(ours, theirs)))
    }

    /// True when at least one address is matched by both sets
    pub fn intersects(&self, other: &AddressSet) -> bool {
        if self.any || other.any {
            return true;
        }

        self.networks
            .iter()
            .any(|ours| other.networks.iter().any(|theirs| net_overlaps(ours, theirs)))
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

fn same_family(a: &IpNet, b: &IpNet) -> bool {
    matches!((a, b), (IpNet::V4(_), IpNet::V4(_)) | (IpNet::V6(_), IpNet::V6(_)))
}

/// `outer` holds `inner` entirely: same family, inner's base inside outer,
/// and outer is at least as large
fn net_contains(outer: &IpNet, inner: &IpNet) -> bool {
    same_family(outer, inner)
        && outer.contains(&inner.network())
        && outer.prefix_len() <= inner.prefix_len()
}

fn net_overlaps(a: &IpNet, b: &IpNet) -> bool {
    same_family(a, b) && (a.contains(&b.network()) || b.contains(&a.network()))
}

/// Prefix length of a left-aligned netmask, None if its one bits are not contiguous
fn contiguous_prefix(bits: u128) -> Option<u8> {
    let ones = bits.leading_ones();
    let rest = bits.checked_shl(ones).unwrap_or(0);
    if rest != 0 {
        return None;
    }
    u8::try_from(ones).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(token: &str) -> AddressSet {
        AddressSet::parse(token).unwrap()
    }

    #[test]
    fn test_parse_keywords() {
        let all = addr("all");
        assert!(all.is_any());
        assert_eq!(all.special(), SpecialKind::None);

        let samenet = addr("samenet");
        assert!(samenet.is_any());
        assert_eq!(samenet.special(), SpecialKind::SameNet);

        let samehost = addr("SameHost");
        assert!(!samehost.is_any());
        assert_eq!(samehost.special(), SpecialKind::SameHost);
        assert_eq!(samehost.networks().len(), 2);
        assert!(samehost.is_loopback_only());
        assert_eq!(samehost.original(), "SameHost");
    }

    #[test]
    fn test_parse_single_ip() {
        let v4 = addr("10.1.2.3");
        assert_eq!(v4.networks(), &["10.1.2.3/32".parse::<IpNet>().unwrap()]);

        let v6 = addr("2001:db8::1");
        assert_eq!(v6.networks(), &["2001:db8::1/128".parse::<IpNet>().unwrap()]);
    }

    #[test]
    fn test_parse_cidr_truncates_host_bits() {
        let set = addr("10.0.0.5/16");
        assert_eq!(set.networks(), &["10.0.0.0/16".parse::<IpNet>().unwrap()]);
        assert_eq!(set.to_string(), "10.0.0.5/16");
    }

    #[test]
    fn test_parse_invalid() {
        for token in ["db.example.com", "10.0.0.0/33", "10.0.0", "::1/129", ""] {
            assert_eq!(
                AddressSet::parse(token),
                Err(AddressError::InvalidAddress {
                    token: token.to_string()
                }),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn test_with_netmask() {
        let set = AddressSet::with_netmask("192.168.12.10", "255.255.255.0").unwrap();
        assert_eq!(set.networks(), &["192.168.12.0/24".parse::<IpNet>().unwrap()]);

        let v6 = AddressSet::with_netmask("2001:db8::", "ffff:ffff::").unwrap();
        assert_eq!(v6.networks(), &["2001:db8::/32".parse::<IpNet>().unwrap()]);

        assert!(AddressSet::with_netmask("10.0.0.0", "255.0.255.0").is_err());
        assert!(AddressSet::with_netmask("10.0.0.0", "ffff::").is_err());
        assert!(AddressSet::with_netmask("host.example", "255.0.0.0").is_err());
    }

    #[test]
    fn test_loopback_only() {
        assert!(addr("127.0.0.1").is_loopback_only());
        assert!(addr("127.0.0.0/8").is_loopback_only());
        assert!(addr("::1/128").is_loopback_only());
        assert!(!addr("127.0.0.0/7").is_loopback_only());
        assert!(!addr("10.0.0.1").is_loopback_only());
        assert!(!addr("::/0").is_loopback_only());
        assert!(!addr("all").is_loopback_only());
        assert!(!AddressSet::from_networks(Vec::<IpNet>::new(), "").is_loopback_only());
    }

    #[test]
    fn test_wide_thresholds() {
        assert!(addr("all").is_wide(16, 48));
        assert!(addr("0.0.0.0/0").is_wide(16, 48));
        assert!(addr("10.0.0.0/16").is_wide(16, 48));
        assert!(!addr("10.0.0.0/17").is_wide(16, 48));
        assert!(addr("2001:db8::/48").is_wide(16, 48));
        assert!(!addr("2001:db8::/64").is_wide(16, 48));
        // Raising the threshold only adds wide classifications.
        assert!(addr("10.0.0.0/17").is_wide(17, 48));
        assert!(addr("10.0.0.0/17").is_wide(24, 48));
        // Families use their own threshold.
        assert!(!addr("2001:db8::/24").is_wide(32, 16));
    }

    #[test]
    fn test_covers() {
        let wide = addr("10.0.0.0/16");
        let narrow = addr("10.0.0.0/24");
        let host = addr("10.0.0.5");

        assert!(wide.covers(&narrow));
        assert!(wide.covers(&host));
        assert!(!narrow.covers(&wide));
        assert!(!wide.covers(&addr("10.1.0.0/24")));
        assert!(!wide.covers(&addr("all")));
        assert!(addr("all").covers(&wide));
        assert!(addr("samenet").covers(&addr("192.168.0.0/16")));
    }

    #[test]
    fn test_self_coverage() {
        for token in ["10.0.0.0/8", "10.0.0.5", "::1", "2001:db8::/32", "samehost"] {
            let set = addr(token);
            assert!(set.covers(&set), "{token} should cover itself");
        }
    }

    #[test]
    fn test_cross_family_never_interacts() {
        let v4 = addr("0.0.0.0/0");
        let v6 = addr("::/0");
        assert!(!v4.covers(&v6));
        assert!(!v4.intersects(&v6));
        assert!(!v6.covers(&addr("127.0.0.1")));
    }

    #[test]
    fn test_mixed_family_set() {
        let samehost = addr("samehost");
        assert!(samehost.covers(&addr("127.0.0.1")));
        assert!(samehost.covers(&addr("::1")));
        assert!(!samehost.covers(&addr("127.0.0.2")));
        assert!(samehost.intersects(&addr("127.0.0.0/8")));
    }

    #[test]
    fn test_intersects() {
        assert!(addr("10.0.0.0/24").intersects(&addr("10.0.0.0/16")));
        assert!(addr("10.0.0.0/16").intersects(&addr("10.0.0.0/24")));
        assert!(!addr("10.0.0.0/24").intersects(&addr("10.0.1.0/24")));
        assert!(addr("all").intersects(&addr("10.0.1.0/24")));
        assert!(addr("10.0.1.0/24").intersects(&addr("all")));
    }

    #[test]
    fn test_covers_implies_intersects() {
        let tokens = [
            "all", "samenet", "samehost", "10.0.0.0/8", "10.0.0.0/16", "10.0.0.5", "10.1.0.0/16",
            "0.0.0.0/0", "::/0", "::1", "2001:db8::/32",
        ];
        for a in tokens {
            for b in tokens {
                let (a_set, b_set) = (addr(a), addr(b));
                if a_set.covers(&b_set) {
                    assert!(a_set.intersects(&b_set), "{a} covers {b} but does not intersect");
                }
            }
        }
    }

    #[test]
    fn test_contiguous_prefix() {
        assert_eq!(contiguous_prefix(0), Some(0));
        assert_eq!(contiguous_prefix(u128::MAX), Some(128));
        assert_eq!(contiguous_prefix(u128::MAX << 120), Some(8));
        assert_eq!(contiguous_prefix(1), None);
    }
}
