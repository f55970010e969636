//! Network interface discovery for capture sessions.

use std::net::{IpAddr, Ipv4Addr};

use pnet::datalink::{self, NetworkInterface};

use crate::error::CaptureError;

/// What capture needs to know about a network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub index: u32,
    pub is_up: bool,
    pub is_loopback: bool,
    /// Point-to-point links (VPN and other tunnels).
    pub is_tunnel: bool,
    pub ipv4: Vec<Ipv4Addr>,
}

impl From<&NetworkInterface> for InterfaceInfo {
    fn from(iface: &NetworkInterface) -> Self {
        let ipv4 = iface
            .ips
            .iter()
            .filter_map(|network| match network.ip() {
                IpAddr::V4(address) => Some(address),
                IpAddr::V6(_) => None,
            })
            .collect();

        Self {
            name: iface.name.clone(),
            index: iface.index,
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
            is_tunnel: iface.is_point_to_point(),
            ipv4,
        }
    }
}

/// Enumerates the host's network interfaces.
pub trait InterfaceSource: Send + Sync {
    fn interfaces(&self) -> Result<Vec<InterfaceInfo>, CaptureError>;

    /// Finds the interface that has `address` configured.
    fn owner_of(&self, address: Ipv4Addr) -> Result<InterfaceInfo, CaptureError> {
        self.interfaces()?
            .into_iter()
            .find(|iface| iface.ipv4.contains(&address))
            .ok_or(CaptureError::InterfaceNotFound(address))
    }
}

/// Interface source backed by `pnet::datalink`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PnetInterfaces;

impl InterfaceSource for PnetInterfaces {
    fn interfaces(&self) -> Result<Vec<InterfaceInfo>, CaptureError> {
        let interfaces = datalink::interfaces();
        if interfaces.is_empty() {
            return Err(CaptureError::Interfaces(
                "no network interfaces reported by the host".to_string(),
            ));
        }

        Ok(interfaces.iter().map(InterfaceInfo::from).collect())
    }
}

/// Decides which interfaces get a capture session.
#[derive(Debug, Clone)]
pub struct InterfaceFilter {
    virtual_prefixes: Vec<String>,
}

impl InterfaceFilter {
    pub fn new<I, S>(virtual_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            virtual_prefixes: virtual_prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Up, not loopback, not a tunnel and not named like a virtual adapter.
    pub fn is_eligible(&self, iface: &InterfaceInfo) -> bool {
        iface.is_up
            && !iface.is_loopback
            && !iface.is_tunnel
            && !self.is_virtual(&iface.name)
    }

    fn is_virtual(&self, name: &str) -> bool {
        self.virtual_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }
}

impl Default for InterfaceFilter {
    fn default() -> Self {
        Self::new(crate::config::default_virtual_adapter_prefixes())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Interface source returning a fixed list.
    #[derive(Debug, Clone, Default)]
    pub struct MockInterfaces {
        pub interfaces: Vec<InterfaceInfo>,
    }

    impl MockInterfaces {
        pub fn new(interfaces: Vec<InterfaceInfo>) -> Self {
            Self { interfaces }
        }
    }

    impl InterfaceSource for MockInterfaces {
        fn interfaces(&self) -> Result<Vec<InterfaceInfo>, CaptureError> {
            Ok(self.interfaces.clone())
        }
    }

    pub fn iface(name: &str, index: u32, ipv4: &[Ipv4Addr]) -> InterfaceInfo {
        InterfaceInfo {
            name: name.to_string(),
            index,
            is_up: true,
            is_loopback: false,
            is_tunnel: false,
            ipv4: ipv4.to_vec(),
        }
    }

    #[test]
    fn test_filter_excludes_loopback_tunnel_and_down() {
        let filter = InterfaceFilter::default();
        let addr = [Ipv4Addr::new(10, 0, 0, 5)];

        assert!(filter.is_eligible(&iface("eth0", 2, &addr)));

        let mut lo = iface("lo", 1, &[Ipv4Addr::LOCALHOST]);
        lo.is_loopback = true;
        assert!(!filter.is_eligible(&lo));

        let mut tun = iface("tun0", 3, &addr);
        tun.is_tunnel = true;
        assert!(!filter.is_eligible(&tun));

        let mut down = iface("eth1", 4, &addr);
        down.is_up = false;
        assert!(!filter.is_eligible(&down));
    }

    #[test]
    fn test_filter_excludes_virtual_adapter_names() {
        let filter = InterfaceFilter::new(["vEthernet", "docker"]);
        let addr = [Ipv4Addr::new(172, 17, 0, 1)];

        assert!(!filter.is_eligible(&iface("vEthernet (WSL)", 5, &addr)));
        assert!(!filter.is_eligible(&iface("docker0", 6, &addr)));
        assert!(filter.is_eligible(&iface("wlan0", 7, &addr)));
    }

    #[test]
    fn test_owner_lookup() {
        let source = MockInterfaces::new(vec![
            iface("eth0", 2, &[Ipv4Addr::new(10, 0, 0, 5)]),
            iface("eth1", 3, &[Ipv4Addr::new(192, 168, 1, 5), Ipv4Addr::new(192, 168, 2, 5)]),
        ]);

        let owner = source.owner_of(Ipv4Addr::new(192, 168, 2, 5)).unwrap();
        assert_eq!(owner.name, "eth1");
        assert_eq!(owner.index, 3);

        assert!(matches!(
            source.owner_of(Ipv4Addr::new(8, 8, 8, 8)),
            Err(CaptureError::InterfaceNotFound(_))
        ));
    }

    #[test]
    fn test_pnet_interfaces() {
        let Ok(interfaces) = PnetInterfaces.interfaces() else {
            return;
        };

        for iface in interfaces {
            assert!(!iface.name.is_empty());
            if iface.is_loopback {
                assert!(!InterfaceFilter::default().is_eligible(&iface));
            }
        }
    }
}
