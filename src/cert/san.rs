// src/cert/san.rs
use sha1::{Digest, Sha1};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::types::SanSet;
use crate::config::paths::{CONTROL_PLANE_ALIAS, DEFAULT_BIND_IPV4};
use crate::config::{ClusterConfig, NodeConfig};
use crate::error::CertError;

/// Secondary address kept in the API server SANs.
pub const LEGACY_SERVICE_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

/// First usable address of `cidr`: the network address plus one.
pub fn service_cluster_ip(cidr: &str) -> Result<IpAddr, CertError> {
    let invalid = || CertError::config(format!("invalid service CIDR {:?}", cidr));
    let (addr, prefix) = cidr.split_once('/').ok_or_else(invalid)?;
    let addr: IpAddr = addr.trim().parse().map_err(|_| invalid())?;
    let prefix: u32 = prefix.trim().parse().map_err(|_| invalid())?;

    match addr {
        IpAddr::V4(v4) => {
            if prefix > 32 {
                return Err(invalid());
            }
            let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
            let first = (u32::from(v4) & mask).checked_add(1).ok_or_else(invalid)?;
            Ok(IpAddr::V4(Ipv4Addr::from(first)))
        }
        IpAddr::V6(v6) => {
            if prefix > 128 {
                return Err(invalid());
            }
            let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
            let first = (u128::from(v6) & mask).checked_add(1).ok_or_else(invalid)?;
            Ok(IpAddr::V6(Ipv6Addr::from(first)))
        }
    }
}

/// In-cluster DNS names of the `kubernetes` service.
pub fn alternate_dns(domain: &str) -> Vec<String> {
    vec![
        format!("kubernetes.default.svc.{}", domain),
        "kubernetes.default.svc".to_string(),
        "kubernetes.default".to_string(),
        "kubernetes".to_string(),
        "localhost".to_string(),
    ]
}

/// First 8 hex chars of SHA-1 over the sorted, `/`-joined names and IPs.
/// Input order does not matter.
pub fn fingerprint(sans: &SanSet) -> String {
    let mut input: Vec<String> = sans.names.clone();
    input.extend(sans.ips.iter().map(|ip| ip.to_string()));
    input.sort();

    let digest = Sha1::digest(input.join("/").as_bytes());
    hex::encode(digest)[..8].to_string()
}

/// SANs of the API server serving certificate for `node`.
pub fn apiserver_sans(
    config: &ClusterConfig,
    node: &NodeConfig,
    daemon_host: &str,
) -> Result<SanSet, CertError> {
    let node_ip: IpAddr = node
        .ip
        .parse()
        .map_err(|_| CertError::config(format!("node {} has invalid IP {:?}", node.name, node.ip)))?;
    let service_ip = service_cluster_ip(&config.service_cidr)?;

    let mut ips = config.apiserver_ips.clone();
    ips.extend([
        node_ip,
        service_ip,
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V4(LEGACY_SERVICE_IP),
    ]);

    let mut names = config.apiserver_names.clone();
    names.push(config.apiserver_name.clone());
    names.push(CONTROL_PLANE_ALIAS.to_string());
    names.extend(alternate_dns(&config.dns_domain));

    // an IP daemon host is an IP SAN, anything else a DNS SAN
    if daemon_host != DEFAULT_BIND_IPV4 {
        match daemon_host.parse::<IpAddr>() {
            Ok(ip) => ips.push(ip),
            Err(_) => names.push(daemon_host.to_string()),
        }
    }

    Ok(SanSet { ips, names })
}
