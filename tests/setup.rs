// tests/setup.rs
mod common;

use std::fs;
use std::net::IpAddr;

use common::{CountingGenerator, Env};
use kube_certs::cert::{CertificateOperations, CertificateType, Renewal};
use kube_certs::utils::logging::MemoryLogger;
use x509_parser::extensions::GeneralName;
use x509_parser::pem::parse_x509_pem;

fn operations(env: &Env, generator: &CountingGenerator) -> CertificateOperations {
    CertificateOperations::new(
        Box::new(MemoryLogger::new()),
        Box::new(generator.clone()),
        env.paths.clone(),
        "127.0.0.1".to_string(),
    )
}

fn sans_of(cert_pem: &[u8]) -> (Vec<IpAddr>, Vec<String>) {
    let (_, pem) = parse_x509_pem(cert_pem).unwrap();
    let cert = pem.parse_x509().unwrap();
    let san = cert.subject_alternative_name().unwrap().unwrap();
    let mut ips = Vec::new();
    let mut names = Vec::new();
    for name in &san.value.general_names {
        match name {
            GeneralName::IPAddress(raw) => match raw.len() {
                4 => ips.push(IpAddr::from(<[u8; 4]>::try_from(*raw).unwrap())),
                16 => ips.push(IpAddr::from(<[u8; 16]>::try_from(*raw).unwrap())),
                _ => {}
            },
            GeneralName::DNSName(dns) => names.push(dns.to_string()),
            _ => {}
        }
    }
    (ips, names)
}

#[test]
fn fresh_profile_provisions_everything() {
    let env = Env::new();
    let generator = CountingGenerator::default();
    let mut ops = operations(&env, &generator);
    let mut guest = env.guest("minikube");
    let node = env.node("minikube");

    let report = ops.setup_certs(&mut guest, &env.config, &node).unwrap();

    assert!(report.ca_regenerated);
    assert_eq!(
        generator.calls(),
        vec!["minikubeCA", "proxyClientCA", "minikube-user", "minikube", "aggregator"]
    );
    assert_eq!(
        report.profile.regenerated,
        vec![CertificateType::Client, CertificateType::APIServer, CertificateType::ProxyClient]
    );

    let profile = env.paths.profile("minikube");
    let fingerprint = report.profile.fingerprint.clone().unwrap();
    assert_eq!(fingerprint.len(), 8);
    for file in [
        "client.crt".to_string(),
        "client.key".to_string(),
        "apiserver.crt".to_string(),
        "apiserver.key".to_string(),
        format!("apiserver.crt.{}", fingerprint),
        format!("apiserver.key.{}", fingerprint),
        "proxy-client.crt".to_string(),
        "proxy-client.key".to_string(),
    ] {
        assert!(profile.join(&file).exists(), "missing {}", file);
    }
    for file in ["ca.crt", "ca.key", "proxy-client-ca.crt", "proxy-client-ca.key"] {
        assert!(env.paths.mini_path().join(file).exists(), "missing {}", file);
    }

    let (ips, names) = sans_of(&fs::read(profile.join("apiserver.crt")).unwrap());
    assert!(ips.contains(&"192.168.49.2".parse().unwrap()));
    assert!(ips.contains(&"10.96.0.1".parse().unwrap()));
    assert!(names.contains(&"control-plane.minikube.internal".to_string()));
    assert!(names.contains(&"kubernetes.default.svc.cluster.local".to_string()));

    assert_eq!(guest.mode("/var/lib/minikube/certs/apiserver.key"), 0o600);
    assert_eq!(guest.mode("/var/lib/minikube/certs/ca.crt"), 0o644);
    assert_eq!(guest.mode("/usr/share/ca-certificates/minikubeCA.pem"), 0o644);
    assert!(guest.path("/var/lib/minikube/kubeconfig").exists());
    assert!(!guest.path("/var/lib/minikube/certs/client.crt").exists());

    // the guest has no openssl: direct links only
    assert!(guest
        .commands
        .iter()
        .any(|c| c.contains("ln -fs /usr/share/ca-certificates/minikubeCA.pem /etc/ssl/certs/minikubeCA.pem")));
    assert!(!guest.commands.iter().any(|c| c.contains("-hash")));
    assert_eq!(report.kubeadm, Renewal::Reused);
}

#[test]
fn second_run_regenerates_nothing() {
    let env = Env::new();
    let generator = CountingGenerator::default();
    let node = env.node("minikube");

    operations(&env, &generator)
        .setup_certs(&mut env.guest("minikube"), &env.config, &node)
        .unwrap();
    let apiserver = fs::read(env.paths.profile("minikube").join("apiserver.crt")).unwrap();
    generator.reset();

    let report = operations(&env, &generator)
        .setup_certs(&mut env.guest("minikube"), &env.config, &node)
        .unwrap();

    assert!(generator.calls().is_empty(), "regenerated {:?}", generator.calls());
    assert!(!report.ca_regenerated);
    assert!(report.profile.regenerated.is_empty());
    assert_eq!(
        fs::read(env.paths.profile("minikube").join("apiserver.crt")).unwrap(),
        apiserver
    );
}

#[test]
fn extra_apiserver_ip_rotates_only_the_serving_cert() {
    let mut env = Env::new();
    let generator = CountingGenerator::default();
    let node = env.node("minikube");

    let first = operations(&env, &generator)
        .setup_certs(&mut env.guest("minikube"), &env.config, &node)
        .unwrap();
    generator.reset();

    env.config.apiserver_ips.push("192.168.1.10".parse().unwrap());
    let second = operations(&env, &generator)
        .setup_certs(&mut env.guest("minikube"), &env.config, &node)
        .unwrap();

    assert_eq!(generator.calls(), vec!["minikube"]);
    assert_ne!(first.profile.fingerprint, second.profile.fingerprint);
    let (ips, _) = sans_of(&fs::read(env.paths.profile("minikube").join("apiserver.crt")).unwrap());
    assert!(ips.contains(&"192.168.1.10".parse().unwrap()));
}

#[test]
fn worker_node_receives_shared_material_only() {
    let env = Env::new();
    let generator = CountingGenerator::default();
    let mut guest = env.guest("minikube-m02");
    let node = env.node("minikube-m02");

    let report = operations(&env, &generator)
        .setup_certs(&mut guest, &env.config, &node)
        .unwrap();

    assert_eq!(generator.calls(), vec!["minikubeCA", "proxyClientCA"]);
    assert!(report.profile.transfer.is_empty());
    assert!(guest.path("/var/lib/minikube/certs/ca.crt").exists());
    assert!(guest.path("/var/lib/minikube/certs/proxy-client-ca.key").exists());
    assert!(!guest.path("/var/lib/minikube/certs/apiserver.crt").exists());
    assert!(!guest.path("/var/lib/minikube/kubeconfig").exists());
}

#[test]
fn user_ca_certificates_are_mirrored_to_the_guest() {
    let env = Env::new();
    let generator = CountingGenerator::default();
    let node = env.node("minikube");

    // a real certificate to drop into the user certs dir
    operations(&env, &generator)
        .setup_certs(&mut env.guest("seed"), &env.config, &node)
        .unwrap();
    let certs_dir = env.paths.mini_path().join("certs");
    fs::create_dir_all(&certs_dir).unwrap();
    fs::copy(env.paths.proxy_ca_cert(), certs_dir.join("corp-root.crt")).unwrap();
    fs::copy(env.paths.proxy_ca_cert(), certs_dir.join("ca.pem")).unwrap();

    let mut guest = env.guest("minikube");
    let report = operations(&env, &generator)
        .setup_certs(&mut guest, &env.config, &node)
        .unwrap();

    let targets: Vec<&str> = report.trust_store.iter().map(|e| e.target.as_str()).collect();
    assert!(targets.contains(&"/usr/share/ca-certificates/corp-root.pem"));
    assert!(targets.contains(&"/usr/share/ca-certificates/minikubeCA.pem"));
    assert!(!targets.iter().any(|t| t.ends_with("/ca.pem")));
    assert!(guest.path("/usr/share/ca-certificates/corp-root.pem").exists());
}
