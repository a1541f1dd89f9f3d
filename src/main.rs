// src/main.rs
use std::process::ExitCode;

use clap::Parser;

use kube_certs::cert::{CertificateOperations, OpenSslGenerator};
use kube_certs::command::{CommandRunner, ExecRunner, SshRunner};
use kube_certs::config::{daemon_host, ClusterConfig, LocalPaths, NodeConfig, Transport};
use kube_certs::error::CertError;
use kube_certs::utils::logging::{ConsoleLogger, FileLogger, Logger, MultiLogger};

#[derive(Parser)]
pub struct Args {
    #[arg(short, long, default_value = "cluster_config.json")]
    pub config: String,
    #[arg(short, long)]
    pub debug: bool,
    /// Node to set up; defaults to the control plane.
    #[arg(short, long)]
    pub node: Option<String>,
}

fn select_node<'a>(config: &'a ClusterConfig, name: Option<&str>) -> Result<&'a NodeConfig, CertError> {
    match name {
        Some(name) => config
            .node(name)
            .ok_or_else(|| CertError::config(format!("unknown node {:?}", name))),
        None => config
            .control_plane()
            .ok_or_else(|| CertError::config("no control plane node configured")),
    }
}

fn build_logger(paths: &LocalPaths, debug: bool) -> Box<dyn Logger> {
    let mut loggers: Vec<Box<dyn Logger>> = vec![Box::new(ConsoleLogger::new(debug))];
    match FileLogger::new(&paths.log_file().to_string_lossy(), debug) {
        Ok(file) => loggers.push(Box::new(file)),
        Err(e) => eprintln!("Failed to open log file {}: {}", paths.log_file().display(), e),
    }
    Box::new(MultiLogger::new(loggers))
}

fn run(args: &Args) -> Result<(), CertError> {
    let config = ClusterConfig::load_from_file(&args.config)
        .map_err(|e| CertError::io(format!("load {}", args.config), e))?;
    config
        .validate()
        .map_err(|e| CertError::config(e.to_string()))?;
    let node = select_node(&config, args.node.as_deref())?;

    let paths = LocalPaths::from_env();
    let mut runner: Box<dyn CommandRunner> = match config.remote.transport {
        Transport::Ssh => Box::new(SshRunner::new(&node.ip, &config.remote)),
        Transport::Local => Box::new(ExecRunner::new()),
    };

    let docker_host = std::env::var("DOCKER_HOST").ok();
    let host = daemon_host(&config.container_runtime, docker_host.as_deref());

    let mut ops = CertificateOperations::new(
        build_logger(&paths, args.debug),
        Box::new(OpenSslGenerator::new()),
        paths,
        host,
    );
    let report = ops.setup_certs(runner.as_mut(), &config, node)?;
    ops.log(&format!(
        "certificates ready on {}: {} files copied, {} trust store entries",
        node.name,
        report.copied.len(),
        report.trust_store.len()
    ));
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Failed to set up certificates: {}", e);
            ExitCode::FAILURE
        }
    }
}
