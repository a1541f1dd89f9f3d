// src/kubeconfig/mod.rs
mod kube;

pub use kube::{
    guest_kubeconfig, ClusterEntry, ClusterInfo, ContextEntry, KubeConfig, NamedCluster,
    NamedContext, NamedExtension, NamedUser, UserEntry, KUBECONFIG_NAME,
};
