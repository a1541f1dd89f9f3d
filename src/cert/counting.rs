// src/cert/counting.rs
//
// Test support shared by the unit tests and tests/common. Resolves its
// imports through the including module.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use super::{CertError, CertificateGenerator, CredentialPair, OpenSslGenerator, SignedCertRequest};

/// Real generator that records each subject it was asked for. Clones share
/// one record.
#[derive(Clone, Default)]
pub struct CountingGenerator {
    inner: OpenSslGenerator,
    calls: Arc<Mutex<Vec<String>>>,
}

impl CountingGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl CertificateGenerator for CountingGenerator {
    fn generate_ca_cert(&self, pair: &CredentialPair, subject: &str) -> Result<(), CertError> {
        self.calls.lock().unwrap().push(subject.to_string());
        self.inner.generate_ca_cert(pair, subject)
    }

    fn generate_signed_cert(&self, request: &SignedCertRequest<'_>) -> Result<(), CertError> {
        self.calls.lock().unwrap().push(request.subject.to_string());
        self.inner.generate_signed_cert(request)
    }
}
