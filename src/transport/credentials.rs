use crate::core::SiiError;

/// Client certificate material, supplied as in-memory byte buffers.
///
/// PEM pairs ride the rustls backend; PKCS#12 archives (the usual issue
/// format for these certificates, optionally passphrase-protected) require
/// the native-tls backend.
#[derive(Clone)]
pub enum ClientIdentity {
    Pem {
        /// Certificate chain, PEM-encoded.
        certificate: Vec<u8>,
        /// Unencrypted private key, PEM-encoded.
        private_key: Vec<u8>,
    },
    Pkcs12 {
        /// DER-encoded PKCS#12 archive.
        archive: Vec<u8>,
        passphrase: Option<String>,
    },
}

impl ClientIdentity {
    pub fn pem(certificate: impl Into<Vec<u8>>, private_key: impl Into<Vec<u8>>) -> Self {
        Self::Pem {
            certificate: certificate.into(),
            private_key: private_key.into(),
        }
    }

    pub fn pkcs12(archive: impl Into<Vec<u8>>, passphrase: Option<String>) -> Self {
        Self::Pkcs12 {
            archive: archive.into(),
            passphrase,
        }
    }

    /// True when this identity needs the native-tls backend.
    pub(crate) fn uses_native_tls(&self) -> bool {
        matches!(self, Self::Pkcs12 { .. })
    }

    pub(crate) fn build(&self) -> Result<reqwest::Identity, SiiError> {
        match self {
            Self::Pem {
                certificate,
                private_key,
            } => {
                let mut pem = Vec::with_capacity(private_key.len() + certificate.len() + 1);
                pem.extend_from_slice(private_key);
                if !pem.ends_with(b"\n") {
                    pem.push(b'\n');
                }
                pem.extend_from_slice(certificate);
                reqwest::Identity::from_pem(&pem)
                    .map_err(|e| SiiError::Tls(format!("invalid PEM identity: {e}")))
            }
            Self::Pkcs12 { archive, passphrase } => {
                reqwest::Identity::from_pkcs12_der(archive, passphrase.as_deref().unwrap_or(""))
                    .map_err(|e| SiiError::Tls(format!("invalid PKCS#12 identity: {e}")))
            }
        }
    }
}

// Key material stays out of logs and error output.
impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pem { .. } => f.write_str("ClientIdentity::Pem(..)"),
            Self::Pkcs12 { .. } => f.write_str("ClientIdentity::Pkcs12(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_pem_is_a_tls_error() {
        let identity = ClientIdentity::pem(b"not a cert".to_vec(), b"not a key".to_vec());
        assert!(matches!(identity.build(), Err(SiiError::Tls(_))));
    }

    #[test]
    fn garbage_pkcs12_is_a_tls_error() {
        let identity = ClientIdentity::pkcs12(vec![0u8; 16], Some("secret".into()));
        assert!(matches!(identity.build(), Err(SiiError::Tls(_))));
    }

    #[test]
    fn debug_redacts_key_material() {
        let identity = ClientIdentity::pem(b"CERT".to_vec(), b"KEY".to_vec());
        let rendered = format!("{identity:?}");
        assert!(!rendered.contains("KEY"));
    }
}
