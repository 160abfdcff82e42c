use regex::Regex;
use thiserror::Error;

const DNS_LABEL_REGEX: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

const DNS_LIKE_HOST_REGEX: &str =
    r"^(\*|[a-z0-9]([-a-z0-9]*[a-z0-9])?)(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$";

const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ImportError {
    #[error("import namespace must not be empty")]
    EmptyNamespace,

    #[error(
        "import namespace {0:?} must be \"*\" or a DNS-1123 label, matching the regex: {regex}",
        regex = DNS_LABEL_REGEX
    )]
    InvalidNamespace(String),

    #[error(
        "import host {0:?} must be a DNS name, optionally prefixed by \"*.\", matching the regex: {regex}",
        regex = DNS_LIKE_HOST_REGEX
    )]
    InvalidHost(String),
}

/// Validates that an import namespace is either the `*` wildcard or a namespace name.
pub(crate) fn validate_import_namespace(ns: &str) -> Result<(), ImportError> {
    if ns.is_empty() {
        return Err(ImportError::EmptyNamespace);
    }
    if ns == "*" {
        return Ok(());
    }
    let regex = Regex::new(DNS_LABEL_REGEX).expect("should_compile");
    if ns.len() > MAX_LABEL_LEN || !regex.is_match(ns) {
        return Err(ImportError::InvalidNamespace(ns.to_string()));
    }
    Ok(())
}

/// Validates an import host. An empty host (or `*`) imports every host in the namespace.
pub(crate) fn validate_import_host(host: &str) -> Result<(), ImportError> {
    if host.is_empty() {
        return Ok(());
    }
    let fqdn = host.strip_suffix('.').unwrap_or(host);
    let too_long = fqdn.split('.').any(|label| label.len() > MAX_LABEL_LEN);
    let regex = Regex::new(DNS_LIKE_HOST_REGEX).expect("should_compile");
    if too_long || !regex.is_match(fqdn) {
        return Err(ImportError::InvalidHost(host.to_string()));
    }
    Ok(())
}
