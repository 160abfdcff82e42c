use anyhow::{bail, Error, Result};
use std::fmt;

/// Narrows an import to a subset of the hosts exported by a namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HostMatch {
    /// All hosts in the target namespace.
    #[default]
    Any,
    Exact(String),
    /// Any host strictly below a domain, e.g. `*.example.com`.
    Suffix { reverse_labels: Vec<String> },
}

// === impl HostMatch ===

impl HostMatch {
    pub fn matches(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.');
        match self {
            Self::Any => true,
            Self::Exact(h) => h.eq_ignore_ascii_case(host),
            Self::Suffix { reverse_labels } => {
                let mut labels = host.rsplit('.');
                for suffix in reverse_labels {
                    match labels.next() {
                        Some(label) if label.eq_ignore_ascii_case(suffix) => {}
                        _ => return false,
                    }
                }
                // The wildcard stands for at least one label.
                labels.next().is_some_and(|label| !label.is_empty())
            }
        }
    }

    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl std::str::FromStr for HostMatch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let host = s.trim_end_matches('.');
        if host.is_empty() || host == "*" {
            return Ok(Self::Any);
        }

        if let Some(suffix) = host.strip_prefix("*.") {
            let mut reverse_labels = suffix
                .split('.')
                .map(|label| label.to_ascii_lowercase())
                .collect::<Vec<_>>();
            if reverse_labels
                .iter()
                .any(|label| label.is_empty() || label.contains('*'))
            {
                bail!("invalid wildcard host: {:?}", s);
            }
            reverse_labels.reverse();
            return Ok(Self::Suffix { reverse_labels });
        }

        if host.contains('*') {
            bail!("a wildcard may only be used as the leading label: {:?}", s);
        }
        if host.split('.').any(str::is_empty) {
            bail!("host contains an empty label: {:?}", s);
        }

        Ok(Self::Exact(host.to_ascii_lowercase()))
    }
}

impl fmt::Display for HostMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => "*".fmt(f),
            Self::Exact(host) => host.fmt(f),
            Self::Suffix { reverse_labels } => {
                "*".fmt(f)?;
                for label in reverse_labels.iter().rev() {
                    write!(f, ".{label}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        for (input, expected) in [
            ("", HostMatch::Any),
            ("*", HostMatch::Any),
            (
                "Reviews.Prod.svc.cluster.local",
                HostMatch::Exact("reviews.prod.svc.cluster.local".to_string()),
            ),
            (
                "api.example.com.",
                HostMatch::Exact("api.example.com".to_string()),
            ),
            (
                "*.example.com",
                HostMatch::Suffix {
                    reverse_labels: vec!["com".to_string(), "example".to_string()],
                },
            ),
        ] {
            assert_eq!(
                input.parse::<HostMatch>().unwrap(),
                expected,
                "failed to parse {input:?}"
            );
        }
    }

    #[test]
    fn parse_invalid() {
        for input in ["*.foo..com", "foo.*.com", "*foo.com", "a..b", "*.*.com"] {
            assert!(
                input.parse::<HostMatch>().is_err(),
                "{input:?} must not parse"
            );
        }
    }

    #[test]
    fn suffix_matches() {
        let m = "*.example.com".parse::<HostMatch>().unwrap();
        assert!(m.matches("api.example.com"));
        assert!(m.matches("v1.api.Example.COM"));
        assert!(m.matches("api.example.com."));
        assert!(!m.matches("example.com"));
        assert!(!m.matches("api.example.org"));
        assert!(!m.matches("com"));
    }

    #[test]
    fn exact_matches() {
        let m = "api.example.com".parse::<HostMatch>().unwrap();
        assert!(m.matches("API.example.com"));
        assert!(!m.matches("v1.api.example.com"));
        assert!(HostMatch::Any.matches("anything.at.all"));
    }

    #[test]
    fn displays_as_parsed() {
        for input in ["*", "api.example.com", "*.example.com"] {
            assert_eq!(input.parse::<HostMatch>().unwrap().to_string(), input);
        }
    }
}
