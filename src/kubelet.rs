// file: src/kubelet.rs
// version: 1.0.0
// guid: 7c1d2e3f-4a5b-4c6d-9e8f-0a1b2c3d4e5f

//! Kubelet argument construction and Kubernetes label syntax checks

use crate::error::InstallerError;
use crate::Result;
use regex::Regex;
use std::collections::BTreeMap;

/// Pod capacity configured on every node
pub const MAX_PODS: u32 = 200;

const QUALIFIED_NAME_MAX_LEN: usize = 63;
const LABEL_VALUE_MAX_LEN: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LEN: usize = 253;

const QUALIFIED_NAME_FMT: &str = "([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]";
const DNS1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";

/// Build the kubelet arguments for a node carrying `labels`
pub fn kubelet_args(labels: &BTreeMap<String, String>) -> Result<Vec<String>> {
    let mut args = vec![format!("max-pods={}", MAX_PODS)];
    if labels.is_empty() {
        return Ok(args);
    }

    let checker = LabelChecker::new()?;
    let mut pairs = Vec::with_capacity(labels.len());
    for (key, value) in labels {
        let errs = checker.key_errors(key);
        if !errs.is_empty() {
            return Err(InstallerError::label_syntax(format!(
                "invalid label key {:?}: {}",
                key,
                errs.join(", ")
            )));
        }
        let errs = checker.value_errors(value);
        if !errs.is_empty() {
            return Err(InstallerError::label_syntax(format!(
                "invalid label value {:?}: {}",
                value,
                errs.join(", ")
            )));
        }
        pairs.push(format!("{}={}", key, value));
    }

    args.push(format!("node-labels={}", pairs.join(",")));
    Ok(args)
}

struct LabelChecker {
    qualified_name: Regex,
    dns1123_subdomain: Regex,
}

impl LabelChecker {
    fn new() -> Result<Self> {
        let qualified_name = Regex::new(&format!("^{}$", QUALIFIED_NAME_FMT))
            .map_err(|e| InstallerError::config(format!("Invalid regex pattern: {}", e)))?;
        let dns1123_subdomain = Regex::new(&format!(
            r"^{label}(\.{label})*$",
            label = DNS1123_LABEL_FMT
        ))
        .map_err(|e| InstallerError::config(format!("Invalid regex pattern: {}", e)))?;
        Ok(Self {
            qualified_name,
            dns1123_subdomain,
        })
    }

    /// Problems with a `[prefix/]name` label key
    fn key_errors(&self, key: &str) -> Vec<String> {
        let mut errs = Vec::new();
        let parts: Vec<&str> = key.split('/').collect();
        let name = match parts.as_slice() {
            [name] => *name,
            [prefix, name] => {
                if prefix.is_empty() {
                    errs.push("prefix part must be non-empty".to_string());
                } else {
                    if prefix.len() > DNS1123_SUBDOMAIN_MAX_LEN {
                        errs.push(format!(
                            "prefix part must be no more than {} characters",
                            DNS1123_SUBDOMAIN_MAX_LEN
                        ));
                    }
                    if !self.dns1123_subdomain.is_match(prefix) {
                        errs.push(
                            "prefix part must consist of lower case alphanumeric characters, '-' or '.', \
                             and must start and end with an alphanumeric character"
                                .to_string(),
                        );
                    }
                }
                *name
            }
            _ => {
                errs.push(
                    "a qualified name must consist of alphanumeric characters, '-', '_' or '.', \
                     with an optional DNS subdomain prefix and '/'"
                        .to_string(),
                );
                return errs;
            }
        };

        if name.is_empty() {
            errs.push("name part must be non-empty".to_string());
        } else if name.len() > QUALIFIED_NAME_MAX_LEN {
            errs.push(format!(
                "name part must be no more than {} characters",
                QUALIFIED_NAME_MAX_LEN
            ));
        }
        if !name.is_empty() && !self.qualified_name.is_match(name) {
            errs.push(
                "name part must consist of alphanumeric characters, '-', '_' or '.', \
                 and must start and end with an alphanumeric character"
                    .to_string(),
            );
        }
        errs
    }

    /// Problems with a label value; the empty value is valid
    fn value_errors(&self, value: &str) -> Vec<String> {
        let mut errs = Vec::new();
        if value.len() > LABEL_VALUE_MAX_LEN {
            errs.push(format!("must be no more than {} characters", LABEL_VALUE_MAX_LEN));
        }
        if !value.is_empty() && !self.qualified_name.is_match(value) {
            errs.push(
                "a valid label must be an empty string or consist of alphanumeric characters, \
                 '-', '_' or '.', and must start and end with an alphanumeric character"
                    .to_string(),
            );
        }
        errs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_labels() {
        assert_eq!(kubelet_args(&BTreeMap::new()).unwrap(), vec!["max-pods=200"]);
    }

    #[test]
    fn test_single_label() {
        let args = kubelet_args(&labels(&[("labelKey1", "value1")])).unwrap();
        assert_eq!(args, vec!["max-pods=200", "node-labels=labelKey1=value1"]);
    }

    #[test]
    fn test_labels_joined_in_order() {
        let args = kubelet_args(&labels(&[
            ("topology.kubernetes.io/zone", "zone-a"),
            ("rack", ""),
            ("app.kubernetes.io/name", "harvester"),
        ]))
        .unwrap();
        assert_eq!(
            args[1],
            "node-labels=app.kubernetes.io/name=harvester,rack=,topology.kubernetes.io/zone=zone-a"
        );
    }

    #[test]
    fn test_invalid_key() {
        let err = kubelet_args(&labels(&[("???invalidName", "value1")])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("invalid label key \"???invalidName\": "), "{}", msg);
        assert!(matches!(err, InstallerError::LabelSyntax(_)));
    }

    #[test]
    fn test_invalid_value() {
        let err = kubelet_args(&labels(&[("labelKey1", "???value###NAH")])).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("invalid label value \"???value###NAH\": "));
    }

    #[test]
    fn test_key_prefix_rules() {
        let checker = LabelChecker::new().unwrap();
        assert!(checker.key_errors("example.com/name").is_empty());
        assert!(!checker.key_errors("Example.com/name").is_empty());
        assert!(!checker.key_errors("/name").is_empty());
        assert!(!checker.key_errors("a/b/c").is_empty());
        assert!(!checker.key_errors(&"n".repeat(64)).is_empty());
    }

    #[test]
    fn test_errors_joined_with_comma() {
        let long_invalid = format!("-{}", "v".repeat(63));
        let err = kubelet_args(&labels(&[("key", long_invalid.as_str())])).unwrap_err();
        assert!(err.to_string().contains("characters, a valid label"));
    }
}
