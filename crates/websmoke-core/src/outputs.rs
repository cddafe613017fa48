//! Provisioning outputs captured once after apply.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CheckError, CheckResult};

pub const BASTION_PUBLIC_IP: &str = "BastionPublicIP";
pub const WEB_SERVER_PRIVATE_IPS: &str = "WebServerPrivateIPs";
pub const LB_IP: &str = "lb_ip";
pub const VCN_ID: &str = "VcnID";

/// A single output value: either scalar text or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputValue {
    Text(String),
    List(Vec<String>),
}

impl OutputValue {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => OutputValue::List(items.iter().map(render).collect()),
            other => OutputValue::Text(render(other)),
        }
    }
}

/// Render a JSON value the way a list element is printed: strings bare,
/// nested lists as `[a b]`.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(render).collect();
            format!("[{}]", inner.join(" "))
        }
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct TerraformOutput {
    value: Value,
}

/// Read-only snapshot of named provisioning outputs for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionOutputs {
    values: BTreeMap<String, OutputValue>,
}

impl ProvisionOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fakes.
    pub fn with(mut self, name: impl Into<String>, value: OutputValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Parse the document printed by `terraform output -json`.
    ///
    /// Each top-level key maps to `{"sensitive": .., "type": .., "value": ..}`.
    pub fn from_terraform_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, TerraformOutput> = serde_json::from_str(json)?;
        let values = raw
            .into_iter()
            .map(|(name, out)| (name, OutputValue::from_json(&out.value)))
            .collect();
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Output as text. Lists render as a JSON array of strings.
    pub fn text(&self, name: &str) -> CheckResult<String> {
        match self.values.get(name) {
            Some(OutputValue::Text(text)) if !text.is_empty() => Ok(text.clone()),
            Some(OutputValue::List(items)) if !items.is_empty() => {
                Ok(serde_json::to_string(items).unwrap_or_default())
            }
            _ => Err(CheckError::MissingOutput {
                name: name.to_string(),
            }),
        }
    }

    /// Output as a non-empty list. A scalar acts as a one-element list.
    pub fn list(&self, name: &str) -> CheckResult<Vec<String>> {
        match self.values.get(name) {
            Some(OutputValue::List(items)) if !items.is_empty() => Ok(items.clone()),
            Some(OutputValue::Text(text)) if !text.is_empty() => Ok(vec![text.clone()]),
            _ => Err(CheckError::MissingOutput {
                name: name.to_string(),
            }),
        }
    }

    /// First element of a list output.
    pub fn first(&self, name: &str) -> CheckResult<String> {
        let mut items = self.list(name)?;
        Ok(items.swap_remove(0))
    }
}

/// Extract a VCN OCID from the textual `VcnID` output.
///
/// The output may be quoted or wrapped in a list (`["ocid1.vcn..."]`); the
/// id is the text between the first pair of double quotes. Unquoted output
/// is used as-is after trimming.
pub fn vcn_id_from_output(raw: &str) -> CheckResult<String> {
    let id = if raw.contains('"') {
        raw.split('"').nth(1).unwrap_or_default()
    } else {
        raw.trim()
    };

    if id.is_empty() {
        return Err(CheckError::MissingOutput {
            name: VCN_ID.to_string(),
        });
    }
    Ok(id.to_string())
}

/// Strip list brackets from an address printed out of a nested list.
pub fn strip_brackets(address: &str) -> String {
    address.replace(['[', ']'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TF_JSON: &str = r#"{
        "BastionPublicIP": {"sensitive": false, "type": ["tuple", [["list", "string"]]], "value": [["130.61.1.2"]]},
        "WebServerPrivateIPs": {"sensitive": false, "type": ["list", "string"], "value": ["10.0.1.2", "10.0.2.2"]},
        "VcnID": {"sensitive": false, "type": "string", "value": "ocid1.vcn.oc1..abc"},
        "lb_ip": {"sensitive": false, "type": ["list", "string"], "value": ["152.70.0.9"]}
    }"#;

    #[test]
    fn test_parse_terraform_json() {
        let outputs = ProvisionOutputs::from_terraform_json(TF_JSON).unwrap();
        assert_eq!(outputs.len(), 4);
        assert_eq!(
            outputs.list(WEB_SERVER_PRIVATE_IPS).unwrap(),
            vec!["10.0.1.2".to_string(), "10.0.2.2".to_string()]
        );
        assert_eq!(outputs.first(LB_IP).unwrap(), "152.70.0.9");
        assert_eq!(outputs.text(VCN_ID).unwrap(), "ocid1.vcn.oc1..abc");
    }

    #[test]
    fn test_nested_list_renders_with_brackets() {
        let outputs = ProvisionOutputs::from_terraform_json(TF_JSON).unwrap();
        let bastion = outputs.first(BASTION_PUBLIC_IP).unwrap();
        assert_eq!(bastion, "[130.61.1.2]");
        assert_eq!(strip_brackets(&bastion), "130.61.1.2");
    }

    #[test]
    fn test_missing_output_is_named() {
        let outputs = ProvisionOutputs::new();
        let err = outputs.first(LB_IP).unwrap_err();
        assert_eq!(
            err,
            CheckError::MissingOutput {
                name: "lb_ip".to_string()
            }
        );
    }

    #[test]
    fn test_empty_list_is_missing() {
        let outputs = ProvisionOutputs::new().with(LB_IP, OutputValue::List(vec![]));
        assert!(outputs.list(LB_IP).is_err());
    }

    #[test]
    fn test_scalar_acts_as_list() {
        let outputs = ProvisionOutputs::new().with(LB_IP, OutputValue::Text("1.2.3.4".into()));
        assert_eq!(outputs.list(LB_IP).unwrap(), vec!["1.2.3.4".to_string()]);
    }

    #[test]
    fn test_vcn_id_from_quoted_list() {
        let outputs = ProvisionOutputs::new().with(
            VCN_ID,
            OutputValue::List(vec!["ocid1.vcn.oc1..xyz".to_string()]),
        );
        let raw = outputs.text(VCN_ID).unwrap();
        assert_eq!(vcn_id_from_output(&raw).unwrap(), "ocid1.vcn.oc1..xyz");
    }

    #[test]
    fn test_vcn_id_from_plain_text() {
        assert_eq!(
            vcn_id_from_output("  ocid1.vcn.oc1..plain\n").unwrap(),
            "ocid1.vcn.oc1..plain"
        );
        assert!(vcn_id_from_output("\"\"").is_err());
    }
}
