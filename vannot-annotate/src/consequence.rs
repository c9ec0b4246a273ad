use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use vannot_core::{AnnotationError, Result};

///
/// Which VEP sub-fields survive into the output, and under which names.
///
/// The upstream consequence struct is large and version dependent; only the
/// keys listed in `keep` are carried. `rename` maps upstream key -> output key.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsequencePolicy {
    pub keep: Vec<String>,
    pub rename: BTreeMap<String, String>,
}

impl Default for ConsequencePolicy {
    fn default() -> Self {
        ConsequencePolicy {
            keep: vec![
                "most_severe_consequence".to_string(),
                "transcript_consequences".to_string(),
                "regulatory_feature_consequences".to_string(),
                "motif_feature_consequences".to_string(),
            ],
            rename: BTreeMap::new(),
        }
    }
}

impl ConsequencePolicy {
    ///
    /// Reduce a record's consequence annotation to the kept sub-fields.
    ///
    /// # Returns
    /// - `None` when the record carries no annotation
    /// - the reduced object otherwise; keys absent upstream stay absent
    /// - a [`AnnotationError::SchemaViolation`] when the annotation is not an object
    pub fn reduce(&self, vep: Option<&Value>) -> Result<Option<Value>> {
        let object = match vep {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(object)) => object,
            Some(other) => {
                return Err(AnnotationError::SchemaViolation(format!(
                    "consequence annotation must be an object, found {}",
                    json_type(other)
                )));
            }
        };

        let mut reduced = Map::new();
        for key in &self.keep {
            if let Some(value) = object.get(key) {
                let name = self.rename.get(key).unwrap_or(key);
                reduced.insert(name.clone(), value.clone());
            }
        }

        Ok(Some(Value::Object(reduced)))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn test_reduce_keeps_listed_keys() {
        let vep = json!({
            "most_severe_consequence": "missense_variant",
            "transcript_consequences": [{"gene_symbol": "BRCA1"}],
            "input": "1 123 . A G",
            "seq_region_name": "1"
        });
        let reduced = ConsequencePolicy::default().reduce(Some(&vep)).unwrap();
        assert_eq!(
            reduced,
            Some(json!({
                "most_severe_consequence": "missense_variant",
                "transcript_consequences": [{"gene_symbol": "BRCA1"}]
            }))
        );
    }

    #[rstest]
    fn test_reduce_renames() {
        let policy = ConsequencePolicy {
            keep: vec!["most_severe_consequence".to_string()],
            rename: [("most_severe_consequence".to_string(), "worst".to_string())]
                .into_iter()
                .collect(),
        };
        let vep = json!({"most_severe_consequence": "stop_gained"});
        assert_eq!(
            policy.reduce(Some(&vep)).unwrap(),
            Some(json!({"worst": "stop_gained"}))
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some(Value::Null))]
    fn test_reduce_missing(#[case] vep: Option<Value>) {
        assert_eq!(ConsequencePolicy::default().reduce(vep.as_ref()).unwrap(), None);
    }

    #[rstest]
    fn test_reduce_rejects_non_object() {
        let vep = json!(["missense_variant"]);
        assert!(ConsequencePolicy::default().reduce(Some(&vep)).is_err());
    }
}
