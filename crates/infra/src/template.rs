use std::collections::{BTreeMap, BTreeSet};

use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::Value;

use crate::{resources::Construct, InfraError};

pub const FORMAT_VERSION: &str = "2010-09-09";

/// A template value: a literal or one of the intrinsic functions the stack
/// needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Str(String),
    Ref(String),
    GetAtt(String, String),
    Sub(String),
}

impl Expr {
    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn reference(logical_id: impl Into<String>) -> Self {
        Expr::Ref(logical_id.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Expr::GetAtt(logical_id.into(), attribute.into())
    }

    pub fn sub(template: impl Into<String>) -> Self {
        Expr::Sub(template.into())
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expr::Str(value) => serializer.serialize_str(value),
            Expr::Ref(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", id)?;
                map.end()
            }
            Expr::GetAtt(id, attribute) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[id, attribute])?;
                map.end()
            }
            Expr::Sub(template) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Sub", template)?;
                map.end()
            }
        }
    }
}

/// Only `Delete` is used: every resource of this stack goes away with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RemovalPolicy {
    Delete,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: String,
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RemovalPolicy>,
}

impl Resource {
    pub fn new<P: Serialize>(kind: &str, properties: &P) -> Result<Self, InfraError> {
        Ok(Resource {
            kind: kind.to_string(),
            properties: serde_json::to_value(properties)?,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        })
    }

    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    pub fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub kind: String,
    pub description: String,
}

impl Parameter {
    pub fn string(description: impl Into<String>) -> Self {
        Parameter {
            kind: "String".to_string(),
            description: description.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub description: String,
    pub value: Expr,
}

/// CloudFormation template. Keys are kept sorted so rendering is stable.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    format_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<String, Parameter>,
    resources: BTreeMap<String, Resource>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    outputs: BTreeMap<String, Output>,
}

impl Default for Template {
    fn default() -> Self {
        Template {
            format_version: FORMAT_VERSION.to_string(),
            description: None,
            parameters: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }
}

impl Template {
    pub fn new(description: Option<String>) -> Self {
        Template {
            description,
            ..Default::default()
        }
    }

    pub fn add_parameter(&mut self, id: &str, parameter: Parameter) -> Result<Expr, InfraError> {
        self.ensure_free(id)?;
        self.parameters.insert(id.to_string(), parameter);
        Ok(Expr::reference(id))
    }

    pub fn add(&mut self, construct: &dyn Construct) -> Result<(), InfraError> {
        let id = construct.logical_id();
        self.ensure_free(id)?;
        let resource = construct.resource()?;
        self.resources.insert(id.to_string(), resource);
        Ok(())
    }

    pub fn add_output(
        &mut self,
        id: &str,
        description: &str,
        value: Expr,
    ) -> Result<(), InfraError> {
        if self.outputs.contains_key(id) {
            return Err(InfraError::DuplicateLogicalId { id: id.to_string() });
        }
        self.outputs.insert(
            id.to_string(),
            Output {
                description: description.to_string(),
                value,
            },
        );
        Ok(())
    }

    pub fn output(&self, id: &str) -> Option<&Output> {
        self.outputs.get(id)
    }

    pub fn output_ids(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    /// Checks that every `Ref`, `Fn::GetAtt`, `Fn::Sub` variable and
    /// `DependsOn` entry names a declared resource, a parameter or an
    /// `AWS::` pseudo parameter.
    pub fn validate(&self) -> Result<(), InfraError> {
        for (id, resource) in &self.resources {
            let mut targets = BTreeSet::new();
            collect_references(&resource.properties, &mut targets);
            targets.extend(resource.depends_on.iter().cloned());
            self.check_targets(id, targets)?;
        }

        for (id, output) in &self.outputs {
            let mut targets = BTreeSet::new();
            collect_references(&serde_json::to_value(&output.value)?, &mut targets);
            self.check_targets(id, targets)?;
        }

        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String, InfraError> {
        self.validate()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> Result<Value, InfraError> {
        self.validate()?;
        Ok(serde_json::to_value(self)?)
    }

    fn ensure_free(&self, id: &str) -> Result<(), InfraError> {
        if self.resources.contains_key(id) || self.parameters.contains_key(id) {
            return Err(InfraError::DuplicateLogicalId { id: id.to_string() });
        }
        Ok(())
    }

    fn check_targets(&self, from: &str, targets: BTreeSet<String>) -> Result<(), InfraError> {
        for target in targets {
            let known = target.starts_with("AWS::")
                || self.resources.contains_key(&target)
                || self.parameters.contains_key(&target);
            if !known {
                return Err(InfraError::UnresolvedReference {
                    from: from.to_string(),
                    target,
                });
            }
        }
        Ok(())
    }
}

fn collect_references(value: &Value, targets: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(id)) = map.get("Ref") {
                    targets.insert(id.clone());
                    return;
                }
                if let Some(Value::Array(parts)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(id)) = parts.first() {
                        targets.insert(id.clone());
                    }
                    return;
                }
                if let Some(Value::String(template)) = map.get("Fn::Sub") {
                    targets.extend(sub_variables(template));
                    return;
                }
            }
            map.values().for_each(|v| collect_references(v, targets));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, targets)),
        _ => {}
    }
}

/// Logical ids named by `${Name}` or `${Name.Attr}` in a `Fn::Sub` string.
/// `${!Literal}` is an escape and names nothing.
fn sub_variables(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let variable = &after[..end];
        if !variable.starts_with('!') {
            let name = variable.split('.').next().unwrap_or(variable);
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }

    names
}
