//! Reading and writing documents.
//!
//! YAML goes through `serde_yaml`, which expands aliases while parsing, so
//! documents read from text carry no anchors. JSON input is recognized by a
//! `.json` extension.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;
use ymerge_types::{from_json_str, to_json, Mapping, Node, NodeRef, Scalar, Value};

use crate::cli::OutputFormat;

/// Every document in `source`, which is a file path or `-` for stdin.
pub fn read_documents(source: &str) -> anyhow::Result<Vec<NodeRef>> {
    let text = if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read standard input")?;
        text
    } else {
        fs::read_to_string(source).with_context(|| format!("failed to read {source}"))?
    };

    let is_json = Path::new(source)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let doc = from_json_str(&text).with_context(|| format!("failed to parse {source}"))?;
        return Ok(vec![doc]);
    }
    parse_yaml_documents(&text).with_context(|| format!("failed to parse {source}"))
}

/// Parse a YAML stream, one node tree per `---` document.
pub fn parse_yaml_documents(text: &str) -> anyhow::Result<Vec<NodeRef>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(document)?;
        documents.push(from_yaml(&value));
    }
    Ok(documents)
}

/// Build a node tree from a parsed YAML value. Tags are dropped.
pub fn from_yaml(value: &serde_yaml::Value) -> NodeRef {
    let node = match value {
        serde_yaml::Value::Null => Node::null(),
        serde_yaml::Value::Bool(b) => Node::scalar(*b),
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => Node::scalar(i),
            None => Node::scalar(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_yaml::Value::String(s) => Node::scalar(s.as_str()),
        serde_yaml::Value::Sequence(items) => Node::sequence(items.iter().map(from_yaml).collect()),
        serde_yaml::Value::Mapping(m) => {
            let mut mapping = Mapping::new();
            for (k, v) in m {
                mapping.push(from_yaml(k), from_yaml(v));
            }
            Node::mapping(mapping)
        }
        serde_yaml::Value::Tagged(tagged) => return from_yaml(&tagged.value),
    };
    node.into_ref()
}

/// Render a node tree as a YAML value. Aliases become copies.
pub fn to_yaml(node: &NodeRef) -> serde_yaml::Value {
    let node = node.borrow();
    match &node.value {
        Value::Scalar(s) => match s {
            Scalar::Null => serde_yaml::Value::Null,
            Scalar::Bool(b) => serde_yaml::Value::Bool(*b),
            Scalar::Int(i) => serde_yaml::Value::Number((*i).into()),
            Scalar::Float(x) => serde_yaml::Value::Number((*x).into()),
            Scalar::String(s) => serde_yaml::Value::String(s.clone()),
        },
        Value::Sequence(items) => serde_yaml::Value::Sequence(items.iter().map(to_yaml).collect()),
        Value::Mapping(m) => {
            let mut out = serde_yaml::Mapping::new();
            for (k, v) in m.iter() {
                out.insert(to_yaml(k), to_yaml(v));
            }
            serde_yaml::Value::Mapping(out)
        }
    }
}

/// Serialize the merged document.
pub fn render(node: &NodeRef, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&to_yaml(node))?),
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(&to_json(node))?;
            text.push('\n');
            Ok(text)
        }
    }
}

/// Write `text` to `output`, or to stdout when there is none.
pub fn write_output(text: &str, output: Option<&Path>, overwrite: bool) -> anyhow::Result<()> {
    let Some(path) = output else {
        print!("{text}");
        return Ok(());
    };
    if path.exists() && !overwrite {
        bail!(
            "refusing to overwrite existing file {} (use --overwrite)",
            path.display()
        );
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}
