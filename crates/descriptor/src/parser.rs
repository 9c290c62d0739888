//! Custom shader descriptor parser.
//!
//! Turns a `CustomShader` XML document into a [`ShaderDescriptor`]. The parser
//! is a pure function of the document text; reading the file is the only I/O
//! and lives in [`load_descriptor`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{
    ParameterType, ShaderDescriptor, ShaderParameterSpec, ShaderTextureSpec, VariationSpec,
    MANDATORY_GROUP,
};

pub const ROOT_TAG: &str = "CustomShader";

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("descriptor not found at {0}")]
    Missing(PathBuf),

    #[error("failed to read descriptor {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("descriptor is not well-formed XML: {0}")]
    Malformed(#[from] roxmltree::Error),

    #[error("descriptor root element is '{0}', expected '{ROOT_TAG}'")]
    UnexpectedRoot(String),
}

/// Read and parse the descriptor at `path`.
pub fn load_descriptor(path: &Path) -> Result<ShaderDescriptor, DescriptorError> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            DescriptorError::Missing(path.to_path_buf())
        } else {
            DescriptorError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    debug!(path = %path.display(), bytes = content.len(), "read shader descriptor");
    parse_descriptor(&content)
}

/// Parse descriptor XML content.
pub fn parse_descriptor(content: &str) -> Result<ShaderDescriptor, DescriptorError> {
    let doc = Document::parse(content)?;
    let root = doc.root_element();
    if root.tag_name().name() != ROOT_TAG {
        return Err(DescriptorError::UnexpectedRoot(
            root.tag_name().name().to_string(),
        ));
    }

    let mut descriptor = ShaderDescriptor::default();

    if let Some(parameters) = first_child(root, "Parameters") {
        for entry in elements(parameters) {
            let specs = parse_parameter(entry);
            if specs.is_empty() {
                continue;
            }
            let group = entry.attribute("group").unwrap_or(MANDATORY_GROUP);
            descriptor.parameters.extend(group, specs);
        }
    }

    if let Some(textures) = first_child(root, "Textures") {
        for entry in elements(textures) {
            // Textures without a colour profile are internal inputs, not user slots.
            if entry.attribute("defaultColorProfile").is_none() {
                continue;
            }
            let Some(texture) = parse_texture(entry) else {
                continue;
            };
            let group = entry.attribute("group").unwrap_or(MANDATORY_GROUP);
            descriptor.textures.push(group, texture);
        }
    }

    if let Some(variations) = first_child(root, "Variations") {
        descriptor.variations = elements(variations).filter_map(parse_variation).collect();
    }

    debug!(
        parameters = descriptor.parameters.len(),
        textures = descriptor.textures.len(),
        variations = descriptor.variations.len(),
        "parsed shader descriptor"
    );

    Ok(descriptor)
}

fn first_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    elements(node).find(|child| child.tag_name().name() == tag)
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

fn parse_parameter(node: Node) -> Vec<ShaderParameterSpec> {
    let Some(name) = node.attribute("name") else {
        warn!(line = line_of(node), "skipping shader parameter without a name");
        return Vec::new();
    };
    let Some(raw_type) = node.attribute("type") else {
        warn!(parameter = name, "skipping shader parameter without a type");
        return Vec::new();
    };
    let Some(kind) = ParameterType::from_attribute(raw_type) else {
        warn!(parameter = name, kind = raw_type, "skipping shader parameter with unknown type");
        return Vec::new();
    };

    if node.attribute("arraySize").is_some() {
        return elements(node)
            .enumerate()
            .map(|(position, child)| {
                let index = child
                    .attribute("index")
                    .map(str::to_string)
                    .unwrap_or_else(|| position.to_string());
                ShaderParameterSpec {
                    name: format!("{name}{index}"),
                    kind,
                    default_value: parse_default(name, kind, child.text()),
                }
            })
            .collect();
    }

    vec![ShaderParameterSpec {
        name: name.to_string(),
        kind,
        default_value: parse_default(name, kind, node.attribute("defaultValue")),
    }]
}

/// Derive a default value of exactly `kind.arity()` components.
///
/// Descriptors commonly spell every default as four components regardless of
/// the declared type; components past the arity are dropped.
pub fn parse_default(parameter: &str, kind: ParameterType, raw: Option<&str>) -> Vec<f32> {
    let arity = kind.arity();
    let mut values: Vec<f32> = raw
        .unwrap_or_default()
        .split_whitespace()
        .take(arity)
        .map(|token| {
            token.parse::<f32>().unwrap_or_else(|_| {
                warn!(parameter, token, "non-numeric default component; using 0");
                0.0
            })
        })
        .collect();
    values.resize(arity, 0.0);
    values
}

fn parse_texture(node: Node) -> Option<ShaderTextureSpec> {
    let Some(name) = node.attribute("name") else {
        warn!(line = line_of(node), "skipping shader texture without a name");
        return None;
    };
    Some(ShaderTextureSpec {
        name: name.to_string(),
        default_file: node.attribute("defaultFilename").unwrap_or_default().to_string(),
    })
}

fn parse_variation(node: Node) -> Option<VariationSpec> {
    let Some(name) = node.attribute("name") else {
        warn!(line = line_of(node), "skipping shader variation without a name");
        return None;
    };
    let mut groups: Vec<String> = Vec::new();
    for group in node.attribute("groups").unwrap_or_default().split_whitespace() {
        if !groups.iter().any(|existing| existing == group) {
            groups.push(group.to_string());
        }
    }
    Some(VariationSpec {
        name: name.to_string(),
        groups,
    })
}

fn line_of(node: Node) -> u32 {
    node.document().text_pos_at(node.range().start).row
}
