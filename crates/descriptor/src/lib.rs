mod model;
mod parser;
mod selection;

pub use model::{
    GroupedSpecs, ParameterType, ShaderDescriptor, ShaderParameterSpec, ShaderTextureSpec,
    VariationSpec, BASE_GROUP, MANDATORY_GROUP,
};
pub use parser::{load_descriptor, parse_default, parse_descriptor, DescriptorError, ROOT_TAG};
pub use selection::{ActivationSet, ActiveSpecs, SelectionError};
