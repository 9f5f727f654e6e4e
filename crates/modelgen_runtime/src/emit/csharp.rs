//! C# emitter: one serializable class per classified entity type.

use heck::ToUpperCamelCase;
use modelgen_engine::ResolvedModel;
use modelgen_foundation::{FieldType, Result, Scalar};

use super::{Emitter, OutputTree, SourceBuilder};

/// Emits `<TypeName>.cs` for every concrete, non-catalog type.
#[derive(Clone, Debug)]
pub struct CSharpEmitter {
    namespace: String,
}

impl CSharpEmitter {
    /// Creates an emitter placing classes in `namespace`.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// The C# type of a field.
    #[must_use]
    pub fn field_type(model: &ResolvedModel, ty: &FieldType) -> String {
        match ty {
            FieldType::Scalar(Scalar::Int) => "long".to_string(),
            FieldType::Scalar(Scalar::String) => "string".to_string(),
            FieldType::Optional(inner) => Self::field_type(model, inner),
            FieldType::List(element) => format!("List<{}>", Self::field_type(model, element)),
            FieldType::Map(key, value) => format!(
                "Dictionary<{}, {}>",
                Self::field_type(model, key),
                Self::field_type(model, value)
            ),
            FieldType::Reference(target) | FieldType::Embedded(target) => {
                model.schema().name_of(*target).to_string()
            }
        }
    }
}

impl Emitter for CSharpEmitter {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn emit(&self, model: &ResolvedModel) -> Result<OutputTree> {
        let mut tree = OutputTree::new();
        for (ty, _) in model.classification().iter() {
            let entity = model.entity(ty)?;
            let class = entity.name();

            let mut src = SourceBuilder::new();
            src.line("using System.Collections.Generic;")
                .line("using UnityEngine;")
                .blank()
                .line(format!("namespace {}", self.namespace))
                .open("{")
                .line("[System.Serializable]")
                .line(format!("public class {class}"))
                .open("{");
            for field in entity.fields() {
                src.line(format!(
                    "public {} {};",
                    Self::field_type(model, &field.ty),
                    field.name.to_upper_camel_case()
                ));
            }
            src.blank()
                .open("public string ToJson() {")
                .line("return JsonUtility.ToJson(this);")
                .close("}")
                .blank()
                .open(format!("public static {class} FromJson(string json) {{"))
                .line(format!("return JsonUtility.FromJson<{class}>(json);"))
                .close("}")
                .close("}")
                .close("}");
            tree.insert(format!("{class}.cs"), src.finish())?;
        }
        Ok(tree)
    }
}
