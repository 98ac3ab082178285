//! Built-in vocabularies.
//!
//! The Core vocabulary (`Org.OData.Core.V1`, alias `Core`) is built once per
//! process and shared by every model that references it. Models reference
//! it by default; see [`ModelOptions::include_core_vocabulary`].
//!
//! # Usage
//!
//! ```ignore
//! use edm::vocab::{self, core};
//!
//! let vocabulary = vocab::core_vocabulary();
//! assert!(!vocabulary.find_term(core::DESCRIPTION).is_placeholder());
//! ```
//!
//! [`ModelOptions::include_core_vocabulary`]: crate::hir::ModelOptions::include_core_vocabulary

pub mod core;

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::hir::{Model, ModelOptions};
use crate::syntax::{
    AnnotationDecl, ExprDecl, PropertyDecl, SchemaDecl, StructuredTypeDecl, TermDecl,
};

pub const CORE_NAMESPACE: &str = "Org.OData.Core.V1";
pub const CORE_ALIAS: &str = "Core";

static CORE: Lazy<Arc<Model>> = Lazy::new(|| {
    let model = Model::builder()
        .with_options(ModelOptions {
            include_core_vocabulary: false,
            ..ModelOptions::default()
        })
        .with_schema(core_schema())
        .build();
    // Shared across threads: resolve everything before handing it out.
    model.resolve_all();
    tracing::debug!("[VOCAB] core vocabulary loaded ({} terms)", model.terms.len());
    Arc::new(model)
});

/// The process-wide Core vocabulary model.
pub fn core_vocabulary() -> Arc<Model> {
    Arc::clone(&CORE)
}

fn described(text: &str) -> AnnotationDecl {
    AnnotationDecl::value("Core.Description", ExprDecl::string(text))
}

fn tag(name: &str, applies_to: &str, description: &str) -> TermDecl {
    TermDecl::new(name, "Edm.Boolean")
        .with_default_value("true")
        .with_applies_to(applies_to)
        .with_annotation(described(description))
}

fn core_schema() -> SchemaDecl {
    let language_dependent =
        AnnotationDecl::value("Core.IsLanguageDependent", ExprDecl::bool(true));
    let requires_string = AnnotationDecl::value("Core.RequiresType", ExprDecl::string("Edm.String"));

    SchemaDecl::new(CORE_NAMESPACE)
        .with_alias(CORE_ALIAS)
        .with_complex_type(
            StructuredTypeDecl::new("OptimisticConcurrencyControlType")
                .with_property(
                    PropertyDecl::new("ETagDependsOn", "Collection(Edm.String)")
                        .with_annotation(described("The ETag is computed from these properties")),
                )
                .with_annotation(described(
                    "If present, the annotated entity set uses optimistic concurrency control",
                )),
        )
        .with_term(
            TermDecl::new("Description", "Edm.String")
                .with_annotation(described("A brief description of a model element"))
                .with_annotation(language_dependent.clone()),
        )
        .with_term(
            TermDecl::new("LongDescription", "Edm.String")
                .with_annotation(described("A lengthy description of a model element"))
                .with_annotation(language_dependent),
        )
        .with_term(
            tag(
                "IsLanguageDependent",
                "Property Term",
                "Properties and terms annotated with this term are language-dependent",
            )
            .with_annotation(requires_string.clone()),
        )
        .with_term(
            TermDecl::new("RequiresType", "Edm.String")
                .with_applies_to("Term")
                .with_annotation(described(
                    "Properties and terms annotated with this annotation MUST have a type that is identical to or derived from the given type name",
                )),
        )
        .with_term(
            TermDecl::new("ResourcePath", "Edm.String")
                .with_applies_to("EntitySet Singleton ActionImport FunctionImport")
                .with_annotation(described(
                    "Resource path for entity container child, can be relative to xml:base and the request URL",
                ))
                .with_annotation(AnnotationDecl::value("Core.IsURL", ExprDecl::bool(true))),
        )
        .with_term(tag(
            "DereferenceableIDs",
            "EntityContainer",
            "Entity-ids are URLs that locate the identified entity",
        ))
        .with_term(tag(
            "ConventionalIDs",
            "EntityContainer",
            "Entity-ids follow OData URL conventions",
        ))
        .with_term(tag(
            "Immutable",
            "Property",
            "A value for this non-key property can be provided on insert and remains unchanged on update",
        ))
        .with_term(tag(
            "Computed",
            "Property",
            "A value for this property is generated on both insert and update",
        ))
        .with_term(
            tag(
                "IsURL",
                "Property Term",
                "Properties and terms annotated with this term MUST contain a valid URL",
            )
            .with_annotation(requires_string.clone()),
        )
        .with_term(
            TermDecl::new("AcceptableMediaTypes", "Collection(Edm.String)")
                .with_applies_to("EntityType Property")
                .with_annotation(described(
                    "Lists the MIME types acceptable for the annotated entity type or stream property",
                ))
                .with_annotation(AnnotationDecl::value("Core.IsMediaType", ExprDecl::bool(true))),
        )
        .with_term(
            TermDecl::new("MediaType", "Edm.String")
                .with_applies_to("Property")
                .with_annotation(AnnotationDecl::value("Core.IsMediaType", ExprDecl::bool(true)))
                .with_annotation(AnnotationDecl::value(
                    "Core.RequiresType",
                    ExprDecl::string("Edm.Binary"),
                )),
        )
        .with_term(
            tag(
                "IsMediaType",
                "Property Term",
                "Properties and terms annotated with this term MUST contain a valid MIME type",
            )
            .with_annotation(requires_string),
        )
        .with_term(TermDecl::new(
            "OptimisticConcurrencyControl",
            "Core.OptimisticConcurrencyControlType",
        ))
        .with_term(
            TermDecl::new("OptimisticConcurrency", "Collection(Edm.String)")
                .with_applies_to("EntitySet")
                .with_annotation(described(
                    "Data modification requires the use of ETags. A non-empty collection contains the set of properties that are used to compute the ETag",
                )),
        )
}

#[cfg(test)]
mod tests {
    use super::core;
    use super::*;
    use crate::hir::{Annotatable, Checkable, Named, validate};

    #[test]
    fn test_core_vocabulary_is_shared() {
        assert!(Arc::ptr_eq(&core_vocabulary(), &core_vocabulary()));
    }

    #[test]
    fn test_core_vocabulary_is_valid() {
        let vocabulary = core_vocabulary();
        let report = validate(&vocabulary);
        assert!(report.is_valid(), "{:?}", report.errors());
    }

    #[test]
    fn test_terms_annotate_themselves_through_the_alias() {
        let vocabulary = core_vocabulary();
        let description = vocabulary.find_term(core::DESCRIPTION).into_declared().unwrap();
        let annotations = description.annotations();
        assert_eq!(annotations.len(), 2);
        assert!(annotations.iter().all(|a| a.is_valid()));
        assert_eq!(description.qualified_name(), core::DESCRIPTION);
    }
}
