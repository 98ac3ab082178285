//! Interchange round trips through the filesystem.

use edm::hir::{Model, validate};
use edm::interchange::{self, CsdlWriter};
use edm::syntax::{
    AnnotationDecl, AnnotationsDecl, ContainerDecl, ExprDecl, PropertyDecl, SchemaDecl,
    StructuredTypeDecl, TermDecl,
};

use crate::helpers::model_helpers::isolated;

fn catalog() -> SchemaDecl {
    SchemaDecl::new("NS")
        .with_term(TermDecl::new("Label", "Edm.String"))
        .with_entity_type(
            StructuredTypeDecl::new("Item")
                .with_key("Id")
                .with_property(PropertyDecl::new("Id", "Edm.Int32").with_nullable(false)),
        )
        .with_container(ContainerDecl::new("Store").with_entity_set("Items", "NS.Item"))
        .with_annotations(
            AnnotationsDecl::new("NS.Store/Items")
                .with_annotation(AnnotationDecl::value("NS.Label", ExprDecl::string("All items"))),
        )
}

#[test]
fn test_json_file_round_trip_rebuilds_equal_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    interchange::write_file(&path, &[catalog()]).unwrap();

    let schemas = interchange::read_file(&path).unwrap();
    assert_eq!(schemas, vec![catalog()]);

    let model = Model::builder().with_options(isolated()).with_schemas(schemas).build();
    assert!(validate(&model).is_valid());
    assert_eq!(model.to_declarations(), vec![catalog()]);
}

#[test]
fn test_csdl_of_rebuilt_model_matches_source() {
    let model = Model::builder().with_options(isolated()).with_schema(catalog()).build();
    let writer = CsdlWriter::new();
    let from_model = writer.write(&model.to_declarations()).unwrap();
    let from_source = writer.write(&[catalog()]).unwrap();
    assert_eq!(from_model, from_source);
    assert!(from_source.contains("<Annotations Target=\"NS.Store/Items\">"));
}
