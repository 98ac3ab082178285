//! Re-emission of a model as declarations.
//!
//! The arenas keep every declaration node they were built from, so the
//! declaration forest can be reassembled exactly: same schemas, same item
//! order, same inline and out-of-line annotations.

use crate::syntax::{AnnotationDecl, ContainerDecl, SchemaDecl, SchemaItemDecl};

use super::ids::{AnnotationId, ContainerId, ElementKey};
use super::model::{Model, SchemaData, TypeDecl, TypeKind};

impl Model {
    /// Declarations equal to the ones this model was built from.
    pub fn to_declarations(&self) -> Vec<SchemaDecl> {
        self.schemas.iter().map(|schema| self.emit_schema(schema)).collect()
    }

    fn emit_annotations(&self, ids: &[AnnotationId]) -> Vec<AnnotationDecl> {
        ids.iter()
            .map(|id| self.annotation_data(*id).decl.clone())
            .collect()
    }

    fn emit_schema(&self, data: &SchemaData) -> SchemaDecl {
        let items = data.items.iter().filter_map(|key| self.emit_item(*key)).collect();
        let annotations = data
            .blocks
            .iter()
            .map(|block| {
                let mut decl = block.decl.clone();
                decl.annotations = self.emit_annotations(&block.annotations);
                decl
            })
            .collect();

        SchemaDecl {
            namespace: data.namespace.clone(),
            alias: data.alias.clone(),
            usings: data.usings.clone(),
            items,
            annotations,
            location: data.location.clone(),
        }
    }

    fn emit_item(&self, key: ElementKey) -> Option<SchemaItemDecl> {
        let item = match key {
            ElementKey::Type(id) => {
                let data = self.type_data(id);
                match &data.decl {
                    TypeDecl::Structured(decl) => {
                        let mut decl = decl.clone();
                        decl.properties = data
                            .properties
                            .iter()
                            .map(|pid| {
                                let property = self.property_data(*pid);
                                let mut decl = property.decl.clone();
                                decl.annotations = self.emit_annotations(&property.annotations);
                                decl
                            })
                            .collect();
                        decl.navigation_properties = data
                            .navigation_properties
                            .iter()
                            .map(|nid| {
                                let navigation = self.navigation_data(*nid);
                                let mut decl = navigation.decl.clone();
                                decl.annotations = self.emit_annotations(&navigation.annotations);
                                decl
                            })
                            .collect();
                        decl.annotations = self.emit_annotations(&data.annotations);
                        if data.kind == TypeKind::Entity {
                            SchemaItemDecl::EntityType(decl)
                        } else {
                            SchemaItemDecl::ComplexType(decl)
                        }
                    }
                    TypeDecl::Enum(decl) => {
                        let mut decl = decl.clone();
                        decl.annotations = self.emit_annotations(&data.annotations);
                        SchemaItemDecl::EnumType(decl)
                    }
                }
            }
            ElementKey::Association(id) => {
                let data = self.association_data(id);
                let mut decl = data.decl.clone();
                decl.annotations = self.emit_annotations(&data.annotations);
                SchemaItemDecl::Association(decl)
            }
            ElementKey::Term(id) => {
                let data = self.term_data(id);
                let mut decl = data.decl.clone();
                decl.annotations = self.emit_annotations(&data.annotations);
                SchemaItemDecl::Term(decl)
            }
            ElementKey::Container(id) => SchemaItemDecl::EntityContainer(self.emit_container(id)),
            // Members are emitted with their owner.
            ElementKey::Property(_) | ElementKey::NavigationProperty(_) | ElementKey::EntitySet(_) => {
                return None;
            }
        };
        Some(item)
    }

    fn emit_container(&self, id: ContainerId) -> ContainerDecl {
        let data = self.container_data(id);
        let mut decl = data.decl.clone();
        decl.entity_sets = data
            .entity_sets
            .iter()
            .map(|sid| {
                let set = self.entity_set_data(*sid);
                let mut decl = set.decl.clone();
                decl.annotations = self.emit_annotations(&set.annotations);
                decl
            })
            .collect();
        decl.association_sets = data
            .association_sets
            .iter()
            .map(|aid| self.association_set_data(*aid).decl.clone())
            .collect();
        decl.annotations = self.emit_annotations(&data.annotations);
        decl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Location;
    use crate::hir::ModelOptions;
    use crate::syntax::{
        AnnotationsDecl, AssociationDecl, AssociationEndDecl, ExprDecl, Multiplicity,
        NavigationPropertyDecl, PropertyDecl, StructuredTypeDecl, TermDecl,
    };

    #[test]
    fn test_round_trip_preserves_declarations() {
        let schema = SchemaDecl::new("NS")
            .with_alias("n")
            .with_term(TermDecl::new("Label", "Edm.String"))
            .with_entity_type(
                StructuredTypeDecl::new("Order")
                    .with_key("Id")
                    .with_property(
                        PropertyDecl::new("Id", "Edm.Int32")
                            .with_nullable(false)
                            .with_annotation(AnnotationDecl::value("NS.Label", ExprDecl::string("id"))),
                    )
                    .with_navigation_property(NavigationPropertyDecl::new(
                        "Customer",
                        "NS.OrderCustomer",
                        "Order",
                        "Customer",
                    ))
                    .at(Location::at("orders.csdl", 3, 5)),
            )
            .with_entity_type(StructuredTypeDecl::new("Customer").with_key("Id").with_property(
                PropertyDecl::new("Id", "Edm.Int32").with_nullable(false),
            ))
            .with_association(AssociationDecl::new(
                "OrderCustomer",
                AssociationEndDecl::new("Order", "NS.Order", Multiplicity::Many),
                AssociationEndDecl::new("Customer", "NS.Customer", Multiplicity::One),
            ))
            .with_container(
                ContainerDecl::new("Store")
                    .with_entity_set("Orders", "NS.Order")
                    .with_entity_set("Customers", "NS.Customer"),
            )
            .with_annotations(
                AnnotationsDecl::new("NS.Customer")
                    .with_annotation(AnnotationDecl::value("NS.Label", ExprDecl::string("buyer"))),
            );

        let model = Model::builder()
            .with_options(ModelOptions {
                include_core_vocabulary: false,
                ..ModelOptions::default()
            })
            .with_schema(schema.clone())
            .build();

        assert_eq!(model.to_declarations(), vec![schema]);
    }
}
