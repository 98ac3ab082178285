//! CSDL XML writer.
//!
//! Renders declaration trees as an EDMX document:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <edmx:Edmx Version="3.0" xmlns:edmx="http://schemas.microsoft.com/ado/2009/11/edmx">
//!   <edmx:DataServices>
//!     <Schema Namespace="NS" xmlns="http://schemas.microsoft.com/ado/2009/11/edm">
//!       <ComplexType Name="Point">
//!         <Property Name="X" Type="Edm.Int32" Nullable="false"/>
//!       </ComplexType>
//!     </Schema>
//!   </edmx:DataServices>
//! </edmx:Edmx>
//! ```
//!
//! Attributes holding their default value (`Nullable="true"`,
//! `Abstract="false"`, ...) are omitted.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::InterchangeError;
use crate::syntax::{
    AnnotationDecl, AnnotationsDecl, AssociationDecl, AssociationEndDecl, ContainerDecl,
    EnumTypeDecl, ExprDecl, ExprDeclKind, NavigationPropertyDecl, PropertyDecl,
    PropertyValueDecl, SchemaDecl, SchemaItemDecl, StructuredTypeDecl, TermDecl,
};

/// XML namespace URIs.
pub mod namespace {
    pub const EDMX: &str = "http://schemas.microsoft.com/ado/2009/11/edmx";
    pub const EDM: &str = "http://schemas.microsoft.com/ado/2009/11/edm";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsdlWriter;

impl CsdlWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, schemas: &[SchemaDecl]) -> Result<String, InterchangeError> {
        let mut out = Emitter {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        };
        out.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut edmx = BytesStart::new("edmx:Edmx");
        edmx.push_attribute(("Version", "3.0"));
        edmx.push_attribute(("xmlns:edmx", namespace::EDMX));
        out.open(edmx)?;
        out.open(BytesStart::new("edmx:DataServices"))?;
        for schema in schemas {
            out.schema(schema)?;
        }
        out.close("edmx:DataServices")?;
        out.close("edmx:Edmx")?;

        let mut bytes = out.writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| InterchangeError::xml(format!("Invalid UTF-8: {e}")))
    }
}

struct Emitter {
    writer: Writer<Vec<u8>>,
}

fn attr(start: &mut BytesStart<'_>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        start.push_attribute((key, value));
    }
}

fn flag(start: &mut BytesStart<'_>, key: &str, value: bool, default: bool) {
    if value != default {
        start.push_attribute((key, if value { "true" } else { "false" }));
    }
}

impl Emitter {
    fn event(&mut self, event: Event<'_>) -> Result<(), InterchangeError> {
        self.writer
            .write_event(event)
            .map_err(|e| InterchangeError::xml(format!("Write error: {e}")))
    }

    fn open(&mut self, start: BytesStart<'_>) -> Result<(), InterchangeError> {
        self.event(Event::Start(start))
    }

    fn close(&mut self, name: &str) -> Result<(), InterchangeError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, start: BytesStart<'_>) -> Result<(), InterchangeError> {
        self.event(Event::Empty(start))
    }

    /// `<name>text</name>`
    fn text_element(&mut self, name: &str, text: &str) -> Result<(), InterchangeError> {
        self.open(BytesStart::new(name))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    fn schema(&mut self, schema: &SchemaDecl) -> Result<(), InterchangeError> {
        let mut start = BytesStart::new("Schema");
        start.push_attribute(("Namespace", schema.namespace.as_str()));
        attr(&mut start, "Alias", schema.alias.as_deref());
        start.push_attribute(("xmlns", namespace::EDM));

        if schema.usings.is_empty() && schema.items.is_empty() && schema.annotations.is_empty() {
            return self.empty(start);
        }
        self.open(start)?;
        for using in &schema.usings {
            let mut start = BytesStart::new("Using");
            start.push_attribute(("Namespace", using.namespace.as_str()));
            start.push_attribute(("Alias", using.alias.as_str()));
            self.empty(start)?;
        }
        for item in &schema.items {
            match item {
                SchemaItemDecl::EntityType(decl) => self.structured("EntityType", decl)?,
                SchemaItemDecl::ComplexType(decl) => self.structured("ComplexType", decl)?,
                SchemaItemDecl::EnumType(decl) => self.enum_type(decl)?,
                SchemaItemDecl::Association(decl) => self.association(decl)?,
                SchemaItemDecl::Term(decl) => self.term(decl)?,
                SchemaItemDecl::EntityContainer(decl) => self.container(decl)?,
            }
        }
        for block in &schema.annotations {
            self.annotations_block(block)?;
        }
        self.close("Schema")
    }

    fn structured(&mut self, tag: &str, decl: &StructuredTypeDecl) -> Result<(), InterchangeError> {
        let mut start = BytesStart::new(tag);
        start.push_attribute(("Name", decl.name.as_str()));
        attr(&mut start, "BaseType", decl.base_type.as_deref());
        flag(&mut start, "Abstract", decl.is_abstract, false);
        flag(&mut start, "OpenType", decl.is_open, false);

        if decl.key.is_empty()
            && decl.properties.is_empty()
            && decl.navigation_properties.is_empty()
            && decl.annotations.is_empty()
        {
            return self.empty(start);
        }
        self.open(start)?;
        if !decl.key.is_empty() {
            self.open(BytesStart::new("Key"))?;
            for name in &decl.key {
                let mut start = BytesStart::new("PropertyRef");
                start.push_attribute(("Name", name.as_str()));
                self.empty(start)?;
            }
            self.close("Key")?;
        }
        for property in &decl.properties {
            self.property(property)?;
        }
        for navigation in &decl.navigation_properties {
            self.navigation_property(navigation)?;
        }
        self.annotation_list(&decl.annotations)?;
        self.close(tag)
    }

    fn property(&mut self, decl: &PropertyDecl) -> Result<(), InterchangeError> {
        let mut start = BytesStart::new("Property");
        start.push_attribute(("Name", decl.name.as_str()));
        start.push_attribute(("Type", decl.type_ref.as_str()));
        flag(&mut start, "Nullable", decl.nullable, true);
        attr(&mut start, "DefaultValue", decl.default_value.as_deref());
        if decl.fixed_concurrency {
            start.push_attribute(("ConcurrencyMode", "Fixed"));
        }
        self.with_annotations(start, "Property", &decl.annotations)
    }

    fn navigation_property(&mut self, decl: &NavigationPropertyDecl) -> Result<(), InterchangeError> {
        let mut start = BytesStart::new("NavigationProperty");
        start.push_attribute(("Name", decl.name.as_str()));
        start.push_attribute(("Relationship", decl.relationship.as_str()));
        start.push_attribute(("FromRole", decl.from_role.as_str()));
        start.push_attribute(("ToRole", decl.to_role.as_str()));
        self.with_annotations(start, "NavigationProperty", &decl.annotations)
    }

    fn enum_type(&mut self, decl: &EnumTypeDecl) -> Result<(), InterchangeError> {
        let mut start = BytesStart::new("EnumType");
        start.push_attribute(("Name", decl.name.as_str()));
        attr(&mut start, "UnderlyingType", decl.underlying_type.as_deref());
        flag(&mut start, "IsFlags", decl.is_flags, false);
        if decl.members.is_empty() && decl.annotations.is_empty() {
            return self.empty(start);
        }
        self.open(start)?;
        for member in &decl.members {
            let mut start = BytesStart::new("Member");
            start.push_attribute(("Name", member.name.as_str()));
            attr(&mut start, "Value", member.value.as_deref());
            self.empty(start)?;
        }
        self.annotation_list(&decl.annotations)?;
        self.close("EnumType")
    }

    fn association(&mut self, decl: &AssociationDecl) -> Result<(), InterchangeError> {
        let mut start = BytesStart::new("Association");
        start.push_attribute(("Name", decl.name.as_str()));
        self.open(start)?;
        self.association_end(&decl.end1)?;
        self.association_end(&decl.end2)?;
        self.annotation_list(&decl.annotations)?;
        self.close("Association")
    }

    fn association_end(&mut self, end: &AssociationEndDecl) -> Result<(), InterchangeError> {
        let mut start = BytesStart::new("End");
        start.push_attribute(("Role", end.role.as_str()));
        start.push_attribute(("Type", end.type_ref.as_str()));
        start.push_attribute(("Multiplicity", end.multiplicity.as_str()));
        self.empty(start)
    }

    fn term(&mut self, decl: &TermDecl) -> Result<(), InterchangeError> {
        let mut start = BytesStart::new("ValueTerm");
        start.push_attribute(("Name", decl.name.as_str()));
        start.push_attribute(("Type", decl.type_ref.as_str()));
        flag(&mut start, "Nullable", decl.nullable, true);
        attr(&mut start, "DefaultValue", decl.default_value.as_deref());
        attr(&mut start, "AppliesTo", decl.applies_to.as_deref());
        self.with_annotations(start, "ValueTerm", &decl.annotations)
    }

    fn container(&mut self, decl: &ContainerDecl) -> Result<(), InterchangeError> {
        let mut start = BytesStart::new("EntityContainer");
        start.push_attribute(("Name", decl.name.as_str()));
        attr(&mut start, "Extends", decl.extends.as_deref());
        if decl.entity_sets.is_empty()
            && decl.association_sets.is_empty()
            && decl.annotations.is_empty()
        {
            return self.empty(start);
        }
        self.open(start)?;
        for set in &decl.entity_sets {
            let mut start = BytesStart::new("EntitySet");
            start.push_attribute(("Name", set.name.as_str()));
            start.push_attribute(("EntityType", set.entity_type.as_str()));
            self.with_annotations(start, "EntitySet", &set.annotations)?;
        }
        for set in &decl.association_sets {
            let mut start = BytesStart::new("AssociationSet");
            start.push_attribute(("Name", set.name.as_str()));
            start.push_attribute(("Association", set.association.as_str()));
            let ends: Vec<_> = set.end1.iter().chain(set.end2.iter()).collect();
            if ends.is_empty() {
                self.empty(start)?;
                continue;
            }
            self.open(start)?;
            for end in ends {
                let mut start = BytesStart::new("End");
                start.push_attribute(("Role", end.role.as_str()));
                start.push_attribute(("EntitySet", end.entity_set.as_str()));
                self.empty(start)?;
            }
            self.close("AssociationSet")?;
        }
        self.annotation_list(&decl.annotations)?;
        self.close("EntityContainer")
    }

    /// Element whose only children are inline annotations.
    fn with_annotations(
        &mut self,
        start: BytesStart<'_>,
        tag: &str,
        annotations: &[AnnotationDecl],
    ) -> Result<(), InterchangeError> {
        if annotations.is_empty() {
            return self.empty(start);
        }
        self.open(start)?;
        self.annotation_list(annotations)?;
        self.close(tag)
    }

    fn annotations_block(&mut self, block: &AnnotationsDecl) -> Result<(), InterchangeError> {
        let mut start = BytesStart::new("Annotations");
        start.push_attribute(("Target", block.target.as_str()));
        attr(&mut start, "Qualifier", block.qualifier.as_deref());
        self.with_annotations(start, "Annotations", &block.annotations)
    }

    fn annotation_list(&mut self, annotations: &[AnnotationDecl]) -> Result<(), InterchangeError> {
        for annotation in annotations {
            self.annotation(annotation)?;
        }
        Ok(())
    }

    fn annotation(&mut self, annotation: &AnnotationDecl) -> Result<(), InterchangeError> {
        match annotation {
            AnnotationDecl::Value {
                term,
                qualifier,
                expr,
                ..
            } => {
                let mut start = BytesStart::new("ValueAnnotation");
                start.push_attribute(("Term", term.as_str()));
                attr(&mut start, "Qualifier", qualifier.as_deref());
                self.open(start)?;
                self.expr(expr)?;
                self.close("ValueAnnotation")
            }
            AnnotationDecl::Type {
                term,
                qualifier,
                property_values,
                ..
            } => {
                let mut start = BytesStart::new("TypeAnnotation");
                start.push_attribute(("Term", term.as_str()));
                attr(&mut start, "Qualifier", qualifier.as_deref());
                if property_values.is_empty() {
                    return self.empty(start);
                }
                self.open(start)?;
                self.property_values(property_values)?;
                self.close("TypeAnnotation")
            }
        }
    }

    fn property_values(&mut self, values: &[PropertyValueDecl]) -> Result<(), InterchangeError> {
        for value in values {
            let mut start = BytesStart::new("PropertyValue");
            start.push_attribute(("Property", value.property.as_str()));
            self.open(start)?;
            self.expr(&value.expr)?;
            self.close("PropertyValue")?;
        }
        Ok(())
    }

    fn expr(&mut self, expr: &ExprDecl) -> Result<(), InterchangeError> {
        let (tag, start) = match &expr.kind {
            ExprDeclKind::Constant { kind, text } => return self.text_element(kind.as_str(), text),
            ExprDeclKind::Null => return self.empty(BytesStart::new("Null")),
            ExprDeclKind::Path(segments) => {
                let path = segments
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join("/");
                return self.text_element("Path", &path);
            }
            ExprDeclKind::EnumMember(path) => return self.text_element("EnumMember", path),
            ExprDeclKind::LabeledElementReference(name) => {
                return self.text_element("LabeledElementReference", name);
            }
            ExprDeclKind::Record {
                type_ref,
                properties,
            } => {
                let mut start = BytesStart::new("Record");
                attr(&mut start, "Type", type_ref.as_deref());
                if properties.is_empty() {
                    return self.empty(start);
                }
                self.open(start)?;
                self.property_values(properties)?;
                return self.close("Record");
            }
            ExprDeclKind::If(_) => ("If", BytesStart::new("If")),
            ExprDeclKind::Cast { type_ref, .. } => ("Cast", typed("Cast", type_ref)),
            ExprDeclKind::IsType { type_ref, .. } => ("IsType", typed("IsType", type_ref)),
            ExprDeclKind::Collection { type_ref, .. } => {
                let mut start = BytesStart::new("Collection");
                attr(&mut start, "Type", type_ref.as_deref());
                ("Collection", start)
            }
            ExprDeclKind::Apply { function, .. } => {
                let mut start = BytesStart::new("Apply");
                start.push_attribute(("Function", function.as_str()));
                ("Apply", start)
            }
            ExprDeclKind::LabeledElement { name, .. } => {
                let mut start = BytesStart::new("LabeledElement");
                start.push_attribute(("Name", name.as_str()));
                ("LabeledElement", start)
            }
        };

        let children = expr.children();
        if children.is_empty() {
            return self.empty(start);
        }
        self.open(start)?;
        for child in children {
            self.expr(child)?;
        }
        self.close(tag)
    }
}

fn typed<'a>(tag: &'a str, type_ref: &'a str) -> BytesStart<'a> {
    let mut start = BytesStart::new(tag);
    start.push_attribute(("Type", type_ref));
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Multiplicity, PropertyValueDecl};

    fn render(schema: SchemaDecl) -> String {
        CsdlWriter::new().write(&[schema]).unwrap()
    }

    #[test]
    fn test_writes_envelope_and_schema() {
        let xml = render(SchemaDecl::new("NS").with_alias("n"));
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<edmx:Edmx Version=\"3.0\""));
        assert!(xml.contains("<Schema Namespace=\"NS\" Alias=\"n\" xmlns=\"http://schemas.microsoft.com/ado/2009/11/edm\"/>"));
    }

    #[test]
    fn test_omits_default_attributes() {
        let xml = render(
            SchemaDecl::new("NS").with_entity_type(
                StructuredTypeDecl::new("Order")
                    .with_key("Id")
                    .with_property(PropertyDecl::new("Id", "Edm.Int32").with_nullable(false))
                    .with_property(PropertyDecl::new("Note", "Edm.String")),
            ),
        );
        assert!(xml.contains("<PropertyRef Name=\"Id\"/>"));
        assert!(xml.contains("<Property Name=\"Id\" Type=\"Edm.Int32\" Nullable=\"false\"/>"));
        assert!(xml.contains("<Property Name=\"Note\" Type=\"Edm.String\"/>"));
        assert!(!xml.contains("Abstract"));
    }

    #[test]
    fn test_writes_associations_and_ends() {
        let xml = render(SchemaDecl::new("NS").with_association(AssociationDecl::new(
            "OrderCustomer",
            AssociationEndDecl::new("Order", "NS.Order", Multiplicity::Many),
            AssociationEndDecl::new("Customer", "NS.Customer", Multiplicity::ZeroOrOne),
        )));
        assert!(xml.contains("<End Role=\"Order\" Type=\"NS.Order\" Multiplicity=\"*\"/>"));
        assert!(xml.contains("Multiplicity=\"0..1\""));
    }

    #[test]
    fn test_writes_expressions_and_escapes_text() {
        let xml = render(
            SchemaDecl::new("NS").with_annotations(
                AnnotationsDecl::new("NS.Order")
                    .with_annotation(AnnotationDecl::value(
                        "NS.Label",
                        ExprDecl::if_(
                            ExprDecl::path("Address/City"),
                            ExprDecl::string("a < b"),
                            ExprDecl::null(),
                        ),
                    ))
                    .with_annotation(AnnotationDecl::type_annotation(
                        "NS.Info",
                        vec![PropertyValueDecl::new("Size", ExprDecl::int(3))],
                    )),
            ),
        );
        assert!(xml.contains("<Annotations Target=\"NS.Order\">"));
        assert!(xml.contains("<Path>Address/City</Path>"));
        assert!(xml.contains("<String>a &lt; b</String>"));
        assert!(xml.contains("<Null/>"));
        assert!(xml.contains("<PropertyValue Property=\"Size\">"));
        assert!(xml.contains("<Int>3</Int>"));
    }
}
