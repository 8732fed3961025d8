//! TOML description of a [`TypeCatalog`].
//!
//! ```toml
//! [[types]]
//! name = "Store"
//! kind = "interface"
//! generics = ["T"]
//!
//! [[types.methods]]
//! name = "load"
//! params = ["long"]
//! returns = "T"
//! abstract = true
//!
//! [[types]]
//! name = "Accounts"
//! kind = "class"
//! abstract = true
//! implements = [{ base = "Store", args = ["String"] }]
//! ```
//!
//! A type expression is either a name (`void`, a primitive, `Object`,
//! `String`, a generic parameter in scope, or a catalog type, with any number
//! of `[]` suffixes) or a `{ base, args }` table applying a generic type.
use crate::{
    error::ManifestError,
    types::{
        generics::{ConcreteType, GenericParameter, MemberType, Primitive},
        members::{Marker, MethodDefinition},
        CatalogBuilder, TypeCatalog, TypeIndex, TypeKind, TypeSource,
    },
};
use serde::Deserialize;
use std::{path::Path, str::FromStr, sync::Arc};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub types: Vec<TypeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeEntry {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub generics: Vec<GenericEntry>,
    pub extends: Option<TypeExpr>,
    #[serde(default)]
    pub implements: Vec<TypeExpr>,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
}

fn default_kind() -> String {
    "class".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GenericEntry {
    Name(String),
    Bounded {
        name: String,
        #[serde(default)]
        bounds: Vec<TypeExpr>,
    },
}

impl GenericEntry {
    fn name(&self) -> &str {
        match self {
            GenericEntry::Name(name) | GenericEntry::Bounded { name, .. } => name,
        }
    }

    fn bounds(&self) -> &[TypeExpr] {
        match self {
            GenericEntry::Name(_) => &[],
            GenericEntry::Bounded { bounds, .. } => bounds,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    Name(String),
    Applied {
        base: String,
        #[serde(default)]
        args: Vec<TypeExpr>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodEntry {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeExpr>,
    pub returns: Option<TypeExpr>,
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub generics: Vec<GenericEntry>,
    #[serde(default)]
    pub markers: Vec<MarkerEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MarkerEntry {
    Kind(String),
    Valued { kind: String, value: Option<String> },
}

impl From<&MarkerEntry> for Marker {
    fn from(entry: &MarkerEntry) -> Self {
        match entry {
            MarkerEntry::Kind(kind) => Marker::new(kind.clone()),
            MarkerEntry::Valued { kind, value } => Marker {
                kind: kind.clone(),
                value: value.clone(),
            },
        }
    }
}

impl FromStr for Manifest {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl Manifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        content.parse()
    }

    /// Declares every type, then fills in generics, supertypes and methods.
    pub fn to_catalog(&self) -> Result<Arc<TypeCatalog>, ManifestError> {
        let mut builder = CatalogBuilder::new();
        let mut indices = Vec::with_capacity(self.types.len());
        for entry in &self.types {
            let kind = match entry.kind.as_str() {
                "class" => TypeKind::Class,
                "interface" => TypeKind::Interface,
                other => return Err(ManifestError::UnknownKind(other.to_string())),
            };
            let index = builder.declare(entry.name.clone(), kind)?;
            builder[index].is_abstract |= entry.is_abstract;
            builder[index].generic_parameters = entry
                .generics
                .iter()
                .map(|g| GenericParameter::new(g.name()))
                .collect();
            indices.push(index);
        }

        for (entry, &index) in self.types.iter().zip(&indices) {
            let scope = Scope {
                builder: &builder,
                owner: index,
                method_generics: &[],
            };
            let mut bounds = vec![];
            for generic in &entry.generics {
                bounds.push(scope.all(generic.bounds(), &entry.name)?);
            }
            let extends = entry
                .extends
                .as_ref()
                .map(|e| scope.source(e, &entry.name))
                .transpose()?;
            let implements = entry
                .implements
                .iter()
                .map(|e| scope.source(e, &entry.name))
                .collect::<Result<Vec<_>, _>>()?;
            let methods = entry
                .methods
                .iter()
                .map(|m| scope.method(m, &entry.name))
                .collect::<Result<Vec<_>, _>>()?;

            let definition = &mut builder[index];
            for (parameter, bounds) in definition.generic_parameters.iter_mut().zip(bounds) {
                parameter.bounds = bounds;
            }
            definition.extends = extends;
            definition.implements = implements;
            definition.methods = methods;
        }

        Ok(builder.build()?)
    }
}

pub fn load_catalog(path: impl AsRef<Path>) -> Result<Arc<TypeCatalog>, ManifestError> {
    Manifest::load(path)?.to_catalog()
}

/// Parses a non-generic type name against a built catalog, e.g. for
/// constructor signatures given on the command line.
pub fn parse_concrete(
    catalog: &Arc<TypeCatalog>,
    name: &str,
) -> Result<ConcreteType, ManifestError> {
    let name = name.trim();
    if let Some(element) = name.strip_suffix("[]") {
        return Ok(ConcreteType::Array(Box::new(parse_concrete(catalog, element)?)));
    }
    Ok(match name {
        "void" => ConcreteType::Void,
        "Object" => ConcreteType::Object,
        "String" => ConcreteType::String,
        _ => match Primitive::from_name(name) {
            Some(p) => ConcreteType::Primitive(p),
            None => ConcreteType::Type(catalog.find_type(name).ok_or_else(|| {
                ManifestError::UnknownType {
                    name: name.to_string(),
                    context: "the command line".to_string(),
                }
            })?),
        },
    })
}

struct Scope<'a> {
    builder: &'a CatalogBuilder,
    owner: TypeIndex,
    method_generics: &'a [GenericEntry],
}

impl Scope<'_> {
    fn member_type(&self, expr: &TypeExpr, context: &str) -> Result<MemberType, ManifestError> {
        match expr {
            TypeExpr::Name(name) => self.named(name.trim(), context),
            TypeExpr::Applied { base, args } => {
                Ok(MemberType::Type(self.applied(base, args, context)?))
            }
        }
    }

    fn all(&self, exprs: &[TypeExpr], context: &str) -> Result<Vec<MemberType>, ManifestError> {
        exprs.iter().map(|e| self.member_type(e, context)).collect()
    }

    fn named(&self, name: &str, context: &str) -> Result<MemberType, ManifestError> {
        if let Some(element) = name.strip_suffix("[]") {
            return Ok(MemberType::array(self.named(element, context)?));
        }
        if let Some(p) = Primitive::from_name(name) {
            return Ok(MemberType::Primitive(p));
        }
        match name {
            "void" => return Ok(MemberType::Void),
            "Object" => return Ok(MemberType::Object),
            "String" => return Ok(MemberType::String),
            _ => {}
        }
        if let Some(i) = self.method_generics.iter().position(|g| g.name() == name) {
            return Ok(MemberType::MethodGeneric(i as u16));
        }
        let owner = &self.builder[self.owner];
        if let Some(i) = owner.generic_parameters.iter().position(|g| g.name == name) {
            return Ok(MemberType::TypeGeneric(i as u16));
        }
        Ok(MemberType::user(self.lookup(name, context)?))
    }

    fn applied(
        &self,
        base: &str,
        args: &[TypeExpr],
        context: &str,
    ) -> Result<TypeSource, ManifestError> {
        let index = self.lookup(base, context)?;
        if args.is_empty() {
            return Ok(TypeSource::User(index));
        }
        if self.builder[index].generic_parameters.is_empty() {
            return Err(ManifestError::NotGeneric(base.to_string()));
        }
        Ok(TypeSource::Generic {
            base: index,
            parameters: self.all(args, context)?,
        })
    }

    fn source(&self, expr: &TypeExpr, context: &str) -> Result<TypeSource, ManifestError> {
        match expr {
            TypeExpr::Name(name) => Ok(TypeSource::User(self.lookup(name.trim(), context)?)),
            TypeExpr::Applied { base, args } => self.applied(base, args, context),
        }
    }

    fn lookup(&self, name: &str, context: &str) -> Result<TypeIndex, ManifestError> {
        self.builder
            .index_of(name)
            .ok_or_else(|| ManifestError::UnknownType {
                name: name.to_string(),
                context: context.to_string(),
            })
    }

    fn method(&self, entry: &MethodEntry, owner: &str) -> Result<MethodDefinition, ManifestError> {
        let context = format!("{}::{}", owner, entry.name);
        let scope = Scope {
            builder: self.builder,
            owner: self.owner,
            method_generics: &entry.generics,
        };

        let mut method = MethodDefinition::new(entry.name.clone());
        for generic in &entry.generics {
            method.generic_parameters.push(GenericParameter {
                name: generic.name().to_string(),
                bounds: scope.all(generic.bounds(), &context)?,
            });
        }
        method.parameters = scope.all(&entry.params, &context)?;
        if let Some(returns) = &entry.returns {
            method.return_type = scope.member_type(returns, &context)?;
        }
        method.is_abstract = entry.is_abstract;
        method.markers = entry.markers.iter().map(Marker::from).collect();
        Ok(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::CatalogError, types::generics::GenericBindings};
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
        [[types]]
        name = "Number"

        [[types]]
        name = "Store"
        kind = "interface"
        generics = [{ name = "T", bounds = ["Number"] }]

        [[types.methods]]
        name = "load"
        params = ["long", "String[]"]
        returns = "T"
        abstract = true
        markers = ["Cached", { kind = "Query", value = "select *" }]

        [[types.methods]]
        name = "convert"
        generics = ["M"]
        params = ["M"]
        returns = { base = "Store", args = ["M"] }
        abstract = true

        [[types]]
        name = "Accounts"
        abstract = true
        implements = [{ base = "Store", args = ["Number"] }]
    "#;

    #[test]
    fn test_parse_and_build() {
        let manifest: Manifest = SAMPLE.parse().unwrap();
        let catalog = manifest.to_catalog().unwrap();
        assert_eq!(catalog.len(), 3);

        let store = catalog.find_type("Store").unwrap();
        assert!(store.is_interface());
        let def = store.definition();
        assert_eq!(
            def.generic_parameters[0].bounds,
            vec![MemberType::user(catalog.index_of("Number").unwrap())]
        );

        let load = &def.methods[0];
        assert_eq!(
            load.parameters,
            vec![
                MemberType::Primitive(Primitive::Long),
                MemberType::array(MemberType::String)
            ]
        );
        assert_eq!(load.return_type, MemberType::TypeGeneric(0));
        assert_eq!(
            load.markers,
            vec![Marker::new("Cached"), Marker::with_value("Query", "select *")]
        );

        let convert = &def.methods[1];
        assert_eq!(convert.parameters, vec![MemberType::MethodGeneric(0)]);
        assert_eq!(
            convert.return_type,
            MemberType::generic(store.index, vec![MemberType::MethodGeneric(0)])
        );

        let accounts = catalog.find_type("Accounts").unwrap();
        assert!(accounts.is_abstract());
        let bindings = GenericBindings::resolve(&accounts);
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_unknown_type_names_context() {
        let manifest: Manifest = r#"
            [[types]]
            name = "A"
            [[types.methods]]
            name = "f"
            returns = "Missing"
        "#
        .parse()
        .unwrap();
        match manifest.to_catalog() {
            Err(ManifestError::UnknownType { name, context }) => {
                assert_eq!(name, "Missing");
                assert_eq!(context, "A::f");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rejected_definitions() {
        let bad_kind: Manifest = "[[types]]\nname = \"A\"\nkind = \"enum\"".parse().unwrap();
        assert!(matches!(
            bad_kind.to_catalog(),
            Err(ManifestError::UnknownKind(kind)) if kind == "enum"
        ));

        let not_generic: Manifest = r#"
            [[types]]
            name = "A"
            [[types]]
            name = "B"
            extends = { base = "A", args = ["String"] }
        "#
        .parse()
        .unwrap();
        assert!(matches!(
            not_generic.to_catalog(),
            Err(ManifestError::NotGeneric(name)) if name == "A"
        ));

        let duplicate: Manifest = "[[types]]\nname = \"A\"\n[[types]]\nname = \"A\""
            .parse()
            .unwrap();
        assert!(matches!(
            duplicate.to_catalog(),
            Err(ManifestError::Catalog(CatalogError::DuplicateType(_)))
        ));

        assert!(matches!(
            "types = 3".parse::<Manifest>(),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_concrete() {
        let catalog = SAMPLE.parse::<Manifest>().unwrap().to_catalog().unwrap();
        assert_eq!(
            parse_concrete(&catalog, "int").unwrap(),
            ConcreteType::Primitive(Primitive::Int)
        );
        assert_eq!(
            parse_concrete(&catalog, "Number[]").unwrap(),
            ConcreteType::Array(Box::new(ConcreteType::Type(
                catalog.find_type("Number").unwrap()
            )))
        );
        assert!(parse_concrete(&catalog, "Nope").is_err());
    }
}
