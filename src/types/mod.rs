//! # Type metadata
//!
//! In-memory stand-in for the host's reflection provider. A [`TypeCatalog`] owns
//! every [`TypeDefinition`]; everything else refers to definitions through cheap
//! [`TypeDescription`] handles.
//!
//! ## Core Types
//!
//! - **[`TypeDescription`]**: a type inside a shared catalog.
//! - **[`MethodDescription`](members::MethodDescription)**: a method declared on a type.
//! - **[`Member`](members::Member)**: a method seen from a synthesis target, with its
//!   signature erased against the target's generic bindings.
//! - **[`GenericBindings`](generics::GenericBindings)**: type-parameter resolution.
use crate::{
    error::CatalogError,
    types::{
        generics::{GenericParameter, MemberType},
        members::{MethodDefinition, MethodDescription},
    },
};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    ops::{Index, IndexMut},
    sync::Arc,
};

pub mod generics;
pub mod members;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TypeIndex(u32);

impl TypeIndex {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    fn slot(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TypeKind {
    Class,
    Interface,
}

/// A raw or parameterized reference to a catalog type.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeSource {
    User(TypeIndex),
    Generic {
        base: TypeIndex,
        parameters: Vec<MemberType>,
    },
}

impl TypeSource {
    pub fn base(&self) -> TypeIndex {
        match self {
            TypeSource::User(i) | TypeSource::Generic { base: i, .. } => *i,
        }
    }

    pub fn parameters(&self) -> &[MemberType] {
        match self {
            TypeSource::User(_) => &[],
            TypeSource::Generic { parameters, .. } => parameters,
        }
    }
}

impl From<TypeIndex> for TypeSource {
    fn from(index: TypeIndex) -> Self {
        TypeSource::User(index)
    }
}

#[derive(Clone, Debug)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    pub is_abstract: bool,
    pub generic_parameters: Vec<GenericParameter>,
    pub extends: Option<TypeSource>,
    pub implements: Vec<TypeSource>,
    pub methods: Vec<MethodDefinition>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            // interfaces are always abstract
            is_abstract: kind == TypeKind::Interface,
            generic_parameters: vec![],
            extends: None,
            implements: vec![],
            methods: vec![],
        }
    }

    pub fn supertypes(&self) -> impl Iterator<Item = &TypeSource> {
        self.extends.iter().chain(self.implements.iter())
    }
}

/// Immutable set of type definitions. Always handled through an `Arc` so that
/// [`TypeDescription`]s can outlive the code that built the catalog.
pub struct TypeCatalog {
    types: Vec<TypeDefinition>,
    by_name: HashMap<String, TypeIndex>,
}

impl TypeCatalog {
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<TypeIndex> {
        self.by_name.get(name).copied()
    }

    pub fn find_type(self: &Arc<Self>, name: &str) -> Option<TypeDescription> {
        self.index_of(name).map(|index| TypeDescription::new(self.clone(), index))
    }

    pub fn locate(self: &Arc<Self>, index: TypeIndex) -> Result<TypeDescription, CatalogError> {
        if index.slot() < self.types.len() {
            Ok(TypeDescription::new(self.clone(), index))
        } else {
            Err(CatalogError::InvalidIndex(index.0))
        }
    }

    pub fn types(self: &Arc<Self>) -> impl Iterator<Item = TypeDescription> + '_ {
        (0..self.types.len() as u32).map(|i| TypeDescription::new(self.clone(), TypeIndex(i)))
    }
}

impl Index<TypeIndex> for TypeCatalog {
    type Output = TypeDefinition;

    fn index(&self, index: TypeIndex) -> &Self::Output {
        &self.types[index.slot()]
    }
}

impl Debug for TypeCatalog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.types.iter().map(|t| &t.name))
            .finish()
    }
}

/// Two-phase catalog construction: declare every name first so definitions can
/// refer to each other (and to themselves), then fill the definitions in.
#[derive(Default)]
pub struct CatalogBuilder {
    types: Vec<TypeDefinition>,
    by_name: HashMap<String, TypeIndex>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(
        &mut self,
        name: impl Into<String>,
        kind: TypeKind,
    ) -> Result<TypeIndex, CatalogError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(CatalogError::DuplicateType(name));
        }
        let index = TypeIndex(self.types.len() as u32);
        self.by_name.insert(name.clone(), index);
        self.types.push(TypeDefinition::new(name, kind));
        Ok(index)
    }

    pub fn declare_class(&mut self, name: impl Into<String>) -> Result<TypeIndex, CatalogError> {
        self.declare(name, TypeKind::Class)
    }

    pub fn declare_interface(
        &mut self,
        name: impl Into<String>,
    ) -> Result<TypeIndex, CatalogError> {
        self.declare(name, TypeKind::Interface)
    }

    pub fn index_of(&self, name: &str) -> Option<TypeIndex> {
        self.by_name.get(name).copied()
    }

    pub fn build(self) -> Result<Arc<TypeCatalog>, CatalogError> {
        for def in &self.types {
            for source in def.supertypes() {
                self.check_source(source, def, &[])?;
            }
            for generic in &def.generic_parameters {
                for bound in &generic.bounds {
                    self.check_member_type(bound, def, &[])?;
                }
            }
            for method in &def.methods {
                let method_generics = &method.generic_parameters;
                for t in method.parameters.iter().chain(std::iter::once(&method.return_type)) {
                    self.check_member_type(t, def, method_generics)?;
                }
                for generic in method_generics {
                    for bound in &generic.bounds {
                        self.check_member_type(bound, def, method_generics)?;
                    }
                }
            }
        }

        Ok(Arc::new(TypeCatalog {
            types: self.types,
            by_name: self.by_name,
        }))
    }

    fn check_source(
        &self,
        source: &TypeSource,
        owner: &TypeDefinition,
        method_generics: &[GenericParameter],
    ) -> Result<(), CatalogError> {
        if source.base().slot() >= self.types.len() {
            return Err(CatalogError::InvalidIndex(source.base().0));
        }
        for p in source.parameters() {
            self.check_member_type(p, owner, method_generics)?;
        }
        Ok(())
    }

    fn check_member_type(
        &self,
        t: &MemberType,
        owner: &TypeDefinition,
        method_generics: &[GenericParameter],
    ) -> Result<(), CatalogError> {
        match t {
            MemberType::Type(source) => self.check_source(source, owner, method_generics),
            MemberType::Array(element) => self.check_member_type(element, owner, method_generics),
            MemberType::TypeGeneric(i) if *i as usize >= owner.generic_parameters.len() => {
                Err(CatalogError::GenericIndexOutOfBounds {
                    owner: owner.name.clone(),
                    index: *i as usize,
                    length: owner.generic_parameters.len(),
                })
            }
            MemberType::MethodGeneric(i) if *i as usize >= method_generics.len() => {
                Err(CatalogError::GenericIndexOutOfBounds {
                    owner: owner.name.clone(),
                    index: *i as usize,
                    length: method_generics.len(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl Index<TypeIndex> for CatalogBuilder {
    type Output = TypeDefinition;

    fn index(&self, index: TypeIndex) -> &Self::Output {
        &self.types[index.slot()]
    }
}

impl IndexMut<TypeIndex> for CatalogBuilder {
    fn index_mut(&mut self, index: TypeIndex) -> &mut Self::Output {
        &mut self.types[index.slot()]
    }
}

#[derive(Clone)]
pub struct TypeDescription {
    catalog: Arc<TypeCatalog>,
    pub index: TypeIndex,
}

impl TypeDescription {
    fn new(catalog: Arc<TypeCatalog>, index: TypeIndex) -> Self {
        Self { catalog, index }
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    pub fn definition(&self) -> &TypeDefinition {
        &self.catalog[self.index]
    }

    pub fn name(&self) -> &str {
        &self.definition().name
    }

    pub fn is_interface(&self) -> bool {
        self.definition().kind == TypeKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.definition().is_abstract
    }

    /// Another type of the same catalog. Indices stored in definitions are
    /// validated when the catalog is built.
    pub fn sibling(&self, index: TypeIndex) -> TypeDescription {
        TypeDescription::new(self.catalog.clone(), index)
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodDescription> + '_ {
        (0..self.definition().methods.len()).map(|index| MethodDescription {
            parent: self.clone(),
            index,
        })
    }

    pub fn superclass(&self) -> Option<TypeDescription> {
        self.definition()
            .extends
            .as_ref()
            .map(|s| self.sibling(s.base()))
    }

    /// The `extends` chain starting with this type itself.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            child: Some(self.clone()),
            seen: HashSet::new(),
        }
    }

    /// Every supertype (classes and interfaces) reachable from this type,
    /// breadth-first, this type included. Each type appears once.
    pub fn hierarchy(&self) -> Vec<TypeDescription> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([self.index]);
        let mut result = vec![];
        while let Some(index) = queue.pop_front() {
            if !seen.insert(index) {
                continue;
            }
            let current = self.sibling(index);
            queue.extend(current.definition().supertypes().map(TypeSource::base));
            result.push(current);
        }
        result
    }

    pub fn is_a(&self, ancestor: &TypeDescription) -> bool {
        Arc::ptr_eq(&self.catalog, &ancestor.catalog)
            && self.hierarchy().iter().any(|t| t.index == ancestor.index)
    }
}

impl Debug for TypeDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Display for TypeDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl PartialEq for TypeDescription {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && Arc::ptr_eq(&self.catalog, &other.catalog)
    }
}

impl Eq for TypeDescription {}

impl Hash for TypeDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.catalog) as usize).hash(state);
        self.index.hash(state);
    }
}

pub struct Ancestors {
    child: Option<TypeDescription>,
    seen: HashSet<TypeIndex>,
}

impl Iterator for Ancestors {
    type Item = TypeDescription;

    fn next(&mut self) -> Option<Self::Item> {
        let child = self.child.take()?;
        // a malformed catalog could describe an inheritance cycle
        if !self.seen.insert(child.index) {
            return None;
        }
        self.child = child.superclass();
        Some(child)
    }
}
