use crate::types::{TypeCatalog, TypeDescription, TypeIndex, TypeSource};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt::{Debug, Display, Formatter},
};

/// Upper limit on parameter-to-parameter hops and nested bound lookups.
const MAX_CHAIN: usize = 64;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "char" => Primitive::Char,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct GenericParameter {
    pub name: String,
    pub bounds: Vec<MemberType>,
}

impl GenericParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: vec![],
        }
    }

    pub fn bounded(mut self, bound: MemberType) -> Self {
        self.bounds.push(bound);
        self
    }
}

/// A type as written in a declaration. Generic indices are relative to the
/// declaring type (`TypeGeneric`) or the declaring method (`MethodGeneric`).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum MemberType {
    Void,
    Primitive(Primitive),
    Object,
    String,
    Type(TypeSource),
    Array(Box<MemberType>),
    TypeGeneric(u16),
    MethodGeneric(u16),
}

impl MemberType {
    pub fn user(index: TypeIndex) -> Self {
        MemberType::Type(TypeSource::User(index))
    }

    pub fn generic(base: TypeIndex, parameters: Vec<MemberType>) -> Self {
        MemberType::Type(TypeSource::Generic { base, parameters })
    }

    pub fn array(element: MemberType) -> Self {
        MemberType::Array(Box::new(element))
    }

    /// Source-like rendering, e.g. `Map<K, List<V>>` or `int[]`.
    pub fn show(&self, owner: &TypeDescription, method_generics: &[GenericParameter]) -> String {
        match self {
            MemberType::Void => "void".to_string(),
            MemberType::Primitive(p) => p.to_string(),
            MemberType::Object => "Object".to_string(),
            MemberType::String => "String".to_string(),
            MemberType::Type(source) => show_source(source, owner, method_generics),
            MemberType::Array(element) => format!("{}[]", element.show(owner, method_generics)),
            MemberType::TypeGeneric(i) => owner
                .definition()
                .generic_parameters
                .get(*i as usize)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| format!("!{}", i)),
            MemberType::MethodGeneric(i) => method_generics
                .get(*i as usize)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| format!("!!{}", i)),
        }
    }
}

pub fn show_source(
    source: &TypeSource,
    owner: &TypeDescription,
    method_generics: &[GenericParameter],
) -> String {
    let base = owner.sibling(source.base());
    match source {
        TypeSource::User(_) => base.name().to_string(),
        TypeSource::Generic { parameters, .. } => {
            let params: Vec<_> = parameters
                .iter()
                .map(|p| p.show(owner, method_generics))
                .collect();
            format!("{}<{}>", base.name(), params.join(", "))
        }
    }
}

/// Erased, fully concrete form of a [`MemberType`].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ConcreteType {
    Void,
    Primitive(Primitive),
    Object,
    String,
    Type(TypeDescription),
    Array(Box<ConcreteType>),
}

impl ConcreteType {
    pub fn is_primitive(&self) -> bool {
        matches!(self, ConcreteType::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            ConcreteType::Object
                | ConcreteType::String
                | ConcreteType::Type(_)
                | ConcreteType::Array(_)
        )
    }
}

impl Display for ConcreteType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConcreteType::Void => write!(f, "void"),
            ConcreteType::Primitive(p) => write!(f, "{}", p),
            ConcreteType::Object => write!(f, "Object"),
            ConcreteType::String => write!(f, "String"),
            ConcreteType::Type(td) => write!(f, "{}", td.name()),
            ConcreteType::Array(element) => write!(f, "{}[]", element),
        }
    }
}

/// Identity of a formal type parameter: the declaring type and its position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TypeParameter {
    pub owner: TypeIndex,
    pub index: u16,
}

/// Concrete classes bound to every type parameter declared in a type's
/// hierarchy.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct GenericBindings {
    bindings: HashMap<TypeParameter, ConcreteType>,
}

impl GenericBindings {
    /// Walks the generic superclass and interface chain of `ty` and binds every
    /// formal parameter found on the way. Parameters without a concrete
    /// argument anywhere in the hierarchy resolve to the erasure of their first
    /// bound, or to `Object` when unbounded.
    pub fn resolve(ty: &TypeDescription) -> Self {
        let catalog: &TypeCatalog = ty.catalog();
        let mut collector = Collector {
            catalog,
            owner: ty,
            arguments: HashMap::new(),
        };
        let mut declared = vec![];
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([ty.index]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let def = &catalog[current];
            declared.extend((0..def.generic_parameters.len() as u16).map(|index| TypeParameter {
                owner: current,
                index,
            }));

            for source in def.supertypes() {
                if let TypeSource::Generic { base, parameters } = source {
                    // raw or malformed applications leave the parameters unbound
                    if parameters.len() == catalog[*base].generic_parameters.len() {
                        for (i, argument) in parameters.iter().enumerate() {
                            collector
                                .arguments
                                .entry(TypeParameter {
                                    owner: *base,
                                    index: i as u16,
                                })
                                .or_insert((current, argument));
                        }
                    }
                }
                queue.push_back(source.base());
            }
        }

        let bindings = declared
            .into_iter()
            .map(|p| (p, collector.parameter(p, 0)))
            .collect();
        Self { bindings }
    }

    pub fn get(&self, parameter: TypeParameter) -> Option<&ConcreteType> {
        self.bindings.get(&parameter)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeParameter, &ConcreteType)> {
        self.bindings.iter()
    }

    /// Erases `t`, written inside `owner` (and, for method generics, inside a
    /// method declaring `method_generics`).
    pub fn substitute(
        &self,
        owner: &TypeDescription,
        t: &MemberType,
        method_generics: &[GenericParameter],
    ) -> ConcreteType {
        self.substitute_at(owner, t, method_generics, 0)
    }

    fn substitute_at(
        &self,
        owner: &TypeDescription,
        t: &MemberType,
        method_generics: &[GenericParameter],
        depth: usize,
    ) -> ConcreteType {
        if depth > MAX_CHAIN {
            return ConcreteType::Object;
        }
        match t {
            MemberType::Void => ConcreteType::Void,
            MemberType::Primitive(p) => ConcreteType::Primitive(*p),
            MemberType::Object => ConcreteType::Object,
            MemberType::String => ConcreteType::String,
            MemberType::Type(source) => ConcreteType::Type(owner.sibling(source.base())),
            MemberType::Array(element) => ConcreteType::Array(Box::new(self.substitute_at(
                owner,
                element,
                method_generics,
                depth + 1,
            ))),
            MemberType::TypeGeneric(i) => self
                .get(TypeParameter {
                    owner: owner.index,
                    index: *i,
                })
                .cloned()
                .unwrap_or(ConcreteType::Object),
            MemberType::MethodGeneric(i) => match method_generics
                .get(*i as usize)
                .and_then(|p| p.bounds.first())
            {
                Some(bound) => self.substitute_at(owner, bound, method_generics, depth + 1),
                None => ConcreteType::Object,
            },
        }
    }

    /// Erased type arguments of a parameterized reference; empty for raw ones.
    pub fn type_arguments(
        &self,
        owner: &TypeDescription,
        source: &TypeSource,
    ) -> Vec<ConcreteType> {
        source
            .parameters()
            .iter()
            .map(|p| self.substitute(owner, p, &[]))
            .collect()
    }
}

impl Debug for GenericBindings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        struct ParameterFormatter(u32, u16);
        impl Debug for ParameterFormatter {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "T{}.{}", self.0, self.1)
            }
        }

        let mut entries: Vec<_> = self.bindings.iter().collect();
        entries.sort_by_key(|(p, _)| (p.owner, p.index));
        f.debug_map()
            .entries(
                entries
                    .into_iter()
                    .map(|(p, t)| (ParameterFormatter(p.owner.as_u32(), p.index), t)),
            )
            .finish()
    }
}

struct Collector<'a> {
    catalog: &'a TypeCatalog,
    owner: &'a TypeDescription,
    /// Actual argument for each parameter, with the type it was written in.
    arguments: HashMap<TypeParameter, (TypeIndex, &'a MemberType)>,
}

impl Collector<'_> {
    fn parameter(&self, start: TypeParameter, depth: usize) -> ConcreteType {
        let mut current = start;
        for _ in 0..MAX_CHAIN {
            match self.arguments.get(&current) {
                Some((context, MemberType::TypeGeneric(i))) => {
                    current = TypeParameter {
                        owner: *context,
                        index: *i,
                    };
                }
                Some((context, argument)) => return self.concretize(*context, argument, depth),
                None => break,
            }
        }

        // the end of the chain knows the tightest bound; fall back to the start
        self.first_bound(current, depth)
            .or_else(|| self.first_bound(start, depth))
            .unwrap_or(ConcreteType::Object)
    }

    fn first_bound(&self, parameter: TypeParameter, depth: usize) -> Option<ConcreteType> {
        let bound = self.catalog[parameter.owner]
            .generic_parameters
            .get(parameter.index as usize)?
            .bounds
            .first()?;
        Some(self.concretize(parameter.owner, bound, depth + 1))
    }

    fn concretize(&self, context: TypeIndex, t: &MemberType, depth: usize) -> ConcreteType {
        if depth > MAX_CHAIN {
            return ConcreteType::Object;
        }
        match t {
            MemberType::Void => ConcreteType::Void,
            MemberType::Primitive(p) => ConcreteType::Primitive(*p),
            MemberType::Object => ConcreteType::Object,
            MemberType::String => ConcreteType::String,
            MemberType::Type(source) => ConcreteType::Type(self.owner.sibling(source.base())),
            MemberType::Array(element) => {
                ConcreteType::Array(Box::new(self.concretize(context, element, depth + 1)))
            }
            MemberType::TypeGeneric(i) => self.parameter(
                TypeParameter {
                    owner: context,
                    index: *i,
                },
                depth + 1,
            ),
            // method generics never appear in type-level declarations
            MemberType::MethodGeneric(_) => ConcreteType::Object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogBuilder;
    use std::sync::Arc;

    fn param(owner: &TypeDescription, index: u16) -> TypeParameter {
        TypeParameter {
            owner: owner.index,
            index,
        }
    }

    #[test]
    fn test_unbounded_parameter_resolves_to_object() {
        let mut b = CatalogBuilder::new();
        let holder = b.declare_interface("Holder").unwrap();
        b[holder].generic_parameters.push(GenericParameter::new("T"));
        let catalog = b.build().unwrap();

        let holder = catalog.find_type("Holder").unwrap();
        let bindings = GenericBindings::resolve(&holder);
        assert_eq!(bindings.get(param(&holder, 0)), Some(&ConcreteType::Object));
    }

    #[test]
    fn test_bounded_parameter_resolves_to_bound() {
        let mut b = CatalogBuilder::new();
        let number = b.declare_class("Number").unwrap();
        let holder = b.declare_interface("Holder").unwrap();
        b[holder]
            .generic_parameters
            .push(GenericParameter::new("T").bounded(MemberType::user(number)));
        let catalog = b.build().unwrap();

        let holder = catalog.find_type("Holder").unwrap();
        let number = catalog.find_type("Number").unwrap();
        let bindings = GenericBindings::resolve(&holder);
        assert_eq!(
            bindings.get(param(&holder, 0)),
            Some(&ConcreteType::Type(number))
        );
    }

    fn chain() -> Arc<TypeCatalog> {
        // interface Source<T>
        // abstract class Relay<R> implements Source<R>
        // abstract class Strings extends Relay<List<Integer>>
        let mut b = CatalogBuilder::new();
        let list = b.declare_interface("List").unwrap();
        let integer = b.declare_class("Integer").unwrap();
        let source = b.declare_interface("Source").unwrap();
        let relay = b.declare_class("Relay").unwrap();
        let strings = b.declare_class("Strings").unwrap();
        b[list].generic_parameters.push(GenericParameter::new("E"));
        b[source].generic_parameters.push(GenericParameter::new("T"));
        b[relay].generic_parameters.push(GenericParameter::new("R"));
        b[relay].is_abstract = true;
        b[relay].implements.push(TypeSource::Generic {
            base: source,
            parameters: vec![MemberType::TypeGeneric(0)],
        });
        b[strings].is_abstract = true;
        b[strings].extends = Some(TypeSource::Generic {
            base: relay,
            parameters: vec![MemberType::generic(
                list,
                vec![MemberType::user(integer)],
            )],
        });
        b.build().unwrap()
    }

    #[test]
    fn test_chain_follows_parameters_to_concrete_erasure() {
        let catalog = chain();
        let strings = catalog.find_type("Strings").unwrap();
        let source = catalog.find_type("Source").unwrap();
        let relay = catalog.find_type("Relay").unwrap();
        let list = catalog.find_type("List").unwrap();

        let bindings = GenericBindings::resolve(&strings);
        assert_eq!(
            bindings.get(param(&source, 0)),
            Some(&ConcreteType::Type(list.clone()))
        );
        assert_eq!(
            bindings.get(param(&relay, 0)),
            Some(&ConcreteType::Type(list))
        );
        // List<E> itself is not part of the hierarchy
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn test_unapplied_chain_uses_declared_bound() {
        // abstract class Sub<X extends Number> extends Base<X>; class Base<T>
        let mut b = CatalogBuilder::new();
        let number = b.declare_class("Number").unwrap();
        let base = b.declare_class("Base").unwrap();
        let sub = b.declare_class("Sub").unwrap();
        b[base].generic_parameters.push(GenericParameter::new("T"));
        b[sub]
            .generic_parameters
            .push(GenericParameter::new("X").bounded(MemberType::user(number)));
        b[sub].extends = Some(TypeSource::Generic {
            base,
            parameters: vec![MemberType::TypeGeneric(0)],
        });
        let catalog = b.build().unwrap();

        let sub = catalog.find_type("Sub").unwrap();
        let base = catalog.find_type("Base").unwrap();
        let number = catalog.find_type("Number").unwrap();
        let bindings = GenericBindings::resolve(&sub);
        assert_eq!(
            bindings.get(param(&base, 0)),
            Some(&ConcreteType::Type(number))
        );
    }

    #[test]
    fn test_raw_supertype_leaves_parameter_at_bound() {
        let mut b = CatalogBuilder::new();
        let base = b.declare_class("Base").unwrap();
        let sub = b.declare_class("Sub").unwrap();
        b[base].generic_parameters.push(GenericParameter::new("T"));
        b[sub].extends = Some(base.into());
        let catalog = b.build().unwrap();

        let sub = catalog.find_type("Sub").unwrap();
        let base = catalog.find_type("Base").unwrap();
        let bindings = GenericBindings::resolve(&sub);
        assert_eq!(bindings.get(param(&base, 0)), Some(&ConcreteType::Object));
    }

    #[test]
    fn test_substitute_method_generic_uses_bound() {
        let catalog = chain();
        let strings = catalog.find_type("Strings").unwrap();
        let list = catalog.find_type("List").unwrap();
        let bindings = GenericBindings::resolve(&strings);

        let generics = [GenericParameter::new("M").bounded(MemberType::user(list.index))];
        assert_eq!(
            bindings.substitute(&strings, &MemberType::MethodGeneric(0), &generics),
            ConcreteType::Type(list)
        );
        assert_eq!(
            bindings.substitute(
                &strings,
                &MemberType::array(MemberType::MethodGeneric(0)),
                &[GenericParameter::new("U")]
            ),
            ConcreteType::Array(Box::new(ConcreteType::Object))
        );
    }

    #[test]
    fn test_type_arguments_of_parameterized_source() {
        let catalog = chain();
        let strings = catalog.find_type("Strings").unwrap();
        let list = catalog.find_type("List").unwrap();
        let bindings = GenericBindings::resolve(&strings);
        let extends = strings.definition().extends.clone().unwrap();
        assert_eq!(
            bindings.type_arguments(&strings, &extends),
            vec![ConcreteType::Type(list)]
        );
    }

    #[test]
    fn test_show_renders_nested_generics() {
        let catalog = chain();
        let strings = catalog.find_type("Strings").unwrap();
        let extends = strings.definition().extends.clone().unwrap();
        assert_eq!(
            show_source(&extends, &strings, &[]),
            "Relay<List<Integer>>"
        );
        let relay = catalog.find_type("Relay").unwrap();
        assert_eq!(
            MemberType::array(MemberType::TypeGeneric(0)).show(&relay, &[]),
            "R[]"
        );
    }
}
