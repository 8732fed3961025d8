use crate::types::{
    generics::{ConcreteType, GenericBindings, GenericParameter, MemberType},
    TypeDescription,
};
use std::{
    collections::hash_map::DefaultHasher,
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Annotation stand-in: a named marker with an optional payload.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Marker {
    pub kind: String,
    pub value: Option<String>,
}

impl Marker {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: None,
        }
    }

    pub fn with_value(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: Some(value.into()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MethodDefinition {
    pub name: String,
    pub parameters: Vec<MemberType>,
    pub return_type: MemberType,
    pub is_abstract: bool,
    pub generic_parameters: Vec<GenericParameter>,
    pub markers: Vec<Marker>,
}

impl MethodDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: vec![],
            return_type: MemberType::Void,
            is_abstract: false,
            generic_parameters: vec![],
            markers: vec![],
        }
    }

    pub fn param(mut self, t: MemberType) -> Self {
        self.parameters.push(t);
        self
    }

    pub fn returns(mut self, t: MemberType) -> Self {
        self.return_type = t;
        self
    }

    pub fn abstract_member(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn generic(mut self, parameter: GenericParameter) -> Self {
        self.generic_parameters.push(parameter);
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Zero parameters and a non-void return.
    pub fn is_getter(&self) -> bool {
        self.parameters.is_empty() && self.return_type != MemberType::Void
    }
}

#[derive(Clone)]
pub struct MethodDescription {
    pub parent: TypeDescription,
    pub index: usize,
}

impl MethodDescription {
    pub fn method(&self) -> &MethodDefinition {
        &self.parent.definition().methods[self.index]
    }

    pub fn name(&self) -> &str {
        &self.method().name
    }

    pub fn is_abstract(&self) -> bool {
        self.method().is_abstract
    }

    pub fn erased_parameters(&self, bindings: &GenericBindings) -> Vec<ConcreteType> {
        let method = self.method();
        method
            .parameters
            .iter()
            .map(|p| bindings.substitute(&self.parent, p, &method.generic_parameters))
            .collect()
    }

    pub fn erased_return(&self, bindings: &GenericBindings) -> ConcreteType {
        let method = self.method();
        bindings.substitute(&self.parent, &method.return_type, &method.generic_parameters)
    }
}

impl Debug for MethodDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let method = self.method();
        let params: Vec<_> = method
            .parameters
            .iter()
            .map(|p| p.show(&self.parent, &method.generic_parameters))
            .collect();
        write!(
            f,
            "{} {}::{}({})",
            method
                .return_type
                .show(&self.parent, &method.generic_parameters),
            self.parent.name(),
            method.name,
            params.join(", ")
        )
    }
}

impl PartialEq for MethodDescription {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.parent == other.parent
    }
}

impl Eq for MethodDescription {}

impl Hash for MethodDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.index.hash(state);
    }
}

/// An abstract method as seen from a synthesis target: the declaration plus the
/// target's generic bindings, with the signature already erased.
#[derive(Clone)]
pub struct Member {
    pub method: MethodDescription,
    bindings: Arc<GenericBindings>,
    parameters: Vec<ConcreteType>,
    return_type: ConcreteType,
}

impl Member {
    pub fn new(method: MethodDescription, bindings: Arc<GenericBindings>) -> Self {
        let parameters = method.erased_parameters(&bindings);
        let return_type = method.erased_return(&bindings);
        Self {
            method,
            bindings,
            parameters,
            return_type,
        }
    }

    pub fn name(&self) -> &str {
        self.method.name()
    }

    pub fn declaring_type(&self) -> &TypeDescription {
        &self.method.parent
    }

    pub fn parameter_types(&self) -> &[ConcreteType] {
        &self.parameters
    }

    pub fn return_type(&self) -> &ConcreteType {
        &self.return_type
    }

    pub fn bindings(&self) -> &Arc<GenericBindings> {
        &self.bindings
    }

    pub fn markers(&self) -> &[Marker] {
        &self.method.method().markers
    }

    pub fn marker(&self, kind: &str) -> Option<&Marker> {
        self.markers().iter().find(|m| m.kind == kind)
    }

    pub fn has_marker(&self, kind: &str) -> bool {
        self.marker(kind).is_some()
    }

    /// Erased signature, e.g. `find(long, String)`.
    pub fn signature(&self) -> String {
        let params: Vec<_> = self.parameters.iter().map(|p| p.to_string()).collect();
        format!("{}({})", self.name(), params.join(", "))
    }

    /// Identifier usable as a generated slot name: `<name>_<hex hash>`.
    pub fn identifier(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.signature().hash(&mut hasher);
        self.return_type.to_string().hash(&mut hasher);
        format!("{}_{:x}", self.name(), hasher.finish() as u32)
    }
}

impl Debug for Member {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}::{}",
            self.return_type,
            self.declaring_type().name(),
            self.signature()
        )
    }
}

/// Field name for a getter: strips a leading `get` or `is` and lowers the next
/// letter. Names without either prefix come back unchanged.
pub fn make_field_name(method_name: &str) -> String {
    for prefix in ["get", "is"] {
        if let Some(rest) = method_name.strip_prefix(prefix) {
            let mut chars = rest.chars();
            if let Some(first) = chars.next() {
                return first.to_lowercase().chain(chars).collect();
            }
        }
    }
    method_name.to_string()
}

/// Looks up the getter for `field` on `ty` or any of its supertypes, trying `field`,
/// `getField` and `isField` in that order.
pub fn find_getter(ty: &TypeDescription, field: &str) -> Option<MethodDescription> {
    let capitalized = capitalize(field);
    let candidates = [
        field.to_string(),
        format!("get{}", capitalized),
        format!("is{}", capitalized),
    ];
    let hierarchy = ty.hierarchy();
    candidates.iter().find_map(|name| {
        hierarchy.iter().find_map(|supertype| {
            supertype
                .methods()
                .find(|m| m.name() == name.as_str() && m.method().is_getter())
        })
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{generics::Primitive, CatalogBuilder};

    #[test]
    fn test_make_field_name() {
        assert_eq!(make_field_name("getName"), "name");
        assert_eq!(make_field_name("isEnabled"), "enabled");
        assert_eq!(make_field_name("get"), "get");
        assert_eq!(make_field_name("is"), "is");
        assert_eq!(make_field_name("value"), "value");
    }

    #[test]
    fn test_find_getter_tries_prefixes_and_superclasses() {
        let mut b = CatalogBuilder::new();
        let base = b.declare_class("Base").unwrap();
        let bean = b.declare_class("Bean").unwrap();
        b[base].methods.push(
            MethodDefinition::new("isActive").returns(MemberType::Primitive(Primitive::Boolean)),
        );
        b[bean].extends = Some(base.into());
        b[bean]
            .methods
            .push(MethodDefinition::new("getName").returns(MemberType::String));
        b[bean].methods.push(
            MethodDefinition::new("getWidth")
                .param(MemberType::Primitive(Primitive::Int))
                .returns(MemberType::Primitive(Primitive::Int)),
        );
        let catalog = b.build().unwrap();
        let bean = catalog.find_type("Bean").unwrap();

        assert_eq!(find_getter(&bean, "name").unwrap().name(), "getName");
        assert_eq!(find_getter(&bean, "active").unwrap().name(), "isActive");
        // takes a parameter, so it is not a getter
        assert!(find_getter(&bean, "width").is_none());
    }

    #[test]
    fn test_find_getter_searches_superinterfaces() {
        let mut b = CatalogBuilder::new();
        let named = b.declare_interface("Named").unwrap();
        let labeled = b.declare_interface("Labeled").unwrap();
        let base = b.declare_class("Base").unwrap();
        let bean = b.declare_class("Bean").unwrap();
        b[named]
            .methods
            .push(MethodDefinition::new("getName").returns(MemberType::String));
        b[labeled].implements.push(named.into());
        b[base].implements.push(labeled.into());
        b[bean].extends = Some(base.into());
        let catalog = b.build().unwrap();
        let bean = catalog.find_type("Bean").unwrap();

        let getter = find_getter(&bean, "name").unwrap();
        assert_eq!(getter.name(), "getName");
        assert_eq!(getter.parent.name(), "Named");
        assert!(find_getter(&bean, "label").is_none());
    }

    #[test]
    fn test_member_erases_against_bindings() {
        let mut b = CatalogBuilder::new();
        let repo = b.declare_interface("Repo").unwrap();
        let users = b.declare_interface("Users").unwrap();
        b[repo]
            .generic_parameters
            .push(GenericParameter::new("T"));
        b[repo].methods.push(
            MethodDefinition::new("save")
                .param(MemberType::TypeGeneric(0))
                .returns(MemberType::Primitive(Primitive::Boolean))
                .abstract_member(),
        );
        b[users].implements.push(crate::types::TypeSource::Generic {
            base: repo,
            parameters: vec![MemberType::String],
        });
        let catalog = b.build().unwrap();
        let users = catalog.find_type("Users").unwrap();
        let repo = catalog.find_type("Repo").unwrap();

        let bindings = Arc::new(GenericBindings::resolve(&users));
        let member = Member::new(repo.methods().next().unwrap(), bindings);
        assert_eq!(member.signature(), "save(String)");
        assert_eq!(
            member.return_type(),
            &ConcreteType::Primitive(Primitive::Boolean)
        );
        assert!(member.identifier().starts_with("save_"));
        assert_eq!(format!("{:?}", member.method), "boolean Repo::save(T)");
    }
}
