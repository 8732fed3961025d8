use crate::{
    error::RealizationError,
    strategy::{Forward, Fragment, MethodStrategy},
    types::{
        generics::{ConcreteType, GenericBindings, Primitive},
        members::{Member, MethodDescription},
        TypeDescription,
    },
};
use std::sync::Arc;
use tracing::trace;

/// How far up the delegate's superclass chain to look for an implementation.
/// The delegate itself is always searched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchBound {
    /// Only methods declared directly on the delegate.
    Declared,
    /// Superclasses up to, but excluding, the given type.
    Until(TypeDescription),
    Unbounded,
}

/// Accepts a member when the delegate type has a concrete method with the same
/// name and erased parameter types, and realizes it as a forwarding call.
pub struct DelegateStrategy {
    delegate: TypeDescription,
    bound: SearchBound,
    bindings: Arc<GenericBindings>,
}

impl DelegateStrategy {
    pub fn new(delegate: TypeDescription) -> Self {
        Self::bounded(delegate, SearchBound::Declared)
    }

    pub fn bounded(delegate: TypeDescription, bound: SearchBound) -> Self {
        let bindings = Arc::new(GenericBindings::resolve(&delegate));
        Self {
            delegate,
            bound,
            bindings,
        }
    }

    pub fn delegate(&self) -> &TypeDescription {
        &self.delegate
    }

    pub fn bound(&self) -> &SearchBound {
        &self.bound
    }

    /// The most-derived declaration matching `member` within the search bound,
    /// abstract or not.
    pub fn find_declaration(&self, member: &Member) -> Option<MethodDescription> {
        for ancestor in self.delegate.ancestors() {
            let at_stop = matches!(&self.bound, SearchBound::Until(stop) if *stop == ancestor);
            if at_stop && ancestor != self.delegate {
                break;
            }

            let found = ancestor.methods().find(|m| {
                m.name() == member.name()
                    && m.erased_parameters(&self.bindings) == member.parameter_types()
            });
            if found.is_some() {
                return found;
            }

            if at_stop || self.bound == SearchBound::Declared {
                break;
            }
        }
        None
    }
}

impl MethodStrategy for DelegateStrategy {
    fn accepts(&self, member: &Member) -> bool {
        self.find_declaration(member)
            .is_some_and(|m| !m.is_abstract())
    }

    fn describe(&self) -> String {
        format!("implemented in {}", self.delegate.name())
    }

    fn realize(&self, member: &Member) -> Result<Fragment, RealizationError> {
        let target = self
            .find_declaration(member)
            .filter(|m| !m.is_abstract())
            .ok_or_else(|| RealizationError::MissingDelegateMethod {
                delegate: self.delegate.name().to_string(),
                method: member.signature(),
            })?;

        let delegate_return = target.erased_return(&self.bindings);
        let unwrap = match member.return_type() {
            expected @ ConcreteType::Primitive(_) if delegate_return.is_reference() => {
                Some(unwrap_method_name(expected)?)
            }
            _ => None,
        };

        trace!(member = ?member, target = ?target, ?unwrap, "forwarding to delegate");
        Ok(Forward { target, unwrap }.into())
    }
}

/// Accessor that unboxes a wrapper object into the given primitive.
pub fn unwrap_method_name(t: &ConcreteType) -> Result<&'static str, RealizationError> {
    match t {
        ConcreteType::Primitive(p) => match p {
            Primitive::Boolean => Ok("booleanValue"),
            Primitive::Byte => Ok("byteValue"),
            Primitive::Double => Ok("doubleValue"),
            Primitive::Float => Ok("floatValue"),
            Primitive::Int => Ok("intValue"),
            Primitive::Long => Ok("longValue"),
            Primitive::Short => Ok("shortValue"),
            Primitive::Char => Err(RealizationError::UnsupportedPrimitive(*p)),
        },
        other => Err(RealizationError::NonPrimitive(other.to_string())),
    }
}
