//! # Builder
//!
//! Turns an abstract target type into a [`SynthesizedImplementation`] by
//! resolving exactly one [`MethodStrategy`] per abstract member.
//!
//! Resolution is strict: a member nobody accepts fails with
//! [`GenerationError::Unresolved`] listing every registered requirement, and a
//! member accepted by several strategies fails with
//! [`GenerationError::Ambiguous`]. Registration order never breaks a tie.
use crate::{
    error::GenerationError,
    strategy::{Emit, Fragment, MethodStrategy},
    types::{
        generics::{ConcreteType, GenericBindings},
        members::Member,
        TypeDescription, TypeIndex, TypeSource,
    },
    value::{Instance, Value},
};
use std::{
    collections::{HashSet, VecDeque},
    fmt::{Debug, Formatter, Write},
    sync::Arc,
};
use tracing::{debug, trace};

pub trait Builder: Send + Sync {
    fn build(&self, target: &TypeDescription) -> Result<SynthesizedImplementation, GenerationError>;
}

impl<B: Builder + ?Sized> Builder for Arc<B> {
    fn build(
        &self,
        target: &TypeDescription,
    ) -> Result<SynthesizedImplementation, GenerationError> {
        (**self).build(target)
    }
}

impl<B: Builder + ?Sized> Builder for &B {
    fn build(
        &self,
        target: &TypeDescription,
    ) -> Result<SynthesizedImplementation, GenerationError> {
        (**self).build(target)
    }
}

/// The standard [`Builder`]: an ordered strategy set plus the constructor
/// signature every synthesized implementation exposes.
#[derive(Default)]
pub struct StrategyBuilder {
    strategies: Vec<Box<dyn MethodStrategy>>,
    constructor: Vec<ConcreteType>,
}

impl StrategyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: impl MethodStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn constructor(mut self, parameters: Vec<ConcreteType>) -> Self {
        self.constructor = parameters;
        self
    }

    pub fn strategies(&self) -> impl Iterator<Item = &dyn MethodStrategy> {
        self.strategies.iter().map(|s| s.as_ref())
    }

    pub fn constructor_signature(&self) -> &[ConcreteType] {
        &self.constructor
    }

    fn resolve(
        &self,
        target: &TypeDescription,
        member: Member,
    ) -> Result<ResolvedMember, GenerationError> {
        let accepting: Vec<usize> = self
            .strategies
            .iter()
            .enumerate()
            .filter(|(_, s)| s.accepts(&member))
            .map(|(i, _)| i)
            .collect();

        let strategy = match accepting[..] {
            [] => {
                return Err(GenerationError::Unresolved {
                    target: target.name().to_string(),
                    member: member.signature(),
                    requirements: self.strategies.iter().map(|s| s.describe()).collect(),
                })
            }
            [single] => single,
            _ => {
                return Err(GenerationError::Ambiguous {
                    target: target.name().to_string(),
                    member: member.signature(),
                    strategies: accepting
                        .iter()
                        .map(|&i| self.strategies[i].describe())
                        .collect(),
                })
            }
        };

        let chosen = &self.strategies[strategy];
        let fragment = chosen
            .realize(&member)
            .map_err(|source| GenerationError::Realization {
                target: target.name().to_string(),
                member: member.signature(),
                source,
            })?;
        trace!("{:?} resolved by strategy #{}", member, strategy);

        Ok(ResolvedMember {
            identifier: member.identifier(),
            strategy_description: chosen.describe(),
            member,
            strategy,
            fragment,
        })
    }
}

impl Builder for StrategyBuilder {
    fn build(
        &self,
        target: &TypeDescription,
    ) -> Result<SynthesizedImplementation, GenerationError> {
        if !target.is_interface() && !target.is_abstract() {
            return Err(GenerationError::InvalidTarget(target.name().to_string()));
        }
        debug!("synthesizing implementation of {}", target);

        let members = abstract_members(target)
            .into_iter()
            .map(|member| self.resolve(target, member))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SynthesizedImplementation {
            name: format!("{}$Impl", target.name()),
            target: target.clone(),
            constructor: self.constructor.clone(),
            members,
        })
    }
}

/// Every member of `target` still abstract after inheritance, in declaration
/// order. The class chain is searched before interfaces, and the first
/// declaration of each erased signature hides the later ones.
pub fn abstract_members(target: &TypeDescription) -> Vec<Member> {
    let bindings = Arc::new(GenericBindings::resolve(target));

    let chain: Vec<TypeDescription> = target.ancestors().collect();
    let mut seen: HashSet<TypeIndex> = chain.iter().map(|t| t.index).collect();
    let mut queue: VecDeque<TypeIndex> = chain
        .iter()
        .flat_map(|t| t.definition().implements.iter().map(TypeSource::base))
        .collect();
    let mut order = chain;
    while let Some(index) = queue.pop_front() {
        if !seen.insert(index) {
            continue;
        }
        let interface = target.sibling(index);
        queue.extend(interface.definition().supertypes().map(TypeSource::base));
        order.push(interface);
    }

    let mut signatures = HashSet::new();
    let mut members = vec![];
    for ty in &order {
        for method in ty.methods() {
            let member = Member::new(method, bindings.clone());
            if signatures.insert(member.signature()) && member.method.is_abstract() {
                members.push(member);
            }
        }
    }
    members
}

#[derive(Clone, Debug)]
pub struct ResolvedMember {
    pub member: Member,
    /// Position of the realizing strategy in the builder's registration order.
    pub strategy: usize,
    pub strategy_description: String,
    pub fragment: Fragment,
    pub identifier: String,
}

/// A concrete implementation of a target type. Immutable once built.
pub struct SynthesizedImplementation {
    target: TypeDescription,
    name: String,
    constructor: Vec<ConcreteType>,
    members: Vec<ResolvedMember>,
}

impl SynthesizedImplementation {
    pub fn target(&self) -> &TypeDescription {
        &self.target
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constructor(&self) -> &[ConcreteType] {
        &self.constructor
    }

    pub fn members(&self) -> &[ResolvedMember] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&ResolvedMember> {
        self.members.iter().find(|m| m.member.name() == name)
    }

    /// Member signature paired with the description of the strategy wired to it.
    pub fn wiring(&self) -> Vec<(String, String)> {
        self.members
            .iter()
            .map(|m| (m.member.signature(), m.strategy_description.clone()))
            .collect()
    }

    pub fn render(&self) -> String {
        let relation = if self.target.is_interface() {
            "implements"
        } else {
            "extends"
        };
        let mut out = format!("class {} {} {} {{\n", self.name, relation, self.target);

        let params: Vec<_> = self
            .constructor
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{} arg{}", t, i))
            .collect();
        // writing into a String never fails
        let _ = writeln!(out, "    {}({});", self.name, params.join(", "));

        for resolved in &self.members {
            let member = &resolved.member;
            let params: Vec<_> = member
                .parameter_types()
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{} arg{}", t, i))
                .collect();
            let _ = writeln!(
                out,
                "    {} {}({}) -> {}; // {}, {}",
                member.return_type(),
                member.name(),
                params.join(", "),
                resolved.fragment.emit(member),
                resolved.identifier,
                resolved.strategy_description,
            );
        }
        out.push('}');
        out
    }

    /// Constructs an instance, checking `arguments` against the constructor
    /// signature.
    pub fn instantiate(
        self: &Arc<Self>,
        arguments: Vec<Value>,
    ) -> Result<Arc<Instance>, GenerationError> {
        if arguments.len() != self.constructor.len() {
            return Err(GenerationError::Instantiation {
                implementation: self.name.clone(),
                reason: format!(
                    "expected {} constructor arguments, got {}",
                    self.constructor.len(),
                    arguments.len()
                ),
            });
        }
        for (i, (argument, expected)) in arguments.iter().zip(&self.constructor).enumerate() {
            if !argument.conforms_to(expected) {
                return Err(GenerationError::Instantiation {
                    implementation: self.name.clone(),
                    reason: format!(
                        "argument {} ({}) does not conform to {}",
                        i, argument, expected
                    ),
                });
            }
        }
        Ok(Arc::new(Instance::new(self.clone(), arguments)))
    }
}

impl Debug for SynthesizedImplementation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesizedImplementation")
            .field("name", &self.name)
            .field("constructor", &self.constructor)
            .field("members", &self.wiring())
            .finish()
    }
}
