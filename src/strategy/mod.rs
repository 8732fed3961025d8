//! Method strategies: pluggable rules that claim abstract members and produce
//! the fragment that realizes them.
//!
//! A strategy answers three questions about a [`Member`]:
//!
//! - [`accepts`](MethodStrategy::accepts): can it realize this member? Must be a pure
//!   predicate over the member's static metadata.
//! - [`describe`](MethodStrategy::describe): what does a member need to look like to be
//!   accepted? Used verbatim in resolution diagnostics.
//! - [`realize`](MethodStrategy::realize): the fragment for an accepted member. May
//!   still fail when the member's shape turns out to be unsupported.
//!
//! Two strategy families ship with the crate: [`DelegateStrategy`] (forwards to
//! a concrete method of a delegate type) and [`AnnotatedStrategy`] (claims
//! members carrying a marker).
use crate::{
    error::RealizationError,
    types::members::{Member, MethodDescription},
};
use enum_dispatch::enum_dispatch;
use std::sync::Arc;

pub mod annotated;
pub mod delegate;

pub use annotated::{AnnotatedStrategy, MarkerRealizer};
pub use delegate::{unwrap_method_name, DelegateStrategy, SearchBound};

pub trait MethodStrategy: Send + Sync {
    fn accepts(&self, member: &Member) -> bool;

    fn describe(&self) -> String;

    fn realize(&self, member: &Member) -> Result<Fragment, RealizationError>;
}

impl<S: MethodStrategy + ?Sized> MethodStrategy for Box<S> {
    fn accepts(&self, member: &Member) -> bool {
        (**self).accepts(member)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn realize(&self, member: &Member) -> Result<Fragment, RealizationError> {
        (**self).realize(member)
    }
}

impl<S: MethodStrategy + ?Sized> MethodStrategy for Arc<S> {
    fn accepts(&self, member: &Member) -> bool {
        (**self).accepts(member)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn realize(&self, member: &Member) -> Result<Fragment, RealizationError> {
        (**self).realize(member)
    }
}

/// Text rendering of a realized member body.
#[enum_dispatch]
pub trait Emit {
    fn emit(&self, member: &Member) -> String;
}

/// The artifact a strategy produces for one member.
#[enum_dispatch(Emit)]
#[derive(Clone, Debug, PartialEq)]
pub enum Fragment {
    Forward,
    Body,
}

/// Calls the same-signature method on the delegate, unwrapping a boxed
/// return value when the member returns a primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct Forward {
    pub target: MethodDescription,
    pub unwrap: Option<&'static str>,
}

impl Emit for Forward {
    fn emit(&self, member: &Member) -> String {
        let args: Vec<_> = (0..member.parameter_types().len())
            .map(|i| format!("arg{}", i))
            .collect();
        let call = format!(
            "{}::{}({})",
            self.target.parent.name(),
            self.target.name(),
            args.join(", ")
        );
        match self.unwrap {
            Some(accessor) => format!("{}.{}()", call, accessor),
            None => call,
        }
    }
}

/// Opaque body text supplied by a strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Body {
    pub source: String,
}

impl Body {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Emit for Body {
    fn emit(&self, _member: &Member) -> String {
        self.source.clone()
    }
}
