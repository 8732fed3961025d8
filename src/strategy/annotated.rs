use crate::{
    error::RealizationError,
    strategy::{Body, Fragment, MethodStrategy},
    types::members::{Marker, Member},
};
use tracing::trace;

/// Produces the fragment for a member claimed through a marker.
pub trait MarkerRealizer: Send + Sync {
    fn realize(&self, member: &Member, marker: &Marker) -> Result<Fragment, RealizationError>;
}

impl<F> MarkerRealizer for F
where
    F: Fn(&Member, &Marker) -> Result<Fragment, RealizationError> + Send + Sync,
{
    fn realize(&self, member: &Member, marker: &Marker) -> Result<Fragment, RealizationError> {
        self(member, marker)
    }
}

/// Default realizer: the marker's value becomes the member body verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkerValue;

impl MarkerRealizer for MarkerValue {
    fn realize(&self, _member: &Member, marker: &Marker) -> Result<Fragment, RealizationError> {
        match &marker.value {
            Some(value) => Ok(Body::new(value.clone()).into()),
            None => Err(RealizationError::EmptyMarker(marker.kind.clone())),
        }
    }
}

/// Accepts every member carrying a marker of the given kind.
pub struct AnnotatedStrategy {
    marker: String,
    realizer: Box<dyn MarkerRealizer>,
}

impl AnnotatedStrategy {
    pub fn new(marker: impl Into<String>) -> Self {
        Self::with_realizer(marker, MarkerValue)
    }

    pub fn with_realizer(
        marker: impl Into<String>,
        realizer: impl MarkerRealizer + 'static,
    ) -> Self {
        Self {
            marker: marker.into(),
            realizer: Box::new(realizer),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl MethodStrategy for AnnotatedStrategy {
    fn accepts(&self, member: &Member) -> bool {
        member.has_marker(&self.marker)
    }

    fn describe(&self) -> String {
        format!("annotated with {}", self.marker)
    }

    fn realize(&self, member: &Member) -> Result<Fragment, RealizationError> {
        let marker = member.marker(&self.marker).ok_or_else(|| {
            RealizationError::Unsupported(format!(
                "{} is not annotated with {}",
                member.signature(),
                self.marker
            ))
        })?;
        trace!(member = ?member, marker = %self.marker, "realizing annotated member");
        self.realizer.realize(member, marker)
    }
}
