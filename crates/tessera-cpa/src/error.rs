use tessera_cfa::{CfaEdge, CfaError};

/// Error type for analysis failures.
///
/// Resource limits and cancellation are not errors: they surface as
/// [`Verdict::LimitReached`](crate::Verdict::LimitReached). Everything here
/// aborts the current run; none of it is retried by the engine.
#[derive(Debug, thiserror::Error)]
pub enum CpaError {
    /// A component is misconfigured or a required model is absent.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A composite tuple does not line up with the configured components.
    #[error("composite analysis expects {expected} components, got {got}")]
    ArityMismatch { expected: usize, got: usize },
    /// A transfer relation does not support the operation on an edge.
    #[error("`{component}` cannot compute successors along `{edge}`: {message}")]
    Transfer {
        component: String,
        edge: String,
        message: String,
    },
    /// A domain operation (join, subsumption) failed.
    #[error("domain `{domain}` failed: {message}")]
    Domain { domain: String, message: String },
    /// A decision procedure failed while adjusting precision.
    #[error("precision adjustment failed in `{component}`")]
    Refinement {
        component: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error(transparent)]
    Cfa(#[from] CfaError),
    /// User-defined error.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl CpaError {
    /// Wrap an arbitrary error as [`CpaError::Custom`].
    pub fn custom(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        CpaError::Custom(Box::new(error))
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        CpaError::Configuration(message.into())
    }

    pub fn transfer(component: &str, edge: &CfaEdge, message: impl Into<String>) -> Self {
        CpaError::Transfer {
            component: component.to_string(),
            edge: edge.to_string(),
            message: message.into(),
        }
    }

    pub fn domain(domain: &str, message: impl Into<String>) -> Self {
        CpaError::Domain {
            domain: domain.to_string(),
            message: message.into(),
        }
    }

    pub fn refinement(
        component: &str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        CpaError::Refinement {
            component: component.to_string(),
            source: Box::new(source),
        }
    }

    /// Whether this error was detected before any exploration could start.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CpaError::Configuration(_) | CpaError::ArityMismatch { .. } | CpaError::Cfa(_)
        )
    }
}
