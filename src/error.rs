use thiserror::Error;

/// Contract violations raised by the keyup filter operations.
///
/// These are usage errors: whenever one is returned nothing has been mutated
/// on the element and no script has been sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyupError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("precondition violated: {0}")]
    PreconditionViolation(&'static str),
    #[error("element '{id}' with tag <{tag}> does not accept keyboard input")]
    NotInputElement { id: String, tag: String },
}
