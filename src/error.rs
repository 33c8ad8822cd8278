use thiserror::Error;

/// Errors raised while building a graph. The formatter itself never fails;
/// bad layouts degrade to best-effort placement instead.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown pin index {0}")]
    UnknownPin(usize),
    #[error("unknown node index {0}")]
    UnknownNodeId(usize),
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error("unknown pin `{0}`")]
    UnknownPinName(String),
    #[error("duplicate node name `{0}`")]
    DuplicateNode(String),
    #[error("pin reference `{0}` must look like `Node.pin`")]
    MalformedPinRef(String),
    #[error("pins on node `{0}` cannot link to each other")]
    SelfLink(String),
    #[error("cannot link `{from}` to `{to}`: both pins have the same direction")]
    DirectionMismatch { from: String, to: String },
}
