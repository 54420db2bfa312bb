use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The chat reply held no `{...}` span, or the span was not a JSON object.
    #[error("model reply did not contain a usable JSON object: {0}")]
    MalformedModelOutput(String),
}
