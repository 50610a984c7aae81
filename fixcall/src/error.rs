#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackError {
    #[error("no context is attached to the callback")]
    NoContext,
    #[error("context was attached as `{found}` but requested as `{expected}`")]
    ContextMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

pub type CallbackResult<T> = Result<T, CallbackError>;
