pub type FieldframeResult<T> = Result<T, FieldframeError>;

#[derive(thiserror::Error, Debug)]
pub enum FieldframeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("graph error: {0}")]
    Graph(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FieldframeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            FieldframeError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            FieldframeError::graph("x")
                .to_string()
                .contains("graph error:")
        );
        assert!(
            FieldframeError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            FieldframeError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = FieldframeError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
