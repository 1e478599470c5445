use std::error::Error;
use std::fmt;

pub type Result<T> = std::result::Result<T, OligostoreError>;

#[derive(Debug)]
pub enum OligostoreError {
    /// Input contained characters outside the allowed alphabet.
    /// Carries the offending characters, sorted and de-duplicated.
    InvalidSequence(Vec<char>),
    EmptyInput,
    UnsupportedFormat(String),
    NotFound(String),
    Thermodynamics(String),
    Io(std::io::Error),
    Parse(String),
    Serde(serde_json::Error),
}

impl Error for OligostoreError {}

impl fmt::Display for OligostoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OligostoreError::InvalidSequence(chars) => {
                let listed = chars
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Sequence contains invalid characters: {listed}")
            }
            OligostoreError::EmptyInput => write!(f, "Sequence is empty"),
            OligostoreError::UnsupportedFormat(tag) => {
                write!(f, "Unsupported sequence format: {tag}")
            }
            OligostoreError::NotFound(what) => write!(f, "{what} not found"),
            OligostoreError::Thermodynamics(msg) => write!(f, "Analysis failed: {msg}"),
            OligostoreError::Io(err) => write!(f, "{err}"),
            OligostoreError::Parse(msg) => write!(f, "{msg}"),
            OligostoreError::Serde(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for OligostoreError {
    fn from(err: std::io::Error) -> Self {
        OligostoreError::Io(err)
    }
}

impl From<serde_json::Error> for OligostoreError {
    fn from(err: serde_json::Error) -> Self {
        OligostoreError::Serde(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sequence_lists_characters() {
        let err = OligostoreError::InvalidSequence(vec!['X', 'Z']);
        assert_eq!(
            err.to_string(),
            "Sequence contains invalid characters: X, Z"
        );
    }

    #[test]
    fn not_found_names_the_subject() {
        let err = OligostoreError::NotFound("Primer".to_string());
        assert_eq!(err.to_string(), "Primer not found");
    }
}
