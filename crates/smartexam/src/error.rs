#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Could not parse any questions from {0}: no \"Q<n>:\" headers found")]
    Unparseable(String),

    #[error("{path}: {headers} question block(s) found but none is a valid question. Check the option and \"Answer:\" lines.")]
    NoValidQuestions { path: String, headers: usize },

    #[error("Invalid answers file: {0}")]
    InvalidAnswers(String),

    #[error("Refusing to {0} without --yes")]
    NotConfirmed(String),
}
