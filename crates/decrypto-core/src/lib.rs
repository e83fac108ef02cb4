#![deny(warnings)]
pub mod belief;
pub mod code;
pub mod decode;
pub mod error;
pub mod expectation;
pub mod heuristic;
pub mod logspace;
pub mod vocab;

pub use belief::{Belief, compress, compress_batch};
pub use code::{Code, CodeSpace, CodeSpaceCache};
pub use decode::{Decoded, Decoder, decode, rank_of_position};
pub use error::DecodeError;
pub use expectation::{ExpectationMatrix, expectation_matrix};
pub use heuristic::{ExactMatch, Heuristic, ScoreTable, SimilarityHeuristic};
pub use logspace::LOG_ZERO;
pub use vocab::{Vocabulary, WordIndex};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "decrypto"
    }

    pub const fn codename() -> &'static str {
        "Interceptor"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "decrypto");
        assert_eq!(AppInfo::codename(), "Interceptor");
        assert!(!AppInfo::version().is_empty());
    }
}
