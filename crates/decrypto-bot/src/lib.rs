pub mod guesser;
pub mod policy;

pub use guesser::{
    BeliefHistory, GUESS_DETAILS_ENV, Guess, GuessTelemetry, Guesser, GuesserConfig,
    GuesserError, RevealOutcome,
};
pub use policy::{ArgMaxPolicy, GuessPolicy, HeuristicKind, SampledPolicy, SharedHeuristic};
