//! Optional YAML description of a tree to start the session with.

mod seed;

pub use seed::{Seed, SeedError};
