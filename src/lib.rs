// Raffle Draw Engine
// Weighted, reproducible prize draws with a verifiable audit trail

// Core modules
pub mod constants;
pub mod error;
pub mod state;
pub mod utils;

// Draw modules
pub mod rng;
pub mod selector;
pub mod prize;
pub mod checksum;
pub mod audit;
pub mod engine;
pub mod instruction;
pub mod processor;
pub mod export;

pub use engine::DrawEngine;
pub use error::{DrawError, DrawResult};
pub use instruction::DrawInstruction;
pub use processor::{DrawOutcome, Processor};
pub use state::{DrawSession, DrawStatus, Participant, RaffleConfig, RevealMode, Winner};
