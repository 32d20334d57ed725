pub mod script;

pub use script::{ScriptOutcome, ScriptRunner};
