pub mod markdown;
pub mod shell;
pub mod spinner;

pub use shell::{Command, Shell, ShellState};
