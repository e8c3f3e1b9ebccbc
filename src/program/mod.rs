pub mod instance;

pub use instance::SandboxProgramInstance;
