pub mod aichat_workspace;

pub use aichat_workspace::*;
