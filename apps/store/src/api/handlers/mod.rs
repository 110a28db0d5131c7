pub mod system;
pub mod teams;
