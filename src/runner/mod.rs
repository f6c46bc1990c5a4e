pub mod class;
pub mod device;
pub mod engine;
pub mod registry;
pub mod reporter;
