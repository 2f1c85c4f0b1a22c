// Camera domain — device discovery, capture control, and the dummy backend.

pub mod backend;
pub mod controller;
pub mod dummy;
pub mod error;
pub mod types;
