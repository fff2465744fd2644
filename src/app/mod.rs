// Application layer: concrete jobs wiring storage and configuration to the core routines.

pub mod jobs;
