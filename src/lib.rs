//! Urban Dynamics - annual multi-domain simulation of city systems

pub mod core;
pub mod urban;
