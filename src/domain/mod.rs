// Domain layer - Data model, formatting and pure chart rules
pub mod chart;
pub mod climate;
pub mod dashboard;
pub mod energy;
pub mod format;
pub mod layout;
pub mod period;
pub mod sample;
pub mod settings;
pub mod statistics;
