pub mod derive;
pub mod dose;
pub mod report;
