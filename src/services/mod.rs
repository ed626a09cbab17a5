pub mod cache;
pub mod encoding;
pub mod glossary;
pub mod heuristics;
pub mod quality;
