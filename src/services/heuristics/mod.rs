pub mod residue;
pub mod similarity;
