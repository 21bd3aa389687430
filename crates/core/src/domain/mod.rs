pub mod attachment;
pub mod lead;
