pub mod prepare;
pub mod survey;
