pub mod contest;
pub mod photos;
pub mod similarity;
