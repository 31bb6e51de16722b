pub mod link;
pub mod neighbors;
pub mod path_loss;
pub mod shadowing;
