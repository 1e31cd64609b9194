pub mod background;
pub mod board;
