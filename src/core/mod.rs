pub mod background;
pub mod date;
pub mod quote;
pub mod subject;
pub mod transition;
pub mod upload;
