pub mod quote_bar;
pub mod subject_row;
