pub mod mode;
pub mod scope;
pub mod table;
pub mod zoom;
