pub mod arr_meta;
pub mod array;
pub mod code;
pub mod range;
