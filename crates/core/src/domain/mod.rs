pub mod document;
pub mod entry;
pub mod estimate;
pub mod external;
pub mod statistics;
