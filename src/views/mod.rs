pub mod brush;
pub mod charts;
pub mod linked;
