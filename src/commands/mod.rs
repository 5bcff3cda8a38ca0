pub mod apply;
pub mod facts;
pub mod plan;
