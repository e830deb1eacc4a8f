pub mod canonical;
pub mod datetime;
pub mod resample_rule;
pub mod results;
pub mod row;
pub mod slice_spec;
