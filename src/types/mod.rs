pub mod coordinates;
pub mod observation;
pub mod required_data;
pub mod station;
