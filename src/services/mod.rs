pub mod inbox;
pub mod pipeline;
pub mod providers;
pub mod recommendations;
pub mod schema;
pub mod sync;
pub mod training;
