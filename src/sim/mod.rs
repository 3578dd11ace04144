pub mod event;
pub mod narration;
pub mod save;
pub mod step;
pub mod world;
