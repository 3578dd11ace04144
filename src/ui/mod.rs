pub mod canvas;
pub mod gamepad;
pub mod input;
pub mod perspective;
pub mod renderer;
pub mod scene;
pub mod sound;
