/// Terminal frontend: key input, login screen, and the renderer.
pub mod input;
pub mod login;
pub mod renderer;
