pub mod keymap;
pub mod session;
