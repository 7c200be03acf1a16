pub mod assets;
pub mod audio;
pub mod console_log;
pub mod mesh;
pub mod renderer;
