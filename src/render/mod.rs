pub mod cursor;
pub mod grid;
pub mod instruction;
pub mod layout;
pub mod overlay;
pub mod spectrogram;
pub mod spectrum;
pub mod surface;
pub mod text;
pub mod waveform;
