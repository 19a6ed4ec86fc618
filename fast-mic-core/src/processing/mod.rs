pub mod noise_gate;
pub mod pcm;
pub mod sample_buffer;
