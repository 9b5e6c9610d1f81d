pub mod cycles;
