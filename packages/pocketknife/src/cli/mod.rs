pub mod color;
pub mod countdown;
pub mod relay;
pub mod sponge;
pub mod terminal;
