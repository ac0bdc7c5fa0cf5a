pub mod escpos;
pub mod receipt;
pub mod transport;
