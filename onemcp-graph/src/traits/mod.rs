mod driver;

pub use driver::GraphDriver;
