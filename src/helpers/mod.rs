//! Small reusable utilities shared by the `row` readers/writers.

pub(crate) mod xml;
pub(crate) mod zip;
