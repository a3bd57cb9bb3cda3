#![forbid(unsafe_code)]

mod price;
mod rows;

pub(in crate::store) use price::*;
pub(in crate::store) use rows::*;
