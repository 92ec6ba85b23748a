pub mod domain;
pub mod models;
pub mod numerics;
pub mod reference;
pub mod theory;
