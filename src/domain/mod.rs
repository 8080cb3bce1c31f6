pub mod group;
pub mod ids;
pub mod track;
pub mod user;
