//! Types shared between the sample judge service, its libraries and its clients.
pub mod languages;
pub mod live;
pub mod problem;
pub mod rest;
pub mod run;
