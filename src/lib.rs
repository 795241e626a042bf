pub mod api;
pub mod calendar;
pub mod config;
pub mod error;
pub mod filters;
pub mod models;
pub mod services;
pub mod state;
pub mod timetable;
pub mod upstream;
